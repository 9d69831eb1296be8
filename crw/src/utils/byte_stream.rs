//! Bounds-checked byte addressing over an in-memory file.

use anyhow::{Result, bail};

use crate::utils::errors::RangeError;

/// A read-only window into a byte buffer with a forward-only read cursor.
///
/// Every access is bounds-checked; reading past the window fails with
/// [`RangeError`] instead of panicking.
#[derive(Debug, Clone, Copy)]
pub struct ByteSource<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> ByteSource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Returns a window of `len` bytes starting at `offset` of this window.
    pub fn sub_view(&self, offset: usize, len: usize) -> Result<ByteSource<'a>> {
        match offset.checked_add(len) {
            Some(end) if end <= self.data.len() => Ok(ByteSource::new(&self.data[offset..end])),
            _ => bail!(RangeError::SubView {
                offset,
                len,
                size: self.data.len()
            }),
        }
    }

    /// Returns the window from `offset` to the end of this window.
    pub fn tail(&self, offset: usize) -> Result<ByteSource<'a>> {
        if offset > self.data.len() {
            bail!(RangeError::SubView {
                offset,
                len: 0,
                size: self.data.len()
            });
        }

        Ok(ByteSource::new(&self.data[offset..]))
    }

    #[inline(always)]
    pub fn get_byte(&mut self) -> Result<u8> {
        let Some(&byte) = self.data.get(self.position) else {
            bail!(RangeError::ByteStreamExhausted(self.position));
        };

        self.position += 1;
        Ok(byte)
    }

    #[inline(always)]
    pub fn position(&self) -> usize {
        self.position
    }

    #[inline(always)]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The bytes not yet consumed by [`get_byte`](Self::get_byte).
    pub fn as_slice(&self) -> &'a [u8] {
        &self.data[self.position..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::errors::{ErrorKind, error_kind};

    #[test]
    fn sequential_reads_stop_at_window_end() -> Result<()> {
        let data = [1u8, 2, 3, 4, 5];
        let source = ByteSource::new(&data);

        let mut view = source.sub_view(1, 3)?;
        assert_eq!(view.get_byte()?, 2);
        assert_eq!(view.get_byte()?, 3);
        assert_eq!(view.remaining(), 1);
        assert_eq!(view.get_byte()?, 4);

        let err = view.get_byte().unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::OutOfRange));
        Ok(())
    }

    #[test]
    fn sub_view_bounds() {
        let data = [0u8; 8];
        let source = ByteSource::new(&data);

        assert!(source.sub_view(8, 0).is_ok());
        assert!(source.sub_view(4, 5).is_err());
        assert!(source.sub_view(usize::MAX, 2).is_err());
        assert!(source.tail(9).is_err());
        assert_eq!(source.tail(6).map(|v| v.len()).ok(), Some(2));
    }
}
