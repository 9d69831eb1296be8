//! Bitstream reading for JPEG-style packed entropy data.
//!
//! The compressed sample stream is MSB-first and byte-stuffed: an `0xFF` data byte
//! is always followed by a `0x00` that must be dropped. Any other byte after `0xFF`
//! is a marker and ends the entropy-coded data.

use std::io;

use anyhow::{Result, bail};
use bitstream_io::{BigEndian, BitRead, BitReader};

use crate::utils::byte_stream::ByteSource;
use crate::utils::errors::{CorruptionError, RangeError};
use crate::utils::huffman::{HuffmanTable, MAX_CODE_LENGTH};

/// Byte reader that removes JPEG stuffing from the wrapped data.
#[derive(Debug)]
pub struct Destuffer<'a> {
    data: &'a [u8],
    position: usize,
    ended: bool,
}

impl<'a> Destuffer<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            position: 0,
            ended: false,
        }
    }

    #[inline(always)]
    fn next_byte(&mut self) -> Option<u8> {
        if self.ended {
            return None;
        }

        let byte = *self.data.get(self.position)?;

        if byte == 0xFF {
            if self.data.get(self.position + 1) == Some(&0x00) {
                self.position += 2;
                return Some(0xFF);
            }

            self.ended = true;
            return None;
        }

        self.position += 1;
        Some(byte)
    }

    /// Raw bytes consumed so far, stuffing included.
    pub fn position(&self) -> usize {
        self.position
    }
}

impl io::Read for Destuffer<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut written = 0;

        for slot in buf.iter_mut() {
            match self.next_byte() {
                Some(byte) => {
                    *slot = byte;
                    written += 1;
                }
                None => break,
            }
        }

        Ok(written)
    }
}

/// Forward-only bit reader over byte-stuffed data.
///
/// Tracks the number of bits handed out so block boundaries can be checked
/// bit-exactly.
#[derive(Debug)]
pub struct BitstreamIoReader<'a> {
    bs: BitReader<Destuffer<'a>, BigEndian>,
    consumed: u64,
}

impl<'a> BitstreamIoReader<'a> {
    pub fn new(source: ByteSource<'a>) -> Self {
        Self::from_slice(source.as_slice())
    }

    pub fn from_slice(buf: &'a [u8]) -> Self {
        Self {
            bs: BitReader::new(Destuffer::new(buf)),
            consumed: 0,
        }
    }

    #[inline(always)]
    fn exhausted(&self, requested: u32, err: io::Error) -> anyhow::Error {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            RangeError::BitstreamExhausted {
                requested,
                position: self.consumed,
            }
            .into()
        } else {
            err.into()
        }
    }

    #[inline(always)]
    pub fn get(&mut self) -> Result<bool> {
        match self.bs.read_bit() {
            Ok(bit) => {
                self.consumed += 1;
                Ok(bit)
            }
            Err(e) => Err(self.exhausted(1, e)),
        }
    }

    #[inline(always)]
    pub fn get_n(&mut self, n: u32) -> Result<u32> {
        if n == 0 {
            return Ok(0);
        }

        match self.bs.read_unsigned_var::<u32>(n) {
            Ok(val) => {
                self.consumed += n as u64;
                Ok(val)
            }
            Err(e) => Err(self.exhausted(n, e)),
        }
    }

    /// Decodes one symbol, consuming exactly the bits of its code.
    #[inline(always)]
    pub fn get_huffman(&mut self, table: &HuffmanTable) -> Result<u8> {
        let start = self.consumed;
        let mut code = 0u32;

        for length in 1..=MAX_CODE_LENGTH {
            code = (code << 1) | self.get()? as u32;

            if let Some(symbol) = table.lookup(code, length) {
                return Ok(symbol);
            }
        }

        bail!(CorruptionError::UnmatchedCode(start))
    }

    /// Number of bits consumed since the reader was created.
    #[inline(always)]
    pub fn position(&self) -> u64 {
        self.consumed
    }
}
