//! Destination buffer for decoded raw samples.

use anyhow::{Result, bail};

use crate::utils::errors::InputError;

/// A single-component image of unsigned 16-bit samples stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    width: usize,
    height: usize,
    samples: Vec<u16>,
}

impl RawImage {
    /// Allocates a zero-filled image.
    ///
    /// Fails when either dimension is zero or the sample count overflows `usize`.
    pub fn new(width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            bail!(InputError::EmptyImage { width, height });
        }

        let Some(len) = width.checked_mul(height) else {
            bail!(InputError::ImageTooLarge { width, height });
        };

        Ok(Self {
            width,
            height,
            samples: vec![0; len],
        })
    }

    #[inline(always)]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline(always)]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Samples of row `y`. Panics if `y >= height`.
    #[inline(always)]
    pub fn row(&self, y: usize) -> &[u16] {
        &self.samples[y * self.width..(y + 1) * self.width]
    }

    #[inline(always)]
    pub fn row_mut(&mut self, y: usize) -> &mut [u16] {
        &mut self.samples[y * self.width..(y + 1) * self.width]
    }

    pub fn samples(&self) -> &[u16] {
        &self.samples
    }
}
