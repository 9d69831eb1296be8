//! Merging of the uncompressed two-bit refinement plane.

use anyhow::{Result, anyhow, bail};
use log::trace;

use crate::log_or_err;
use crate::process::predict::RowCursor;
use crate::process::{BAND_ROWS, Decompressor};
use crate::structs::image::RawImage;
use crate::utils::byte_stream::ByteSource;
use crate::utils::errors::InputError;

/// Sensor width whose dark samples need a fixed offset after merging.
pub const CORRECTION_WIDTH: usize = 2672;

const CORRECTION_THRESHOLD: u16 = 512;
const CORRECTION_OFFSET: u16 = 2;

/// Shifts every sample left by two bits and fills in the packed low bits.
///
/// Each byte holds four samples, least significant pair first. Returns the number
/// of bytes consumed from `source`.
pub fn merge_low_bits(
    decompressor: &Decompressor,
    image: &mut RawImage,
    mut source: ByteSource,
) -> Result<usize> {
    let width = image.width();
    let height = image.height();

    if width < 4 {
        bail!(InputError::UnalignedLowBits(width));
    }

    if width % 4 != 0 {
        log_or_err!(
            decompressor,
            log::Level::Warn,
            anyhow!(InputError::UnalignedLowBits(width))
        );
    }

    let correct = width == CORRECTION_WIDTH;
    let mut row = 0;

    while row < height {
        let lines = BAND_ROWS.min(height - row);
        let bytes = width / 4 * lines;

        trace!("Low bits at row {row}: {lines} lines, {bytes} bytes");

        let mut cursor = RowCursor::new(row, width);

        for _ in 0..bytes {
            let packed = source.get_byte()?;

            for shift in (0..8).step_by(2) {
                cursor.advance();
                let (y, x) = cursor.position();

                let sample = &mut image.row_mut(y)[x];
                let mut merged = (*sample << 2) | ((packed >> shift) & 0x03) as u16;

                if correct && merged < CORRECTION_THRESHOLD {
                    merged += CORRECTION_OFFSET;
                }

                *sample = merged;
            }
        }

        row = cursor.next_row();
    }

    Ok(source.position())
}
