//! DPCM reconstruction of the high bits.
//!
//! Every block carries 64 differences. The first one is chained to the first
//! difference of the previous block through `carry`, which runs across the whole
//! image. The sample values themselves are accumulated in two predictors, one for
//! even and one for odd coefficient positions, which restart at 512 on every row.

use anyhow::{Result, anyhow};
use log::trace;

use crate::log_or_err;
use crate::process::block::{BLOCK_SIZE, BlockEnd, decode_block};
use crate::process::tables::DecoderPair;
use crate::process::{BAND_ROWS, Decompressor};
use crate::structs::image::RawImage;
use crate::utils::bitstream_io::BitstreamIoReader;
use crate::utils::errors::{CorruptionError, InputError};

/// Value both row predictors restart from.
pub const ROW_SEED: i32 = 512;

/// Exclusive upper bound of a reconstructed high-bit sample.
pub const SAMPLE_LIMIT: i32 = 1 << 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredictorState {
    pub carry: i32,
    pub base: [i32; 2],
}

impl Default for PredictorState {
    fn default() -> Self {
        Self {
            carry: 0,
            base: [ROW_SEED; 2],
        }
    }
}

impl PredictorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chains a block's leading difference onto the previous block's.
    #[inline(always)]
    pub fn predict_dc(&mut self, diff: i32) -> i32 {
        self.carry = self.carry.wrapping_add(diff);
        self.carry
    }

    #[inline(always)]
    pub fn start_row(&mut self) {
        self.base = [ROW_SEED; 2];
    }

    /// Adds `diff` to the predictor for coefficient `index`.
    ///
    /// Returns the new sample, or the offending value when it leaves `0..1024`.
    #[inline(always)]
    pub fn apply(&mut self, index: usize, diff: i32) -> Result<u16, i32> {
        let base = &mut self.base[index & 1];
        *base = base.saturating_add(diff);

        if (0..SAMPLE_LIMIT).contains(base) {
            Ok(*base as u16)
        } else {
            Err(*base)
        }
    }
}

/// Walks an image row-major in fixed-width rows.
///
/// The cursor starts before the first sample of `first_row`; each
/// [`advance`](Self::advance) moves it one sample forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowCursor {
    width: usize,
    row: usize,
    col: usize,
    started: bool,
}

impl RowCursor {
    pub fn new(first_row: usize, width: usize) -> Self {
        Self {
            width,
            row: first_row,
            col: 0,
            started: false,
        }
    }

    /// Moves to the next sample and reports whether it starts a new row.
    #[inline(always)]
    pub fn advance(&mut self) -> bool {
        if !self.started {
            self.started = true;
            return true;
        }

        self.col += 1;
        if self.col == self.width {
            self.col = 0;
            self.row += 1;
            return true;
        }

        false
    }

    /// `(row, column)` of the current sample.
    #[inline(always)]
    pub fn position(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    /// The first row the cursor has not entered yet.
    pub fn next_row(&self) -> usize {
        if self.started { self.row + 1 } else { self.row }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconstructStats {
    pub blocks: usize,
    pub bands: usize,
    pub overflows: usize,
}

/// Decodes the high-bit stream into `image`.
///
/// The image is processed in bands of up to [`BAND_ROWS`] rows holding
/// `lines * width / 64` blocks each. Blocks may straddle rows, and each band starts
/// on a fresh row. A band smaller than one block still decodes a whole block;
/// samples past the band's last row are dropped.
pub fn reconstruct(
    decompressor: &Decompressor,
    image: &mut RawImage,
    tables: &DecoderPair,
    reader: &mut BitstreamIoReader,
) -> Result<ReconstructStats> {
    let width = image.width();
    let height = image.height();

    let mut predictor = PredictorState::new();
    let mut stats = ReconstructStats::default();
    let mut row = 0;

    while row < height {
        let lines = BAND_ROWS.min(height - row);
        let band_end = row + lines;
        let samples = lines * width;
        let blocks = (samples / BLOCK_SIZE).max(1);

        if samples > BLOCK_SIZE && samples % BLOCK_SIZE != 0 {
            log_or_err!(
                decompressor,
                log::Level::Warn,
                anyhow!(InputError::PartialBlock {
                    row,
                    lines,
                    width,
                    samples: samples % BLOCK_SIZE,
                })
            );
        }

        trace!("Band at row {row}: {lines} lines, {blocks} blocks");

        let mut cursor = RowCursor::new(row, width);

        for _ in 0..blocks {
            let mut block = [0i32; BLOCK_SIZE];

            if decode_block(&mut block, tables, reader)? == BlockEnd::Overflow {
                trace!(
                    "Run overflowed block {} at bit {}",
                    stats.blocks,
                    reader.position()
                );
                stats.overflows += 1;
            }

            block[0] = predictor.predict_dc(block[0]);

            for (index, &diff) in block.iter().enumerate() {
                if cursor.advance() {
                    predictor.start_row();
                }

                let (y, x) = cursor.position();
                if y >= band_end {
                    break;
                }

                let value = predictor
                    .apply(index, diff)
                    .map_err(|value| CorruptionError::SampleOutOfRange {
                        row: y,
                        col: x,
                        value,
                    })?;

                image.row_mut(y)[x] = value;
            }

            stats.blocks += 1;
        }

        row = cursor.next_row().min(band_end);
        stats.bands += 1;
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::tables::TableVariant;
    use crate::utils::errors::{ErrorKind, error_kind};
    use crate::utils::test_stream::StreamBuilder;

    #[test]
    fn predictor_accepts_the_full_ten_bit_range() {
        let mut predictor = PredictorState::new();
        assert_eq!(predictor.apply(0, 511), Ok(1023));
        assert_eq!(predictor.apply(1, -512), Ok(0));

        let mut predictor = PredictorState::new();
        assert_eq!(predictor.apply(0, 512), Err(1024));

        let mut predictor = PredictorState::new();
        assert_eq!(predictor.apply(1, -513), Err(-1));
    }

    #[test]
    fn parity_selects_the_predictor() {
        let mut predictor = PredictorState::new();
        assert_eq!(predictor.apply(0, 10), Ok(522));
        assert_eq!(predictor.apply(1, -10), Ok(502));
        assert_eq!(predictor.apply(2, 1), Ok(523));
        assert_eq!(predictor.apply(63, 1), Ok(503));
        assert_eq!(predictor.base, [523, 503]);

        predictor.start_row();
        assert_eq!(predictor.base, [ROW_SEED; 2]);
    }

    #[test]
    fn carry_survives_row_resets() {
        let mut predictor = PredictorState::new();
        assert_eq!(predictor.predict_dc(100), 100);
        predictor.start_row();
        assert_eq!(predictor.predict_dc(-30), 70);
        assert_eq!(predictor.predict_dc(0), 70);
        assert_eq!(predictor.carry, 70);
    }

    #[test]
    fn cursor_reports_row_starts() {
        let mut cursor = RowCursor::new(4, 3);
        assert_eq!(cursor.next_row(), 4);

        let mut seen = Vec::new();
        for _ in 0..7 {
            let entered = cursor.advance();
            seen.push((cursor.position(), entered));
        }

        assert_eq!(
            seen,
            [
                ((4, 0), true),
                ((4, 1), false),
                ((4, 2), false),
                ((5, 0), true),
                ((5, 1), false),
                ((5, 2), false),
                ((6, 0), true),
            ]
        );
        assert_eq!(cursor.next_row(), 7);
    }

    #[test]
    fn blocks_straddle_rows_and_reset_predictors() -> Result<()> {
        let tables = DecoderPair::new(TableVariant::V0)?;
        let mut builder = StreamBuilder::new();
        // Width 32: one block covers two rows. Position 32 is the first sample of
        // the second row, so it starts again from 512.
        builder
            .coefficient(tables.for_index(0), 0, 3)
            .coefficient(tables.for_index(1), 0, 1)
            .coefficient(tables.for_index(1), 15, 2)
            .coefficient(tables.for_index(1), 14, 5)
            .symbol(tables.for_index(1), 0x00);
        let data = builder.finish();

        let mut image = RawImage::new(32, 2)?;
        let mut reader = BitstreamIoReader::from_slice(&data);
        let stats = reconstruct(&Decompressor::default(), &mut image, &tables, &mut reader)?;

        assert_eq!(stats.blocks, 1);
        assert_eq!(stats.bands, 1);

        let first = image.row(0);
        assert_eq!(first[0], 515);
        assert_eq!(first[1], 513);
        assert!(first[2..].iter().step_by(2).all(|&s| s == 515));
        // Index 17 is odd and picks up the +2.
        assert_eq!(first[17], 515);
        assert_eq!(first[16], 515);
        assert_eq!(first[15], 513);

        let second = image.row(1);
        assert_eq!(second[0], 517);
        assert!(second[1..].iter().step_by(2).all(|&s| s == 512));
        assert!(second[2..].iter().step_by(2).all(|&s| s == 517));
        Ok(())
    }

    #[test]
    fn out_of_range_sample_is_corruption() -> Result<()> {
        let tables = DecoderPair::new(TableVariant::V0)?;
        let mut builder = StreamBuilder::new();
        builder
            .coefficient(tables.for_index(0), 0, 0)
            .coefficient(tables.for_index(1), 2, 512)
            .symbol(tables.for_index(1), 0x00);
        let data = builder.finish();

        let mut image = RawImage::new(64, 1)?;
        let mut reader = BitstreamIoReader::from_slice(&data);
        let err = reconstruct(&Decompressor::default(), &mut image, &tables, &mut reader)
            .unwrap_err();

        assert_eq!(error_kind(&err), Some(ErrorKind::StreamCorruption));
        assert!(matches!(
            err.downcast_ref::<CorruptionError>(),
            Some(CorruptionError::SampleOutOfRange {
                row: 0,
                col: 3,
                value: 1024
            })
        ));
        Ok(())
    }

    #[test]
    fn partial_block_follows_fail_level() -> Result<()> {
        let tables = DecoderPair::new(TableVariant::V0)?;
        let mut builder = StreamBuilder::new();
        for _ in 0..2 {
            builder
                .coefficient(tables.for_index(0), 0, 0)
                .symbol(tables.for_index(1), 0x00);
        }
        let data = builder.finish();

        // 100 samples hold one block and leave 36 samples of the second row unset.
        let mut image = RawImage::new(50, 2)?;
        let mut reader = BitstreamIoReader::from_slice(&data);
        let stats = reconstruct(&Decompressor::default(), &mut image, &tables, &mut reader)?;
        assert_eq!(stats.blocks, 1);
        assert!(image.row(0).iter().all(|&s| s == 512));
        assert!(image.row(1)[..14].iter().all(|&s| s == 512));
        assert!(image.row(1)[14..].iter().all(|&s| s == 0));

        let mut strict = Decompressor::default();
        strict.set_fail_level(log::Level::Warn);
        let mut reader = BitstreamIoReader::from_slice(&data);
        let err = reconstruct(&strict, &mut image, &tables, &mut reader).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<InputError>(),
            Some(InputError::PartialBlock { samples: 36, .. })
        ));
        Ok(())
    }

    #[test]
    fn narrow_bands_decode_their_own_block() -> Result<()> {
        let tables = DecoderPair::new(TableVariant::V0)?;
        let mut builder = StreamBuilder::new();
        builder
            .coefficient(tables.for_index(0), 0, 10)
            .symbol(tables.for_index(1), 0x00)
            .coefficient(tables.for_index(0), 0, 20)
            .symbol(tables.for_index(1), 0x00);
        let data = builder.finish();

        // Width 4: each band of eight rows holds 32 samples, so the second half of
        // every block falls past the band and is dropped.
        let mut image = RawImage::new(4, 16)?;
        let mut reader = BitstreamIoReader::from_slice(&data);
        let stats = reconstruct(&Decompressor::default(), &mut image, &tables, &mut reader)?;

        assert_eq!(stats.bands, 2);
        assert_eq!(stats.blocks, 2);
        assert_eq!(reader.position(), builder.bit_len());

        assert_eq!(image.row(0), &[522, 512, 512, 512]);
        assert!((1..8).all(|y| image.row(y) == [512, 512, 512, 512]));
        assert_eq!(image.row(8), &[542, 512, 512, 512]);
        assert!((9..16).all(|y| image.row(y) == [512, 512, 512, 512]));
        Ok(())
    }
}
