use std::ops::Range;

use anyhow::Result;
use log::debug;

use crate::structs::image::RawImage;
use crate::utils::bitstream_io::BitstreamIoReader;
use crate::utils::byte_stream::ByteSource;

/// Huffman decode tables built from the built-in descriptors.
///
/// Provides [`TableVariant`](tables::TableVariant) and the
/// [`DecoderPair`](tables::DecoderPair) used for every block of an image.
pub mod tables;

/// Decoding of single 64-coefficient blocks.
pub mod block;

/// DPCM reconstruction of the high bits, band by band.
pub mod predict;

/// The optional two-bit refinement pass.
pub mod lowbits;

/// Start of the compressed high-bit stream when there is no low-bit plane.
pub const HIGH_BITS_OFFSET: usize = 540;

/// Start of the packed low-bit plane.
pub const LOW_BITS_OFFSET: usize = 26;

/// Rows per band in both passes.
pub const BAND_ROWS: usize = 8;

/// Where the two data regions of an image live in the raw data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamLayout {
    /// Byte range of the packed low-bit plane, if present.
    pub low_bits: Option<Range<usize>>,
    /// Offset of the first byte of the compressed high-bit stream.
    pub high_bits_offset: usize,
}

impl StreamLayout {
    pub fn new(width: usize, height: usize, has_low_bits: bool) -> Self {
        if has_low_bits {
            let len = width * height / 4;
            Self {
                low_bits: Some(LOW_BITS_OFFSET..LOW_BITS_OFFSET + len),
                high_bits_offset: HIGH_BITS_OFFSET + len,
            }
        } else {
            Self {
                low_bits: None,
                high_bits_offset: HIGH_BITS_OFFSET,
            }
        }
    }

    /// Length of the low-bit plane in bytes; zero when absent.
    pub fn low_bits_len(&self) -> usize {
        self.low_bits.as_ref().map_or(0, |range| range.len())
    }
}

/// Counters describing a finished decompression.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeSummary {
    pub blocks: usize,
    pub bands: usize,
    /// Blocks whose last run skipped past coefficient 63.
    pub overflows: usize,
    /// Bits of the high-bit stream consumed, stuffing excluded.
    pub bits_consumed: u64,
    pub low_bit_bytes: usize,
}

/// Decompresses CRW raw data into a [`RawImage`].
///
/// Holds the validation policy for findings that do not make the output
/// meaningless, such as a band that is not a whole number of blocks.
#[derive(Debug, Clone)]
pub struct Decompressor {
    pub(crate) fail_level: log::Level,
}

impl Default for Decompressor {
    fn default() -> Self {
        Self {
            fail_level: log::Level::Error,
        }
    }
}

impl Decompressor {
    /// Decodes `data` into `image`, whose dimensions select the geometry.
    ///
    /// `data` is the whole raw data block: the low-bit plane (if any) at offset 26,
    /// then the high-bit stream at offset 540 plus the low-bit plane size. On error
    /// the contents of `image` are unspecified.
    pub fn decompress(
        &self,
        image: &mut RawImage,
        data: &[u8],
        variant: tables::TableVariant,
        has_low_bits: bool,
    ) -> Result<DecodeSummary> {
        let width = image.width();
        let height = image.height();

        debug!(
            "Decompressing {width}x{height} from {} bytes, variant {variant:?}, low bits: {has_low_bits}",
            data.len()
        );

        let tables = tables::DecoderPair::new(variant)?;
        let layout = StreamLayout::new(width, height, has_low_bits);
        let source = ByteSource::new(data);

        let mut reader = BitstreamIoReader::new(source.tail(layout.high_bits_offset)?);
        let stats = predict::reconstruct(self, image, &tables, &mut reader)?;

        let low_bit_bytes = match &layout.low_bits {
            Some(range) => {
                let plane = source.sub_view(range.start, range.len())?;
                lowbits::merge_low_bits(self, image, plane)?
            }
            None => 0,
        };

        let summary = DecodeSummary {
            blocks: stats.blocks,
            bands: stats.bands,
            overflows: stats.overflows,
            bits_consumed: reader.position(),
            low_bit_bytes,
        };

        debug!("{summary:?}");

        Ok(summary)
    }

    /// Sets the failure level for validation errors.
    ///
    /// - `log::Level::Error`: Only fail on Error level messages (default)
    /// - `log::Level::Warn`: Fail on Warning level and above (strict mode)
    pub fn set_fail_level(&mut self, level: log::Level) {
        self.fail_level = level;
    }
}

/// Decodes `data` into `image` with the default validation policy.
///
/// Either fills every sample of `image` or fails.
pub fn decompress(
    image: &mut RawImage,
    data: &[u8],
    variant: tables::TableVariant,
    has_low_bits: bool,
) -> Result<()> {
    Decompressor::default()
        .decompress(image, data, variant, has_low_bits)
        .map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::block::BLOCK_SIZE;
    use crate::process::tables::{DecoderPair, TableVariant};
    use crate::utils::errors::{ErrorKind, error_kind};
    use crate::utils::test_stream::StreamBuilder;

    fn with_header(stream: &[u8]) -> Vec<u8> {
        let mut data = vec![0u8; HIGH_BITS_OFFSET];
        data.extend_from_slice(stream);
        data
    }

    #[test]
    fn tiny_image() -> Result<()> {
        let tables = DecoderPair::new(TableVariant::V0)?;
        let mut builder = StreamBuilder::new();
        builder
            .coefficient(tables.for_index(0), 0, 100)
            .coefficient(tables.for_index(1), 0, -37)
            .symbol(tables.for_index(1), 0x00);
        let data = with_header(&builder.finish());

        let mut image = RawImage::new(2, 1)?;
        decompress(&mut image, &data, TableVariant::V0, false)?;
        assert_eq!(image.samples(), &[612, 475]);
        Ok(())
    }

    #[test]
    fn carry_chains_leading_coefficients() -> Result<()> {
        let tables = DecoderPair::new(TableVariant::V1)?;
        let dc = [40, -15, 0, 7];
        let mut builder = StreamBuilder::new();
        for diff in dc {
            builder
                .coefficient(tables.for_index(0), 0, diff)
                .symbol(tables.for_index(1), 0x00);
        }
        let data = with_header(&builder.finish());

        // One block per row: every row restarts from 512 plus the running carry.
        let mut image = RawImage::new(BLOCK_SIZE, 4)?;
        let summary =
            Decompressor::default().decompress(&mut image, &data, TableVariant::V1, false)?;

        assert_eq!(summary.blocks, 4);
        assert_eq!(summary.bands, 1);
        let mut carry = 0;
        for (y, diff) in dc.into_iter().enumerate() {
            carry += diff;
            assert_eq!(image.row(y)[0], (512 + carry) as u16);
            assert!(image.row(y)[1..].iter().step_by(2).all(|&s| s == 512));
            assert!(image.row(y)[2..].iter().step_by(2).all(|&s| s == (512 + carry) as u16));
        }
        assert_eq!(summary.bits_consumed, builder.bit_len());
        Ok(())
    }

    #[test]
    fn bands_of_eight_rows() -> Result<()> {
        let tables = DecoderPair::new(TableVariant::V2)?;
        let mut builder = StreamBuilder::new();
        // 8 + 8 + 3 rows of 16 samples: 2, 2 and 0 -> 1 blocks.
        for _ in 0..5 {
            builder
                .coefficient(tables.for_index(0), 0, 0)
                .symbol(tables.for_index(1), 0x00);
        }
        let data = with_header(&builder.finish());

        let mut image = RawImage::new(16, 19)?;
        let summary =
            Decompressor::default().decompress(&mut image, &data, TableVariant::V2, false)?;
        assert_eq!(summary.bands, 3);
        assert_eq!(summary.blocks, 5);
        assert!(image.samples().iter().all(|&s| s == 512));
        Ok(())
    }

    #[test]
    fn low_bit_plane_precedes_the_stream() -> Result<()> {
        let tables = DecoderPair::new(TableVariant::V0)?;
        let mut builder = StreamBuilder::new();
        builder
            .coefficient(tables.for_index(0), 0, -12)
            .symbol(tables.for_index(1), 0x00);
        let stream = builder.finish();

        let (width, height) = (8, 8);
        let layout = StreamLayout::new(width, height, true);
        assert_eq!(layout.low_bits, Some(26..42));
        assert_eq!(layout.high_bits_offset, 556);

        let mut data = vec![0u8; layout.high_bits_offset];
        data[26..42].fill(0b0101_0101);
        data.extend_from_slice(&stream);

        let mut image = RawImage::new(width, height)?;
        let summary =
            Decompressor::default().decompress(&mut image, &data, TableVariant::V0, true)?;

        assert_eq!(summary.low_bit_bytes, 16);
        // One block spans all eight rows, and only row 0 sees the leading -12.
        assert!(image.row(0).iter().step_by(2).all(|&s| s == (500 << 2) | 1));
        assert!(image.row(0).iter().skip(1).step_by(2).all(|&s| s == (512 << 2) | 1));
        assert!((1..height).all(|y| image.row(y).iter().all(|&s| s == (512 << 2) | 1)));
        Ok(())
    }

    #[test]
    fn error_classes() -> Result<()> {
        let mut image = RawImage::new(64, 1)?;

        let err = decompress(&mut image, &[0u8; 100], TableVariant::V0, false).unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::OutOfRange));

        let err = decompress(&mut image, &[0u8; 540], TableVariant::V0, false).unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::OutOfRange));

        let err = TableVariant::try_from(3).map_err(anyhow::Error::from).unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::InvalidInput));
        Ok(())
    }
}
