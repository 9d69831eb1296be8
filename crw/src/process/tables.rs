//! Huffman decoder tables for the three known encoder variants.
//!
//! Each variant carries two descriptors in their historical packed form: 16
//! code-length counts followed by the leaf values. The first
//! descriptor codes the leading coefficient of a block, the second codes run/size
//! pairs for the remaining 63 positions, with `0x00` as end of block.

use anyhow::{Result, bail};

use crate::utils::errors::TableError;
use crate::utils::huffman::{HuffmanTable, MAX_CODE_LENGTH};

const FIRST_TREE: [[u8; 29]; 3] = [
    [
        0, 1, 4, 2, 3, 1, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x04, 0x03, 0x05, 0x06, 0x02, 0x07, 0x01,
        0x08, 0x09, 0x00, 0x0a, 0x0b, 0xff,
    ],
    [
        0, 2, 2, 3, 1, 1, 1, 1, 2, 0, 0, 0, 0, 0, 0, 0, 0x03, 0x02, 0x04, 0x01, 0x05, 0x00, 0x06,
        0x07, 0x09, 0x08, 0x0a, 0x0b, 0xff,
    ],
    [
        0, 0, 6, 3, 1, 1, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x06, 0x05, 0x07, 0x04, 0x08, 0x03, 0x09,
        0x02, 0x00, 0x0a, 0x01, 0x0b, 0xff,
    ],
];

#[rustfmt::skip]
const SECOND_TREE: [[u8; 180]; 3] = [
    [
        0,    2,    2,    2,    1,    4,    2,    1,    2,    5,    1,    1,
        0,    0,    0,    139,  0x03, 0x04, 0x02, 0x05, 0x01, 0x06, 0x07, 0x08,
        0x12, 0x13, 0x11, 0x14, 0x09, 0x15, 0x22, 0x00, 0x21, 0x16, 0x0a, 0xf0,
        0x23, 0x17, 0x24, 0x31, 0x32, 0x18, 0x19, 0x33, 0x25, 0x41, 0x34, 0x42,
        0x35, 0x51, 0x36, 0x37, 0x38, 0x29, 0x79, 0x26, 0x1a, 0x39, 0x56, 0x57,
        0x28, 0x27, 0x52, 0x55, 0x58, 0x43, 0x76, 0x59, 0x77, 0x54, 0x61, 0xf9,
        0x71, 0x78, 0x75, 0x96, 0x97, 0x49, 0xb7, 0x53, 0xd7, 0x74, 0xb6, 0x98,
        0x47, 0x48, 0x95, 0x69, 0x99, 0x91, 0xfa, 0xb8, 0x68, 0xb5, 0xb9, 0xd6,
        0xf7, 0xd8, 0x67, 0x46, 0x45, 0x94, 0x89, 0xf8, 0x81, 0xd5, 0xf6, 0xb4,
        0x88, 0xb1, 0x2a, 0x44, 0x72, 0xd9, 0x87, 0x66, 0xd4, 0xf5, 0x3a, 0xa7,
        0x73, 0xa9, 0xa8, 0x86, 0x62, 0xc7, 0x65, 0xc8, 0xc9, 0xa1, 0xf4, 0xd1,
        0xe9, 0x5a, 0x92, 0x85, 0xa6, 0xe7, 0x93, 0xe8, 0xc1, 0xc6, 0x7a, 0x64,
        0xe1, 0x4a, 0x6a, 0xe6, 0xb3, 0xf1, 0xd3, 0xa5, 0x8a, 0xb2, 0x9a, 0xba,
        0x84, 0xa4, 0x63, 0xe5, 0xc5, 0xf3, 0xd2, 0xc4, 0x82, 0xaa, 0xda, 0xe4,
        0xf2, 0xca, 0x83, 0xa3, 0xa2, 0xc3, 0xea, 0xc2, 0xe2, 0xe3, 0xff, 0xff,
    ],
    [
        0,    2,    2,    1,    4,    1,    4,    1,    3,    3,    1,    0,
        0,    0,    0,    140,  0x02, 0x03, 0x01, 0x04, 0x05, 0x12, 0x11, 0x06,
        0x13, 0x07, 0x08, 0x14, 0x22, 0x09, 0x21, 0x00, 0x23, 0x15, 0x31, 0x32,
        0x0a, 0x16, 0xf0, 0x24, 0x33, 0x41, 0x42, 0x19, 0x17, 0x25, 0x18, 0x51,
        0x34, 0x43, 0x52, 0x29, 0x35, 0x61, 0x39, 0x71, 0x62, 0x36, 0x53, 0x26,
        0x38, 0x1a, 0x37, 0x81, 0x27, 0x91, 0x79, 0x55, 0x45, 0x28, 0x72, 0x59,
        0xa1, 0xb1, 0x44, 0x69, 0x54, 0x58, 0xd1, 0xfa, 0x57, 0xe1, 0xf1, 0xb9,
        0x49, 0x47, 0x63, 0x6a, 0xf9, 0x56, 0x46, 0xa8, 0x2a, 0x4a, 0x78, 0x99,
        0x3a, 0x75, 0x74, 0x86, 0x65, 0xc1, 0x76, 0xb6, 0x96, 0xd6, 0x89, 0x85,
        0xc9, 0xf5, 0x95, 0xb4, 0xc7, 0xf7, 0x8a, 0x97, 0xb8, 0x73, 0xb7, 0xd8,
        0xd9, 0x87, 0xa7, 0x7a, 0x48, 0x82, 0x84, 0xea, 0xf4, 0xa6, 0xc5, 0x5a,
        0x94, 0xa4, 0xc6, 0x92, 0xc3, 0x68, 0xb5, 0xc8, 0xe4, 0xe5, 0xe6, 0xe9,
        0xa2, 0xa3, 0xe3, 0xc2, 0x66, 0x67, 0x93, 0xaa, 0xd4, 0xd5, 0xe7, 0xf8,
        0x88, 0x9a, 0xd7, 0x77, 0xc4, 0x64, 0xe2, 0x98, 0xa5, 0xca, 0xda, 0xe8,
        0xf3, 0xf6, 0xa9, 0xb2, 0xb3, 0xf2, 0xd2, 0x83, 0xba, 0xd3, 0xff, 0xff,
    ],
    [
        0,    0,    6,    2,    1,    3,    3,    2,    5,    1,    2,    2,
        8,    10,   0,    117,  0x04, 0x05, 0x03, 0x06, 0x02, 0x07, 0x01, 0x08,
        0x09, 0x12, 0x13, 0x14, 0x11, 0x15, 0x0a, 0x16, 0x17, 0xf0, 0x00, 0x22,
        0x21, 0x18, 0x23, 0x19, 0x24, 0x32, 0x31, 0x25, 0x33, 0x38, 0x37, 0x34,
        0x35, 0x36, 0x39, 0x79, 0x57, 0x58, 0x59, 0x28, 0x56, 0x78, 0x27, 0x41,
        0x29, 0x77, 0x26, 0x42, 0x76, 0x99, 0x1a, 0x55, 0x98, 0x97, 0xf9, 0x48,
        0x54, 0x96, 0x89, 0x47, 0xb7, 0x49, 0xfa, 0x75, 0x68, 0xb6, 0x67, 0x69,
        0xb9, 0xb8, 0xd8, 0x52, 0xd7, 0x88, 0xb5, 0x74, 0x51, 0x46, 0xd9, 0xf8,
        0x3a, 0xd6, 0x87, 0x45, 0x7a, 0x95, 0xd5, 0xf6, 0x86, 0xb4, 0xa9, 0x94,
        0x53, 0x2a, 0xa8, 0x43, 0xf5, 0xf7, 0xd4, 0x66, 0xa7, 0x5a, 0x44, 0x8a,
        0xc9, 0xe8, 0xc8, 0xe7, 0x9a, 0x6a, 0x73, 0x4a, 0x61, 0xc7, 0xf4, 0xc6,
        0x65, 0xe9, 0x72, 0xe6, 0x71, 0x91, 0x93, 0xa6, 0xda, 0x92, 0x85, 0x62,
        0xf3, 0xc5, 0xb2, 0xa4, 0x84, 0xba, 0x64, 0xa5, 0xb3, 0xd2, 0x81, 0xe5,
        0xd3, 0xaa, 0xc4, 0xca, 0xf2, 0xb1, 0xe4, 0xd1, 0x83, 0x63, 0xea, 0xc3,
        0xe2, 0x82, 0xf1, 0xa3, 0xc2, 0xa1, 0xc1, 0xe3, 0xa2, 0xe1, 0xff, 0xff,
    ],
];

/// Encoder variant, selecting one of the built-in descriptor sets.
///
/// Which variant a file uses is recorded in its container header; this crate only
/// accepts it as a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableVariant {
    #[default]
    V0 = 0,
    V1 = 1,
    V2 = 2,
}

impl TryFrom<u32> for TableVariant {
    type Error = TableError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(TableVariant::V0),
            1 => Ok(TableVariant::V1),
            2 => Ok(TableVariant::V2),
            _ => Err(TableError::InvalidVariant(value)),
        }
    }
}

/// Code-length histogram and leaf values of one Huffman table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor {
    pub histogram: [u8; MAX_CODE_LENGTH],
    pub leaves: &'static [u8],
}

impl Descriptor {
    /// Splits the packed form; trailing bytes past the declared leaf count are padding.
    fn unpack(packed: &'static [u8]) -> Self {
        let mut histogram = [0u8; MAX_CODE_LENGTH];
        histogram.copy_from_slice(&packed[..MAX_CODE_LENGTH]);

        let count: usize = histogram.iter().map(|&n| n as usize).sum();

        Self {
            histogram,
            leaves: &packed[MAX_CODE_LENGTH..MAX_CODE_LENGTH + count],
        }
    }
}

/// Returns the first- and second-position descriptors of a variant.
pub fn select_descriptors(variant: TableVariant) -> (Descriptor, Descriptor) {
    let index = variant as usize;

    (
        Descriptor::unpack(&FIRST_TREE[index]),
        Descriptor::unpack(&SECOND_TREE[index]),
    )
}

/// Builds the decode table for position class `selector`.
///
/// `selector` 0 is the table for a block's leading coefficient, 1 the table for
/// every later position.
pub fn build_table(
    selector: usize,
    histogram: &[u8; MAX_CODE_LENGTH],
    leaves: &[u8],
) -> Result<HuffmanTable> {
    if selector > 1 {
        bail!(TableError::InvalidSelector(selector));
    }

    HuffmanTable::new(histogram, leaves)
}

/// The two tables used throughout one decompression call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderPair {
    tables: [HuffmanTable; 2],
}

impl DecoderPair {
    pub fn new(variant: TableVariant) -> Result<Self> {
        let (first, second) = select_descriptors(variant);

        Ok(Self {
            tables: [
                build_table(0, &first.histogram, first.leaves)?,
                build_table(1, &second.histogram, second.leaves)?,
            ],
        })
    }

    /// Table used for coefficient `index` of a block.
    #[inline(always)]
    pub fn for_index(&self, index: usize) -> &HuffmanTable {
        &self.tables[(index > 0) as usize]
    }
}
