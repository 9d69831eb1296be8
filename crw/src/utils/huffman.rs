//! Canonical Huffman tables built from a code-length histogram.
//!
//! A canonical code is fully described by how many codes exist of each length
//! (1 to 16 bits) and the ordered list of leaf symbols. Codes of equal length are
//! assigned consecutive values in leaf order, and the first code of each length is
//! derived from the last code of the previous length.
//!
//! For example, the histogram `[0, 1, 4, 2, 3, 1, 2, 0, ...]` with the leaves
//! `04 03 05 06 02 07 01 08 09 00 0a 0b ff` produces:
//!
//! ```text
//! 00        0x04
//! 010       0x03
//! 011       0x05
//! 100       0x06
//! 101       0x02
//! 1100      0x07
//! 1101      0x01
//! 11100     0x08
//! 11101     0x09
//! 11110     0x00
//! 111110    0x0a
//! 1111110   0x0b
//! 1111111   0xff
//! ```

use anyhow::{Result, bail};

use crate::utils::errors::TableError;

pub const MAX_CODE_LENGTH: usize = 16;

/// A code word with its length in bits. `code` holds the bits right-aligned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalCode {
    pub code: u16,
    pub length: u8,
}

/// Decode table for one canonical Huffman code.
///
/// Decoding walks the code one bit at a time and compares against the largest code
/// of the current length, so its cost is proportional to the code length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanTable {
    values: Vec<u8>,
    codes: Vec<CanonicalCode>,
    // Indexed by code length; -1 when no code of that length exists.
    max_code: [i32; MAX_CODE_LENGTH + 1],
    // Added to a code of the given length to get its index into `values`.
    val_offset: [i32; MAX_CODE_LENGTH + 1],
}

impl HuffmanTable {
    pub fn new(histogram: &[u8; MAX_CODE_LENGTH], leaves: &[u8]) -> Result<Self> {
        let declared: usize = histogram.iter().map(|&n| n as usize).sum();

        if declared > 256 {
            bail!(TableError::TooManyCodes(declared));
        }

        if declared != leaves.len() {
            bail!(TableError::LeafCountMismatch {
                declared,
                actual: leaves.len()
            });
        }

        let mut codes = Vec::with_capacity(declared);
        let mut max_code = [-1i32; MAX_CODE_LENGTH + 1];
        let mut val_offset = [0i32; MAX_CODE_LENGTH + 1];

        let mut code = 0u32;
        let mut index = 0usize;

        for length in 1..=MAX_CODE_LENGTH {
            let count = histogram[length - 1] as u32;

            if count > 0 {
                if code + count > 1 << length {
                    bail!(TableError::CodeSpaceOverflow(length));
                }

                val_offset[length] = index as i32 - code as i32;

                for _ in 0..count {
                    codes.push(CanonicalCode {
                        code: code as u16,
                        length: length as u8,
                    });
                    code += 1;
                    index += 1;
                }

                max_code[length] = code as i32 - 1;
            }

            code <<= 1;
        }

        Ok(Self {
            values: leaves.to_vec(),
            codes,
            max_code,
            val_offset,
        })
    }

    /// Looks up a partial code of `length` bits.
    ///
    /// Returns `None` while the bits read so far are only a prefix of a longer code.
    #[inline(always)]
    pub fn lookup(&self, code: u32, length: usize) -> Option<u8> {
        if length > MAX_CODE_LENGTH || code as i32 > self.max_code[length] {
            return None;
        }

        let index = code as i32 + self.val_offset[length];
        usize::try_from(index)
            .ok()
            .and_then(|index| self.values.get(index).copied())
    }

    /// The code assigned to the first leaf equal to `symbol`.
    pub fn code_for(&self, symbol: u8) -> Option<CanonicalCode> {
        self.values
            .iter()
            .position(|&value| value == symbol)
            .map(|index| self.codes[index])
    }

    /// Leaves paired with their codes, in increasing code order.
    pub fn codes(&self) -> impl Iterator<Item = (u8, CanonicalCode)> + '_ {
        self.values.iter().copied().zip(self.codes.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Maps a `len`-bit magnitude field to its signed value, JPEG style.
    ///
    /// A clear top bit marks a negative value: `raw - (2^len - 1)`.
    #[inline(always)]
    pub const fn sign_extend(raw: u32, len: u32) -> i32 {
        if len == 0 {
            return 0;
        }

        if raw & (1 << (len - 1)) == 0 {
            raw as i32 - ((1i32 << len) - 1)
        } else {
            raw as i32
        }
    }
}
