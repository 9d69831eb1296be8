//! Decoding of one 64-coefficient block.

use anyhow::Result;

use crate::process::tables::DecoderPair;
use crate::utils::bitstream_io::BitstreamIoReader;
use crate::utils::huffman::HuffmanTable;

pub const BLOCK_SIZE: usize = 64;

/// Differences for 64 consecutive samples; index 0 is the DC difference.
pub type CoefficientBlock = [i32; BLOCK_SIZE];

const END_OF_BLOCK: u8 = 0x00;
const FILL: u8 = 0xff;

/// How decoding of a block stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockEnd {
    /// An end-of-block symbol after the first position.
    EndOfBlock,
    /// Every position was visited.
    Complete,
    /// A run skipped past the last position; its magnitude bits were consumed and
    /// dropped.
    Overflow,
}

/// Decodes one block into `block`, which must be zeroed by the caller.
///
/// The bit position after this call is exactly the start of the next block, even
/// when a run overflows the block: the magnitude bits of the overflowing symbol are
/// always read.
pub fn decode_block(
    block: &mut CoefficientBlock,
    tables: &DecoderPair,
    reader: &mut BitstreamIoReader,
) -> Result<BlockEnd> {
    let mut i = 0usize;

    while i < BLOCK_SIZE {
        let leaf = reader.get_huffman(tables.for_index(i))?;

        if leaf == END_OF_BLOCK && i > 0 {
            return Ok(BlockEnd::EndOfBlock);
        }

        if leaf == FILL {
            continue;
        }

        i += (leaf >> 4) as usize;

        let len = (leaf & 0x0f) as u32;

        if len != 0 {
            let raw = reader.get_n(len)?;

            if i >= BLOCK_SIZE {
                return Ok(BlockEnd::Overflow);
            }

            block[i] = HuffmanTable::sign_extend(raw, len);
        }

        i += 1;
    }

    Ok(BlockEnd::Complete)
}
