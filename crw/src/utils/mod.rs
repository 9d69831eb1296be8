//! Supporting infrastructure for the decoding stages.
//!
//! Provides bounds-checked byte access, the de-stuffing bit reader, canonical
//! Huffman tables, and error types.

pub mod bitstream_io;
pub mod byte_stream;
pub mod errors;
pub mod huffman;

#[cfg(test)]
pub(crate) mod test_stream;
