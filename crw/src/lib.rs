#![doc = include_str!("../README.md")]
//!
//! ## Technical Overview
//!
//! ### Data Layout
//!
//! | Offset | Length | Contents |
//! |--------|--------|----------|
//! | 0 | 26 | Unused by the decoder |
//! | 26 | `width * height / 4` | Packed low bits, when present |
//! | 540 (+ low-bit length) | rest | Byte-stuffed Huffman stream |
//!
//! ### High Bits
//!
//! The image is coded in bands of 8 rows. Each band holds `lines * width / 64`
//! blocks of 64 differences, coded like JPEG AC coefficients with a separate table
//! for the first position. The first difference of each block is relative to the
//! previous block's; the others feed two predictors (even and odd positions) that
//! restart at 512 on every row. Reconstructed samples are 10 bits wide.
//!
//! ### Low Bits
//!
//! With low bits present, each sample gains two more bits from the packed plane,
//! giving 12-bit output.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use crw::process::{Decompressor, tables::TableVariant};
//! use crw::structs::image::RawImage;
//!
//! let data = std::fs::read("image.raw")?;
//!
//! let mut image = RawImage::new(2672, 1768)?;
//! let mut decompressor = Decompressor::default();
//! decompressor.set_fail_level(log::Level::Warn);
//!
//! let summary = decompressor.decompress(&mut image, &data, TableVariant::V2, true)?;
//! println!("{} blocks, first sample {}", summary.blocks, image.row(0)[0]);
//! # Ok::<(), anyhow::Error>(())
//! ```

/// Decompression stages.
///
/// 1. **Tables** ([`process::tables`]): Builds the Huffman decode tables of a
///    variant.
///
/// 2. **Blocks** ([`process::block`]): Decodes 64 differences at a time.
///
/// 3. **Prediction** ([`process::predict`]): Turns differences into samples.
///
/// 4. **Low bits** ([`process::lowbits`]): Merges the two-bit refinement plane.
pub mod process;

/// Data structures shared by the stages.
///
/// - **Raw Image** ([`structs::image`]): Row-major 16-bit sample buffer
pub mod structs;

/// Utility functions and supporting infrastructure.
///
/// - **Bitstream I/O** ([`utils::bitstream_io`]): Bit-level reading with byte de-stuffing
/// - **Byte Access** ([`utils::byte_stream`]): Bounds-checked byte windows
/// - **Huffman Tables** ([`utils::huffman`]): Canonical code construction and lookup
/// - **Error Handling** ([`utils::errors`]): Error types
pub mod utils;
