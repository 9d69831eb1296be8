//! Data structures shared by the decoding stages.

pub mod image;
