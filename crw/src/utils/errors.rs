#[macro_export]
macro_rules! log_or_err {
    ($state:expr, $level:expr, $err:expr $(,)?) => {{
        if $level <= $state.fail_level {
            return Err($err);
        } else {
            match $level {
                ::log::Level::Error => ::log::error!("{}", $err),
                ::log::Level::Warn => ::log::warn!("{}", $err),
                ::log::Level::Info => ::log::info!("{}", $err),
                ::log::Level::Debug => ::log::debug!("{}", $err),
                ::log::Level::Trace => ::log::trace!("{}", $err),
            }
        }
    }};
}

/// Failure classes of a decompression call.
///
/// Every error raised by this crate belongs to exactly one class, and all of them
/// abort the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller passed parameters the decoder cannot work with.
    InvalidInput,
    /// The compressed data decodes to something outside the sample domain.
    StreamCorruption,
    /// A read ran past the available bytes or bits.
    OutOfRange,
}

/// Classifies an error returned by this crate.
///
/// Returns `None` for errors that did not originate here.
pub fn error_kind(err: &anyhow::Error) -> Option<ErrorKind> {
    if err.is::<TableError>() || err.is::<InputError>() {
        Some(ErrorKind::InvalidInput)
    } else if err.is::<CorruptionError>() {
        Some(ErrorKind::StreamCorruption)
    } else if err.is::<RangeError>() {
        Some(ErrorKind::OutOfRange)
    } else {
        None
    }
}

#[derive(thiserror::Error, Debug)]
pub enum TableError {
    #[error("Invalid table number specified: {0}, expected 0 or 1")]
    InvalidSelector(usize),

    #[error("Invalid decoder table variant: {0}, expected 0, 1 or 2")]
    InvalidVariant(u32),

    #[error("Leaf count mismatch: histogram declares {declared} codes, got {actual} leaves")]
    LeafCountMismatch { declared: usize, actual: usize },

    #[error("Too many Huffman codes: {0} > 256")]
    TooManyCodes(usize),

    #[error("Code lengths over-subscribe the code space at length {0}")]
    CodeSpaceOverflow(usize),
}

#[derive(thiserror::Error, Debug)]
pub enum InputError {
    #[error("Image dimensions must be non-zero, got {width}x{height}")]
    EmptyImage { width: usize, height: usize },

    #[error("Image dimensions {width}x{height} overflow the addressable size")]
    ImageTooLarge { width: usize, height: usize },

    #[error(
        "Band at row {row} leaves {samples} trailing samples unwritten: {lines} rows of width {width} is not a whole number of blocks"
    )]
    PartialBlock {
        row: usize,
        lines: usize,
        width: usize,
        samples: usize,
    },

    #[error("Width {0} is not a multiple of 4, low bits do not pack into whole bytes")]
    UnalignedLowBits(usize),
}

#[derive(thiserror::Error, Debug)]
pub enum CorruptionError {
    #[error("Error decompressing: sample {value} at row {row}, column {col} exceeds 10 bits")]
    SampleOutOfRange { row: usize, col: usize, value: i32 },

    #[error("No Huffman code matches the bits at stream position {0}")]
    UnmatchedCode(u64),
}

#[derive(thiserror::Error, Debug)]
pub enum RangeError {
    #[error("Byte range {offset}+{len} is out of bounds of a {size}-byte buffer")]
    SubView {
        offset: usize,
        len: usize,
        size: usize,
    },

    #[error("Byte stream exhausted at position {0}")]
    ByteStreamExhausted(usize),

    #[error("get_n({requested}): out of bounds bits at {position}")]
    BitstreamExhausted { requested: u32, position: u64 },
}
