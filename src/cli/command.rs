use std::path::PathBuf;

use clap::{Args, Parser as ClapParser, Subcommand, ValueEnum};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\ngit:       ",
    env!("VERGEN_GIT_DESCRIBE"),
    "\nbuilt:     ",
    env!("BUILD_TIMESTAMP"),
    "\ncrw:       ",
    env!("CRW_VERSION"),
);

#[derive(Debug, ClapParser)]
#[command(
    name         = env!("CARGO_PKG_NAME"),
    version      = env!("CARGO_PKG_VERSION"),
    long_version = LONG_VERSION,
    about        = "Tools for inspecting and decompressing Canon CRW raw image data",
    long_about   = None,
)]
pub struct Cli {
    /// Set the log level
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub loglevel: LogLevel,

    /// Treat warnings as fatal errors (fail on first warning).
    #[arg(long, global = true)]
    pub strict: bool,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Show progress bars during operations.
    #[arg(long, global = true)]
    pub progress: bool,

    /// Choose an operation to perform.
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Decompress raw data into 16-bit samples.
    Decode(DecodeArgs),

    /// Print the data layout implied by the raw parameters.
    Info(InfoArgs),
}

/// Geometry and decoder settings of the raw data.
///
/// Values given here override those read from `--params`.
#[derive(Debug, Clone, Default, Args)]
pub struct RawArgs {
    /// YAML file with width, height, variant and low_bits.
    #[arg(long, value_name = "FILE")]
    pub params: Option<PathBuf>,

    /// Image width in samples.
    #[arg(long)]
    pub width: Option<usize>,

    /// Image height in rows.
    #[arg(long)]
    pub height: Option<usize>,

    /// Decoder table variant (0-2).
    #[arg(long, value_name = "INDEX")]
    pub variant: Option<u32>,

    /// The data carries a plane of uncompressed low bits.
    #[arg(long)]
    pub low_bits: bool,
}

#[derive(Debug, Args)]
pub struct DecodeArgs {
    /// Raw data files (use "-" for stdin).
    #[arg(value_name = "INPUT", required = true)]
    pub input: Vec<PathBuf>,

    #[command(flatten)]
    pub raw: RawArgs,

    /// Output file, or directory when decoding several inputs.
    #[arg(long, value_name = "PATH")]
    pub output_path: Option<PathBuf>,

    /// Image format for output.
    #[arg(long, value_enum, default_value_t = OutputFormat::Pgm)]
    pub format: OutputFormat,
}

#[derive(Debug, Args)]
pub struct InfoArgs {
    /// Raw data file (use "-" for stdin).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    #[command(flatten)]
    pub raw: RawArgs,

    /// Print the report as YAML.
    #[arg(long)]
    pub yaml: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    /// Disable logging output.
    Off,
    /// No output except errors.
    Error,
    /// Show warnings and errors.
    Warn,
    /// Show info, warnings and errors (default).
    Info,
    /// Show debug, info, warnings and errors.
    Debug,
    /// Show all log messages including trace.
    Trace,
}

impl LogLevel {
    /// Convert LogLevel to log::LevelFilter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Colorized human-readable text.
    Plain,
    /// Structured JSON per log record.
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum OutputFormat {
    /// Binary PGM (P5) with big-endian 16-bit samples.
    Pgm,
    /// Headerless 16-bit little-endian samples.
    Raw16,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Pgm => "pgm",
            OutputFormat::Raw16 => "raw16",
        }
    }
}
