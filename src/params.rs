use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::cli::command::RawArgs;
use crw::process::tables::TableVariant;

/// Raw data parameters as stored in a `--params` file.
///
/// ```yaml
/// width: 2672
/// height: 1768
/// variant: 2
/// low_bits: true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<u32>,
    #[serde(default)]
    pub low_bits: bool,
}

impl RawParams {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let yaml = fs::read_to_string(path)
            .with_context(|| format!("Failed to read parameter file {}", path.display()))?;

        Self::from_yaml(&yaml)
            .with_context(|| format!("Failed to parse parameter file {}", path.display()))
    }

    /// Applies command-line values on top of these.
    pub fn merge(mut self, args: &RawArgs) -> Self {
        self.width = args.width.or(self.width);
        self.height = args.height.or(self.height);
        self.variant = args.variant.or(self.variant);
        self.low_bits |= args.low_bits;
        self
    }

    pub fn resolve(&self) -> Result<DecodeParams> {
        let width = self
            .width
            .ok_or_else(|| anyhow!("Image width is required (--width or params file)"))?;
        let height = self
            .height
            .ok_or_else(|| anyhow!("Image height is required (--height or params file)"))?;
        let variant = TableVariant::try_from(self.variant.unwrap_or_default())?;

        Ok(DecodeParams {
            width,
            height,
            variant,
            low_bits: self.low_bits,
        })
    }
}

/// Fully specified parameters for one decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeParams {
    pub width: usize,
    pub height: usize,
    pub variant: TableVariant,
    pub low_bits: bool,
}

impl DecodeParams {
    pub fn from_args(args: &RawArgs) -> Result<Self> {
        let base = match &args.params {
            Some(path) => RawParams::load(path)?,
            None => RawParams::default(),
        };

        base.merge(args).resolve()
    }

    /// Largest sample value the decoded image can hold.
    pub fn max_value(&self) -> u16 {
        if self.low_bits { 4095 } else { 1023 }
    }
}
