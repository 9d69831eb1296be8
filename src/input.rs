use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Reads a whole raw data file, or stdin when the path is "-".
pub struct InputReader {
    reader: Box<dyn Read>,
    path: PathBuf,
}

impl InputReader {
    pub fn new<P: AsRef<Path>>(input_path: P) -> Result<Self> {
        let path = input_path.as_ref().to_path_buf();
        let reader: Box<dyn Read> = if is_pipe(&path) {
            Box::new(io::stdin().lock())
        } else {
            let file = File::open(&path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            Box::new(BufReader::new(file))
        };

        Ok(Self { reader, path })
    }

    /// Reads the remaining input into memory.
    pub fn read_all(&mut self) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        self.reader
            .read_to_end(&mut data)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        Ok(data)
    }
}

pub fn is_pipe(path: &Path) -> bool {
    path.as_os_str() == "-"
}
