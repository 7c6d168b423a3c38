//! Compression handling for dump files.
//!
//! Dump files arrive bzip2-compressed (`.xml.bz2`), gzip-compressed
//! (`.xml.gz`), or plain (`.xml`). Decompression is streamed; a file is
//! never loaded into memory whole.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use bzip2::read::BzDecoder;
use flate2::read::MultiGzDecoder;
use serde::{Deserialize, Serialize};

const READ_BUFFER_SIZE: usize = 1024 * 1024;

/// Compression format of input dump files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionFormat {
    /// Sniff the format from the file extension.
    #[default]
    Auto,
    Bzip2,
    Gzip,
    None,
}

impl CompressionFormat {
    /// Detect the format from a file extension.
    pub fn detect(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("bz2") => CompressionFormat::Bzip2,
            Some("gz") => CompressionFormat::Gzip,
            _ => CompressionFormat::None,
        }
    }

    /// Resolve `Auto` against a concrete path.
    pub fn resolve(self, path: &Path) -> Self {
        match self {
            CompressionFormat::Auto => Self::detect(path),
            other => other,
        }
    }

    /// Open a dump file as a buffered, decompressing reader.
    pub fn open(self, path: &Path) -> std::io::Result<Box<dyn BufRead + Send>> {
        let file = File::open(path)?;
        Ok(match self.resolve(path) {
            CompressionFormat::Bzip2 => {
                Box::new(BufReader::with_capacity(READ_BUFFER_SIZE, BzDecoder::new(file)))
            }
            CompressionFormat::Gzip => Box::new(BufReader::with_capacity(
                READ_BUFFER_SIZE,
                MultiGzDecoder::new(file),
            )),
            CompressionFormat::Auto | CompressionFormat::None => {
                Box::new(BufReader::with_capacity(READ_BUFFER_SIZE, file))
            }
        })
    }

    /// Human-readable name (for logging).
    pub fn name(&self) -> &'static str {
        match self {
            CompressionFormat::Auto => "auto",
            CompressionFormat::Bzip2 => "bzip2",
            CompressionFormat::Gzip => "gzip",
            CompressionFormat::None => "none",
        }
    }
}
