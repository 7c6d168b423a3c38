//! Configuration path types for multi-file loading.

use std::path::{Path, PathBuf};

/// A configuration source - either a single file or a directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigPath {
    /// A single configuration file.
    File(PathBuf),
    /// A directory containing configuration files.
    Dir(PathBuf),
}

impl ConfigPath {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    pub fn dir(path: impl Into<PathBuf>) -> Self {
        Self::Dir(path.into())
    }

    /// Classify a list of CLI-supplied paths into files and directories.
    pub fn from_cli_paths(paths: &[PathBuf]) -> Vec<Self> {
        paths
            .iter()
            .map(|p| {
                if p.is_dir() {
                    ConfigPath::dir(p)
                } else {
                    ConfigPath::file(p)
                }
            })
            .collect()
    }
}

/// Check if a path has a YAML extension.
pub fn is_yaml_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext == "yaml" || ext == "yml")
        .unwrap_or(false)
}
