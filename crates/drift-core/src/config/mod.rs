//! Multi-file configuration loading.
//!
//! Configuration may be split across several YAML files and directories;
//! later sources merge over earlier ones. The concrete config type decides
//! what "merge" means field by field.

mod path;

use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::ConfigError;

pub use path::{ConfigPath, is_yaml_file};

/// Trait for configs that can be merged from multiple files.
pub trait Mergeable: Sized + Default + DeserializeOwned {
    /// Merge another parsed config into this one. Values present in
    /// `other` take precedence.
    fn merge(&mut self, other: Self);

    /// Parse a single YAML document.
    fn parse_yaml(contents: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(contents).map_err(|source| ConfigError::YamlParse { source })
    }
}

/// Load and merge a config from a list of files and directories.
///
/// Directories are expanded to their YAML files in lexical order. All
/// sources are attempted; if any fail, the combined errors are reported.
pub fn load_from_paths<C: Mergeable>(paths: &[ConfigPath]) -> Result<C, ConfigError> {
    let mut config = C::default();
    let mut errors = Vec::new();

    for path in paths {
        match path {
            ConfigPath::File(file_path) => match load_file::<C>(file_path) {
                Ok(partial) => config.merge(partial),
                Err(e) => errors.push(format!("{}: {}", file_path.display(), e)),
            },
            ConfigPath::Dir(dir_path) => match load_dir::<C>(dir_path) {
                Ok(partial) => config.merge(partial),
                Err(e) => errors.push(format!("{}: {}", dir_path.display(), e)),
            },
        }
    }

    if !errors.is_empty() {
        return Err(ConfigError::MultipleErrors { errors });
    }
    Ok(config)
}

fn load_file<C: Mergeable>(path: &Path) -> Result<C, ConfigError> {
    if !is_yaml_file(path) {
        return Err(ConfigError::UnsupportedFormat {
            path: path.to_path_buf(),
        });
    }

    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    C::parse_yaml(&contents)
}

fn load_dir<C: Mergeable>(dir: &Path) -> Result<C, ConfigError> {
    let mut config = C::default();
    let mut errors = Vec::new();

    let mut files: Vec<_> = std::fs::read_dir(dir)
        .map_err(|source| ConfigError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_yaml_file(path))
        .collect();

    files.sort();

    for path in files {
        match load_file::<C>(&path) {
            Ok(partial) => config.merge(partial),
            Err(e) => errors.push(format!("{}: {}", path.display(), e)),
        }
    }

    if !errors.is_empty() {
        return Err(ConfigError::MultipleErrors { errors });
    }
    Ok(config)
}
