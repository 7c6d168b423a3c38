//! Configuration for the drift bulk loader.
//!
//! Config is split into a file-level shape (`ConfigFile`, everything
//! optional so partial files merge cleanly) and the resolved [`Config`]
//! the rest of the crate consumes.

use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::page::Namespace;
use crate::source::CompressionFormat;
use drift_core::config::{ConfigPath, Mergeable, load_from_paths};
use drift_core::error::InvalidValueSnafu;
use drift_core::metrics::server::DEFAULT_METRICS_ADDR;
use snafu::prelude::*;

/// Raw file-level configuration. All fields optional; later files win.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub source: SourceSection,
    #[serde(default)]
    pub quota: QuotaSection,
    #[serde(default)]
    pub sink: SinkSection,
    #[serde(default)]
    pub global: GlobalSection,
    #[serde(default)]
    pub metrics: MetricsSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceSection {
    /// Directory scanned for dump files when none are given explicitly.
    pub dump_dir: Option<PathBuf>,
    /// Namespace names to keep ("article", "category", or a numeric id).
    pub namespaces: Option<Vec<String>>,
    /// Compression override; default sniffs the file extension.
    pub compression: Option<CompressionFormat>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuotaSection {
    /// Maximum accepted pages per language. Absent = unlimited.
    pub max_per_language: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SinkSection {
    pub raw_dir: Option<PathBuf>,
    pub summary_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlobalSection {
    /// Worker pool size. Default: available hardware parallelism.
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    pub address: Option<String>,
    pub enabled: Option<bool>,
}

macro_rules! take_some {
    ($dst:expr, $src:expr) => {
        if $src.is_some() {
            $dst = $src;
        }
    };
}

impl Mergeable for ConfigFile {
    fn merge(&mut self, other: Self) {
        take_some!(self.source.dump_dir, other.source.dump_dir);
        take_some!(self.source.namespaces, other.source.namespaces);
        take_some!(self.source.compression, other.source.compression);
        take_some!(self.quota.max_per_language, other.quota.max_per_language);
        take_some!(self.sink.raw_dir, other.sink.raw_dir);
        take_some!(self.sink.summary_dir, other.sink.summary_dir);
        take_some!(self.global.workers, other.global.workers);
        take_some!(self.metrics.address, other.metrics.address);
        take_some!(self.metrics.enabled, other.metrics.enabled);
    }
}

/// Resolved loader configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub dump_dir: PathBuf,
    pub namespaces: HashSet<Namespace>,
    pub compression: CompressionFormat,
    pub max_per_language: Option<u64>,
    pub raw_dir: PathBuf,
    pub summary_dir: PathBuf,
    pub workers: Option<usize>,
    pub metrics_address: String,
    pub metrics_enabled: bool,
}

impl Config {
    /// Load and resolve config from the given paths. No paths yields the
    /// built-in defaults.
    pub fn load(paths: &[ConfigPath]) -> Result<Self, ConfigError> {
        let file: ConfigFile = load_from_paths(paths)?;
        Self::resolve(file)
    }

    /// Apply defaults and validate a merged `ConfigFile`.
    pub fn resolve(file: ConfigFile) -> Result<Self, ConfigError> {
        let namespaces = match file.source.namespaces {
            None => Self::default_namespaces(),
            Some(names) => {
                let mut set = HashSet::new();
                for name in &names {
                    let ns = Namespace::from_name(name).context(InvalidValueSnafu {
                        message: format!("unknown namespace {name:?}"),
                    })?;
                    set.insert(ns);
                }
                ensure!(
                    !set.is_empty(),
                    InvalidValueSnafu {
                        message: "source.namespaces must not be empty".to_string(),
                    }
                );
                set
            }
        };

        if let Some(0) = file.global.workers {
            return InvalidValueSnafu {
                message: "global.workers must be at least 1".to_string(),
            }
            .fail();
        }

        Ok(Self {
            dump_dir: file.source.dump_dir.unwrap_or_else(|| "dumps".into()),
            namespaces,
            compression: file.source.compression.unwrap_or_default(),
            max_per_language: file.quota.max_per_language,
            raw_dir: file.sink.raw_dir.unwrap_or_else(|| "data/raw".into()),
            summary_dir: file
                .sink
                .summary_dir
                .unwrap_or_else(|| "data/summary".into()),
            workers: file.global.workers,
            metrics_address: file
                .metrics
                .address
                .unwrap_or_else(|| DEFAULT_METRICS_ADDR.to_string()),
            metrics_enabled: file.metrics.enabled.unwrap_or(true),
        })
    }

    /// The default interest set: articles and categories.
    pub fn default_namespaces() -> HashSet<Namespace> {
        HashSet::from([Namespace::Article, Namespace::Category])
    }

    /// Effective worker pool size.
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::resolve(ConfigFile::default()).expect("default config is valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.dump_dir, PathBuf::from("dumps"));
        assert_eq!(config.namespaces, Config::default_namespaces());
        assert_eq!(config.max_per_language, None);
        assert!(config.metrics_enabled);
        assert_eq!(config.metrics_address, DEFAULT_METRICS_ADDR);
        assert!(config.worker_count() >= 1);
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r#"
source:
  dump_dir: /data/dumps
  namespaces: [article, category, "10"]
quota:
  max_per_language: 5000
sink:
  raw_dir: /data/raw
  summary_dir: /data/summary
global:
  workers: 8
metrics:
  address: "127.0.0.1:9100"
  enabled: false
"#;
        let file = ConfigFile::parse_yaml(yaml).unwrap();
        let config = Config::resolve(file).unwrap();

        assert_eq!(config.dump_dir, PathBuf::from("/data/dumps"));
        assert!(config.namespaces.contains(&Namespace::Article));
        assert!(config.namespaces.contains(&Namespace::Other(10)));
        assert_eq!(config.max_per_language, Some(5000));
        assert_eq!(config.workers, Some(8));
        assert_eq!(config.metrics_address, "127.0.0.1:9100");
        assert!(!config.metrics_enabled);
    }

    #[test]
    fn test_merge_later_wins() {
        let base = ConfigFile::parse_yaml("quota:\n  max_per_language: 100\n").unwrap();
        let over = ConfigFile::parse_yaml("quota:\n  max_per_language: 7\n").unwrap();

        let mut merged = base;
        merged.merge(over);
        let config = Config::resolve(merged).unwrap();
        assert_eq!(config.max_per_language, Some(7));
    }

    #[test]
    fn test_merge_keeps_unset_sections() {
        let base = ConfigFile::parse_yaml("source:\n  dump_dir: /data/dumps\n").unwrap();
        let over = ConfigFile::parse_yaml("quota:\n  max_per_language: 7\n").unwrap();

        let mut merged = base;
        merged.merge(over);
        let config = Config::resolve(merged).unwrap();
        assert_eq!(config.dump_dir, PathBuf::from("/data/dumps"));
        assert_eq!(config.max_per_language, Some(7));
    }

    #[test]
    fn test_bad_namespace_rejected() {
        let file = ConfigFile::parse_yaml("source:\n  namespaces: [bogus]\n").unwrap();
        assert!(Config::resolve(file).is_err());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let file = ConfigFile::parse_yaml("global:\n  workers: 0\n").unwrap();
        assert!(Config::resolve(file).is_err());
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(ConfigFile::parse_yaml("bogus_section:\n  a: 1\n").is_err());
    }
}
