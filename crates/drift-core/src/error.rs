//! Common error types shared across the drift crates.

use std::path::PathBuf;

use snafu::prelude::*;

/// Errors that can occur while loading configuration.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ConfigError {
    /// Failed to read a config file.
    #[snafu(display("Failed to read config file {}: {source}", path.display()))]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to read a config directory.
    #[snafu(display("Failed to read config directory {}: {source}", path.display()))]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Config file has an unsupported extension.
    #[snafu(display("Unsupported config format: {} (expected .yaml or .yml)", path.display()))]
    UnsupportedFormat { path: PathBuf },

    /// Failed to parse YAML.
    #[snafu(display("Failed to parse YAML: {source}"))]
    YamlParse { source: serde_yaml::Error },

    /// A config value failed validation.
    #[snafu(display("Invalid config value: {message}"))]
    InvalidValue { message: String },

    /// Multiple errors occurred while loading config from several sources.
    #[snafu(display("Configuration errors:\n{}", errors.join("\n")))]
    MultipleErrors { errors: Vec<String> },
}

/// Errors that can occur in the metrics subsystem.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum MetricsError {
    /// The metrics recorder was already initialized.
    #[snafu(display("Metrics recorder already initialized"))]
    AlreadyInitialized,

    /// The metrics recorder has not been initialized.
    #[snafu(display("Metrics recorder not initialized"))]
    NotInitialized,

    /// Failed to install the Prometheus recorder.
    #[snafu(display("Failed to install Prometheus recorder: {source}"))]
    PrometheusInit {
        source: metrics_exporter_prometheus::BuildError,
    },
}
