//! Error types for the drift bulk loader.

use std::path::PathBuf;

use snafu::prelude::*;

// Re-export common errors
pub use drift_core::error::{ConfigError, MetricsError};

/// Errors raised while streaming pages out of a dump file.
///
/// Record-level variants are recoverable: the stream continues and the
/// caller reports a failure metric. Fatal variants terminate the stream
/// and fail the whole file.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SourceError {
    /// The dump file could not be opened.
    #[snafu(display("Failed to open dump file {}: {source}", path.display()))]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The XML stream itself is broken (corrupt file, I/O error mid-read).
    #[snafu(display("Malformed XML in {path}: {source}"))]
    Xml {
        path: String,
        source: quick_xml::Error,
    },

    /// A single page is missing a required field.
    #[snafu(display("Page {title:?} in {path} is missing {field}"))]
    MissingField {
        path: String,
        title: String,
        field: &'static str,
    },

    /// A single page carries an unparseable id.
    #[snafu(display("Page {title:?} in {path} has bad id {value:?}: {source}"))]
    BadPageId {
        path: String,
        title: String,
        value: String,
        source: std::num::ParseIntError,
    },
}

impl SourceError {
    /// Whether this error terminates the file rather than just one record.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SourceError::Open { .. } | SourceError::Xml { .. })
    }
}

/// Errors raised by a single store.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum StoreError {
    /// I/O failure in the store.
    #[snafu(display("I/O error in {store} store: {source}"))]
    Io {
        store: &'static str,
        source: std::io::Error,
    },

    /// The record could not be serialized.
    #[snafu(display("Failed to serialize record for {store} store: {source}"))]
    Serialize {
        store: &'static str,
        source: serde_json::Error,
    },

    /// A save was attempted outside an open bulk-load session.
    #[snafu(display("{store} store is not in bulk-load mode"))]
    NotLoading { store: &'static str },

    /// The store's internal lock was poisoned by a panicking writer.
    #[snafu(display("{store} store lock poisoned"))]
    Poisoned { store: &'static str },

    /// Deliberate failure injected by a test store.
    #[snafu(display("Injected failure in {store} store"))]
    Injected { store: &'static str },
}

/// Errors in the bulk-load session bracket. Always fatal: per-record
/// writes are undefined without bulk-load mode correctly engaged.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SessionError {
    #[snafu(display("Failed to begin bulk load on {store} store: {source}"))]
    Begin {
        store: &'static str,
        source: StoreError,
    },

    #[snafu(display("Failed to end bulk load on {store} store: {source}"))]
    End {
        store: &'static str,
        source: StoreError,
    },
}

/// Top-level loader errors.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum PipelineError {
    /// Configuration error.
    #[snafu(display("Configuration error: {source}"))]
    Config { source: ConfigError },

    /// Session bracket error.
    #[snafu(display("Session error: {source}"))]
    Session { source: SessionError },

    /// The dump directory could not be scanned.
    #[snafu(display("Failed to read dump directory {}: {source}", path.display()))]
    Discovery {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A dump file name does not encode a language.
    #[snafu(display("Cannot determine language for dump file {}", path.display()))]
    UnknownLanguage { path: PathBuf },

    /// A dump file could not be stat'ed for size ordering.
    #[snafu(display("Failed to stat dump file {}: {source}", path.display()))]
    FileStat {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Clearing a store before the run failed.
    #[snafu(display("Failed to clear {store} store: {source}"))]
    Clear {
        store: &'static str,
        source: StoreError,
    },

    /// The post-run storage-optimization hook failed.
    #[snafu(display("Failed to optimize {store} store: {source}"))]
    Optimize {
        store: &'static str,
        source: StoreError,
    },

    /// Failed to parse the metrics listen address.
    #[snafu(display("Failed to parse metrics address {address:?}: {source}"))]
    AddressParse {
        address: String,
        source: std::net::AddrParseError,
    },

    /// Metrics subsystem error.
    #[snafu(display("Metrics error: {source}"))]
    Metrics { source: MetricsError },
}

impl From<ConfigError> for PipelineError {
    fn from(source: ConfigError) -> Self {
        PipelineError::Config { source }
    }
}

impl From<SessionError> for PipelineError {
    fn from(source: SessionError) -> Self {
        PipelineError::Session { source }
    }
}

impl From<MetricsError> for PipelineError {
    fn from(source: MetricsError) -> Self {
        PipelineError::Metrics { source }
    }
}
