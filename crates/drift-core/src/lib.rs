//! drift-core: Shared infrastructure for the drift bulk loader.
//!
//! This crate contains the pieces that are independent of what is being
//! loaded:
//!
//! - `config/` - Config path handling and multi-file YAML loading
//! - `metrics/` - Prometheus metrics infrastructure and internal events
//! - `error` - Common error types
//! - `signal` - Signal handling for graceful shutdown
//! - `tracing` - Tracing subscriber initialization

pub mod config;
pub mod error;
pub mod metrics;
pub mod signal;
pub mod tracing;

// Re-export commonly used items
pub use config::{ConfigPath, Mergeable, load_from_paths};
pub use error::{ConfigError, MetricsError};
pub use metrics::init_global as init_metrics;
pub use signal::shutdown_signal;
pub use tracing::init_tracing;
