//! drift: Concurrent bulk loader for MediaWiki dump files.
//!
//! This crate handles:
//! - Streaming pages out of compressed XML dump files (one file per
//!   language edition) without loading a file into memory
//! - Filtering pages by namespace interest
//! - Persisting each surviving page into two independently-failing stores
//!   (raw pages and derived summaries)
//! - Enforcing an optional per-language cap on accepted pages
//! - Running many dump files concurrently across a bounded worker pool

pub mod config;
pub mod error;
pub mod ledger;
pub mod page;
pub mod pipeline;
pub mod sink;
pub mod source;

// Re-export commonly used items
pub use config::Config;
pub use error::PipelineError;
pub use ledger::MetaLedger;
pub use page::{Language, Namespace, PageSummary, RawPage, RecordKind};
pub use pipeline::{LoaderStats, QuotaController, run_loader};
pub use sink::{BulkStore, DualWriter, StoreSet, WriteOutcome};

// Re-export from drift-core
pub use drift_core::{init_metrics, init_tracing, shutdown_signal};
