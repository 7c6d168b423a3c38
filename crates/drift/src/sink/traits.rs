//! The store trait for bulk-capable sinks.

use crate::error::StoreError;

/// A persistence backend that supports bulk loading of records of type `R`.
///
/// Implementing this trait *is* the capability advertisement: callers that
/// need bulk semantics take a `dyn BulkStore`, so a backend that cannot
/// bulk-load never reaches them. There is no runtime "unsupported
/// operation" discovery.
///
/// `save` is only valid between `begin_load` and `end_load`.
pub trait BulkStore<R>: Send + Sync {
    /// Short store name used in errors, logs, and metrics.
    fn name(&self) -> &'static str;

    /// Enter bulk-load mode.
    fn begin_load(&self) -> Result<(), StoreError>;

    /// Persist one record. May be called concurrently from many workers.
    fn save(&self, record: &R) -> Result<(), StoreError>;

    /// Leave bulk-load mode, flushing any buffered state.
    fn end_load(&self) -> Result<(), StoreError>;

    /// Drop all previously stored records.
    fn clear(&self) -> Result<(), StoreError>;

    /// Post-run storage optimization hook.
    fn optimize(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
