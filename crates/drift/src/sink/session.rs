//! The bulk-load session bracket.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{PipelineError, SessionError};
use crate::page::{PageSummary, RawPage};
use crate::sink::{BulkStore, DualWriter};

/// The pair of stores a run writes to.
#[derive(Clone)]
pub struct StoreSet {
    pub raw: Arc<dyn BulkStore<RawPage>>,
    pub summary: Arc<dyn BulkStore<PageSummary>>,
}

impl StoreSet {
    pub fn new(
        raw: Arc<dyn BulkStore<RawPage>>,
        summary: Arc<dyn BulkStore<PageSummary>>,
    ) -> Self {
        Self { raw, summary }
    }

    pub fn writer(&self) -> DualWriter {
        DualWriter::new(self.raw.clone(), self.summary.clone())
    }

    /// Drop all previously stored records in both stores.
    pub fn clear_all(&self) -> Result<(), PipelineError> {
        self.raw
            .clear()
            .map_err(|source| PipelineError::Clear {
                store: self.raw.name(),
                source,
            })?;
        self.summary
            .clear()
            .map_err(|source| PipelineError::Clear {
                store: self.summary.name(),
                source,
            })?;
        Ok(())
    }

    /// Post-run storage-optimization hook.
    pub fn optimize_all(&self) -> Result<(), PipelineError> {
        info!("Optimizing storage");
        self.raw
            .optimize()
            .map_err(|source| PipelineError::Optimize {
                store: self.raw.name(),
                source,
            })?;
        self.summary
            .optimize()
            .map_err(|source| PipelineError::Optimize {
                store: self.summary.name(),
                source,
            })?;
        Ok(())
    }
}

/// Holds both stores in bulk-load mode between `begin` and `close`.
///
/// If the session is dropped without `close` (a bug or a panic unwinding
/// through the scheduler), `end_load` is still attempted on both stores
/// so the bracket is never left dangling.
pub struct LoadSession {
    stores: StoreSet,
    closed: bool,
}

impl std::fmt::Debug for LoadSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadSession")
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl LoadSession {
    /// Put every store into bulk-load mode.
    ///
    /// If the second store fails to begin, the first is taken back out of
    /// load mode before the error is returned.
    pub fn begin(stores: &StoreSet) -> Result<Self, SessionError> {
        begin_store(stores.raw.as_ref())?;
        if let Err(e) = begin_store(stores.summary.as_ref()) {
            if let Err(rollback) = stores.raw.end_load() {
                warn!(store = stores.raw.name(), error = %rollback, "Rollback end_load failed");
            }
            return Err(e);
        }
        Ok(Self {
            stores: stores.clone(),
            closed: false,
        })
    }

    /// Take every store out of bulk-load mode.
    ///
    /// Both stores are always attempted; the first error is returned.
    pub fn close(mut self) -> Result<(), SessionError> {
        self.closed = true;
        let raw = end_store(self.stores.raw.as_ref());
        let summary = end_store(self.stores.summary.as_ref());
        raw.and(summary)
    }
}

impl Drop for LoadSession {
    fn drop(&mut self) {
        if !self.closed {
            warn!("Load session dropped without close; ending bulk load");
            for result in [
                end_store(self.stores.raw.as_ref()),
                end_store(self.stores.summary.as_ref()),
            ] {
                if let Err(e) = result {
                    warn!(error = %e, "end_load failed during drop");
                }
            }
        }
    }
}

fn begin_store<R>(store: &(impl BulkStore<R> + ?Sized)) -> Result<(), SessionError> {
    store.begin_load().map_err(|source| SessionError::Begin {
        store: store.name(),
        source,
    })
}

fn end_store<R>(store: &(impl BulkStore<R> + ?Sized)) -> Result<(), SessionError> {
    store.end_load().map_err(|source| SessionError::End {
        store: store.name(),
        source,
    })
}
