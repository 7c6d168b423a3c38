//! Writing one accepted page into both stores.

use std::sync::Arc;

use crate::error::StoreError;
use crate::page::{PageSummary, RawPage};
use crate::sink::BulkStore;

/// Per-store results of persisting one page.
///
/// The two stores are independent failure domains; each result is
/// reported to the ledger separately by the caller.
#[derive(Debug)]
pub struct WriteOutcome {
    pub raw: Result<(), StoreError>,
    pub summary: Result<(), StoreError>,
}

impl WriteOutcome {
    pub fn fully_ok(&self) -> bool {
        self.raw.is_ok() && self.summary.is_ok()
    }
}

/// Persists each accepted page as a raw record plus a derived summary.
///
/// A failure in either store never prevents the attempt on the other,
/// and no retry happens here; the caller decides what a failure means.
#[derive(Clone)]
pub struct DualWriter {
    raw: Arc<dyn BulkStore<RawPage>>,
    summary: Arc<dyn BulkStore<PageSummary>>,
}

impl DualWriter {
    pub fn new(raw: Arc<dyn BulkStore<RawPage>>, summary: Arc<dyn BulkStore<PageSummary>>) -> Self {
        Self { raw, summary }
    }

    pub fn write(&self, page: &RawPage) -> WriteOutcome {
        let raw = self.raw.save(page);
        let summary = self.summary.save(&PageSummary::from(page));
        WriteOutcome { raw, summary }
    }
}
