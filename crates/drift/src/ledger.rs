//! Per-(kind, language) accept/failure accounting.
//!
//! The ledger is the authoritative record of what a run did. It must
//! never fail and never panic: a metrics-accounting problem is not
//! allowed to abort ingestion. Prometheus counters are emitted alongside
//! each update for live observability.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::info;

use crate::page::{Language, RecordKind};
use drift_core::emit;
use drift_core::metrics::events::{RecordFailed, RecordSaved};

/// Monotonic counters for one (kind, language) pair.
#[derive(Debug, Default)]
pub struct Tally {
    records: AtomicU64,
    errors: AtomicU64,
}

impl Tally {
    pub fn records(&self) -> u64 {
        self.records.load(Ordering::Relaxed)
    }

    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }
}

/// Thread-safe registry of per-(kind, language) tallies.
#[derive(Debug, Default)]
pub struct MetaLedger {
    entries: Mutex<HashMap<(RecordKind, Language), Arc<Tally>>>,
}

impl MetaLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up or create the tally for a pair.
    ///
    /// Lookup and insert happen under one lock acquisition so two workers
    /// meeting a new pair at the same time cannot reset each other. A
    /// poisoned lock is recovered rather than propagated: the ledger
    /// never raises.
    fn tally(&self, kind: RecordKind, language: &Language) -> Arc<Tally> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries
            .entry((kind, language.clone()))
            .or_default()
            .clone()
    }

    /// Count one successfully persisted record.
    pub fn increment_records(&self, kind: RecordKind, language: &Language) {
        self.tally(kind, language)
            .records
            .fetch_add(1, Ordering::Relaxed);
        emit!(RecordSaved {
            kind: kind.as_str(),
            language: language.to_string(),
        });
    }

    /// Count one failed record. Never raises, whatever happens inside.
    pub fn increment_errors_quietly(&self, kind: RecordKind, language: &Language) {
        self.tally(kind, language)
            .errors
            .fetch_add(1, Ordering::Relaxed);
        emit!(RecordFailed {
            kind: kind.as_str(),
            language: language.to_string(),
        });
    }

    pub fn records(&self, kind: RecordKind, language: &Language) -> u64 {
        self.tally(kind, language).records()
    }

    pub fn errors(&self, kind: RecordKind, language: &Language) -> u64 {
        self.tally(kind, language).errors()
    }

    /// Sorted snapshot of all tallies, for the end-of-run summary.
    pub fn snapshot(&self) -> Vec<((RecordKind, Language), (u64, u64))> {
        let entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut rows: Vec<_> = entries
            .iter()
            .map(|(k, v)| (k.clone(), (v.records(), v.errors())))
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0));
        rows
    }

    /// Total failures across all kinds and languages.
    pub fn total_errors(&self) -> u64 {
        self.snapshot().iter().map(|(_, (_, e))| e).sum()
    }

    pub fn log_summary(&self) {
        for ((kind, language), (records, errors)) in self.snapshot() {
            info!(
                kind = kind.as_str(),
                language = %language,
                records,
                errors,
                "Load summary"
            );
        }
    }
}
