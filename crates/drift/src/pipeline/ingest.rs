//! The per-file ingestion loop.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use drift_core::emit;
use drift_core::metrics::events::PagesScanned;

use crate::ledger::MetaLedger;
use crate::page::{Language, RecordKind};
use crate::pipeline::QuotaController;
use crate::sink::DualWriter;
use crate::source::{PageFilter, PageStream};

const PROGRESS_INTERVAL: u64 = 10_000;

/// How a single file's ingestion ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    /// The stream was read to the end.
    Completed,
    /// The language quota filled up mid-file; the rest was not read.
    QuotaExhausted,
    /// Shutdown was requested; the rest was not read.
    Cancelled,
    /// The stream raised a fatal error (unreadable file, corrupt framing).
    Failed,
}

/// Counters for one file's pass, reported back to the scheduler.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileStats {
    /// Pages read off the stream, interesting or not.
    pub scanned: u64,
    /// Pages that survived the namespace filter.
    pub interesting: u64,
    /// Pages admitted by the quota and handed to the writer.
    pub accepted: u64,
    /// Individual store writes that failed.
    pub record_failures: u64,
}

/// Drives one page stream through filter, quota, and writer.
///
/// All state is shared: the same quota, ledger, and writer are handed to
/// every file worker, so admission and accounting are global to the run.
pub struct FileIngestor {
    filter: PageFilter,
    quota: Arc<QuotaController>,
    ledger: Arc<MetaLedger>,
    writer: DualWriter,
    shutdown: CancellationToken,
}

impl FileIngestor {
    pub fn new(
        filter: PageFilter,
        quota: Arc<QuotaController>,
        ledger: Arc<MetaLedger>,
        writer: DualWriter,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            filter,
            quota,
            ledger,
            writer,
            shutdown,
        }
    }

    /// Consume the stream until it ends, the quota fills, shutdown is
    /// requested, or the stream fails fatally.
    ///
    /// A malformed page is charged to the ledger and skipped; only errors
    /// the stream itself marks fatal end the file early.
    pub fn ingest(
        &self,
        stream: &mut dyn PageStream,
        language: &Language,
    ) -> (FileOutcome, FileStats) {
        let mut stats = FileStats::default();
        let outcome = loop {
            if self.shutdown.is_cancelled() {
                break FileOutcome::Cancelled;
            }
            let page = match stream.next_page() {
                None => break FileOutcome::Completed,
                Some(Err(e)) if e.is_fatal() => {
                    warn!(language = %language, error = %e, "Fatal stream error");
                    break FileOutcome::Failed;
                }
                Some(Err(e)) => {
                    debug!(language = %language, error = %e, "Skipping malformed page");
                    self.ledger
                        .increment_errors_quietly(RecordKind::RawPage, language);
                    stats.record_failures += 1;
                    continue;
                }
                Some(Ok(page)) => page,
            };

            stats.scanned += 1;
            if stats.scanned % PROGRESS_INTERVAL == 0 {
                info!(
                    language = %language,
                    scanned = stats.scanned,
                    accepted = stats.accepted,
                    "Ingestion progress"
                );
            }

            if !self.filter.interesting(&page) {
                continue;
            }
            stats.interesting += 1;

            if !self.quota.try_acquire(language) {
                info!(language = %language, "Language quota exhausted; stopping file early");
                break FileOutcome::QuotaExhausted;
            }
            stats.accepted += 1;

            let outcome = self.writer.write(&page);
            for (kind, result) in [
                (RecordKind::RawPage, &outcome.raw),
                (RecordKind::PageSummary, &outcome.summary),
            ] {
                match result {
                    Ok(()) => self.ledger.increment_records(kind, language),
                    Err(e) => {
                        warn!(
                            language = %language,
                            page_id = page.page_id,
                            kind = kind.as_str(),
                            error = %e,
                            "Failed to save record"
                        );
                        self.ledger.increment_errors_quietly(kind, language);
                        stats.record_failures += 1;
                    }
                }
            }
        };

        emit!(PagesScanned {
            count: stats.scanned,
            language: language.to_string(),
        });
        (outcome, stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use crate::page::{Namespace, PageSummary, RawPage};
    use crate::sink::{BulkStore, MemoryStore, StoreSet};

    struct VecStream {
        items: std::vec::IntoIter<Result<RawPage, SourceError>>,
    }

    impl VecStream {
        fn new(items: Vec<Result<RawPage, SourceError>>) -> Self {
            Self {
                items: items.into_iter(),
            }
        }
    }

    impl PageStream for VecStream {
        fn next_page(&mut self) -> Option<Result<RawPage, SourceError>> {
            self.items.next()
        }
    }

    fn lang() -> Language {
        Language::new("en").unwrap()
    }

    fn page(id: i64, namespace: Namespace) -> RawPage {
        RawPage {
            language: lang(),
            page_id: id,
            title: format!("Page {id}"),
            namespace,
            is_redirect: false,
            is_disambig: false,
            body: String::new(),
        }
    }

    fn harness(
        cap: Option<u64>,
    ) -> (
        FileIngestor,
        Arc<MemoryStore<RawPage>>,
        Arc<MemoryStore<PageSummary>>,
        Arc<MetaLedger>,
    ) {
        let raw = Arc::new(MemoryStore::new("raw"));
        let summary = Arc::new(MemoryStore::new("summary"));
        raw.begin_load().unwrap();
        summary.begin_load().unwrap();
        let set = StoreSet::new(raw.clone(), summary.clone());
        let ledger = Arc::new(MetaLedger::new());
        let ingestor = FileIngestor::new(
            PageFilter::default(),
            Arc::new(QuotaController::new(cap)),
            ledger.clone(),
            set.writer(),
            CancellationToken::new(),
        );
        (ingestor, raw, summary, ledger)
    }

    #[test]
    fn test_filter_and_dual_save() {
        let (ingestor, raw, summary, ledger) = harness(None);
        let mut stream = VecStream::new(vec![
            Ok(page(1, Namespace::Article)),
            Ok(page(2, Namespace::Other(2))),
            Ok(page(3, Namespace::Category)),
        ]);

        let (outcome, stats) = ingestor.ingest(&mut stream, &lang());
        assert_eq!(outcome, FileOutcome::Completed);
        assert_eq!(stats.scanned, 3);
        assert_eq!(stats.interesting, 2);
        assert_eq!(stats.accepted, 2);
        assert_eq!(raw.len(), 2);
        assert_eq!(summary.len(), 2);
        assert_eq!(ledger.records(RecordKind::RawPage, &lang()), 2);
        assert_eq!(ledger.records(RecordKind::PageSummary, &lang()), 2);
    }

    #[test]
    fn test_quota_stops_file_early() {
        let (ingestor, raw, _, _) = harness(Some(2));
        let mut stream = VecStream::new(vec![
            Ok(page(1, Namespace::Article)),
            Ok(page(2, Namespace::Article)),
            Ok(page(3, Namespace::Article)),
            Ok(page(4, Namespace::Article)),
        ]);

        let (outcome, stats) = ingestor.ingest(&mut stream, &lang());
        assert_eq!(outcome, FileOutcome::QuotaExhausted);
        assert_eq!(stats.accepted, 2);
        // page 3 tripped the quota; page 4 was never read
        assert_eq!(stats.scanned, 3);
        assert_eq!(raw.len(), 2);
    }

    #[test]
    fn test_recoverable_error_is_charged_and_skipped() {
        let (ingestor, raw, _, ledger) = harness(None);
        let mut stream = VecStream::new(vec![
            Ok(page(1, Namespace::Article)),
            Err(SourceError::MissingField {
                path: "dump.xml".to_string(),
                title: "Broken".to_string(),
                field: "id",
            }),
            Ok(page(2, Namespace::Article)),
        ]);

        let (outcome, stats) = ingestor.ingest(&mut stream, &lang());
        assert_eq!(outcome, FileOutcome::Completed);
        assert_eq!(stats.record_failures, 1);
        assert_eq!(raw.len(), 2);
        assert_eq!(ledger.errors(RecordKind::RawPage, &lang()), 1);
    }

    #[test]
    fn test_store_failure_does_not_stop_the_file() {
        let (ingestor, raw, summary, ledger) = harness(None);
        raw.fail_saves(true);
        let mut stream = VecStream::new(vec![
            Ok(page(1, Namespace::Article)),
            Ok(page(2, Namespace::Article)),
        ]);

        let (outcome, stats) = ingestor.ingest(&mut stream, &lang());
        assert_eq!(outcome, FileOutcome::Completed);
        assert_eq!(stats.accepted, 2);
        assert_eq!(stats.record_failures, 2);
        assert_eq!(summary.len(), 2);
        assert_eq!(ledger.errors(RecordKind::RawPage, &lang()), 2);
        assert_eq!(ledger.records(RecordKind::PageSummary, &lang()), 2);
    }

    #[test]
    fn test_cancellation_stops_before_reading() {
        let (ingestor, raw, _, _) = harness(None);
        ingestor.shutdown.cancel();
        let mut stream = VecStream::new(vec![Ok(page(1, Namespace::Article))]);

        let (outcome, stats) = ingestor.ingest(&mut stream, &lang());
        assert_eq!(outcome, FileOutcome::Cancelled);
        assert_eq!(stats.scanned, 0);
        assert_eq!(raw.len(), 0);
    }

    #[test]
    fn test_fatal_error_fails_the_file() {
        let (ingestor, raw, _, _) = harness(None);
        let mut stream = VecStream::new(vec![
            Ok(page(1, Namespace::Article)),
            Err(SourceError::Open {
                path: "dump.xml".into(),
                source: std::io::Error::other("boom"),
            }),
        ]);

        let (outcome, stats) = ingestor.ingest(&mut stream, &lang());
        assert_eq!(outcome, FileOutcome::Failed);
        assert_eq!(stats.accepted, 1);
        assert_eq!(raw.len(), 1);
    }
}
