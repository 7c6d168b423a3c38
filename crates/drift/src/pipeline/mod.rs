//! The load run: scheduling dump files across a bounded worker pool.

mod ingest;
mod quota;

pub use ingest::{FileIngestor, FileOutcome, FileStats};
pub use quota::QuotaController;

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use drift_core::emit;
use drift_core::metrics::events::{FileProcessed, FileStatus};

use crate::config::Config;
use crate::error::PipelineError;
use crate::ledger::MetaLedger;
use crate::sink::{LoadSession, StoreSet};
use crate::source::{DumpFile, DumpTokenizer, PageFilter, sort_largest_first};

/// Aggregated results of one load run.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoaderStats {
    pub files_completed: u64,
    pub files_quota_exhausted: u64,
    pub files_skipped: u64,
    pub files_cancelled: u64,
    pub files_failed: u64,
    pub pages_scanned: u64,
    pub pages_accepted: u64,
    pub record_failures: u64,
}

impl LoaderStats {
    fn record(&mut self, status: FileStatus, stats: FileStats) {
        match status {
            FileStatus::Completed => self.files_completed += 1,
            FileStatus::QuotaExhausted => self.files_quota_exhausted += 1,
            FileStatus::Skipped => self.files_skipped += 1,
            FileStatus::Cancelled => self.files_cancelled += 1,
            FileStatus::Failed => self.files_failed += 1,
        }
        self.pages_scanned += stats.scanned;
        self.pages_accepted += stats.accepted;
        self.record_failures += stats.record_failures;
    }

    pub fn total_files(&self) -> u64 {
        self.files_completed
            + self.files_quota_exhausted
            + self.files_skipped
            + self.files_cancelled
            + self.files_failed
    }
}

fn status_of(outcome: FileOutcome) -> FileStatus {
    match outcome {
        FileOutcome::Completed => FileStatus::Completed,
        FileOutcome::QuotaExhausted => FileStatus::QuotaExhausted,
        FileOutcome::Cancelled => FileStatus::Cancelled,
        FileOutcome::Failed => FileStatus::Failed,
    }
}

/// Run the full load: bracket the stores, fan the files out across the
/// worker pool, and summarize.
///
/// Record-level and file-level failures are absorbed into the stats; only
/// session and optimize failures abort the run. The session is closed on
/// every path once it has begun.
pub async fn run_loader(
    config: &Config,
    stores: &StoreSet,
    mut files: Vec<DumpFile>,
    ledger: Arc<MetaLedger>,
    shutdown: CancellationToken,
) -> Result<LoaderStats, PipelineError> {
    sort_largest_first(&mut files);
    let workers = config.worker_count();
    info!(
        files = files.len(),
        workers,
        max_per_language = config.max_per_language,
        "Starting load run"
    );

    let quota = Arc::new(QuotaController::new(config.max_per_language));
    let filter = PageFilter::new(config.namespaces.iter().copied());
    let compression = config.compression;
    let writer = stores.writer();

    let session = LoadSession::begin(stores)?;

    let semaphore = Arc::new(Semaphore::new(workers));
    let mut tasks: JoinSet<(DumpFile, FileStatus, FileStats)> = JoinSet::new();

    for file in files {
        let semaphore = semaphore.clone();
        let quota = quota.clone();
        let filter = filter.clone();
        let ledger = ledger.clone();
        let writer = writer.clone();
        let shutdown = shutdown.clone();

        tasks.spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return (file, FileStatus::Cancelled, FileStats::default());
            };
            if shutdown.is_cancelled() {
                return (file, FileStatus::Cancelled, FileStats::default());
            }
            // Files for already-full languages are not worth opening.
            if !quota.may_accept(&file.language) {
                info!(path = %file.path.display(), language = %file.language, "Skipping file; quota already exhausted");
                return (file, FileStatus::Skipped, FileStats::default());
            }

            info!(path = %file.path.display(), language = %file.language, size = file.size, "Processing dump file");
            let path = file.path.clone();
            let language = file.language.clone();
            let ingestor = FileIngestor::new(filter, quota, ledger, writer, shutdown);
            let result = tokio::task::spawn_blocking(move || {
                let mut stream = match DumpTokenizer::open(&path, language.clone(), compression) {
                    Ok(stream) => stream,
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Failed to open dump file");
                        return (FileOutcome::Failed, FileStats::default());
                    }
                };
                ingestor.ingest(&mut stream, &language)
            })
            .await;

            match result {
                Ok((outcome, stats)) => (file, status_of(outcome), stats),
                Err(e) => {
                    warn!(path = %file.path.display(), error = %e, "File worker panicked");
                    (file, FileStatus::Failed, FileStats::default())
                }
            }
        });
    }

    let mut stats = LoaderStats::default();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((file, status, file_stats)) => {
                info!(
                    path = %file.path.display(),
                    language = %file.language,
                    status = status.as_str(),
                    scanned = file_stats.scanned,
                    accepted = file_stats.accepted,
                    "Finished dump file"
                );
                emit!(FileProcessed {
                    status,
                    language: file.language.to_string(),
                });
                stats.record(status, file_stats);
            }
            Err(e) => {
                warn!(error = %e, "File task failed to join");
                stats.record(FileStatus::Failed, FileStats::default());
            }
        }
    }

    // The bracket closes whatever the files did.
    session.close()?;
    stores.optimize_all()?;

    ledger.log_summary();
    info!(
        files = stats.total_files(),
        completed = stats.files_completed,
        failed = stats.files_failed,
        scanned = stats.pages_scanned,
        accepted = stats.pages_accepted,
        record_failures = stats.record_failures,
        "Load run finished"
    );
    Ok(stats)
}
