//! Internal events for metrics emission.
//!
//! Each event struct represents a measurable occurrence during a load run.
//! Events implement the `InternalEvent` trait which emits the corresponding
//! Prometheus counter metric.
//!
//! All counters carry a `language` label so multi-edition runs can be
//! observed per partition.

use metrics::counter;
use tracing::trace;

/// Trait for internal events that can be emitted as metrics.
pub trait InternalEvent {
    /// Emit this event as a metric.
    fn emit(self);
}

/// Event emitted when pages have been scanned out of a dump file.
pub struct PagesScanned {
    pub count: u64,
    /// Language label for multi-edition runs.
    pub language: String,
}

impl InternalEvent for PagesScanned {
    fn emit(self) {
        trace!(count = self.count, language = %self.language, "Pages scanned");
        counter!("drift_pages_scanned_total", "language" => self.language).increment(self.count);
    }
}

/// Event emitted when a record has been saved to a store.
pub struct RecordSaved {
    /// Which record shape was stored ("raw_page" or "page_summary").
    pub kind: &'static str,
    pub language: String,
}

impl InternalEvent for RecordSaved {
    fn emit(self) {
        trace!(kind = self.kind, language = %self.language, "Record saved");
        counter!("drift_records_saved_total", "kind" => self.kind, "language" => self.language)
            .increment(1);
    }
}

/// Event emitted when a record failed to parse or persist.
pub struct RecordFailed {
    pub kind: &'static str,
    pub language: String,
}

impl InternalEvent for RecordFailed {
    fn emit(self) {
        trace!(kind = self.kind, language = %self.language, "Record failed");
        counter!("drift_record_failures_total", "kind" => self.kind, "language" => self.language)
            .increment(1);
    }
}

/// Terminal status of one dump file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Completed,
    QuotaExhausted,
    Skipped,
    Cancelled,
    Failed,
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Completed => "completed",
            FileStatus::QuotaExhausted => "quota_exhausted",
            FileStatus::Skipped => "skipped",
            FileStatus::Cancelled => "cancelled",
            FileStatus::Failed => "failed",
        }
    }
}

/// Event emitted when a dump file reaches a terminal state.
pub struct FileProcessed {
    pub status: FileStatus,
    pub language: String,
}

impl InternalEvent for FileProcessed {
    fn emit(self) {
        trace!(status = self.status.as_str(), language = %self.language, "File processed");
        counter!(
            "drift_files_processed_total",
            "status" => self.status.as_str(),
            "language" => self.language
        )
        .increment(1);
    }
}

/// Event emitted when a partition hits its configured cap.
pub struct QuotaExhausted {
    pub language: String,
}

impl InternalEvent for QuotaExhausted {
    fn emit(self) {
        trace!(language = %self.language, "Quota exhausted");
        counter!("drift_quota_exhausted_total", "language" => self.language).increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_status_labels() {
        assert_eq!(FileStatus::Completed.as_str(), "completed");
        assert_eq!(FileStatus::QuotaExhausted.as_str(), "quota_exhausted");
        assert_eq!(FileStatus::Skipped.as_str(), "skipped");
        assert_eq!(FileStatus::Cancelled.as_str(), "cancelled");
        assert_eq!(FileStatus::Failed.as_str(), "failed");
    }

    #[test]
    fn test_events_emit_without_recorder() {
        // With no recorder installed the macros are no-ops; emitting must
        // not panic.
        PagesScanned {
            count: 10,
            language: "en".to_string(),
        }
        .emit();
        RecordSaved {
            kind: "raw_page",
            language: "en".to_string(),
        }
        .emit();
        RecordFailed {
            kind: "page_summary",
            language: "de".to_string(),
        }
        .emit();
        FileProcessed {
            status: FileStatus::Completed,
            language: "en".to_string(),
        }
        .emit();
        QuotaExhausted {
            language: "fr".to_string(),
        }
        .emit();
    }
}
