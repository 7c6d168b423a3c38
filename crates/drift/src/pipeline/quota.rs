//! Per-language admission quotas.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use drift_core::emit;
use drift_core::metrics::events::QuotaExhausted;

use crate::page::Language;

/// Caps the number of pages accepted per language across the whole run.
///
/// `try_acquire` is the authoritative gate: the check against the cap and
/// the increment happen in one atomic compare-and-swap, so concurrent
/// workers can never admit more than the cap between them. `may_accept`
/// is only a cheap read-side peek that lets the scheduler skip files for
/// languages that are already full.
#[derive(Debug, Default)]
pub struct QuotaController {
    cap: Option<u64>,
    counters: Mutex<HashMap<Language, Arc<AtomicU64>>>,
}

impl QuotaController {
    /// `cap` of `None` means unlimited; no counters are kept at all.
    pub fn new(cap: Option<u64>) -> Self {
        Self {
            cap,
            counters: Mutex::new(HashMap::new()),
        }
    }

    fn counter(&self, language: &Language) -> Arc<AtomicU64> {
        let mut counters = self
            .counters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        counters.entry(language.clone()).or_default().clone()
    }

    /// Read-only check whether the language still has room.
    ///
    /// Advisory only: a `true` here can be stale by the time a record is
    /// actually admitted. Does not create a counter entry.
    pub fn may_accept(&self, language: &Language) -> bool {
        let Some(cap) = self.cap else {
            return true;
        };
        let counters = self
            .counters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match counters.get(language) {
            Some(counter) => counter.load(Ordering::Relaxed) < cap,
            None => cap > 0,
        }
    }

    /// Claim one admission slot for the language.
    ///
    /// Returns `false` once the cap is reached; a `false` for a language
    /// is permanent for the rest of the run.
    pub fn try_acquire(&self, language: &Language) -> bool {
        let Some(cap) = self.cap else {
            return true;
        };
        let counter = self.counter(language);
        let claimed = counter
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| {
                if n < cap { Some(n + 1) } else { None }
            })
            .is_ok();
        if !claimed {
            emit!(QuotaExhausted {
                language: language.to_string(),
            });
        }
        claimed
    }

    /// Slots claimed so far for a language.
    pub fn accepted(&self, language: &Language) -> u64 {
        if self.cap.is_none() {
            return 0;
        }
        let counters = self
            .counters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        counters
            .get(language)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn lang(code: &str) -> Language {
        Language::new(code).unwrap()
    }

    #[test]
    fn test_unlimited_always_accepts() {
        let quota = QuotaController::new(None);
        for _ in 0..10_000 {
            assert!(quota.try_acquire(&lang("en")));
        }
        assert!(quota.may_accept(&lang("en")));
    }

    #[test]
    fn test_cap_is_exact_and_per_language() {
        let quota = QuotaController::new(Some(3));
        for _ in 0..3 {
            assert!(quota.try_acquire(&lang("en")));
        }
        assert!(!quota.try_acquire(&lang("en")));
        assert!(!quota.may_accept(&lang("en")));

        // other languages are unaffected
        assert!(quota.may_accept(&lang("de")));
        assert!(quota.try_acquire(&lang("de")));
        assert_eq!(quota.accepted(&lang("en")), 3);
        assert_eq!(quota.accepted(&lang("de")), 1);
    }

    #[test]
    fn test_zero_cap_rejects_everything() {
        let quota = QuotaController::new(Some(0));
        assert!(!quota.may_accept(&lang("en")));
        assert!(!quota.try_acquire(&lang("en")));
        assert_eq!(quota.accepted(&lang("en")), 0);
    }

    #[test]
    fn test_may_accept_does_not_consume() {
        let quota = QuotaController::new(Some(1));
        for _ in 0..100 {
            assert!(quota.may_accept(&lang("en")));
        }
        assert!(quota.try_acquire(&lang("en")));
        assert!(!quota.try_acquire(&lang("en")));
    }

    #[test]
    fn test_concurrent_acquires_never_exceed_cap() {
        let cap = 500;
        let quota = Arc::new(QuotaController::new(Some(cap)));
        let threads = 8;
        let attempts_per_thread = 1000;

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let quota = quota.clone();
                thread::spawn(move || {
                    let mut granted = 0u64;
                    for _ in 0..attempts_per_thread {
                        if quota.try_acquire(&lang("en")) {
                            granted += 1;
                        }
                    }
                    granted
                })
            })
            .collect();

        let granted: u64 = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(granted, cap);
        assert_eq!(quota.accepted(&lang("en")), cap);
    }
}
