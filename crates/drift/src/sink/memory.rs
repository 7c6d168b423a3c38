//! In-memory store, used by tests and dry runs.
//!
//! Carries failure-injection toggles so tests can exercise the pipeline's
//! partial-failure paths, and call counters so the session bracket can be
//! asserted on.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::error::StoreError;
use crate::sink::BulkStore;

pub struct MemoryStore<R> {
    name: &'static str,
    records: Mutex<Vec<R>>,
    loading: AtomicBool,
    begin_calls: AtomicUsize,
    end_calls: AtomicUsize,
    fail_saves: AtomicBool,
    fail_begin: AtomicBool,
    fail_end: AtomicBool,
    panic_saves: AtomicBool,
}

impl<R> MemoryStore<R> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            records: Mutex::new(Vec::new()),
            loading: AtomicBool::new(false),
            begin_calls: AtomicUsize::new(0),
            end_calls: AtomicUsize::new(0),
            fail_saves: AtomicBool::new(false),
            fail_begin: AtomicBool::new(false),
            fail_end: AtomicBool::new(false),
            panic_saves: AtomicBool::new(false),
        }
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn begin_calls(&self) -> usize {
        self.begin_calls.load(Ordering::SeqCst)
    }

    pub fn end_calls(&self) -> usize {
        self.end_calls.load(Ordering::SeqCst)
    }

    /// Make every subsequent `save` return an error.
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn fail_begin(&self, fail: bool) {
        self.fail_begin.store(fail, Ordering::SeqCst);
    }

    pub fn fail_end(&self, fail: bool) {
        self.fail_end.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `save` panic, to simulate a crashing worker.
    pub fn panic_saves(&self, panic: bool) {
        self.panic_saves.store(panic, Ordering::SeqCst);
    }
}

impl<R: Clone> MemoryStore<R> {
    pub fn records(&self) -> Vec<R> {
        self.records
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl<R: Clone + Send> BulkStore<R> for MemoryStore<R> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn begin_load(&self) -> Result<(), StoreError> {
        self.begin_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_begin.load(Ordering::SeqCst) {
            return Err(StoreError::Injected { store: self.name });
        }
        self.loading.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn save(&self, record: &R) -> Result<(), StoreError> {
        if self.panic_saves.load(Ordering::SeqCst) {
            panic!("injected panic in {} store", self.name);
        }
        if !self.loading.load(Ordering::SeqCst) {
            return Err(StoreError::NotLoading { store: self.name });
        }
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Injected { store: self.name });
        }
        self.records
            .lock()
            .map_err(|_| StoreError::Poisoned { store: self.name })?
            .push(record.clone());
        Ok(())
    }

    fn end_load(&self) -> Result<(), StoreError> {
        self.end_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_end.load(Ordering::SeqCst) {
            return Err(StoreError::Injected { store: self.name });
        }
        self.loading.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Poisoned { store: self.name })?
            .clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_requires_session() {
        let store: MemoryStore<u32> = MemoryStore::new("raw");
        assert!(matches!(
            store.save(&1).unwrap_err(),
            StoreError::NotLoading { .. }
        ));

        store.begin_load().unwrap();
        store.save(&1).unwrap();
        store.end_load().unwrap();

        assert_eq!(store.records(), vec![1]);
        assert!(matches!(
            store.save(&2).unwrap_err(),
            StoreError::NotLoading { .. }
        ));
    }

    #[test]
    fn test_failure_injection() {
        let store: MemoryStore<u32> = MemoryStore::new("raw");
        store.begin_load().unwrap();
        store.fail_saves(true);
        assert!(matches!(
            store.save(&1).unwrap_err(),
            StoreError::Injected { .. }
        ));
        store.fail_saves(false);
        store.save(&2).unwrap();
        assert_eq!(store.records(), vec![2]);
    }

    #[test]
    fn test_call_counters() {
        let store: MemoryStore<u32> = MemoryStore::new("raw");
        store.begin_load().unwrap();
        store.end_load().unwrap();
        assert_eq!(store.begin_calls(), 1);
        assert_eq!(store.end_calls(), 1);
    }

    #[test]
    fn test_clear() {
        let store: MemoryStore<u32> = MemoryStore::new("raw");
        store.begin_load().unwrap();
        store.save(&1).unwrap();
        store.end_load().unwrap();
        store.clear().unwrap();
        assert!(store.is_empty());
    }
}
