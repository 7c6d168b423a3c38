//! Newline-delimited JSON store.
//!
//! Records are appended to a `.partial` staging file during the load and
//! the file is renamed into place when the session ends, so a crashed run
//! never leaves a half-written file under the final name.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::Serialize;
use snafu::prelude::*;

use crate::error::{IoSnafu, NotLoadingSnafu, SerializeSnafu, StoreError};
use crate::sink::BulkStore;

pub struct JsonlStore<R> {
    name: &'static str,
    dir: PathBuf,
    writer: Mutex<Option<BufWriter<File>>>,
    _marker: PhantomData<fn(&R)>,
}

impl<R> JsonlStore<R> {
    pub fn new(name: &'static str, dir: impl Into<PathBuf>) -> Self {
        Self {
            name,
            dir: dir.into(),
            writer: Mutex::new(None),
            _marker: PhantomData,
        }
    }

    fn final_path(&self) -> PathBuf {
        self.dir.join("records.jsonl")
    }

    fn staging_path(&self) -> PathBuf {
        self.dir.join("records.jsonl.partial")
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<BufWriter<File>>>, StoreError> {
        self.writer
            .lock()
            .map_err(|_| StoreError::Poisoned { store: self.name })
    }
}

impl<R: Serialize> BulkStore<R> for JsonlStore<R> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn begin_load(&self) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir).context(IoSnafu { store: self.name })?;
        let file = File::create(self.staging_path()).context(IoSnafu { store: self.name })?;
        *self.lock()? = Some(BufWriter::new(file));
        Ok(())
    }

    fn save(&self, record: &R) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        let writer = guard.as_mut().context(NotLoadingSnafu { store: self.name })?;
        serde_json::to_writer(&mut *writer, record).context(SerializeSnafu { store: self.name })?;
        writer
            .write_all(b"\n")
            .context(IoSnafu { store: self.name })?;
        Ok(())
    }

    fn end_load(&self) -> Result<(), StoreError> {
        let mut writer = self
            .lock()?
            .take()
            .context(NotLoadingSnafu { store: self.name })?;
        writer.flush().context(IoSnafu { store: self.name })?;
        drop(writer);
        std::fs::rename(self.staging_path(), self.final_path())
            .context(IoSnafu { store: self.name })?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        for path in [self.final_path(), self.staging_path()] {
            match std::fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e).context(IoSnafu { store: self.name }),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{Language, PageSummary, Namespace};

    fn summary(id: i64) -> PageSummary {
        PageSummary {
            language: Language::new("en").unwrap(),
            page_id: id,
            title: format!("Page {id}"),
            namespace: Namespace::Article,
            is_redirect: false,
            is_disambig: false,
        }
    }

    #[test]
    fn test_save_requires_open_session() {
        let dir = tempfile::tempdir().unwrap();
        let store: JsonlStore<PageSummary> = JsonlStore::new("summary", dir.path());

        let err = store.save(&summary(1)).unwrap_err();
        assert!(matches!(err, StoreError::NotLoading { .. }));
    }

    #[test]
    fn test_staging_then_rename() {
        let dir = tempfile::tempdir().unwrap();
        let store: JsonlStore<PageSummary> = JsonlStore::new("summary", dir.path());

        store.begin_load().unwrap();
        store.save(&summary(1)).unwrap();
        store.save(&summary(2)).unwrap();

        // Mid-session only the staging file exists
        assert!(store.staging_path().exists());
        assert!(!store.final_path().exists());

        store.end_load().unwrap();
        assert!(!store.staging_path().exists());

        let contents = std::fs::read_to_string(store.final_path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: PageSummary = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed.page_id, 1);
    }

    #[test]
    fn test_end_load_without_begin_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store: JsonlStore<PageSummary> = JsonlStore::new("summary", dir.path());
        assert!(matches!(
            store.end_load().unwrap_err(),
            StoreError::NotLoading { .. }
        ));
    }

    #[test]
    fn test_clear_removes_output() {
        let dir = tempfile::tempdir().unwrap();
        let store: JsonlStore<PageSummary> = JsonlStore::new("summary", dir.path());

        store.begin_load().unwrap();
        store.save(&summary(1)).unwrap();
        store.end_load().unwrap();
        assert!(store.final_path().exists());

        store.clear().unwrap();
        assert!(!store.final_path().exists());

        // Clearing an already-empty store is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_reload_replaces_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        let store: JsonlStore<PageSummary> = JsonlStore::new("summary", dir.path());

        store.begin_load().unwrap();
        store.save(&summary(1)).unwrap();
        store.end_load().unwrap();

        store.begin_load().unwrap();
        store.save(&summary(2)).unwrap();
        store.save(&summary(3)).unwrap();
        store.end_load().unwrap();

        let contents = std::fs::read_to_string(store.final_path()).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }
}
