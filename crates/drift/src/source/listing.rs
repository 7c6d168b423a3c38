//! Dump file discovery and scheduling order.

use std::path::{Path, PathBuf};

use snafu::prelude::*;
use tracing::{debug, warn};

use crate::error::{DiscoverySnafu, FileStatSnafu, PipelineError, UnknownLanguageSnafu};
use crate::page::Language;

/// One input file with its partition key and size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpFile {
    pub path: PathBuf,
    pub language: Language,
    pub size: u64,
}

impl DumpFile {
    /// Resolve a single path: derive the language from the file name and
    /// stat the size.
    pub fn resolve(path: &Path) -> Result<Self, PipelineError> {
        let language =
            Language::from_file_name(path).context(UnknownLanguageSnafu { path })?;
        let size = std::fs::metadata(path)
            .context(FileStatSnafu { path })?
            .len();
        Ok(Self {
            path: path.to_path_buf(),
            language,
            size,
        })
    }
}

fn looks_like_dump(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.ends_with(".xml") || name.ends_with(".xml.bz2") || name.ends_with(".xml.gz")
}

/// Resolve an explicit file list from the command line.
///
/// A file whose name encodes no language is a configuration error.
pub fn resolve_files(paths: &[PathBuf]) -> Result<Vec<DumpFile>, PipelineError> {
    paths.iter().map(|p| DumpFile::resolve(p)).collect()
}

/// Scan a directory for dump files.
///
/// Non-dump files and files without a recognizable language prefix are
/// skipped with a warning; they do not fail discovery.
pub fn discover_dump_files(dir: &Path) -> Result<Vec<DumpFile>, PipelineError> {
    let entries = std::fs::read_dir(dir).context(DiscoverySnafu { path: dir })?;

    let mut files = Vec::new();
    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        if !path.is_file() || !looks_like_dump(&path) {
            continue;
        }
        match DumpFile::resolve(&path) {
            Ok(file) => {
                debug!(path = %file.path.display(), language = %file.language, size = file.size, "Discovered dump file");
                files.push(file);
            }
            Err(e) => warn!(path = %path.display(), error = %e, "Skipping file"),
        }
    }
    Ok(files)
}

/// Order files largest-first so the longest jobs start earliest and the
/// workers finish closer together.
pub fn sort_largest_first(files: &mut [DumpFile]) {
    files.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.path.cmp(&b.path)));
}
