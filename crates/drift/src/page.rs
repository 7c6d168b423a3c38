//! Domain types: languages, namespaces, pages, and summaries.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// A language edition code, e.g. `en` or `simple`.
///
/// Languages partition the workload: quotas and metrics are scoped per
/// language. Codes are lowercase ASCII, optionally with interior dashes
/// (`zh-yue`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Language(String);

impl Language {
    /// Validate and construct a language code.
    pub fn new(code: &str) -> Option<Self> {
        let valid = !code.is_empty()
            && code.len() <= 16
            && code
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
            && !code.starts_with('-')
            && !code.ends_with('-');
        valid.then(|| Self(code.to_string()))
    }

    /// Derive the language from a dump file name.
    ///
    /// Dump files are named `<lang>wiki-<date>-...`, e.g.
    /// `enwiki-20240101-pages-articles.xml.bz2` maps to `en`.
    pub fn from_file_name(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        let prefix_len = name.find("wiki")?;
        Self::new(&name[..prefix_len])
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A MediaWiki namespace.
///
/// Only articles and categories are first-class here; everything else is
/// carried as its numeric id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Namespace {
    Article,
    Category,
    Other(i32),
}

impl Namespace {
    /// Map a numeric `<ns>` value to a namespace.
    pub fn from_id(id: i32) -> Self {
        match id {
            0 => Namespace::Article,
            14 => Namespace::Category,
            other => Namespace::Other(other),
        }
    }

    /// Parse a config-supplied namespace name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "article" | "main" => Some(Namespace::Article),
            "category" => Some(Namespace::Category),
            other => other.parse::<i32>().ok().map(Namespace::from_id),
        }
    }

    pub fn id(&self) -> i32 {
        match self {
            Namespace::Article => 0,
            Namespace::Category => 14,
            Namespace::Other(id) => *id,
        }
    }
}

/// One page parsed out of a dump file. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPage {
    pub language: Language,
    pub page_id: i64,
    pub title: String,
    pub namespace: Namespace,
    pub is_redirect: bool,
    pub is_disambig: bool,
    /// Raw wikitext body.
    pub body: String,
}

/// The projection of a [`RawPage`] stored in the summary sink.
///
/// Derived deterministically; carries no independent identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSummary {
    pub language: Language,
    pub page_id: i64,
    pub title: String,
    pub namespace: Namespace,
    pub is_redirect: bool,
    pub is_disambig: bool,
}

impl From<&RawPage> for PageSummary {
    fn from(page: &RawPage) -> Self {
        Self {
            language: page.language.clone(),
            page_id: page.page_id,
            title: page.title.clone(),
            namespace: page.namespace,
            is_redirect: page.is_redirect,
            is_disambig: page.is_disambig,
        }
    }
}

/// Which record shape a metric entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordKind {
    RawPage,
    PageSummary,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::RawPage => "raw_page",
            RecordKind::PageSummary => "page_summary",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
