//! Streaming tokenizer for MediaWiki XML dump files.
//!
//! Walks the XML event stream and assembles one [`RawPage`] per `<page>`
//! element. The stream is lazy and finite; a file is consumed once per
//! run and is not restartable mid-stream.
//!
//! Failure model: a malformed individual page (missing id, title, or ns)
//! yields a record-level error and the stream continues with the next
//! page. A broken XML stream or unreadable file is fatal and terminates
//! the stream.

use std::io::BufRead;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::Event;
use snafu::prelude::*;
use snafu::IntoError;
use tracing::debug;

use crate::error::{BadPageIdSnafu, MissingFieldSnafu, OpenSnafu, SourceError, XmlSnafu};
use crate::page::{Language, Namespace, RawPage};
use crate::source::CompressionFormat;

/// A lazy stream of pages out of one dump file.
///
/// This is the seam for alternative tokenizer implementations; the
/// pipeline only ever sees this trait.
pub trait PageStream: Send {
    /// Pull the next page. `None` means the stream is exhausted (or was
    /// terminated by an earlier fatal error).
    fn next_page(&mut self) -> Option<Result<RawPage, SourceError>>;
}

/// Fields of a `<page>` element captured while walking the event stream.
#[derive(Debug, Default)]
struct PartialPage {
    title: Option<String>,
    id: Option<String>,
    ns: Option<i32>,
    text: Option<String>,
    redirect: bool,
}

/// The elements whose character data we collect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Id,
    Ns,
    Text,
}

/// The shipped [`PageStream`] implementation over `quick-xml`.
pub struct DumpTokenizer {
    path: String,
    language: Language,
    reader: Reader<Box<dyn BufRead + Send>>,
    buf: Vec<u8>,
    finished: bool,
}

impl std::fmt::Debug for DumpTokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DumpTokenizer")
            .field("path", &self.path)
            .field("language", &self.language)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl DumpTokenizer {
    /// Open a dump file for streaming.
    pub fn open(
        path: &Path,
        language: Language,
        format: CompressionFormat,
    ) -> Result<Self, SourceError> {
        let resolved = format.resolve(path);
        debug!(
            path = %path.display(),
            language = %language,
            compression = resolved.name(),
            "Opening dump file"
        );
        let reader = resolved.open(path).context(OpenSnafu { path })?;
        Ok(Self {
            path: path.display().to_string(),
            language,
            reader: Reader::from_reader(reader),
            buf: Vec::with_capacity(8192),
            finished: false,
        })
    }

    /// Walk events until the next `</page>` or end of file.
    fn parse_next(&mut self) -> Result<Option<RawPage>, SourceError> {
        let mut page: Option<PartialPage> = None;
        let mut field: Option<Field> = None;
        let mut text_buf = String::new();

        loop {
            self.buf.clear();
            let event = self
                .reader
                .read_event_into(&mut self.buf)
                .map_err(|source| {
                    XmlSnafu {
                        path: self.path.clone(),
                    }
                    .into_error(source)
                })?;

            match event {
                Event::Start(ref e) => match e.local_name().as_ref() {
                    b"page" => page = Some(PartialPage::default()),
                    b"redirect" => {
                        if let Some(p) = page.as_mut() {
                            p.redirect = true;
                        }
                    }
                    b"title" if page.is_some() => {
                        field = Some(Field::Title);
                        text_buf.clear();
                    }
                    b"id" if page.is_some() => {
                        field = Some(Field::Id);
                        text_buf.clear();
                    }
                    b"ns" if page.is_some() => {
                        field = Some(Field::Ns);
                        text_buf.clear();
                    }
                    b"text" if page.is_some() => {
                        field = Some(Field::Text);
                        text_buf.clear();
                    }
                    _ => {}
                },
                // <redirect title="..."/> is an empty element
                Event::Empty(ref e) if e.local_name().as_ref() == b"redirect" => {
                    if let Some(p) = page.as_mut() {
                        p.redirect = true;
                    }
                }
                Event::Text(ref e) => {
                    if field.is_some() {
                        if let Ok(text) = e.unescape() {
                            text_buf.push_str(&text);
                        }
                    }
                }
                Event::CData(ref e) => {
                    if field.is_some() {
                        text_buf.push_str(&String::from_utf8_lossy(e));
                    }
                }
                Event::End(ref e) => {
                    if e.local_name().as_ref() == b"page" {
                        if let Some(partial) = page.take() {
                            return build_page(&self.path, &self.language, partial).map(Some);
                        }
                    } else if let Some(p) = page.as_mut() {
                        match e.local_name().as_ref() {
                            b"title" if field == Some(Field::Title) => {
                                p.title = Some(std::mem::take(&mut text_buf));
                            }
                            b"id" if field == Some(Field::Id) => {
                                // First id wins: revision and contributor
                                // ids come later in the element
                                if p.id.is_none() {
                                    p.id = Some(std::mem::take(&mut text_buf));
                                }
                            }
                            b"ns" if field == Some(Field::Ns) => {
                                p.ns = text_buf.trim().parse().ok();
                            }
                            b"text" if field == Some(Field::Text) => {
                                p.text = Some(std::mem::take(&mut text_buf));
                            }
                            _ => {}
                        }
                        field = None;
                    }
                }
                Event::Eof => return Ok(None),
                _ => {}
            }
        }
    }
}

impl PageStream for DumpTokenizer {
    fn next_page(&mut self) -> Option<Result<RawPage, SourceError>> {
        if self.finished {
            return None;
        }
        match self.parse_next() {
            Ok(Some(page)) => Some(Ok(page)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                if e.is_fatal() {
                    self.finished = true;
                }
                Some(Err(e))
            }
        }
    }
}

/// Validate a completed `<page>` element.
fn build_page(
    path: &str,
    language: &Language,
    partial: PartialPage,
) -> Result<RawPage, SourceError> {
    let title = match partial.title {
        Some(t) if !t.is_empty() => t,
        _ => {
            return MissingFieldSnafu {
                path,
                title: String::new(),
                field: "title",
            }
            .fail();
        }
    };
    let ns = partial.ns.context(MissingFieldSnafu {
        path,
        title: title.clone(),
        field: "ns",
    })?;
    let id_text = partial.id.context(MissingFieldSnafu {
        path,
        title: title.clone(),
        field: "id",
    })?;
    let page_id = id_text.trim().parse::<i64>().context(BadPageIdSnafu {
        path,
        title: title.clone(),
        value: id_text.clone(),
    })?;

    let body = partial.text.unwrap_or_default();
    let is_disambig = detect_disambig(&body);

    Ok(RawPage {
        language: language.clone(),
        page_id,
        title,
        namespace: Namespace::from_id(ns),
        is_redirect: partial.redirect,
        is_disambig,
        body,
    })
}

/// Cheap disambiguation-template sniff on the wikitext body.
fn detect_disambig(body: &str) -> bool {
    body.match_indices("{{").any(|(i, _)| {
        body.get(i + 2..i + 10)
            .map(|t| t.eq_ignore_ascii_case("disambig"))
            .unwrap_or(false)
    })
}
