//! Reading pages out of dump files.
//!
//! - `compression`: streamed decompression of `.bz2` / `.gz` dumps
//! - `tokenizer`: the XML page tokenizer and the `PageStream` seam
//! - `filter`: namespace interest predicate
//! - `listing`: file discovery, language mapping, and scheduling order

mod compression;
mod filter;
mod listing;
mod tokenizer;

pub use compression::CompressionFormat;
pub use filter::PageFilter;
pub use listing::{DumpFile, discover_dump_files, resolve_files, sort_largest_first};
pub use tokenizer::{DumpTokenizer, PageStream};
