//! Persistence sinks.
//!
//! - `traits`: the `BulkStore` capability trait
//! - `jsonl`: newline-delimited JSON store with staging-then-rename
//! - `memory`: in-memory store with failure injection
//! - `dual`: fan-out of one page into both stores
//! - `session`: the begin/end bulk-load bracket

mod dual;
mod jsonl;
mod memory;
mod session;
mod traits;

pub use dual::{DualWriter, WriteOutcome};
pub use jsonl::JsonlStore;
pub use memory::MemoryStore;
pub use session::{LoadSession, StoreSet};
pub use traits::BulkStore;
