//! Namespace-based page filtering.

use std::collections::HashSet;

use crate::page::{Namespace, RawPage};

/// Pure predicate deciding whether a page is worth persisting.
///
/// A page is interesting iff its namespace is in the allowed set. No I/O,
/// no side effects; filtered-out pages leave no trace beyond the scan
/// counter.
#[derive(Debug, Clone)]
pub struct PageFilter {
    allowed: HashSet<Namespace>,
}

impl PageFilter {
    pub fn new(allowed: impl IntoIterator<Item = Namespace>) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
        }
    }

    pub fn interesting(&self, page: &RawPage) -> bool {
        self.allowed.contains(&page.namespace)
    }
}

impl Default for PageFilter {
    /// Articles and categories, matching the default load policy.
    fn default() -> Self {
        Self::new([Namespace::Article, Namespace::Category])
    }
}
