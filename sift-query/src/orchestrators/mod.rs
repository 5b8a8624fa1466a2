//! Per-concern orchestrators.
//!
//! Each orchestrator owns its concern's raw value, its memoized parse
//! result, and its [`ValidateState`](crate::validate::ValidateState),
//! and walks one instance through unparsed -> parsed -> applied behind
//! two gates:
//!
//! - **enablement** — a disabled concern with input present is always a
//!   hard error, never silently dropped; nothing can smuggle an
//!   unvalidated parameter past the whitelist.
//! - **validity** — the three-layer validation pipeline (structural,
//!   backend value rules, cross-field) runs exactly once and
//!   short-circuits at the first violation.
//!
//! Application order is the per-concern contract: filters follow the
//! schema's registration order, sorts follow the caller's order, page
//! applies its three fields as one combined call.

mod filterer;
mod pager;
mod sorter;

pub use filterer::Filterer;
pub use pager::Pager;
pub use sorter::Sorter;

use std::collections::HashMap;
use std::fmt;

use crate::parsers::{FilterEntry, FilterParser, SortEntry, SortParser};

/// Override closure applied instead of the adapter for one filter key.
pub type FilterOverrideFn<B> = Box<dyn Fn(B, &FilterEntry) -> B>;

/// Override closure applied instead of the adapter for one sort key.
pub type SortOverrideFn<B> = Box<dyn Fn(B, &SortEntry) -> B>;

/// Per-field override handlers, keyed by canonical key.
///
/// Registered at setup time; during `run()` an entry whose canonical key
/// has a handler here dispatches to it instead of the adapter. Override
/// beats default.
pub struct Overrides<B> {
    filters: HashMap<String, FilterOverrideFn<B>>,
    sorts: HashMap<String, SortOverrideFn<B>>,
}

impl<B> Default for Overrides<B> {
    fn default() -> Self {
        Self {
            filters: HashMap::new(),
            sorts: HashMap::new(),
        }
    }
}

impl<B> Overrides<B> {
    /// Create an empty override registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for one `(field, operator)` filter.
    pub fn on_filter<F>(&mut self, field: &str, operator: &str, handler: F) -> &mut Self
    where
        F: Fn(B, &FilterEntry) -> B + 'static,
    {
        self.filters
            .insert(FilterParser::build_key(field, operator), Box::new(handler));
        self
    }

    /// Register a handler for one sort field.
    pub fn on_sort<F>(&mut self, field: &str, handler: F) -> &mut Self
    where
        F: Fn(B, &SortEntry) -> B + 'static,
    {
        self.sorts
            .insert(SortParser::build_key(field), Box::new(handler));
        self
    }

    /// The filter handler for a canonical key, if registered.
    pub fn filter_override(&self, key: &str) -> Option<&FilterOverrideFn<B>> {
        self.filters.get(key)
    }

    /// The sort handler for a canonical key, if registered.
    pub fn sort_override(&self, key: &str) -> Option<&SortOverrideFn<B>> {
        self.sorts.get(key)
    }
}

impl<B> fmt::Debug for Overrides<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Overrides")
            .field("filters", &self.filters.len())
            .field("sorts", &self.sorts.len())
            .finish()
    }
}
