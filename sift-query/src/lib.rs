//! # sift-query
//!
//! A whitelist-driven query specification engine: untrusted, loosely-typed
//! query-string input (`filter`, `sort`, `page`) is normalized, validated,
//! and applied — in a deterministic order — to a query-building
//! abstraction of your choice.
//!
//! This crate exists so API servers can expose safe filtering, sorting,
//! and pagination over a data source without hand-writing parameter
//! parsing and validation for every endpoint. It never executes queries
//! and never talks to a database: it decides *which* normalized operation
//! to hand to the builder adapter, and *in what order*.
//!
//! ## How a query flows
//!
//! 1. A [`RawQuery`] is built from the caller's input, via either of two
//!    conventions: already-nested values ([`QueryType::Nested`]) or
//!    bracket-notation query strings ([`QueryType::Bracket`]).
//! 2. Each concern's parser checks the input against a structural grammar
//!    synthesized from the [`Schema`] whitelist and produces an ordered
//!    map of canonically-keyed normalized entries.
//! 3. Two further validation layers run, memoized: the adapter's backend
//!    value rules, then an optional cross-field validator.
//! 4. [`Querier::run`] applies the entries — filters in schema
//!    registration order, sorts in caller order, page as one combined
//!    call — threading the builder value through the adapter (or a
//!    per-key override handler).
//!
//! ## Accepted input shapes
//!
//! ```text
//! filter[field]=value                 bare scalar, default operator
//! filter[field][operator]=value       explicit operator
//! sort=field                          single field
//! sort[]=a&sort[]=b                   ordered list
//! sort[field]=desc                    field to direction
//! page=2                              bare page number
//! page[number]=2&page[size]=10        explicit fields
//! ```
//!
//! Anything not whitelisted in the [`Schema`] is rejected with a
//! path-qualified [`ValidationError`] such as
//! `filter:invalid is not allowed`; a concern that is disabled but
//! present in the input is always rejected, never silently dropped.
//!
//! ## Example
//!
//! ```rust
//! use sift_query::prelude::*;
//! use sift_query::parsers::{FilterEntry, PageSlice, SortEntry};
//!
//! /// A toy adapter that renders operations as text.
//! struct TextAdapter;
//!
//! impl Adapter for TextAdapter {
//!     type Builder = Vec<String>;
//!
//!     fn filter_operators(&self) -> &'static [&'static str] {
//!         &["=", ">"]
//!     }
//!
//!     fn default_filter_operator(&self) -> &'static str {
//!         "="
//!     }
//!
//!     fn filter(&self, mut b: Vec<String>, e: &FilterEntry) -> Result<Vec<String>> {
//!         b.push(format!("{} {} ?", e.field, e.operator));
//!         Ok(b)
//!     }
//!
//!     fn sort(&self, mut b: Vec<String>, e: &SortEntry) -> Result<Vec<String>> {
//!         b.push(format!("order {} {}", e.field, e.order));
//!         Ok(b)
//!     }
//!
//!     fn page(&self, mut b: Vec<String>, p: &PageSlice) -> Result<Vec<String>> {
//!         b.push(format!("limit {} offset {}", p.size, p.offset));
//!         Ok(b)
//!     }
//! }
//!
//! let mut schema = Schema::new();
//! schema.filter("age", ">").sort("name").page(true);
//!
//! let raw = RawQuery::from_query_str("filter[age][>]=21&sort=name&page=2");
//! let applied = Querier::new(raw, schema, TextAdapter)
//!     .run(Vec::new())
//!     .unwrap();
//!
//! assert_eq!(applied, ["age > ?", "order name asc", "limit 20 offset 20"]);
//! ```

pub mod adapter;
pub mod config;
pub mod error;
pub mod grammar;
pub mod orchestrators;
pub mod parsers;
pub mod querier;
pub mod raw;
pub mod schema;
pub mod validate;
pub mod value;

pub use adapter::Adapter;
pub use config::Config;
pub use error::{Error, Result, ValidationError};
pub use querier::Querier;
pub use raw::{QueryType, RawQuery};
pub use schema::Schema;
pub use validate::{Concern, CrossFieldValidator, ValueRule, ValueRules};
pub use value::{QueryValue, ValueKind};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::adapter::Adapter;
    pub use crate::config::Config;
    pub use crate::error::{Error, Result, ValidationError};
    pub use crate::parsers::SortOrder;
    pub use crate::querier::Querier;
    pub use crate::raw::{QueryType, RawQuery};
    pub use crate::schema::Schema;
    pub use crate::validate::{Concern, CrossFieldValidator, ValueRule, ValueRules};
    pub use crate::value::{QueryValue, ValueKind};
}
