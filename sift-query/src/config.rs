//! Querier configuration.
//!
//! A [`Config`] is an immutable value constructed once at process start
//! and handed to each query-handling instance. There are no process-wide
//! mutable defaults: if two endpoints need different conventions, they
//! hold different `Config` values.

use serde::{Deserialize, Serialize};

use crate::raw::QueryType;

/// Recognized configuration for a querier instance.
///
/// ```rust
/// use sift_query::config::Config;
/// use sift_query::raw::QueryType;
///
/// let config = Config::new().with_query_type(QueryType::Bracket);
/// assert_eq!(config.query_type(), QueryType::Bracket);
/// assert_eq!(Config::default().query_type(), QueryType::Nested);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    query_type: QueryType,
}

impl Config {
    /// Create a configuration with the default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Select which raw-query convention inputs use.
    pub const fn with_query_type(mut self, query_type: QueryType) -> Self {
        self.query_type = query_type;
        self
    }

    /// The raw-query convention in effect.
    pub const fn query_type(&self) -> QueryType {
        self.query_type
    }
}
