//! The querier facade.
//!
//! A [`Querier`] assembles one request's worth of machinery — schema,
//! adapter, config, optional cross-field validator, override handlers,
//! and the three orchestrators — and drives the whole
//! parse -> validate -> apply sequence. One querier handles one raw
//! query and is not shared or reused across requests; only the schema
//! and config it was built from are long-lived, and both are read-only.

use tracing::debug;

use crate::adapter::Adapter;
use crate::config::Config;
use crate::error::{Result, ValidationError};
use crate::orchestrators::{Filterer, Overrides, Pager, Sorter};
use crate::parsers::{FilterDefaults, FilterEntry, PageDefaults, SortDefaults, SortEntry};
use crate::raw::RawQuery;
use crate::schema::Schema;
use crate::validate::CrossFieldValidator;
use crate::value::QueryValue;

/// Translates one raw query into an ordered sequence of validated
/// builder mutations.
///
/// ```rust
/// use sift_query::adapter::Adapter;
/// use sift_query::error::Result;
/// use sift_query::parsers::{FilterEntry, PageSlice, SortEntry};
/// use sift_query::querier::Querier;
/// use sift_query::raw::RawQuery;
/// use sift_query::schema::Schema;
///
/// /// Applies each operation as a line of text.
/// struct TextAdapter;
///
/// impl Adapter for TextAdapter {
///     type Builder = Vec<String>;
///
///     fn filter_operators(&self) -> &'static [&'static str] {
///         &["="]
///     }
///
///     fn default_filter_operator(&self) -> &'static str {
///         "="
///     }
///
///     fn filter(&self, mut b: Vec<String>, entry: &FilterEntry) -> Result<Vec<String>> {
///         b.push(format!("where {} {} ?", entry.field, entry.operator));
///         Ok(b)
///     }
///
///     fn sort(&self, mut b: Vec<String>, entry: &SortEntry) -> Result<Vec<String>> {
///         b.push(format!("order by {} {}", entry.field, entry.order));
///         Ok(b)
///     }
///
///     fn page(&self, mut b: Vec<String>, page: &PageSlice) -> Result<Vec<String>> {
///         b.push(format!("limit {} offset {}", page.size, page.offset));
///         Ok(b)
///     }
/// }
///
/// let mut schema = Schema::new();
/// schema.filter("test", "=").sort("test").page(true);
///
/// let raw = RawQuery::from_query_str("filter[test]=123&sort=test&page=2");
/// let mut querier = Querier::new(raw, schema, TextAdapter);
///
/// let builder = querier.run(Vec::new()).unwrap();
/// assert_eq!(
///     builder,
///     ["where test = ?", "order by test asc", "limit 20 offset 20"],
/// );
/// ```
pub struct Querier<A: Adapter> {
    schema: Schema,
    adapter: A,
    config: Config,
    validator: Option<Box<dyn CrossFieldValidator>>,
    overrides: Overrides<A::Builder>,
    filterer: Filterer,
    sorter: Sorter,
    pager: Pager,
}

impl<A: Adapter> Querier<A> {
    /// Assemble a querier for one raw query.
    pub fn new(raw: RawQuery, schema: Schema, adapter: A) -> Self {
        Self {
            schema,
            adapter,
            config: Config::default(),
            validator: None,
            overrides: Overrides::new(),
            filterer: Filterer::new(raw.filter),
            sorter: Sorter::new(raw.sort),
            pager: Pager::new(raw.page),
        }
    }

    /// Assemble a querier from a string input using the configured
    /// raw-query convention.
    pub fn from_input(
        input: &str,
        schema: Schema,
        adapter: A,
        config: Config,
    ) -> std::result::Result<Self, ValidationError> {
        let raw = RawQuery::from_input(input, config.query_type())?;
        Ok(Self::new(raw, schema, adapter).with_config(config))
    }

    /// Attach a configuration.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Attach a cross-field validator (the third validation layer).
    pub fn with_validator(mut self, validator: impl CrossFieldValidator + 'static) -> Self {
        self.validator = Some(Box::new(validator));
        self
    }

    /// Override the instance-level filter defaults.
    pub fn with_filter_defaults(mut self, defaults: FilterDefaults) -> Self {
        self.filterer.set_defaults(defaults);
        self
    }

    /// Override the instance-level sort defaults.
    pub fn with_sort_defaults(mut self, defaults: SortDefaults) -> Self {
        self.sorter.set_defaults(defaults);
        self
    }

    /// Override the instance-level page defaults.
    pub fn with_page_defaults(mut self, defaults: PageDefaults) -> Self {
        self.pager.set_defaults(defaults);
        self
    }

    /// Fallback filter value used when the query omits `filter`.
    pub fn with_default_filter(mut self, value: impl Into<QueryValue>) -> Self {
        self.filterer.set_fallback(value.into());
        self
    }

    /// Fallback sort value used when the query omits `sort`.
    pub fn with_default_sort(mut self, value: impl Into<QueryValue>) -> Self {
        self.sorter.set_fallback(value.into());
        self
    }

    /// Fallback page value used when the query omits `page`.
    pub fn with_default_page(mut self, value: impl Into<QueryValue>) -> Self {
        self.pager.set_fallback(value.into());
        self
    }

    /// Register an override handler for one `(field, operator)` filter.
    ///
    /// During `run()`, an entry whose canonical key has a handler goes
    /// to the handler instead of the adapter.
    pub fn on_filter<F>(mut self, field: &str, operator: &str, handler: F) -> Self
    where
        F: Fn(A::Builder, &FilterEntry) -> A::Builder + 'static,
    {
        self.overrides.on_filter(field, operator, handler);
        self
    }

    /// Register an override handler for one sort field.
    pub fn on_sort<F>(mut self, field: &str, handler: F) -> Self
    where
        F: Fn(A::Builder, &SortEntry) -> A::Builder + 'static,
    {
        self.overrides.on_sort(field, handler);
        self
    }

    /// The whitelist schema this querier enforces.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The configuration in effect.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The adapter in use.
    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// Validate all three concerns without applying anything.
    ///
    /// Each concern's pipeline is memoized; calling this any number of
    /// times performs the underlying checks exactly once per concern.
    pub fn validate(&mut self) -> std::result::Result<(), ValidationError> {
        let rules = self.adapter.value_rules();
        let user = self.validator.as_deref();

        self.filterer.validate(
            &self.schema,
            self.adapter.default_filter_operator(),
            &rules,
            user,
        )?;
        self.sorter.validate(&self.schema, &rules, user)?;
        self.pager.validate(&self.schema, &rules, user)?;
        Ok(())
    }

    /// Validate and apply the whole query to the builder.
    ///
    /// Concerns apply in a fixed sequence — filters, then sorts, then
    /// page — each in its own per-concern order. The final builder value
    /// is returned unchanged in type.
    pub fn run(&mut self, builder: A::Builder) -> Result<A::Builder> {
        debug!("running query specification");
        let rules = self.adapter.value_rules();
        let user = self.validator.as_deref();

        let builder = self.filterer.run(
            &self.schema,
            &self.adapter,
            &rules,
            user,
            &self.overrides,
            builder,
        )?;
        let builder = self.sorter.run(
            &self.schema,
            &self.adapter,
            &rules,
            user,
            &self.overrides,
            builder,
        )?;
        let builder = self
            .pager
            .run(&self.schema, &self.adapter, &rules, user, builder)?;

        Ok(builder)
    }
}
