//! The filter orchestrator.

use tracing::debug;

use super::Overrides;
use crate::adapter::Adapter;
use crate::error::{Result, ValidationError};
use crate::parsers::{FilterDefaults, FilterMap, FilterParser};
use crate::schema::Schema;
use crate::validate::{Concern, CrossFieldValidator, ValidateState, ValueRules};
use crate::value::QueryValue;

/// Orchestrates parsing, validation, and application of the filter
/// concern for one querier instance.
#[derive(Debug, Default)]
pub struct Filterer {
    raw: Option<QueryValue>,
    fallback: Option<QueryValue>,
    defaults: FilterDefaults,
    parsed: Option<FilterMap>,
    state: ValidateState,
}

impl Filterer {
    /// Create a filterer over the raw `filter` value.
    pub fn new(raw: Option<QueryValue>) -> Self {
        Self {
            raw,
            ..Self::default()
        }
    }

    pub(crate) fn set_defaults(&mut self, defaults: FilterDefaults) {
        self.defaults = defaults;
    }

    pub(crate) fn set_fallback(&mut self, fallback: QueryValue) {
        self.fallback = Some(fallback);
    }

    /// Filtering is enabled when at least one field is whitelisted.
    pub fn is_enabled(&self, schema: &Schema) -> bool {
        !schema.filters().is_empty()
    }

    /// The raw value to parse: the query's own, or the configured
    /// fallback when the query omits the concern.
    fn effective_query(&self) -> Option<&QueryValue> {
        self.raw.as_ref().or(self.fallback.as_ref())
    }

    /// Parse the raw filter value, memoized.
    ///
    /// Disabled + present input is a hard error; disabled + absent is
    /// `None` with no error.
    pub fn parse(
        &mut self,
        schema: &Schema,
        default_operator: &str,
    ) -> std::result::Result<Option<&FilterMap>, ValidationError> {
        if !self.is_enabled(schema) {
            if self.raw.is_some() {
                return Err(ValidationError::disabled("filter"));
            }
            return Ok(None);
        }

        if self.parsed.is_none() {
            let parser = FilterParser::new(schema, self.defaults.resolve(default_operator));
            let parsed = parser.parse(self.effective_query())?;
            debug!(entries = parsed.len(), "parsed filter query");
            self.parsed = Some(parsed);
        }

        Ok(self.parsed.as_ref())
    }

    /// Run the three-layer validation pipeline, memoized.
    pub fn validate(
        &mut self,
        schema: &Schema,
        default_operator: &str,
        rules: &ValueRules,
        user: Option<&dyn CrossFieldValidator>,
    ) -> std::result::Result<(), ValidationError> {
        if !self.is_enabled(schema) {
            return Ok(());
        }
        if let Some(outcome) = self.state.outcome() {
            return outcome;
        }

        let result = self.validate_uncached(schema, default_operator, rules, user);
        self.state.record(&result);
        result
    }

    fn validate_uncached(
        &mut self,
        schema: &Schema,
        default_operator: &str,
        rules: &ValueRules,
        user: Option<&dyn CrossFieldValidator>,
    ) -> std::result::Result<(), ValidationError> {
        // Layer 1: the structural grammar runs inside the parser.
        let Some(parsed) = self.parse(schema, default_operator)? else {
            return Ok(());
        };
        // Layer 2: backend value rules.
        rules.validate_filters(parsed)?;
        // Layer 3: cross-field rules over the flattened view.
        if let Some(user) = user {
            user.validate(Concern::Filter, &FilterParser::flatten(parsed))?;
        }
        Ok(())
    }

    /// Validate, parse, and apply filters to the builder.
    ///
    /// Entries are applied in the schema's registration order — the
    /// server-controlled contract — by iterating registered
    /// `(field, operator)` pairs and looking parsed entries up by
    /// canonical key. Each entry dispatches to a registered override or
    /// the adapter, and each application replaces the builder value.
    pub fn run<A: Adapter>(
        &mut self,
        schema: &Schema,
        adapter: &A,
        rules: &ValueRules,
        user: Option<&dyn CrossFieldValidator>,
        overrides: &Overrides<A::Builder>,
        mut builder: A::Builder,
    ) -> Result<A::Builder> {
        self.validate(schema, adapter.default_filter_operator(), rules, user)?;

        let Some(filters) = self.parse(schema, adapter.default_filter_operator())? else {
            return Ok(builder);
        };

        for filter_schema in schema.filters().values() {
            let key = FilterParser::build_key(filter_schema.field(), filter_schema.operator());
            let Some(entry) = filters.get(&key) else {
                continue;
            };
            builder = match overrides.filter_override(&key) {
                Some(handler) => handler(builder, entry),
                None => adapter.filter(builder, entry)?,
            };
        }

        Ok(builder)
    }
}
