//! The sort orchestrator.

use tracing::debug;

use super::Overrides;
use crate::adapter::Adapter;
use crate::error::{Result, ValidationError};
use crate::parsers::{SortDefaults, SortMap, SortParser};
use crate::schema::Schema;
use crate::validate::{Concern, CrossFieldValidator, ValidateState, ValueRules};
use crate::value::QueryValue;

/// Orchestrates parsing, validation, and application of the sort
/// concern for one querier instance.
#[derive(Debug, Default)]
pub struct Sorter {
    raw: Option<QueryValue>,
    fallback: Option<QueryValue>,
    defaults: SortDefaults,
    parsed: Option<SortMap>,
    state: ValidateState,
}

impl Sorter {
    /// Create a sorter over the raw `sort` value.
    pub fn new(raw: Option<QueryValue>) -> Self {
        Self {
            raw,
            ..Self::default()
        }
    }

    pub(crate) fn set_defaults(&mut self, defaults: SortDefaults) {
        self.defaults = defaults;
    }

    pub(crate) fn set_fallback(&mut self, fallback: QueryValue) {
        self.fallback = Some(fallback);
    }

    /// Sorting is enabled when at least one field is whitelisted.
    pub fn is_enabled(&self, schema: &Schema) -> bool {
        !schema.sorts().is_empty()
    }

    fn effective_query(&self) -> Option<&QueryValue> {
        self.raw.as_ref().or(self.fallback.as_ref())
    }

    /// Parse the raw sort value, memoized.
    pub fn parse(
        &mut self,
        schema: &Schema,
    ) -> std::result::Result<Option<&SortMap>, ValidationError> {
        if !self.is_enabled(schema) {
            if self.raw.is_some() {
                return Err(ValidationError::disabled("sort"));
            }
            return Ok(None);
        }

        if self.parsed.is_none() {
            let parser = SortParser::new(schema, self.defaults.resolve());
            let parsed = parser.parse(self.effective_query())?;
            debug!(entries = parsed.len(), "parsed sort query");
            self.parsed = Some(parsed);
        }

        Ok(self.parsed.as_ref())
    }

    /// Run the three-layer validation pipeline, memoized.
    pub fn validate(
        &mut self,
        schema: &Schema,
        rules: &ValueRules,
        user: Option<&dyn CrossFieldValidator>,
    ) -> std::result::Result<(), ValidationError> {
        if !self.is_enabled(schema) {
            return Ok(());
        }
        if let Some(outcome) = self.state.outcome() {
            return outcome;
        }

        let result = self.validate_uncached(schema, rules, user);
        self.state.record(&result);
        result
    }

    fn validate_uncached(
        &mut self,
        schema: &Schema,
        rules: &ValueRules,
        user: Option<&dyn CrossFieldValidator>,
    ) -> std::result::Result<(), ValidationError> {
        let Some(parsed) = self.parse(schema)? else {
            return Ok(());
        };
        rules.validate_sorts(parsed)?;
        if let Some(user) = user {
            user.validate(Concern::Sort, &SortParser::flatten(parsed))?;
        }
        Ok(())
    }

    /// Validate, parse, and apply sorts to the builder.
    ///
    /// Unlike filters, entries apply in the order the caller requested
    /// them — the first sort key is the primary sort.
    pub fn run<A: Adapter>(
        &mut self,
        schema: &Schema,
        adapter: &A,
        rules: &ValueRules,
        user: Option<&dyn CrossFieldValidator>,
        overrides: &Overrides<A::Builder>,
        mut builder: A::Builder,
    ) -> Result<A::Builder> {
        self.validate(schema, rules, user)?;

        let Some(sorts) = self.parse(schema)? else {
            return Ok(builder);
        };

        for (key, entry) in sorts {
            builder = match overrides.sort_override(key) {
                Some(handler) => handler(builder, entry),
                None => adapter.sort(builder, entry)?,
            };
        }

        Ok(builder)
    }
}
