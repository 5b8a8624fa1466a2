//! The page orchestrator.

use tracing::debug;

use crate::adapter::Adapter;
use crate::error::{Result, ValidationError};
use crate::parsers::{PageDefaults, PageMap, PageParser};
use crate::schema::Schema;
use crate::validate::{Concern, CrossFieldValidator, ValidateState, ValueRules};
use crate::value::QueryValue;

/// Orchestrates parsing, validation, and application of the page
/// concern for one querier instance.
#[derive(Debug, Default)]
pub struct Pager {
    raw: Option<QueryValue>,
    fallback: Option<QueryValue>,
    defaults: PageDefaults,
    parsed: Option<PageMap>,
    state: ValidateState,
}

impl Pager {
    /// Create a pager over the raw `page` value.
    pub fn new(raw: Option<QueryValue>) -> Self {
        Self {
            raw,
            fallback: None,
            defaults: PageDefaults::default(),
            parsed: None,
            state: ValidateState::default(),
        }
    }

    pub(crate) fn set_defaults(&mut self, defaults: PageDefaults) {
        self.defaults = defaults;
    }

    pub(crate) fn set_fallback(&mut self, fallback: QueryValue) {
        self.fallback = Some(fallback);
    }

    /// Paging is enabled only when the schema says so.
    pub fn is_enabled(&self, schema: &Schema) -> bool {
        schema.page_options().is_enabled()
    }

    fn effective_query(&self) -> Option<&QueryValue> {
        self.raw.as_ref().or(self.fallback.as_ref())
    }

    /// Parse the raw page value, memoized.
    ///
    /// When paging is enabled the result always holds all three fields;
    /// defaults fill in whatever the input omits.
    pub fn parse(
        &mut self,
        schema: &Schema,
    ) -> std::result::Result<Option<&PageMap>, ValidationError> {
        if !self.is_enabled(schema) {
            if self.raw.is_some() {
                return Err(ValidationError::disabled("page"));
            }
            return Ok(None);
        }

        if self.parsed.is_none() {
            let parser = PageParser::new(self.defaults);
            let parsed = parser.parse(self.effective_query())?;
            debug!(entries = parsed.len(), "parsed page query");
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
        rules.validate_page(parsed)?;
        if let Some(user) = user {
            user.validate(Concern::Page, &PageParser::flatten(parsed, true))?;
        }
        Ok(())
    }

    /// Validate, parse, and apply pagination to the builder.
    ///
    /// The three fields apply as one combined call; the adapter receives
    /// the plain `{size, number, offset}` slice.
    pub fn run<A: Adapter>(
        &mut self,
        schema: &Schema,
        adapter: &A,
        rules: &ValueRules,
        user: Option<&dyn CrossFieldValidator>,
        builder: A::Builder,
    ) -> Result<A::Builder> {
        self.validate(schema, rules, user)?;

        let Some(page) = self.parse(schema)? else {
            return Ok(builder);
        };

        let slice = PageParser::slice(page);
        adapter.page(builder, &slice)
    }
}
