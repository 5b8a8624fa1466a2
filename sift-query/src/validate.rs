//! The second and third validation layers, and validation memoization.
//!
//! Layer one — the structural grammar — lives in [`crate::grammar`] and
//! runs during parsing. This module holds the other two layers:
//!
//! - [`ValueRules`] — the backend value validator an adapter declares,
//!   checking each normalized entry's *value* against backend-specific
//!   constraints (a range operator wants an array of two numbers, a
//!   pattern operator wants a string, ...).
//! - [`CrossFieldValidator`] — an optional validator the API author
//!   supplies, seeing the flattened key -> value output of a whole
//!   concern at once for cross-field business rules.
//!
//! [`ValidateState`] is the explicit memoization cell each orchestrator
//! keeps so the three-layer pipeline runs exactly once per instance.

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::error::ValidationError;
use crate::parsers::{FilterMap, PageMap, SortMap};
use crate::value::{QueryValue, ValueKind};

/// One of the three query concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Concern {
    /// The filter concern.
    Filter,
    /// The sort concern.
    Sort,
    /// The page concern.
    Page,
}

impl Concern {
    /// The raw query key for this concern.
    pub fn query_key(&self) -> &'static str {
        match self {
            Self::Filter => "filter",
            Self::Sort => "sort",
            Self::Page => "page",
        }
    }
}

/// A backend constraint on one normalized value.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueRule {
    /// The value's kind must be one of the given kinds.
    OneOf(Vec<ValueKind>),
    /// The value must be exactly this kind.
    Kind(ValueKind),
    /// The value must be null.
    Null,
    /// The value must be an array, optionally of a fixed length and a
    /// uniform item kind.
    Array {
        /// Required kind for every item, if any.
        items: Option<ValueKind>,
        /// Required exact length, if any.
        len: Option<usize>,
    },
}

impl ValueRule {
    fn check(&self, path: &str, value: &QueryValue) -> Result<(), ValidationError> {
        match self {
            Self::OneOf(kinds) => {
                if kinds.contains(&value.kind()) {
                    Ok(())
                } else {
                    Err(ValidationError::must_be_one_of(
                        path,
                        kinds.iter().map(ValueKind::as_str),
                    ))
                }
            }
            Self::Kind(kind) => {
                if value.kind() == *kind {
                    Ok(())
                } else {
                    Err(must_be_kind(path, *kind))
                }
            }
            Self::Null => {
                if value.is_null() {
                    Ok(())
                } else {
                    Err(ValidationError::must_be(path, "null"))
                }
            }
            Self::Array { items, len } => {
                let Some(values) = value.as_array() else {
                    return Err(must_be_kind(path, ValueKind::Array));
                };
                if let Some(len) = len {
                    if values.len() != *len {
                        return Err(ValidationError::must_be(
                            path,
                            &format!("an array containing {len} items"),
                        ));
                    }
                }
                if let Some(item_kind) = items {
                    for (index, item) in values.iter().enumerate() {
                        if item.kind() != *item_kind {
                            return Err(must_be_kind(&format!("{path}[{index}]"), *item_kind));
                        }
                    }
                }
                Ok(())
            }
        }
    }
}

fn must_be_kind(path: &str, kind: ValueKind) -> ValidationError {
    let spelled = match kind {
        ValueKind::Null => "null".to_string(),
        ValueKind::Array => "an array".to_string(),
        ValueKind::Object => "of type object".to_string(),
        other => format!("a {other}"),
    };
    ValidationError::must_be(path, &spelled)
}

/// The backend value validator: rule key -> constraint.
///
/// Rule keys are `filter:<operator>` for filter operands, `sort` for
/// sort directions, and `page:<field>` for page values. A key with no
/// rule passes — absence means "no additional constraint".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueRules {
    rules: IndexMap<SmolStr, ValueRule>,
}

impl ValueRules {
    /// Create an empty rule set (everything passes).
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule under a key.
    pub fn rule(mut self, key: impl AsRef<str>, rule: ValueRule) -> Self {
        self.rules.insert(SmolStr::new(key.as_ref()), rule);
        self
    }

    /// Check if no rules are registered.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Validate one value against the rule registered for `rule_key`,
    /// reporting failures against `path`.
    pub fn validate_value(
        &self,
        rule_key: &str,
        path: &str,
        value: &QueryValue,
    ) -> Result<(), ValidationError> {
        match self.rules.get(rule_key) {
            Some(rule) => rule.check(path, value),
            None => Ok(()),
        }
    }

    /// Validate every parsed filter entry.
    pub fn validate_filters(&self, filters: &FilterMap) -> Result<(), ValidationError> {
        for (key, entry) in filters {
            let rule_key = format!("filter:{}", entry.operator);
            self.validate_value(&rule_key, key, &entry.value)?;
        }
        Ok(())
    }

    /// Validate every parsed sort entry.
    pub fn validate_sorts(&self, sorts: &SortMap) -> Result<(), ValidationError> {
        for (key, entry) in sorts {
            let value = QueryValue::from(entry.order.as_str());
            self.validate_value("sort", key, &value)?;
        }
        Ok(())
    }

    /// Validate every parsed page entry.
    pub fn validate_page(&self, page: &PageMap) -> Result<(), ValidationError> {
        for (key, entry) in page {
            let value = QueryValue::Int(entry.value);
            self.validate_value(key, key, &value)?;
        }
        Ok(())
    }
}

/// The cross-field validation hook supplied by the API author.
///
/// Runs after the structural and backend layers, over the flattened
/// canonical key -> value view of one concern.
pub trait CrossFieldValidator {
    /// Validate the flattened output of a concern as a whole.
    fn validate(
        &self,
        concern: Concern,
        flat: &IndexMap<String, QueryValue>,
    ) -> Result<(), ValidationError>;
}

impl<F> CrossFieldValidator for F
where
    F: Fn(Concern, &IndexMap<String, QueryValue>) -> Result<(), ValidationError>,
{
    fn validate(
        &self,
        concern: Concern,
        flat: &IndexMap<String, QueryValue>,
    ) -> Result<(), ValidationError> {
        self(concern, flat)
    }
}

/// Explicit memoization state for an orchestrator's validation pipeline.
///
/// The pipeline is computed lazily, exactly once; both outcomes are
/// cached so repeated `validate()` calls repeat the recorded result
/// without re-running any layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ValidateState {
    /// Validation has not run yet.
    #[default]
    Unvalidated,
    /// Validation ran and passed.
    Valid,
    /// Validation ran and failed with this error.
    Invalid(ValidationError),
}

impl ValidateState {
    /// The memoized outcome, if validation has run.
    pub fn outcome(&self) -> Option<Result<(), ValidationError>> {
        match self {
            Self::Unvalidated => None,
            Self::Valid => Some(Ok(())),
            Self::Invalid(err) => Some(Err(err.clone())),
        }
    }

    /// Record an outcome.
    pub fn record(&mut self, result: &Result<(), ValidationError>) {
        *self = match result {
            Ok(()) => Self::Valid,
            Err(err) => Self::Invalid(err.clone()),
        };
    }
}
