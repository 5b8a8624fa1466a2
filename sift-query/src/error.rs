//! Error types for query specification handling.
//!
//! Two kinds of failure can surface from this crate:
//!
//! - [`ValidationError`] — untrusted query input violated the whitelist,
//!   the structural grammar, a backend value rule, or a cross-field rule.
//!   Always carries a path-qualified, human-readable message identifying
//!   the concern, field, and (where applicable) operator or index.
//! - [`Error::NotImplemented`] — a required extension point (an adapter
//!   operator, a schema definition) was not supplied by the integrator.
//!   This is a programmer error, never a user-input error.
//!
//! Validation stops at the first violation; nothing is aggregated or
//! auto-corrected.
//!
//! ```rust
//! use sift_query::error::ValidationError;
//!
//! let err = ValidationError::not_allowed("filter:invalid");
//! assert_eq!(err.to_string(), "filter:invalid is not allowed");
//! assert_eq!(err.path(), "filter:invalid");
//! ```

use thiserror::Error;

/// Result type for query specification operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while parsing, validating, or applying a query.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// User input failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A required extension point was not supplied by the integrator.
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),
}

impl Error {
    /// Check if this is a validation (user-input) error.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// A user-input validation failure with a path-qualified message.
///
/// The path identifies where in the query the violation occurred, using
/// `:` to enter a concern and `[...]` for nested segments:
/// `filter:age[>]`, `sort:0`, `page:size`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{path} {message}")]
pub struct ValidationError {
    path: String,
    message: String,
}

impl ValidationError {
    /// Create a validation error from a path and a message fragment.
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    /// The path identifying the offending part of the query.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The message fragment (without the path prefix).
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The input names something outside the whitelist.
    pub fn not_allowed(path: impl Into<String>) -> Self {
        Self::new(path, "is not allowed")
    }

    /// A concern is present in the input but disabled by the schema.
    pub fn disabled(query_key: &str) -> Self {
        Self::new(query_key, "is disabled")
    }

    /// The value must be one of a closed set of choices or type names.
    pub fn must_be_one_of<I, S>(path: impl Into<String>, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = choices
            .into_iter()
            .map(|c| c.as_ref().to_owned())
            .collect::<Vec<_>>()
            .join(", ");
        Self::new(path, format!("must be one of [{joined}]"))
    }

    /// The value has the wrong shape or type.
    pub fn must_be(path: impl Into<String>, what: &str) -> Self {
        Self::new(path, format!("must be {what}"))
    }

    /// A list item appears more than once.
    pub fn duplicate(path: impl Into<String>) -> Self {
        Self::new(path, "contains a duplicate value")
    }

    /// A value is rejected by a backend rule without a more specific shape.
    pub fn invalid_value(path: impl Into<String>) -> Self {
        Self::new(path, "contains an invalid value")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_path_qualified() {
        let err = ValidationError::new("filter:test[=]", "must be a number");
        assert_eq!(err.to_string(), "filter:test[=] must be a number");
    }

    #[test]
    fn test_not_allowed() {
        let err = ValidationError::not_allowed("sort:invalid");
        assert_eq!(err.to_string(), "sort:invalid is not allowed");
    }

    #[test]
    fn test_disabled() {
        let err = ValidationError::disabled("page");
        assert_eq!(err.to_string(), "page is disabled");
    }

    #[test]
    fn test_must_be_one_of() {
        let err = ValidationError::must_be_one_of("page", ["number", "object"]);
        assert_eq!(err.to_string(), "page must be one of [number, object]");
    }

    #[test]
    fn test_error_kinds() {
        let validation: Error = ValidationError::disabled("sort").into();
        assert!(validation.is_validation());

        let programmer = Error::NotImplemented("filter operator");
        assert!(!programmer.is_validation());
        assert_eq!(programmer.to_string(), "not implemented: filter operator");
    }
}
