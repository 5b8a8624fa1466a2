//! The builder adapter seam.
//!
//! An [`Adapter`] owns everything backend-specific: which filter
//! operators exist, which one is the default, how one normalized entry
//! becomes one mutation of the builder value, and which value rules the
//! backend imposes ([`ValueRules`]).
//!
//! Builder mutation is modeled as value-returning: every application
//! consumes the current builder and returns the next one, and the
//! orchestrators thread that value through the whole run.

use crate::error::Result;
use crate::parsers::{FilterEntry, PageSlice, SortEntry};
use crate::validate::ValueRules;

/// Translates normalized entries into mutations of a builder value.
pub trait Adapter {
    /// The query-builder value this adapter mutates.
    type Builder;

    /// Every filter operator this adapter can apply.
    fn filter_operators(&self) -> &'static [&'static str];

    /// The operator implied by bare-scalar filter input.
    fn default_filter_operator(&self) -> &'static str;

    /// Apply one filter entry.
    ///
    /// An operator outside [`filter_operators`](Self::filter_operators)
    /// is a programmer error ([`crate::error::Error::NotImplemented`]),
    /// not a validation failure — the schema whitelisted something the
    /// adapter cannot do.
    fn filter(&self, builder: Self::Builder, entry: &FilterEntry) -> Result<Self::Builder>;

    /// Apply one sort entry.
    fn sort(&self, builder: Self::Builder, entry: &SortEntry) -> Result<Self::Builder>;

    /// Apply the combined page slice.
    fn page(&self, builder: Self::Builder, page: &PageSlice) -> Result<Self::Builder>;

    /// The backend value rules for this adapter. Empty by default: no
    /// constraints beyond the structural grammar.
    fn value_rules(&self) -> ValueRules {
        ValueRules::new()
    }

    /// Check whether an operator is declared by this adapter.
    fn supports_operator(&self, operator: &str) -> bool {
        self.filter_operators().iter().any(|op| *op == operator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::parsers::SortOrder;
    use smol_str::SmolStr;

    /// A minimal adapter that logs applications into a Vec of strings.
    struct LogAdapter;

    impl Adapter for LogAdapter {
        type Builder = Vec<String>;

        fn filter_operators(&self) -> &'static [&'static str] {
            &["=", "!="]
        }

        fn default_filter_operator(&self) -> &'static str {
            "="
        }

        fn filter(&self, mut builder: Vec<String>, entry: &FilterEntry) -> Result<Vec<String>> {
            if !self.supports_operator(&entry.operator) {
                return Err(Error::NotImplemented("filter operator"));
            }
            builder.push(format!("filter {} {}", entry.field, entry.operator));
            Ok(builder)
        }

        fn sort(&self, mut builder: Vec<String>, entry: &SortEntry) -> Result<Vec<String>> {
            builder.push(format!("sort {} {}", entry.field, entry.order));
            Ok(builder)
        }

        fn page(&self, mut builder: Vec<String>, page: &PageSlice) -> Result<Vec<String>> {
            builder.push(format!("page {} {}", page.size, page.offset));
            Ok(builder)
        }
    }

    #[test]
    fn test_supports_operator() {
        let adapter = LogAdapter;
        assert!(adapter.supports_operator("="));
        assert!(!adapter.supports_operator("between"));
    }

    #[test]
    fn test_unsupported_operator_is_programmer_error() {
        let adapter = LogAdapter;
        let entry = FilterEntry {
            field: SmolStr::new("test"),
            operator: SmolStr::new("between"),
            value: crate::value::QueryValue::Int(1),
        };

        let err = adapter.filter(Vec::new(), &entry).unwrap_err();
        assert!(matches!(err, Error::NotImplemented(_)));
    }

    #[test]
    fn test_value_returning_application() {
        let adapter = LogAdapter;
        let builder = adapter
            .sort(
                Vec::new(),
                &SortEntry {
                    field: SmolStr::new("name"),
                    order: SortOrder::Desc,
                },
            )
            .unwrap();
        assert_eq!(builder, ["sort name desc"]);
    }
}
