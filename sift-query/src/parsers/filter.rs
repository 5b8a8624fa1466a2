//! Filter parsing and normalization.

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::error::ValidationError;
use crate::grammar::FilterGrammar;
use crate::schema::Schema;
use crate::value::QueryValue;

/// Ordered mapping from canonical key (`filter:field[operator]`) to a
/// normalized filter entry. Insertion order follows the query; the
/// orchestrator applies entries in schema registration order.
pub type FilterMap = IndexMap<String, FilterEntry>;

/// One normalized filter operation.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterEntry {
    /// The whitelisted field.
    pub field: SmolStr,
    /// The operator, explicit or defaulted.
    pub operator: SmolStr,
    /// The raw operand value.
    pub value: QueryValue,
}

/// Instance-level filter defaults, layered over the adapter's default
/// operator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterDefaults {
    operator: Option<SmolStr>,
}

impl FilterDefaults {
    /// Create empty defaults (adapter default operator applies).
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the default operator for bare-scalar filter input.
    pub fn operator(mut self, operator: impl AsRef<str>) -> Self {
        self.operator = Some(SmolStr::new(operator.as_ref()));
        self
    }

    /// Resolve the effective default operator.
    pub fn resolve(&self, fallback: &str) -> SmolStr {
        self.operator.clone().unwrap_or_else(|| SmolStr::new(fallback))
    }
}

/// Parses raw filter input into normalized, canonically-keyed entries.
#[derive(Debug)]
pub struct FilterParser<'a> {
    schema: &'a Schema,
    default_operator: SmolStr,
}

impl<'a> FilterParser<'a> {
    /// Create a parser over the schema with a resolved default operator.
    pub fn new(schema: &'a Schema, default_operator: impl AsRef<str>) -> Self {
        Self {
            schema,
            default_operator: SmolStr::new(default_operator.as_ref()),
        }
    }

    /// The canonical key for a `(field, operator)` pair.
    pub fn build_key(field: &str, operator: &str) -> String {
        format!("filter:{field}[{operator}]")
    }

    /// The structural grammar this parser validates against.
    pub fn grammar(&self) -> FilterGrammar {
        FilterGrammar::synthesize(self.schema, &self.default_operator)
    }

    /// Parse raw filter input.
    ///
    /// Absent input yields an empty map, not an error. A scalar field
    /// value implies the default operator; an object value emits one
    /// entry per `(operator, operand)` pair. Entries sharing a canonical
    /// key keep the first key position with the last value.
    pub fn parse(&self, query: Option<&QueryValue>) -> Result<FilterMap, ValidationError> {
        let Some(query) = query else {
            return Ok(FilterMap::new());
        };

        self.grammar().check(query)?;

        let mut filters = FilterMap::new();
        if let QueryValue::Object(fields) = query {
            for (field, value) in fields {
                match value {
                    QueryValue::Object(operators) => {
                        for (operator, operand) in operators {
                            let entry = FilterEntry {
                                field: SmolStr::new(field),
                                operator: SmolStr::new(operator),
                                value: operand.clone(),
                            };
                            filters.insert(Self::build_key(field, operator), entry);
                        }
                    }
                    _ => {
                        let entry = FilterEntry {
                            field: SmolStr::new(field),
                            operator: self.default_operator.clone(),
                            value: value.clone(),
                        };
                        filters.insert(Self::build_key(field, &self.default_operator), entry);
                    }
                }
            }
        }

        Ok(filters)
    }

    /// Flatten a parsed map into canonical key -> operand value, the
    /// shape the cross-field validator sees.
    pub fn flatten(filters: &FilterMap) -> IndexMap<String, QueryValue> {
        filters
            .iter()
            .map(|(key, entry)| (key.clone(), entry.value.clone()))
            .collect()
    }
}
