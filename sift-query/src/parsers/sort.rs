//! Sort parsing and normalization.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt;

use crate::error::ValidationError;
use crate::grammar::SortGrammar;
use crate::schema::Schema;
use crate::value::QueryValue;

/// Sort direction for one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending order (A-Z, 0-9, oldest first).
    #[default]
    Asc,
    /// Descending order (Z-A, 9-0, newest first).
    Desc,
}

impl SortOrder {
    /// The lower-case name (`asc`/`desc`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    /// Parse case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("asc") {
            Some(Self::Asc)
        } else if value.eq_ignore_ascii_case("desc") {
            Some(Self::Desc)
        } else {
            None
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ordered mapping from canonical key (`sort:field`) to a normalized
/// sort entry. Unlike filters, this order is the application order:
/// the caller's first sort key is the primary sort.
pub type SortMap = IndexMap<String, SortEntry>;

/// One normalized sort operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortEntry {
    /// The whitelisted field.
    pub field: SmolStr,
    /// The requested direction.
    pub order: SortOrder,
}

/// Instance-level sort defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortDefaults {
    order: Option<SortOrder>,
}

impl SortDefaults {
    /// Create empty defaults (ascending applies).
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the default direction for string/array sort input.
    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = Some(order);
        self
    }

    /// Resolve the effective default direction.
    pub fn resolve(&self) -> SortOrder {
        self.order.unwrap_or_default()
    }
}

/// Parses raw sort input into normalized, canonically-keyed entries.
#[derive(Debug)]
pub struct SortParser<'a> {
    schema: &'a Schema,
    default_order: SortOrder,
}

impl<'a> SortParser<'a> {
    /// Create a parser over the schema with a resolved default direction.
    pub fn new(schema: &'a Schema, default_order: SortOrder) -> Self {
        Self {
            schema,
            default_order,
        }
    }

    /// The canonical key for a sortable field.
    pub fn build_key(field: &str) -> String {
        format!("sort:{field}")
    }

    /// The structural grammar this parser validates against.
    pub fn grammar(&self) -> SortGrammar {
        SortGrammar::synthesize(self.schema)
    }

    /// Parse raw sort input.
    ///
    /// Accepts a single field name, an ordered list of field names, or
    /// an object mapping field to direction; all three normalize to the
    /// same entry shape. Absent input yields an empty map.
    pub fn parse(&self, query: Option<&QueryValue>) -> Result<SortMap, ValidationError> {
        let Some(query) = query else {
            return Ok(SortMap::new());
        };

        self.grammar().check(query)?;

        let mut sorts = SortMap::new();
        match query {
            QueryValue::String(field) => {
                self.push(&mut sorts, field, self.default_order);
            }
            QueryValue::Array(items) => {
                for item in items {
                    if let Some(field) = item.as_str() {
                        self.push(&mut sorts, field, self.default_order);
                    }
                }
            }
            QueryValue::Object(orders) => {
                for (field, order) in orders {
                    let order = order
                        .as_str()
                        .and_then(SortOrder::parse)
                        .unwrap_or(self.default_order);
                    self.push(&mut sorts, field, order);
                }
            }
            _ => {}
        }

        Ok(sorts)
    }

    fn push(&self, sorts: &mut SortMap, field: &str, order: SortOrder) {
        sorts.insert(
            Self::build_key(field),
            SortEntry {
                field: SmolStr::new(field),
                order,
            },
        );
    }

    /// Flatten a parsed map into canonical key -> direction name, the
    /// shape the cross-field validator sees.
    pub fn flatten(sorts: &SortMap) -> IndexMap<String, QueryValue> {
        sorts
            .iter()
            .map(|(key, entry)| (key.clone(), QueryValue::from(entry.order.as_str())))
            .collect()
    }
}
