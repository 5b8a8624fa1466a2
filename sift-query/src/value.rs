//! Loosely-typed query values.
//!
//! Query-string input arrives untyped: scalars are text, nesting depends on
//! the parsing convention, and numbers may be spelled as strings. This
//! module provides [`QueryValue`], the value representation every parser
//! and validator in this crate operates on.
//!
//! The object variant uses an insertion-ordered map so the query's own key
//! order survives normalization — filter and sort semantics depend on it.
//!
//! ```rust
//! use sift_query::value::{QueryValue, ValueKind};
//!
//! let value: QueryValue = "21".into();
//! assert_eq!(value.kind(), ValueKind::String);
//! assert_eq!(value.as_i64_lenient(), Some(21));
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A loosely-typed value from a query string or pre-parsed query object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// String value.
    String(String),
    /// List of values.
    Array(Vec<QueryValue>),
    /// Nested object, preserving key insertion order.
    Object(IndexMap<String, QueryValue>),
}

impl QueryValue {
    /// The broad kind of this value, as used in validation messages.
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Bool(_) => ValueKind::Boolean,
            Self::Int(_) | Self::Float(_) => ValueKind::Number,
            Self::String(_) => ValueKind::String,
            Self::Array(_) => ValueKind::Array,
            Self::Object(_) => ValueKind::Object,
        }
    }

    /// Check if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Check if this is an object value.
    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    /// Get the string content, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the object content, if this is an object.
    pub fn as_object(&self) -> Option<&IndexMap<String, QueryValue>> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Get the array content, if this is an array.
    pub fn as_array(&self) -> Option<&[QueryValue]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Extract a number, accepting numeric strings.
    ///
    /// Query-string scalars arrive as text, so `"21"` counts as a number
    /// here. Non-numeric strings return `None`.
    pub fn as_f64_lenient(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Extract an integer, accepting integer-looking strings.
    ///
    /// `"2"` yields `Some(2)`; `"1.1"` and `1.1` yield `None` — a
    /// fractional value is a number but not an integer.
    pub fn as_i64_lenient(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
            Self::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
    }

    /// Convert a `serde_json::Value` into a query value.
    ///
    /// Used by the pre-parsed (nested) query convention, where a framework
    /// has already decoded the query into JSON-shaped data.
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else {
                    Self::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::Array(items.into_iter().map(Self::from_json).collect())
            }
            serde_json::Value::Object(map) => Self::Object(
                map.into_iter()
                    .map(|(k, v)| (k, Self::from_json(v)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for QueryValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for QueryValue {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<i64> for QueryValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for QueryValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for QueryValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for QueryValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl<T: Into<QueryValue>> From<Vec<T>> for QueryValue {
    fn from(v: Vec<T>) -> Self {
        Self::Array(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<QueryValue>> From<Option<T>> for QueryValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}

impl From<IndexMap<String, QueryValue>> for QueryValue {
    fn from(map: IndexMap<String, QueryValue>) -> Self {
        Self::Object(map)
    }
}

/// The broad kind of a [`QueryValue`], spelled the way validation
/// messages expect (`array`, `boolean`, `number`, `string`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Null.
    Null,
    /// Boolean.
    Boolean,
    /// Integer or float, including numeric strings once coerced.
    Number,
    /// String.
    String,
    /// Array.
    Array,
    /// Nested object.
    Object,
}

impl ValueKind {
    /// The lower-case name used in validation messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
