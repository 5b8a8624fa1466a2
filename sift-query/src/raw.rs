//! Raw query input and the supported query-string conventions.
//!
//! A [`RawQuery`] carries the three optionally-absent concern values —
//! `filter`, `sort`, `page` — exactly as the caller supplied them. Two
//! conventions are supported for producing one:
//!
//! - [`QueryType::Nested`] — the input already carries nested
//!   objects/arrays (a framework pre-parsed the query, or it arrived as a
//!   JSON body). See [`RawQuery::from_value`] / [`RawQuery::from_json`].
//! - [`QueryType::Bracket`] — a raw query string using bracket notation
//!   (`filter[age][>]=21&sort[]=name`) that needs explicit parsing into
//!   nested objects. See [`RawQuery::from_query_str`].
//!
//! ```rust
//! use sift_query::raw::RawQuery;
//! use sift_query::value::QueryValue;
//!
//! let raw = RawQuery::from_query_str("filter[age][>]=21&page=2");
//! assert!(raw.filter.is_some());
//! assert_eq!(raw.page, Some(QueryValue::String("2".into())));
//! assert!(raw.sort.is_none());
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::error::ValidationError;
use crate::value::QueryValue;

/// Which raw-query convention the input uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    /// Input is already nested objects/arrays (framework pre-parsed).
    #[default]
    Nested,
    /// Input is a raw query string with bracket notation.
    Bracket,
}

/// The raw, untrusted query input for the three concerns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawQuery {
    /// Raw value under the `filter` key, if present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<QueryValue>,
    /// Raw value under the `sort` key, if present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<QueryValue>,
    /// Raw value under the `page` key, if present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<QueryValue>,
}

impl RawQuery {
    /// Create an empty raw query (all concerns absent).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the raw filter value.
    pub fn with_filter(mut self, value: impl Into<QueryValue>) -> Self {
        self.filter = Some(value.into());
        self
    }

    /// Set the raw sort value.
    pub fn with_sort(mut self, value: impl Into<QueryValue>) -> Self {
        self.sort = Some(value.into());
        self
    }

    /// Set the raw page value.
    pub fn with_page(mut self, value: impl Into<QueryValue>) -> Self {
        self.page = Some(value.into());
        self
    }

    /// Check if all three concerns are absent.
    pub fn is_empty(&self) -> bool {
        self.filter.is_none() && self.sort.is_none() && self.page.is_none()
    }

    /// Build from an already-nested query value.
    ///
    /// The top level must be an object; its `filter`, `sort`, and `page`
    /// keys become the concern values. Other top-level keys are ignored —
    /// they belong to other parameters, and the whitelist gates the
    /// fields *inside* each concern.
    pub fn from_value(value: QueryValue) -> Result<Self, ValidationError> {
        let QueryValue::Object(mut map) = value else {
            return Err(ValidationError::new("query", "must be of type object"));
        };

        Ok(Self {
            filter: map.shift_remove("filter"),
            sort: map.shift_remove("sort"),
            page: map.shift_remove("page"),
        })
    }

    /// Build from pre-parsed JSON (the nested convention).
    pub fn from_json(value: serde_json::Value) -> Result<Self, ValidationError> {
        Self::from_value(QueryValue::from_json(value))
    }

    /// Build from a raw query string using bracket notation.
    ///
    /// `filter[age][>]=21` nests objects, `sort[]=name` pushes onto an
    /// array, and `sort[0]=name` addresses an array index. A later write
    /// to an occupied scalar path overwrites it (last write wins). All
    /// scalar values are strings at this stage; the grammar layer coerces
    /// where it permits coercion.
    pub fn from_query_str(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut root: IndexMap<String, QueryValue> = IndexMap::new();

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            let segments = split_bracket_path(&key);
            insert_segments(&mut root, &segments, value.into_owned());
        }

        Self {
            filter: root.shift_remove("filter"),
            sort: root.shift_remove("sort"),
            page: root.shift_remove("page"),
        }
    }

    /// Build from a string input using the given convention.
    ///
    /// `Bracket` parses the input as a query string; `Nested` expects the
    /// input to be a JSON document.
    pub fn from_input(input: &str, query_type: QueryType) -> Result<Self, ValidationError> {
        match query_type {
            QueryType::Bracket => Ok(Self::from_query_str(input)),
            QueryType::Nested => {
                let value: serde_json::Value = serde_json::from_str(input)
                    .map_err(|_| ValidationError::new("query", "must be valid JSON"))?;
                Self::from_json(value)
            }
        }
    }
}

/// Split `filter[age][>]` into `["filter", "age", ">"]`.
fn split_bracket_path(key: &str) -> Vec<&str> {
    let Some(open) = key.find('[') else {
        return vec![key];
    };

    let mut segments = vec![&key[..open]];
    let mut rest = &key[open..];
    while let Some(stripped) = rest.strip_prefix('[') {
        match stripped.find(']') {
            Some(close) => {
                segments.push(&stripped[..close]);
                rest = &stripped[close + 1..];
            }
            None => {
                // Unterminated bracket; take the remainder as one segment.
                segments.push(stripped);
                break;
            }
        }
    }
    segments
}

fn insert_segments(object: &mut IndexMap<String, QueryValue>, segments: &[&str], value: String) {
    let head = segments[0];

    if segments.len() == 1 {
        object.insert(head.to_string(), QueryValue::String(value));
        return;
    }

    let next = segments[1];
    let is_array_leaf =
        segments.len() == 2 && (next.is_empty() || next.bytes().all(|b| b.is_ascii_digit()));

    if is_array_leaf {
        let entry = object
            .entry(head.to_string())
            .or_insert_with(|| QueryValue::Array(Vec::new()));
        if !matches!(entry, QueryValue::Array(_)) {
            *entry = QueryValue::Array(Vec::new());
        }
        if let QueryValue::Array(items) = entry {
            match next.parse::<usize>() {
                Ok(index) if index < items.len() => items[index] = QueryValue::String(value),
                _ => items.push(QueryValue::String(value)),
            }
        }
        return;
    }

    let entry = object
        .entry(head.to_string())
        .or_insert_with(|| QueryValue::Object(IndexMap::new()));
    if !matches!(entry, QueryValue::Object(_)) {
        *entry = QueryValue::Object(IndexMap::new());
    }
    if let QueryValue::Object(map) = entry {
        insert_segments(map, &segments[1..], value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(entries: &[(&str, QueryValue)]) -> QueryValue {
        QueryValue::Object(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn test_bracket_scalar() {
        let raw = RawQuery::from_query_str("page=2");
        assert_eq!(raw.page, Some(QueryValue::String("2".into())));
    }

    #[test]
    fn test_bracket_nested_objects() {
        let raw = RawQuery::from_query_str("filter[age][>]=21&filter[name]=alice");
        assert_eq!(
            raw.filter,
            Some(object(&[
                ("age", object(&[(">", QueryValue::String("21".into()))])),
                ("name", QueryValue::String("alice".into())),
            ]))
        );
    }

    #[test]
    fn test_bracket_array_push() {
        let raw = RawQuery::from_query_str("sort[]=name&sort[]=age");
        assert_eq!(
            raw.sort,
            Some(QueryValue::Array(vec![
                QueryValue::String("name".into()),
                QueryValue::String("age".into()),
            ]))
        );
    }

    #[test]
    fn test_bracket_array_indices() {
        let raw = RawQuery::from_query_str("sort[0]=name&sort[1]=age");
        assert_eq!(
            raw.sort,
            Some(QueryValue::Array(vec![
                QueryValue::String("name".into()),
                QueryValue::String("age".into()),
            ]))
        );
    }

    #[test]
    fn test_bracket_object_form_sort() {
        let raw = RawQuery::from_query_str("sort[name]=desc");
        assert_eq!(
            raw.sort,
            Some(object(&[("name", QueryValue::String("desc".into()))]))
        );
    }

    #[test]
    fn test_bracket_last_write_wins() {
        let raw = RawQuery::from_query_str("page=1&page=2");
        assert_eq!(raw.page, Some(QueryValue::String("2".into())));
    }

    #[test]
    fn test_bracket_percent_decoding() {
        let raw = RawQuery::from_query_str("filter[name][like]=%25ali%25");
        let filter = raw.filter.unwrap();
        let name = filter.as_object().unwrap().get("name").unwrap();
        assert_eq!(
            name.as_object().unwrap().get("like").unwrap(),
            &QueryValue::String("%ali%".into())
        );
    }

    #[test]
    fn test_bracket_ignores_foreign_keys() {
        let raw = RawQuery::from_query_str("search=abc&page=2");
        assert!(raw.filter.is_none());
        assert_eq!(raw.page, Some(QueryValue::String("2".into())));
    }

    #[test]
    fn test_leading_question_mark_stripped() {
        let raw = RawQuery::from_query_str("?page=3");
        assert_eq!(raw.page, Some(QueryValue::String("3".into())));
    }

    #[test]
    fn test_from_value_requires_object() {
        let err = RawQuery::from_value(QueryValue::Int(1)).unwrap_err();
        assert_eq!(err.to_string(), "query must be of type object");
    }

    #[test]
    fn test_from_json() {
        let raw = RawQuery::from_json(serde_json::json!({
            "filter": {"test": 123},
            "sort": "test",
            "page": 2,
        }))
        .unwrap();

        assert_eq!(raw.sort, Some(QueryValue::String("test".into())));
        assert_eq!(raw.page, Some(QueryValue::Int(2)));
        assert_eq!(
            raw.filter,
            Some(object(&[("test", QueryValue::Int(123))]))
        );
    }

    #[test]
    fn test_from_input_dispatches_on_query_type() {
        let bracket = RawQuery::from_input("page=2", QueryType::Bracket).unwrap();
        assert_eq!(bracket.page, Some(QueryValue::String("2".into())));

        let nested = RawQuery::from_input(r#"{"page": 2}"#, QueryType::Nested).unwrap();
        assert_eq!(nested.page, Some(QueryValue::Int(2)));

        assert!(RawQuery::from_input("not json", QueryType::Nested).is_err());
    }
}
