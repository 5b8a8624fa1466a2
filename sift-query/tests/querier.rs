//! Integration tests for the query specification pipeline.
//!
//! These exercise the full parse -> validate -> apply sequence with a
//! recording adapter, covering the ordering contracts (filters in schema
//! order, sorts in caller order), the enablement gates, and validation
//! memoization.

use std::cell::Cell;
use std::rc::Rc;

use indexmap::IndexMap;
use pretty_assertions::assert_eq;

use sift_query::parsers::{FilterEntry, PageSlice, SortEntry};
use sift_query::prelude::*;

/// Records every application as a line of text.
struct RecordingAdapter;

impl Adapter for RecordingAdapter {
    type Builder = Vec<String>;

    fn filter_operators(&self) -> &'static [&'static str] {
        &["=", "!=", ">", "in"]
    }

    fn default_filter_operator(&self) -> &'static str {
        "="
    }

    fn filter(&self, mut builder: Vec<String>, entry: &FilterEntry) -> Result<Vec<String>> {
        builder.push(format!("filter {}[{}]", entry.field, entry.operator));
        Ok(builder)
    }

    fn sort(&self, mut builder: Vec<String>, entry: &SortEntry) -> Result<Vec<String>> {
        builder.push(format!("sort {} {}", entry.field, entry.order));
        Ok(builder)
    }

    fn page(&self, mut builder: Vec<String>, page: &PageSlice) -> Result<Vec<String>> {
        builder.push(format!(
            "page size={} number={} offset={}",
            page.size, page.number, page.offset
        ));
        Ok(builder)
    }
}

fn full_schema() -> Schema {
    let mut schema = Schema::new();
    schema
        .filter("test", "=")
        .filter("testing", "!=")
        .sort("test")
        .sort("testing")
        .page(true);
    schema
}

#[test]
fn filters_apply_in_schema_registration_order() {
    // Registry order is test[=] then testing[!=]; the query names them
    // in the opposite order. Application order must be the registry's.
    let raw = RawQuery::from_json(serde_json::json!({
        "filter": {"testing": {"!=": 456}, "test": 123},
    }))
    .unwrap();

    let applied = Querier::new(raw, full_schema(), RecordingAdapter)
        .run(Vec::new())
        .unwrap();
    assert_eq!(applied, vec!["filter test[=]", "filter testing[!=]"]);
}

#[test]
fn sorts_apply_in_caller_order() {
    let raw = RawQuery::new().with_sort(vec!["testing", "test"]);

    let applied = Querier::new(raw, full_schema(), RecordingAdapter)
        .run(Vec::new())
        .unwrap();
    assert_eq!(applied, vec!["sort testing asc", "sort test asc"]);
}

#[test]
fn bare_page_number_round_trips_through_defaults() {
    let raw = RawQuery::new().with_page(2);

    let applied = Querier::new(raw, full_schema(), RecordingAdapter)
        .run(Vec::new())
        .unwrap();
    assert_eq!(applied, vec!["page size=20 number=2 offset=20"]);
}

#[test]
fn end_to_end_applies_all_three_concerns_in_sequence() {
    let raw = RawQuery::from_json(serde_json::json!({
        "filter": {"test": 123},
        "sort": "test",
        "page": 2,
    }))
    .unwrap();

    let applied = Querier::new(raw, full_schema(), RecordingAdapter)
        .run(Vec::new())
        .unwrap();
    assert_eq!(
        applied,
        vec![
            "filter test[=]",
            "sort test asc",
            "page size=20 number=2 offset=20",
        ]
    );
}

#[test]
fn validate_is_idempotent_and_memoized() {
    let raw = RawQuery::from_json(serde_json::json!({"filter": {"test": 1}})).unwrap();

    let calls = Rc::new(Cell::new(0u32));
    let seen = Rc::clone(&calls);
    let mut querier = Querier::new(raw, full_schema(), RecordingAdapter).with_validator(
        move |concern: Concern, _: &IndexMap<String, QueryValue>| {
            if concern == Concern::Filter {
                seen.set(seen.get() + 1);
            }
            Ok::<(), ValidationError>(())
        },
    );

    let first = querier.validate();
    let second = querier.validate();
    assert_eq!(first, second);
    assert!(first.is_ok());
    assert_eq!(calls.get(), 1);
}

#[test]
fn disabled_sorter_with_input_always_raises() {
    let mut schema = Schema::new();
    schema.filter("test", "=").page(true);

    let raw = RawQuery::new().with_sort("anything");
    let err = Querier::new(raw, schema, RecordingAdapter)
        .run(Vec::new())
        .unwrap_err();
    assert_eq!(err.to_string(), "sort is disabled");
}

#[test]
fn unregistered_filter_field_is_rejected_with_path() {
    let raw = RawQuery::from_json(serde_json::json!({"filter": {"invalid": 123}})).unwrap();

    let err = Querier::new(raw, full_schema(), RecordingAdapter)
        .validate()
        .unwrap_err();
    assert_eq!(err.to_string(), "filter:invalid is not allowed");
}

#[test]
fn bracket_convention_end_to_end() {
    let config = Config::new().with_query_type(QueryType::Bracket);
    let mut querier = Querier::from_input(
        "filter[testing][!%3D]=456&filter[test]=123&sort[]=testing&sort[]=test&page[size]=10",
        full_schema(),
        RecordingAdapter,
        config,
    )
    .unwrap();

    let applied = querier.run(Vec::new()).unwrap();
    assert_eq!(
        applied,
        vec![
            "filter test[=]",
            "filter testing[!=]",
            "sort testing asc",
            "sort test asc",
            "page size=10 number=1 offset=0",
        ]
    );
}

#[test]
fn override_handler_wins_over_adapter() {
    let raw = RawQuery::from_json(serde_json::json!({"filter": {"test": 123}})).unwrap();

    let applied = Querier::new(raw, full_schema(), RecordingAdapter)
        .on_filter("test", "=", |mut builder: Vec<String>, entry| {
            builder.push(format!("override {}", entry.field));
            builder
        })
        .run(Vec::new())
        .unwrap();
    assert_eq!(applied, vec!["override test"]);
}

#[test]
fn backend_value_rules_run_after_grammar() {
    /// Adapter whose backend refuses string operands for `=`.
    struct StrictAdapter;

    impl Adapter for StrictAdapter {
        type Builder = Vec<String>;

        fn filter_operators(&self) -> &'static [&'static str] {
            &["="]
        }

        fn default_filter_operator(&self) -> &'static str {
            "="
        }

        fn filter(&self, builder: Vec<String>, _: &FilterEntry) -> Result<Vec<String>> {
            Ok(builder)
        }

        fn sort(&self, builder: Vec<String>, _: &SortEntry) -> Result<Vec<String>> {
            Ok(builder)
        }

        fn page(&self, builder: Vec<String>, _: &PageSlice) -> Result<Vec<String>> {
            Ok(builder)
        }

        fn value_rules(&self) -> ValueRules {
            ValueRules::new().rule("filter:=", ValueRule::Kind(ValueKind::Number))
        }
    }

    let mut schema = Schema::new();
    schema.filter("test", "=");

    // Passes the grammar (string is a permitted generic kind), fails the
    // backend rule.
    let raw = RawQuery::from_json(serde_json::json!({"filter": {"test": "abc"}})).unwrap();
    let err = Querier::new(raw, schema, StrictAdapter)
        .validate()
        .unwrap_err();
    assert_eq!(err.to_string(), "filter:test[=] must be a number");
}

#[test]
fn default_sort_applies_when_query_omits_it() {
    let raw = RawQuery::new().with_page(1);

    let applied = Querier::new(raw, full_schema(), RecordingAdapter)
        .with_default_sort("test")
        .run(Vec::new())
        .unwrap();
    assert_eq!(
        applied,
        vec!["sort test asc", "page size=20 number=1 offset=0"]
    );
}
