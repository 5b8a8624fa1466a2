//! # sift-sql
//!
//! The default SQL builder adapter for [`sift-query`](sift_query).
//!
//! [`SqlBuilder`] is a small value-type SELECT builder: WHERE predicates
//! with `$n` placeholders and a bound-parameter list, ORDER BY clauses,
//! and LIMIT/OFFSET. [`SqlAdapter`] translates each normalized entry the
//! engine hands it into exactly one builder mutation.
//!
//! ```rust
//! use sift_query::prelude::*;
//! use sift_sql::{SqlAdapter, SqlBuilder, SqlParam};
//!
//! let mut schema = Schema::new();
//! schema.filter("age", ">").sort("name").page(true);
//!
//! let raw = RawQuery::from_query_str("filter[age][>]=21&sort=name&page=2");
//! let builder = Querier::new(raw, schema, SqlAdapter)
//!     .run(SqlBuilder::table("users"))
//!     .unwrap();
//!
//! assert_eq!(
//!     builder.to_sql(),
//!     "select * from \"users\" where \"age\" > $1 order by \"name\" asc limit 20 offset 20",
//! );
//! assert_eq!(builder.params(), [SqlParam::String("21".into())]);
//! ```

use std::fmt::Write;

use tracing::trace;

use sift_query::adapter::Adapter;
use sift_query::error::{Error, Result, ValidationError};
use sift_query::parsers::{FilterEntry, FilterParser, PageSlice, SortEntry, SortOrder};
use sift_query::validate::{ValueRule, ValueRules};
use sift_query::value::{QueryValue, ValueKind};

/// A value bound to a `$n` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    /// SQL NULL.
    Null,
    /// Boolean parameter.
    Bool(bool),
    /// Integer parameter.
    Int(i64),
    /// Float parameter.
    Float(f64),
    /// Text parameter.
    String(String),
}

impl SqlParam {
    /// Convert a scalar query value into a parameter.
    ///
    /// Query-string scalars stay text; the database coerces on bind.
    /// Non-scalar values have no single-parameter representation and
    /// bind as NULL.
    pub fn from_value(value: &QueryValue) -> Self {
        match value {
            QueryValue::Null => Self::Null,
            QueryValue::Bool(b) => Self::Bool(*b),
            QueryValue::Int(i) => Self::Int(*i),
            QueryValue::Float(f) => Self::Float(*f),
            QueryValue::String(s) => Self::String(s.clone()),
            QueryValue::Array(_) | QueryValue::Object(_) => Self::Null,
        }
    }
}

/// A value-type SELECT statement builder.
///
/// Every mutation consumes and returns the builder, matching the
/// engine's value-returning application model. Rendering is
/// deterministic: predicates in application order, placeholders numbered
/// from `$1`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SqlBuilder {
    table: String,
    wheres: Vec<String>,
    order_by: Vec<String>,
    limit: Option<i64>,
    offset: Option<i64>,
    params: Vec<SqlParam>,
}

impl SqlBuilder {
    /// Start a `select * from table` builder.
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    /// The bound parameters, in placeholder order.
    pub fn params(&self) -> &[SqlParam] {
        &self.params
    }

    /// Add a `column <op> $n` predicate.
    pub fn where_op(mut self, column: &str, operator: &str, value: SqlParam) -> Self {
        self.params.push(value);
        let predicate = format!(
            "{} {} ${}",
            quote_ident(column),
            operator,
            self.params.len()
        );
        self.wheres.push(predicate);
        self
    }

    /// Add an `is null` / `is not null` predicate.
    pub fn where_null(mut self, column: &str, negated: bool) -> Self {
        let check = if negated { "is not null" } else { "is null" };
        self.wheres.push(format!("{} {}", quote_ident(column), check));
        self
    }

    /// Add an `in (...)` / `not in (...)` predicate.
    pub fn where_in(mut self, column: &str, values: Vec<SqlParam>, negated: bool) -> Self {
        let mut placeholders = Vec::with_capacity(values.len());
        for value in values {
            self.params.push(value);
            placeholders.push(format!("${}", self.params.len()));
        }
        let keyword = if negated { "not in" } else { "in" };
        self.wheres.push(format!(
            "{} {} ({})",
            quote_ident(column),
            keyword,
            placeholders.join(", ")
        ));
        self
    }

    /// Add a `between $a and $b` / `not between $a and $b` predicate.
    pub fn where_between(mut self, column: &str, low: SqlParam, high: SqlParam, negated: bool) -> Self {
        self.params.push(low);
        let low_idx = self.params.len();
        self.params.push(high);
        let high_idx = self.params.len();
        let keyword = if negated { "not between" } else { "between" };
        self.wheres.push(format!(
            "{} {} ${} and ${}",
            quote_ident(column),
            keyword,
            low_idx,
            high_idx
        ));
        self
    }

    /// Append an ORDER BY clause.
    pub fn order_by(mut self, column: &str, order: SortOrder) -> Self {
        self.order_by
            .push(format!("{} {}", quote_ident(column), order));
        self
    }

    /// Set the LIMIT.
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the OFFSET.
    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Render the statement.
    pub fn to_sql(&self) -> String {
        let mut sql = String::with_capacity(64);
        self.write_sql(&mut sql);
        sql
    }

    /// Write the statement directly to a buffer.
    pub fn write_sql(&self, buffer: &mut String) {
        let _ = write!(buffer, "select * from {}", quote_ident(&self.table));
        if !self.wheres.is_empty() {
            let _ = write!(buffer, " where {}", self.wheres.join(" and "));
        }
        if !self.order_by.is_empty() {
            let _ = write!(buffer, " order by {}", self.order_by.join(", "));
        }
        if let Some(limit) = self.limit {
            let _ = write!(buffer, " limit {limit}");
        }
        if let Some(offset) = self.offset {
            let _ = write!(buffer, " offset {offset}");
        }
    }
}

fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Filter operators the SQL adapter can apply.
pub const FILTER_OPERATORS: &[&str] = &[
    "=", "!=", "<>", ">", ">=", "<", "<=", "is", "is not", "in", "not in", "like", "not like",
    "ilike", "not ilike", "between", "not between",
];

/// Translates normalized entries into [`SqlBuilder`] mutations.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlAdapter;

impl SqlAdapter {
    /// Create the adapter.
    pub fn new() -> Self {
        Self
    }
}

impl Adapter for SqlAdapter {
    type Builder = SqlBuilder;

    fn filter_operators(&self) -> &'static [&'static str] {
        FILTER_OPERATORS
    }

    fn default_filter_operator(&self) -> &'static str {
        "="
    }

    fn filter(&self, builder: SqlBuilder, entry: &FilterEntry) -> Result<SqlBuilder> {
        if !self.supports_operator(&entry.operator) {
            return Err(Error::NotImplemented("filter operator"));
        }
        trace!(field = %entry.field, operator = %entry.operator, "applying filter");

        let negated = entry.operator.starts_with("not ") || entry.operator.ends_with(" not");
        let builder = match entry.operator.as_str() {
            "is" | "is not" => builder.where_null(&entry.field, negated),
            "in" | "not in" => {
                let values = entry
                    .value
                    .as_array()
                    .map(|items| items.iter().map(SqlParam::from_value).collect())
                    .unwrap_or_else(|| vec![SqlParam::from_value(&entry.value)]);
                builder.where_in(&entry.field, values, negated)
            }
            "between" | "not between" => {
                let items = entry.value.as_array().unwrap_or_default();
                if items.len() != 2 {
                    let path = FilterParser::build_key(&entry.field, &entry.operator);
                    return Err(
                        ValidationError::must_be(path, "an array containing 2 items").into(),
                    );
                }
                builder.where_between(
                    &entry.field,
                    SqlParam::from_value(&items[0]),
                    SqlParam::from_value(&items[1]),
                    negated,
                )
            }
            operator => builder.where_op(
                &entry.field,
                operator,
                SqlParam::from_value(&entry.value),
            ),
        };

        Ok(builder)
    }

    fn sort(&self, builder: SqlBuilder, entry: &SortEntry) -> Result<SqlBuilder> {
        trace!(field = %entry.field, order = %entry.order, "applying sort");
        Ok(builder.order_by(&entry.field, entry.order))
    }

    fn page(&self, builder: SqlBuilder, page: &PageSlice) -> Result<SqlBuilder> {
        trace!(size = page.size, offset = page.offset, "applying page");
        Ok(builder.limit(page.size).offset(page.offset))
    }

    fn value_rules(&self) -> ValueRules {
        let scalar = || {
            ValueRule::OneOf(vec![
                ValueKind::Boolean,
                ValueKind::Number,
                ValueKind::String,
            ])
        };
        let comparable = || ValueRule::OneOf(vec![ValueKind::Number, ValueKind::String]);
        let pattern = || ValueRule::Kind(ValueKind::String);
        let range = || ValueRule::Array {
            items: Some(ValueKind::Number),
            len: Some(2),
        };

        ValueRules::new()
            .rule("filter:=", scalar())
            .rule("filter:!=", scalar())
            .rule("filter:<>", scalar())
            .rule("filter:>", comparable())
            .rule("filter:>=", comparable())
            .rule("filter:<", comparable())
            .rule("filter:<=", comparable())
            .rule("filter:is", ValueRule::Null)
            .rule("filter:is not", ValueRule::Null)
            .rule("filter:in", ValueRule::Array {
                items: None,
                len: None,
            })
            .rule("filter:not in", ValueRule::Array {
                items: None,
                len: None,
            })
            .rule("filter:like", pattern())
            .rule("filter:not like", pattern())
            .rule("filter:ilike", pattern())
            .rule("filter:not ilike", pattern())
            .rule("filter:between", range())
            .rule("filter:not between", range())
    }
}
