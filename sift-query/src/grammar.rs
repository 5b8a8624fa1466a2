//! Structural grammars synthesized from the schema registry.
//!
//! Each parser derives a declarative grammar from the [`Schema`]
//! whitelist — a pure `(Schema) -> Grammar` step — and the grammar is
//! then interpreted against the raw query value. This keeps the
//! structural validation independent of any expression library: the
//! rules are plain data, the interpreter is plain code.
//!
//! Grammar checks are the first validation layer. They enforce shape and
//! whitelist membership; operator-specific value rules belong to the
//! backend layer ([`crate::validate::ValueRules`]).

use indexmap::IndexMap;
use smallvec::SmallVec;
use smol_str::SmolStr;

use crate::error::ValidationError;
use crate::schema::Schema;
use crate::value::{QueryValue, ValueKind};

/// Value kinds a filter operand may take, enforced generically for every
/// operator. Shape details (e.g. a range needing exactly two numbers)
/// are backend rules, not grammar.
pub const FILTER_VALUE_KINDS: [ValueKind; 4] = [
    ValueKind::Array,
    ValueKind::Boolean,
    ValueKind::Number,
    ValueKind::String,
];

/// Grammar rule for one whitelisted filter field.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterFieldRule {
    /// Operators registered for the field, in registration order.
    pub operators: SmallVec<[SmolStr; 4]>,
    /// Whether the bare-scalar shape (`field=value`) is permitted, i.e.
    /// the default operator is registered for this field.
    pub allows_bare: bool,
}

/// The filter concern's structural grammar: field -> allowed operators
/// -> allowed value shapes.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterGrammar {
    fields: IndexMap<SmolStr, FilterFieldRule>,
}

impl FilterGrammar {
    /// Derive the grammar from the schema whitelist.
    pub fn synthesize(schema: &Schema, default_operator: &str) -> Self {
        let fields = schema
            .map_filter_fields_to_operators()
            .into_iter()
            .map(|(field, operators)| {
                let allows_bare = operators.iter().any(|op| op == default_operator);
                (
                    field,
                    FilterFieldRule {
                        operators,
                        allows_bare,
                    },
                )
            })
            .collect();

        Self { fields }
    }

    /// The rule for a field, if the field is whitelisted.
    pub fn field_rule(&self, field: &str) -> Option<&FilterFieldRule> {
        self.fields.get(field)
    }

    /// Check a raw filter value against the grammar.
    pub fn check(&self, query: &QueryValue) -> Result<(), ValidationError> {
        let Some(object) = query.as_object() else {
            return Err(ValidationError::new("filter", "must be of type object"));
        };

        for (field, value) in object {
            let path = format!("filter:{field}");
            let Some(rule) = self.fields.get(field.as_str()) else {
                return Err(ValidationError::not_allowed(path));
            };

            match value {
                QueryValue::Object(operators) => {
                    for (operator, operand) in operators {
                        let operator_path = format!("filter:{field}[{operator}]");
                        if !rule.operators.iter().any(|op| op == operator) {
                            return Err(ValidationError::not_allowed(operator_path));
                        }
                        check_filter_value(operand, operator_path)?;
                    }
                }
                _ => {
                    if !rule.allows_bare {
                        return Err(ValidationError::new(path, "must be of type object"));
                    }
                    check_filter_value(value, path)?;
                }
            }
        }

        Ok(())
    }
}

fn check_filter_value(value: &QueryValue, path: String) -> Result<(), ValidationError> {
    if FILTER_VALUE_KINDS.contains(&value.kind()) {
        Ok(())
    } else {
        Err(ValidationError::must_be_one_of(
            path,
            FILTER_VALUE_KINDS.iter().map(ValueKind::as_str),
        ))
    }
}

/// The sort concern's structural grammar: the ordered sortable fields.
#[derive(Debug, Clone, PartialEq)]
pub struct SortGrammar {
    fields: Vec<SmolStr>,
}

impl SortGrammar {
    /// Derive the grammar from the schema whitelist.
    pub fn synthesize(schema: &Schema) -> Self {
        Self {
            fields: schema.sorts().keys().cloned().collect(),
        }
    }

    fn is_registered(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(SmolStr::as_str)
    }

    /// Check a raw sort value against the grammar.
    ///
    /// Accepts the three input shapes: a single field name, an ordered
    /// list of field names, or an object mapping field to order.
    pub fn check(&self, query: &QueryValue) -> Result<(), ValidationError> {
        if self.fields.is_empty() {
            return Err(ValidationError::not_allowed("sort"));
        }

        match query {
            QueryValue::String(field) => {
                if !self.is_registered(field) {
                    return Err(ValidationError::must_be_one_of("sort", self.field_names()));
                }
            }
            QueryValue::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    let path = format!("sort:{index}");
                    let registered = item.as_str().is_some_and(|f| self.is_registered(f));
                    if !registered {
                        return Err(ValidationError::must_be_one_of(path, self.field_names()));
                    }
                    // Duplicates are a distinct violation from unregistered
                    // fields; report the second occurrence's index.
                    if items[..index].contains(item) {
                        return Err(ValidationError::duplicate(path));
                    }
                }
            }
            QueryValue::Object(orders) => {
                for (field, order) in orders {
                    let path = format!("sort:{field}");
                    if !self.is_registered(field) {
                        return Err(ValidationError::not_allowed(path));
                    }
                    let valid_order = order
                        .as_str()
                        .is_some_and(|o| o.eq_ignore_ascii_case("asc") || o.eq_ignore_ascii_case("desc"));
                    if !valid_order {
                        return Err(ValidationError::must_be_one_of(path, ["asc", "desc"]));
                    }
                }
            }
            _ => {
                return Err(ValidationError::must_be_one_of(
                    "sort",
                    ["string", "array", "object"],
                ));
            }
        }

        Ok(())
    }
}

/// The page concern's structural grammar.
///
/// Pagination has a fixed shape — a bare page number or an object with
/// `size`/`number`/`offset` — so there is nothing to synthesize from the
/// whitelist beyond enablement, which the orchestrator gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageGrammar;

impl PageGrammar {
    /// Create the page grammar.
    pub fn new() -> Self {
        Self
    }

    /// Check a raw page value against the grammar.
    pub fn check(&self, query: &QueryValue) -> Result<(), ValidationError> {
        match query {
            QueryValue::Object(fields) => {
                for (key, value) in fields {
                    let path = format!("page:{key}");
                    match key.as_str() {
                        "number" | "size" => check_positive_int(value, &path)?,
                        "offset" => check_non_negative_int(value, &path)?,
                        _ => return Err(ValidationError::not_allowed(path)),
                    }
                }
                Ok(())
            }
            _ => {
                if query.as_f64_lenient().is_none() {
                    return Err(ValidationError::must_be_one_of("page", ["number", "object"]));
                }
                check_positive_int(query, "page")
            }
        }
    }
}

fn check_int(value: &QueryValue, path: &str) -> Result<i64, ValidationError> {
    if value.as_f64_lenient().is_none() {
        return Err(ValidationError::must_be(path, "a number"));
    }
    value
        .as_i64_lenient()
        .ok_or_else(|| ValidationError::must_be(path, "an integer"))
}

fn check_positive_int(value: &QueryValue, path: &str) -> Result<(), ValidationError> {
    let number = check_int(value, path)?;
    if number < 1 {
        return Err(ValidationError::must_be(path, "a positive number"));
    }
    Ok(())
}

fn check_non_negative_int(value: &QueryValue, path: &str) -> Result<(), ValidationError> {
    let number = check_int(value, path)?;
    if number < 0 {
        return Err(ValidationError::must_be(path, "a non-negative number"));
    }
    Ok(())
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

    fn filter_grammar(schema: &Schema) -> FilterGrammar {
        FilterGrammar::synthesize(schema, "=")
    }

    #[test]
    fn test_filter_unregistered_field() {
        let mut schema = Schema::new();
        schema.filter("test", "=");

        let err = filter_grammar(&schema)
            .check(&object(&[("invalid", QueryValue::Int(123))]))
            .unwrap_err();
        assert_eq!(err.to_string(), "filter:invalid is not allowed");
    }

    #[test]
    fn test_filter_unregistered_operator() {
        let mut schema = Schema::new();
        schema.filter("invalid", "=");

        let query = object(&[("invalid", object(&[("!=", QueryValue::Int(456))]))]);
        let err = filter_grammar(&schema).check(&query).unwrap_err();
        assert_eq!(err.to_string(), "filter:invalid[!=] is not allowed");
    }

    #[test]
    fn test_filter_bare_scalar_requires_default_operator() {
        let mut schema = Schema::new();
        schema.filter("invalid", "!=");

        let err = filter_grammar(&schema)
            .check(&object(&[("invalid", QueryValue::Int(123))]))
            .unwrap_err();
        assert_eq!(err.to_string(), "filter:invalid must be of type object");
    }

    #[test]
    fn test_filter_bare_scalar_with_default_operator() {
        let mut schema = Schema::new();
        schema.filter("valid", "=");

        let result = filter_grammar(&schema).check(&object(&[("valid", QueryValue::Int(123))]));
        assert!(result.is_ok());
    }

    #[test]
    fn test_filter_value_kinds() {
        let mut schema = Schema::new();
        schema.filter("valid", "=").filter("valid", "in");

        let grammar = filter_grammar(&schema);
        for value in [
            QueryValue::from(vec![1i64, 2, 3]),
            QueryValue::Bool(true),
            QueryValue::Int(123),
            QueryValue::from("string"),
        ] {
            let query = object(&[("valid", object(&[("=", value)]))]);
            assert!(grammar.check(&query).is_ok());
        }

        let query = object(&[("valid", object(&[("=", QueryValue::Null)]))]);
        let err = grammar.check(&query).unwrap_err();
        assert_eq!(
            err.to_string(),
            "filter:valid[=] must be one of [array, boolean, number, string]"
        );
    }

    #[test]
    fn test_filter_top_level_must_be_object() {
        let mut schema = Schema::new();
        schema.filter("test", "=");

        let err = filter_grammar(&schema)
            .check(&QueryValue::from("test"))
            .unwrap_err();
        assert_eq!(err.to_string(), "filter must be of type object");
    }

    #[test]
    fn test_sort_forbidden_when_nothing_registered() {
        let schema = Schema::new();
        let err = SortGrammar::synthesize(&schema)
            .check(&QueryValue::from("test"))
            .unwrap_err();
        assert_eq!(err.to_string(), "sort is not allowed");
    }

    #[test]
    fn test_sort_string_must_be_registered() {
        let mut schema = Schema::new();
        schema.sort("valid").sort("other");

        let err = SortGrammar::synthesize(&schema)
            .check(&QueryValue::from("invalid"))
            .unwrap_err();
        assert_eq!(err.to_string(), "sort must be one of [valid, other]");
    }

    #[test]
    fn test_sort_array_item_path_includes_index() {
        let mut schema = Schema::new();
        schema.sort("valid");

        let err = SortGrammar::synthesize(&schema)
            .check(&QueryValue::from(vec!["invalid"]))
            .unwrap_err();
        assert_eq!(err.to_string(), "sort:0 must be one of [valid]");
    }

    #[test]
    fn test_sort_array_duplicates_rejected() {
        let mut schema = Schema::new();
        schema.sort("valid");

        let err = SortGrammar::synthesize(&schema)
            .check(&QueryValue::from(vec!["valid", "valid"]))
            .unwrap_err();
        assert_eq!(err.to_string(), "sort:1 contains a duplicate value");
    }

    #[test]
    fn test_sort_object_unknown_field() {
        let mut schema = Schema::new();
        schema.sort("valid");

        let query = object(&[("invalid", QueryValue::from("asc"))]);
        let err = SortGrammar::synthesize(&schema).check(&query).unwrap_err();
        assert_eq!(err.to_string(), "sort:invalid is not allowed");
    }

    #[test]
    fn test_sort_object_order_values() {
        let mut schema = Schema::new();
        schema.sort("valid");
        let grammar = SortGrammar::synthesize(&schema);

        for order in ["asc", "desc", "ASC", "Desc"] {
            let query = object(&[("valid", QueryValue::from(order))]);
            assert!(grammar.check(&query).is_ok());
        }

        let query = object(&[("valid", QueryValue::from("invalid"))]);
        let err = grammar.check(&query).unwrap_err();
        assert_eq!(err.to_string(), "sort:valid must be one of [asc, desc]");
    }

    #[test]
    fn test_sort_top_level_type() {
        let mut schema = Schema::new();
        schema.sort("valid");

        let err = SortGrammar::synthesize(&schema)
            .check(&QueryValue::Int(1))
            .unwrap_err();
        assert_eq!(err.to_string(), "sort must be one of [string, array, object]");
    }

    #[test]
    fn test_page_bare_forms() {
        let grammar = PageGrammar::new();

        assert!(grammar.check(&QueryValue::from("2")).is_ok());
        assert!(grammar.check(&QueryValue::Int(2)).is_ok());

        let err = grammar.check(&QueryValue::from("1.1")).unwrap_err();
        assert_eq!(err.to_string(), "page must be an integer");

        let err = grammar.check(&QueryValue::from("-1")).unwrap_err();
        assert_eq!(err.to_string(), "page must be a positive number");

        let err = grammar.check(&QueryValue::from("invalid")).unwrap_err();
        assert_eq!(err.to_string(), "page must be one of [number, object]");
    }

    #[test]
    fn test_page_object_fields() {
        let grammar = PageGrammar::new();

        let query = object(&[
            ("number", QueryValue::from("2")),
            ("size", QueryValue::from("10")),
        ]);
        assert!(grammar.check(&query).is_ok());

        let err = grammar
            .check(&object(&[("number", QueryValue::from("1.1"))]))
            .unwrap_err();
        assert_eq!(err.to_string(), "page:number must be an integer");

        let err = grammar
            .check(&object(&[("size", QueryValue::from("-1"))]))
            .unwrap_err();
        assert_eq!(err.to_string(), "page:size must be a positive number");

        let err = grammar
            .check(&object(&[("invalid", QueryValue::Int(1))]))
            .unwrap_err();
        assert_eq!(err.to_string(), "page:invalid is not allowed");
    }

    #[test]
    fn test_page_offset_non_negative() {
        let grammar = PageGrammar::new();

        assert!(grammar.check(&object(&[("offset", QueryValue::Int(0))])).is_ok());

        let err = grammar
            .check(&object(&[("offset", QueryValue::Int(-5))]))
            .unwrap_err();
        assert_eq!(err.to_string(), "page:offset must be a non-negative number");
    }

    #[test]
    fn test_filter_grammar_rule_lookup() {
        let mut schema = Schema::new();
        schema.filter("age", ">").filter("age", "<").filter("name", "=");

        let grammar = filter_grammar(&schema);
        let rule = grammar.field_rule("age").unwrap();
        assert_eq!(rule.operators.len(), 2);
        assert!(!rule.allows_bare);
        assert!(grammar.field_rule("name").unwrap().allows_bare);
        assert!(grammar.field_rule("missing").is_none());
    }
}
