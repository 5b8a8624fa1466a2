//! The whitelist schema registry.
//!
//! A [`Schema`] declares what a caller is permitted to do: which fields
//! may be filtered and with which operators, which fields are sortable,
//! and whether pagination is enabled. Nothing outside the registry is
//! ever applied — anything absent is rejected at validation time.
//!
//! Registration is pure bookkeeping: any field/operator strings are
//! accepted here, and the registry is immutable once the querier is
//! built.
//!
//! The filter map's insertion order is authoritative: filters are applied
//! to the builder in registration order, never in the attacker-controlled
//! query order.
//!
//! ```rust
//! use sift_query::schema::Schema;
//!
//! let mut schema = Schema::new();
//! schema
//!     .filter("age", ">")
//!     .filter("age", "<")
//!     .sort("name")
//!     .page(true);
//!
//! assert_eq!(schema.filters().len(), 2);
//! assert!(schema.page_options().is_enabled());
//! ```

use indexmap::IndexMap;
use smallvec::SmallVec;
use smol_str::SmolStr;

use crate::value::QueryValue;

/// Arbitrary per-entry options carried alongside a registration.
pub type Options = IndexMap<SmolStr, QueryValue>;

/// One registered `(field, operator)` filter permission.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSchema {
    field: SmolStr,
    operator: SmolStr,
    options: Options,
}

impl FilterSchema {
    /// The whitelisted field name.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// The whitelisted operator for this field.
    pub fn operator(&self) -> &str {
        &self.operator
    }

    /// Options attached at registration time.
    pub fn options(&self) -> &Options {
        &self.options
    }
}

/// One registered sortable field.
#[derive(Debug, Clone, PartialEq)]
pub struct SortSchema {
    field: SmolStr,
    options: Options,
}

impl SortSchema {
    /// The whitelisted field name.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Options attached at registration time.
    pub fn options(&self) -> &Options {
        &self.options
    }
}

/// Pagination configuration. Disabled unless explicitly enabled.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageOptions {
    is_enabled: bool,
    options: Options,
}

impl PageOptions {
    /// Enabled pagination with the given options.
    pub fn enabled(options: Options) -> Self {
        Self {
            is_enabled: true,
            options,
        }
    }

    /// Whether pagination is enabled.
    pub fn is_enabled(&self) -> bool {
        self.is_enabled
    }

    /// Options attached at registration time.
    pub fn options(&self) -> &Options {
        &self.options
    }
}

/// The whitelist of permitted filter, sort, and page operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    filters: IndexMap<SmolStr, FilterSchema>,
    sorts: IndexMap<SmolStr, SortSchema>,
    page_options: PageOptions,
}

impl Schema {
    /// Create an empty schema with pagination disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whitelist `field` under `operator`.
    ///
    /// A field may be registered under several operators; each
    /// registration is a separate entry keyed `field[operator]`.
    pub fn filter(&mut self, field: impl AsRef<str>, operator: impl AsRef<str>) -> &mut Self {
        self.filter_with(field, operator, Options::new())
    }

    /// Whitelist `field` under `operator` with options.
    pub fn filter_with(
        &mut self,
        field: impl AsRef<str>,
        operator: impl AsRef<str>,
        options: Options,
    ) -> &mut Self {
        let field = SmolStr::new(field.as_ref());
        let operator = SmolStr::new(operator.as_ref());
        self.filters.insert(
            Self::filter_key(&field, &operator),
            FilterSchema {
                field,
                operator,
                options,
            },
        );
        self
    }

    /// Whitelist `field` for sorting.
    ///
    /// Re-registering a field replaces its options in place; a field
    /// appears at most once.
    pub fn sort(&mut self, field: impl AsRef<str>) -> &mut Self {
        self.sort_with(field, Options::new())
    }

    /// Whitelist `field` for sorting with options.
    pub fn sort_with(&mut self, field: impl AsRef<str>, options: Options) -> &mut Self {
        let field = SmolStr::new(field.as_ref());
        self.sorts
            .insert(field.clone(), SortSchema { field, options });
        self
    }

    /// Enable or disable pagination.
    pub fn page(&mut self, enabled: bool) -> &mut Self {
        self.page_options = PageOptions {
            is_enabled: enabled,
            options: Options::new(),
        };
        self
    }

    /// Set pagination configuration wholesale.
    pub fn page_with(&mut self, page_options: PageOptions) -> &mut Self {
        self.page_options = page_options;
        self
    }

    /// The registered filters, keyed `field[operator]`, in registration
    /// order.
    pub fn filters(&self) -> &IndexMap<SmolStr, FilterSchema> {
        &self.filters
    }

    /// The registered sortable fields, in registration order.
    pub fn sorts(&self) -> &IndexMap<SmolStr, SortSchema> {
        &self.sorts
    }

    /// The pagination configuration.
    pub fn page_options(&self) -> &PageOptions {
        &self.page_options
    }

    /// The registry key for a `(field, operator)` pair.
    pub fn filter_key(field: &str, operator: &str) -> SmolStr {
        SmolStr::new(format!("{field}[{operator}]"))
    }

    /// For each whitelisted field, the ordered list of operators
    /// registered for it. Used to synthesize the filter grammar.
    pub fn map_filter_fields_to_operators(&self) -> IndexMap<SmolStr, SmallVec<[SmolStr; 4]>> {
        let mut mapped: IndexMap<SmolStr, SmallVec<[SmolStr; 4]>> = IndexMap::new();
        for filter in self.filters.values() {
            mapped
                .entry(filter.field.clone())
                .or_default()
                .push(filter.operator.clone());
        }
        mapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_key_format() {
        assert_eq!(Schema::filter_key("test", "="), "test[=]");
        assert_eq!(Schema::filter_key("test", "is not"), "test[is not]");
    }

    #[test]
    fn test_filter_registration_preserves_order() {
        let mut schema = Schema::new();
        schema.filter("b", "=").filter("a", "!=").filter("b", ">");

        let keys: Vec<&str> = schema.filters().keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, ["b[=]", "a[!=]", "b[>]"]);
    }

    #[test]
    fn test_same_field_multiple_operators() {
        let mut schema = Schema::new();
        schema.filter("age", ">").filter("age", "<");

        let mapped = schema.map_filter_fields_to_operators();
        assert_eq!(mapped.len(), 1);
        assert_eq!(mapped["age"].as_slice(), [SmolStr::new(">"), SmolStr::new("<")]);
    }

    #[test]
    fn test_sort_field_registered_once() {
        let mut schema = Schema::new();
        schema.sort("name").sort("age").sort("name");

        let fields: Vec<&str> = schema.sorts().keys().map(|k| k.as_str()).collect();
        assert_eq!(fields, ["name", "age"]);
    }

    #[test]
    fn test_page_disabled_by_default() {
        assert!(!Schema::new().page_options().is_enabled());
    }

    #[test]
    fn test_page_enable_and_disable() {
        let mut schema = Schema::new();
        schema.page(true);
        assert!(schema.page_options().is_enabled());

        schema.page(false);
        assert!(!schema.page_options().is_enabled());
    }

    #[test]
    fn test_page_with_options() {
        let mut options = Options::new();
        options.insert(SmolStr::new("max_size"), QueryValue::Int(100));

        let mut schema = Schema::new();
        schema.page_with(PageOptions::enabled(options));
        assert!(schema.page_options().is_enabled());
        assert_eq!(
            schema.page_options().options()["max_size"],
            QueryValue::Int(100)
        );
    }
}
