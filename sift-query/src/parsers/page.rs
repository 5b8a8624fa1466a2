//! Page parsing and normalization.

use indexmap::IndexMap;

use crate::error::ValidationError;
use crate::grammar::PageGrammar;
use crate::value::QueryValue;

/// The three pagination fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageField {
    /// Records per page.
    Size,
    /// 1-indexed page number.
    Number,
    /// Records to skip; derived from size and number unless supplied.
    Offset,
}

impl PageField {
    /// The field name as it appears in keys and query input.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Size => "size",
            Self::Number => "number",
            Self::Offset => "offset",
        }
    }
}

/// Ordered mapping from canonical key (`page:field`) to a normalized
/// page entry. Always holds all three fields when paging is enabled.
pub type PageMap = IndexMap<String, PageEntry>;

/// One normalized page field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageEntry {
    /// Which pagination field this is.
    pub field: PageField,
    /// The validated integer value.
    pub value: i64,
}

/// The flattened `{size, number, offset}` slice handed to the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSlice {
    /// Records per page.
    pub size: i64,
    /// 1-indexed page number.
    pub number: i64,
    /// Records to skip.
    pub offset: i64,
}

/// Static and instance-level pagination defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageDefaults {
    /// Default records per page.
    pub size: i64,
    /// Default page number.
    pub number: i64,
}

impl Default for PageDefaults {
    fn default() -> Self {
        Self {
            size: 20,
            number: 1,
        }
    }
}

/// Parses raw page input into normalized entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageParser {
    defaults: PageDefaults,
}

impl PageParser {
    /// Create a parser with the given defaults.
    pub fn new(defaults: PageDefaults) -> Self {
        Self { defaults }
    }

    /// The canonical key for a page field, optionally without the
    /// concern prefix (the prefix-less form is what the adapter sees).
    pub fn build_key(field: PageField, with_key: bool) -> String {
        if with_key {
            format!("page:{}", field.as_str())
        } else {
            field.as_str().to_string()
        }
    }

    /// The structural grammar this parser validates against.
    pub fn grammar(&self) -> PageGrammar {
        PageGrammar::new()
    }

    /// Parse raw page input.
    ///
    /// A bare numeric value is the page number; the object form may set
    /// `size`, `number`, and `offset` independently. Defaults fill in
    /// whatever the input omits, and `offset` is derived as
    /// `(number - 1) * size` only when not explicitly supplied. Absent
    /// input still yields all three entries from the defaults.
    pub fn parse(&self, query: Option<&QueryValue>) -> Result<PageMap, ValidationError> {
        if let Some(query) = query {
            self.grammar().check(query)?;
        }

        let mut size = self.defaults.size;
        let mut number = self.defaults.number;
        let mut offset = None;

        match query {
            None => {}
            Some(QueryValue::Object(fields)) => {
                if let Some(value) = fields.get("size") {
                    size = value.as_i64_lenient().unwrap_or(size);
                }
                if let Some(value) = fields.get("number") {
                    number = value.as_i64_lenient().unwrap_or(number);
                }
                offset = fields.get("offset").and_then(QueryValue::as_i64_lenient);
            }
            Some(bare) => {
                number = bare.as_i64_lenient().unwrap_or(number);
            }
        }

        let offset = offset.unwrap_or((number - 1) * size);

        let mut page = PageMap::new();
        for entry in [
            PageEntry {
                field: PageField::Size,
                value: size,
            },
            PageEntry {
                field: PageField::Number,
                value: number,
            },
            PageEntry {
                field: PageField::Offset,
                value: offset,
            },
        ] {
            page.insert(Self::build_key(entry.field, true), entry);
        }

        Ok(page)
    }

    /// Flatten a parsed map into key -> value, with or without the
    /// `page:` prefix.
    pub fn flatten(page: &PageMap, with_key: bool) -> IndexMap<String, QueryValue> {
        page.values()
            .map(|entry| {
                (
                    Self::build_key(entry.field, with_key),
                    QueryValue::Int(entry.value),
                )
            })
            .collect()
    }

    /// The combined `{size, number, offset}` slice for the adapter.
    pub fn slice(page: &PageMap) -> PageSlice {
        let value = |field: PageField| {
            page.get(&Self::build_key(field, true))
                .map(|entry| entry.value)
                .unwrap_or_default()
        };
        PageSlice {
            size: value(PageField::Size),
            number: value(PageField::Number),
            offset: value(PageField::Offset),
        }
    }
}
