//! Read query model shared by every store adapter.
//!
//! A `Query` is a plain value: adapters translate it into their own wire
//! form (PostgREST parameters, in-memory scans). Nothing here talks to the
//! network.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// One loosely-typed row as returned by the store.
pub type Row = Map<String, Value>;

/// Equality filters keyed by column. `Value::Null` entries are ignored.
pub type EqFilters = BTreeMap<String, Value>;

/// Row predicate supported by the hosted store.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq { field: String, value: Value },
    In { field: String, values: Vec<Value> },
    IsNull { field: String },
    NotNull { field: String },
}

impl Filter {
    pub fn field(&self) -> &str {
        match self {
            Filter::Eq { field, .. }
            | Filter::In { field, .. }
            | Filter::IsNull { field }
            | Filter::NotNull { field } => field,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub ascending: bool,
}

/// Inclusive row window `[start, end]`, matching the store's range semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    pub start: usize,
    pub end: usize,
}

impl RowRange {
    /// Window of `len` rows starting at `offset`. `len` must be non-zero.
    pub fn window(offset: usize, len: usize) -> Self {
        Self {
            start: offset,
            end: offset + len.saturating_sub(1),
        }
    }

    pub fn row_count(&self) -> usize {
        self.end.saturating_sub(self.start) + 1
    }
}

/// Read query against one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: String,
    pub fields: Vec<String>,
    pub filters: Vec<Filter>,
    pub order: Vec<OrderBy>,
    pub range: Option<RowRange>,
    pub count: bool,
}

impl Query {
    /// Start a query over `table` projecting every column.
    pub fn from(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            fields: Vec::new(),
            filters: Vec::new(),
            order: Vec::new(),
            range: None,
            count: false,
        }
    }

    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Apply every non-null entry of `filters` as an equality predicate.
    pub fn eq_all(mut self, filters: &EqFilters) -> Self {
        for (field, value) in filters {
            if value.is_null() {
                continue;
            }
            self.filters.push(Filter::Eq {
                field: field.clone(),
                value: value.clone(),
            });
        }
        self
    }

    pub fn in_values<I, V>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.filters.push(Filter::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn is_null(mut self, field: impl Into<String>) -> Self {
        self.filters.push(Filter::IsNull {
            field: field.into(),
        });
        self
    }

    pub fn not_null(mut self, field: impl Into<String>) -> Self {
        self.filters.push(Filter::NotNull {
            field: field.into(),
        });
        self
    }

    pub fn order(mut self, field: impl Into<String>, ascending: bool) -> Self {
        self.order.push(OrderBy {
            field: field.into(),
            ascending,
        });
        self
    }

    /// Restrict to the inclusive row window `[start, end]`.
    pub fn range(mut self, start: usize, end: usize) -> Self {
        self.range = Some(RowRange { start, end });
        self
    }

    /// Ask the store for the exact number of matching rows.
    pub fn with_count(mut self) -> Self {
        self.count = true;
        self
    }

    /// Projection as the store expects it: `*` when empty.
    pub fn projection(&self) -> String {
        if self.fields.is_empty() {
            "*".to_string()
        } else {
            self.fields.join(",")
        }
    }
}

/// Rows returned for one request, plus the exact count when requested.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResponse {
    pub rows: Vec<Row>,
    pub count: Option<u64>,
}

/// Text form of a scalar cell, as the store compares it in filters.
///
/// Strings pass through, numbers and booleans render canonically; null,
/// arrays and objects have no text form.
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
