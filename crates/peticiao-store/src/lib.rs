//! # peticiao-store
//!
//! Read-only boundary to the hosted tabular store.
//!
//! This crate provides:
//! - `Query`, a plain-value read query (filters, order, range, count)
//! - the `TabularStore` trait and two adapters: `PostgrestStore` (HTTP) and
//!   `MemoryStore` (fixtures)
//! - `Fetcher`, which hides the store's page cap and `in.(...)` limits
//! - `StoreConfig`, the TOML/env connection settings
//!
//! Rows stay loosely typed only inside this crate; consumers map them into
//! their own types at the call site.
//!
//! ```text
//! consumer ── Fetcher::fetch_all / lookup_by_keys
//!                 │ one Query per page or batch
//!                 ▼
//!           TabularStore (PostgREST | memory)
//! ```

pub mod config;
pub mod error;
pub mod fetch;
pub mod memory;
pub mod postgrest;
pub mod query;
pub mod store;

pub use config::{DEFAULT_API_KEY_ENV, DEFAULT_TIMEOUT_SECS, StoreConfig, URL_ENV};
pub use error::{FetchError, StoreError};
pub use fetch::{DEFAULT_BATCH_SIZE, FetchLimits, Fetcher};
pub use memory::MemoryStore;
pub use postgrest::PostgrestStore;
pub use query::{
    EqFilters, Filter, OrderBy, Query, QueryResponse, Row, RowRange, value_text,
};
pub use store::{STORE_ROW_CAP, SharedStore, TabularStore};

/// Read a cell as its text form, treating null and missing alike.
pub fn cell_text(row: &Row, field: &str) -> Option<String> {
    row.get(field).and_then(value_text)
}

/// Read a cell as a non-negative integer; null, missing and negative read as `None`.
pub fn cell_u64(row: &Row, field: &str) -> Option<u64> {
    let value = row.get(field)?;
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}

/// Read a cell as a float; numeric strings are accepted.
pub fn cell_f64(row: &Row, field: &str) -> Option<f64> {
    let value = row.get(field)?;
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
        .filter(|f| f.is_finite())
}

/// Read a cell as a boolean; PostgREST may serialize booleans as text.
pub fn cell_bool(row: &Row, field: &str) -> Option<bool> {
    let value = row.get(field)?;
    value.as_bool().or_else(|| match value.as_str() {
        Some("true") => Some(true),
        Some("false") => Some(false),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: serde_json::Value) -> Row {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn cells_accept_text_encoded_scalars() {
        let r = row(json!({ "n": "42", "neg": -3, "f": "12.5", "b": "true", "code": 7 }));
        assert_eq!(cell_u64(&r, "n"), Some(42));
        assert_eq!(cell_u64(&r, "neg"), None);
        assert_eq!(cell_f64(&r, "f"), Some(12.5));
        assert_eq!(cell_bool(&r, "b"), Some(true));
        assert_eq!(cell_text(&r, "code").as_deref(), Some("7"));
        assert_eq!(cell_text(&r, "missing"), None);
    }
}
