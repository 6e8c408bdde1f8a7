//! Paginated fetch and batched key lookup.
//!
//! The hosted store caps every response at `STORE_ROW_CAP` rows and rejects
//! very long `in.(...)` lists. Both helpers here hide those limits: callers
//! get the complete result or a `FetchError`, never a partial one.

use crate::error::FetchError;
use crate::query::{EqFilters, Query, QueryResponse, Row, RowRange};
use crate::store::{STORE_ROW_CAP, SharedStore};
use std::collections::BTreeSet;
use tracing::debug;

pub const DEFAULT_BATCH_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchLimits {
    /// Rows requested per page.
    pub page_size: usize,
    /// Keys per `in.(...)` batch.
    pub batch_size: usize,
}

impl Default for FetchLimits {
    fn default() -> Self {
        Self {
            page_size: STORE_ROW_CAP,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Read helper bound to one injected store handle.
#[derive(Clone)]
pub struct Fetcher {
    store: SharedStore,
    limits: FetchLimits,
}

impl Fetcher {
    pub fn new(store: SharedStore) -> Self {
        Self::with_limits(store, FetchLimits::default())
    }

    /// `page_size` is clamped to `STORE_ROW_CAP`.
    pub fn with_limits(store: SharedStore, limits: FetchLimits) -> Self {
        Self {
            store,
            limits: FetchLimits {
                page_size: limits.page_size.clamp(1, STORE_ROW_CAP),
                batch_size: limits.batch_size.max(1),
            },
        }
    }

    pub fn limits(&self) -> FetchLimits {
        self.limits
    }

    /// Fetch every row of `table` matching the non-null `filters`.
    pub async fn fetch_all(
        &self,
        table: &str,
        fields: &[&str],
        filters: &EqFilters,
        order_by: Option<&str>,
    ) -> Result<Vec<Row>, FetchError> {
        let mut query = Query::from(table)
            .select(fields.iter().copied())
            .eq_all(filters);
        if let Some(field) = order_by {
            query = query.order(field, true);
        }
        self.fetch_all_matching(query).await
    }

    /// Page through `base` until a short page signals end-of-data.
    ///
    /// Any range already set on `base` is replaced.
    pub async fn fetch_all_matching(&self, base: Query) -> Result<Vec<Row>, FetchError> {
        let page_size = self.limits.page_size;
        let mut rows = Vec::new();
        let mut offset = 0usize;

        loop {
            let mut query = base.clone();
            query.range = Some(RowRange::window(offset, page_size));
            let page = self.fetch_once(&query).await?.rows;
            let len = page.len();
            debug!(table = %base.table, offset, len, "fetched page");
            rows.extend(page);
            if len < page_size {
                break;
            }
            offset += page_size;
        }

        Ok(rows)
    }

    /// Fetch rows of `table` whose `key_field` is one of `keys`, in batches.
    ///
    /// `scope` adds equality filters applied to every batch.
    pub async fn lookup_by_keys(
        &self,
        table: &str,
        key_field: &str,
        keys: &BTreeSet<String>,
        fields: &[&str],
        scope: &EqFilters,
    ) -> Result<Vec<Row>, FetchError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<&String> = keys.iter().collect();
        let mut rows = Vec::new();
        for batch in keys.chunks(self.limits.batch_size) {
            let query = Query::from(table)
                .select(fields.iter().copied())
                .eq_all(scope)
                .in_values(key_field, batch.iter().map(|k| k.as_str()));
            // one key can match several rows, so each batch is paged too
            let found = self.fetch_all_matching(query).await?;
            debug!(table = %table, batch = batch.len(), rows = found.len(), "fetched batch");
            rows.extend(found);
        }
        Ok(rows)
    }

    /// Issue exactly one request.
    pub async fn fetch_once(&self, query: &Query) -> Result<QueryResponse, FetchError> {
        self.store
            .execute(query)
            .await
            .map_err(|e| FetchError::new(&query.table, e))
    }
}
