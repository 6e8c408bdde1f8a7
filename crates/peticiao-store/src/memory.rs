//! In-memory fixture store.
//!
//! Evaluates `Query` values the way the hosted store does:
//! - filters compare cells by their text form
//! - ordering puts nulls last
//! - every response is capped at `STORE_ROW_CAP` rows, ranged or not
//!
//! Every executed query is recorded so callers can assert on request counts.

use crate::error::StoreError;
use crate::query::{Filter, OrderBy, Query, QueryResponse, Row, value_text};
use crate::store::{STORE_ROW_CAP, TabularStore};
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: BTreeMap<String, Vec<Row>>,
    row_cap: Option<usize>,
    // table -> number of requests that still succeed before failing
    failures: Mutex<BTreeMap<String, usize>>,
    log: Mutex<Vec<Query>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load fixture tables from a JSON object `{ "table": [row, ...] }`.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Config(format!("{}: {e}", path.display())))?;
        let tables: BTreeMap<String, Vec<Row>> = serde_json::from_str(&text)
            .map_err(|e| StoreError::Decode(format!("{}: {e}", path.display())))?;
        Ok(Self {
            tables,
            ..Self::default()
        })
    }

    /// Add (or replace) a table.
    pub fn with_table(mut self, table: impl Into<String>, rows: Vec<Row>) -> Self {
        self.tables.insert(table.into(), rows);
        self
    }

    /// Override the single-request row cap.
    pub fn with_row_cap(mut self, cap: usize) -> Self {
        self.row_cap = Some(cap);
        self
    }

    /// Make every request against `table` fail.
    pub fn fail_table(self, table: impl Into<String>) -> Self {
        self.fail_table_after(table, 0)
    }

    /// Let `successes` requests against `table` succeed, then fail the rest.
    pub fn fail_table_after(self, table: impl Into<String>, successes: usize) -> Self {
        lock(&self.failures).insert(table.into(), successes);
        self
    }

    /// Every query executed so far, in arrival order.
    pub fn requests(&self) -> Vec<Query> {
        lock(&self.log).clone()
    }

    /// Number of queries executed against `table`.
    pub fn request_count(&self, table: &str) -> usize {
        lock(&self.log).iter().filter(|q| q.table == table).count()
    }

    pub fn clear_requests(&self) {
        lock(&self.log).clear();
    }

    fn check_failure(&self, table: &str) -> Result<(), StoreError> {
        let mut failures = lock(&self.failures);
        match failures.get_mut(table) {
            Some(0) => Err(StoreError::Unavailable {
                table: table.to_string(),
            }),
            Some(remaining) => {
                *remaining -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn evaluate(&self, query: &Query) -> QueryResponse {
        let rows = self.tables.get(&query.table).map(Vec::as_slice).unwrap_or(&[]);

        let mut matched: Vec<&Row> = rows
            .iter()
            .filter(|row| query.filters.iter().all(|f| matches(row, f)))
            .collect();
        if !query.order.is_empty() {
            matched.sort_by(|a, b| compare_rows(a, b, &query.order));
        }

        let count = query.count.then_some(matched.len() as u64);

        let (start, end) = match query.range {
            Some(range) => (range.start, range.end.saturating_add(1)),
            None => (0, matched.len()),
        };
        let cap = self.row_cap.unwrap_or(STORE_ROW_CAP);
        let start = start.min(matched.len());
        let end = end.min(start.saturating_add(cap)).min(matched.len());
        let window: &[&Row] = &matched[start..end.max(start)];

        QueryResponse {
            rows: window.iter().map(|row| project(row, &query.fields)).collect(),
            count,
        }
    }
}

#[async_trait]
impl TabularStore for MemoryStore {
    async fn execute(&self, query: &Query) -> Result<QueryResponse, StoreError> {
        lock(&self.log).push(query.clone());
        self.check_failure(&query.table)?;
        Ok(self.evaluate(query))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn cell<'a>(row: &'a Row, field: &str) -> Option<&'a Value> {
    row.get(field).filter(|v| !v.is_null())
}

fn matches(row: &Row, filter: &Filter) -> bool {
    match filter {
        Filter::Eq { field, value } => {
            let expected = value_text(value);
            expected.is_some() && cell(row, field).and_then(value_text) == expected
        }
        Filter::In { field, values } => match cell(row, field).and_then(value_text) {
            Some(actual) => values
                .iter()
                .any(|v| value_text(v).as_deref() == Some(actual.as_str())),
            None => false,
        },
        Filter::IsNull { field } => cell(row, field).is_none(),
        Filter::NotNull { field } => cell(row, field).is_some(),
    }
}

fn compare_rows(a: &Row, b: &Row, order: &[OrderBy]) -> Ordering {
    for key in order {
        let ordering = match (cell(a, &key.field), cell(b, &key.field)) {
            (None, None) => Ordering::Equal,
            // nulls sort last in both directions
            (None, Some(_)) => return Ordering::Greater,
            (Some(_), None) => return Ordering::Less,
            (Some(x), Some(y)) => {
                let ordering = compare_values(x, y);
                if key.ascending {
                    ordering
                } else {
                    ordering.reverse()
                }
            }
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => value_text(a).cmp(&value_text(b)),
    }
}

fn project(row: &Row, fields: &[String]) -> Row {
    if fields.is_empty() || fields.iter().any(|f| f == "*") {
        return row.clone();
    }
    fields
        .iter()
        .map(|f| (f.clone(), row.get(f).cloned().unwrap_or(Value::Null)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => Row::new(),
        }
    }

    fn store() -> MemoryStore {
        MemoryStore::new().with_table(
            "t",
            vec![
                row(json!({ "code": "B", "n": 2, "flag": true })),
                row(json!({ "code": "A", "n": 10, "flag": null })),
                row(json!({ "code": 7, "n": 1 })),
            ],
        )
    }

    #[tokio::test]
    async fn filters_compare_by_text_form() {
        let store = store();
        let response = store
            .execute(&Query::from("t").eq("code", "7"))
            .await
            .expect("query should succeed");
        assert_eq!(response.rows.len(), 1);
        assert_eq!(response.rows[0]["n"], json!(1));

        let response = store
            .execute(&Query::from("t").in_values("code", ["A", "B"]))
            .await
            .expect("query should succeed");
        assert_eq!(response.rows.len(), 2);
    }

    #[tokio::test]
    async fn null_filters_treat_missing_cells_as_null() {
        let store = store();
        let nulls = store
            .execute(&Query::from("t").is_null("flag"))
            .await
            .expect("query should succeed");
        assert_eq!(nulls.rows.len(), 2);

        let present = store
            .execute(&Query::from("t").not_null("flag"))
            .await
            .expect("query should succeed");
        assert_eq!(present.rows.len(), 1);
    }

    #[tokio::test]
    async fn order_range_projection_and_count() {
        let store = store();
        let response = store
            .execute(
                &Query::from("t")
                    .select(["code"])
                    .order("n", false)
                    .range(0, 1)
                    .with_count(),
            )
            .await
            .expect("query should succeed");
        assert_eq!(response.count, Some(3));
        assert_eq!(
            response.rows,
            vec![row(json!({ "code": "A" })), row(json!({ "code": "B" }))]
        );
    }

    #[tokio::test]
    async fn unranged_requests_are_capped() {
        let rows = (0..5).map(|i| row(json!({ "i": i }))).collect();
        let store = MemoryStore::new().with_table("big", rows).with_row_cap(3);
        let response = store
            .execute(&Query::from("big"))
            .await
            .expect("query should succeed");
        assert_eq!(response.rows.len(), 3);
    }

    #[tokio::test]
    async fn ranged_requests_are_capped_too() {
        let rows = (0..10).map(|i| row(json!({ "i": i }))).collect();
        let store = MemoryStore::new().with_table("big", rows).with_row_cap(3);
        let response = store
            .execute(&Query::from("big").range(2, 8))
            .await
            .expect("query should succeed");
        let seen: Vec<i64> = response.rows.iter().filter_map(|r| r["i"].as_i64()).collect();
        assert_eq!(seen, vec![2, 3, 4]);
    }

    #[tokio::test]
    async fn failure_injection_counts_successes() {
        let store = store().fail_table_after("t", 1);
        assert!(store.execute(&Query::from("t")).await.is_ok());
        let err = store
            .execute(&Query::from("t"))
            .await
            .expect_err("second request should fail");
        assert_eq!(
            err,
            StoreError::Unavailable {
                table: "t".to_string()
            }
        );
        assert_eq!(store.request_count("t"), 2);
    }
}
