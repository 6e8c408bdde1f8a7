//! PostgREST adapter for the hosted store (`{url}/rest/v1/{table}`).

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::query::{Filter, Query, QueryResponse, Row, value_text};
use crate::store::TabularStore;
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

pub struct PostgrestStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl PostgrestStore {
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let api_key = config.api_key()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StoreError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn endpoint(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    fn headers(&self, count: bool) -> Result<HeaderMap, StoreError> {
        let key = HeaderValue::from_str(&self.api_key)
            .map_err(|e| StoreError::Config(format!("api key is not a valid header: {e}")))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|e| StoreError::Config(format!("api key is not a valid header: {e}")))?;
        let mut headers = HeaderMap::new();
        headers.insert("apikey", key);
        headers.insert(reqwest::header::AUTHORIZATION, bearer);
        if count {
            headers.insert("Prefer", HeaderValue::from_static("count=exact"));
        }
        Ok(headers)
    }
}

#[async_trait]
impl TabularStore for PostgrestStore {
    async fn execute(&self, query: &Query) -> Result<QueryResponse, StoreError> {
        let params = query_params(query);
        debug!(table = %query.table, ?params, "store request");

        let response = self
            .client
            .get(self.endpoint(&query.table))
            .headers(self.headers(query.count)?)
            .query(&params)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let status = response.status();
        let count = if query.count {
            response
                .headers()
                .get(reqwest::header::CONTENT_RANGE)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_content_range_total)
        } else {
            None
        };

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let rows: Vec<Row> = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(QueryResponse { rows, count })
    }
}

/// Translate a query into PostgREST query-string pairs.
pub fn query_params(query: &Query) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), query.projection())];

    for filter in &query.filters {
        let field = filter.field().to_string();
        let op = match filter {
            Filter::Eq { value, .. } => format!("eq.{}", value_text(value).unwrap_or_default()),
            Filter::In { values, .. } => {
                let items: Vec<String> = values.iter().map(in_list_item).collect();
                format!("in.({})", items.join(","))
            }
            Filter::IsNull { .. } => "is.null".to_string(),
            Filter::NotNull { .. } => "not.is.null".to_string(),
        };
        params.push((field, op));
    }

    if !query.order.is_empty() {
        let order: Vec<String> = query
            .order
            .iter()
            .map(|o| format!("{}.{}", o.field, if o.ascending { "asc" } else { "desc" }))
            .collect();
        params.push(("order".to_string(), order.join(",")));
    }

    if let Some(range) = query.range {
        params.push(("offset".to_string(), range.start.to_string()));
        params.push(("limit".to_string(), range.row_count().to_string()));
    }

    params
}

// Values containing reserved characters must be double-quoted inside in.(...)
fn in_list_item(value: &Value) -> String {
    let text = value_text(value).unwrap_or_default();
    let reserved = text
        .chars()
        .any(|c| matches!(c, ',' | '(' | ')' | '"' | '\\' | ' ' | '.' | ':'));
    if reserved {
        format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        text
    }
}

/// Total from a `Content-Range` header such as `0-999/2500` (`*` when unknown).
pub fn parse_content_range_total(header: &str) -> Option<u64> {
    let (_, total) = header.rsplit_once('/')?;
    total.trim().parse().ok()
}
