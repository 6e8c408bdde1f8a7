use crate::error::StoreError;
use crate::query::{Query, QueryResponse};
use async_trait::async_trait;
use std::sync::Arc;

/// Largest number of rows the hosted store returns for one request.
pub const STORE_ROW_CAP: usize = 1000;

/// Read-only access to a remote tabular store.
///
/// Implementations are stateless between calls and shared process-wide
/// behind an `Arc`.
#[async_trait]
pub trait TabularStore: Send + Sync {
    async fn execute(&self, query: &Query) -> Result<QueryResponse, StoreError>;
}

#[async_trait]
impl<S: TabularStore + ?Sized> TabularStore for Arc<S> {
    async fn execute(&self, query: &Query) -> Result<QueryResponse, StoreError> {
        (**self).execute(query).await
    }
}

/// Shared handle injected into every component.
pub type SharedStore = Arc<dyn TabularStore>;
