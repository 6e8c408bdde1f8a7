//! # peticiao-reports
//!
//! Read-only views over the pre-aggregated `cache_*` tables:
//! - localities and their dimension counts
//! - the error-classification hierarchy (competency → class → error)
//! - competency routing verification and divergent processes
//! - per-competency test statistics
//!
//! Every view goes through a `peticiao_store::Fetcher`, so multi-page reads
//! are complete or fail with a `FetchError`.

pub mod errors;
pub mod localities;
pub mod stats;
pub mod tables;
pub mod verification;

pub use errors::{
    Classification, ClassificationFilter, ClassificationSummary, ErrorGroup, ErrorRecord,
    UnknownClassification,
};
pub use localities::Locality;
pub use stats::{CompetencyStats, StatsSummary};
pub use verification::{
    CompetencyRef, DEFAULT_PROCESS_PAGE_SIZE, DivergenceGroup, DivergentProcess, ProcessPage,
    VerificationStats,
};

use peticiao_store::{FetchError, Fetcher, Query, Row};

/// Entry point for every report; cheap to clone.
#[derive(Clone)]
pub struct Reports {
    fetcher: Fetcher,
}

impl Reports {
    pub fn new(fetcher: Fetcher) -> Self {
        Self { fetcher }
    }

    /// First row of a single-row summary table, if any.
    async fn first_row(&self, table: &str) -> Result<Option<Row>, FetchError> {
        let query = Query::from(table).range(0, 0);
        let response = self.fetcher.fetch_once(&query).await?;
        Ok(response.rows.into_iter().next())
    }
}

#[cfg(test)]
pub(crate) mod fixture {
    use peticiao_store::{MemoryStore, Row};
    use serde_json::Value;

    pub fn rows(values: Vec<Value>) -> Vec<Row> {
        values
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect()
    }

    pub fn store(table: &str, values: Vec<Value>) -> MemoryStore {
        MemoryStore::new().with_table(table, rows(values))
    }
}
