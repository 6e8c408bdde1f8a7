use crate::Reports;
use crate::tables::LOCALITIES;
use peticiao_store::{EqFilters, FetchError, Row, cell_text, cell_u64};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Locality {
    pub code: String,
    pub name: String,
    pub competency_count: u64,
    pub class_count: u64,
    pub subject_count: u64,
}

impl Locality {
    pub fn from_row(row: &Row) -> Option<Self> {
        let code = cell_text(row, "codigo")?;
        let name = cell_text(row, "nome")
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("Localidade {code}"));
        Some(Self {
            name,
            competency_count: cell_u64(row, "total_competencias").unwrap_or(0),
            class_count: cell_u64(row, "total_classes").unwrap_or(0),
            subject_count: cell_u64(row, "total_assuntos").unwrap_or(0),
            code,
        })
    }
}

impl Reports {
    /// Every locality, ordered by name.
    pub async fn list_localities(&self) -> Result<Vec<Locality>, FetchError> {
        let rows = self
            .fetcher
            .fetch_all(LOCALITIES, &[], &EqFilters::new(), Some("nome"))
            .await?;
        let localities: Vec<Locality> = rows.iter().filter_map(Locality::from_row).collect();
        info!(count = localities.len(), "localities loaded");
        Ok(localities)
    }
}
