use crate::Reports;
use crate::tables::COMPETENCY_STATS;
use peticiao_store::{FetchError, Query, Row, cell_f64, cell_text, cell_u64};
use serde::Serialize;
use tracing::info;

/// Routing test results for one competency.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetencyStats {
    pub code: String,
    pub name: Option<String>,
    pub tests: u64,
    pub successes: u64,
    pub errors: u64,
    pub success_rate: f64,
    pub classes_tested: u64,
    pub subjects_tested: u64,
}

impl CompetencyStats {
    pub fn from_row(row: &Row) -> Option<Self> {
        let count = |field: &str| cell_u64(row, field).unwrap_or(0);
        Some(Self {
            code: cell_text(row, "codigo_competencia")?,
            name: cell_text(row, "nome_competencia"),
            tests: count("total_testes"),
            successes: count("total_sucesso"),
            errors: count("total_erros"),
            success_rate: cell_f64(row, "taxa_sucesso").unwrap_or(0.0),
            classes_tested: count("classes_testadas"),
            subjects_tested: count("assuntos_testados"),
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    pub tests: u64,
    pub successes: u64,
    pub errors: u64,
    pub competencies: usize,
    /// Successes over tests across every competency, as a percentage.
    pub mean_success_rate: f64,
}

impl StatsSummary {
    pub fn from_rows(stats: &[CompetencyStats]) -> Self {
        let tests: u64 = stats.iter().map(|s| s.tests).sum();
        let successes: u64 = stats.iter().map(|s| s.successes).sum();
        let mean_success_rate = if tests > 0 {
            successes as f64 / tests as f64 * 100.0
        } else {
            0.0
        };
        Self {
            tests,
            successes,
            errors: stats.iter().map(|s| s.errors).sum(),
            competencies: stats.len(),
            mean_success_rate,
        }
    }
}

impl Reports {
    /// Per-competency test statistics, best success rate first.
    pub async fn competency_stats(
        &self,
        system: Option<&str>,
    ) -> Result<Vec<CompetencyStats>, FetchError> {
        let mut query = Query::from(COMPETENCY_STATS).order("taxa_sucesso", false);
        if let Some(system) = system {
            query = query.eq("sistema", system);
        }
        let rows = self.fetcher.fetch_all_matching(query).await?;
        let stats: Vec<CompetencyStats> =
            rows.iter().filter_map(CompetencyStats::from_row).collect();
        info!(system = system.unwrap_or("*"), competencies = stats.len(), "competency stats");
        Ok(stats)
    }
}
