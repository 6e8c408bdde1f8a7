//! Competency routing verification: filed competency vs. the one the court
//! system reports after lookup.

use crate::Reports;
use crate::tables::{DIVERGENCE_GROUPS, DIVERGENT_PROCESSES, VERIFICATION_STATS};
use peticiao_store::{FetchError, Query, Row, cell_bool, cell_f64, cell_text, cell_u64};
use serde::Serialize;
use tracing::{debug, info};

pub const DEFAULT_PROCESS_PAGE_SIZE: usize = 50;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationStats {
    pub total: u64,
    pub verified: u64,
    pub unverified: u64,
    pub divergent: u64,
    /// Percentage of verified processes whose competency diverged.
    pub divergence_rate: f64,
}

impl VerificationStats {
    pub fn from_row(row: &Row) -> Self {
        let count = |field: &str| cell_u64(row, field).unwrap_or(0);
        Self {
            total: count("total"),
            verified: count("verificados"),
            unverified: count("nao_verificados"),
            divergent: count("divergentes"),
            divergence_rate: cell_f64(row, "taxa_divergencia").unwrap_or(0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompetencyRef {
    pub code: String,
    pub name: String,
}

impl CompetencyRef {
    fn from_row(row: &Row, code_field: &str, name_field: &str) -> Option<Self> {
        let code = cell_text(row, code_field)?;
        let name = cell_text(row, name_field)
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("Código {code}"));
        Some(Self { code, name })
    }
}

/// Processes filed under `from` that the court system places under `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DivergenceGroup {
    pub from: CompetencyRef,
    pub to: CompetencyRef,
    pub count: u64,
    pub routing_confirmed: bool,
}

impl DivergenceGroup {
    pub fn from_row(row: &Row) -> Option<Self> {
        Some(Self {
            from: CompetencyRef::from_row(row, "codigo_competencia_de", "nome_competencia_de")?,
            to: CompetencyRef::from_row(row, "codigo_competencia_para", "nome_competencia_para")?,
            count: cell_u64(row, "quantidade").unwrap_or(0),
            routing_confirmed: cell_bool(row, "roteamento_confirmado").unwrap_or(false),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DivergentProcess {
    pub process_number: String,
    pub class_name: Option<String>,
    pub subject_name: Option<String>,
    pub verified_at: Option<String>,
}

impl DivergentProcess {
    pub fn from_row(row: &Row) -> Option<Self> {
        Some(Self {
            process_number: cell_text(row, "numero_processo")?,
            class_name: cell_text(row, "nome_classe"),
            subject_name: cell_text(row, "nome_assunto"),
            verified_at: cell_text(row, "data_verificacao"),
        })
    }
}

/// One page of divergent processes. `page` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessPage {
    pub processes: Vec<DivergentProcess>,
    pub total: u64,
    pub page: usize,
    pub total_pages: usize,
}

impl ProcessPage {
    pub fn has_more(&self) -> bool {
        self.page < self.total_pages
    }
}

fn total_pages(total: u64, limit: usize) -> usize {
    let pages = total.div_ceil(limit as u64);
    usize::try_from(pages).unwrap_or(usize::MAX).max(1)
}

impl Reports {
    pub async fn verification_stats(&self) -> Result<VerificationStats, FetchError> {
        let row = self.first_row(VERIFICATION_STATS).await?;
        Ok(row.as_ref().map(VerificationStats::from_row).unwrap_or_default())
    }

    /// Divergence groups, largest first.
    pub async fn divergence_groups(&self) -> Result<Vec<DivergenceGroup>, FetchError> {
        let query = Query::from(DIVERGENCE_GROUPS).order("quantidade", false);
        let rows = self.fetcher.fetch_all_matching(query).await?;
        let groups: Vec<DivergenceGroup> =
            rows.iter().filter_map(DivergenceGroup::from_row).collect();
        info!(groups = groups.len(), "divergence groups loaded");
        Ok(groups)
    }

    /// One page of the processes in the `from` → `to` divergence group,
    /// most recently verified first.
    pub async fn divergent_processes(
        &self,
        from: &str,
        to: &str,
        page: usize,
        limit: usize,
    ) -> Result<ProcessPage, FetchError> {
        let page = page.max(1);
        let limit = limit.max(1);
        let offset = (page - 1).saturating_mul(limit);

        let query = Query::from(DIVERGENT_PROCESSES)
            .eq("codigo_competencia_de", from)
            .eq("codigo_competencia_para", to)
            .order("data_verificacao", false)
            .range(offset, offset.saturating_add(limit - 1))
            .with_count();
        let response = self.fetcher.fetch_once(&query).await?;
        let processes: Vec<DivergentProcess> = response
            .rows
            .iter()
            .filter_map(DivergentProcess::from_row)
            .collect();
        // a store that ignores the count request still bounds the total
        let total = response
            .count
            .unwrap_or((offset + processes.len()) as u64);
        debug!(from, to, page, total, rows = processes.len(), "divergent processes page");

        Ok(ProcessPage {
            processes,
            total,
            page,
            total_pages: total_pages(total, limit),
        })
    }
}
