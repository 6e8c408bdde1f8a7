//! Error-classification hierarchy: competency → class → error record.
//!
//! Records live in `cache_erros_hierarquicos`; a record without
//! `classificacao` has not been analysed yet.

use crate::Reports;
use crate::tables::{CLASSIFICATION_SUMMARY, ERROR_HIERARCHY};
use peticiao_store::{FetchError, Query, Row, cell_text, cell_u64};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

const CLASSIFICATION_FIELD: &str = "classificacao";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Classification {
    #[serde(rename = "combinacao_impossivel")]
    ImpossibleCombination,
    #[serde(rename = "erro_corrigivel")]
    CorrectableError,
    #[serde(rename = "erro_sistema")]
    SystemError,
}

impl Classification {
    pub const ALL: [Classification; 3] = [
        Classification::ImpossibleCombination,
        Classification::CorrectableError,
        Classification::SystemError,
    ];

    /// Stored value of `classificacao`.
    pub fn as_str(self) -> &'static str {
        match self {
            Classification::ImpossibleCombination => "combinacao_impossivel",
            Classification::CorrectableError => "erro_corrigivel",
            Classification::SystemError => "erro_sistema",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Classification::ImpossibleCombination => "Combinação Impossível",
            Classification::CorrectableError => "Erro Corrigível",
            Classification::SystemError => "Erro do Sistema",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown classification `{0}`")]
pub struct UnknownClassification(pub String);

impl FromStr for Classification {
    type Err = UnknownClassification;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Classification::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownClassification(s.to_string()))
    }
}

/// Which error records a hierarchy view includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassificationFilter {
    /// Not analysed yet (`classificacao IS NULL`).
    #[default]
    Uncategorized,
    /// Any classification (`classificacao IS NOT NULL`).
    Categorized,
    Only(Classification),
}

impl ClassificationFilter {
    fn apply(self, query: Query) -> Query {
        match self {
            ClassificationFilter::Uncategorized => query.is_null(CLASSIFICATION_FIELD),
            ClassificationFilter::Categorized => query.not_null(CLASSIFICATION_FIELD),
            ClassificationFilter::Only(c) => query.eq(CLASSIFICATION_FIELD, c.as_str()),
        }
    }
}

impl fmt::Display for ClassificationFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassificationFilter::Uncategorized => f.write_str("uncategorized"),
            ClassificationFilter::Categorized => f.write_str("categorized"),
            ClassificationFilter::Only(c) => write!(f, "{c}"),
        }
    }
}

impl FromStr for ClassificationFilter {
    type Err = UnknownClassification;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uncategorized" | "por_categorizar" => Ok(ClassificationFilter::Uncategorized),
            "categorized" | "todos" => Ok(ClassificationFilter::Categorized),
            other => other.parse().map(ClassificationFilter::Only),
        }
    }
}

/// Counts from the single-row classification summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationSummary {
    pub uncategorized: u64,
    pub impossible_combination: u64,
    pub correctable_error: u64,
    pub system_error: u64,
}

impl ClassificationSummary {
    pub fn from_row(row: &Row) -> Self {
        let count = |field: &str| cell_u64(row, field).unwrap_or(0);
        Self {
            uncategorized: count("nao_analisados"),
            impossible_combination: count("combinacao_impossivel"),
            correctable_error: count("erro_corrigivel"),
            system_error: count("erro_sistema"),
        }
    }

    pub fn get(&self, classification: Classification) -> u64 {
        match classification {
            Classification::ImpossibleCombination => self.impossible_combination,
            Classification::CorrectableError => self.correctable_error,
            Classification::SystemError => self.system_error,
        }
    }

    pub fn categorized(&self) -> u64 {
        self.impossible_combination + self.correctable_error + self.system_error
    }
}

/// A competency or class with the number of error records under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorGroup {
    pub code: String,
    pub name: Option<String>,
    pub total_errors: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRecord {
    pub competency_code: String,
    pub competency_name: Option<String>,
    pub class_code: String,
    pub class_name: Option<String>,
    pub error_type: Option<String>,
    pub occurrences: u64,
    pub classification: Option<Classification>,
    pub example_message: Option<String>,
    pub analysis: Option<String>,
    pub suggested_fix: Option<String>,
}

impl ErrorRecord {
    pub fn from_row(row: &Row) -> Option<Self> {
        Some(Self {
            competency_code: cell_text(row, "codigo_competencia")?,
            competency_name: cell_text(row, "nome_competencia"),
            class_code: cell_text(row, "codigo_classe")?,
            class_name: cell_text(row, "nome_classe"),
            error_type: cell_text(row, "tipo_erro"),
            occurrences: cell_u64(row, "total_ocorrencias").unwrap_or(1),
            classification: cell_text(row, CLASSIFICATION_FIELD).and_then(|c| c.parse().ok()),
            example_message: cell_text(row, "mensagem_erro_exemplo"),
            analysis: cell_text(row, "descricao_analise"),
            suggested_fix: cell_text(row, "solucao_sugerida"),
        })
    }
}

impl Reports {
    pub async fn classification_summary(&self) -> Result<ClassificationSummary, FetchError> {
        let row = self.first_row(CLASSIFICATION_SUMMARY).await?;
        Ok(row.as_ref().map(ClassificationSummary::from_row).unwrap_or_default())
    }

    pub async fn competencies_with_errors(
        &self,
        filter: ClassificationFilter,
    ) -> Result<Vec<ErrorGroup>, FetchError> {
        let query = Query::from(ERROR_HIERARCHY)
            .select(["codigo_competencia", "nome_competencia"])
            .order("codigo_competencia", true);
        let rows = self.fetcher.fetch_all_matching(filter.apply(query)).await?;
        let groups = group_by_code(&rows, "codigo_competencia", "nome_competencia");
        info!(%filter, groups = groups.len(), "competencies with errors");
        Ok(groups)
    }

    pub async fn classes_with_errors(
        &self,
        competency: &str,
        filter: ClassificationFilter,
    ) -> Result<Vec<ErrorGroup>, FetchError> {
        let query = Query::from(ERROR_HIERARCHY)
            .select(["codigo_classe", "nome_classe"])
            .eq("codigo_competencia", competency)
            .order("codigo_classe", true);
        let rows = self.fetcher.fetch_all_matching(filter.apply(query)).await?;
        let groups = group_by_code(&rows, "codigo_classe", "nome_classe");
        info!(competency, %filter, groups = groups.len(), "classes with errors");
        Ok(groups)
    }

    /// Error records of one (competency, class), most frequent first.
    pub async fn errors_for_class(
        &self,
        competency: &str,
        class: &str,
        filter: ClassificationFilter,
    ) -> Result<Vec<ErrorRecord>, FetchError> {
        let query = Query::from(ERROR_HIERARCHY)
            .eq("codigo_competencia", competency)
            .eq("codigo_classe", class)
            .order("total_ocorrencias", false);
        let rows = self.fetcher.fetch_all_matching(filter.apply(query)).await?;
        let mut records: Vec<ErrorRecord> = rows.iter().filter_map(ErrorRecord::from_row).collect();
        // missing totals default to 1 after the store has ordered them
        records.sort_by(|a, b| b.occurrences.cmp(&a.occurrences));
        debug!(competency, class, records = records.len(), "errors for class");
        Ok(records)
    }
}

/// Count rows per code, keep the first non-empty name, largest groups first.
fn group_by_code(rows: &[Row], code_field: &str, name_field: &str) -> Vec<ErrorGroup> {
    let mut groups: BTreeMap<String, ErrorGroup> = BTreeMap::new();
    for row in rows {
        let Some(code) = cell_text(row, code_field) else {
            continue;
        };
        let name = cell_text(row, name_field).filter(|n| !n.trim().is_empty());
        let group = groups.entry(code.clone()).or_insert_with(|| ErrorGroup {
            code,
            name: None,
            total_errors: 0,
        });
        group.total_errors += 1;
        if group.name.is_none() {
            group.name = name;
        }
    }
    let mut groups: Vec<ErrorGroup> = groups.into_values().collect();
    groups.sort_by(|a, b| b.total_errors.cmp(&a.total_errors).then_with(|| a.code.cmp(&b.code)));
    groups
}
