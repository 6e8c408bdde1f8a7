//! The three classificatory axes and their detail tables.

use peticiao_store::{Row, cell_text, cell_u64};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Optional outer partition key shared by every dimension and relation table.
pub const LOCALITY_FIELD: &str = "codigo_localidade";

/// Relation table: one row per observed (competency, class, subject) triple.
pub const RELATION_TABLE: &str = "cache_estrutura_real_relacoes";

/// Column mapping of one dimension's detail table.
///
/// `usage_field` is the per-table source of the canonical `usage_count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimensionTable {
    pub table: &'static str,
    pub code_field: &'static str,
    pub name_field: &'static str,
    pub usage_field: &'static str,
    /// Column holding this dimension's code in `RELATION_TABLE`.
    pub relation_field: &'static str,
}

impl DimensionTable {
    pub fn fields(&self) -> [&'static str; 3] {
        [self.code_field, self.name_field, self.usage_field]
    }
}

pub const COMPETENCY_TABLE: DimensionTable = DimensionTable {
    table: "cache_estrutura_real_competencias",
    code_field: "codigo_competencia",
    name_field: "descricao_competencia",
    usage_field: "total_combinacoes",
    relation_field: "codigo_competencia",
};

pub const CLASS_TABLE: DimensionTable = DimensionTable {
    table: "cache_estrutura_real_classes",
    code_field: "codigo_classe",
    name_field: "nome_classe",
    usage_field: "total_combinacoes",
    relation_field: "codigo_classe",
};

pub const SUBJECT_TABLE: DimensionTable = DimensionTable {
    table: "cache_estrutura_real_assuntos",
    code_field: "codigo_assunto",
    name_field: "nome_assunto",
    usage_field: "total_ocorrencias",
    relation_field: "codigo_assunto",
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Competency,
    Class,
    Subject,
}

impl Dimension {
    pub const ALL: [Dimension; 3] = [Dimension::Competency, Dimension::Class, Dimension::Subject];

    pub fn as_str(self) -> &'static str {
        match self {
            Dimension::Competency => "competency",
            Dimension::Class => "class",
            Dimension::Subject => "subject",
        }
    }

    /// Prefix of the synthesized display name.
    pub fn label(self) -> &'static str {
        match self {
            Dimension::Competency => "Competência",
            Dimension::Class => "Classe",
            Dimension::Subject => "Assunto",
        }
    }

    pub fn table(self) -> &'static DimensionTable {
        match self {
            Dimension::Competency => &COMPETENCY_TABLE,
            Dimension::Class => &CLASS_TABLE,
            Dimension::Subject => &SUBJECT_TABLE,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "competency" | "competencia" => Ok(Dimension::Competency),
            "class" | "classe" => Ok(Dimension::Class),
            "subject" | "assunto" => Ok(Dimension::Subject),
            other => Err(format!(
                "unknown dimension `{other}` (expected competency, class or subject)"
            )),
        }
    }
}

/// One competency, class or subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionValue {
    pub code: String,
    pub display_name: String,
    pub usage_count: u64,
}

impl DimensionValue {
    /// Build a value, synthesizing `"<Label> <code>"` for a null or blank name.
    pub fn new(
        dimension: Dimension,
        code: impl Into<String>,
        name: Option<&str>,
        usage_count: u64,
    ) -> Self {
        let code = code.into();
        let display_name = match name.map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("{} {code}", dimension.label()),
        };
        Self {
            code,
            display_name,
            usage_count,
        }
    }

    /// Map a detail-table row. Rows without a code are rejected.
    pub fn from_row(dimension: Dimension, row: &Row) -> Option<Self> {
        let table = dimension.table();
        let code = cell_text(row, table.code_field)?;
        let name = cell_text(row, table.name_field);
        let usage = cell_u64(row, table.usage_field).unwrap_or(0);
        Some(Self::new(dimension, code, name.as_deref(), usage))
    }
}

/// Case- and accent-insensitive collation key.
pub fn collation_key(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Integer codes compare numerically, anything else lexicographically.
pub fn compare_codes(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}

/// Sort ascending by display name, ties by natural code order.
pub fn sort_by_display_name(values: &mut Vec<DimensionValue>) {
    let mut keyed: Vec<(String, DimensionValue)> = values
        .drain(..)
        .map(|v| (collation_key(&v.display_name), v))
        .collect();
    keyed.sort_by(|(ka, a), (kb, b)| {
        ka.cmp(kb)
            .then_with(|| a.display_name.cmp(&b.display_name))
            .then_with(|| compare_codes(&a.code, &b.code))
    });
    values.extend(keyed.into_iter().map(|(_, v)| v));
}
