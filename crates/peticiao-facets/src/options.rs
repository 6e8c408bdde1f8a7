//! Option Resolver: key sets in, described and sorted option lists out.

use crate::dimension::{Dimension, DimensionValue, LOCALITY_FIELD, sort_by_display_name};
use crate::relation::RelatedKeys;
use peticiao_store::{EqFilters, FetchError, Fetcher, Row};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::info;

/// Per-dimension option lists consistent with a selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableOptions {
    pub competencies: Vec<DimensionValue>,
    pub classes: Vec<DimensionValue>,
    pub subjects: Vec<DimensionValue>,
}

impl AvailableOptions {
    pub fn get(&self, dimension: Dimension) -> &[DimensionValue] {
        match dimension {
            Dimension::Competency => &self.competencies,
            Dimension::Class => &self.classes,
            Dimension::Subject => &self.subjects,
        }
    }

    pub fn set(&mut self, dimension: Dimension, values: Vec<DimensionValue>) {
        match dimension {
            Dimension::Competency => self.competencies = values,
            Dimension::Class => self.classes = values,
            Dimension::Subject => self.subjects = values,
        }
    }

    pub fn codes(&self, dimension: Dimension) -> BTreeSet<&str> {
        self.get(dimension).iter().map(|v| v.code.as_str()).collect()
    }

    pub fn find(&self, dimension: Dimension, code: &str) -> Option<&DimensionValue> {
        self.get(dimension).iter().find(|v| v.code == code)
    }

    /// No options in any dimension.
    pub fn is_empty(&self) -> bool {
        Dimension::ALL.into_iter().all(|d| self.get(d).is_empty())
    }
}

#[derive(Clone)]
pub struct OptionResolver {
    fetcher: Fetcher,
}

impl OptionResolver {
    pub fn new(fetcher: Fetcher) -> Self {
        Self { fetcher }
    }

    /// Describe every key of `keys` from its dimension's detail table.
    ///
    /// The three lookups run concurrently; if any fails the whole call fails.
    pub async fn resolve_options(
        &self,
        keys: &RelatedKeys,
        scope: Option<&str>,
    ) -> Result<AvailableOptions, FetchError> {
        let scope_filters = scope_filters(scope);
        let (competencies, classes, subjects) = tokio::try_join!(
            self.lookup(Dimension::Competency, keys, &scope_filters),
            self.lookup(Dimension::Class, keys, &scope_filters),
            self.lookup(Dimension::Subject, keys, &scope_filters),
        )?;
        Ok(AvailableOptions {
            competencies,
            classes,
            subjects,
        })
    }

    /// Unfiltered catalog of every dimension within `scope`.
    pub async fn load_catalog(&self, scope: Option<&str>) -> Result<AvailableOptions, FetchError> {
        let scope_filters = scope_filters(scope);
        let (competencies, classes, subjects) = tokio::try_join!(
            self.fetch_dimension(Dimension::Competency, &scope_filters),
            self.fetch_dimension(Dimension::Class, &scope_filters),
            self.fetch_dimension(Dimension::Subject, &scope_filters),
        )?;
        info!(
            competencies = competencies.len(),
            classes = classes.len(),
            subjects = subjects.len(),
            scope = scope.unwrap_or("*"),
            "catalog loaded"
        );
        Ok(AvailableOptions {
            competencies,
            classes,
            subjects,
        })
    }

    async fn lookup(
        &self,
        dimension: Dimension,
        keys: &RelatedKeys,
        scope: &EqFilters,
    ) -> Result<Vec<DimensionValue>, FetchError> {
        let table = dimension.table();
        let rows = self
            .fetcher
            .lookup_by_keys(
                table.table,
                table.code_field,
                keys.get(dimension),
                &table.fields(),
                scope,
            )
            .await?;
        Ok(into_values(dimension, &rows))
    }

    async fn fetch_dimension(
        &self,
        dimension: Dimension,
        scope: &EqFilters,
    ) -> Result<Vec<DimensionValue>, FetchError> {
        let table = dimension.table();
        let rows = self
            .fetcher
            .fetch_all(table.table, &table.fields(), scope, Some(table.name_field))
            .await?;
        Ok(into_values(dimension, &rows))
    }
}

fn scope_filters(scope: Option<&str>) -> EqFilters {
    let mut filters = EqFilters::new();
    if let Some(locality) = scope {
        filters.insert(LOCALITY_FIELD.to_string(), Value::from(locality));
    }
    filters
}

/// Map rows to values, keep the first row per code, sort by display name.
fn into_values(dimension: Dimension, rows: &[Row]) -> Vec<DimensionValue> {
    let mut seen = BTreeSet::new();
    let mut values: Vec<DimensionValue> = rows
        .iter()
        .filter_map(|row| DimensionValue::from_row(dimension, row))
        .filter(|value| seen.insert(value.code.clone()))
        .collect();
    sort_by_display_name(&mut values);
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn class_row(code: &str, name: Value) -> Row {
        let mut row = Row::new();
        row.insert("codigo_classe".to_string(), json!(code));
        row.insert("nome_classe".to_string(), name);
        row
    }

    #[test]
    fn duplicate_codes_keep_the_first_row() {
        let rows = vec![
            class_row("CL1", json!("Execução")),
            class_row("CL1", json!("Outro nome")),
            class_row("CL2", json!("Embargos")),
        ];
        let values = into_values(Dimension::Class, &rows);
        let names: Vec<&str> = values.iter().map(|v| v.display_name.as_str()).collect();
        assert_eq!(names, vec!["Embargos", "Execução"]);
    }

    #[test]
    fn empty_options_in_every_dimension() {
        let mut options = AvailableOptions::default();
        assert!(options.is_empty());
        options.set(
            Dimension::Subject,
            into_values(Dimension::Subject, &[]),
        );
        assert!(options.is_empty());
        options.set(
            Dimension::Class,
            into_values(Dimension::Class, &[class_row("CL1", Value::Null)]),
        );
        assert!(!options.is_empty());
        assert_eq!(
            options.find(Dimension::Class, "CL1").map(|v| v.display_name.as_str()),
            Some("Classe CL1")
        );
    }

    #[test]
    fn scope_adds_the_locality_filter() {
        assert!(scope_filters(None).is_empty());
        assert_eq!(
            scope_filters(Some("L1")).get(LOCALITY_FIELD),
            Some(&Value::from("L1"))
        );
    }
}
