//! Relation Index: which codes co-occur with the current selection.

use crate::dimension::{Dimension, RELATION_TABLE};
use crate::selection::Selection;
use peticiao_store::{FetchError, Fetcher, Query, Row, cell_text};
use std::collections::BTreeSet;
use tracing::debug;

/// One observed (competency, class, subject) combination.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct RelationTuple {
    pub competency_code: String,
    pub class_code: String,
    pub subject_code: String,
}

impl RelationTuple {
    pub fn new(
        competency_code: impl Into<String>,
        class_code: impl Into<String>,
        subject_code: impl Into<String>,
    ) -> Self {
        Self {
            competency_code: competency_code.into(),
            class_code: class_code.into(),
            subject_code: subject_code.into(),
        }
    }

    /// Map a relation row; rows missing any of the three codes are dropped.
    pub fn from_row(row: &Row) -> Option<Self> {
        Some(Self {
            competency_code: cell_text(row, Dimension::Competency.table().relation_field)?,
            class_code: cell_text(row, Dimension::Class.table().relation_field)?,
            subject_code: cell_text(row, Dimension::Subject.table().relation_field)?,
        })
    }

    pub fn code(&self, dimension: Dimension) -> &str {
        match dimension {
            Dimension::Competency => &self.competency_code,
            Dimension::Class => &self.class_code,
            Dimension::Subject => &self.subject_code,
        }
    }

    /// Whether this tuple agrees with every selected code.
    pub fn matches(&self, selection: &Selection) -> bool {
        Dimension::ALL.into_iter().all(|d| match selection.code(d) {
            Some(code) => self.code(d) == code,
            None => true,
        })
    }
}

/// Distinct codes per dimension extracted from relation tuples.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelatedKeys {
    pub competency_codes: BTreeSet<String>,
    pub class_codes: BTreeSet<String>,
    pub subject_codes: BTreeSet<String>,
}

impl RelatedKeys {
    pub fn from_tuples<'a>(tuples: impl IntoIterator<Item = &'a RelationTuple>) -> Self {
        let mut keys = Self::default();
        for tuple in tuples {
            for dimension in Dimension::ALL {
                keys.get_mut(dimension).insert(tuple.code(dimension).to_string());
            }
        }
        keys
    }

    pub fn get(&self, dimension: Dimension) -> &BTreeSet<String> {
        match dimension {
            Dimension::Competency => &self.competency_codes,
            Dimension::Class => &self.class_codes,
            Dimension::Subject => &self.subject_codes,
        }
    }

    pub fn get_mut(&mut self, dimension: Dimension) -> &mut BTreeSet<String> {
        match dimension {
            Dimension::Competency => &mut self.competency_codes,
            Dimension::Class => &mut self.class_codes,
            Dimension::Subject => &mut self.subject_codes,
        }
    }

    /// No valid combination: every key set is empty.
    pub fn is_empty(&self) -> bool {
        Dimension::ALL.into_iter().all(|d| self.get(d).is_empty())
    }
}

#[derive(Clone)]
pub struct RelationIndex {
    fetcher: Fetcher,
}

impl RelationIndex {
    pub fn new(fetcher: Fetcher) -> Self {
        Self { fetcher }
    }

    /// Fetch every relation tuple consistent with `selection` (and `scope`).
    pub async fn matching_tuples(
        &self,
        selection: &Selection,
        scope: Option<&str>,
    ) -> Result<Vec<RelationTuple>, FetchError> {
        let fields: Vec<&str> = Dimension::ALL
            .into_iter()
            .map(|d| d.table().relation_field)
            .collect();
        // offset paging needs a total order to stay stable across pages
        let query = fields.iter().fold(
            Query::from(RELATION_TABLE)
                .select(fields.iter().copied())
                .eq_all(&selection.relation_filters(scope)),
            |query, field| query.order(*field, true),
        );
        let rows = self.fetcher.fetch_all_matching(query).await?;
        let tuples: Vec<RelationTuple> = rows.iter().filter_map(RelationTuple::from_row).collect();
        debug!(
            rows = rows.len(),
            tuples = tuples.len(),
            selected = ?selection.selected_dimensions(),
            "relation tuples fetched"
        );
        Ok(tuples)
    }

    /// Distinct codes per dimension co-occurring with `selection`.
    ///
    /// Zero matching tuples yields three empty sets, not an error. Callers
    /// bypass this for an empty selection and use the unfiltered catalog.
    pub async fn resolve_related_keys(
        &self,
        selection: &Selection,
        scope: Option<&str>,
    ) -> Result<RelatedKeys, FetchError> {
        let tuples = self.matching_tuples(selection, scope).await?;
        Ok(RelatedKeys::from_tuples(&tuples))
    }
}
