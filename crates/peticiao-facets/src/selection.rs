use crate::dimension::{Dimension, DimensionValue, LOCALITY_FIELD};
use peticiao_store::EqFilters;
use serde::Serialize;
use serde_json::Value;

/// Current pick per dimension. Not persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub competency: Option<DimensionValue>,
    pub class: Option<DimensionValue>,
    pub subject: Option<DimensionValue>,
}

/// Coarse state of a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Empty,
    Partial,
    Complete,
}

impl Selection {
    pub fn get(&self, dimension: Dimension) -> Option<&DimensionValue> {
        match dimension {
            Dimension::Competency => self.competency.as_ref(),
            Dimension::Class => self.class.as_ref(),
            Dimension::Subject => self.subject.as_ref(),
        }
    }

    fn slot(&mut self, dimension: Dimension) -> &mut Option<DimensionValue> {
        match dimension {
            Dimension::Competency => &mut self.competency,
            Dimension::Class => &mut self.class,
            Dimension::Subject => &mut self.subject,
        }
    }

    /// Copy of this selection with `dimension` set to `value`.
    pub fn with(&self, dimension: Dimension, value: Option<DimensionValue>) -> Self {
        let mut next = self.clone();
        *next.slot(dimension) = value;
        next
    }

    pub fn code(&self, dimension: Dimension) -> Option<&str> {
        self.get(dimension).map(|v| v.code.as_str())
    }

    pub fn selected_dimensions(&self) -> Vec<Dimension> {
        Dimension::ALL
            .into_iter()
            .filter(|d| self.get(*d).is_some())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.competency.is_none() && self.class.is_none() && self.subject.is_none()
    }

    pub fn phase(&self) -> Phase {
        match self.selected_dimensions().len() {
            0 => Phase::Empty,
            3 => Phase::Complete,
            _ => Phase::Partial,
        }
    }

    /// Equality filters over the relation table for every selected code,
    /// plus the locality scope when given.
    pub fn relation_filters(&self, scope: Option<&str>) -> EqFilters {
        let mut filters = EqFilters::new();
        if let Some(locality) = scope {
            filters.insert(LOCALITY_FIELD.to_string(), Value::from(locality));
        }
        for dimension in Dimension::ALL {
            if let Some(code) = self.code(dimension) {
                filters.insert(
                    dimension.table().relation_field.to_string(),
                    Value::from(code),
                );
            }
        }
        filters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn value(dimension: Dimension, code: &str) -> DimensionValue {
        DimensionValue::new(dimension, code, None, 0)
    }

    #[test]
    fn phase_follows_selected_count() {
        let empty = Selection::default();
        assert_eq!(empty.phase(), Phase::Empty);

        let partial = empty.with(Dimension::Class, Some(value(Dimension::Class, "CL1")));
        assert_eq!(partial.phase(), Phase::Partial);

        let complete = partial
            .with(Dimension::Competency, Some(value(Dimension::Competency, "C")))
            .with(Dimension::Subject, Some(value(Dimension::Subject, "S")));
        assert_eq!(complete.phase(), Phase::Complete);
        assert_eq!(
            complete.with(Dimension::Class, None).phase(),
            Phase::Partial
        );
    }

    #[test]
    fn relation_filters_cover_scope_and_selected_codes() {
        let selection = Selection::default()
            .with(Dimension::Subject, Some(value(Dimension::Subject, "AS1")));
        let filters = selection.relation_filters(Some("L9"));
        assert_eq!(filters.len(), 2);
        assert_eq!(filters["codigo_localidade"], json!("L9"));
        assert_eq!(filters["codigo_assunto"], json!("AS1"));
    }
}
