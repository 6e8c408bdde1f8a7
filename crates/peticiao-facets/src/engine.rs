use crate::options::{AvailableOptions, OptionResolver};
use crate::relation::{RelatedKeys, RelationIndex};
use crate::selection::Selection;
use peticiao_store::{FetchError, Fetcher};
use tracing::info;

/// Relation Index and Option Resolver bound to one store and locality scope.
#[derive(Clone)]
pub struct FacetEngine {
    relations: RelationIndex,
    resolver: OptionResolver,
    scope: Option<String>,
}

impl FacetEngine {
    pub fn new(fetcher: Fetcher, scope: Option<String>) -> Self {
        Self {
            relations: RelationIndex::new(fetcher.clone()),
            resolver: OptionResolver::new(fetcher),
            scope,
        }
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    pub async fn load_catalog(&self) -> Result<AvailableOptions, FetchError> {
        self.resolver.load_catalog(self.scope()).await
    }

    pub async fn resolve_related_keys(
        &self,
        selection: &Selection,
    ) -> Result<RelatedKeys, FetchError> {
        self.relations
            .resolve_related_keys(selection, self.scope())
            .await
    }

    pub async fn resolve_options(
        &self,
        keys: &RelatedKeys,
    ) -> Result<AvailableOptions, FetchError> {
        self.resolver.resolve_options(keys, self.scope()).await
    }

    /// Options consistent with `selection`.
    ///
    /// - empty selection: the unfiltered `catalog`
    /// - one selected dimension: that dimension keeps its `catalog` list,
    ///   the other two come from the relation tuples
    /// - otherwise all three come from the relation tuples
    ///
    /// A selection with no matching tuple yields empty lists in every
    /// dimension, however many dimensions are selected.
    pub async fn available_options(
        &self,
        selection: &Selection,
        catalog: &AvailableOptions,
    ) -> Result<AvailableOptions, FetchError> {
        let selected = selection.selected_dimensions();
        if selected.is_empty() {
            return Ok(catalog.clone());
        }

        let mut keys = self.resolve_related_keys(selection).await?;
        if keys.is_empty() {
            info!(selected = ?selected, "no valid combination");
            return Ok(AvailableOptions::default());
        }
        let sole = match selected.as_slice() {
            [only] => Some(*only),
            _ => None,
        };
        if let Some(dimension) = sole {
            keys.get_mut(dimension).clear();
        }

        let mut options = self.resolve_options(&keys).await?;
        if let Some(dimension) = sole {
            options.set(dimension, catalog.get(dimension).to_vec());
        }

        info!(
            selected = ?selected,
            competencies = options.competencies.len(),
            classes = options.classes.len(),
            subjects = options.subjects.len(),
            "options resolved"
        );
        Ok(options)
    }
}
