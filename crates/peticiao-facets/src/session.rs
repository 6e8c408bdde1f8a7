//! Selection State Machine.
//!
//! Transitions are synchronous and return a `Transition`. A transition that
//! needs the store hands back a `Recompute` ticket; running it is async and
//! yields a `Completed` result that is fed back through
//! `FacetSession::complete`. Every transition bumps the generation, and a
//! completion whose generation is no longer current is discarded, so the
//! last issued change is always the last one to reach the visible state.
//!
//! ```text
//! select / clear / clear_all
//!     │ Transition::Pending(ticket)
//!     ▼
//! ticket.run(engine).await ──► session.complete(done)  (stale → dropped)
//! ```

use crate::dimension::{Dimension, DimensionValue};
use crate::engine::FacetEngine;
use crate::options::AvailableOptions;
use crate::selection::{Phase, Selection};
use peticiao_store::FetchError;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Immutable snapshot of the session's visible state.
#[derive(Debug, Clone, PartialEq)]
pub struct FacetState {
    pub selection: Selection,
    pub options: Arc<AvailableOptions>,
    pub loading: bool,
    pub error: Option<FetchError>,
    pub generation: u64,
}

/// What the option lists currently show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionsStatus {
    Loading,
    Failed,
    NoValidCombination,
    Ready,
}

impl FacetState {
    pub fn phase(&self) -> Phase {
        self.selection.phase()
    }

    pub fn status(&self) -> OptionsStatus {
        if self.loading {
            OptionsStatus::Loading
        } else if self.error.is_some() {
            OptionsStatus::Failed
        } else if self.options.is_empty() {
            OptionsStatus::NoValidCombination
        } else {
            OptionsStatus::Ready
        }
    }
}

/// Pending recomputation for one selection.
#[derive(Debug, Clone)]
pub struct Recompute {
    generation: u64,
    selection: Selection,
    catalog: Arc<AvailableOptions>,
}

impl Recompute {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub async fn run(self, engine: &FacetEngine) -> Completed {
        let result = engine
            .available_options(&self.selection, &self.catalog)
            .await;
        Completed {
            generation: self.generation,
            result,
        }
    }
}

/// Outcome of a `Recompute`, tagged with the generation that issued it.
#[derive(Debug)]
pub struct Completed {
    pub generation: u64,
    pub result: Result<AvailableOptions, FetchError>,
}

#[derive(Debug)]
pub enum Transition {
    /// Nothing changed.
    Unchanged,
    /// The new state is already final.
    Settled,
    /// The new state is loading until this ticket completes.
    Pending(Recompute),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Applied,
    Stale,
}

pub struct FacetSession {
    catalog: Arc<AvailableOptions>,
    state: FacetState,
    latest: u64,
}

impl FacetSession {
    /// Load the unfiltered catalog and start in `Empty`.
    pub async fn initialize(engine: &FacetEngine) -> Result<Self, FetchError> {
        let catalog = engine.load_catalog().await?;
        Ok(Self::with_catalog(catalog))
    }

    pub fn with_catalog(catalog: AvailableOptions) -> Self {
        let catalog = Arc::new(catalog);
        Self {
            state: FacetState {
                selection: Selection::default(),
                options: catalog.clone(),
                loading: false,
                error: None,
                generation: 0,
            },
            catalog,
            latest: 0,
        }
    }

    pub fn state(&self) -> &FacetState {
        &self.state
    }

    pub fn snapshot(&self) -> FacetState {
        self.state.clone()
    }

    pub fn catalog(&self) -> &AvailableOptions {
        &self.catalog
    }

    pub fn select(&mut self, dimension: Dimension, value: DimensionValue) -> Transition {
        if self.state.selection.code(dimension) == Some(value.code.as_str()) {
            return Transition::Unchanged;
        }
        let next = self.state.selection.with(dimension, Some(value));
        self.begin(next)
    }

    pub fn clear(&mut self, dimension: Dimension) -> Transition {
        if self.state.selection.get(dimension).is_none() {
            return Transition::Unchanged;
        }
        let next = self.state.selection.with(dimension, None);
        self.begin(next)
    }

    pub fn clear_all(&mut self) -> Transition {
        if self.state.selection.is_empty() {
            return Transition::Unchanged;
        }
        self.begin(Selection::default())
    }

    /// Recompute the current selection again, e.g. after a failure.
    pub fn refresh(&mut self) -> Transition {
        self.begin(self.state.selection.clone())
    }

    /// Apply a finished recomputation unless a newer one has been issued.
    ///
    /// On failure the previous options are kept and the error is recorded.
    pub fn complete(&mut self, done: Completed) -> Resolution {
        if done.generation != self.latest {
            warn!(
                generation = done.generation,
                latest = self.latest,
                "discarding stale option recomputation"
            );
            return Resolution::Stale;
        }

        self.state = match done.result {
            Ok(options) => FacetState {
                options: Arc::new(options),
                loading: false,
                error: None,
                ..self.state.clone()
            },
            Err(error) => {
                warn!(%error, "option recomputation failed; keeping previous options");
                FacetState {
                    loading: false,
                    error: Some(error),
                    ..self.state.clone()
                }
            }
        };
        Resolution::Applied
    }

    /// Run a transition to completion against `engine`.
    pub async fn settle(&mut self, engine: &FacetEngine, transition: Transition) -> Resolution {
        match transition {
            Transition::Unchanged | Transition::Settled => Resolution::Applied,
            Transition::Pending(ticket) => {
                let done = ticket.run(engine).await;
                self.complete(done)
            }
        }
    }

    fn begin(&mut self, selection: Selection) -> Transition {
        self.latest += 1;
        let generation = self.latest;
        debug!(generation, phase = ?selection.phase(), "selection changed");

        if selection.is_empty() {
            self.state = FacetState {
                selection,
                options: self.catalog.clone(),
                loading: false,
                error: None,
                generation,
            };
            return Transition::Settled;
        }

        self.state = FacetState {
            selection: selection.clone(),
            options: self.state.options.clone(),
            loading: true,
            error: None,
            generation,
        };
        Transition::Pending(Recompute {
            generation,
            selection,
            catalog: self.catalog.clone(),
        })
    }
}
