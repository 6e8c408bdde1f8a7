//! # peticiao-facets
//!
//! Bidirectional cross-filtering of competencies, classes and subjects.
//!
//! A user may pick values in any order; after each change the remaining
//! choices in every dimension are recomputed from the relation table so
//! that each offered value co-occurs with the whole selection in at least
//! one observed tuple.
//!
//! ```text
//! FacetSession (selection, generation)
//!     │ Recompute ticket
//!     ▼
//! FacetEngine ── RelationIndex   (relation table, paginated)
//!             └─ OptionResolver  (detail tables, batched, concurrent)
//! ```
//!
//! The store is injected as a `peticiao_store::Fetcher`; nothing here holds a
//! global client.

pub mod dimension;
pub mod engine;
pub mod options;
pub mod relation;
pub mod selection;
pub mod session;

pub use dimension::{
    CLASS_TABLE, COMPETENCY_TABLE, Dimension, DimensionTable, DimensionValue, LOCALITY_FIELD,
    RELATION_TABLE, SUBJECT_TABLE, collation_key, compare_codes, sort_by_display_name,
};
pub use engine::FacetEngine;
pub use options::{AvailableOptions, OptionResolver};
pub use relation::{RelatedKeys, RelationIndex, RelationTuple};
pub use selection::{Phase, Selection};
pub use session::{
    Completed, FacetSession, FacetState, OptionsStatus, Recompute, Resolution, Transition,
};
