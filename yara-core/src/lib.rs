//! Shared primitives for the YARA diversity engine.
//!
//! `yara-core` provides the foundation the analyzer and loader crates build on:
//!
//! - **Error types**: [`YaraError`] and [`Result`] for structured error handling
//! - **Data model**: [`SampleMetricTable`], [`DistanceMatrix`], [`RarefactionCurve`]
//! - **Taxonomy**: the label grammar ([`parse_lineage`]) and [`TaxonomyRecord`]
//! - **Configuration**: [`EngineConfig`] with TOML loading
//! - **Traits**: [`Summarizable`] and [`Scored`] for result types
//! - **Worker**: [`worker::run_isolated`] for deadline-bounded calls

pub mod config;
pub mod curve;
pub mod distance;
pub mod error;
pub mod table;
pub mod taxonomy;
pub mod traits;
pub mod worker;

pub use config::{
    EngineConfig, GroupTestConfig, OrdinationConfig, OrdinationMethod, RarefactionConfig,
};
pub use curve::RarefactionCurve;
pub use distance::DistanceMatrix;
pub use error::{ErrorKind, Result, YaraError};
pub use table::SampleMetricTable;
pub use taxonomy::{parse_lineage, Lineage, Rank, TaxonomyRecord, UNASSIGNED};
pub use traits::*;
