//! Tabular data loading for the YARA diversity engine.
//!
//! Reads the delimited-text exports of an amplicon pipeline into the
//! `yara-core` data model:
//! - **Alpha tables**: per-sample metrics plus group columns
//! - **Distance matrices**: square, labelled on both axes
//! - **Taxonomy tables**: `Feature ID` / `Taxon` / `Confidence`
//! - **Rarefaction tables**: sample rows by depth columns
//! - **Archives**: `.zip` / `.qza` / `.qzv`, via the `archive` feature
//!   (enabled by default)

pub mod delimited;
pub mod kind;
pub mod loader;

#[cfg(feature = "archive")]
pub mod archive;

/// Whether this build can read archive inputs.
pub const ARCHIVE_SUPPORT: bool = cfg!(feature = "archive");

pub use delimited::{read_table, read_table_from, RawTable};
pub use kind::DataKind;
pub use loader::{
    is_archive, load, load_alpha, load_distance_matrix, load_rarefaction, load_reader,
    load_taxonomy, LoadOptions, LoadedData,
};
