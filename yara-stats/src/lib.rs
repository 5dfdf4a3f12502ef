//! Numeric analyzers for the YARA diversity engine.
//!
//! - **Alpha diversity**: metric summaries, qualitative bands, two-group comparison
//! - **Beta diversity**: distance statistics, ordination, nearest samples
//! - **Rarefaction**: plateau and saturation detection, depth recommendation
//! - **Group comparison**: Kruskal-Wallis and Mann-Whitney on sample tables
//! - **Composition**: most common taxa at a rank
//!
//! Every analyzer is a set of free functions over the `yara-core` data model.
//! Calls hold no state between invocations and never mutate their inputs.

pub mod alpha;
pub mod beta;
pub mod composition;
pub mod descriptive;
pub mod distribution;
pub mod groups;
pub mod ordination;
pub mod rank;
pub mod rarefaction;
pub mod testing;

pub use alpha::{
    compare_two_groups, describe_all, describe_by_group, interpret, summary_stats, DiversityBand,
    GroupComparison, Interpretation, MetricFamily, PercentDifference, TwoGroupOutcome,
    UndefinedReason,
};
pub use beta::{distance_stats, nearest_samples, ordinate, DistanceStats, Neighbor, Ordination};
pub use composition::{composition, TaxonCount, TaxonomicComposition};
pub use descriptive::{summarize, Summary};
pub use groups::{
    group_descriptives, kruskal_wallis, mann_whitney, ComparisonResult, GroupDescriptive,
    GroupTest, MedianShift, TestOutcome,
};
pub use rarefaction::{
    assess, describe, plateau_depth, recommend_depth, saturation, CurveAssessment,
    DepthRecommendation, RarefactionSummary, SaturationBand,
};
pub use testing::TestResult;
