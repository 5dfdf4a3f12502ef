//! Group comparison on sample tables: Kruskal-Wallis across all groups,
//! Mann-Whitney between two named groups, and per-group descriptives.
//!
//! Tests that cannot run for lack of observations return
//! [`TestOutcome::Insufficient`] rather than an error, so callers can explain
//! why nothing was computed.

use yara_core::{GroupTestConfig, Result, SampleMetricTable, Scored, Summarizable};

use crate::descriptive::{median, summarize};
use crate::testing::{kruskal_wallis as kruskal_h, mann_whitney_u};

/// Which test produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GroupTest {
    KruskalWallis,
    MannWhitney,
}

impl GroupTest {
    pub fn name(self) -> &'static str {
        match self {
            Self::KruskalWallis => "Kruskal-Wallis",
            Self::MannWhitney => "Mann-Whitney U",
        }
    }
}

/// Direction of a significant two-group difference.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MedianShift {
    /// Group with the higher median.
    pub higher: String,
    pub higher_median: f64,
    pub lower: String,
    pub lower_median: f64,
    /// `higher_median - lower_median`.
    pub difference: f64,
}

/// A completed test.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ComparisonResult {
    pub test: GroupTest,
    pub statistic: f64,
    /// Two-sided p-value in [0, 1].
    pub p_value: f64,
    /// Groups that took part, in the order they were compared.
    pub groups: Vec<String>,
    pub significant: bool,
    pub rationale: String,
    /// Set for a significant Mann-Whitney test.
    pub median_shift: Option<MedianShift>,
}

impl Scored for ComparisonResult {
    fn score(&self) -> f64 {
        self.p_value
    }
}

impl Summarizable for ComparisonResult {
    fn summary(&self) -> String {
        self.rationale.clone()
    }
}

/// A test that could not run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InsufficientSamples {
    pub test: GroupTest,
    pub reason: String,
    /// Observations per group considered, in first-appearance order.
    pub group_sizes: Vec<(String, usize)>,
}

/// Outcome of a group test.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TestOutcome {
    Completed(ComparisonResult),
    Insufficient(InsufficientSamples),
}

impl TestOutcome {
    pub fn completed(&self) -> Option<&ComparisonResult> {
        match self {
            Self::Completed(r) => Some(r),
            Self::Insufficient(_) => None,
        }
    }
}

impl Summarizable for TestOutcome {
    fn summary(&self) -> String {
        match self {
            Self::Completed(r) => r.summary(),
            Self::Insufficient(i) => format!("{}: {}", i.test.name(), i.reason),
        }
    }
}

// ── Kruskal-Wallis ─────────────────────────────────────────────────────────

/// Kruskal-Wallis test of `metric_column` across the groups of
/// `group_column`.
///
/// Groups with fewer than `config.kruskal_min_group_size` defined values are
/// left out; fewer than two remaining groups is an insufficient outcome.
///
/// # Errors
///
/// Returns [`MissingData`](yara_core::YaraError::MissingData) if a column is
/// absent.
pub fn kruskal_wallis(
    table: &SampleMetricTable,
    group_column: &str,
    metric_column: &str,
    config: &GroupTestConfig,
) -> Result<TestOutcome> {
    let parts = table.partition(group_column, metric_column)?;
    let group_sizes: Vec<(String, usize)> =
        parts.iter().map(|(l, v)| (l.clone(), v.len())).collect();
    let eligible: Vec<&(String, Vec<f64>)> = parts
        .iter()
        .filter(|(_, v)| v.len() >= config.kruskal_min_group_size)
        .collect();

    if eligible.len() < 2 {
        return Ok(TestOutcome::Insufficient(InsufficientSamples {
            test: GroupTest::KruskalWallis,
            reason: format!(
                "insufficient groups: need at least 2 groups with {}+ samples, found {}",
                config.kruskal_min_group_size,
                eligible.len()
            ),
            group_sizes,
        }));
    }
    if eligible.len() < parts.len() {
        log::debug!(
            "kruskal_wallis: dropped {} group(s) below {} samples",
            parts.len() - eligible.len(),
            config.kruskal_min_group_size
        );
    }

    let samples: Vec<&[f64]> = eligible.iter().map(|(_, v)| v.as_slice()).collect();
    let result = kruskal_h(&samples)?;
    let groups: Vec<String> = eligible.iter().map(|(l, _)| l.clone()).collect();
    let significant = config.is_significant(result.p_value);

    let rationale = if significant {
        format!(
            "significant difference detected (H={:.3}, p={:.4}): '{}' varies across groups {}",
            result.statistic,
            result.p_value,
            metric_column,
            groups.join(", ")
        )
    } else {
        format!(
            "no significant difference (H={:.3}, p={:.4}): no evidence that '{}' varies across groups {}",
            result.statistic,
            result.p_value,
            metric_column,
            groups.join(", ")
        )
    };

    Ok(TestOutcome::Completed(ComparisonResult {
        test: GroupTest::KruskalWallis,
        statistic: result.statistic,
        p_value: result.p_value,
        groups,
        significant,
        rationale,
        median_shift: None,
    }))
}

// ── Mann-Whitney ───────────────────────────────────────────────────────────

/// Mann-Whitney U test of `metric_column` between `group_a` and `group_b`.
///
/// Both groups must be present with at least
/// `config.mann_whitney_min_group_size` defined values, else the outcome is
/// insufficient. The statistic is U of `group_a`. When significant, the
/// result names the group with the higher median and the gap between
/// medians.
///
/// # Errors
///
/// Returns [`MissingData`](yara_core::YaraError::MissingData) if a column is
/// absent.
pub fn mann_whitney(
    table: &SampleMetricTable,
    group_column: &str,
    group_a: &str,
    group_b: &str,
    metric_column: &str,
    config: &GroupTestConfig,
) -> Result<TestOutcome> {
    let parts = table.partition(group_column, metric_column)?;
    let find = |name: &str| parts.iter().find(|(l, _)| l == name).map(|(_, v)| v);
    let group_sizes = vec![
        (group_a.to_string(), find(group_a).map_or(0, Vec::len)),
        (group_b.to_string(), find(group_b).map_or(0, Vec::len)),
    ];

    let (Some(values_a), Some(values_b)) = (find(group_a), find(group_b)) else {
        return Ok(TestOutcome::Insufficient(InsufficientSamples {
            test: GroupTest::MannWhitney,
            reason: format!(
                "group '{}' or '{}' not found in column '{}'",
                group_a, group_b, group_column
            ),
            group_sizes,
        }));
    };
    let min = config.mann_whitney_min_group_size;
    if values_a.len() < min || values_b.len() < min {
        return Ok(TestOutcome::Insufficient(InsufficientSamples {
            test: GroupTest::MannWhitney,
            reason: format!("insufficient samples: need at least {} per group", min),
            group_sizes,
        }));
    }

    let result = mann_whitney_u(values_a, values_b)?;
    let significant = config.is_significant(result.p_value);

    let (median_shift, rationale) = if significant {
        let med_a = median(values_a)?;
        let med_b = median(values_b)?;
        let shift = if med_a > med_b {
            MedianShift {
                higher: group_a.to_string(),
                higher_median: med_a,
                lower: group_b.to_string(),
                lower_median: med_b,
                difference: med_a - med_b,
            }
        } else {
            MedianShift {
                higher: group_b.to_string(),
                higher_median: med_b,
                lower: group_a.to_string(),
                lower_median: med_a,
                difference: med_b - med_a,
            }
        };
        let rationale = format!(
            "significant difference (U={:.1}, p={:.4}): {} ({:.2}) > {} ({:.2}) by {:.2}",
            result.statistic,
            result.p_value,
            shift.higher,
            shift.higher_median,
            shift.lower,
            shift.lower_median,
            shift.difference
        );
        (Some(shift), rationale)
    } else {
        let rationale = format!(
            "no significant difference (U={:.1}, p={:.4}): {} and {} are statistically similar for '{}'",
            result.statistic, result.p_value, group_a, group_b, metric_column
        );
        (None, rationale)
    };

    Ok(TestOutcome::Completed(ComparisonResult {
        test: GroupTest::MannWhitney,
        statistic: result.statistic,
        p_value: result.p_value,
        groups: vec![group_a.to_string(), group_b.to_string()],
        significant,
        rationale,
        median_shift,
    }))
}

// ── Descriptives ───────────────────────────────────────────────────────────

/// Count, mean, median, and standard deviation of one group.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupDescriptive {
    pub group: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    /// Sample standard deviation; `None` below two observations.
    pub std_dev: Option<f64>,
}

/// Descriptives of `metric_column` per group, in first-appearance order.
/// A group with no defined value is listed with count 0.
pub fn group_descriptives(
    table: &SampleMetricTable,
    group_column: &str,
    metric_column: &str,
) -> Result<Vec<GroupDescriptive>> {
    table
        .partition(group_column, metric_column)?
        .into_iter()
        .map(|(group, values)| {
            if values.is_empty() {
                return Ok(GroupDescriptive {
                    group,
                    count: 0,
                    mean: None,
                    median: None,
                    std_dev: None,
                });
            }
            let s = summarize(&values)?;
            Ok(GroupDescriptive {
                group,
                count: s.count,
                mean: Some(s.mean),
                median: Some(s.median),
                std_dev: s.std_dev,
            })
        })
        .collect()
}

// ── Tests ──────────────────────────────────────────────────────────────────
