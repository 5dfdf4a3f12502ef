//! Alpha diversity: per-metric summaries, qualitative interpretation, and
//! two-group comparison.

use std::fmt;

use yara_core::table::defined_values;
use yara_core::{GroupTestConfig, Result, SampleMetricTable, Summarizable, YaraError};

use crate::descriptive::{summarize, Summary};
use crate::testing::mann_whitney_u;

/// Descriptive statistics of one metric column (exact column name).
///
/// Missing (`NaN`) cells are ignored.
///
/// # Errors
///
/// Returns [`YaraError::MissingData`] if the metric is absent and
/// [`YaraError::InsufficientSamples`] if it has no defined value.
pub fn summary_stats(table: &SampleMetricTable, metric: &str) -> Result<Summary> {
    summarize(table.require_metric(metric)?)
}

/// [`summary_stats`] for every metric column, in column order.
///
/// Columns without a single defined value are left out.
pub fn describe_all(table: &SampleMetricTable) -> Result<Vec<(String, Summary)>> {
    let mut out = Vec::new();
    for name in table.metric_names() {
        let values = defined_values(table.require_metric(name)?);
        if values.is_empty() {
            log::debug!("describe_all: metric '{}' has no defined values", name);
            continue;
        }
        out.push((name.to_string(), summarize(&values)?));
    }
    Ok(out)
}

/// [`summary_stats`] of `metric` per label of `group_column`, groups in order
/// of first appearance. Groups without a defined value are skipped.
pub fn describe_by_group(
    table: &SampleMetricTable,
    group_column: &str,
    metric: &str,
) -> Result<Vec<(String, Summary)>> {
    table
        .partition(group_column, metric)?
        .into_iter()
        .filter(|(_, values)| !values.is_empty())
        .map(|(label, values)| Ok((label, summarize(&values)?)))
        .collect()
}

// ── Interpretation ─────────────────────────────────────────────────────────

/// Family of an alpha-diversity metric, which fixes its interpretation scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MetricFamily {
    /// Shannon entropy and relatives.
    Shannon,
    /// Gini-Simpson style indices in [0, 1].
    Simpson,
    /// Observed-feature counts.
    Richness,
}

impl MetricFamily {
    /// Resolve a metric column name by case-insensitive substring:
    /// `shannon`, `simpson`, then `observed` / `richness`.
    pub fn from_metric_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        if lower.contains("shannon") {
            Some(Self::Shannon)
        } else if lower.contains("simpson") {
            Some(Self::Simpson)
        } else if lower.contains("observed") || lower.contains("richness") {
            Some(Self::Richness)
        } else {
            None
        }
    }

    /// Band for `value` on this family's fixed scale.
    pub fn band(self, value: f64) -> DiversityBand {
        match self {
            Self::Shannon => match value {
                v if v < 1.5 => DiversityBand::Low,
                v if v < 2.5 => DiversityBand::Moderate,
                v if v < 3.5 => DiversityBand::High,
                _ => DiversityBand::VeryHigh,
            },
            Self::Simpson => match value {
                v if v < 0.5 => DiversityBand::Low,
                v if v < 0.8 => DiversityBand::Moderate,
                _ => DiversityBand::High,
            },
            Self::Richness => match value {
                v if v < 100.0 => DiversityBand::Low,
                v if v < 300.0 => DiversityBand::Moderate,
                _ => DiversityBand::High,
            },
        }
    }
}

/// Qualitative diversity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DiversityBand {
    Low,
    Moderate,
    High,
    VeryHigh,
    /// The metric family is not recognised.
    Unavailable,
}

impl fmt::Display for DiversityBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
            Self::VeryHigh => "very high",
            Self::Unavailable => "no interpretation available",
        };
        f.write_str(s)
    }
}

/// A value placed on its family's scale.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Interpretation {
    pub value: f64,
    pub family: Option<MetricFamily>,
    pub band: DiversityBand,
}

impl Summarizable for Interpretation {
    fn summary(&self) -> String {
        match self.family {
            Some(family) => format!("{:?} {:.3}: {} diversity", family, self.value, self.band),
            None => format!("{:.3}: {}", self.value, self.band),
        }
    }
}

/// Interpret `value` for the metric family named by `family_name` (a family
/// or metric column name, see [`MetricFamily::from_metric_name`]).
///
/// Unknown families yield [`DiversityBand::Unavailable`] rather than an
/// error.
pub fn interpret(value: f64, family_name: &str) -> Interpretation {
    let family = MetricFamily::from_metric_name(family_name);
    Interpretation {
        value,
        family,
        band: family.map_or(DiversityBand::Unavailable, |f| f.band(value)),
    }
}

// ── Two-group comparison ───────────────────────────────────────────────────

/// Relative change of the second group's mean against the first's.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PercentDifference {
    /// `(mean2 - mean1) / mean1 * 100`.
    Defined(f64),
    /// Not computable.
    Undefined(UndefinedReason),
}

impl PercentDifference {
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Defined(v) => Some(*v),
            Self::Undefined(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UndefinedReason {
    /// The first group's mean is zero.
    ZeroBaseline,
}

/// Means and Mann-Whitney result for exactly two groups.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupComparison {
    /// The two labels, in order of first appearance.
    pub groups: [String; 2],
    pub group1_mean: f64,
    pub group2_mean: f64,
    pub percent_difference: PercentDifference,
    /// Mann-Whitney U of the first group.
    pub statistic: f64,
    pub p_value: f64,
    pub significant: bool,
}

impl Summarizable for GroupComparison {
    fn summary(&self) -> String {
        let diff = match self.percent_difference {
            PercentDifference::Defined(v) => format!("{:+.1}%", v),
            PercentDifference::Undefined(_) => "undefined (zero baseline)".to_string(),
        };
        format!(
            "{} vs {}: means {:.4} / {:.4}, difference {}, U={:.1}, p={:.4}{}",
            self.groups[0],
            self.groups[1],
            self.group1_mean,
            self.group2_mean,
            diff,
            self.statistic,
            self.p_value,
            if self.significant { " (significant)" } else { "" },
        )
    }
}

/// Outcome of [`compare_two_groups`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TwoGroupOutcome {
    Compared(GroupComparison),
    /// The group column does not hold exactly two labels.
    Rejected { reason: String, groups_found: Vec<String> },
}

/// Compare `metric` between the two labels of `group_column`.
///
/// A column with more or fewer than two labels is reported as
/// [`TwoGroupOutcome::Rejected`], not as an error.
///
/// # Errors
///
/// Returns [`YaraError::MissingData`] for an absent column and
/// [`YaraError::InsufficientSamples`] when a group has no defined value.
pub fn compare_two_groups(
    table: &SampleMetricTable,
    group_column: &str,
    metric: &str,
    config: &GroupTestConfig,
) -> Result<TwoGroupOutcome> {
    let parts = table.partition(group_column, metric)?;
    if parts.len() != 2 {
        return Ok(TwoGroupOutcome::Rejected {
            reason: format!(
                "comparison supports exactly 2 groups; '{}' has {}",
                group_column,
                parts.len()
            ),
            groups_found: parts.into_iter().map(|(label, _)| label).collect(),
        });
    }

    let (label1, values1) = &parts[0];
    let (label2, values2) = &parts[1];
    for (label, values) in [(label1, values1), (label2, values2)] {
        if values.is_empty() {
            return Err(YaraError::InsufficientSamples(format!(
                "group '{}' has no defined '{}' values",
                label, metric
            )));
        }
    }

    let mean1 = values1.iter().sum::<f64>() / values1.len() as f64;
    let mean2 = values2.iter().sum::<f64>() / values2.len() as f64;
    let percent_difference = if mean1 == 0.0 {
        PercentDifference::Undefined(UndefinedReason::ZeroBaseline)
    } else {
        PercentDifference::Defined((mean2 - mean1) / mean1 * 100.0)
    };

    let test = mann_whitney_u(values1, values2)?;
    Ok(TwoGroupOutcome::Compared(GroupComparison {
        groups: [label1.clone(), label2.clone()],
        group1_mean: mean1,
        group2_mean: mean2,
        percent_difference,
        statistic: test.statistic,
        p_value: test.p_value,
        significant: config.is_significant(test.p_value),
    }))
}

// ── Tests ──────────────────────────────────────────────────────────────────
