//! Descriptive statistics for metric columns and distance sets.
//!
//! [`summarize`] produces the seven-number [`Summary`] reported for alpha
//! metrics and group descriptives. The individual helpers ([`mean`],
//! [`median`], [`quantile`], [`std_dev`]) are shared by the analyzers.

use yara_core::{Result, Summarizable, YaraError};

/// Location and spread of a set of observations.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Summary {
    /// Number of observations.
    pub count: usize,
    /// Arithmetic mean.
    pub mean: f64,
    /// Median (50th percentile).
    pub median: f64,
    /// Sample standard deviation (ddof=1); `None` for a single observation.
    pub std_dev: Option<f64>,
    /// Minimum value.
    pub min: f64,
    /// Maximum value.
    pub max: f64,
    /// First quartile (25th percentile).
    pub q25: f64,
    /// Third quartile (75th percentile).
    pub q75: f64,
}

impl Summarizable for Summary {
    fn summary(&self) -> String {
        let std = self
            .std_dev
            .map_or_else(|| "n/a".to_string(), |s| format!("{:.4}", s));
        format!(
            "n={}, mean={:.4}, median={:.4}, std={}, min={:.4}, max={:.4}",
            self.count, self.mean, self.median, std, self.min, self.max,
        )
    }
}

/// Summarize `data`, ignoring `NaN` entries.
///
/// # Errors
///
/// Returns [`YaraError::InsufficientSamples`] if no defined value remains.
pub fn summarize(data: &[f64]) -> Result<Summary> {
    let mut sorted: Vec<f64> = data.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return Err(YaraError::InsufficientSamples(
            "summarize: no defined values".into(),
        ));
    }
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = sorted.len();
    let mean_val = sorted.iter().sum::<f64>() / n as f64;
    let std_val = if n > 1 {
        let ss: f64 = sorted.iter().map(|&x| (x - mean_val).powi(2)).sum();
        Some((ss / (n - 1) as f64).sqrt())
    } else {
        None
    };

    Ok(Summary {
        count: n,
        mean: mean_val,
        median: quantile_sorted(&sorted, 0.5),
        std_dev: std_val,
        min: sorted[0],
        max: sorted[n - 1],
        q25: quantile_sorted(&sorted, 0.25),
        q75: quantile_sorted(&sorted, 0.75),
    })
}

// ── Individual functions ───────────────────────────────────────────────────

/// Arithmetic mean.
pub fn mean(data: &[f64]) -> Result<f64> {
    if data.is_empty() {
        return Err(YaraError::InsufficientSamples(
            "mean: data must not be empty".into(),
        ));
    }
    Ok(data.iter().sum::<f64>() / data.len() as f64)
}

/// Median (50th percentile).
pub fn median(data: &[f64]) -> Result<f64> {
    quantile(data, 0.5)
}

/// Standard deviation with the given degrees-of-freedom correction.
///
/// - `ddof = 0` → population standard deviation
/// - `ddof = 1` → sample standard deviation
pub fn std_dev(data: &[f64], ddof: usize) -> Result<f64> {
    let n = data.len();
    if n <= ddof {
        return Err(YaraError::InsufficientSamples(format!(
            "std_dev: need more than {} observations (got {})",
            ddof, n,
        )));
    }
    let m = mean(data)?;
    let ss: f64 = data.iter().map(|&x| (x - m).powi(2)).sum();
    Ok((ss / (n - ddof) as f64).sqrt())
}

/// Quantile with linear interpolation between order statistics.
pub fn quantile(data: &[f64], q: f64) -> Result<f64> {
    if data.is_empty() {
        return Err(YaraError::InsufficientSamples(
            "quantile: data must not be empty".into(),
        ));
    }
    if !(0.0..=1.0).contains(&q) {
        return Err(YaraError::MalformedInput(
            "quantile: q must be in [0, 1]".into(),
        ));
    }
    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    Ok(quantile_sorted(&sorted, q))
}

/// Quantile of a pre-sorted, non-empty slice.
pub(crate) fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let pos = q * (n - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = lo + 1;
    let frac = pos - lo as f64;
    if hi >= n {
        sorted[n - 1]
    } else {
        sorted[lo] * (1.0 - frac) + sorted[hi] * frac
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
