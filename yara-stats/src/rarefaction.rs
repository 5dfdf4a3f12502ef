//! Rarefaction analysis: plateau and saturation detection per curve, and a
//! sampling-depth recommendation across a set of curves.
//!
//! # Saturation
//!
//! With values in ascending depth order and `v_last`, `v_prev` the final two,
//! saturation is `1 - min(|v_last - v_prev| / v_last, 1)` (the relative change
//! is 0 when `v_last` is 0). Curves with fewer than two points have
//! saturation 0.
//!
//! # Depth recommendation
//!
//! Every depth appearing in any curve is a candidate. A candidate qualifies
//! when the fraction of samples with a value at that depth reaches the
//! requested minimum; among qualifying depths the one maximizing
//! `mean saturation × retention` wins, the shallowest on ties. Saturation at a
//! depth is computed on each curve truncated to that depth.

use std::collections::BTreeSet;
use std::fmt;

use yara_core::{RarefactionConfig, RarefactionCurve, Summarizable};

use crate::descriptive::quantile_sorted;

// ── Per-curve measures ─────────────────────────────────────────────────────

/// Smallest depth whose value reaches `threshold × max(values)`.
///
/// Returns `None` for an empty curve or when no value reaches the target
/// (any `threshold` above 1 on a curve with a positive maximum). Raising
/// `threshold` never lowers the returned depth.
pub fn plateau_depth(curve: &RarefactionCurve, threshold: f64) -> Option<u64> {
    let max = curve.values().reduce(f64::max)?;
    let target = threshold * max;
    curve
        .points()
        .find(|&(_, value)| value >= target)
        .map(|(depth, _)| depth)
}

/// Saturation of `curve` in [0, 1] from its final two points.
pub fn saturation(curve: &RarefactionCurve) -> f64 {
    let mut tail = curve.values().rev();
    let (Some(last), Some(prev)) = (tail.next(), tail.next()) else {
        return 0.0;
    };
    let relative_change = if last == 0.0 {
        0.0
    } else {
        (last - prev).abs() / last
    };
    1.0 - relative_change.min(1.0)
}

/// Qualitative saturation level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SaturationBand {
    /// Sequencing captured most of the features.
    Saturated,
    /// Some features may be undetected.
    PartiallySaturated,
    /// Sequencing depth is insufficient.
    Unsaturated,
}

impl fmt::Display for SaturationBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Saturated => "saturated",
            Self::PartiallySaturated => "partially saturated",
            Self::Unsaturated => "unsaturated",
        })
    }
}

/// Saturation, band, and plateau of one curve.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CurveAssessment {
    pub sample_id: String,
    pub saturation: f64,
    pub band: SaturationBand,
    pub plateau_depth: Option<u64>,
}

impl Summarizable for CurveAssessment {
    fn summary(&self) -> String {
        let plateau = match self.plateau_depth {
            Some(d) => format!("plateau at {} sequences", d),
            None => "no plateau reached".to_string(),
        };
        format!(
            "{}: {} ({:.1}% saturation), {}",
            self.sample_id,
            self.band,
            self.saturation * 100.0,
            plateau,
        )
    }
}

/// Assess one curve with the configured thresholds: saturated above
/// `saturated_threshold`, partially saturated above `partial_threshold`.
pub fn assess(curve: &RarefactionCurve, config: &RarefactionConfig) -> CurveAssessment {
    let sat = saturation(curve);
    let band = if sat > config.saturated_threshold {
        SaturationBand::Saturated
    } else if sat > config.partial_threshold {
        SaturationBand::PartiallySaturated
    } else {
        SaturationBand::Unsaturated
    };
    CurveAssessment {
        sample_id: curve.sample_id().to_string(),
        saturation: sat,
        band,
        plateau_depth: plateau_depth(curve, config.plateau_threshold),
    }
}

// ── Depth recommendation ───────────────────────────────────────────────────

/// Result of [`recommend_depth`].
///
/// `recommended_depth` is `None` when no depth qualifies; `rationale` then
/// states why.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DepthRecommendation {
    pub recommended_depth: Option<u64>,
    /// Samples with a value at the chosen depth.
    pub retained: Vec<String>,
    /// Samples lacking a value at the chosen depth.
    pub discarded: Vec<String>,
    /// Mean saturation at the chosen depth.
    pub mean_saturation: Option<f64>,
    /// Fraction of samples retained at the chosen depth.
    pub retention: Option<f64>,
    pub rationale: String,
}

impl DepthRecommendation {
    /// Whether a depth was found.
    pub fn is_success(&self) -> bool {
        self.recommended_depth.is_some()
    }

    fn failure(rationale: String) -> Self {
        Self {
            recommended_depth: None,
            retained: Vec::new(),
            discarded: Vec::new(),
            mean_saturation: None,
            retention: None,
            rationale,
        }
    }
}

impl Summarizable for DepthRecommendation {
    fn summary(&self) -> String {
        self.rationale.clone()
    }
}

/// Recommend a rarefaction depth for `curves`.
///
/// Finding no qualifying depth is a failure outcome, not an error; a
/// `min_retained_fraction` above 1 (or NaN) therefore always fails.
pub fn recommend_depth(
    curves: &[RarefactionCurve],
    min_retained_fraction: f64,
) -> DepthRecommendation {
    if curves.is_empty() {
        return DepthRecommendation::failure("no rarefaction curves were supplied".into());
    }
    if min_retained_fraction.is_nan() {
        return DepthRecommendation::failure(
            "minimum retained fraction is not a number".into(),
        );
    }

    let total = curves.len() as f64;
    let candidates: BTreeSet<u64> = curves.iter().flat_map(|c| c.depths()).collect();

    // (depth, mean saturation, retention, score)
    let mut best: Option<(u64, f64, f64, f64)> = None;
    for &depth in &candidates {
        let present: Vec<&RarefactionCurve> = curves
            .iter()
            .filter(|c| c.value_at(depth).is_some())
            .collect();
        let retention = present.len() as f64 / total;
        if retention < min_retained_fraction {
            continue;
        }
        let mean_sat = present
            .iter()
            .map(|c| saturation(&c.truncated(depth)))
            .sum::<f64>()
            / present.len() as f64;
        let score = mean_sat * retention;
        if best.map_or(true, |(_, _, _, s)| score > s) {
            best = Some((depth, mean_sat, retention, score));
        }
    }

    let Some((depth, mean_sat, retention, score)) = best else {
        return DepthRecommendation::failure(format!(
            "no depth retains at least {:.1}% of the {} samples",
            min_retained_fraction * 100.0,
            curves.len()
        ));
    };

    let (retained, discarded): (Vec<&RarefactionCurve>, Vec<&RarefactionCurve>) =
        curves.iter().partition(|c| c.value_at(depth).is_some());
    log::debug!(
        "recommend_depth: {} candidates, chose {} (score {:.4})",
        candidates.len(),
        depth,
        score
    );

    DepthRecommendation {
        recommended_depth: Some(depth),
        rationale: format!(
            "depth {} gives the best balance of saturation ({:.1}%) and sample retention ({:.1}%, {} of {} samples)",
            depth,
            mean_sat * 100.0,
            retention * 100.0,
            retained.len(),
            curves.len()
        ),
        retained: retained.iter().map(|c| c.sample_id().to_string()).collect(),
        discarded: discarded.iter().map(|c| c.sample_id().to_string()).collect(),
        mean_saturation: Some(mean_sat),
        retention: Some(retention),
    }
}

// ── Aggregate description ──────────────────────────────────────────────────

/// Aggregate statistics over a set of curves.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RarefactionSummary {
    pub sample_count: usize,
    /// Shallowest and deepest depth across all curves.
    pub depth_range: Option<(u64, u64)>,
    pub mean_saturation: Option<f64>,
    pub median_saturation: Option<f64>,
    /// Curves with saturation above the saturated threshold.
    pub saturated_count: usize,
}

impl Summarizable for RarefactionSummary {
    fn summary(&self) -> String {
        let range = self
            .depth_range
            .map_or_else(|| "none".to_string(), |(lo, hi)| format!("{}-{}", lo, hi));
        format!(
            "{} samples, depths {}, mean saturation {:.1}%, {} saturated",
            self.sample_count,
            range,
            self.mean_saturation.unwrap_or(0.0) * 100.0,
            self.saturated_count,
        )
    }
}

/// Describe `curves` with the default saturated threshold (0.95).
pub fn describe(curves: &[RarefactionCurve]) -> RarefactionSummary {
    describe_with(curves, &RarefactionConfig::default())
}

/// Describe `curves`, counting saturation above `config.saturated_threshold`.
pub fn describe_with(curves: &[RarefactionCurve], config: &RarefactionConfig) -> RarefactionSummary {
    let min = curves.iter().filter_map(|c| c.depths().next()).min();
    let max = curves.iter().filter_map(|c| c.depths().next_back()).max();

    let mut sats: Vec<f64> = curves.iter().map(saturation).collect();
    let saturated_count = sats
        .iter()
        .filter(|&&s| s > config.saturated_threshold)
        .count();
    sats.sort_by(|a, b| a.total_cmp(b));
    let (mean_saturation, median_saturation) = if sats.is_empty() {
        (None, None)
    } else {
        (
            Some(sats.iter().sum::<f64>() / sats.len() as f64),
            Some(quantile_sorted(&sats, 0.5)),
        )
    };

    RarefactionSummary {
        sample_count: curves.len(),
        depth_range: min.zip(max),
        mean_saturation,
        median_saturation,
        saturated_count,
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-12;

    fn curve(id: &str, points: &[(u64, f64)]) -> RarefactionCurve {
        RarefactionCurve::new(id, points.iter().copied()).unwrap()
    }

    #[test]
    fn plateau_reaches_threshold() {
        let c = curve("S1", &[(1000, 50.0), (5000, 95.0), (10000, 100.0)]);
        assert_eq!(plateau_depth(&c, 0.95), Some(5000));
        assert_eq!(plateau_depth(&c, 0.96), Some(10000));
        assert_eq!(plateau_depth(&c, 0.0), Some(1000));
    }

    #[test]
    fn plateau_monotonic_in_threshold() {
        let c = curve("S1", &[(10, 3.0), (20, 9.0), (30, 8.0), (40, 12.0), (50, 12.5)]);
        let mut prev = 0;
        for step in 0..=100 {
            let d = plateau_depth(&c, step as f64 / 100.0).unwrap();
            assert!(d >= prev, "threshold {} gave {} < {}", step, d, prev);
            prev = d;
        }
    }

    #[test]
    fn plateau_edge_cases() {
        let empty = curve("E", &[]);
        assert_eq!(plateau_depth(&empty, 0.95), None);
        let c = curve("S1", &[(10, 1.0), (20, 2.0)]);
        assert_eq!(plateau_depth(&c, 1.2), None);
        assert_eq!(plateau_depth(&c, -0.5), Some(10));
    }

    #[test]
    fn saturation_from_tail() {
        let c = curve("S1", &[(1000, 50.0), (5000, 95.0), (10000, 100.0)]);
        assert!((saturation(&c) - 0.95).abs() < TOL);
        // relative change above 1 is capped
        let drop = curve("S2", &[(10, 30.0), (20, 10.0)]);
        assert_eq!(saturation(&drop), 0.0);
        let zero = curve("S3", &[(10, 5.0), (20, 0.0)]);
        assert_eq!(saturation(&zero), 1.0);
        assert_eq!(saturation(&curve("S4", &[(10, 5.0)])), 0.0);
    }

    #[test]
    fn assess_bands() {
        let config = RarefactionConfig::default();
        let flat = curve("A", &[(10, 99.0), (20, 100.0)]);
        let partial = curve("B", &[(10, 90.0), (20, 100.0)]);
        let steep = curve("C", &[(10, 50.0), (20, 100.0)]);
        assert_eq!(assess(&flat, &config).band, SaturationBand::Saturated);
        assert_eq!(
            assess(&partial, &config).band,
            SaturationBand::PartiallySaturated
        );
        let a = assess(&steep, &config);
        assert_eq!(a.band, SaturationBand::Unsaturated);
        assert_eq!(a.plateau_depth, Some(20));
        assert!(a.summary().contains("unsaturated"));
    }

    #[test]
    fn recommend_prefers_saturated_depth_with_retention() {
        let curves = vec![
            curve("S1", &[(100, 10.0), (200, 19.0), (300, 20.0), (400, 20.0)]),
            curve("S2", &[(100, 12.0), (200, 20.0), (300, 21.0), (400, 21.0)]),
            curve("S3", &[(100, 8.0), (200, 15.0), (300, 16.0)]),
        ];
        let rec = recommend_depth(&curves, 0.8);
        // 400 retains only 2/3 < 0.8
        assert_eq!(rec.recommended_depth, Some(300));
        assert_eq!(rec.retained, vec!["S1", "S2", "S3"]);
        assert!(rec.discarded.is_empty());
        assert!(rec.rationale.contains("300"));
        assert!(rec.is_success());
    }

    #[test]
    fn recommend_lists_discarded() {
        let curves = vec![
            curve("S1", &[(100, 10.0), (200, 10.0)]),
            curve("S2", &[(100, 10.0), (200, 10.0)]),
            curve("S3", &[(100, 5.0)]),
        ];
        let rec = recommend_depth(&curves, 0.5);
        assert_eq!(rec.recommended_depth, Some(200));
        assert_eq!(rec.discarded, vec!["S3"]);
        assert!((rec.retention.unwrap() - 2.0 / 3.0).abs() < TOL);
    }

    #[test]
    fn recommend_ties_keep_shallowest() {
        let curves = vec![curve("S1", &[(100, 10.0), (200, 10.0), (300, 10.0)])];
        let rec = recommend_depth(&curves, 1.0);
        assert_eq!(rec.recommended_depth, Some(200));
    }

    #[test]
    fn recommend_all_zero_scores_picks_first_qualifying() {
        let curves = vec![curve("S1", &[(100, 10.0)]), curve("S2", &[(100, 12.0)])];
        let rec = recommend_depth(&curves, 0.8);
        assert_eq!(rec.recommended_depth, Some(100));
        assert_eq!(rec.mean_saturation, Some(0.0));
    }

    #[test]
    fn recommend_fails_without_qualifying_depth() {
        let curves = vec![
            curve("S1", &[(100, 10.0)]),
            curve("S2", &[(200, 10.0)]),
            curve("S3", &[(300, 10.0)]),
        ];
        let rec = recommend_depth(&curves, 0.8);
        assert!(rec.recommended_depth.is_none());
        assert!(!rec.rationale.is_empty());
        assert!(!rec.is_success());
    }

    #[test]
    fn recommend_out_of_range_fraction_fails_softly() {
        let curves = vec![curve("S1", &[(100, 10.0)]), curve("S2", &[(100, 12.0)])];
        let rec = recommend_depth(&curves, 1.2);
        assert_eq!(rec.recommended_depth, None);
        assert!(rec.rationale.contains("120.0%"));
        assert!(!recommend_depth(&curves, f64::NAN).is_success());
        assert_eq!(recommend_depth(&curves, -0.5).recommended_depth, Some(100));
        assert!(!recommend_depth(&[], 0.8).is_success());
    }

    #[test]
    fn describe_set() {
        let curves = vec![
            curve("S1", &[(100, 99.0), (500, 100.0)]),
            curve("S2", &[(50, 50.0), (200, 100.0)]),
        ];
        let d = describe(&curves);
        assert_eq!(d.sample_count, 2);
        assert_eq!(d.depth_range, Some((50, 500)));
        assert!((d.mean_saturation.unwrap() - 0.745).abs() < TOL);
        assert!((d.median_saturation.unwrap() - 0.745).abs() < TOL);
        assert_eq!(d.saturated_count, 1);
    }

    #[test]
    fn describe_empty() {
        let d = describe(&[]);
        assert_eq!(d.sample_count, 0);
        assert!(d.depth_range.is_none());
        assert!(d.mean_saturation.is_none());
    }
}
