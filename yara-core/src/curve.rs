//! Depth-vs-richness rarefaction curves.

use std::collections::BTreeMap;

use crate::{Result, YaraError};

/// Observed feature counts of one sample at increasing sequencing depths.
///
/// Depths are positive integers kept in ascending order. A depth at which the
/// sample has no value is simply absent. Values are expected to be
/// non-decreasing; a drop is a data-quality signal (see
/// [`monotonicity_violations`](Self::monotonicity_violations)), not an error.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "CurveParts"))]
pub struct RarefactionCurve {
    sample_id: String,
    points: BTreeMap<u64, f64>,
}

impl RarefactionCurve {
    /// Build a curve from `(depth, observed)` pairs in any order.
    ///
    /// # Errors
    ///
    /// Returns [`YaraError::MalformedInput`] for a zero depth, a repeated
    /// depth, or a negative / non-finite value.
    pub fn new(
        sample_id: impl Into<String>,
        points: impl IntoIterator<Item = (u64, f64)>,
    ) -> Result<Self> {
        let sample_id = sample_id.into();
        let mut map = BTreeMap::new();
        for (depth, value) in points {
            if depth == 0 {
                return Err(YaraError::MalformedInput(format!(
                    "sample '{}': depth must be a positive integer",
                    sample_id
                )));
            }
            if !value.is_finite() || value < 0.0 {
                return Err(YaraError::MalformedInput(format!(
                    "sample '{}': observed count {} at depth {} must be finite and non-negative",
                    sample_id, value, depth
                )));
            }
            if map.insert(depth, value).is_some() {
                return Err(YaraError::MalformedInput(format!(
                    "sample '{}': depth {} listed twice",
                    sample_id, depth
                )));
            }
        }
        Ok(Self {
            sample_id,
            points: map,
        })
    }

    /// Sample identifier.
    pub fn sample_id(&self) -> &str {
        &self.sample_id
    }

    /// Number of depth points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the curve has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Observed value at `depth`, if defined.
    pub fn value_at(&self, depth: u64) -> Option<f64> {
        self.points.get(&depth).copied()
    }

    /// `(depth, value)` pairs in ascending depth order.
    pub fn points(&self) -> impl DoubleEndedIterator<Item = (u64, f64)> + '_ {
        self.points.iter().map(|(&d, &v)| (d, v))
    }

    /// Depths in ascending order.
    pub fn depths(&self) -> impl DoubleEndedIterator<Item = u64> + '_ {
        self.points.keys().copied()
    }

    /// Values in ascending depth order.
    pub fn values(&self) -> impl DoubleEndedIterator<Item = f64> + '_ {
        self.points.values().copied()
    }

    /// The curve restricted to depths `<= depth`.
    pub fn truncated(&self, depth: u64) -> Self {
        Self {
            sample_id: self.sample_id.clone(),
            points: self.points.range(..=depth).map(|(&d, &v)| (d, v)).collect(),
        }
    }

    /// Depths at which the value is lower than at the preceding depth.
    pub fn monotonicity_violations(&self) -> Vec<u64> {
        let mut out = Vec::new();
        let mut prev: Option<f64> = None;
        for (depth, value) in self.points() {
            if let Some(p) = prev {
                if value < p {
                    out.push(depth);
                }
            }
            prev = Some(value);
        }
        out
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

/// Serialized form, validated through [`RarefactionCurve::new`].
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct CurveParts {
    sample_id: String,
    points: BTreeMap<u64, f64>,
}

#[cfg(feature = "serde")]
impl TryFrom<CurveParts> for RarefactionCurve {
    type Error = YaraError;

    fn try_from(parts: CurveParts) -> Result<Self> {
        Self::new(parts.sample_id, parts.points)
    }
}
