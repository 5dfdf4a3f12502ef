//! Validated pairwise sample-distance matrices.

use std::collections::HashSet;

use crate::{Result, YaraError};

/// Absolute tolerance for symmetry and zero-diagonal checks.
pub const SYMMETRY_TOLERANCE: f64 = 1e-8;

/// Square, symmetric, zero-diagonal matrix of non-negative distances indexed
/// by sample identifiers on both axes.
///
/// Immutable once constructed; every analyzer borrows it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "MatrixParts"))]
pub struct DistanceMatrix {
    ids: Vec<String>,
    /// Row-major `n × n` values.
    values: Vec<f64>,
}

impl DistanceMatrix {
    /// Build a matrix from sample identifiers and rows.
    ///
    /// # Errors
    ///
    /// Returns [`YaraError::MalformedInput`] if the rows are not `n × n`, an
    /// identifier repeats, a value is negative or non-finite, the diagonal is
    /// not zero, or the matrix is not symmetric (within
    /// [`SYMMETRY_TOLERANCE`]).
    pub fn new(ids: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self> {
        let n = ids.len();
        if rows.len() != n {
            return Err(YaraError::MalformedInput(format!(
                "distance matrix has {} rows for {} sample identifiers",
                rows.len(),
                n
            )));
        }
        let mut seen = HashSet::with_capacity(n);
        for id in &ids {
            if !seen.insert(id.as_str()) {
                return Err(YaraError::MalformedInput(format!(
                    "duplicate sample identifier '{}' in distance matrix",
                    id
                )));
            }
        }

        let mut values = Vec::with_capacity(n * n);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != n {
                return Err(YaraError::MalformedInput(format!(
                    "distance matrix row '{}' has {} columns, expected {}",
                    ids[i],
                    row.len(),
                    n
                )));
            }
            values.extend(row);
        }

        for i in 0..n {
            let d = values[i * n + i];
            if d.abs() > SYMMETRY_TOLERANCE {
                return Err(YaraError::MalformedInput(format!(
                    "distance matrix diagonal at '{}' is {}, expected 0",
                    ids[i], d
                )));
            }
            for j in 0..n {
                let v = values[i * n + j];
                if !v.is_finite() || v < 0.0 {
                    return Err(YaraError::MalformedInput(format!(
                        "distance between '{}' and '{}' is {}; distances must be finite and non-negative",
                        ids[i], ids[j], v
                    )));
                }
                if j > i && (v - values[j * n + i]).abs() > SYMMETRY_TOLERANCE {
                    return Err(YaraError::MalformedInput(format!(
                        "distance matrix is not symmetric at ('{}', '{}')",
                        ids[i], ids[j]
                    )));
                }
            }
        }

        Ok(Self { ids, values })
    }

    /// Sample identifiers in axis order.
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the matrix has no samples.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Distance between the samples at positions `i` and `j`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.ids.len() + j]
    }

    /// Position of a sample on the axes.
    pub fn index_of(&self, sample_id: &str) -> Option<usize> {
        self.ids.iter().position(|id| id == sample_id)
    }

    /// Row `i` as a slice.
    pub fn row(&self, i: usize) -> &[f64] {
        let n = self.ids.len();
        &self.values[i * n..(i + 1) * n]
    }

    /// Strict upper triangle (`i < j`), row by row.
    pub fn upper_triangle(&self) -> Vec<f64> {
        let n = self.ids.len();
        let mut out = Vec::with_capacity(n * n.saturating_sub(1) / 2);
        for i in 0..n {
            for j in (i + 1)..n {
                out.push(self.values[i * n + j]);
            }
        }
        out
    }

    /// Copy out as nested rows.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        (0..self.ids.len()).map(|i| self.row(i).to_vec()).collect()
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

/// Serialized form, validated through [`DistanceMatrix::new`].
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct MatrixParts {
    ids: Vec<String>,
    values: Vec<f64>,
}

#[cfg(feature = "serde")]
impl TryFrom<MatrixParts> for DistanceMatrix {
    type Error = YaraError;

    fn try_from(parts: MatrixParts) -> Result<Self> {
        let n = parts.ids.len();
        if parts.values.len() != n * n {
            return Err(YaraError::MalformedInput(format!(
                "distance matrix has {} values for {} sample identifiers",
                parts.values.len(),
                n
            )));
        }
        let rows = if n == 0 {
            Vec::new()
        } else {
            parts.values.chunks(n).map(<[f64]>::to_vec).collect()
        };
        Self::new(parts.ids, rows)
    }
}
