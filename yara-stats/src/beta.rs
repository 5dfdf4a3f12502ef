//! Beta diversity: distance-matrix statistics, ordination, and neighbours.

use yara_core::{
    DistanceMatrix, OrdinationConfig, OrdinationMethod, Result, Summarizable, YaraError,
};

use crate::descriptive::{mean, quantile_sorted, std_dev};
use crate::ordination::{pcoa, smacof, SmacofConfig};

// ── Distance statistics ────────────────────────────────────────────────────

/// Summary of the pairwise distances of a matrix.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DistanceStats {
    /// Number of distinct sample pairs.
    pub n_pairs: usize,
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation (ddof=0).
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl Summarizable for DistanceStats {
    fn summary(&self) -> String {
        format!(
            "{} pairs: mean={:.4}, median={:.4}, std={:.4}, range=[{:.4}, {:.4}]",
            self.n_pairs, self.mean, self.median, self.std_dev, self.min, self.max,
        )
    }
}

/// Statistics over the strict upper triangle of `matrix`.
///
/// Each unordered pair is counted once and the zero diagonal is excluded.
///
/// # Errors
///
/// Returns [`YaraError::InsufficientSamples`] with fewer than 2 samples.
pub fn distance_stats(matrix: &DistanceMatrix) -> Result<DistanceStats> {
    let mut pairs = matrix.upper_triangle();
    if pairs.is_empty() {
        return Err(YaraError::InsufficientSamples(
            "distance_stats: at least 2 samples required".into(),
        ));
    }
    pairs.sort_by(|a, b| a.total_cmp(b));

    Ok(DistanceStats {
        n_pairs: pairs.len(),
        mean: mean(&pairs)?,
        median: quantile_sorted(&pairs, 0.5),
        std_dev: std_dev(&pairs, 0)?,
        min: pairs[0],
        max: pairs[pairs.len() - 1],
    })
}

// ── Ordination ─────────────────────────────────────────────────────────────

/// Low-dimensional embedding of the samples of a distance matrix.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ordination {
    /// Sample identifiers, one per coordinate row.
    pub sample_ids: Vec<String>,
    /// Axis labels `PC1`, `PC2`, ...
    pub axis_labels: Vec<String>,
    /// Coordinates. Shape: `n_samples × dimensions`.
    pub coordinates: Vec<Vec<f64>>,
    /// Strategy that produced the embedding.
    pub method: OrdinationMethod,
    /// Seed of the successful attempt (SMACOF only).
    pub seed_used: Option<u64>,
    /// Final stress-1 (SMACOF only).
    pub stress: Option<f64>,
    /// Share of positive eigenvalue mass per axis (PCoA only).
    pub proportion_explained: Option<Vec<f64>>,
    /// Iterations (SMACOF) or Jacobi sweeps (PCoA) of the successful attempt.
    pub iterations: usize,
}

impl Ordination {
    /// Coordinates of `sample_id`.
    pub fn coordinates_of(&self, sample_id: &str) -> Option<&[f64]> {
        self.sample_ids
            .iter()
            .position(|id| id == sample_id)
            .map(|i| self.coordinates[i].as_slice())
    }
}

impl Summarizable for Ordination {
    fn summary(&self) -> String {
        let method = match self.method {
            OrdinationMethod::Smacof => "SMACOF",
            OrdinationMethod::Pcoa => "PCoA",
        };
        let fit = match (self.stress, &self.proportion_explained) {
            (Some(s), _) => format!(", stress={:.4}", s),
            (None, Some(p)) => format!(", explained={:.1}%", p.iter().sum::<f64>() * 100.0),
            (None, None) => String::new(),
        };
        format!(
            "{} ordination: {} samples × {} axes{}",
            method,
            self.sample_ids.len(),
            self.axis_labels.len(),
            fit,
        )
    }
}

/// Embed the samples of `matrix` in `dimensions` axes.
///
/// Repeated calls with the same input and configuration return identical
/// coordinates. If the first attempt does not converge it is retried once
/// (SMACOF with [`OrdinationConfig::retry_seed`], PCoA with twice the sweep
/// budget); a second failure is a [`YaraError::Computation`].
///
/// # Errors
///
/// Returns [`YaraError::InsufficientSamples`] with fewer than 2 samples and
/// [`YaraError::MalformedInput`] if `dimensions` is outside `[1, n_samples]`
/// or the configuration is invalid.
pub fn ordinate(
    matrix: &DistanceMatrix,
    dimensions: usize,
    config: &OrdinationConfig,
) -> Result<Ordination> {
    let n = matrix.len();
    if n < 2 {
        return Err(YaraError::InsufficientSamples(
            "ordinate: at least 2 samples required".into(),
        ));
    }
    if dimensions == 0 || dimensions > n {
        return Err(YaraError::MalformedInput(format!(
            "ordinate: dimensions ({}) must be in [1, {}]",
            dimensions, n
        )));
    }
    config.validate()?;

    let axis_labels = (1..=dimensions).map(|k| format!("PC{}", k)).collect();
    let sample_ids = matrix.ids().to_vec();

    match config.method {
        OrdinationMethod::Smacof => {
            let mut attempt = SmacofConfig {
                n_dims: dimensions,
                max_iter: config.max_iter,
                tolerance: config.tolerance,
                seed: config.seed,
            };
            let mut result = smacof(matrix, &attempt)?;
            if !result.converged {
                log::warn!(
                    "smacof did not converge with seed {} after {} iterations; retrying with seed {}",
                    attempt.seed,
                    result.n_iterations,
                    config.retry_seed()
                );
                attempt.seed = config.retry_seed();
                result = smacof(matrix, &attempt)?;
            }
            if !result.converged {
                return Err(YaraError::Computation(format!(
                    "ordination did not converge within {} iterations (seeds {} and {})",
                    config.max_iter,
                    config.seed,
                    config.retry_seed()
                )));
            }
            Ok(Ordination {
                sample_ids,
                axis_labels,
                coordinates: result.coordinates,
                method: OrdinationMethod::Smacof,
                seed_used: Some(attempt.seed),
                stress: Some(result.stress),
                proportion_explained: None,
                iterations: result.n_iterations,
            })
        }
        OrdinationMethod::Pcoa => {
            let mut sweeps = config.max_iter;
            let mut result = pcoa(matrix, dimensions, sweeps, config.tolerance)?;
            if !result.converged {
                sweeps = sweeps.saturating_mul(2);
                log::warn!(
                    "pcoa eigendecomposition did not converge; retrying with {} sweeps",
                    sweeps
                );
                result = pcoa(matrix, dimensions, sweeps, config.tolerance)?;
            }
            if !result.converged {
                return Err(YaraError::Computation(format!(
                    "pcoa eigendecomposition did not converge within {} sweeps",
                    sweeps
                )));
            }
            Ok(Ordination {
                sample_ids,
                axis_labels,
                coordinates: result.coordinates,
                method: OrdinationMethod::Pcoa,
                seed_used: None,
                stress: None,
                proportion_explained: Some(result.proportion_explained),
                iterations: result.n_sweeps,
            })
        }
    }
}

// ── Nearest samples ────────────────────────────────────────────────────────

/// A sample and its distance from the query sample.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Neighbor {
    pub sample_id: String,
    pub distance: f64,
}

/// The `n` samples closest to `sample_id`, nearest first.
///
/// The query sample itself is excluded. Equal distances keep matrix column
/// order. Fewer than `n` neighbours are returned when the matrix is small.
///
/// # Errors
///
/// Returns [`YaraError::MissingData`] if `sample_id` is not in the matrix.
pub fn nearest_samples(matrix: &DistanceMatrix, sample_id: &str, n: usize) -> Result<Vec<Neighbor>> {
    let idx = matrix.index_of(sample_id).ok_or_else(|| {
        YaraError::MissingData(format!("sample '{}' not found in distance matrix", sample_id))
    })?;

    let mut others: Vec<(usize, f64)> = matrix
        .row(idx)
        .iter()
        .copied()
        .enumerate()
        .filter(|&(j, _)| j != idx)
        .collect();
    // sort_by is stable, so ties stay in column order
    others.sort_by(|a, b| a.1.total_cmp(&b.1));

    Ok(others
        .into_iter()
        .take(n)
        .map(|(j, distance)| Neighbor {
            sample_id: matrix.ids()[j].clone(),
            distance,
        })
        .collect())
}

// ── Tests ──────────────────────────────────────────────────────────────────
