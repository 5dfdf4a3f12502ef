//! Distance-preserving embeddings of inter-sample distance matrices.
//!
//! - **SMACOF**: metric multidimensional scaling by stress majorization
//!   (Guttman transform) from a seeded random start
//! - **PCoA**: Principal Coordinates Analysis (classical multidimensional
//!   scaling) via Jacobi eigendecomposition
//!
//! Both report whether they converged; the retry policy lives with the
//! caller in [`crate::beta`].

use yara_core::{DistanceMatrix, Result, YaraError};

// ── SMACOF ──────────────────────────────────────────────────────────────────

/// Configuration for SMACOF.
#[derive(Debug, Clone)]
pub struct SmacofConfig {
    /// Number of dimensions for embedding.
    pub n_dims: usize,
    /// Maximum iterations.
    pub max_iter: usize,
    /// Convergence tolerance for the per-iteration improvement of stress-1.
    pub tolerance: f64,
    /// Random seed for initialization.
    pub seed: u64,
}

impl Default for SmacofConfig {
    fn default() -> Self {
        Self {
            n_dims: 2,
            max_iter: 1000,
            tolerance: 1e-5,
            seed: 42,
        }
    }
}

/// Result of SMACOF.
#[derive(Debug, Clone)]
pub struct SmacofResult {
    /// Sample coordinates. Shape: `n_samples × n_dims`.
    pub coordinates: Vec<Vec<f64>>,
    /// Final Kruskal stress-1 value.
    pub stress: f64,
    /// Number of iterations performed.
    pub n_iterations: usize,
    /// Whether the algorithm converged within tolerance.
    pub converged: bool,
}

/// Metric multidimensional scaling by stress majorization.
///
/// Minimizes raw stress `Σ_{i<j} (d_ij(X) - δ_ij)²` by repeated Guttman
/// transforms `X ← (1/n) B(X) X`, which never increase stress. Progress is
/// tracked with stress-1 `sqrt(raw / Σ δ²)`; the run converges once an
/// iteration improves it by less than `tolerance`.
///
/// A matrix of all-zero distances embeds every sample at the origin.
///
/// # Errors
///
/// Returns an error if the matrix has fewer than 2 samples or `n_dims` is 0.
pub fn smacof(distances: &DistanceMatrix, config: &SmacofConfig) -> Result<SmacofResult> {
    let n = distances.len();
    if n < 2 {
        return Err(YaraError::InsufficientSamples(
            "smacof: at least 2 samples required".into(),
        ));
    }
    if config.n_dims == 0 {
        return Err(YaraError::MalformedInput(
            "smacof: n_dims must be > 0".into(),
        ));
    }

    let d = config.n_dims;
    let denom: f64 = distances.upper_triangle().iter().map(|v| v * v).sum();
    if denom == 0.0 {
        return Ok(SmacofResult {
            coordinates: vec![vec![0.0; d]; n],
            stress: 0.0,
            n_iterations: 0,
            converged: true,
        });
    }

    let mut rng = Xorshift64::new(config.seed);
    let mut coords = vec![vec![0.0; d]; n];
    for row in &mut coords {
        for val in row.iter_mut() {
            *val = rng.next_unit() * 2.0 - 1.0;
        }
    }

    let mut prev_stress = f64::INFINITY;
    let mut converged = false;
    let mut n_iterations = 0;
    let mut embed = pairwise_distances(&coords);

    for iter in 0..config.max_iter {
        n_iterations = iter + 1;
        let stress = stress_1(distances, &embed, denom);
        if prev_stress - stress < config.tolerance || stress < 1e-12 {
            converged = true;
            prev_stress = stress;
            break;
        }
        prev_stress = stress;

        coords = guttman_transform(distances, &embed, &coords);
        embed = pairwise_distances(&coords);
    }

    let stress = if converged {
        prev_stress
    } else {
        stress_1(distances, &embed, denom)
    };
    log::debug!(
        "smacof: seed={} iterations={} stress={:.6} converged={}",
        config.seed,
        n_iterations,
        stress,
        converged
    );

    Ok(SmacofResult {
        coordinates: coords,
        stress,
        n_iterations,
        converged,
    })
}

/// `X ← (1/n) B(X) X` with `B_ij = -δ_ij / d_ij(X)` off the diagonal (0 where
/// `d_ij(X)` vanishes) and `B_ii = -Σ_{j≠i} B_ij`.
fn guttman_transform(
    distances: &DistanceMatrix,
    embed: &[f64],
    coords: &[Vec<f64>],
) -> Vec<Vec<f64>> {
    let n = coords.len();
    let d = coords[0].len();
    let mut b = vec![0.0; n * n];
    for i in 0..n {
        let mut diag = 0.0;
        for j in 0..n {
            if i == j {
                continue;
            }
            let dij = embed[i * n + j];
            if dij > 1e-15 {
                let v = -distances.get(i, j) / dij;
                b[i * n + j] = v;
                diag -= v;
            }
        }
        b[i * n + i] = diag;
    }

    let mut next = vec![vec![0.0; d]; n];
    for i in 0..n {
        for j in 0..n {
            let bij = b[i * n + j];
            if bij == 0.0 {
                continue;
            }
            for k in 0..d {
                next[i][k] += bij * coords[j][k];
            }
        }
        for val in next[i].iter_mut() {
            *val /= n as f64;
        }
    }
    next
}

fn stress_1(distances: &DistanceMatrix, embed: &[f64], denom: f64) -> f64 {
    let n = distances.len();
    let mut raw = 0.0;
    for i in 0..n {
        for j in (i + 1)..n {
            let diff = embed[i * n + j] - distances.get(i, j);
            raw += diff * diff;
        }
    }
    (raw / denom).sqrt()
}

/// Row-major `n × n` Euclidean distances between coordinate rows.
fn pairwise_distances(coords: &[Vec<f64>]) -> Vec<f64> {
    let n = coords.len();
    let mut out = vec![0.0; n * n];
    for i in 0..n {
        for j in (i + 1)..n {
            let d2: f64 = coords[i]
                .iter()
                .zip(&coords[j])
                .map(|(a, b)| (a - b) * (a - b))
                .sum();
            let dist = d2.sqrt();
            out[i * n + j] = dist;
            out[j * n + i] = dist;
        }
    }
    out
}

// ── PCoA ────────────────────────────────────────────────────────────────────

/// Result of Principal Coordinates Analysis.
#[derive(Debug, Clone)]
pub struct PcoaResult {
    /// Sample coordinates in ordination space. Shape: `n_samples × n_components`.
    pub coordinates: Vec<Vec<f64>>,
    /// Eigenvalues of the retained axes, descending.
    pub eigenvalues: Vec<f64>,
    /// Fraction of the positive eigenvalue mass carried by each retained axis.
    pub proportion_explained: Vec<f64>,
    /// Number of negative eigenvalues encountered (non-Euclidean input).
    pub n_negative_eigenvalues: usize,
    /// Jacobi sweeps performed.
    pub n_sweeps: usize,
    /// Whether the off-diagonal mass fell below tolerance.
    pub converged: bool,
}

/// Principal Coordinates Analysis (classical MDS).
///
/// # Algorithm
///
/// 1. Double-center the squared distances: `G = -½ (D² - row_mean - col_mean + grand_mean)`
/// 2. Eigendecompose G with cyclic Jacobi rotations
/// 3. Coordinates = eigenvector × √max(λ, 0), axes by descending eigenvalue
///
/// The decomposition has converged once the off-diagonal Frobenius norm is
/// at most `tolerance` times the norm of G. The result is deterministic.
///
/// # Errors
///
/// Returns an error if the matrix has fewer than 2 samples or
/// `n_components` is outside `[1, n_samples]`.
pub fn pcoa(
    distances: &DistanceMatrix,
    n_components: usize,
    max_sweeps: usize,
    tolerance: f64,
) -> Result<PcoaResult> {
    let n = distances.len();
    if n < 2 {
        return Err(YaraError::InsufficientSamples(
            "pcoa: at least 2 samples required".into(),
        ));
    }
    if n_components == 0 || n_components > n {
        return Err(YaraError::MalformedInput(format!(
            "pcoa: n_components ({}) must be in [1, {}]",
            n_components, n
        )));
    }

    let mut g = vec![0.0; n * n];
    for i in 0..n {
        for j in 0..n {
            let v = distances.get(i, j);
            g[i * n + j] = -0.5 * v * v;
        }
    }
    double_center(&mut g, n);

    let (eigenvalues, eigenvectors, n_sweeps, converged) =
        jacobi_eigen(&g, n, max_sweeps, tolerance);

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| eigenvalues[b].total_cmp(&eigenvalues[a]));
    let sorted: Vec<f64> = order.iter().map(|&i| eigenvalues[i]).collect();

    let n_negative = sorted.iter().filter(|&&e| e < -1e-10).count();
    let total_positive: f64 = sorted.iter().filter(|&&e| e > 0.0).sum();
    let proportion_explained: Vec<f64> = sorted
        .iter()
        .take(n_components)
        .map(|&e| {
            if total_positive > 0.0 && e > 0.0 {
                e / total_positive
            } else {
                0.0
            }
        })
        .collect();

    // coord[i][k] = eigenvector_k[i] * sqrt(max(eigenvalue_k, 0))
    let mut coordinates = vec![vec![0.0; n_components]; n];
    for (k, &col) in order.iter().take(n_components).enumerate() {
        let scale = sorted[k].max(0.0).sqrt();
        for (i, row) in coordinates.iter_mut().enumerate() {
            row[k] = eigenvectors[i * n + col] * scale;
        }
    }

    log::debug!(
        "pcoa: sweeps={} converged={} negative_eigenvalues={}",
        n_sweeps,
        converged,
        n_negative
    );

    Ok(PcoaResult {
        coordinates,
        eigenvalues: sorted[..n_components].to_vec(),
        proportion_explained,
        n_negative_eigenvalues: n_negative,
        n_sweeps,
        converged,
    })
}

/// Cyclic Jacobi eigendecomposition of a symmetric row-major matrix.
///
/// Returns `(eigenvalues, eigenvectors, sweeps, converged)`; eigenvector `k`
/// is column `k` of the row-major `n × n` result.
fn jacobi_eigen(
    matrix: &[f64],
    n: usize,
    max_sweeps: usize,
    tolerance: f64,
) -> (Vec<f64>, Vec<f64>, usize, bool) {
    let mut a = matrix.to_vec();
    let mut v = vec![0.0; n * n];
    for i in 0..n {
        v[i * n + i] = 1.0;
    }

    let norm: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let threshold = tolerance * norm;
    let mut sweeps = 0;
    let mut converged = false;

    loop {
        let off_diag: f64 = (0..n)
            .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
            .map(|(i, j)| 2.0 * a[i * n + j] * a[i * n + j])
            .sum::<f64>()
            .sqrt();
        if off_diag <= threshold {
            converged = true;
            break;
        }
        if sweeps == max_sweeps {
            break;
        }
        sweeps += 1;

        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a[p * n + q];
                if apq.abs() < 1e-300 {
                    continue;
                }

                let app = a[p * n + p];
                let aqq = a[q * n + q];
                let tau = (aqq - app) / (2.0 * apq);
                let t = if tau.abs() > 1e15 {
                    1.0 / (2.0 * tau)
                } else {
                    let sign = if tau >= 0.0 { 1.0 } else { -1.0 };
                    sign / (tau.abs() + (1.0 + tau * tau).sqrt())
                };
                let c = 1.0 / (1.0 + t * t).sqrt();
                let s = t * c;

                a[p * n + p] = app - t * apq;
                a[q * n + q] = aqq + t * apq;
                a[p * n + q] = 0.0;
                a[q * n + p] = 0.0;

                for r in 0..n {
                    if r != p && r != q {
                        let arp = a[r * n + p];
                        let arq = a[r * n + q];
                        a[r * n + p] = c * arp - s * arq;
                        a[p * n + r] = a[r * n + p];
                        a[r * n + q] = s * arp + c * arq;
                        a[q * n + r] = a[r * n + q];
                    }
                }

                for r in 0..n {
                    let vrp = v[r * n + p];
                    let vrq = v[r * n + q];
                    v[r * n + p] = c * vrp - s * vrq;
                    v[r * n + q] = s * vrp + c * vrq;
                }
            }
        }
    }

    let eigenvalues = (0..n).map(|i| a[i * n + i]).collect();
    (eigenvalues, v, sweeps, converged)
}

fn double_center(matrix: &mut [f64], n: usize) {
    let mut row_means = vec![0.0; n];
    let mut col_means = vec![0.0; n];
    let mut grand_mean = 0.0;

    for i in 0..n {
        for j in 0..n {
            let v = matrix[i * n + j];
            row_means[i] += v;
            col_means[j] += v;
            grand_mean += v;
        }
    }
    for m in row_means.iter_mut() {
        *m /= n as f64;
    }
    for m in col_means.iter_mut() {
        *m /= n as f64;
    }
    grand_mean /= (n * n) as f64;

    for i in 0..n {
        for j in 0..n {
            matrix[i * n + j] = matrix[i * n + j] - row_means[i] - col_means[j] + grand_mean;
        }
    }
}

// ── Internal helpers ────────────────────────────────────────────────────────

struct Xorshift64 {
    state: u64,
}

impl Xorshift64 {
    fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Uniform in [0, 1].
    fn next_unit(&mut self) -> f64 {
        self.next_u64() as f64 / u64::MAX as f64
    }
}
