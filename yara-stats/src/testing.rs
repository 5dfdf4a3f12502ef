//! Rank-based hypothesis tests on raw samples.
//!
//! [`mann_whitney_u`] compares two independent samples; [`kruskal_wallis`]
//! compares two or more. Both rank the pooled data with mid-ranks and correct
//! for ties. The table-level wrappers with minimum group sizes and rationale
//! text live in [`crate::groups`].

use yara_core::{Result, Scored, Summarizable, YaraError};

use crate::distribution::{chi_squared_sf, normal_sf};
use crate::rank::mid_ranks;

/// Largest smaller-sample size for which the exact U distribution is used.
pub const EXACT_MAX_SMALLER: usize = 8;

/// Result of a hypothesis test.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TestResult {
    /// The test statistic (U or H).
    pub statistic: f64,
    /// Two-sided p-value in [0, 1].
    pub p_value: f64,
    /// Degrees of freedom, if applicable.
    pub degrees_of_freedom: Option<f64>,
    /// Name of the test method.
    pub method: String,
}

impl Scored for TestResult {
    fn score(&self) -> f64 {
        self.p_value
    }
}

impl Summarizable for TestResult {
    fn summary(&self) -> String {
        match self.degrees_of_freedom {
            Some(df) => format!(
                "{}: statistic={:.4}, df={:.1}, p={:.6}",
                self.method, self.statistic, df, self.p_value,
            ),
            None => format!(
                "{}: statistic={:.4}, p={:.6}",
                self.method, self.statistic, self.p_value,
            ),
        }
    }
}

// ── Mann-Whitney U ─────────────────────────────────────────────────────────

/// Two-sided Mann-Whitney U test (Wilcoxon rank-sum).
///
/// The statistic is U for `x`: the number of `(x, y)` pairs with `x > y`,
/// ties counting one half. Without ties and with the smaller sample at most
/// [`EXACT_MAX_SMALLER`] observations the p-value comes from the exact null
/// distribution; otherwise from the normal approximation with tie and
/// continuity corrections.
///
/// # Errors
///
/// Returns [`YaraError::InsufficientSamples`] if either sample is empty.
pub fn mann_whitney_u(x: &[f64], y: &[f64]) -> Result<TestResult> {
    if x.is_empty() || y.is_empty() {
        return Err(YaraError::InsufficientSamples(
            "mann_whitney_u: each sample must be non-empty".into(),
        ));
    }
    let nx = x.len();
    let ny = y.len();
    let n = nx + ny;

    let mut pooled = Vec::with_capacity(n);
    pooled.extend_from_slice(x);
    pooled.extend_from_slice(y);
    let ranking = mid_ranks(&pooled);

    let r1: f64 = ranking.ranks[..nx].iter().sum();
    let u1 = r1 - (nx * (nx + 1)) as f64 / 2.0;
    let mu = (nx * ny) as f64 / 2.0;

    let (p, method) = if !ranking.has_ties() && nx.min(ny) <= EXACT_MAX_SMALLER {
        (exact_two_sided(u1, nx, ny), "Mann-Whitney U test (exact)")
    } else {
        let n_f = n as f64;
        let var = (nx * ny) as f64 / 12.0
            * ((n_f + 1.0) - ranking.tie_term() / (n_f * (n_f - 1.0)));
        let p = if var > 0.0 {
            let z = ((u1 - mu).abs() - 0.5).max(0.0) / var.sqrt();
            2.0 * normal_sf(z)
        } else {
            // Every value tied: no evidence of a shift.
            1.0
        };
        (p, "Mann-Whitney U test")
    };

    Ok(TestResult {
        statistic: u1,
        p_value: p.clamp(0.0, 1.0),
        degrees_of_freedom: None,
        method: method.into(),
    })
}

/// Two-sided exact p-value for an untied U statistic.
fn exact_two_sided(u: f64, nx: usize, ny: usize) -> f64 {
    let freq = u_frequencies(nx.min(ny), nx.max(ny));
    let total: f64 = freq.iter().sum();
    let u = u.round() as usize;
    let lower: f64 = freq[..=u.min(freq.len() - 1)].iter().sum();
    let upper: f64 = freq[u.min(freq.len())..].iter().sum();
    (2.0 * lower.min(upper) / total).min(1.0)
}

/// Number of rank arrangements giving each U value, for samples of sizes `m`
/// and `n`: the coefficients of the Gaussian binomial `[m + n choose m]_q`.
///
/// Built as `Π_{k=1..m} (1 - q^(n+k)) / (1 - q^k)`; after every step the
/// polynomial is again a Gaussian binomial, so each division is exact.
fn u_frequencies(m: usize, n: usize) -> Vec<f64> {
    let mut poly = vec![1.0_f64];
    for k in 1..=m {
        let shift = n + k;
        poly.resize(poly.len() + shift, 0.0);
        for i in (shift..poly.len()).rev() {
            poly[i] -= poly[i - shift];
        }
        for i in k..poly.len() {
            poly[i] += poly[i - k];
        }
        poly.truncate(k * n + 1);
    }
    poly
}

// ── Kruskal-Wallis H ───────────────────────────────────────────────────────

/// Kruskal-Wallis H test across two or more independent samples.
///
/// H is tie-corrected; the p-value is the chi-squared upper tail with
/// `k - 1` degrees of freedom. If every pooled value is tied, H is 0 and the
/// p-value 1.
///
/// # Errors
///
/// Returns [`YaraError::InsufficientSamples`] with fewer than two groups or
/// an empty group.
pub fn kruskal_wallis(groups: &[&[f64]]) -> Result<TestResult> {
    let k = groups.len();
    if k < 2 {
        return Err(YaraError::InsufficientSamples(
            "kruskal_wallis: need at least 2 groups".into(),
        ));
    }
    if let Some(i) = groups.iter().position(|g| g.is_empty()) {
        return Err(YaraError::InsufficientSamples(format!(
            "kruskal_wallis: group {} is empty",
            i
        )));
    }

    let pooled: Vec<f64> = groups.iter().flat_map(|g| g.iter().copied()).collect();
    let n = pooled.len() as f64;
    let ranking = mid_ranks(&pooled);

    let mut offset = 0;
    let mut weighted = 0.0;
    for g in groups {
        let r: f64 = ranking.ranks[offset..offset + g.len()].iter().sum();
        weighted += r * r / g.len() as f64;
        offset += g.len();
    }

    let h_raw = 12.0 / (n * (n + 1.0)) * weighted - 3.0 * (n + 1.0);
    let correction = 1.0 - ranking.tie_term() / (n * n * n - n);
    let df = (k - 1) as f64;

    let (h, p) = if correction <= f64::EPSILON {
        (0.0, 1.0)
    } else {
        let h = (h_raw / correction).max(0.0);
        (h, chi_squared_sf(h, df)?)
    };

    Ok(TestResult {
        statistic: h,
        p_value: p.clamp(0.0, 1.0),
        degrees_of_freedom: Some(df),
        method: "Kruskal-Wallis H test".into(),
    })
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-6;

    #[test]
    fn u_frequencies_small_cases() {
        // m=1, n=3: U ∈ {0,1,2,3}, one arrangement each
        assert_eq!(u_frequencies(1, 3), vec![1.0, 1.0, 1.0, 1.0]);
        // m=2, n=2: [4 choose 2]_q = 1 + q + 2q² + q³ + q⁴
        assert_eq!(u_frequencies(2, 2), vec![1.0, 1.0, 2.0, 1.0, 1.0]);
        let total: f64 = u_frequencies(5, 5).iter().sum();
        assert!((total - 252.0).abs() < 1e-9);
    }

    #[test]
    fn mann_whitney_exact_separated() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [100.0, 101.0, 102.0, 103.0, 104.0];
        let r = mann_whitney_u(&x, &y).unwrap();
        assert_eq!(r.statistic, 0.0);
        // 2 / C(10, 5)
        assert!((r.p_value - 2.0 / 252.0).abs() < TOL, "p={}", r.p_value);
        assert!(r.method.contains("exact"));
    }

    #[test]
    fn mann_whitney_statistic_is_for_first_sample() {
        let x = [10.0, 11.0, 12.0];
        let y = [1.0, 2.0, 3.0];
        let r = mann_whitney_u(&x, &y).unwrap();
        assert_eq!(r.statistic, 9.0);
        let swapped = mann_whitney_u(&y, &x).unwrap();
        assert_eq!(swapped.statistic, 0.0);
        assert!((r.p_value - swapped.p_value).abs() < 1e-12);
    }

    #[test]
    fn mann_whitney_interleaved_not_significant() {
        let x = [1.0, 3.0, 5.0, 7.0, 9.0];
        let y = [2.0, 4.0, 6.0, 8.0, 10.0];
        let r = mann_whitney_u(&x, &y).unwrap();
        assert!(r.p_value > 0.5, "p={}", r.p_value);
    }

    #[test]
    fn mann_whitney_normal_approximation_large() {
        let x: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let y: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();
        let r = mann_whitney_u(&x, &y).unwrap();
        assert!(!r.method.contains("exact"));
        // z = (50 - 0.5) / sqrt(175)
        let z = 49.5 / 175.0_f64.sqrt();
        assert!((r.p_value - 2.0 * normal_sf(z)).abs() < 1e-9);
        assert!(r.p_value < 0.001);
    }

    #[test]
    fn mann_whitney_ties_use_approximation() {
        let x = [1.0, 2.0, 2.0, 3.0];
        let y = [2.0, 3.0, 4.0, 5.0];
        let r = mann_whitney_u(&x, &y).unwrap();
        assert!(!r.method.contains("exact"));
        assert!((0.0..=1.0).contains(&r.p_value));
    }

    #[test]
    fn mann_whitney_all_tied() {
        let r = mann_whitney_u(&[5.0, 5.0, 5.0], &[5.0, 5.0, 5.0]).unwrap();
        assert_eq!(r.p_value, 1.0);
    }

    #[test]
    fn mann_whitney_empty() {
        assert!(mann_whitney_u(&[], &[1.0]).is_err());
        assert!(mann_whitney_u(&[1.0], &[]).is_err());
    }

    #[test]
    fn kruskal_known_value() {
        // Untied, groups of 3: rank sums 6, 15, 24 → H = 7.2
        let a = [1.0, 2.0, 3.0];
        let b = [4.0, 5.0, 6.0];
        let c = [7.0, 8.0, 9.0];
        let r = kruskal_wallis(&[&a, &b, &c]).unwrap();
        assert!((r.statistic - 7.2).abs() < 1e-9);
        assert_eq!(r.degrees_of_freedom, Some(2.0));
        assert!((r.p_value - (-3.6_f64).exp()).abs() < 1e-9);
    }

    #[test]
    fn kruskal_similar_groups() {
        let a = [1.0, 4.0, 7.0, 10.0, 13.0];
        let b = [2.0, 5.0, 8.0, 11.0, 14.0];
        let c = [3.0, 6.0, 9.0, 12.0, 15.0];
        let r = kruskal_wallis(&[&a, &b, &c]).unwrap();
        assert!(r.p_value > 0.5, "p={}", r.p_value);
    }

    #[test]
    fn kruskal_all_tied() {
        let r = kruskal_wallis(&[&[2.0, 2.0], &[2.0, 2.0]]).unwrap();
        assert_eq!(r.statistic, 0.0);
        assert_eq!(r.p_value, 1.0);
    }

    #[test]
    fn kruskal_invalid() {
        assert!(kruskal_wallis(&[&[1.0, 2.0]]).is_err());
        let empty: [f64; 0] = [];
        assert!(kruskal_wallis(&[&empty, &[1.0]]).is_err());
    }

    #[test]
    fn summary_text() {
        let r = kruskal_wallis(&[&[1.0, 2.0], &[3.0, 4.0]]).unwrap();
        let s = r.summary();
        assert!(s.contains("Kruskal-Wallis"));
        assert!(s.contains("df=1.0"));
        assert!((r.score() - r.p_value).abs() < 1e-15);
    }
}
