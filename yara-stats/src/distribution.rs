//! Reference distributions for p-value computation.
//!
//! Only what the rank tests need: the standard normal (Mann-Whitney's large
//! sample approximation) and the chi-squared upper tail (Kruskal-Wallis).

use core::f64::consts::{PI, SQRT_2};

use yara_core::{Result, YaraError};

// ── Numerical helpers ──────────────────────────────────────────────────────

/// Error function via Abramowitz & Stegun 7.1.26 (max error ~1.5e-7).
pub fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + 0.3275911 * x);
    let poly = t
        * (0.254829592
            + t * (-0.284496736 + t * (1.421413741 + t * (-1.453152027 + t * 1.061405429))));
    sign * (1.0 - poly * (-x * x).exp())
}

/// Natural log of the gamma function via the Lanczos approximation (g=7).
pub fn ln_gamma(x: f64) -> f64 {
    const COEFFS: [f64; 8] = [
        676.5203681218851,
        -1259.1392167224028,
        771.32342877765313,
        -176.61502916214059,
        12.507343278686905,
        -0.13857109526572012,
        9.9843695780195716e-6,
        1.5056327351493116e-7,
    ];

    if x < 0.5 {
        // Reflection: Γ(x) = π / (sin(πx) · Γ(1-x))
        (PI / (PI * x).sin()).ln() - ln_gamma(1.0 - x)
    } else {
        let x = x - 1.0;
        let mut ag = 0.99999999999980993_f64;
        for (i, &c) in COEFFS.iter().enumerate() {
            ag += c / (x + i as f64 + 1.0);
        }
        let t = x + 7.5;
        0.5 * (2.0 * PI).ln() + (x + 0.5) * t.ln() - t + ag.ln()
    }
}

/// Regularized upper incomplete gamma function Q(a, x) = Γ(a, x) / Γ(a).
///
/// Series expansion of P when `x < a + 1`, continued fraction for Q
/// otherwise, so the tail keeps its relative precision.
pub fn gamma_q(a: f64, x: f64) -> Result<f64> {
    if a <= 0.0 {
        return Err(YaraError::MalformedInput("gamma_q: a must be positive".into()));
    }
    if x < 0.0 || x.is_nan() {
        return Err(YaraError::MalformedInput(
            "gamma_q: x must be non-negative".into(),
        ));
    }
    if x == 0.0 {
        return Ok(1.0);
    }
    if x < a + 1.0 {
        Ok((1.0 - gamma_p_series(a, x)).clamp(0.0, 1.0))
    } else {
        Ok(gamma_q_fraction(a, x).clamp(0.0, 1.0))
    }
}

fn gamma_p_series(a: f64, x: f64) -> f64 {
    let ln_prefix = a * x.ln() - x - ln_gamma(a);
    let mut sum = 1.0 / a;
    let mut term = sum;
    for n in 1..=500 {
        term *= x / (a + n as f64);
        sum += term;
        if term.abs() < sum.abs() * 1e-14 {
            break;
        }
    }
    sum * ln_prefix.exp()
}

/// Modified Lentz evaluation of the continued fraction for Q(a, x).
fn gamma_q_fraction(a: f64, x: f64) -> f64 {
    let tiny = 1e-300_f64;
    let ln_prefix = a * x.ln() - x - ln_gamma(a);

    let mut b = x + 1.0 - a;
    let mut c = 1.0 / tiny;
    let mut d = 1.0 / b;
    let mut h = d;
    for i in 1..=500 {
        let an = -(i as f64) * (i as f64 - a);
        b += 2.0;
        d = an * d + b;
        if d.abs() < tiny {
            d = tiny;
        }
        c = b + an / c;
        if c.abs() < tiny {
            c = tiny;
        }
        d = 1.0 / d;
        let delta = d * c;
        h *= delta;
        if (delta - 1.0).abs() < 1e-14 {
            break;
        }
    }
    h * ln_prefix.exp()
}

// ── Standard normal ────────────────────────────────────────────────────────

/// Standard normal CDF Φ(z).
pub fn normal_cdf(z: f64) -> f64 {
    (0.5 * (1.0 + erf(z / SQRT_2))).clamp(0.0, 1.0)
}

/// Standard normal survival function 1 - Φ(z).
pub fn normal_sf(z: f64) -> f64 {
    normal_cdf(-z)
}

// ── Chi-squared ────────────────────────────────────────────────────────────

/// Upper tail P(X > x) of a chi-squared distribution with `df` degrees of
/// freedom.
pub fn chi_squared_sf(x: f64, df: f64) -> Result<f64> {
    if df <= 0.0 {
        return Err(YaraError::MalformedInput(
            "chi_squared_sf: degrees of freedom must be positive".into(),
        ));
    }
    if x <= 0.0 {
        return Ok(1.0);
    }
    gamma_q(df / 2.0, x / 2.0)
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn erf_known_values() {
        assert!(erf(0.0).abs() < 1e-7);
        assert!((erf(1.0) - 0.8427007929).abs() < 1e-6);
        assert!((erf(-1.0) + 0.8427007929).abs() < 1e-6);
    }

    #[test]
    fn ln_gamma_factorials() {
        // Γ(5) = 24
        assert!((ln_gamma(5.0) - 24.0_f64.ln()).abs() < 1e-10);
        // Γ(0.5) = √π
        assert!((ln_gamma(0.5) - PI.sqrt().ln()).abs() < 1e-10);
    }

    #[test]
    fn normal_tails() {
        assert!((normal_cdf(0.0) - 0.5).abs() < 1e-7);
        assert!((normal_sf(1.959964) - 0.025).abs() < 1e-5);
        assert!((normal_cdf(-1.959964) - 0.025).abs() < 1e-5);
    }

    #[test]
    fn chi_squared_critical_values() {
        // 95th percentiles: df=1 → 3.841, df=2 → 5.991, df=4 → 9.488
        assert!((chi_squared_sf(3.841459, 1.0).unwrap() - 0.05).abs() < 1e-5);
        assert!((chi_squared_sf(5.991465, 2.0).unwrap() - 0.05).abs() < 1e-5);
        assert!((chi_squared_sf(9.487729, 4.0).unwrap() - 0.05).abs() < 1e-5);
    }

    #[test]
    fn chi_squared_df2_is_exponential() {
        for &x in &[0.5, 2.0, 10.0, 40.0] {
            let expected = (-x / 2.0_f64).exp();
            assert!((chi_squared_sf(x, 2.0).unwrap() - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn chi_squared_edges() {
        assert_eq!(chi_squared_sf(0.0, 3.0).unwrap(), 1.0);
        assert!(chi_squared_sf(1.0, 0.0).is_err());
        let far = chi_squared_sf(500.0, 2.0).unwrap();
        assert!((0.0..1e-100).contains(&far));
    }
}
