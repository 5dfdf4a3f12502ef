//! Engine configuration.
//!
//! Every knob has a documented default; a TOML document only needs to name
//! the values it overrides:
//!
//! ```toml
//! [ordination]
//! seed = 7
//!
//! [tests]
//! significance_level = 0.01
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Result, YaraError};

/// Default seed for the ordination's random start.
pub const DEFAULT_ORDINATION_SEED: u64 = 42;

/// Top-level configuration grouping every analyzer's settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub ordination: OrdinationConfig,
    pub rarefaction: RarefactionConfig,
    pub tests: GroupTestConfig,
}

impl EngineConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)
            .map_err(|e| YaraError::MalformedInput(format!("engine config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            YaraError::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {}", path.display(), e),
            ))
        })?;
        log::debug!("loading engine config from {}", path.display());
        Self::from_toml_str(&text)
    }

    /// Check every section.
    pub fn validate(&self) -> Result<()> {
        self.ordination.validate()?;
        self.rarefaction.validate()?;
        self.tests.validate()
    }
}

// ── Ordination ─────────────────────────────────────────────────────────────

/// Embedding strategy used by ordination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrdinationMethod {
    /// Metric multidimensional scaling by stress majorization from a seeded
    /// random start.
    #[default]
    Smacof,
    /// Classical principal coordinates analysis (eigendecomposition of the
    /// double-centred squared distances). Deterministic; ignores the seed.
    Pcoa,
}

/// Configuration for ordination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrdinationConfig {
    /// Embedding strategy.
    pub method: OrdinationMethod,
    /// Random seed for the initial configuration.
    pub seed: u64,
    /// Added to `seed` for the single retry after a convergence failure.
    pub retry_seed_offset: u64,
    /// Maximum iterations per attempt.
    pub max_iter: usize,
    /// Convergence tolerance: SMACOF stops once stress-1 improves by less
    /// than this between iterations; PCoA uses it as the off-diagonal
    /// threshold (relative to the matrix norm) of its Jacobi sweeps.
    pub tolerance: f64,
}

impl Default for OrdinationConfig {
    fn default() -> Self {
        Self {
            method: OrdinationMethod::Smacof,
            seed: DEFAULT_ORDINATION_SEED,
            retry_seed_offset: 1,
            max_iter: 1000,
            tolerance: 1e-5,
        }
    }
}

impl OrdinationConfig {
    /// The seed used for the retry attempt.
    pub fn retry_seed(&self) -> u64 {
        self.seed.wrapping_add(self.retry_seed_offset.max(1))
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_iter == 0 {
            return Err(YaraError::MalformedInput(
                "ordination.max_iter must be > 0".into(),
            ));
        }
        if !(self.tolerance > 0.0 && self.tolerance.is_finite()) {
            return Err(YaraError::MalformedInput(
                "ordination.tolerance must be a positive number".into(),
            ));
        }
        Ok(())
    }
}

// ── Rarefaction ────────────────────────────────────────────────────────────

/// Configuration for rarefaction analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RarefactionConfig {
    /// Fraction of a curve's maximum that counts as the plateau.
    pub plateau_threshold: f64,
    /// Minimum fraction of samples a recommended depth must retain.
    pub min_retained_fraction: f64,
    /// Saturation above which a curve counts as saturated.
    pub saturated_threshold: f64,
    /// Saturation above which a curve counts as partially saturated.
    pub partial_threshold: f64,
}

impl Default for RarefactionConfig {
    fn default() -> Self {
        Self {
            plateau_threshold: 0.95,
            min_retained_fraction: 0.8,
            saturated_threshold: 0.95,
            partial_threshold: 0.80,
        }
    }
}

impl RarefactionConfig {
    pub fn validate(&self) -> Result<()> {
        check_unit("rarefaction.plateau_threshold", self.plateau_threshold)?;
        check_unit("rarefaction.min_retained_fraction", self.min_retained_fraction)?;
        check_unit("rarefaction.saturated_threshold", self.saturated_threshold)?;
        check_unit("rarefaction.partial_threshold", self.partial_threshold)?;
        if self.partial_threshold > self.saturated_threshold {
            return Err(YaraError::MalformedInput(
                "rarefaction.partial_threshold must not exceed saturated_threshold".into(),
            ));
        }
        Ok(())
    }
}

// ── Group tests ────────────────────────────────────────────────────────────

/// Configuration for group-comparison tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GroupTestConfig {
    /// A test is significant when `p < significance_level`.
    pub significance_level: f64,
    /// Groups smaller than this are dropped from Kruskal-Wallis.
    pub kruskal_min_group_size: usize,
    /// Both Mann-Whitney groups need at least this many observations.
    pub mann_whitney_min_group_size: usize,
}

impl Default for GroupTestConfig {
    fn default() -> Self {
        Self {
            significance_level: 0.05,
            kruskal_min_group_size: 5,
            mann_whitney_min_group_size: 3,
        }
    }
}

impl GroupTestConfig {
    pub fn validate(&self) -> Result<()> {
        check_unit("tests.significance_level", self.significance_level)?;
        if self.kruskal_min_group_size == 0 || self.mann_whitney_min_group_size == 0 {
            return Err(YaraError::MalformedInput(
                "tests: minimum group sizes must be > 0".into(),
            ));
        }
        Ok(())
    }

    /// Whether `p_value` is significant at the configured level.
    pub fn is_significant(&self, p_value: f64) -> bool {
        p_value < self.significance_level
    }
}

fn check_unit(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(YaraError::MalformedInput(format!(
            "{} must be in [0, 1] (got {})",
            name, value
        )));
    }
    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────
