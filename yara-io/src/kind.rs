//! Data kinds and file-name based auto-detection.

use std::fmt;
use std::path::Path;

use yara_core::{Result, YaraError};

/// The canonical shape a file is loaded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DataKind {
    /// Per-sample metric table.
    Alpha,
    /// Square distance matrix.
    Beta,
    /// Feature classification table.
    Taxonomy,
    /// Depth-by-sample rarefaction table.
    Rarefaction,
    /// Header plus string rows, no coercion.
    Raw,
    /// Decide from the file name.
    #[default]
    Auto,
}

impl DataKind {
    /// Lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Alpha => "alpha",
            Self::Beta => "beta",
            Self::Taxonomy => "taxonomy",
            Self::Rarefaction => "rarefaction",
            Self::Raw => "raw",
            Self::Auto => "auto",
        }
    }

    /// Parse a kind name, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`YaraError::MalformedInput`] for an unknown name.
    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "alpha" => Ok(Self::Alpha),
            "beta" | "distance" => Ok(Self::Beta),
            "taxonomy" => Ok(Self::Taxonomy),
            "rarefaction" => Ok(Self::Rarefaction),
            "raw" => Ok(Self::Raw),
            "auto" => Ok(Self::Auto),
            other => Err(YaraError::MalformedInput(format!(
                "unknown data kind '{}'",
                other
            ))),
        }
    }

    /// Detect a kind from keywords in a file name.
    ///
    /// Falls back to [`DataKind::Raw`] when no keyword matches.
    pub fn detect(file_name: &str) -> Self {
        let name = file_name.to_ascii_lowercase();
        if name.contains("alpha") {
            Self::Alpha
        } else if name.contains("distance") || name.contains("beta") {
            Self::Beta
        } else if name.contains("taxonomy") {
            Self::Taxonomy
        } else if name.contains("rarefaction") {
            Self::Rarefaction
        } else {
            Self::Raw
        }
    }

    /// Detect from the final component of `path`.
    pub fn detect_path(path: &Path) -> Self {
        path.file_name()
            .map(|n| Self::detect(&n.to_string_lossy()))
            .unwrap_or(Self::Raw)
    }

    /// Whether an entry called `file_name` is a candidate for this kind.
    ///
    /// Raw (and auto) accept any name; the others need their keyword.
    pub(crate) fn matches_name(self, file_name: &str) -> bool {
        match self {
            Self::Raw | Self::Auto => true,
            kind => Self::detect(file_name) == kind,
        }
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_keywords() {
        assert_eq!(DataKind::detect("alpha-diversity.tsv"), DataKind::Alpha);
        assert_eq!(DataKind::detect("distance-matrix.tsv"), DataKind::Beta);
        assert_eq!(DataKind::detect("Beta_Results.csv"), DataKind::Beta);
        assert_eq!(DataKind::detect("taxonomy.tsv"), DataKind::Taxonomy);
        assert_eq!(DataKind::detect("rarefaction-observed.csv"), DataKind::Rarefaction);
        assert_eq!(DataKind::detect("metadata.tsv"), DataKind::Raw);
    }

    #[test]
    fn alpha_wins_over_later_keywords() {
        assert_eq!(DataKind::detect("alpha-rarefaction.csv"), DataKind::Alpha);
    }

    #[test]
    fn detect_path_uses_file_name_only() {
        let p = Path::new("/data/alpha/taxonomy.tsv");
        assert_eq!(DataKind::detect_path(p), DataKind::Taxonomy);
    }

    #[test]
    fn from_name_round_trips() {
        for kind in [
            DataKind::Alpha,
            DataKind::Beta,
            DataKind::Taxonomy,
            DataKind::Rarefaction,
            DataKind::Raw,
            DataKind::Auto,
        ] {
            assert_eq!(DataKind::from_name(kind.name()).unwrap(), kind);
        }
        assert_eq!(DataKind::from_name(" Distance ").unwrap(), DataKind::Beta);
        assert!(DataKind::from_name("gamma").is_err());
    }

    #[test]
    fn raw_matches_anything() {
        assert!(DataKind::Raw.matches_name("whatever.tsv"));
        assert!(DataKind::Taxonomy.matches_name("data/taxonomy.tsv"));
        assert!(!DataKind::Taxonomy.matches_name("data/metadata.tsv"));
    }
}
