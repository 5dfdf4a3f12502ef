//! Hierarchical taxonomy labels.
//!
//! A label is a `;`-separated list of segments such as
//! `k__Bacteria; p__Firmicutes; c__; o__Clostridiales`. Each segment is
//! `<prefix>__<name>` where the single-letter prefix selects one of the seven
//! fixed [`Rank`]s. The parser is total: segments it cannot recognise are
//! skipped, so malformed input degrades to fewer ranks instead of failing.
//!
//! ```text
//! label   := segment (';' segment)*
//! segment := ws* prefix ws* '__' ws* name? ws*
//! prefix  := 'k' | 'p' | 'c' | 'o' | 'f' | 'g' | 's'
//! ```

use std::collections::BTreeMap;
use std::fmt;

/// Placeholder name for a rank that is present in the label but empty.
pub const UNASSIGNED: &str = "Unassigned";

const SEPARATOR: &str = "__";

/// Strings treated as "no label at all".
const NULL_LIKE: [&str; 5] = ["nan", "none", "null", "na", "n/a"];

/// One level of the classification hierarchy, in fixed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Rank {
    Kingdom,
    Phylum,
    Class,
    Order,
    Family,
    Genus,
    Species,
}

impl Rank {
    /// All ranks from most general to most specific.
    pub const ALL: [Rank; 7] = [
        Rank::Kingdom,
        Rank::Phylum,
        Rank::Class,
        Rank::Order,
        Rank::Family,
        Rank::Genus,
        Rank::Species,
    ];

    /// Resolve a segment prefix (`"k"`, `"p"`, ...) to its rank.
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "k" => Some(Rank::Kingdom),
            "p" => Some(Rank::Phylum),
            "c" => Some(Rank::Class),
            "o" => Some(Rank::Order),
            "f" => Some(Rank::Family),
            "g" => Some(Rank::Genus),
            "s" => Some(Rank::Species),
            _ => None,
        }
    }

    /// Resolve a rank by its display name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        Rank::ALL
            .iter()
            .copied()
            .find(|r| r.name().eq_ignore_ascii_case(name.trim()))
    }

    /// The single-letter label prefix.
    pub fn prefix(self) -> &'static str {
        match self {
            Rank::Kingdom => "k",
            Rank::Phylum => "p",
            Rank::Class => "c",
            Rank::Order => "o",
            Rank::Family => "f",
            Rank::Genus => "g",
            Rank::Species => "s",
        }
    }

    /// Capitalised rank name.
    pub fn name(self) -> &'static str {
        match self {
            Rank::Kingdom => "Kingdom",
            Rank::Phylum => "Phylum",
            Rank::Class => "Class",
            Rank::Order => "Order",
            Rank::Family => "Family",
            Rank::Genus => "Genus",
            Rank::Species => "Species",
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered rank → taxon-name mapping.
///
/// Ranks absent from the label are absent from the mapping; ranks present but
/// empty map to [`UNASSIGNED`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Lineage {
    ranks: BTreeMap<Rank, String>,
}

impl Lineage {
    /// Name at `rank`, if the label carried that rank.
    pub fn get(&self, rank: Rank) -> Option<&str> {
        self.ranks.get(&rank).map(String::as_str)
    }

    /// Name at `rank`, or [`UNASSIGNED`] if the rank is missing.
    pub fn name_or_unassigned(&self, rank: Rank) -> &str {
        self.get(rank).unwrap_or(UNASSIGNED)
    }

    /// Iterate `(rank, name)` pairs from Kingdom towards Species.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (Rank, &str)> + '_ {
        self.ranks.iter().map(|(r, n)| (*r, n.as_str()))
    }

    /// Number of ranks present.
    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    /// Whether no rank was recognised.
    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }

    /// The most specific rank carrying a real (non-placeholder) name.
    pub fn deepest(&self) -> Option<(Rank, &str)> {
        self.iter().rev().find(|(_, name)| *name != UNASSIGNED)
    }

    fn insert(&mut self, rank: Rank, name: String) {
        self.ranks.insert(rank, name);
    }
}

impl fmt::Display for Lineage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (rank, name)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            let name = if name == UNASSIGNED { "" } else { name };
            write!(f, "{}{}{}", rank.prefix(), SEPARATOR, name)?;
        }
        Ok(())
    }
}

/// Parse a taxonomy label into a [`Lineage`].
///
/// Never fails. Empty or null-like input yields an empty lineage; segments
/// without `__` or with an unknown prefix are skipped. A rank that appears
/// twice keeps the later name.
pub fn parse_lineage(label: &str) -> Lineage {
    let mut lineage = Lineage::default();
    let trimmed = label.trim();
    if trimmed.is_empty() || NULL_LIKE.iter().any(|n| trimmed.eq_ignore_ascii_case(n)) {
        return lineage;
    }

    for segment in trimmed.split(';') {
        if let Some((rank, name)) = parse_segment(segment) {
            lineage.insert(rank, name);
        }
    }
    lineage
}

/// Parse one `<prefix>__<name>` segment.
fn parse_segment(segment: &str) -> Option<(Rank, String)> {
    let (prefix, name) = segment.trim().split_once(SEPARATOR)?;
    let rank = Rank::from_prefix(prefix.trim())?;
    let name = name.trim();
    let name = if name.is_empty() { UNASSIGNED } else { name };
    Some((rank, name.to_string()))
}

/// A classified feature: identifier, lineage, and optional confidence.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TaxonomyRecord {
    /// Feature (ASV/OTU) identifier.
    pub feature_id: String,
    /// Parsed classification.
    pub lineage: Lineage,
    /// Classifier confidence in [0, 1], when reported.
    pub confidence: Option<f64>,
}

impl TaxonomyRecord {
    /// Build a record by parsing `label`.
    pub fn from_label(feature_id: impl Into<String>, label: &str, confidence: Option<f64>) -> Self {
        Self {
            feature_id: feature_id.into(),
            lineage: parse_lineage(label),
            confidence,
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
