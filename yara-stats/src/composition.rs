//! Taxonomic composition: the most common taxa at one rank.

use yara_core::{Rank, Summarizable, TaxonomyRecord};

/// Features assigned to one taxon.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TaxonCount {
    pub taxon: String,
    pub count: usize,
    /// Share of all features, in percent, rounded to one decimal.
    pub percentage: f64,
}

/// Most common taxa at a rank.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TaxonomicComposition {
    pub rank: Rank,
    /// Number of records counted.
    pub total_features: usize,
    /// Count descending; equal counts in first-seen order.
    pub entries: Vec<TaxonCount>,
}

impl Summarizable for TaxonomicComposition {
    fn summary(&self) -> String {
        let top: Vec<String> = self
            .entries
            .iter()
            .map(|e| format!("{} ({:.1}%)", e.taxon, e.percentage))
            .collect();
        format!(
            "{} features at {}: {}",
            self.total_features,
            self.rank,
            top.join(", ")
        )
    }
}

/// Count features per taxon at `rank` and keep the `top_n` most common.
///
/// Records without the rank count towards `Unassigned`.
pub fn composition(records: &[TaxonomyRecord], rank: Rank, top_n: usize) -> TaxonomicComposition {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for record in records {
        let name = record.lineage.name_or_unassigned(rank);
        match counts.iter_mut().find(|(t, _)| *t == name) {
            Some((_, c)) => *c += 1,
            None => counts.push((name, 1)),
        }
    }
    // stable: equal counts stay in first-seen order
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    let total = records.len();
    let entries = counts
        .into_iter()
        .take(top_n)
        .map(|(taxon, count)| TaxonCount {
            taxon: taxon.to_string(),
            count,
            percentage: (count as f64 / total as f64 * 1000.0).round() / 10.0,
        })
        .collect();

    TaxonomicComposition {
        rank,
        total_features: total,
        entries,
    }
}
