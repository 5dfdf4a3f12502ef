//! Mid-ranks for rank-based tests.
//!
//! [`mid_ranks`] assigns 1-based ranks where tied values share the average of
//! the positions they span, and records the size of every tie group so the
//! tests can apply their tie corrections.

/// Ranks of a pooled sample plus its tie structure.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    /// Rank of each input value, in input order.
    pub ranks: Vec<f64>,
    /// Size of every tie group with more than one member.
    pub tie_sizes: Vec<usize>,
}

impl Ranking {
    /// Whether any value occurs more than once.
    pub fn has_ties(&self) -> bool {
        !self.tie_sizes.is_empty()
    }

    /// `Σ (t³ - t)` over tie groups, the quantity both tie corrections use.
    pub fn tie_term(&self) -> f64 {
        self.tie_sizes
            .iter()
            .map(|&t| {
                let t = t as f64;
                t * t * t - t
            })
            .sum()
    }
}

/// Rank `data` with average ranks for ties.
///
/// Empty input produces an empty ranking.
pub fn mid_ranks(data: &[f64]) -> Ranking {
    let n = data.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| data[a].total_cmp(&data[b]));

    let mut ranks = vec![0.0; n];
    let mut tie_sizes = Vec::new();
    let mut i = 0;
    while i < n {
        let mut j = i + 1;
        while j < n && data[order[j]].total_cmp(&data[order[i]]).is_eq() {
            j += 1;
        }
        // Positions i+1..=j share their mean.
        let shared = (i + 1 + j) as f64 / 2.0;
        for &idx in &order[i..j] {
            ranks[idx] = shared;
        }
        if j - i > 1 {
            tie_sizes.push(j - i);
        }
        i = j;
    }

    Ranking { ranks, tie_sizes }
}

// ── Tests ──────────────────────────────────────────────────────────────────
