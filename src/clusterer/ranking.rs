//! Rank naming of clusters by centroid quality
//!
//! Each cluster's raw feature means are ranked ascending per feature (average
//! rank on ties, 1-based); the per-cluster sum is its rank score. The highest
//! score is "Best", the lowest "Needs Attention", anything between "Medium".

use serde::{Deserialize, Serialize};

use super::standardize::{FeatureVector, N_FEATURES};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ClusterRank {
    Best,
    Medium,
    NeedsAttention,
}

impl ClusterRank {
    pub fn display_text(&self) -> &'static str {
        match self {
            ClusterRank::Best => "Best",
            ClusterRank::Medium => "Medium",
            ClusterRank::NeedsAttention => "Needs Attention",
        }
    }

    /// Block letter used on the dashboards ("A (Terbaik)" etc.)
    pub fn block_letter(&self) -> char {
        match self {
            ClusterRank::Best => 'A',
            ClusterRank::Medium => 'B',
            ClusterRank::NeedsAttention => 'C',
        }
    }
}

impl std::fmt::Display for ClusterRank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_text())
    }
}

/// 1-based ascending ranks, tied values share the mean of their positions
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // positions start..end hold rank start+1 ..= end
        let shared = (start + 1 + end) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = shared;
        }
        start = end;
    }
    ranks
}

/// Rank score and name for each cluster, indexed by cluster
///
/// Equal scores are ordered by cluster index, lower first.
pub fn rank_clusters(means: &[FeatureVector]) -> Vec<(f64, ClusterRank)> {
    let k = means.len();
    let mut scores = vec![0.0; k];
    for j in 0..N_FEATURES {
        let column: Vec<f64> = means.iter().map(|m| m[j]).collect();
        for (score, rank) in scores.iter_mut().zip(average_ranks(&column)) {
            *score += rank;
        }
    }

    let mut order: Vec<usize> = (0..k).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut named = vec![(0.0, ClusterRank::Medium); k];
    for (position, &cluster) in order.iter().enumerate() {
        let rank = if position == 0 {
            ClusterRank::Best
        } else if position == k - 1 {
            ClusterRank::NeedsAttention
        } else {
            ClusterRank::Medium
        };
        named[cluster] = (scores[cluster], rank);
    }
    named
}
