//! Feature Clusterer - batch-scoped k-means over (pH, moisture, bunch count)
//!
//! Every call re-fits from scratch on the batch it is given:
//! 1. Standardize the three features with batch mean / std
//! 2. Seeded k-means, best of `n_init` restarts
//! 3. Rank clusters by raw feature means and name them
//!
//! Cluster indices mean nothing across calls. Index 0 in one batch and index 0
//! in another are unrelated; only the rank names are comparable.

pub mod kmeans;
pub mod ranking;
pub mod standardize;

pub use ranking::ClusterRank;
pub use standardize::{feature_vector, FeatureVector, Standardizer};

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{HealthError, HealthResult};
use crate::record::{ensure_unique_ids, TreeRecord};
use kmeans::KMeansParams;

/// Clustering parameters; the seed is always explicit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    pub k: usize,
    pub n_init: usize,
    pub max_iter: usize,
    /// Convergence threshold on squared centroid movement (standardized space)
    pub tolerance: f64,
    pub seed: u64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            k: 3,
            n_init: 10,
            max_iter: 300,
            tolerance: 1e-4,
            seed: 42,
        }
    }
}

impl ClusterConfig {
    pub fn with_seed(self, seed: u64) -> Self {
        Self { seed, ..self }
    }

    pub fn validate(&self) -> HealthResult<()> {
        if self.k == 0 {
            return Err(HealthError::InvalidClusterConfig("k must be at least 1".to_string()));
        }
        if self.n_init == 0 {
            return Err(HealthError::InvalidClusterConfig("n_init must be at least 1".to_string()));
        }
        if self.max_iter == 0 {
            return Err(HealthError::InvalidClusterConfig("max_iter must be at least 1".to_string()));
        }
        if !(self.tolerance.is_finite() && self.tolerance >= 0.0) {
            return Err(HealthError::InvalidClusterConfig(format!(
                "tolerance must be finite and non-negative, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// Cluster membership of one tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterAssignment {
    pub tree_id: String,
    pub cluster_index: usize,
    pub rank: ClusterRank,
}

/// Per-cluster statistics in raw units
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterProfile {
    pub cluster_index: usize,
    pub rank: ClusterRank,
    /// Sum of per-feature ascending ranks
    pub rank_score: f64,
    pub size: usize,
    pub mean_soil_ph: f64,
    pub mean_moisture_pct: f64,
    pub mean_bunch_count: f64,
    /// Centroid in standardized feature space
    pub centroid: FeatureVector,
}

/// Result of clustering one batch
#[derive(Debug, Clone, Serialize)]
pub struct ClusteringResult {
    /// One per input record, in input order
    pub assignments: Vec<ClusterAssignment>,
    /// Best first
    pub profiles: Vec<ClusterProfile>,
    pub inertia: f64,
    pub n_iter: usize,
    #[serde(skip)]
    index: FxHashMap<String, usize>,
}

impl ClusteringResult {
    pub fn get(&self, tree_id: &str) -> Option<&ClusterAssignment> {
        self.index.get(tree_id).map(|&i| &self.assignments[i])
    }

    pub fn profile(&self, cluster_index: usize) -> Option<&ClusterProfile> {
        self.profiles.iter().find(|p| p.cluster_index == cluster_index)
    }

    pub fn ranks(&self) -> Vec<ClusterRank> {
        self.assignments.iter().map(|a| a.rank).collect()
    }
}

/// Cluster a batch of records
///
/// Fails on an empty batch, duplicate ids, invalid readings, a batch whose
/// three features are all constant, or fewer than `k` distinct points.
pub fn cluster(records: &[TreeRecord], config: &ClusterConfig) -> HealthResult<ClusteringResult> {
    config.validate()?;
    if records.is_empty() {
        return Err(HealthError::EmptyBatch);
    }
    ensure_unique_ids(records)?;
    for record in records {
        record.validate()?;
    }

    let raw: Vec<FeatureVector> = records.iter().map(feature_vector).collect();
    let scaler = Standardizer::fit(&raw)?;

    let distinct = count_distinct(&raw);
    if distinct < config.k {
        return Err(HealthError::TooFewDistinctPoints { k: config.k, distinct });
    }

    debug!(
        "Clustering started - trees={}, distinct={}, k={}, n_init={}, seed={}",
        records.len(), distinct, config.k, config.n_init, config.seed
    );

    let scaled = scaler.transform_all(&raw);
    let fit = kmeans::fit(
        &scaled,
        KMeansParams {
            k: config.k,
            n_init: config.n_init,
            max_iter: config.max_iter,
            tolerance: config.tolerance,
            seed: config.seed,
        },
    );

    // Raw-unit means per cluster
    let mut sums = vec![[0.0f64; standardize::N_FEATURES]; config.k];
    let mut sizes = vec![0usize; config.k];
    for (point, &label) in raw.iter().zip(&fit.labels) {
        sizes[label] += 1;
        for (s, v) in sums[label].iter_mut().zip(point) {
            *s += v;
        }
    }
    let raw_means: Vec<FeatureVector> = sums
        .iter()
        .zip(&sizes)
        .map(|(sum, &n)| (*sum).map(|s| if n > 0 { s / n as f64 } else { 0.0 }))
        .collect();

    let ranked = ranking::rank_clusters(&raw_means);

    let mut profiles: Vec<ClusterProfile> = (0..config.k)
        .map(|c| ClusterProfile {
            cluster_index: c,
            rank: ranked[c].1,
            rank_score: ranked[c].0,
            size: sizes[c],
            mean_soil_ph: raw_means[c][0],
            mean_moisture_pct: raw_means[c][1],
            mean_bunch_count: raw_means[c][2],
            centroid: fit.centroids[c],
        })
        .collect();
    profiles.sort_by(|a, b| {
        b.rank_score
            .total_cmp(&a.rank_score)
            .then(a.cluster_index.cmp(&b.cluster_index))
    });

    let assignments: Vec<ClusterAssignment> = records
        .iter()
        .zip(&fit.labels)
        .map(|(r, &label)| ClusterAssignment {
            tree_id: r.tree_id.clone(),
            cluster_index: label,
            rank: ranked[label].1,
        })
        .collect();

    let index = assignments
        .iter()
        .enumerate()
        .map(|(i, a)| (a.tree_id.clone(), i))
        .collect();

    debug!(
        "Clustering finished - inertia={:.4}, iterations={}, sizes={:?}",
        fit.inertia, fit.n_iter, sizes
    );

    Ok(ClusteringResult {
        assignments,
        profiles,
        inertia: fit.inertia,
        n_iter: fit.n_iter,
        index,
    })
}

fn count_distinct(points: &[FeatureVector]) -> usize {
    // +0.0 folds -0.0 into 0.0 before comparing bit patterns
    let keys: FxHashSet<[u64; standardize::N_FEATURES]> = points
        .iter()
        .map(|p| (*p).map(|v| (v + 0.0).to_bits()))
        .collect();
    keys.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(id: usize, ph: f64, moisture: f64, bunches: u32) -> TreeRecord {
        TreeRecord {
            tree_id: format!("{:05}", id),
            cluster_label: None,
            soil_ph: ph,
            moisture_pct: moisture,
            bunch_count: bunches,
            bunch_weight_kg: f64::from(bunches) * 2.0 + 5.0,
            height_cm: None,
            has_disease: false,
        }
    }

    fn separated_batch() -> Vec<TreeRecord> {
        let mut batch = Vec::new();
        for i in 0..6 {
            let d = i as f64 * 0.1;
            batch.push(tree(i, 6.5 + d * 0.2, 35.0 + d, 21 + (i % 2) as u32));
            batch.push(tree(100 + i, 5.9 + d * 0.2, 30.0 + d, 15 + (i % 2) as u32));
            batch.push(tree(200 + i, 5.0 + d * 0.2, 23.0 + d, 9 + (i % 2) as u32));
        }
        batch
    }

    #[test]
    fn test_names_follow_feature_levels() {
        let batch = separated_batch();
        let result = cluster(&batch, &ClusterConfig::default()).unwrap();

        assert_eq!(result.get("00000").unwrap().rank, ClusterRank::Best);
        assert_eq!(result.get("00100").unwrap().rank, ClusterRank::Medium);
        assert_eq!(result.get("00200").unwrap().rank, ClusterRank::NeedsAttention);

        assert_eq!(result.profiles[0].rank, ClusterRank::Best);
        assert_eq!(result.profiles[0].size, 6);
        assert!(result.profiles[0].mean_soil_ph > result.profiles[2].mean_soil_ph);
    }

    #[test]
    fn test_reproducible_with_same_seed() {
        let batch = separated_batch();
        let config = ClusterConfig::default().with_seed(7);
        let a = cluster(&batch, &config).unwrap();
        let b = cluster(&batch, &config).unwrap();
        assert_eq!(a.assignments, b.assignments);
        assert_eq!(a.inertia, b.inertia);
    }

    #[test]
    fn test_identical_records_are_degenerate() {
        let batch: Vec<TreeRecord> = (0..5).map(|i| tree(i, 6.0, 30.0, 15)).collect();
        assert_eq!(
            cluster(&batch, &ClusterConfig::default()).unwrap_err(),
            HealthError::DegenerateFeatures
        );
    }

    #[test]
    fn test_too_few_distinct_points() {
        let batch = vec![tree(1, 6.0, 30.0, 15), tree(2, 6.0, 30.0, 15), tree(3, 5.0, 25.0, 9)];
        assert_eq!(
            cluster(&batch, &ClusterConfig::default()).unwrap_err(),
            HealthError::TooFewDistinctPoints { k: 3, distinct: 2 }
        );
    }

    #[test]
    fn test_empty_and_bad_config() {
        assert_eq!(cluster(&[], &ClusterConfig::default()).unwrap_err(), HealthError::EmptyBatch);

        let config = ClusterConfig { k: 0, ..ClusterConfig::default() };
        assert!(matches!(
            cluster(&separated_batch(), &config),
            Err(HealthError::InvalidClusterConfig(_))
        ));
    }

    #[test]
    fn test_config_json_fills_defaults() {
        let config: ClusterConfig = serde_json::from_str(r#"{"seed": 1234}"#).unwrap();
        assert_eq!(config.k, 3);
        assert_eq!(config.n_init, 10);
        assert_eq!(config.seed, 1234);
    }
}
