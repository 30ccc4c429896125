//! Batch and group summaries
//!
//! Aggregates that the dashboards show next to the per-tree labels: label
//! distribution, disease incidence, and per-group means. Groups are either
//! the field-assigned block (`cluster_label`) or the computed cluster rank.

use std::collections::BTreeMap;
use serde::Serialize;

use crate::clusterer::{ClusterRank, ClusteringResult};
use crate::error::{HealthError, HealthResult};
use crate::record::{HealthLabel, TreeRecord};

/// Group name for records without a field block tag
pub const UNASSIGNED_BLOCK: &str = "Unassigned";

/// Label counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HealthDistribution {
    pub good: usize,
    pub medium: usize,
    pub poor: usize,
}

impl HealthDistribution {
    pub fn from_labels<'a>(labels: impl IntoIterator<Item = &'a HealthLabel>) -> Self {
        let mut dist = Self::default();
        for label in labels {
            dist.add(*label);
        }
        dist
    }

    pub fn add(&mut self, label: HealthLabel) {
        match label {
            HealthLabel::Good => self.good += 1,
            HealthLabel::Medium => self.medium += 1,
            HealthLabel::Poor => self.poor += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.good + self.medium + self.poor
    }

    pub fn count(&self, label: HealthLabel) -> usize {
        match label {
            HealthLabel::Good => self.good,
            HealthLabel::Medium => self.medium,
            HealthLabel::Poor => self.poor,
        }
    }

    /// Share of trees with this label (0-100); 0 for an empty distribution
    pub fn percent(&self, label: HealthLabel) -> f64 {
        percent(self.count(label), self.total())
    }
}

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// Whole-batch headline numbers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub total_trees: usize,
    pub distribution: HealthDistribution,
    pub diseased: usize,
}

impl BatchSummary {
    pub fn diseased_percent(&self) -> f64 {
        percent(self.diseased, self.total_trees)
    }
}

/// Aggregate for one group of trees
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub trees: usize,
    pub mean_soil_ph: f64,
    pub mean_moisture_pct: f64,
    pub mean_bunch_count: f64,
    pub mean_bunch_weight_kg: f64,
    pub diseased: usize,
    pub distribution: HealthDistribution,
}

#[derive(Default)]
struct GroupAccumulator {
    trees: usize,
    ph: f64,
    moisture: f64,
    bunches: f64,
    weight: f64,
    diseased: usize,
    distribution: HealthDistribution,
}

impl GroupAccumulator {
    fn push(&mut self, record: &TreeRecord, label: HealthLabel) {
        self.trees += 1;
        self.ph += record.soil_ph;
        self.moisture += record.moisture_pct;
        self.bunches += f64::from(record.bunch_count);
        self.weight += record.bunch_weight_kg;
        if record.has_disease {
            self.diseased += 1;
        }
        self.distribution.add(label);
    }

    fn finish(self) -> GroupSummary {
        let n = self.trees.max(1) as f64;
        GroupSummary {
            trees: self.trees,
            mean_soil_ph: self.ph / n,
            mean_moisture_pct: self.moisture / n,
            mean_bunch_count: self.bunches / n,
            mean_bunch_weight_kg: self.weight / n,
            diseased: self.diseased,
            distribution: self.distribution,
        }
    }
}

fn ensure_paired(records: &[TreeRecord], labels: &[HealthLabel]) -> HealthResult<()> {
    if records.len() != labels.len() {
        return Err(HealthError::LengthMismatch {
            records: records.len(),
            labels: labels.len(),
        });
    }
    Ok(())
}

/// Headline numbers for records and their labels (zipped in order)
pub fn summarize_batch(records: &[TreeRecord], labels: &[HealthLabel]) -> HealthResult<BatchSummary> {
    ensure_paired(records, labels)?;
    Ok(BatchSummary {
        total_trees: records.len(),
        distribution: HealthDistribution::from_labels(labels),
        diseased: records.iter().filter(|r| r.has_disease).count(),
    })
}

/// Group records by a fallible key, ordered by key
pub fn summarize_groups<K, F>(
    records: &[TreeRecord],
    labels: &[HealthLabel],
    key_of: F,
) -> HealthResult<BTreeMap<K, GroupSummary>>
where
    K: Ord,
    F: Fn(&TreeRecord) -> HealthResult<K>,
{
    ensure_paired(records, labels)?;
    let mut groups: BTreeMap<K, GroupAccumulator> = BTreeMap::new();
    for (record, &label) in records.iter().zip(labels) {
        groups.entry(key_of(record)?).or_default().push(record, label);
    }
    Ok(groups.into_iter().map(|(k, acc)| (k, acc.finish())).collect())
}

/// Group by field block tag ("A", "B", "C", or Unassigned)
pub fn summarize_by_block(
    records: &[TreeRecord],
    labels: &[HealthLabel],
) -> HealthResult<BTreeMap<String, GroupSummary>> {
    summarize_groups(records, labels, |r| {
        Ok(r.cluster_label
            .clone()
            .unwrap_or_else(|| UNASSIGNED_BLOCK.to_string()))
    })
}

/// Group by computed cluster rank (Best, Medium, Needs Attention)
///
/// Ranks are looked up by tree id, so every record must appear in `clustering`.
pub fn summarize_by_rank(
    records: &[TreeRecord],
    labels: &[HealthLabel],
    clustering: &ClusteringResult,
) -> HealthResult<BTreeMap<ClusterRank, GroupSummary>> {
    summarize_groups(records, labels, |r| {
        clustering
            .get(&r.tree_id)
            .map(|a| a.rank)
            .ok_or_else(|| HealthError::UnassignedTree(r.tree_id.clone()))
    })
}
