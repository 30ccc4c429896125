//! Health Classifier - rule-table scoring of single tree records
//!
//! Each record is scored independently: every rule contributes the points of
//! its first matching bracket, the total is compared against fractions of the
//! table maximum, and the result is one of Good / Medium / Poor.
//! Batches are scored as a parallel map (Rayon) since no rule looks at another
//! record.

use rayon::prelude::*;
use serde::Serialize;
use smallvec::SmallVec;
use tracing::debug;

use crate::error::HealthResult;
use crate::record::{ensure_unique_ids, HealthLabel, TreeRecord};
use crate::rules::{Field, RuleTable};

/// Slack for comparing an integer score against a fractional threshold
const FRACTION_EPSILON: f64 = 1e-9;

/// Points one rule awarded to one record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleContribution {
    pub field: Field,
    pub points: u32,
    pub max_points: u32,
    /// Index of the matching bracket, None when nothing matched
    pub bracket: Option<usize>,
}

impl RuleContribution {
    pub fn is_full(&self) -> bool {
        self.points == self.max_points
    }
}

/// Score detail for one record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthScore {
    pub tree_id: String,
    pub total: u32,
    pub max: u32,
    pub label: HealthLabel,
    pub breakdown: SmallVec<[RuleContribution; 6]>,
}

impl HealthScore {
    /// Total as a fraction of the maximum (0-1)
    pub fn fraction(&self) -> f64 {
        f64::from(self.total) / f64::from(self.max)
    }
}

/// Classifier bound to one validated rule table
#[derive(Debug, Clone)]
pub struct HealthClassifier {
    table: RuleTable,
    max_score: u32,
}

impl HealthClassifier {
    pub fn new(table: RuleTable) -> HealthResult<Self> {
        table.validate()?;
        let max_score = table.max_score();
        Ok(Self { table, max_score })
    }

    /// Classifier using the canonical 12-point table
    pub fn canonical() -> Self {
        let table = crate::rules::canonical();
        let max_score = table.max_score();
        Self { table, max_score }
    }

    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    pub fn max_score(&self) -> u32 {
        self.max_score
    }

    /// Score a record with full per-rule breakdown
    pub fn score(&self, record: &TreeRecord) -> HealthResult<HealthScore> {
        record.validate()?;

        let mut breakdown = SmallVec::new();
        let mut total: u32 = 0;
        for rule in &self.table.rules {
            let value = rule.field.read(record)?;
            let (points, bracket) = rule.evaluate(value);
            total = total.saturating_add(points);
            breakdown.push(RuleContribution {
                field: rule.field,
                points,
                max_points: rule.max_points(),
                bracket,
            });
        }

        Ok(HealthScore {
            tree_id: record.tree_id.clone(),
            total,
            max: self.max_score,
            label: self.label_for(total),
            breakdown,
        })
    }

    pub fn classify(&self, record: &TreeRecord) -> HealthResult<HealthLabel> {
        self.score(record).map(|s| s.label)
    }

    /// Label for a raw total under this table's fractions
    pub fn label_for(&self, total: u32) -> HealthLabel {
        let total = f64::from(total) + FRACTION_EPSILON;
        let max = f64::from(self.max_score);

        if total >= self.table.good_fraction * max {
            HealthLabel::Good
        } else if total >= self.table.medium_fraction * max {
            HealthLabel::Medium
        } else {
            HealthLabel::Poor
        }
    }

    /// Score a whole batch in parallel
    ///
    /// The batch is rejected as a whole on a duplicate tree id or on the first
    /// record that fails validation. Output order matches input order.
    pub fn score_batch(&self, records: &[TreeRecord]) -> HealthResult<Vec<HealthScore>> {
        ensure_unique_ids(records)?;

        let scores = records
            .par_iter()
            .map(|r| self.score(r))
            .collect::<HealthResult<Vec<_>>>()?;

        debug!(
            "Scored batch - table={}, trees={}, max_score={}",
            self.table.name, scores.len(), self.max_score
        );
        Ok(scores)
    }

    pub fn classify_batch(&self, records: &[TreeRecord]) -> HealthResult<Vec<HealthLabel>> {
        Ok(self.score_batch(records)?.into_iter().map(|s| s.label).collect())
    }
}

/// Classify one record with the canonical table
pub fn classify(record: &TreeRecord) -> HealthResult<HealthLabel> {
    HealthClassifier::canonical().classify(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HealthError;
    use crate::rules::field_survey;
    use approx::assert_relative_eq;

    fn tree(id: &str, ph: f64, moisture: f64, bunches: u32, disease: bool) -> TreeRecord {
        TreeRecord {
            tree_id: id.to_string(),
            cluster_label: None,
            soil_ph: ph,
            moisture_pct: moisture,
            bunch_count: bunches,
            bunch_weight_kg: f64::from(bunches) * 2.0 + 5.0,
            height_cm: None,
            has_disease: disease,
        }
    }

    #[test]
    fn test_reference_trees() {
        let classifier = HealthClassifier::canonical();

        let good = classifier.score(&tree("t1", 6.2, 34.0, 20, false)).unwrap();
        assert_eq!(good.total, 12);
        assert_eq!(good.label, HealthLabel::Good);

        let medium = classifier.score(&tree("t2", 5.2, 27.0, 14, false)).unwrap();
        assert_eq!(medium.total, 6);
        assert_eq!(medium.label, HealthLabel::Medium);

        let poor = classifier.score(&tree("t3", 4.9, 20.0, 6, true)).unwrap();
        assert_eq!(poor.total, 0);
        assert_eq!(poor.label, HealthLabel::Poor);
    }

    #[test]
    fn test_label_cut_points_canonical() {
        let classifier = HealthClassifier::canonical();
        assert_eq!(classifier.label_for(10), HealthLabel::Good);
        assert_eq!(classifier.label_for(9), HealthLabel::Medium);
        assert_eq!(classifier.label_for(6), HealthLabel::Medium);
        assert_eq!(classifier.label_for(5), HealthLabel::Poor);
    }

    #[test]
    fn test_label_cut_points_field_survey() {
        let classifier = HealthClassifier::new(field_survey()).unwrap();
        assert_eq!(classifier.max_score(), 10);
        assert_eq!(classifier.label_for(8), HealthLabel::Good);
        assert_eq!(classifier.label_for(7), HealthLabel::Medium);
        assert_eq!(classifier.label_for(5), HealthLabel::Medium);
        assert_eq!(classifier.label_for(4), HealthLabel::Poor);
    }

    #[test]
    fn test_ph_band_edges_are_optimal() {
        let classifier = HealthClassifier::canonical();
        for ph in [5.5, 7.0] {
            let score = classifier.score(&tree("edge", ph, 34.0, 20, false)).unwrap();
            assert_eq!(score.breakdown[0].points, 3, "pH {} should be optimal", ph);
        }
        let above = classifier.score(&tree("edge", 7.01, 34.0, 20, false)).unwrap();
        assert_eq!(above.breakdown[0].points, 0);
    }

    #[test]
    fn test_disease_costs_its_full_weight() {
        let classifier = HealthClassifier::canonical();
        let healthy = classifier.score(&tree("h", 5.2, 27.0, 14, false)).unwrap();
        let sick = classifier.score(&tree("h", 5.2, 27.0, 14, true)).unwrap();
        assert_eq!(healthy.total, sick.total + 3);
    }

    #[test]
    fn test_height_required_by_survey_table() {
        let classifier = HealthClassifier::new(field_survey()).unwrap();
        let err = classifier.score(&tree("nohgt", 6.0, 32.0, 15, false)).unwrap_err();
        assert!(matches!(err, HealthError::MissingField { field: "height_cm", .. }));

        let mut with_height = tree("hgt", 6.0, 32.0, 15, false);
        with_height.height_cm = Some(820.0);
        let score = classifier.score(&with_height).unwrap();
        assert_eq!(score.total, 10);
        assert_relative_eq!(score.fraction(), 1.0);
    }

    #[test]
    fn test_invalid_reading_is_an_error_not_a_label() {
        let classifier = HealthClassifier::canonical();
        let err = classifier.classify(&tree("bad", 15.0, 30.0, 10, false)).unwrap_err();
        assert!(matches!(err, HealthError::OutOfRange { field: "soil_ph", .. }));
    }

    #[test]
    fn test_batch_preserves_order_and_rejects_duplicates() {
        let classifier = HealthClassifier::canonical();
        let batch = vec![
            tree("a", 6.2, 34.0, 20, false),
            tree("b", 4.9, 20.0, 6, true),
            tree("c", 5.2, 27.0, 14, false),
        ];
        let labels = classifier.classify_batch(&batch).unwrap();
        assert_eq!(labels, vec![HealthLabel::Good, HealthLabel::Poor, HealthLabel::Medium]);

        let dup = vec![tree("a", 6.2, 34.0, 20, false), tree("a", 6.0, 30.0, 18, false)];
        assert_eq!(
            classifier.classify_batch(&dup),
            Err(HealthError::DuplicateTreeId("a".to_string()))
        );
    }

    #[test]
    fn test_rejects_invalid_table() {
        let mut table = crate::rules::canonical();
        table.good_fraction = 1.5;
        assert!(HealthClassifier::new(table).is_err());
    }
}
