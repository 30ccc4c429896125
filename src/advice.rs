//! Advice cards
//!
//! Turns shortfalls in a tree's score (or a group's averages) into field
//! recommendations of the kind printed on the block cards.

use serde::Serialize;

use crate::classifier::{HealthClassifier, HealthScore};
use crate::error::HealthResult;
use crate::record::TreeRecord;
use crate::rules::Field;
use crate::summary::GroupSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    High,
    Medium,
}

/// One recommendation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdviceCard {
    pub field: Field,
    pub severity: Severity,
    pub message: String,
    pub advice: &'static str,
}

fn recommendation(field: Field) -> &'static str {
    match field {
        Field::SoilPh => "Adjust soil pH (lime acidic soil) toward 5.5-7.0",
        Field::MoisturePct => "Improve soil moisture with irrigation or mulching",
        Field::BunchCount => "Review fertiliser programme and harvest rounds",
        Field::BunchWeightKg => "Review bunch weight against block yield targets",
        Field::HeightCm => "Monitor growth; check nutrition and spacing",
        Field::HasDisease => "Disease treatment required; isolate and inspect neighbours",
    }
}

/// Cards for every rule that earned less than its maximum
///
/// High severity when the rule earned nothing; cards come High first, then
/// in rule-table order.
pub fn advise(score: &HealthScore) -> Vec<AdviceCard> {
    let mut cards: Vec<AdviceCard> = score
        .breakdown
        .iter()
        .filter(|c| !c.is_full())
        .map(|c| AdviceCard {
            field: c.field,
            severity: if c.points == 0 { Severity::High } else { Severity::Medium },
            message: format!(
                "{}: {} of {} points",
                c.field.name(),
                c.points,
                c.max_points
            ),
            advice: recommendation(c.field),
        })
        .collect();
    cards.sort_by_key(|c| c.severity);
    cards
}

/// Cards for a group, scoring its mean readings as one synthetic tree
///
/// Disease is treated as present when any tree in the group is diseased.
/// Height is not aggregated, so tables scoring height skip that rule here.
/// The mean bunch count is floored, so a group just under a bracket is
/// scored below it.
pub fn advise_group(
    name: &str,
    group: &GroupSummary,
    classifier: &HealthClassifier,
) -> HealthResult<Vec<AdviceCard>> {
    let table = classifier.table();
    let mut reduced = table.clone();
    reduced.rules.retain(|r| r.field != Field::HeightCm);
    let group_classifier = if reduced.rules.len() == table.rules.len() {
        classifier.clone()
    } else {
        HealthClassifier::new(reduced)?
    };

    let typical = TreeRecord {
        tree_id: name.to_string(),
        cluster_label: Some(name.to_string()),
        soil_ph: group.mean_soil_ph,
        moisture_pct: group.mean_moisture_pct,
        bunch_count: group.mean_bunch_count.floor().max(0.0) as u32,
        bunch_weight_kg: group.mean_bunch_weight_kg,
        height_cm: None,
        has_disease: group.diseased > 0,
    };

    let score = group_classifier.score(&typical)?;
    Ok(advise(&score))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::HealthLabel;
    use crate::summary::HealthDistribution;

    fn tree(ph: f64, moisture: f64, bunches: u32, disease: bool) -> TreeRecord {
        TreeRecord {
            tree_id: "t".to_string(),
            cluster_label: None,
            soil_ph: ph,
            moisture_pct: moisture,
            bunch_count: bunches,
            bunch_weight_kg: 30.0,
            height_cm: None,
            has_disease: disease,
        }
    }

    #[test]
    fn test_healthy_tree_needs_nothing() {
        let classifier = HealthClassifier::canonical();
        let score = classifier.score(&tree(6.2, 34.0, 20, false)).unwrap();
        assert!(advise(&score).is_empty());
    }

    #[test]
    fn test_shortfalls_ordered_by_severity() {
        let classifier = HealthClassifier::canonical();
        // pH marginal (1 pt), moisture zero, bunches full, diseased
        let score = classifier.score(&tree(5.2, 20.0, 20, true)).unwrap();
        let cards = advise(&score);
        let fields: Vec<Field> = cards.iter().map(|c| c.field).collect();
        assert_eq!(fields, vec![Field::MoisturePct, Field::HasDisease, Field::SoilPh]);
        assert_eq!(cards[0].severity, Severity::High);
        assert_eq!(cards[2].severity, Severity::Medium);
        assert_eq!(cards[2].message, "soil_ph: 1 of 3 points");
    }

    #[test]
    fn test_group_just_below_bunch_bracket_gets_advice() {
        let classifier = HealthClassifier::canonical();
        let group = GroupSummary {
            trees: 5,
            mean_soil_ph: 6.2,
            mean_moisture_pct: 34.0,
            mean_bunch_count: 17.6,
            mean_bunch_weight_kg: 40.0,
            diseased: 0,
            distribution: HealthDistribution { good: 3, medium: 2, poor: 0 },
        };
        let cards = advise_group("B", &group, &classifier).unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].field, Field::BunchCount);
        assert_eq!(cards[0].severity, Severity::Medium);
    }

    #[test]
    fn test_group_advice_skips_height() {
        let classifier = HealthClassifier::new(crate::rules::field_survey()).unwrap();
        let group = GroupSummary {
            trees: 10,
            mean_soil_ph: 5.2,
            mean_moisture_pct: 24.0,
            mean_bunch_count: 10.2,
            mean_bunch_weight_kg: 25.0,
            diseased: 6,
            distribution: HealthDistribution { good: 0, medium: 2, poor: 8 },
        };
        let cards = advise_group("C", &group, &classifier).unwrap();
        assert!(cards.iter().all(|c| c.field != Field::HeightCm));
        assert!(cards.iter().any(|c| c.field == Field::HasDisease && c.severity == Severity::High));
        assert_eq!(group.distribution.count(HealthLabel::Poor), 8);
    }
}
