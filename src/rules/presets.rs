//! Built-in rule tables
//!
//! Two weightings have been used on the estate. `canonical` is the default
//! everywhere; `field_survey` is kept for the geographic survey sheets that
//! also record tree height.

use super::{Bracket, Field, Predicate, RuleTable, ScoringRule};

/// 12-point table: pH, moisture, bunch count, disease (3 points each)
///
/// | field | bracket | points |
/// |---|---|---|
/// | soil pH | [5.5, 7.0] | 3 |
/// | soil pH | [5.0, 5.5) | 1 |
/// | moisture | >= 30 | 3 |
/// | moisture | [25, 30) | 1 |
/// | bunches | >= 18 | 3 |
/// | bunches | [12, 18) | 1 |
/// | disease | absent | 3 |
///
/// Good >= 10, Medium >= 6 (0.8 and 0.5 of 12).
pub fn canonical() -> RuleTable {
    RuleTable {
        name: "canonical".to_string(),
        rules: vec![
            ScoringRule::new(
                Field::SoilPh,
                vec![
                    Bracket::new(Predicate::between(5.5, 7.0), 3),
                    Bracket::new(Predicate::from_up_to(5.0, 5.5), 1),
                ],
            ),
            ScoringRule::new(
                Field::MoisturePct,
                vec![
                    Bracket::new(Predicate::at_least(30.0), 3),
                    Bracket::new(Predicate::from_up_to(25.0, 30.0), 1),
                ],
            ),
            ScoringRule::new(
                Field::BunchCount,
                vec![
                    Bracket::new(Predicate::at_least(18.0), 3),
                    Bracket::new(Predicate::from_up_to(12.0, 18.0), 1),
                ],
            ),
            ScoringRule::new(
                Field::HasDisease,
                vec![Bracket::new(Predicate::flag(false), 3)],
            ),
        ],
        good_fraction: 0.8,
        medium_fraction: 0.5,
    }
}

/// 10-point survey table with a height rule (2 points per field)
///
/// The upper marginal pH band (7.0, 7.5] only exists here; the canonical
/// table gives alkaline soil nothing above 7.0.
pub fn field_survey() -> RuleTable {
    RuleTable {
        name: "field_survey".to_string(),
        rules: vec![
            ScoringRule::new(
                Field::SoilPh,
                vec![
                    Bracket::new(Predicate::between(5.5, 7.0), 2),
                    Bracket::new(Predicate::from_up_to(5.0, 5.5), 1),
                    Bracket::new(Predicate::above_up_to(7.0, 7.5), 1),
                ],
            ),
            ScoringRule::new(
                Field::MoisturePct,
                vec![
                    Bracket::new(Predicate::between(30.0, 38.0), 2),
                    Bracket::new(Predicate::from_up_to(25.0, 30.0), 1),
                ],
            ),
            ScoringRule::new(
                Field::BunchCount,
                vec![
                    Bracket::new(Predicate::between(12.0, 24.0), 2),
                    Bracket::new(Predicate::from_up_to(8.0, 12.0), 1),
                ],
            ),
            ScoringRule::new(
                Field::HasDisease,
                vec![Bracket::new(Predicate::flag(false), 2)],
            ),
            ScoringRule::new(
                Field::HeightCm,
                vec![
                    Bracket::new(Predicate::at_least(800.0), 2),
                    Bracket::new(Predicate::from_up_to(700.0, 800.0), 1),
                ],
            ),
        ],
        good_fraction: 0.8,
        medium_fraction: 0.5,
    }
}

/// Look up a built-in table by name
pub fn by_name(name: &str) -> Option<RuleTable> {
    match name {
        "canonical" => Some(canonical()),
        "field_survey" => Some(field_survey()),
        _ => None,
    }
}
