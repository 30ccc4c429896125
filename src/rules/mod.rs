//! Scoring rule tables
//!
//! A `RuleTable` is the classifier's whole configuration: an ordered list of
//! per-field rules, each an ordered list of (predicate, points) brackets, plus
//! the score fractions that separate Good / Medium / Poor.
//!
//! Tables are plain data. They serialize to JSON so thresholds can be retuned
//! without a rebuild:
//!
//! ```json
//! {
//!   "name": "canonical",
//!   "good_fraction": 0.8,
//!   "medium_fraction": 0.5,
//!   "rules": [
//!     { "field": "soil_ph", "brackets": [
//!         { "when": { "kind": "range", "min": 5.5, "max": 7.0 }, "points": 3 },
//!         { "when": { "kind": "range", "min": 5.0, "max": 5.5, "max_inclusive": false }, "points": 1 }
//!     ] },
//!     { "field": "has_disease", "brackets": [
//!         { "when": { "kind": "flag", "equals": false }, "points": 3 }
//!     ] }
//!   ]
//! }
//! ```

pub mod predicate;
pub mod presets;

pub use predicate::Predicate;
pub use presets::{canonical, field_survey};

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use anyhow::{Context, Result};
use rustc_hash::FxHashSet;

use crate::error::{HealthError, HealthResult};
use crate::record::TreeRecord;

/// Record attribute a rule scores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    SoilPh,
    MoisturePct,
    BunchCount,
    BunchWeightKg,
    HeightCm,
    HasDisease,
}

/// Value of a field read off a record
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    Number(f64),
    Flag(bool),
}

impl Field {
    pub fn name(&self) -> &'static str {
        match self {
            Field::SoilPh => "soil_ph",
            Field::MoisturePct => "moisture_pct",
            Field::BunchCount => "bunch_count",
            Field::BunchWeightKg => "bunch_weight_kg",
            Field::HeightCm => "height_cm",
            Field::HasDisease => "has_disease",
        }
    }

    pub fn is_flag(&self) -> bool {
        matches!(self, Field::HasDisease)
    }

    /// Read this field from a record; only height can be absent
    pub fn read(&self, record: &TreeRecord) -> HealthResult<FieldValue> {
        Ok(match self {
            Field::SoilPh => FieldValue::Number(record.soil_ph),
            Field::MoisturePct => FieldValue::Number(record.moisture_pct),
            Field::BunchCount => FieldValue::Number(f64::from(record.bunch_count)),
            Field::BunchWeightKg => FieldValue::Number(record.bunch_weight_kg),
            Field::HeightCm => FieldValue::Number(record.height_cm.ok_or_else(|| {
                HealthError::MissingField {
                    tree_id: record.tree_id.clone(),
                    field: self.name(),
                }
            })?),
            Field::HasDisease => FieldValue::Flag(record.has_disease),
        })
    }
}

/// One (predicate, points) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bracket {
    pub when: Predicate,
    pub points: u32,
}

impl Bracket {
    pub fn new(when: Predicate, points: u32) -> Self {
        Self { when, points }
    }

    fn matches(&self, value: FieldValue) -> bool {
        match value {
            FieldValue::Number(v) => self.when.matches_number(v),
            FieldValue::Flag(b) => self.when.matches_flag(b),
        }
    }
}

/// Brackets for one field, evaluated top to bottom
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringRule {
    pub field: Field,
    pub brackets: Vec<Bracket>,
}

impl ScoringRule {
    pub fn new(field: Field, brackets: Vec<Bracket>) -> Self {
        Self { field, brackets }
    }

    /// Points of the first matching bracket (0 if none) and its index
    pub fn evaluate(&self, value: FieldValue) -> (u32, Option<usize>) {
        self.brackets
            .iter()
            .position(|b| b.matches(value))
            .map_or((0, None), |idx| (self.brackets[idx].points, Some(idx)))
    }

    pub fn max_points(&self) -> u32 {
        self.brackets.iter().map(|b| b.points).max().unwrap_or(0)
    }
}

/// Complete classifier configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleTable {
    pub name: String,
    pub rules: Vec<ScoringRule>,
    /// Good when score >= good_fraction × max
    pub good_fraction: f64,
    /// Medium when score >= medium_fraction × max
    pub medium_fraction: f64,
}

impl RuleTable {
    /// Load a table from JSON and validate it
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read rule table: {:?}", path))?;

        let table: RuleTable = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse rule table JSON: {:?}", path))?;

        table.validate()?;
        Ok(table)
    }

    /// Write the table as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .with_context(|| "Failed to serialize rule table")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write rule table: {:?}", path))
    }

    /// Highest attainable total, None if it does not fit in a u32
    pub fn checked_max_score(&self) -> Option<u32> {
        self.rules
            .iter()
            .try_fold(0u32, |acc, rule| acc.checked_add(rule.max_points()))
    }

    /// Highest attainable total (saturating; `validate` rejects overflow)
    pub fn max_score(&self) -> u32 {
        self.checked_max_score().unwrap_or(u32::MAX)
    }

    pub fn uses_field(&self, field: Field) -> bool {
        self.rules.iter().any(|r| r.field == field)
    }

    pub fn validate(&self) -> HealthResult<()> {
        let invalid = |message: String| HealthError::InvalidRuleTable {
            table: self.name.clone(),
            message,
        };

        if self.rules.is_empty() {
            return Err(invalid("no rules".to_string()));
        }

        let mut seen = FxHashSet::default();
        for rule in &self.rules {
            if !seen.insert(rule.field) {
                return Err(invalid(format!("field '{}' scored twice", rule.field.name())));
            }
            if rule.brackets.is_empty() {
                return Err(invalid(format!("rule for '{}' has no brackets", rule.field.name())));
            }
            for bracket in &rule.brackets {
                if bracket.when.is_numeric() == rule.field.is_flag() {
                    return Err(invalid(format!(
                        "predicate {} does not fit field '{}'",
                        bracket.when.describe(),
                        rule.field.name()
                    )));
                }
                bracket.when.check_bounds()
                    .map_err(|e| invalid(format!("'{}': {}", rule.field.name(), e)))?;
            }
        }

        let fractions_ok = self.medium_fraction > 0.0
            && self.medium_fraction <= self.good_fraction
            && self.good_fraction <= 1.0;
        if !fractions_ok {
            return Err(invalid(format!(
                "label fractions must satisfy 0 < medium ({}) <= good ({}) <= 1",
                self.medium_fraction, self.good_fraction
            )));
        }

        match self.checked_max_score() {
            None => return Err(invalid("maximum score overflows u32".to_string())),
            Some(0) => return Err(invalid("maximum score is 0".to_string())),
            Some(_) => {}
        }

        Ok(())
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        canonical()
    }
}
