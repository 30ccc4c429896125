//! Tree records and the derived health label
//!
//! One `TreeRecord` is one observation of one palm: IoT soil readings
//! (pH, moisture) plus manual field entries (bunches, weight, height, disease).

use serde::{Deserialize, Serialize};
use rustc_hash::FxHashSet;
use crate::error::{HealthError, HealthResult};

/// Physical bounds a reading must fall inside before it can be scored
pub const SOIL_PH_RANGE: (f64, f64) = (0.0, 14.0);
pub const MOISTURE_PCT_RANGE: (f64, f64) = (0.0, 100.0);
pub const NON_NEGATIVE_RANGE: (f64, f64) = (0.0, f64::INFINITY);

/// One observation for one tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeRecord {
    pub tree_id: String,
    /// Geographic block tag ("A", "B", "C"), assigned in the field
    #[serde(default)]
    pub cluster_label: Option<String>,
    pub soil_ph: f64,
    pub moisture_pct: f64,
    pub bunch_count: u32,
    pub bunch_weight_kg: f64,
    #[serde(default)]
    pub height_cm: Option<f64>,
    pub has_disease: bool,
}

impl TreeRecord {
    /// Check every reading is finite and physically plausible
    ///
    /// Height is only checked when present; whether it is *required* depends on
    /// the rule table, so the classifier enforces that separately.
    pub fn validate(&self) -> HealthResult<()> {
        check_reading(&self.tree_id, "soil_ph", self.soil_ph, SOIL_PH_RANGE)?;
        check_reading(&self.tree_id, "moisture_pct", self.moisture_pct, MOISTURE_PCT_RANGE)?;
        check_reading(&self.tree_id, "bunch_weight_kg", self.bunch_weight_kg, NON_NEGATIVE_RANGE)?;
        if let Some(height) = self.height_cm {
            check_reading(&self.tree_id, "height_cm", height, NON_NEGATIVE_RANGE)?;
        }
        Ok(())
    }
}

fn check_reading(tree_id: &str, field: &'static str, value: f64, (min, max): (f64, f64)) -> HealthResult<()> {
    if !value.is_finite() {
        return Err(HealthError::NonFinite {
            tree_id: tree_id.to_string(),
            field,
            value,
        });
    }
    if value < min || value > max {
        return Err(HealthError::OutOfRange {
            tree_id: tree_id.to_string(),
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

/// Reject batches that reuse a tree id
pub fn ensure_unique_ids(records: &[TreeRecord]) -> HealthResult<()> {
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    for record in records {
        if !seen.insert(record.tree_id.as_str()) {
            return Err(HealthError::DuplicateTreeId(record.tree_id.clone()));
        }
    }
    Ok(())
}

/// Health classification of a single tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HealthLabel {
    Good,
    Medium,
    Poor,
}

impl HealthLabel {
    pub const ALL: [HealthLabel; 3] = [HealthLabel::Good, HealthLabel::Medium, HealthLabel::Poor];

    pub fn display_text(&self) -> &'static str {
        match self {
            HealthLabel::Good => "Good",
            HealthLabel::Medium => "Medium",
            HealthLabel::Poor => "Poor",
        }
    }

    /// Term used on the estate field sheets
    pub fn source_term(&self) -> &'static str {
        match self {
            HealthLabel::Good => "Baik",
            HealthLabel::Medium => "Sedang",
            HealthLabel::Poor => "Rusak",
        }
    }
}

impl std::fmt::Display for HealthLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> TreeRecord {
        TreeRecord {
            tree_id: id.to_string(),
            cluster_label: Some("A".to_string()),
            soil_ph: 6.2,
            moisture_pct: 34.0,
            bunch_count: 20,
            bunch_weight_kg: 45.0,
            height_cm: None,
            has_disease: false,
        }
    }

    #[test]
    fn test_valid_record_passes() {
        assert!(record("00001").validate().is_ok());
    }

    #[test]
    fn test_ph_outside_physical_range() {
        let mut r = record("00001");
        r.soil_ph = 14.5;
        match r.validate() {
            Err(HealthError::OutOfRange { field, .. }) => assert_eq!(field, "soil_ph"),
            other => panic!("expected OutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn test_nan_moisture_rejected() {
        let mut r = record("00001");
        r.moisture_pct = f64::NAN;
        assert!(matches!(r.validate(), Err(HealthError::NonFinite { field: "moisture_pct", .. })));
    }

    #[test]
    fn test_negative_height_rejected() {
        let mut r = record("00001");
        r.height_cm = Some(-3.0);
        assert!(matches!(r.validate(), Err(HealthError::OutOfRange { field: "height_cm", .. })));
    }

    #[test]
    fn test_duplicate_ids() {
        let batch = vec![record("00001"), record("00002"), record("00001")];
        assert_eq!(
            ensure_unique_ids(&batch),
            Err(HealthError::DuplicateTreeId("00001".to_string()))
        );
    }

    #[test]
    fn test_label_terms() {
        assert_eq!(HealthLabel::Good.source_term(), "Baik");
        assert_eq!(HealthLabel::Poor.to_string(), "Poor");
    }
}
