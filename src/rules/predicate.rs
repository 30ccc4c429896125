//! Bracket predicates
//!
//! A bracket either tests a numeric reading against a band with optional,
//! independently inclusive bounds, or tests a boolean flag for equality.

use serde::{Deserialize, Serialize};

fn inclusive() -> bool {
    true
}

fn is_true(v: &bool) -> bool {
    *v
}

/// Condition a reading must satisfy for a bracket to award its points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Predicate {
    /// Numeric band; a missing bound is unbounded on that side
    Range {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
        #[serde(default = "inclusive", skip_serializing_if = "is_true")]
        min_inclusive: bool,
        #[serde(default = "inclusive", skip_serializing_if = "is_true")]
        max_inclusive: bool,
    },
    /// Boolean equality
    Flag { equals: bool },
}

impl Predicate {
    /// `[min, max]`
    pub fn between(min: f64, max: f64) -> Self {
        Predicate::Range { min: Some(min), max: Some(max), min_inclusive: true, max_inclusive: true }
    }

    /// `[min, max)`
    pub fn from_up_to(min: f64, max: f64) -> Self {
        Predicate::Range { min: Some(min), max: Some(max), min_inclusive: true, max_inclusive: false }
    }

    /// `(min, max]`
    pub fn above_up_to(min: f64, max: f64) -> Self {
        Predicate::Range { min: Some(min), max: Some(max), min_inclusive: false, max_inclusive: true }
    }

    /// `[min, +inf)`
    pub fn at_least(min: f64) -> Self {
        Predicate::Range { min: Some(min), max: None, min_inclusive: true, max_inclusive: true }
    }

    pub fn flag(equals: bool) -> Self {
        Predicate::Flag { equals }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Predicate::Range { .. })
    }

    /// Numeric test; a flag predicate never matches a number
    pub fn matches_number(&self, value: f64) -> bool {
        match *self {
            Predicate::Range { min, max, min_inclusive, max_inclusive } => {
                let above = match min {
                    Some(lo) if min_inclusive => value >= lo,
                    Some(lo) => value > lo,
                    None => true,
                };
                let below = match max {
                    Some(hi) if max_inclusive => value <= hi,
                    Some(hi) => value < hi,
                    None => true,
                };
                above && below
            }
            Predicate::Flag { .. } => false,
        }
    }

    /// Flag test; a range predicate never matches a flag
    pub fn matches_flag(&self, value: bool) -> bool {
        match *self {
            Predicate::Flag { equals } => value == equals,
            Predicate::Range { .. } => false,
        }
    }

    /// Bounds are finite and ordered
    pub(crate) fn check_bounds(&self) -> Result<(), String> {
        if let Predicate::Range { min, max, .. } = *self {
            for bound in [min, max].into_iter().flatten() {
                if !bound.is_finite() {
                    return Err(format!("non-finite bound {}", bound));
                }
            }
            if let (Some(lo), Some(hi)) = (min, max) {
                if lo > hi {
                    return Err(format!("lower bound {} exceeds upper bound {}", lo, hi));
                }
            }
        }
        Ok(())
    }

    /// Short human description, e.g. "[5.5, 7]" or "≥ 30"
    pub fn describe(&self) -> String {
        match *self {
            Predicate::Range { min: Some(lo), max: None, min_inclusive, .. } => {
                format!("{} {}", if min_inclusive { "≥" } else { ">" }, lo)
            }
            Predicate::Range { min: None, max: Some(hi), max_inclusive, .. } => {
                format!("{} {}", if max_inclusive { "≤" } else { "<" }, hi)
            }
            Predicate::Range { min: Some(lo), max: Some(hi), min_inclusive, max_inclusive } => format!(
                "{}{}, {}{}",
                if min_inclusive { "[" } else { "(" },
                lo,
                hi,
                if max_inclusive { "]" } else { ")" }
            ),
            Predicate::Range { min: None, max: None, .. } => "any".to_string(),
            Predicate::Flag { equals } => format!("= {}", equals),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inclusive_band_edges() {
        let optimal = Predicate::between(5.5, 7.0);
        assert!(optimal.matches_number(5.5));
        assert!(optimal.matches_number(7.0));
        assert!(!optimal.matches_number(5.49));
        assert!(!optimal.matches_number(7.01));
    }

    #[test]
    fn test_half_open_bands() {
        let low = Predicate::from_up_to(5.0, 5.5);
        assert!(low.matches_number(5.0));
        assert!(!low.matches_number(5.5));

        let high = Predicate::above_up_to(7.0, 7.5);
        assert!(!high.matches_number(7.0));
        assert!(high.matches_number(7.5));
    }

    #[test]
    fn test_flag_and_range_do_not_cross_match() {
        assert!(!Predicate::flag(false).matches_number(0.0));
        assert!(!Predicate::at_least(0.0).matches_flag(true));
        assert!(Predicate::flag(false).matches_flag(false));
    }

    #[test]
    fn test_json_defaults_to_inclusive() {
        let p: Predicate = serde_json::from_str(r#"{"kind": "range", "min": 30}"#).unwrap();
        assert_eq!(p, Predicate::at_least(30.0));
        assert!(p.matches_number(30.0));
    }

    #[test]
    fn test_bounds_checked() {
        assert!(Predicate::between(7.0, 5.0).check_bounds().is_err());
        assert!(Predicate::between(f64::NAN, 5.0).check_bounds().is_err());
        assert!(Predicate::between(5.0, 7.0).check_bounds().is_ok());
    }

    #[test]
    fn test_describe() {
        assert_eq!(Predicate::at_least(30.0).describe(), "≥ 30");
        assert_eq!(Predicate::from_up_to(5.0, 5.5).describe(), "[5, 5.5)");
    }
}
