//! Batch-local z-score standardization
//!
//! Means and standard deviations come from the batch being clustered and are
//! discarded afterwards; nothing is carried between batches.

use crate::error::{HealthError, HealthResult};
use crate::record::TreeRecord;

pub const N_FEATURES: usize = 3;

/// (soil_ph, moisture_pct, bunch_count)
pub type FeatureVector = [f64; N_FEATURES];

pub const FEATURE_NAMES: [&str; N_FEATURES] = ["soil_ph", "moisture_pct", "bunch_count"];

/// Below this a feature counts as constant
const MIN_STD: f64 = 1e-12;

pub fn feature_vector(record: &TreeRecord) -> FeatureVector {
    [record.soil_ph, record.moisture_pct, f64::from(record.bunch_count)]
}

/// Fitted per-feature mean and scale
#[derive(Debug, Clone, PartialEq)]
pub struct Standardizer {
    pub means: FeatureVector,
    /// Population standard deviation, or 1.0 for a constant feature
    pub scales: FeatureVector,
}

impl Standardizer {
    pub fn fit(points: &[FeatureVector]) -> HealthResult<Self> {
        if points.is_empty() {
            return Err(HealthError::EmptyBatch);
        }
        let n = points.len() as f64;

        let mut means = [0.0; N_FEATURES];
        for p in points {
            for (m, v) in means.iter_mut().zip(p) {
                *m += v;
            }
        }
        for m in &mut means {
            *m /= n;
        }

        let mut scales = [0.0; N_FEATURES];
        for p in points {
            for j in 0..N_FEATURES {
                scales[j] += (p[j] - means[j]).powi(2);
            }
        }

        let mut constant = 0;
        for s in &mut scales {
            *s = (*s / n).sqrt();
            if *s < MIN_STD {
                *s = 1.0;
                constant += 1;
            }
        }

        if constant == N_FEATURES {
            return Err(HealthError::DegenerateFeatures);
        }

        Ok(Self { means, scales })
    }

    pub fn transform(&self, point: &FeatureVector) -> FeatureVector {
        let mut out = [0.0; N_FEATURES];
        for j in 0..N_FEATURES {
            out[j] = (point[j] - self.means[j]) / self.scales[j];
        }
        out
    }

    pub fn transform_all(&self, points: &[FeatureVector]) -> Vec<FeatureVector> {
        points.iter().map(|p| self.transform(p)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_zero_mean_unit_variance() {
        let points = vec![[5.0, 20.0, 8.0], [6.0, 30.0, 14.0], [7.0, 40.0, 20.0]];
        let scaler = Standardizer::fit(&points).unwrap();
        let z = scaler.transform_all(&points);

        for j in 0..N_FEATURES {
            let mean: f64 = z.iter().map(|p| p[j]).sum::<f64>() / 3.0;
            let var: f64 = z.iter().map(|p| p[j].powi(2)).sum::<f64>() / 3.0;
            assert_relative_eq!(mean, 0.0, epsilon = 1e-12);
            assert_relative_eq!(var, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_constant_feature_maps_to_zero() {
        let points = vec![[6.0, 20.0, 8.0], [6.0, 30.0, 14.0]];
        let scaler = Standardizer::fit(&points).unwrap();
        assert_eq!(scaler.scales[0], 1.0);
        assert_eq!(scaler.transform(&points[1])[0], 0.0);
    }

    #[test]
    fn test_all_constant_is_degenerate() {
        let points = vec![[6.0, 30.0, 14.0]; 5];
        assert_eq!(Standardizer::fit(&points), Err(HealthError::DegenerateFeatures));
    }

    #[test]
    fn test_empty() {
        assert_eq!(Standardizer::fit(&[]), Err(HealthError::EmptyBatch));
    }
}
