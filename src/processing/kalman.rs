use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::core::{GeoPoint, SmoothedPosition, MIN_ACCURACY_M};

/// Location filter tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmoothingConfig {
    /// Reported accuracies below this are raised to it (meters)
    pub min_accuracy_m: f64,
    /// Variance added before every update (m²); 0 disables the motion term
    pub process_noise_m2: f64,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            min_accuracy_m: MIN_ACCURACY_M,
            process_noise_m2: 0.0,
        }
    }
}

/// Scalar Kalman filter for GPS fixes
/// State: [lat, lon] sharing one variance, measured in m²
#[derive(Debug, Clone)]
pub struct LocationSmoother {
    /// Current estimate [lat, lon]
    estimate: Vector2<f64>,
    /// Estimate variance; `None` until the first fix
    variance: Option<f64>,
    /// Filter tuning
    config: SmoothingConfig,
    /// Most recent raw fix, with its accuracy already floored
    last_sample: Option<GeoPoint>,
    /// Number of fixes consumed since the last reset
    sample_count: u64,
}

impl Default for LocationSmoother {
    fn default() -> Self {
        Self::new(SmoothingConfig::default())
    }
}

impl LocationSmoother {
    /// Create an uninitialized smoother
    pub fn new(config: SmoothingConfig) -> Self {
        Self {
            estimate: Vector2::zeros(),
            variance: None,
            config,
            last_sample: None,
            sample_count: 0,
        }
    }

    /// Fold a new fix into the estimate
    pub fn update(&mut self, sample: &GeoPoint) -> SmoothedPosition {
        let floor = self.floor();
        let accuracy = sample.accuracy_m.max(floor);
        let measurement_variance = accuracy * accuracy;
        let measurement = Vector2::new(sample.latitude, sample.longitude);

        let variance = match self.variance {
            None => {
                // First fix: adopt it directly
                self.estimate = measurement;
                measurement_variance
            }
            Some(previous) => {
                let predicted = previous + self.config.process_noise_m2.max(0.0);
                let gain = predicted / (predicted + measurement_variance);
                self.estimate += (measurement - self.estimate) * gain;
                predicted * (1.0 - gain)
            }
        };

        self.variance = Some(variance.max(floor * floor));
        self.last_sample = Some(GeoPoint { accuracy_m: accuracy, ..*sample });
        self.sample_count += 1;

        self.snapshot(variance.max(floor * floor))
    }

    /// Current estimate, if any fix has been seen
    pub fn current(&self) -> Option<SmoothedPosition> {
        self.variance.map(|variance| self.snapshot(variance))
    }

    /// Most recent raw fix (accuracy floored)
    pub fn last_sample(&self) -> Option<&GeoPoint> {
        self.last_sample.as_ref()
    }

    /// Check if the smoother has seen a fix
    pub fn is_initialized(&self) -> bool {
        self.variance.is_some()
    }

    pub fn sample_count(&self) -> u64 {
        self.sample_count
    }

    /// Forget all state
    pub fn reset(&mut self) {
        self.estimate = Vector2::zeros();
        self.variance = None;
        self.last_sample = None;
        self.sample_count = 0;
    }

    pub fn config(&self) -> &SmoothingConfig {
        &self.config
    }

    /// Change the tuning; the running estimate is kept
    pub fn set_config(&mut self, config: SmoothingConfig) {
        self.config = config;
    }

    fn floor(&self) -> f64 {
        self.config.min_accuracy_m.max(f64::MIN_POSITIVE)
    }

    fn snapshot(&self, variance: f64) -> SmoothedPosition {
        SmoothedPosition {
            latitude: self.estimate.x,
            longitude: self.estimate.y,
            uncertainty: variance.sqrt(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_first_fix_is_adopted() {
        let mut smoother = LocationSmoother::default();
        assert!(!smoother.is_initialized());
        assert!(smoother.current().is_none());

        let position = smoother.update(&GeoPoint::new(48.0, 11.0, 8.0));

        assert!(smoother.is_initialized());
        assert_eq!(position.latitude, 48.0);
        assert_eq!(position.longitude, 11.0);
        assert_abs_diff_eq!(position.uncertainty, 8.0, epsilon = 1e-12);
    }

    #[test]
    fn test_equal_accuracy_averages() {
        let mut smoother = LocationSmoother::default();
        smoother.update(&GeoPoint::new(0.0, 0.0, 5.0));
        let position = smoother.update(&GeoPoint::new(0.001, 0.002, 5.0));

        assert_abs_diff_eq!(position.latitude, 0.0005, epsilon = 1e-12);
        assert_abs_diff_eq!(position.longitude, 0.001, epsilon = 1e-12);
        assert_abs_diff_eq!(position.uncertainty, (12.5f64).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_accurate_fix_dominates() {
        let mut smoother = LocationSmoother::default();
        smoother.update(&GeoPoint::new(0.0, 0.0, 50.0));
        let position = smoother.update(&GeoPoint::new(1.0, 1.0, 2.0));
        assert!(position.latitude > 0.99);
    }

    #[test]
    fn test_accuracy_floor_applied() {
        let mut smoother = LocationSmoother::default();
        let position = smoother.update(&GeoPoint::new(0.0, 0.0, 0.0));
        assert_abs_diff_eq!(position.uncertainty, MIN_ACCURACY_M, epsilon = 1e-12);
        assert_eq!(smoother.last_sample().unwrap().accuracy_m, MIN_ACCURACY_M);
    }

    #[test]
    fn test_uncertainty_non_increasing_without_process_noise() {
        let mut smoother = LocationSmoother::default();
        let accuracies = [30.0, 5.0, 80.0, 1.0, 0.2, 200.0, 12.0, 3.0, 3.0, 500.0];
        let mut previous = f64::MAX;
        for (i, accuracy) in accuracies.iter().enumerate() {
            let position = smoother.update(&GeoPoint::new(10.0 + i as f64 * 1e-5, 20.0, *accuracy));
            assert!(position.uncertainty <= previous);
            assert!(position.uncertainty >= MIN_ACCURACY_M);
            previous = position.uncertainty;
        }
    }

    #[test]
    fn test_uncertainty_never_below_floor() {
        let mut smoother = LocationSmoother::default();
        for _ in 0..500 {
            smoother.update(&GeoPoint::new(1.0, 1.0, 1.0));
        }
        assert_abs_diff_eq!(smoother.current().unwrap().uncertainty, MIN_ACCURACY_M, epsilon = 1e-12);
    }

    #[test]
    fn test_process_noise_keeps_filter_responsive() {
        let mut stiff = LocationSmoother::default();
        let mut responsive = LocationSmoother::new(SmoothingConfig {
            process_noise_m2: 4.0,
            ..Default::default()
        });

        for _ in 0..200 {
            stiff.update(&GeoPoint::new(0.0, 0.0, 5.0));
            responsive.update(&GeoPoint::new(0.0, 0.0, 5.0));
        }
        let stiff_pos = stiff.update(&GeoPoint::new(0.001, 0.0, 5.0));
        let responsive_pos = responsive.update(&GeoPoint::new(0.001, 0.0, 5.0));

        assert!(responsive_pos.latitude > stiff_pos.latitude * 5.0);
    }

    #[test]
    fn test_reset() {
        let mut smoother = LocationSmoother::default();
        smoother.update(&GeoPoint::new(1.0, 2.0, 3.0));
        smoother.reset();
        assert!(!smoother.is_initialized());
        assert_eq!(smoother.sample_count(), 0);
        assert!(smoother.last_sample().is_none());
    }
}
