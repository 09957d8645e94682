//! Signal strength prediction at unmeasured locations
//!
//! Inverse-distance weighting over the known readings. The estimate is only
//! offered once enough readings exist to make it meaningful.

use crate::algorithms::geodesy::distance_meters;
use crate::core::{Coordinate, Reading};

/// Fewest readings needed before predictions are offered
pub const MIN_TRAINING_READINGS: usize = 5;

/// Inverse-distance-weighted signal estimator
#[derive(Debug, Clone)]
pub struct SignalPredictor {
    /// Distance exponent; larger values favor the closest readings
    pub power: f64,
    /// Readings within this distance count as an exact hit (meters)
    pub exact_match_m: f64,
    /// Readings beyond this distance are ignored (meters)
    pub search_radius_m: f64,
}

impl Default for SignalPredictor {
    fn default() -> Self {
        Self {
            power: 2.0,
            exact_match_m: 0.5,
            search_radius_m: 500.0,
        }
    }
}

impl SignalPredictor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Predicted signal (dBm) at `location`, or `None` when there is not
    /// enough nearby data
    pub fn predict<C>(&self, location: &C, readings: &[Reading]) -> Option<i32>
    where
        C: Coordinate + ?Sized,
    {
        if readings.len() < MIN_TRAINING_READINGS {
            return None;
        }

        let mut weighted_sum = 0.0;
        let mut weight_total = 0.0;

        for reading in readings {
            let distance = distance_meters(location, reading);
            if distance <= self.exact_match_m {
                return Some(reading.signal_dbm);
            }
            if distance > self.search_radius_m {
                continue;
            }
            let weight = 1.0 / distance.powf(self.power);
            weighted_sum += weight * reading.signal_dbm as f64;
            weight_total += weight;
        }

        if weight_total > 0.0 {
            Some((weighted_sum / weight_total).round() as i32)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::geodesy::destination_point;
    use crate::core::{ConnectionType, ReadingOrigin};
    use chrono::Utc;
    use uuid::Uuid;

    fn reading(lat: f64, lon: f64, signal: i32) -> Reading {
        Reading {
            id: Uuid::new_v4(),
            latitude: lat,
            longitude: lon,
            signal_dbm: signal,
            latency_ms: 30,
            bandwidth_mbps: 60.0,
            quality_percent: 60,
            connection_type: ConnectionType::Wifi,
            provider_name: "home".to_string(),
            captured_at: Utc::now(),
            origin: ReadingOrigin::Local,
        }
    }

    fn ring(center: (f64, f64), signals: &[i32]) -> Vec<Reading> {
        signals
            .iter()
            .enumerate()
            .map(|(i, &signal)| {
                let bearing = i as f64 * 360.0 / signals.len() as f64;
                let (lat, lon) = destination_point(&center, bearing, 20.0);
                reading(lat, lon, signal)
            })
            .collect()
    }

    #[test]
    fn test_needs_minimum_readings() {
        let predictor = SignalPredictor::new();
        let readings = ring((10.0, 10.0), &[-60, -60, -60, -60]);
        assert_eq!(predictor.predict(&(10.0, 10.0), &readings), None);
    }

    #[test]
    fn test_uniform_field_predicts_same_value() {
        let predictor = SignalPredictor::new();
        let readings = ring((10.0, 10.0), &[-65; 6]);
        assert_eq!(predictor.predict(&(10.0, 10.0), &readings), Some(-65));
    }

    #[test]
    fn test_exact_location_returns_measured_signal() {
        let predictor = SignalPredictor::new();
        let mut readings = ring((10.0, 10.0), &[-80; 5]);
        readings.push(reading(10.0, 10.0, -42));
        assert_eq!(predictor.predict(&(10.0, 10.0), &readings), Some(-42));
    }

    #[test]
    fn test_prediction_leans_toward_nearest() {
        let predictor = SignalPredictor::new();
        let mut readings = ring((10.0, 10.0), &[-80; 5]);
        let (lat, lon) = destination_point(&(10.0, 10.0), 45.0, 2.0);
        readings.push(reading(lat, lon, -40));

        let predicted = predictor.predict(&(10.0, 10.0), &readings).unwrap();
        assert!(predicted > -60, "predicted {}", predicted);
    }

    #[test]
    fn test_no_readings_in_radius() {
        let predictor = SignalPredictor::new();
        let readings = ring((10.0, 10.0), &[-70; 5]);
        assert_eq!(predictor.predict(&(11.0, 11.0), &readings), None);
    }
}
