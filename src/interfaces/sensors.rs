//! Sensor subscription events

use serde::{Deserialize, Serialize};

use crate::algorithms::geodesy::normalize_degrees;
use crate::core::GeoPoint;

/// Which platform sensor an event concerns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorKind {
    Location,
    Orientation,
}

/// One raw orientation reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientationSample {
    /// Compass heading, clockwise from north (degrees)
    pub heading_deg: f64,
    /// Camera pitch, 90 = upright (degrees)
    pub tilt_deg: f64,
}

impl OrientationSample {
    pub fn new(heading_deg: f64, tilt_deg: f64) -> Self {
        Self { heading_deg, tilt_deg }
    }

    /// Convert device orientation angles, where `alpha` rotates
    /// counter-clockwise about the screen normal and `beta` is the
    /// front-to-back pitch
    pub fn from_device_angles(alpha: f64, beta: f64) -> Self {
        Self {
            heading_deg: normalize_degrees(360.0 - alpha),
            tilt_deg: beta,
        }
    }
}

/// Events delivered by the platform sensor subscriptions
#[derive(Debug, Clone, PartialEq)]
pub enum SensorEvent {
    Location { timestamp_ms: u64, point: GeoPoint },
    Orientation { timestamp_ms: u64, sample: OrientationSample },
    /// Permission denied or hardware missing
    Unavailable { sensor: SensorKind, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_angles_to_compass() {
        let sample = OrientationSample::from_device_angles(0.0, 90.0);
        assert_eq!(sample.heading_deg, 0.0);
        assert_eq!(sample.tilt_deg, 90.0);

        let sample = OrientationSample::from_device_angles(90.0, 70.0);
        assert_eq!(sample.heading_deg, 270.0);

        let sample = OrientationSample::from_device_angles(270.0, 70.0);
        assert_eq!(sample.heading_deg, 90.0);
    }
}
