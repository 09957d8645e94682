//! Raw sensor sample validation
//!
//! Samples that fail here are transient measurement errors: the session
//! drops them before they reach the smoothers and keeps going.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::GeoPoint;
use crate::interfaces::sensors::OrientationSample;

/// Limits applied to incoming samples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Fixes reporting a worse accuracy than this are rejected outright (meters)
    pub max_plausible_accuracy_m: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_plausible_accuracy_m: 10_000.0,
        }
    }
}

/// Why a sample was rejected
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("non-finite {field} in sensor sample")]
    NonFinite { field: &'static str },
    #[error("latitude {0} outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} outside [-180, 180]")]
    LongitudeOutOfRange(f64),
    #[error("negative accuracy {0} m")]
    NegativeAccuracy(f64),
    #[error("accuracy {accuracy_m:.0} m exceeds plausible limit of {limit_m:.0} m")]
    ImplausibleAccuracy { accuracy_m: f64, limit_m: f64 },
}

/// Checks samples and keeps acceptance counts
#[derive(Debug, Clone, Default)]
pub struct SampleValidator {
    config: ValidationConfig,
    accepted: u64,
    rejected: u64,
}

impl SampleValidator {
    pub fn new(config: ValidationConfig) -> Self {
        Self {
            config,
            accepted: 0,
            rejected: 0,
        }
    }

    /// Validate a location fix
    pub fn check_location(&mut self, point: &GeoPoint) -> Result<(), ValidationError> {
        let result = self.location_rules(point);
        self.count(&result);
        result
    }

    /// Validate an orientation sample
    pub fn check_orientation(&mut self, sample: &OrientationSample) -> Result<(), ValidationError> {
        let result = finite("heading", sample.heading_deg).and_then(|_| finite("tilt", sample.tilt_deg));
        self.count(&result);
        result
    }

    fn location_rules(&self, point: &GeoPoint) -> Result<(), ValidationError> {
        finite("latitude", point.latitude)?;
        finite("longitude", point.longitude)?;
        finite("accuracy", point.accuracy_m)?;

        if !(-90.0..=90.0).contains(&point.latitude) {
            return Err(ValidationError::LatitudeOutOfRange(point.latitude));
        }
        if !(-180.0..=180.0).contains(&point.longitude) {
            return Err(ValidationError::LongitudeOutOfRange(point.longitude));
        }
        if point.accuracy_m < 0.0 {
            return Err(ValidationError::NegativeAccuracy(point.accuracy_m));
        }
        if point.accuracy_m > self.config.max_plausible_accuracy_m {
            return Err(ValidationError::ImplausibleAccuracy {
                accuracy_m: point.accuracy_m,
                limit_m: self.config.max_plausible_accuracy_m,
            });
        }
        Ok(())
    }

    fn count(&mut self, result: &Result<(), ValidationError>) {
        match result {
            Ok(()) => self.accepted += 1,
            Err(_) => self.rejected += 1,
        }
    }

    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Swap the limits; counts carry over
    pub fn set_config(&mut self, config: ValidationConfig) {
        self.config = config;
    }
}

fn finite(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NonFinite { field })
    }
}
