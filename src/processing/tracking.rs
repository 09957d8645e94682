//! Automatic and manual capture decisions
//!
//! Automatic captures are spaced by distance walked, which gives the survey
//! a fixed spatial resolution and keeps a stationary device from flooding
//! the store. Fixes that are too uncertain never trigger a capture.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::algorithms::geodesy::distance_meters;
use crate::core::{GeoPoint, SmoothedPosition};

/// Capture policy tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Distance to walk between automatic captures (meters)
    pub movement_threshold_m: f64,
    /// Raw fixes less accurate than this never trigger a capture (meters)
    pub max_accuracy_m: f64,
    /// Whether automatic capture is active at all
    pub auto_capture: bool,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            movement_threshold_m: 3.0,
            max_accuracy_m: 25.0,
            auto_capture: true,
        }
    }
}

/// Outcome of evaluating a new position for automatic capture
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CaptureDecision {
    /// Take a reading here
    Capture,
    /// The raw fix behind this position is too uncertain
    TooInaccurate { accuracy_m: f64, ceiling_m: f64 },
    /// Not far enough from the previous automatic capture
    NotMovedEnough { distance_m: f64 },
    /// Automatic capture is switched off
    Disabled,
}

impl CaptureDecision {
    pub fn should_capture(&self) -> bool {
        matches!(self, CaptureDecision::Capture)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackingError {
    #[error("no position fix available yet")]
    NoFix,
}

/// Decides when new readings are taken
#[derive(Debug, Clone, Default)]
pub struct TrackingController {
    config: TrackingConfig,
    last_capture: Option<(f64, f64)>,
    auto_captures: u64,
    manual_captures: u64,
}

impl TrackingController {
    pub fn new(config: TrackingConfig) -> Self {
        Self {
            config,
            last_capture: None,
            auto_captures: 0,
            manual_captures: 0,
        }
    }

    /// Evaluate a position without changing any state
    pub fn evaluate(&self, position: &SmoothedPosition, raw: &GeoPoint) -> CaptureDecision {
        if !self.config.auto_capture {
            return CaptureDecision::Disabled;
        }

        if raw.accuracy_m > self.config.max_accuracy_m {
            return CaptureDecision::TooInaccurate {
                accuracy_m: raw.accuracy_m,
                ceiling_m: self.config.max_accuracy_m,
            };
        }

        match self.last_capture {
            None => CaptureDecision::Capture,
            Some(last) => {
                let distance_m = distance_meters(&last, position);
                if distance_m >= self.config.movement_threshold_m {
                    CaptureDecision::Capture
                } else {
                    CaptureDecision::NotMovedEnough { distance_m }
                }
            }
        }
    }

    /// Evaluate a new smoothed position and, on capture, remember it as the
    /// latest automatic capture point
    pub fn on_position(&mut self, position: &SmoothedPosition, raw: &GeoPoint) -> CaptureDecision {
        let decision = self.evaluate(position, raw);
        if decision.should_capture() {
            self.last_capture = Some((position.latitude, position.longitude));
            self.auto_captures += 1;
        }
        decision
    }

    /// Manual capture only needs a fix; it does not move the automatic
    /// capture point
    pub fn manual_capture(&mut self, current: Option<SmoothedPosition>) -> Result<SmoothedPosition, TrackingError> {
        let position = current.ok_or(TrackingError::NoFix)?;
        self.manual_captures += 1;
        Ok(position)
    }

    pub fn last_capture_location(&self) -> Option<(f64, f64)> {
        self.last_capture
    }

    pub fn auto_capture_count(&self) -> u64 {
        self.auto_captures
    }

    pub fn manual_capture_count(&self) -> u64 {
        self.manual_captures
    }

    pub fn config(&self) -> &TrackingConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: TrackingConfig) {
        self.config = config;
    }

    /// Forget the last capture point so the next good fix captures at once
    pub fn reset(&mut self) {
        self.last_capture = None;
        self.auto_captures = 0;
        self.manual_captures = 0;
    }
}
