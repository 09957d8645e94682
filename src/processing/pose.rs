//! Low-pass filtering of compass heading and camera tilt
//!
//! Heading is filtered on the circle so that 359° → 1° is a 2° step, not a
//! 358° one. Tilt is clamped to a plausible holding range and blended more
//! slowly than heading. Both ignore changes inside a small dead-band.

use serde::{Deserialize, Serialize};

use crate::algorithms::geodesy::{angle_difference, normalize_degrees};
use crate::core::DevicePose;

/// Orientation filter tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseConfig {
    /// Fraction of the heading error corrected per sample (0-1, higher = snappier)
    pub heading_smoothing: f64,
    /// Fraction of the tilt error corrected per sample (0-1)
    pub tilt_smoothing: f64,
    /// Changes at or below this are ignored (degrees)
    pub dead_band_deg: f64,
    /// Lowest accepted tilt (degrees)
    pub min_tilt_deg: f64,
    /// Highest accepted tilt (degrees)
    pub max_tilt_deg: f64,
}

impl Default for PoseConfig {
    fn default() -> Self {
        Self {
            heading_smoothing: 0.7,
            tilt_smoothing: 0.3,
            dead_band_deg: 1.0,
            min_tilt_deg: 45.0,
            max_tilt_deg: 135.0,
        }
    }
}

/// Stateful orientation smoother
#[derive(Debug, Clone)]
pub struct PoseSmoother {
    config: PoseConfig,
    pose: DevicePose,
    initialized: bool,
    samples_seen: u64,
    samples_ignored: u64,
}

impl Default for PoseSmoother {
    fn default() -> Self {
        Self::new(PoseConfig::default())
    }
}

impl PoseSmoother {
    pub fn new(config: PoseConfig) -> Self {
        Self {
            config,
            pose: DevicePose::default(),
            initialized: false,
            samples_seen: 0,
            samples_ignored: 0,
        }
    }

    /// Feed one raw orientation sample; returns the updated pose
    ///
    /// The very first sample is adopted as-is.
    pub fn update(&mut self, raw_heading: f64, raw_tilt: f64) -> DevicePose {
        let heading = normalize_degrees(raw_heading);
        let tilt = raw_tilt.clamp(self.config.min_tilt_deg, self.config.max_tilt_deg);
        self.samples_seen += 1;

        if !self.initialized {
            self.pose = DevicePose { heading_deg: heading, tilt_deg: tilt };
            self.initialized = true;
            return self.pose;
        }

        let heading_moved = self.update_heading(heading);
        let tilt_moved = self.update_tilt(tilt);
        if !heading_moved && !tilt_moved {
            self.samples_ignored += 1;
        }

        self.pose
    }

    /// Most recent smoothed pose
    pub fn pose(&self) -> DevicePose {
        self.pose
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Samples that fell entirely inside the dead-band
    pub fn ignored_samples(&self) -> u64 {
        self.samples_ignored
    }

    pub fn total_samples(&self) -> u64 {
        self.samples_seen
    }

    pub fn config(&self) -> &PoseConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: PoseConfig) {
        self.config = config;
    }

    pub fn reset(&mut self) {
        self.pose = DevicePose::default();
        self.initialized = false;
        self.samples_seen = 0;
        self.samples_ignored = 0;
    }

    fn update_heading(&mut self, heading: f64) -> bool {
        let delta = angle_difference(heading, self.pose.heading_deg);
        if delta.abs() <= self.config.dead_band_deg {
            return false;
        }
        self.pose.heading_deg = normalize_degrees(self.pose.heading_deg + delta * self.config.heading_smoothing);
        true
    }

    fn update_tilt(&mut self, tilt: f64) -> bool {
        let delta = tilt - self.pose.tilt_deg;
        if delta.abs() <= self.config.dead_band_deg {
            return false;
        }
        self.pose.tilt_deg += delta * self.config.tilt_smoothing;
        true
    }
}
