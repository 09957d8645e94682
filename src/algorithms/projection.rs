//! Per-frame AR projection of readings onto the camera view
//!
//! Given the smoothed position, the smoothed pose and the reading set, the
//! projector culls everything outside the horizontal field of view or past
//! the render distance, and places the rest in viewport percentages:
//!
//! - x is a linear map of the relative bearing across the viewport width
//! - y sits below a horizon line that tilting the device moves up and down;
//!   points converge on the horizon as they get farther away
//! - scale shrinks with distance but never below `min_scale`
//! - z order grows as points get closer, so near points draw on top
//!
//! Projection is a pure function of its inputs.

use serde::{Deserialize, Serialize};

use crate::algorithms::geodesy::{angle_difference, bearing_degrees, distance_meters};
use crate::core::{DevicePose, Reading, ScreenProjection, SmoothedPosition, UPRIGHT_TILT_DEG};

/// Resolution of the z order range
const Z_ORDER_STEPS: f64 = 1000.0;

/// Camera and perspective parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionConfig {
    /// Horizontal camera field of view (degrees)
    pub horizontal_fov_deg: f64,
    /// Vertical camera field of view (degrees)
    pub vertical_fov_deg: f64,
    /// Readings farther than this are not drawn (meters)
    pub max_render_distance_m: f64,
    /// Distance at which a marker is drawn at half of `max_scale` (meters)
    pub reference_distance_m: f64,
    /// Smallest marker scale, keeps distant markers legible
    pub min_scale: f64,
    /// Marker scale at zero distance
    pub max_scale: f64,
    /// How far below the horizon a marker at zero distance sits (percent of height)
    pub horizon_drop_percent: f64,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            horizontal_fov_deg: 60.0,
            vertical_fov_deg: 45.0,
            max_render_distance_m: 100.0,
            reference_distance_m: 10.0,
            min_scale: 0.35,
            max_scale: 1.5,
            horizon_drop_percent: 40.0,
        }
    }
}

/// Projects readings into screen space
#[derive(Debug, Clone, Default)]
pub struct ArProjector {
    config: ProjectionConfig,
}

impl ArProjector {
    pub fn new(config: ProjectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ProjectionConfig) {
        self.config = config;
    }

    /// Project every reading and return the visible ones, farthest first
    ///
    /// Readings missing from the result are not visible this frame.
    pub fn project(
        &self,
        position: &SmoothedPosition,
        pose: &DevicePose,
        readings: &[Reading],
    ) -> Vec<ScreenProjection> {
        let mut frame: Vec<ScreenProjection> = readings
            .iter()
            .filter_map(|reading| self.project_reading(position, pose, reading))
            .collect();

        frame.sort_by_key(|projection| projection.z_order);
        frame
    }

    /// Project a single reading; `None` when it is culled
    pub fn project_reading(
        &self,
        position: &SmoothedPosition,
        pose: &DevicePose,
        reading: &Reading,
    ) -> Option<ScreenProjection> {
        let distance = distance_meters(position, reading);
        if distance > self.config.max_render_distance_m {
            return None;
        }

        let bearing = bearing_degrees(position, reading);
        let relative_angle = angle_difference(bearing, pose.heading_deg);
        let half_fov = self.config.horizontal_fov_deg / 2.0;
        if relative_angle.abs() > half_fov {
            return None;
        }

        let near_factor = self.near_factor(distance);

        Some(ScreenProjection {
            reading_id: reading.id,
            visible: true,
            screen_x_percent: (50.0 + relative_angle / half_fov * 50.0).clamp(0.0, 100.0),
            screen_y_percent: self.screen_y(near_factor, pose.tilt_deg),
            scale: (self.config.max_scale * near_factor).max(self.config.min_scale),
            z_order: self.z_order(distance),
            distance_m: distance,
        })
    }

    /// Vertical position of the horizon for a given tilt (percent of height)
    ///
    /// Tilting the camera up (tilt above 90) pushes the horizon down the frame.
    pub fn horizon_percent(&self, tilt_deg: f64) -> f64 {
        let half_vfov = self.config.vertical_fov_deg / 2.0;
        50.0 + (tilt_deg - UPRIGHT_TILT_DEG) / half_vfov * 50.0
    }

    /// 1.0 at the device, approaching 0 with distance
    fn near_factor(&self, distance: f64) -> f64 {
        let reference = self.config.reference_distance_m.max(f64::EPSILON);
        reference / (reference + distance)
    }

    fn screen_y(&self, near_factor: f64, tilt_deg: f64) -> f64 {
        let horizon = self.horizon_percent(tilt_deg);
        (horizon + self.config.horizon_drop_percent * near_factor).clamp(0.0, 100.0)
    }

    fn z_order(&self, distance: f64) -> u32 {
        let max = self.config.max_render_distance_m.max(f64::EPSILON);
        ((1.0 - distance / max).clamp(0.0, 1.0) * Z_ORDER_STEPS).round() as u32
    }
}
