//! Core data types for the survey pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::constants::UPRIGHT_TILT_DEG;

/// Anything with a latitude and longitude in decimal degrees
pub trait Coordinate {
    fn latitude(&self) -> f64;
    fn longitude(&self) -> f64;
}

/// Raw location fix as produced by the platform
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    /// Reported horizontal accuracy (meters, 1 sigma)
    pub accuracy_m: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64, accuracy_m: f64) -> Self {
        Self { latitude, longitude, accuracy_m }
    }
}

/// Filtered location estimate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmoothedPosition {
    pub latitude: f64,
    pub longitude: f64,
    /// Filter standard deviation (meters), never a raw GPS accuracy
    pub uncertainty: f64,
}

/// Smoothed device orientation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DevicePose {
    /// Compass heading, clockwise from true north, in [0, 360)
    pub heading_deg: f64,
    /// Camera pitch; 90 means the camera looks at the horizon
    pub tilt_deg: f64,
}

impl Default for DevicePose {
    fn default() -> Self {
        Self {
            heading_deg: 0.0,
            tilt_deg: UPRIGHT_TILT_DEG,
        }
    }
}

/// Link technology a reading was taken over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionType {
    Wifi,
    Cellular,
    Ethernet,
    Unknown,
}

/// Where a reading came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingOrigin {
    /// Captured on this device
    Local,
    /// Fetched from (or confirmed by) the remote backend
    Cloud,
}

/// Snapshot returned by the network statistics collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkStats {
    pub signal_dbm: i32,
    pub latency_ms: u32,
    pub bandwidth_mbps: f64,
    /// Link quality in percent; some platforms do not report it
    pub quality_percent: Option<u8>,
    pub connection_type: ConnectionType,
    pub provider_name: String,
}

impl NetworkStats {
    /// Stats used until the first successful measurement arrives
    pub fn fallback() -> Self {
        Self {
            signal_dbm: -60,
            latency_ms: 25,
            bandwidth_mbps: 50.0,
            quality_percent: Some(75),
            connection_type: ConnectionType::Wifi,
            provider_name: "Unknown".to_string(),
        }
    }
}

/// A network quality measurement tied to a location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub signal_dbm: i32,
    pub latency_ms: u32,
    pub bandwidth_mbps: f64,
    pub quality_percent: u8,
    pub connection_type: ConnectionType,
    pub provider_name: String,
    pub captured_at: DateTime<Utc>,
    pub origin: ReadingOrigin,
}

impl Reading {
    /// Capture a new local reading at the given position
    pub fn capture(position: &SmoothedPosition, stats: &NetworkStats, captured_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            latitude: position.latitude,
            longitude: position.longitude,
            signal_dbm: stats.signal_dbm,
            latency_ms: stats.latency_ms,
            bandwidth_mbps: stats.bandwidth_mbps,
            quality_percent: stats
                .quality_percent
                .unwrap_or_else(|| crate::algorithms::quality::estimate_quality_percent(stats.signal_dbm)),
            connection_type: stats.connection_type,
            provider_name: stats.provider_name.clone(),
            captured_at,
            origin: ReadingOrigin::Local,
        }
    }
}

/// Where a reading lands on screen for the current frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScreenProjection {
    pub reading_id: Uuid,
    pub visible: bool,
    /// Horizontal position, 0 = left edge, 100 = right edge
    pub screen_x_percent: f64,
    /// Vertical position, 0 = top edge, 100 = bottom edge
    pub screen_y_percent: f64,
    pub scale: f64,
    /// Higher values draw on top
    pub z_order: u32,
    pub distance_m: f64,
}

impl Coordinate for GeoPoint {
    fn latitude(&self) -> f64 {
        self.latitude
    }
    fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl Coordinate for SmoothedPosition {
    fn latitude(&self) -> f64 {
        self.latitude
    }
    fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl Coordinate for Reading {
    fn latitude(&self) -> f64 {
        self.latitude
    }
    fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl Coordinate for (f64, f64) {
    fn latitude(&self) -> f64 {
        self.0
    }
    fn longitude(&self) -> f64 {
        self.1
    }
}
