//! Signal strength classification shared by the AR overlay and the map

use serde::{Deserialize, Serialize};

/// Lower edge of the heatmap intensity range (dBm)
pub const INTENSITY_FLOOR_DBM: f64 = -90.0;
/// Upper edge of the heatmap intensity range (dBm)
pub const INTENSITY_CEILING_DBM: f64 = -40.0;

/// RGB display color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// CSS style `#rrggbb`
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Five-band signal classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SignalBand {
    VeryWeak,
    Weak,
    Fair,
    Good,
    Excellent,
}

impl SignalBand {
    /// Classify a signal strength; band edges are exclusive lower bounds
    pub fn from_dbm(signal_dbm: i32) -> Self {
        if signal_dbm > -50 {
            SignalBand::Excellent
        } else if signal_dbm > -60 {
            SignalBand::Good
        } else if signal_dbm > -70 {
            SignalBand::Fair
        } else if signal_dbm > -80 {
            SignalBand::Weak
        } else {
            SignalBand::VeryWeak
        }
    }

    pub fn color(&self) -> Color {
        match self {
            SignalBand::Excellent => Color::new(0x00, 0xff, 0x00),
            SignalBand::Good => Color::new(0xff, 0xff, 0x00),
            SignalBand::Fair => Color::new(0xff, 0x88, 0x00),
            SignalBand::Weak => Color::new(0xff, 0x44, 0x00),
            SignalBand::VeryWeak => Color::new(0xff, 0x00, 0x00),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SignalBand::Excellent => "excellent",
            SignalBand::Good => "good",
            SignalBand::Fair => "fair",
            SignalBand::Weak => "weak",
            SignalBand::VeryWeak => "very weak",
        }
    }

    /// Typical throughput range for the band (Mbps)
    pub fn bandwidth_range_mbps(&self) -> (f64, f64) {
        match self {
            SignalBand::Excellent => (150.0, 200.0),
            SignalBand::Good => (100.0, 150.0),
            SignalBand::Fair => (50.0, 80.0),
            SignalBand::Weak => (20.0, 40.0),
            SignalBand::VeryWeak => (5.0, 15.0),
        }
    }
}

/// Maps raw signal strength onto colors and heatmap weights
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalQualityModel {
    floor_dbm: f64,
    ceiling_dbm: f64,
}

impl Default for SignalQualityModel {
    fn default() -> Self {
        Self {
            floor_dbm: INTENSITY_FLOOR_DBM,
            ceiling_dbm: INTENSITY_CEILING_DBM,
        }
    }
}

impl SignalQualityModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn band_for(&self, signal_dbm: i32) -> SignalBand {
        SignalBand::from_dbm(signal_dbm)
    }

    pub fn color_for(&self, signal_dbm: i32) -> Color {
        SignalBand::from_dbm(signal_dbm).color()
    }

    /// Linear heatmap weight in [0, 1]
    pub fn intensity_for(&self, signal_dbm: i32) -> f64 {
        let span = self.ceiling_dbm - self.floor_dbm;
        ((signal_dbm as f64 - self.floor_dbm) / span).clamp(0.0, 1.0)
    }
}

/// Quality percent for platforms that only report signal strength
pub fn estimate_quality_percent(signal_dbm: i32) -> u8 {
    ((signal_dbm as f64 + 100.0) * 1.5).round().clamp(0.0, 100.0) as u8
}

/// Signal strength for platforms that only report a quality percentage
pub fn signal_from_quality(quality_percent: u8) -> i32 {
    let quality = quality_percent.min(100) as f64;
    (-100.0 + quality / 100.0 * 40.0).round() as i32
}

/// Midpoint of the expected throughput band for a signal strength
pub fn estimated_bandwidth_mbps(signal_dbm: i32) -> f64 {
    let (low, high) = SignalBand::from_dbm(signal_dbm).bandwidth_range_mbps();
    (low + high) / 2.0
}
