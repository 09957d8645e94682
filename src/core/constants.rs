//! Physical constants and system parameters

/// Mean Earth radius for the spherical model (meters)
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Smallest accuracy or uncertainty the smoothers will accept (meters)
pub const MIN_ACCURACY_M: f64 = 1.0;

/// Camera tilt when the device is held upright (degrees)
pub const UPRIGHT_TILT_DEG: f64 = 90.0;

/// Decimal places used when treating nearby coordinates as the same point
pub const DEDUPE_DECIMALS: u32 = 5;
