//! Sensor smoothing and capture decisions

pub mod kalman;
pub mod pose;
pub mod tracking;

pub use kalman::{LocationSmoother, SmoothingConfig};
pub use pose::{PoseConfig, PoseSmoother};
pub use tracking::{CaptureDecision, TrackingConfig, TrackingController};
