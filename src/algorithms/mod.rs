//! Spatial and signal algorithms

pub mod geodesy;
pub mod projection;
pub mod quality;
pub mod prediction;

pub use projection::ArProjector;
pub use quality::{SignalBand, SignalQualityModel};
pub use prediction::SignalPredictor;
