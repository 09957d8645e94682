//! Core types and constants for the signal survey pipeline

pub mod types;
pub mod constants;

pub use types::*;
pub use constants::*;
