//! Reading collection and local persistence

pub mod local;
pub mod store;

pub use local::{JsonFileStore, LocalStore, MemoryStore, StoreError};
pub use store::{HeatmapPoint, ReadingFilter, ReadingStore};
