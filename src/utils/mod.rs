//! Configuration management

pub mod config;

pub use config::{ConfigError, ConfigurationManager, SchedulerConfig, StoreConfig, SystemConfig, ValidationResult};
