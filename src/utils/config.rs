use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::algorithms::projection::ProjectionConfig;
use crate::core::DEDUPE_DECIMALS;
use crate::processing::kalman::SmoothingConfig;
use crate::processing::pose::PoseConfig;
use crate::processing::tracking::TrackingConfig;
use crate::validation::data::ValidationConfig;

/// Reading store parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Decimal places kept when counting distinct locations
    pub dedupe_decimals: u32,
    /// Local store file used by the demo binary
    pub local_store_path: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dedupe_decimals: DEDUPE_DECIMALS,
            local_store_path: None,
        }
    }
}

/// Periodic task rates and sync parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Network stats refresh interval (milliseconds)
    pub stats_interval_ms: u64,
    /// AR re-projection interval (milliseconds)
    pub frame_interval_ms: u64,
    /// Remote sync interval (milliseconds)
    pub sync_interval_ms: u64,
    /// Radius of the nearby fetch (kilometers)
    pub nearby_radius_km: f64,
    /// Pending uploads kept before the oldest are dropped
    pub outbox_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            stats_interval_ms: 1000,
            frame_interval_ms: 50,
            sync_interval_ms: 30_000,
            nearby_radius_km: 1.0,
            outbox_capacity: 256,
        }
    }
}

/// System-wide configuration parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub smoothing: SmoothingConfig,
    pub pose: PoseConfig,
    pub tracking: TrackingConfig,
    pub projection: ProjectionConfig,
    pub store: StoreConfig,
    pub scheduler: SchedulerConfig,
    pub validation: ValidationConfig,
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value} for {parameter}: {reason}")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },
    #[error("configuration file error: {message}")]
    IoError { message: String },
    #[error("configuration format error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ConfigError {
    fn invalid(parameter: &str, value: impl ToString, reason: &str) -> Self {
        ConfigError::InvalidParameter {
            parameter: parameter.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Configuration validation result
#[derive(Debug)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ConfigError>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// First error, if any
    pub fn into_result(self) -> Result<(), ConfigError> {
        match self.errors.into_iter().next() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// Main configuration manager
#[derive(Debug, Default)]
pub struct ConfigurationManager {
    system_config: SystemConfig,
    config_file_path: Option<String>,
    is_modified: bool,
}

impl ConfigurationManager {
    /// Create a new configuration manager with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create configuration manager and load from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut manager = Self::new();
        manager.load_from_file(path)?;
        Ok(manager)
    }

    /// Get current system configuration
    pub fn get_system_config(&self) -> &SystemConfig {
        &self.system_config
    }

    /// Replace the whole configuration after validating it
    pub fn update_system_config(&mut self, config: SystemConfig) -> Result<(), ConfigError> {
        Self::validate(&config).into_result()?;
        self.system_config = config;
        self.is_modified = true;
        Ok(())
    }

    /// Load configuration from JSON file; missing groups take their defaults
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content = fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
            message: format!("Failed to read config file '{}': {}", path_str, e),
        })?;
        let config: SystemConfig = serde_json::from_str(&content)?;

        let validation = Self::validate(&config);
        for warning in &validation.warnings {
            log::warn!("{}: {}", path_str, warning);
        }
        validation.into_result()?;

        self.system_config = config;
        self.config_file_path = Some(path_str);
        self.is_modified = false;
        Ok(())
    }

    /// Save configuration to JSON file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let content = serde_json::to_string_pretty(&self.system_config)?;

        fs::write(&path, content).map_err(|e| ConfigError::IoError {
            message: format!("Failed to write config file '{}': {}", path_str, e),
        })?;

        self.config_file_path = Some(path_str);
        self.is_modified = false;
        Ok(())
    }

    /// Save to the currently loaded file path
    pub fn save(&mut self) -> Result<(), ConfigError> {
        match self.config_file_path.clone() {
            Some(path) => self.save_to_file(path),
            None => Err(ConfigError::IoError {
                message: "No file path set for saving configuration".to_string(),
            }),
        }
    }

    /// Check if configuration has been modified since last save
    pub fn is_modified(&self) -> bool {
        self.is_modified
    }

    /// Update the horizontal field of view (degrees)
    pub fn set_field_of_view(&mut self, fov_deg: f64) -> Result<f64, ConfigError> {
        if !(fov_deg > 0.0 && fov_deg < 360.0) {
            return Err(ConfigError::invalid(
                "projection.horizontal_fov_deg",
                fov_deg,
                "field of view must be in (0, 360)",
            ));
        }
        let old_value = self.system_config.projection.horizontal_fov_deg;
        self.system_config.projection.horizontal_fov_deg = fov_deg;
        self.is_modified = true;
        Ok(old_value)
    }

    /// Update the maximum render distance (meters)
    pub fn set_max_render_distance(&mut self, distance_m: f64) -> Result<f64, ConfigError> {
        if !(distance_m > 0.0 && distance_m.is_finite()) {
            return Err(ConfigError::invalid(
                "projection.max_render_distance_m",
                distance_m,
                "render distance must be positive",
            ));
        }
        let old_value = self.system_config.projection.max_render_distance_m;
        self.system_config.projection.max_render_distance_m = distance_m;
        self.is_modified = true;
        Ok(old_value)
    }

    /// Update the distance walked between automatic captures (meters)
    pub fn set_movement_threshold(&mut self, threshold_m: f64) -> Result<f64, ConfigError> {
        if !(threshold_m > 0.0 && threshold_m.is_finite()) {
            return Err(ConfigError::invalid(
                "tracking.movement_threshold_m",
                threshold_m,
                "movement threshold must be positive",
            ));
        }
        let old_value = self.system_config.tracking.movement_threshold_m;
        self.system_config.tracking.movement_threshold_m = threshold_m;
        self.is_modified = true;
        Ok(old_value)
    }

    /// Update the accuracy ceiling for automatic capture (meters)
    pub fn set_accuracy_ceiling(&mut self, ceiling_m: f64) -> Result<f64, ConfigError> {
        if ceiling_m < self.system_config.smoothing.min_accuracy_m {
            return Err(ConfigError::invalid(
                "tracking.max_accuracy_m",
                ceiling_m,
                "accuracy ceiling must not be below the accuracy floor",
            ));
        }
        let old_value = self.system_config.tracking.max_accuracy_m;
        self.system_config.tracking.max_accuracy_m = ceiling_m;
        self.is_modified = true;
        Ok(old_value)
    }

    /// Update the location filter process noise (m²)
    pub fn set_process_noise(&mut self, noise_m2: f64) -> Result<f64, ConfigError> {
        if !(noise_m2 >= 0.0 && noise_m2.is_finite()) {
            return Err(ConfigError::invalid(
                "smoothing.process_noise_m2",
                noise_m2,
                "process noise must be non-negative",
            ));
        }
        let old_value = self.system_config.smoothing.process_noise_m2;
        self.system_config.smoothing.process_noise_m2 = noise_m2;
        self.is_modified = true;
        Ok(old_value)
    }

    /// Update the heading smoothing factor
    pub fn set_heading_smoothing(&mut self, factor: f64) -> Result<f64, ConfigError> {
        if !(factor > 0.0 && factor <= 1.0) {
            return Err(ConfigError::invalid(
                "pose.heading_smoothing",
                factor,
                "smoothing factor must be in (0, 1]",
            ));
        }
        let old_value = self.system_config.pose.heading_smoothing;
        self.system_config.pose.heading_smoothing = factor;
        self.is_modified = true;
        Ok(old_value)
    }

    /// Switch automatic capture on or off
    pub fn set_auto_capture(&mut self, enabled: bool) -> bool {
        let old_value = self.system_config.tracking.auto_capture;
        self.system_config.tracking.auto_capture = enabled;
        self.is_modified = true;
        old_value
    }

    /// Check every group
    pub fn validate(config: &SystemConfig) -> ValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let smoothing = &config.smoothing;
        if !(smoothing.min_accuracy_m > 0.0) {
            errors.push(ConfigError::invalid(
                "smoothing.min_accuracy_m",
                smoothing.min_accuracy_m,
                "accuracy floor must be positive",
            ));
        }
        if !(smoothing.process_noise_m2 >= 0.0) {
            errors.push(ConfigError::invalid(
                "smoothing.process_noise_m2",
                smoothing.process_noise_m2,
                "process noise must be non-negative",
            ));
        }

        let pose = &config.pose;
        for (name, factor) in [
            ("pose.heading_smoothing", pose.heading_smoothing),
            ("pose.tilt_smoothing", pose.tilt_smoothing),
        ] {
            if !(factor > 0.0 && factor <= 1.0) {
                errors.push(ConfigError::invalid(name, factor, "smoothing factor must be in (0, 1]"));
            }
        }
        if pose.dead_band_deg < 0.0 {
            errors.push(ConfigError::invalid("pose.dead_band_deg", pose.dead_band_deg, "dead-band must be non-negative"));
        } else if pose.dead_band_deg > 10.0 {
            warnings.push("Wide heading dead-band will make markers lag behind rotation".to_string());
        }
        if pose.min_tilt_deg >= pose.max_tilt_deg {
            errors.push(ConfigError::invalid(
                "pose.min_tilt_deg",
                pose.min_tilt_deg,
                "tilt range must be non-empty",
            ));
        }

        let tracking = &config.tracking;
        if !(tracking.movement_threshold_m > 0.0) {
            errors.push(ConfigError::invalid(
                "tracking.movement_threshold_m",
                tracking.movement_threshold_m,
                "movement threshold must be positive",
            ));
        }
        if tracking.max_accuracy_m < smoothing.min_accuracy_m {
            errors.push(ConfigError::invalid(
                "tracking.max_accuracy_m",
                tracking.max_accuracy_m,
                "accuracy ceiling must not be below the accuracy floor",
            ));
        } else if tracking.max_accuracy_m > 100.0 {
            warnings.push("High accuracy ceiling lets poor fixes trigger captures".to_string());
        }

        let projection = &config.projection;
        if !(projection.horizontal_fov_deg > 0.0 && projection.horizontal_fov_deg < 360.0) {
            errors.push(ConfigError::invalid(
                "projection.horizontal_fov_deg",
                projection.horizontal_fov_deg,
                "field of view must be in (0, 360)",
            ));
        }
        if !(projection.vertical_fov_deg > 0.0 && projection.vertical_fov_deg < 180.0) {
            errors.push(ConfigError::invalid(
                "projection.vertical_fov_deg",
                projection.vertical_fov_deg,
                "vertical field of view must be in (0, 180)",
            ));
        }
        if !(projection.max_render_distance_m > 0.0) {
            errors.push(ConfigError::invalid(
                "projection.max_render_distance_m",
                projection.max_render_distance_m,
                "render distance must be positive",
            ));
        }
        if !(projection.reference_distance_m > 0.0) {
            errors.push(ConfigError::invalid(
                "projection.reference_distance_m",
                projection.reference_distance_m,
                "reference distance must be positive",
            ));
        }
        if !(projection.min_scale > 0.0 && projection.min_scale <= projection.max_scale) {
            errors.push(ConfigError::invalid(
                "projection.min_scale",
                projection.min_scale,
                "scale bounds must satisfy 0 < min <= max",
            ));
        }

        if config.store.dedupe_decimals > 10 {
            warnings.push("Dedupe precision beyond 10 decimals counts every reading separately".to_string());
        }

        let scheduler = &config.scheduler;
        for (name, interval) in [
            ("scheduler.stats_interval_ms", scheduler.stats_interval_ms),
            ("scheduler.frame_interval_ms", scheduler.frame_interval_ms),
            ("scheduler.sync_interval_ms", scheduler.sync_interval_ms),
        ] {
            if interval == 0 {
                errors.push(ConfigError::invalid(name, interval, "interval must be positive"));
            }
        }
        if !(scheduler.nearby_radius_km > 0.0) {
            errors.push(ConfigError::invalid(
                "scheduler.nearby_radius_km",
                scheduler.nearby_radius_km,
                "nearby radius must be positive",
            ));
        }
        if scheduler.outbox_capacity == 0 {
            warnings.push("Zero outbox capacity disables uploads".to_string());
        }
        if scheduler.frame_interval_ms > 200 {
            warnings.push("Slow frame interval will make the AR overlay stutter".to_string());
        }

        if !(config.validation.max_plausible_accuracy_m > 0.0) {
            errors.push(ConfigError::invalid(
                "validation.max_plausible_accuracy_m",
                config.validation.max_plausible_accuracy_m,
                "plausible accuracy limit must be positive",
            ));
        }

        ValidationResult {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use uuid::Uuid;

    fn temp_path() -> PathBuf {
        std::env::temp_dir().join(format!("signal-lens-config-{}.json", Uuid::new_v4()))
    }

    #[test]
    fn test_default_system_config() {
        let config = SystemConfig::default();
        assert_eq!(config.tracking.movement_threshold_m, 3.0);
        assert_eq!(config.projection.horizontal_fov_deg, 60.0);
        assert_eq!(config.scheduler.sync_interval_ms, 30_000);
        assert_eq!(config.smoothing.process_noise_m2, 0.0);
        assert!(ConfigurationManager::validate(&config).is_valid);
    }

    #[test]
    fn test_configuration_manager_creation() {
        let manager = ConfigurationManager::new();
        assert_eq!(manager.get_system_config(), &SystemConfig::default());
        assert!(!manager.is_modified());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut manager = ConfigurationManager::new();
        let mut config = SystemConfig::default();
        config.projection.horizontal_fov_deg = 400.0;
        config.pose.min_tilt_deg = 140.0;

        let result = ConfigurationManager::validate(&config);
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 2);

        assert!(manager.update_system_config(config).is_err());
        assert!(!manager.is_modified());
    }

    #[test]
    fn test_config_serialization() {
        let path = temp_path();
        let mut manager = ConfigurationManager::new();
        manager.set_movement_threshold(5.0).unwrap();

        manager.save_to_file(&path).unwrap();
        assert!(!manager.is_modified());
        let loaded = ConfigurationManager::from_file(&path).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(loaded.get_system_config().tracking.movement_threshold_m, 5.0);
        assert_eq!(loaded.get_system_config(), manager.get_system_config());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let path = temp_path();
        fs::write(&path, r#"{ "projection": { "horizontal_fov_deg": 75.0, "vertical_fov_deg": 50.0,
            "max_render_distance_m": 80.0, "reference_distance_m": 10.0, "min_scale": 0.35,
            "max_scale": 1.5, "horizon_drop_percent": 40.0 } }"#)
            .unwrap();
        let loaded = ConfigurationManager::from_file(&path);
        let _ = fs::remove_file(&path);

        let manager = loaded.unwrap();
        assert_eq!(manager.get_system_config().projection.horizontal_fov_deg, 75.0);
        assert_eq!(manager.get_system_config().tracking, TrackingConfig::default());
    }

    #[test]
    fn test_invalid_file_rejected() {
        let path = temp_path();
        let mut config = SystemConfig::default();
        config.scheduler.frame_interval_ms = 0;
        fs::write(&path, serde_json::to_string(&config).unwrap()).unwrap();

        let result = ConfigurationManager::from_file(&path);
        let _ = fs::remove_file(&path);
        assert!(matches!(result, Err(ConfigError::InvalidParameter { .. })));
    }

    #[test]
    fn test_runtime_fov_adjustment() {
        let mut manager = ConfigurationManager::new();

        let old = manager.set_field_of_view(70.0).unwrap();
        assert_eq!(old, 60.0);
        assert_eq!(manager.get_system_config().projection.horizontal_fov_deg, 70.0);
        assert!(manager.is_modified());

        assert!(manager.set_field_of_view(0.0).is_err());
        assert!(manager.set_field_of_view(360.0).is_err());
        assert_eq!(manager.get_system_config().projection.horizontal_fov_deg, 70.0);
    }

    #[test]
    fn test_runtime_tracking_adjustment() {
        let mut manager = ConfigurationManager::new();

        assert_eq!(manager.set_movement_threshold(2.0).unwrap(), 3.0);
        assert!(manager.set_movement_threshold(-1.0).is_err());
        assert_eq!(manager.set_accuracy_ceiling(40.0).unwrap(), 25.0);
        assert!(manager.set_accuracy_ceiling(0.5).is_err());
        assert!(manager.set_auto_capture(false));
        assert!(!manager.get_system_config().tracking.auto_capture);
    }

    #[test]
    fn test_runtime_smoothing_adjustment() {
        let mut manager = ConfigurationManager::new();

        assert_eq!(manager.set_process_noise(0.5).unwrap(), 0.0);
        assert!(manager.set_process_noise(f64::NAN).is_err());
        assert_eq!(manager.set_heading_smoothing(0.5).unwrap(), 0.7);
        assert!(manager.set_heading_smoothing(1.5).is_err());
    }

    #[test]
    fn test_save_without_path() {
        let mut manager = ConfigurationManager::new();
        assert!(matches!(manager.save(), Err(ConfigError::IoError { .. })));
    }
}
