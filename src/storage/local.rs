//! Local persistence for device-captured readings

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use thiserror::Error;

use crate::core::Reading;

/// Local persistence errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access reading store '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode or decode readings: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Persistent storage for the local partition
pub trait LocalStore {
    /// Load every stored reading; an empty store is not an error
    fn load_all(&mut self) -> Result<Vec<Reading>, StoreError>;

    /// Replace the stored set with `readings`
    fn save_all(&mut self, readings: &[Reading]) -> Result<(), StoreError>;
}

/// Readings kept as a pretty-printed JSON array on disk
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.to_string_lossy().to_string(),
            source,
        }
    }
}

impl LocalStore for JsonFileStore {
    fn load_all(&mut self) -> Result<Vec<Reading>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No reading store at {}, starting empty", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(self.io_error(e)),
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let readings: Vec<Reading> = serde_json::from_str(&content)?;
        debug!("Loaded {} readings from {}", readings.len(), self.path.display());
        Ok(readings)
    }

    fn save_all(&mut self, readings: &[Reading]) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(readings)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
            }
        }
        fs::write(&self.path, content).map_err(|e| self.io_error(e))?;
        Ok(())
    }
}

/// In-memory store, used by tests and the demo
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    readings: Vec<Reading>,
    saves: u32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_readings(readings: Vec<Reading>) -> Self {
        Self { readings, saves: 0 }
    }

    /// Number of `save_all` calls so far
    pub fn save_count(&self) -> u32 {
        self.saves
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }
}

impl LocalStore for MemoryStore {
    fn load_all(&mut self) -> Result<Vec<Reading>, StoreError> {
        Ok(self.readings.clone())
    }

    fn save_all(&mut self, readings: &[Reading]) -> Result<(), StoreError> {
        self.readings = readings.to_vec();
        self.saves += 1;
        Ok(())
    }
}
