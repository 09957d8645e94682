//! Common API types and data structures

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::core::{DevicePose, NetworkStats, Reading, ScreenProjection, SmoothedPosition};
use crate::interfaces::error::CommError;
use crate::interfaces::sensors::SensorKind;
use crate::processing::tracking::TrackingError;
use crate::storage::StoreError;
use crate::utils::config::ConfigError;
use crate::validation::error::ErrorSummary;

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Comm(#[from] CommError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Tracking(#[from] TrackingError),
    #[error("failed to serialize output: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("survey session is not running")]
    NotRunning,
}

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// Created, nothing loaded yet
    Idle,
    /// Sensors and timers active
    Running,
    /// Timers and subscriptions torn down
    Stopped,
}

/// Things the UI layer should hear about
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Text for a toast or status line
    Notice(String),
    /// A reading was added to the local partition
    Captured { reading: Reading, manual: bool },
    /// A sync tick finished
    Synced(SyncOutcome),
    /// A sensor reported itself unavailable
    SensorLost(SensorKind),
    /// The user cleared their own readings
    LocalCleared { removed: usize },
}

/// Result of one sync tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOutcome {
    pub uploaded: usize,
    pub upload_failures: usize,
    /// Size of the cloud partition after the fetch; zero when the fetch failed
    pub nearby: usize,
    pub reclassified: usize,
    pub fetch_failed: bool,
}

/// What a call to `tick` did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Stats timer fired and the provider answered
    pub stats_refreshed: bool,
    /// Projection for this frame, when the frame timer fired
    pub frame: Option<Vec<ScreenProjection>>,
    /// Sync outcome, when the sync timer fired
    pub sync: Option<SyncOutcome>,
}

impl TickReport {
    pub fn is_idle(&self) -> bool {
        !self.stats_refreshed && self.frame.is_none() && self.sync.is_none()
    }
}

/// Status snapshot for the stats panel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStatus {
    pub state: SessionState,
    pub local_count: usize,
    /// Automatic captures during this session
    pub tracked_count: u64,
    pub nearby_count: usize,
    pub unique_locations: usize,
    pub pending_uploads: usize,
    pub position: Option<SmoothedPosition>,
    pub pose: Option<DevicePose>,
    pub stats: NetworkStats,
    pub errors: ErrorSummary,
}

/// Output format options for reading export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(format!("unknown output format '{}'", other)),
        }
    }
}

/// Look up a projection by reading id
pub fn find_projection(frame: &[ScreenProjection], id: Uuid) -> Option<&ScreenProjection> {
    frame.iter().find(|p| p.reading_id == id)
}
