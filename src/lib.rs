//! Signal Lens
//!
//! Walk-through network survey with an augmented-reality overlay. Noisy GPS
//! fixes and compass samples are smoothed into a device pose, readings are
//! captured as the user walks, and every frame the readings inside the
//! camera's field of view are projected to screen coordinates.

pub mod core;
pub mod algorithms;
pub mod processing;
pub mod storage;
pub mod interfaces;
pub mod validation;
pub mod utils;
pub mod api;

// Re-export commonly used types
pub use core::{
    ConnectionType, Coordinate, DevicePose, GeoPoint, NetworkStats, Reading, ReadingOrigin, ScreenProjection,
    SmoothedPosition,
};
pub use algorithms::{ArProjector, SignalBand, SignalPredictor, SignalQualityModel};
pub use processing::{LocationSmoother, PoseSmoother, TrackingController};
pub use storage::{JsonFileStore, LocalStore, MemoryStore, ReadingFilter, ReadingStore, StoreError};
pub use interfaces::{
    CommError, CommResult, MockBackend, MockNetworkStats, NetworkStatsProvider, OrientationSample, RemoteBackend,
    SensorEvent, SensorKind,
};
pub use utils::{ConfigurationManager, SystemConfig};
pub use api::{
    ApiError, ApiResult, OutputFormat, SessionEvent, SessionState, SessionStatus, SurveySession, TickReport,
};
