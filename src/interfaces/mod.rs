//! Boundaries to the platform and to remote services
//!
//! Sensor subscriptions, the network statistics source, the remote backend
//! and their mock implementations. Everything here is an I/O wrapper; the
//! survey logic only sees these traits.

pub mod backend;
pub mod error;
pub mod mock;
pub mod network;
pub mod sensors;

pub use backend::RemoteBackend;
pub use error::{CommError, CommResult};
pub use mock::{MockBackend, MockNetworkStats};
pub use network::{NetworkStatsProvider, StatsCache};
pub use sensors::{OrientationSample, SensorEvent, SensorKind};
