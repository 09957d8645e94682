//! Remote reading backend

use crate::core::{Reading, SmoothedPosition};
use crate::interfaces::error::CommResult;

/// Shared backend that collects readings from every contributor
pub trait RemoteBackend {
    /// Store one locally captured reading
    ///
    /// The backend may keep the reading's id or assign its own.
    fn upload(&mut self, reading: &Reading) -> CommResult<()>;

    /// Readings from all contributors within `radius_km` of `center`
    fn fetch_nearby(&mut self, center: &SmoothedPosition, radius_km: f64) -> CommResult<Vec<Reading>>;
}
