//! Mock collaborators for testing and development

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use uuid::Uuid;

use crate::algorithms::geodesy::distance_meters;
use crate::core::{NetworkStats, Reading, SmoothedPosition};
use crate::interfaces::backend::RemoteBackend;
use crate::interfaces::error::{CommError, CommResult};
use crate::interfaces::network::NetworkStatsProvider;

/// Scripted network statistics source
///
/// Queued results are returned in order; once the queue is empty the steady
/// value is returned, or `Unavailable` if none was set.
#[derive(Debug, Clone, Default)]
pub struct MockNetworkStats {
    queue: VecDeque<CommResult<NetworkStats>>,
    steady: Option<NetworkStats>,
    calls: u32,
}

impl MockNetworkStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always answer with `stats` once the queue runs dry
    pub fn steady(stats: NetworkStats) -> Self {
        Self {
            steady: Some(stats),
            ..Default::default()
        }
    }

    pub fn push_stats(&mut self, stats: NetworkStats) {
        self.queue.push_back(Ok(stats));
    }

    pub fn push_failure(&mut self, error: CommError) {
        self.queue.push_back(Err(error));
    }

    pub fn calls(&self) -> u32 {
        self.calls
    }
}

impl NetworkStatsProvider for MockNetworkStats {
    fn current_stats(&mut self) -> CommResult<NetworkStats> {
        self.calls += 1;
        if let Some(result) = self.queue.pop_front() {
            return result;
        }
        self.steady.clone().ok_or_else(|| CommError::Unavailable {
            service: "network stats".to_string(),
        })
    }
}

#[derive(Debug, Default)]
struct BackendState {
    stored: Vec<Reading>,
    upload_failure: Option<CommError>,
    fetch_failure: Option<CommError>,
    assign_ids: bool,
    upload_calls: u32,
    fetch_calls: u32,
}

/// In-process backend; clones share the same state so a test can keep a
/// handle after boxing one copy into a session
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    state: Rc<RefCell<BackendState>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-load readings from other contributors
    pub fn seed(&self, readings: Vec<Reading>) {
        self.state.borrow_mut().stored.extend(readings);
    }

    /// Make every upload fail with `error` until cleared with `None`
    pub fn fail_uploads(&self, error: Option<CommError>) {
        self.state.borrow_mut().upload_failure = error;
    }

    /// Make every fetch fail with `error` until cleared with `None`
    pub fn fail_fetches(&self, error: Option<CommError>) {
        self.state.borrow_mut().fetch_failure = error;
    }

    /// Store uploads under fresh ids, like a server with its own keys
    pub fn assign_ids(&self, enabled: bool) {
        self.state.borrow_mut().assign_ids = enabled;
    }

    pub fn stored(&self) -> Vec<Reading> {
        self.state.borrow().stored.clone()
    }

    pub fn upload_calls(&self) -> u32 {
        self.state.borrow().upload_calls
    }

    pub fn fetch_calls(&self) -> u32 {
        self.state.borrow().fetch_calls
    }
}

impl RemoteBackend for MockBackend {
    fn upload(&mut self, reading: &Reading) -> CommResult<()> {
        let mut state = self.state.borrow_mut();
        state.upload_calls += 1;
        if let Some(error) = state.upload_failure.clone() {
            return Err(error);
        }
        if state.assign_ids {
            let mut copy = reading.clone();
            copy.id = Uuid::new_v4();
            state.stored.push(copy);
        } else if !state.stored.iter().any(|r| r.id == reading.id) {
            state.stored.push(reading.clone());
        }
        Ok(())
    }

    fn fetch_nearby(&mut self, center: &SmoothedPosition, radius_km: f64) -> CommResult<Vec<Reading>> {
        let mut state = self.state.borrow_mut();
        state.fetch_calls += 1;
        if let Some(error) = state.fetch_failure.clone() {
            return Err(error);
        }
        let radius_m = radius_km * 1000.0;
        Ok(state
            .stored
            .iter()
            .filter(|r| distance_meters(center, *r) <= radius_m)
            .cloned()
            .collect())
    }
}
