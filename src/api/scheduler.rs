//! Cooperative periodic tasks driven by an external clock

/// A task that fires every `interval_ms`
///
/// The first run is due immediately after `start`. Missed periods are not
/// replayed: a late tick runs the task once and schedules the next run one
/// interval after `now`.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodicTask {
    interval_ms: u64,
    next_due_ms: Option<u64>,
    runs: u64,
}

impl PeriodicTask {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms: interval_ms.max(1),
            next_due_ms: None,
            runs: 0,
        }
    }

    /// Arm the task; the first run is due at `now_ms`
    pub fn start(&mut self, now_ms: u64) {
        self.next_due_ms = Some(now_ms);
    }

    /// Disarm the task
    pub fn stop(&mut self) {
        self.next_due_ms = None;
    }

    pub fn is_running(&self) -> bool {
        self.next_due_ms.is_some()
    }

    pub fn is_due(&self, now_ms: u64) -> bool {
        self.next_due_ms.map_or(false, |due| now_ms >= due)
    }

    /// If the task is due, record a run and return true
    pub fn poll(&mut self, now_ms: u64) -> bool {
        if !self.is_due(now_ms) {
            return false;
        }
        self.next_due_ms = Some(now_ms.saturating_add(self.interval_ms));
        self.runs += 1;
        true
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// Change the period; an armed task keeps its current due time
    pub fn set_interval(&mut self, interval_ms: u64) {
        self.interval_ms = interval_ms.max(1);
    }

    pub fn next_due_ms(&self) -> Option<u64> {
        self.next_due_ms
    }

    pub fn runs(&self) -> u64 {
        self.runs
    }
}
