//! Error taxonomy and reporting
//!
//! Every failure the session absorbs is filed here under one of four classes.
//! The class decides the log level and whether the user hears about it.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::interfaces::sensors::SensorKind;

/// How a failure affects the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorClass {
    /// No location or orientation support; the pipeline runs without a pose
    SensorUnavailable,
    /// One bad sample; absorbed by validation and the smoothers
    TransientMeasurement,
    /// Stats, upload or sync call failed; cached values stay in use
    Collaborator,
    /// An operation was requested before its inputs existed
    Precondition,
}

impl ErrorClass {
    /// Whether reports of this class are shown to the user
    pub fn is_user_visible(&self) -> bool {
        matches!(self, ErrorClass::SensorUnavailable | ErrorClass::Precondition)
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorClass::SensorUnavailable => "sensor unavailable",
            ErrorClass::TransientMeasurement => "transient measurement",
            ErrorClass::Collaborator => "collaborator",
            ErrorClass::Precondition => "precondition",
        };
        write!(f, "{}", name)
    }
}

/// One filed report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub id: u64,
    pub class: ErrorClass,
    pub message: String,
    pub timestamp_ms: u64,
}

/// Summary of everything reported so far
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorSummary {
    pub total: u64,
    pub by_class: HashMap<ErrorClass, u64>,
    pub unavailable_sensors: Vec<SensorKind>,
}

/// Files errors by class, logs them and keeps a short history
#[derive(Debug, Clone)]
pub struct ErrorReporter {
    history: VecDeque<ErrorRecord>,
    max_history: usize,
    counters: HashMap<ErrorClass, u64>,
    next_id: u64,
    unavailable: HashSet<SensorKind>,
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new(100)
    }
}

impl ErrorReporter {
    pub fn new(max_history: usize) -> Self {
        Self {
            history: VecDeque::with_capacity(max_history),
            max_history,
            counters: HashMap::new(),
            next_id: 0,
            unavailable: HashSet::new(),
        }
    }

    /// File a report; returns its id
    pub fn report(&mut self, class: ErrorClass, message: impl Into<String>, timestamp_ms: u64) -> u64 {
        let message = message.into();
        match class {
            ErrorClass::TransientMeasurement => debug!("Dropped sample: {}", message),
            ErrorClass::Precondition => info!("Rejected: {}", message),
            ErrorClass::Collaborator | ErrorClass::SensorUnavailable => warn!("{}: {}", class, message),
        }

        self.next_id += 1;
        *self.counters.entry(class).or_insert(0) += 1;

        if self.max_history > 0 {
            if self.history.len() == self.max_history {
                self.history.pop_front();
            }
            self.history.push_back(ErrorRecord {
                id: self.next_id,
                class,
                message,
                timestamp_ms,
            });
        }
        self.next_id
    }

    /// Report a missing sensor once; later reports for the same sensor are
    /// ignored and return `None`
    pub fn report_unavailable(&mut self, sensor: SensorKind, reason: &str, timestamp_ms: u64) -> Option<u64> {
        if !self.unavailable.insert(sensor) {
            return None;
        }
        Some(self.report(
            ErrorClass::SensorUnavailable,
            format!("{:?} sensor unavailable: {}", sensor, reason),
            timestamp_ms,
        ))
    }

    pub fn is_unavailable(&self, sensor: SensorKind) -> bool {
        self.unavailable.contains(&sensor)
    }

    /// Number of reports of `class` so far
    pub fn count(&self, class: ErrorClass) -> u64 {
        self.counters.get(&class).copied().unwrap_or(0)
    }

    /// Most recent reports, newest first
    pub fn recent(&self, count: usize) -> Vec<&ErrorRecord> {
        self.history.iter().rev().take(count).collect()
    }

    pub fn summary(&self) -> ErrorSummary {
        let mut unavailable_sensors: Vec<SensorKind> = self.unavailable.iter().copied().collect();
        unavailable_sensors.sort_by_key(|s| *s as u8);
        ErrorSummary {
            total: self.counters.values().sum(),
            by_class: self.counters.clone(),
            unavailable_sensors,
        }
    }

    /// Forget history and counters; missing sensors stay missing
    pub fn clear_history(&mut self) {
        self.history.clear();
        self.counters.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_by_class() {
        let mut reporter = ErrorReporter::default();
        reporter.report(ErrorClass::Collaborator, "upload failed", 10);
        reporter.report(ErrorClass::Collaborator, "fetch failed", 20);
        reporter.report(ErrorClass::Precondition, "no fix", 30);

        assert_eq!(reporter.count(ErrorClass::Collaborator), 2);
        assert_eq!(reporter.count(ErrorClass::Precondition), 1);
        assert_eq!(reporter.count(ErrorClass::TransientMeasurement), 0);
        assert_eq!(reporter.summary().total, 3);
    }

    #[test]
    fn test_unavailable_reported_once_per_sensor() {
        let mut reporter = ErrorReporter::default();
        assert!(reporter.report_unavailable(SensorKind::Location, "denied", 0).is_some());
        assert!(reporter.report_unavailable(SensorKind::Location, "denied", 5).is_none());
        assert!(reporter.report_unavailable(SensorKind::Orientation, "missing", 6).is_some());

        assert_eq!(reporter.count(ErrorClass::SensorUnavailable), 2);
        assert_eq!(
            reporter.summary().unavailable_sensors,
            vec![SensorKind::Location, SensorKind::Orientation]
        );
    }

    #[test]
    fn test_history_is_bounded() {
        let mut reporter = ErrorReporter::new(3);
        for i in 0..10 {
            reporter.report(ErrorClass::TransientMeasurement, format!("sample {}", i), i);
        }

        let recent = reporter.recent(10);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].message, "sample 9");
        assert_eq!(recent[2].message, "sample 7");
        assert_eq!(reporter.count(ErrorClass::TransientMeasurement), 10);
    }

    #[test]
    fn test_user_visible_classes() {
        assert!(ErrorClass::Precondition.is_user_visible());
        assert!(ErrorClass::SensorUnavailable.is_user_visible());
        assert!(!ErrorClass::Collaborator.is_user_visible());
        assert!(!ErrorClass::TransientMeasurement.is_user_visible());
    }
}
