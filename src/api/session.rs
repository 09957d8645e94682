//! Survey session: the single owner of pose, store and timers
//!
//! Everything runs on the caller's thread. Sensor callbacks go through
//! `handle_event`, the three timers are driven by `tick`, and user actions
//! are plain method calls. Collaborator failures are reported and absorbed;
//! only `start`, `drop_pin`, `clear_local_readings` and `export` can return
//! an error to the caller.

use std::collections::VecDeque;

use chrono::{DateTime, TimeZone, Utc};
use log::{debug, error, info, warn};

use crate::algorithms::prediction::SignalPredictor;
use crate::algorithms::projection::ArProjector;
use crate::algorithms::quality::SignalQualityModel;
use crate::api::formatting::export_readings;
use crate::api::scheduler::PeriodicTask;
use crate::api::types::{
    ApiError, ApiResult, OutputFormat, SessionEvent, SessionState, SessionStatus, SyncOutcome, TickReport,
};
use crate::core::{DevicePose, GeoPoint, Reading, ScreenProjection, SmoothedPosition};
use crate::interfaces::backend::RemoteBackend;
use crate::interfaces::network::{NetworkStatsProvider, StatsCache};
use crate::interfaces::sensors::{OrientationSample, SensorEvent, SensorKind};
use crate::processing::kalman::LocationSmoother;
use crate::processing::pose::PoseSmoother;
use crate::processing::tracking::{CaptureDecision, TrackingController};
use crate::storage::{HeatmapPoint, LocalStore, ReadingFilter, ReadingStore};
use crate::utils::config::{ConfigurationManager, SystemConfig};
use crate::validation::data::SampleValidator;
use crate::validation::error::{ErrorClass, ErrorReporter};

/// Undrained events kept before the oldest are dropped
const MAX_PENDING_EVENTS: usize = 512;

/// Coordinates sensors, smoothing, capture, sync and projection
pub struct SurveySession {
    config: SystemConfig,
    state: SessionState,

    location: LocationSmoother,
    pose: PoseSmoother,
    tracker: TrackingController,
    store: ReadingStore,
    projector: ArProjector,
    predictor: SignalPredictor,
    quality: SignalQualityModel,
    validator: SampleValidator,
    reporter: ErrorReporter,

    stats: StatsCache,
    backend: Box<dyn RemoteBackend>,
    local_store: Box<dyn LocalStore>,

    stats_task: PeriodicTask,
    frame_task: PeriodicTask,
    sync_task: PeriodicTask,

    outbox: VecDeque<Reading>,
    events: VecDeque<SessionEvent>,
    filter: ReadingFilter,
    nearby_count: usize,
}

impl SurveySession {
    /// Create a session; nothing is loaded until `start`
    pub fn new(
        config: SystemConfig,
        stats_provider: Box<dyn NetworkStatsProvider>,
        backend: Box<dyn RemoteBackend>,
        local_store: Box<dyn LocalStore>,
    ) -> Self {
        Self {
            state: SessionState::Idle,
            location: LocationSmoother::new(config.smoothing.clone()),
            pose: PoseSmoother::new(config.pose.clone()),
            tracker: TrackingController::new(config.tracking.clone()),
            store: ReadingStore::new(config.store.dedupe_decimals),
            projector: ArProjector::new(config.projection.clone()),
            predictor: SignalPredictor::new(),
            quality: SignalQualityModel::new(),
            validator: SampleValidator::new(config.validation.clone()),
            reporter: ErrorReporter::default(),
            stats: StatsCache::new(stats_provider),
            backend,
            local_store,
            stats_task: PeriodicTask::new(config.scheduler.stats_interval_ms),
            frame_task: PeriodicTask::new(config.scheduler.frame_interval_ms),
            sync_task: PeriodicTask::new(config.scheduler.sync_interval_ms),
            outbox: VecDeque::new(),
            events: VecDeque::new(),
            filter: ReadingFilter::all(),
            nearby_count: 0,
            config,
        }
    }

    /// Load the local partition and arm the timers
    ///
    /// Readings not yet confirmed by the backend are queued for upload again.
    pub fn start(&mut self, now_ms: u64) -> ApiResult<()> {
        if self.state == SessionState::Running {
            return Ok(());
        }

        if self.state == SessionState::Idle {
            let readings = self.local_store.load_all().map_err(|e| {
                error!("Failed to load local readings: {}", e);
                e
            })?;
            info!("Loaded {} local readings", readings.len());
            self.store.load_local(readings);
            let unsynced: Vec<Reading> = self.store.unsynced().cloned().collect();
            for reading in unsynced {
                self.enqueue_upload(reading);
            }
        }

        self.stats_task.start(now_ms);
        self.frame_task.start(now_ms);
        self.sync_task.start(now_ms);
        self.state = SessionState::Running;
        info!("Survey session started");
        Ok(())
    }

    /// Tear down timers; later events and ticks are ignored
    pub fn stop(&mut self) {
        if self.state != SessionState::Running {
            return;
        }
        self.stats_task.stop();
        self.frame_task.stop();
        self.sync_task.stop();
        self.state = SessionState::Stopped;
        info!("Survey session stopped with {} uploads pending", self.outbox.len());
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    /// Apply one sensor callback; returns false when the event was ignored
    pub fn handle_event(&mut self, event: SensorEvent, now_ms: u64) -> bool {
        if !self.is_running() {
            debug!("Ignoring sensor event while {:?}", self.state);
            return false;
        }

        match event {
            SensorEvent::Location { point, .. } => self.on_location(point, now_ms),
            SensorEvent::Orientation { sample, .. } => self.on_orientation(sample, now_ms),
            SensorEvent::Unavailable { sensor, reason } => {
                self.on_unavailable(sensor, &reason, now_ms);
                true
            }
        }
    }

    fn on_location(&mut self, point: GeoPoint, now_ms: u64) -> bool {
        if let Err(e) = self.validator.check_location(&point) {
            self.reporter.report(ErrorClass::TransientMeasurement, e.to_string(), now_ms);
            return false;
        }

        let position = self.location.update(&point);
        match self.tracker.on_position(&position, &point) {
            CaptureDecision::Capture => {
                self.capture(position, now_ms, false);
            }
            decision => debug!("No automatic capture: {:?}", decision),
        }
        true
    }

    fn on_orientation(&mut self, sample: OrientationSample, now_ms: u64) -> bool {
        if let Err(e) = self.validator.check_orientation(&sample) {
            self.reporter.report(ErrorClass::TransientMeasurement, e.to_string(), now_ms);
            return false;
        }
        self.pose.update(sample.heading_deg, sample.tilt_deg);
        true
    }

    fn on_unavailable(&mut self, sensor: SensorKind, reason: &str, now_ms: u64) {
        if self.reporter.report_unavailable(sensor, reason, now_ms).is_some() {
            let message = match sensor {
                SensorKind::Location => "Location is unavailable; readings cannot be placed",
                SensorKind::Orientation => "Compass is unavailable; the camera overlay is disabled",
            };
            self.push_event(SessionEvent::SensorLost(sensor));
            self.push_event(SessionEvent::Notice(message.to_string()));
        }
    }

    /// Capture a reading at the current smoothed position
    pub fn drop_pin(&mut self, now_ms: u64) -> ApiResult<Reading> {
        if !self.is_running() {
            return Err(ApiError::NotRunning);
        }

        match self.tracker.manual_capture(self.location.current()) {
            Ok(position) => Ok(self.capture(position, now_ms, true)),
            Err(e) => {
                self.reporter.report(ErrorClass::Precondition, e.to_string(), now_ms);
                self.push_event(SessionEvent::Notice("Waiting for a location fix".to_string()));
                Err(e.into())
            }
        }
    }

    fn capture(&mut self, position: SmoothedPosition, now_ms: u64, manual: bool) -> Reading {
        let reading = Reading::capture(&position, self.stats.latest(), timestamp(now_ms));
        info!(
            "{} capture at {:.6}, {:.6}: {} dBm",
            if manual { "Manual" } else { "Automatic" },
            reading.latitude,
            reading.longitude,
            reading.signal_dbm
        );

        self.store.add_local(reading.clone());
        self.persist_local(now_ms);
        self.enqueue_upload(reading.clone());
        self.push_event(SessionEvent::Captured {
            reading: reading.clone(),
            manual,
        });
        reading
    }

    /// Delete every reading captured on this device
    pub fn clear_local_readings(&mut self) -> ApiResult<usize> {
        self.local_store.save_all(&[]).map_err(|e| {
            error!("Failed to clear local readings: {}", e);
            e
        })?;
        let removed = self.store.clear_local();
        self.outbox.clear();
        info!("Cleared {} local readings", removed);
        self.push_event(SessionEvent::LocalCleared { removed });
        Ok(removed)
    }

    /// Run whichever timers are due
    pub fn tick(&mut self, now_ms: u64) -> TickReport {
        let mut report = TickReport::default();
        if !self.is_running() {
            return report;
        }

        if self.stats_task.poll(now_ms) {
            match self.stats.refresh(now_ms) {
                Ok(_) => report.stats_refreshed = true,
                Err(e) => {
                    self.reporter.report(ErrorClass::Collaborator, e.to_string(), now_ms);
                }
            }
        }

        if self.frame_task.poll(now_ms) {
            report.frame = Some(self.project_frame());
        }

        if self.sync_task.poll(now_ms) {
            report.sync = Some(self.sync(now_ms));
        }

        report
    }

    fn sync(&mut self, now_ms: u64) -> SyncOutcome {
        let mut outcome = SyncOutcome::default();

        while let Some(reading) = self.outbox.pop_front() {
            match self.backend.upload(&reading) {
                Ok(()) => outcome.uploaded += 1,
                Err(e) if e.is_recoverable() => {
                    outcome.upload_failures += 1;
                    self.reporter.report(ErrorClass::Collaborator, format!("upload: {}", e), now_ms);
                    // Backend is struggling; retry the rest next time
                    self.outbox.push_front(reading);
                    break;
                }
                Err(e) => {
                    outcome.upload_failures += 1;
                    self.reporter.report(
                        ErrorClass::Collaborator,
                        format!("upload of {} dropped: {}", reading.id, e),
                        now_ms,
                    );
                }
            }
        }

        match self.location.current() {
            Some(center) => match self.backend.fetch_nearby(&center, self.config.scheduler.nearby_radius_km) {
                Ok(readings) => {
                    outcome.reclassified = self.store.replace_cloud(readings);
                    if outcome.reclassified > 0 {
                        self.persist_local(now_ms);
                    }
                    self.nearby_count = self.store.cloud().len();
                }
                Err(e) => {
                    self.reporter.report(ErrorClass::Collaborator, format!("nearby fetch: {}", e), now_ms);
                    outcome.fetch_failed = true;
                    self.nearby_count = 0;
                }
            },
            None => debug!("Skipping nearby fetch without a position fix"),
        }

        outcome.nearby = self.nearby_count;
        info!(
            "Sync: {} uploaded, {} failed, {} nearby, {} pending",
            outcome.uploaded,
            outcome.upload_failures,
            outcome.nearby,
            self.outbox.len()
        );
        self.push_event(SessionEvent::Synced(outcome));
        outcome
    }

    /// Visible readings for the current pose, farthest first
    ///
    /// Empty until both a location fix and an orientation sample exist.
    pub fn project_frame(&self) -> Vec<ScreenProjection> {
        match (self.position(), self.pose()) {
            (Some(position), Some(pose)) => self.projector.project(&position, &pose, &self.store.merged()),
            _ => Vec::new(),
        }
    }

    /// Heatmap weights for the current filter
    pub fn heatmap(&self) -> Vec<HeatmapPoint> {
        self.store.heatmap(&self.quality, &self.filter)
    }

    /// Predicted signal (dBm) at an unmeasured location
    pub fn predict_signal(&self, latitude: f64, longitude: f64) -> Option<i32> {
        self.predictor.predict(&(latitude, longitude), &self.store.merged())
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            state: self.state,
            local_count: self.store.local().len(),
            tracked_count: self.tracker.auto_capture_count(),
            nearby_count: self.nearby_count,
            unique_locations: self.store.unique_location_count(&self.filter),
            pending_uploads: self.outbox.len(),
            position: self.position(),
            pose: self.pose(),
            stats: self.stats.latest().clone(),
            errors: self.reporter.summary(),
        }
    }

    /// Take every event queued since the last call
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        self.events.drain(..).collect()
    }

    pub fn filtered_readings(&self, filter: &ReadingFilter) -> Vec<Reading> {
        self.store.filtered(filter)
    }

    /// Filter used by the heatmap and the status counts
    pub fn set_filter(&mut self, filter: ReadingFilter) {
        self.filter = filter;
    }

    pub fn filter(&self) -> &ReadingFilter {
        &self.filter
    }

    pub fn providers(&self) -> Vec<String> {
        self.store.providers()
    }

    /// Export the filtered view
    pub fn export(&self, format: OutputFormat) -> ApiResult<String> {
        export_readings(&self.store.filtered(&self.filter), format)
    }

    pub fn position(&self) -> Option<SmoothedPosition> {
        self.location.current()
    }

    pub fn pose(&self) -> Option<DevicePose> {
        self.pose.is_initialized().then(|| self.pose.pose())
    }

    pub fn store(&self) -> &ReadingStore {
        &self.store
    }

    pub fn reporter(&self) -> &ErrorReporter {
        &self.reporter
    }

    pub fn pending_uploads(&self) -> usize {
        self.outbox.len()
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    /// Validate and apply a new configuration; running estimates are kept
    pub fn apply_config(&mut self, config: SystemConfig) -> ApiResult<()> {
        ConfigurationManager::validate(&config).into_result()?;

        self.location.set_config(config.smoothing.clone());
        self.pose.set_config(config.pose.clone());
        self.tracker.set_config(config.tracking.clone());
        self.projector.set_config(config.projection.clone());
        self.store.set_dedupe_decimals(config.store.dedupe_decimals);
        self.validator.set_config(config.validation.clone());
        self.stats_task.set_interval(config.scheduler.stats_interval_ms);
        self.frame_task.set_interval(config.scheduler.frame_interval_ms);
        self.sync_task.set_interval(config.scheduler.sync_interval_ms);
        self.config = config;
        info!("Configuration updated");
        Ok(())
    }

    fn persist_local(&mut self, now_ms: u64) {
        if let Err(e) = self.local_store.save_all(self.store.local()) {
            error!("Failed to persist local readings: {}", e);
            self.reporter.report(ErrorClass::Collaborator, format!("local store: {}", e), now_ms);
        }
    }

    fn enqueue_upload(&mut self, reading: Reading) {
        let capacity = self.config.scheduler.outbox_capacity;
        if capacity == 0 {
            return;
        }
        if self.outbox.len() >= capacity {
            if let Some(dropped) = self.outbox.pop_front() {
                warn!("Upload outbox full, dropping reading {}", dropped.id);
            }
        }
        self.outbox.push_back(reading);
    }

    fn push_event(&mut self, event: SessionEvent) {
        if self.events.len() >= MAX_PENDING_EVENTS {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}

fn timestamp(now_ms: u64) -> DateTime<Utc> {
    i64::try_from(now_ms)
        .ok()
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        .unwrap_or_else(Utc::now)
}
