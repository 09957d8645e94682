//! The authoritative reading collection
//!
//! Two partitions: `local` holds everything captured on this device (and is
//! what gets persisted), `cloud` is the latest nearby set fetched from the
//! backend. The merged view concatenates both, dropping cloud copies of
//! readings the device already holds.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::algorithms::quality::SignalQualityModel;
use crate::core::{ConnectionType, Reading, ReadingOrigin, DEDUPE_DECIMALS};

/// Restricts a view of the store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadingFilter {
    /// Only readings from this provider; `None` means all providers
    pub provider: Option<String>,
    /// Only readings over this link type; `None` means all types
    pub connection_type: Option<ConnectionType>,
}

impl ReadingFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn provider(name: impl Into<String>) -> Self {
        Self {
            provider: Some(name.into()),
            connection_type: None,
        }
    }

    pub fn connection(connection_type: ConnectionType) -> Self {
        Self {
            provider: None,
            connection_type: Some(connection_type),
        }
    }

    pub fn matches(&self, reading: &Reading) -> bool {
        let provider_ok = self
            .provider
            .as_ref()
            .map_or(true, |name| &reading.provider_name == name);
        let connection_ok = self
            .connection_type
            .map_or(true, |connection| reading.connection_type == connection);
        provider_ok && connection_ok
    }
}

/// One weighted point for the map heatmap
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeatmapPoint {
    pub latitude: f64,
    pub longitude: f64,
    /// Signal quality weight in [0, 1]
    pub intensity: f64,
}

/// Local and cloud readings with merge and de-duplication rules
#[derive(Debug, Clone)]
pub struct ReadingStore {
    local: Vec<Reading>,
    cloud: Vec<Reading>,
    /// Cloud readings that are the backend's copy of a local reading
    shadowed: HashSet<Uuid>,
    dedupe_decimals: u32,
}

impl Default for ReadingStore {
    fn default() -> Self {
        Self::new(DEDUPE_DECIMALS)
    }
}

impl ReadingStore {
    pub fn new(dedupe_decimals: u32) -> Self {
        Self {
            local: Vec::new(),
            cloud: Vec::new(),
            shadowed: HashSet::new(),
            dedupe_decimals,
        }
    }

    pub fn dedupe_decimals(&self) -> u32 {
        self.dedupe_decimals
    }

    /// Change the precision used for unique-location counts and matching
    pub fn set_dedupe_decimals(&mut self, dedupe_decimals: u32) {
        self.dedupe_decimals = dedupe_decimals;
    }

    /// Replace the local partition, typically with what the local store loaded
    pub fn load_local(&mut self, readings: Vec<Reading>) {
        self.local = readings;
    }

    /// Append a freshly captured reading
    pub fn add_local(&mut self, reading: Reading) {
        self.local.push(reading);
    }

    /// Replace the cloud partition with a new fetch
    ///
    /// A fetched reading is the backend's copy of a local one when it carries
    /// the same id or, failing that, the same coordinates at the store's
    /// precision. Matched local readings are reclassified as `Cloud` and their
    /// cloud copies are left out of the merged view. Returns how many were
    /// reclassified.
    pub fn replace_cloud(&mut self, readings: Vec<Reading>) -> usize {
        let mut claimed = vec![false; readings.len()];
        let mut matched = vec![false; self.local.len()];

        let by_id: HashMap<Uuid, usize> = readings.iter().enumerate().map(|(i, r)| (r.id, i)).collect();
        for (slot, reading) in self.local.iter().enumerate() {
            if let Some(&i) = by_id.get(&reading.id) {
                claimed[i] = true;
                matched[slot] = true;
            }
        }

        // Backends that assign their own ids are matched by location
        let mut by_location: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
        for (i, reading) in readings.iter().enumerate() {
            if !claimed[i] {
                by_location.entry(self.location_key(reading)).or_default().push(i);
            }
        }
        for (slot, reading) in self.local.iter().enumerate() {
            if matched[slot] {
                continue;
            }
            let candidates = match by_location.get_mut(&self.location_key(reading)) {
                Some(candidates) => candidates,
                None => continue,
            };
            if let Some(i) = candidates.pop() {
                claimed[i] = true;
                matched[slot] = true;
            }
        }

        let mut reclassified = 0;
        for (reading, matched) in self.local.iter_mut().zip(&matched) {
            if *matched && reading.origin == ReadingOrigin::Local {
                reading.origin = ReadingOrigin::Cloud;
                reclassified += 1;
            }
        }

        self.shadowed = readings
            .iter()
            .zip(&claimed)
            .filter(|(_, claimed)| **claimed)
            .map(|(r, _)| r.id)
            .collect();
        self.cloud = readings
            .into_iter()
            .map(|mut reading| {
                reading.origin = ReadingOrigin::Cloud;
                reading
            })
            .collect();

        reclassified
    }

    /// Drop every reading captured on this device; cloud data is untouched
    pub fn clear_local(&mut self) -> usize {
        let removed = self.local.len();
        self.local.clear();
        self.shadowed.clear();
        removed
    }

    pub fn local(&self) -> &[Reading] {
        &self.local
    }

    pub fn cloud(&self) -> &[Reading] {
        &self.cloud
    }

    /// Local readings not yet confirmed by the backend
    pub fn unsynced(&self) -> impl Iterator<Item = &Reading> {
        self.local.iter().filter(|r| r.origin == ReadingOrigin::Local)
    }

    /// Every reading, local first, without cloud copies of local readings
    pub fn merged(&self) -> Vec<Reading> {
        self.filtered(&ReadingFilter::all())
    }

    /// Merged view restricted by `filter`
    pub fn filtered(&self, filter: &ReadingFilter) -> Vec<Reading> {
        let local_ids: HashSet<Uuid> = self.local.iter().map(|r| r.id).collect();

        self.local
            .iter()
            .chain(
                self.cloud
                    .iter()
                    .filter(|r| !local_ids.contains(&r.id) && !self.shadowed.contains(&r.id)),
            )
            .filter(|r| filter.matches(r))
            .cloned()
            .collect()
    }

    /// Number of distinct locations in the filtered view, with coordinates
    /// rounded to the store's precision
    pub fn unique_location_count(&self, filter: &ReadingFilter) -> usize {
        self.filtered(filter)
            .iter()
            .map(|r| self.location_key(r))
            .collect::<HashSet<_>>()
            .len()
    }

    /// Coordinates rounded to the de-duplication precision
    fn location_key(&self, reading: &Reading) -> (i64, i64) {
        let scale = 10f64.powi(self.dedupe_decimals as i32);
        (
            (reading.latitude * scale).round() as i64,
            (reading.longitude * scale).round() as i64,
        )
    }

    /// Distinct provider names, sorted
    pub fn providers(&self) -> Vec<String> {
        self.merged()
            .into_iter()
            .map(|r| r.provider_name)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Heatmap weights for the filtered view
    pub fn heatmap(&self, model: &SignalQualityModel, filter: &ReadingFilter) -> Vec<HeatmapPoint> {
        self.filtered(filter)
            .iter()
            .map(|r| HeatmapPoint {
                latitude: r.latitude,
                longitude: r.longitude,
                intensity: model.intensity_for(r.signal_dbm),
            })
            .collect()
    }

    /// Size of the merged view
    pub fn len(&self) -> usize {
        self.merged().len()
    }

    pub fn is_empty(&self) -> bool {
        self.local.is_empty() && self.cloud.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn reading(lat: f64, lon: f64, provider: &str, connection: ConnectionType, signal: i32) -> Reading {
        Reading {
            id: Uuid::new_v4(),
            latitude: lat,
            longitude: lon,
            signal_dbm: signal,
            latency_ms: 18,
            bandwidth_mbps: 90.0,
            quality_percent: 70,
            connection_type: connection,
            provider_name: provider.to_string(),
            captured_at: Utc::now(),
            origin: ReadingOrigin::Local,
        }
    }

    fn cloud_copy(reading: &Reading) -> Reading {
        let mut copy = reading.clone();
        copy.origin = ReadingOrigin::Cloud;
        copy
    }

    #[test]
    fn test_merge_concatenates_partitions() {
        let mut store = ReadingStore::default();
        store.add_local(reading(1.0, 1.0, "home", ConnectionType::Wifi, -50));
        store.replace_cloud(vec![reading(1.1, 1.1, "cafe", ConnectionType::Wifi, -70)]);

        let merged = store.merged();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].origin, ReadingOrigin::Local);
        assert_eq!(merged[1].origin, ReadingOrigin::Cloud);
    }

    #[test]
    fn test_cloud_copy_of_local_reading_is_reclassified() {
        let mut store = ReadingStore::default();
        let mine = reading(1.0, 1.0, "home", ConnectionType::Wifi, -50);
        store.add_local(mine.clone());
        store.add_local(reading(2.0, 2.0, "home", ConnectionType::Wifi, -55));

        let reclassified = store.replace_cloud(vec![cloud_copy(&mine)]);

        assert_eq!(reclassified, 1);
        assert_eq!(store.merged().len(), 2);
        assert_eq!(store.unsynced().count(), 1);
        assert_eq!(store.local()[0].origin, ReadingOrigin::Cloud);
    }

    #[test]
    fn test_backend_copy_with_new_id_is_reclassified() {
        let mut store = ReadingStore::default();
        let mine = reading(47.376900, 8.541700, "home", ConnectionType::Wifi, -50);
        store.add_local(mine.clone());

        let mut copy = cloud_copy(&mine);
        copy.id = Uuid::new_v4();
        copy.latitude += 0.000001;
        let other = reading(47.3780, 8.5417, "cafe", ConnectionType::Wifi, -65);

        assert_eq!(store.replace_cloud(vec![copy, other]), 1);
        assert_eq!(store.local()[0].origin, ReadingOrigin::Cloud);
        assert_eq!(store.unsynced().count(), 0);
        assert_eq!(store.merged().len(), 2);
        assert_eq!(store.cloud().len(), 2);

        // The copy shows again once the local reading is gone
        store.clear_local();
        assert_eq!(store.merged().len(), 2);
    }

    #[test]
    fn test_one_cloud_copy_per_local_reading() {
        let mut store = ReadingStore::default();
        let first = reading(1.0, 1.0, "home", ConnectionType::Wifi, -50);
        let second = reading(1.0, 1.0, "home", ConnectionType::Wifi, -52);
        store.add_local(first.clone());
        store.add_local(second);

        // Only the first came back, under its own id
        assert_eq!(store.replace_cloud(vec![cloud_copy(&first)]), 1);
        assert_eq!(store.local()[0].origin, ReadingOrigin::Cloud);
        assert_eq!(store.local()[1].origin, ReadingOrigin::Local);
        assert_eq!(store.merged().len(), 2);
    }

    #[test]
    fn test_dedupe_precision_can_change() {
        let mut store = ReadingStore::default();
        store.add_local(reading(10.0, 20.0, "a", ConnectionType::Wifi, -50));
        store.add_local(reading(10.0001, 20.0, "a", ConnectionType::Wifi, -52));
        assert_eq!(store.unique_location_count(&ReadingFilter::all()), 2);

        store.set_dedupe_decimals(1);
        assert_eq!(store.dedupe_decimals(), 1);
        assert_eq!(store.unique_location_count(&ReadingFilter::all()), 1);
    }

    #[test]
    fn test_unique_locations_round_coordinates() {
        let mut store = ReadingStore::default();
        store.add_local(reading(10.000001, 20.000001, "a", ConnectionType::Wifi, -50));
        store.add_local(reading(10.000002, 20.000002, "a", ConnectionType::Wifi, -52));
        store.add_local(reading(10.0001, 20.0001, "a", ConnectionType::Wifi, -60));

        assert_eq!(store.len(), 3);
        assert_eq!(store.unique_location_count(&ReadingFilter::all()), 2);
    }

    #[test]
    fn test_filters() {
        let mut store = ReadingStore::default();
        store.add_local(reading(1.0, 1.0, "home", ConnectionType::Wifi, -50));
        store.add_local(reading(1.0, 1.1, "carrier", ConnectionType::Cellular, -80));
        store.replace_cloud(vec![reading(1.0, 1.2, "home", ConnectionType::Wifi, -60)]);

        assert_eq!(store.filtered(&ReadingFilter::all()).len(), 3);
        assert_eq!(store.filtered(&ReadingFilter::provider("home")).len(), 2);
        assert_eq!(store.filtered(&ReadingFilter::connection(ConnectionType::Cellular)).len(), 1);
        assert!(store.filtered(&ReadingFilter::provider("nobody")).is_empty());
        assert_eq!(store.providers(), vec!["carrier".to_string(), "home".to_string()]);
    }

    #[test]
    fn test_clear_local_keeps_cloud() {
        let mut store = ReadingStore::default();
        store.add_local(reading(1.0, 1.0, "home", ConnectionType::Wifi, -50));
        store.replace_cloud(vec![reading(3.0, 3.0, "x", ConnectionType::Wifi, -70)]);

        assert_eq!(store.clear_local(), 1);
        assert!(store.local().is_empty());
        assert_eq!(store.merged().len(), 1);
    }

    #[test]
    fn test_heatmap_weights() {
        let mut store = ReadingStore::default();
        store.add_local(reading(1.0, 1.0, "home", ConnectionType::Wifi, -40));
        store.add_local(reading(1.0, 1.1, "home", ConnectionType::Wifi, -90));

        let points = store.heatmap(&SignalQualityModel::new(), &ReadingFilter::all());
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].intensity, 1.0);
        assert_eq!(points[1].intensity, 0.0);
    }
}
