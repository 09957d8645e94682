//! Network statistics source and last-known-value cache

use log::{debug, warn};

use crate::algorithms::quality::estimate_quality_percent;
use crate::core::NetworkStats;
use crate::interfaces::error::{CommError, CommResult};

/// Plausible signal strength range (dBm)
const SIGNAL_RANGE_DBM: std::ops::RangeInclusive<i32> = -130..=0;

/// Platform source of link statistics
pub trait NetworkStatsProvider {
    /// Measure the current link
    fn current_stats(&mut self) -> CommResult<NetworkStats>;
}

/// Keeps the most recent good statistics around
///
/// A failed refresh leaves the previous value in place, so captures always
/// have something to record.
pub struct StatsCache {
    provider: Box<dyn NetworkStatsProvider>,
    latest: NetworkStats,
    last_success_ms: Option<u64>,
    consecutive_failures: u32,
}

impl StatsCache {
    /// Start from the built-in fallback statistics
    pub fn new(provider: Box<dyn NetworkStatsProvider>) -> Self {
        Self {
            provider,
            latest: NetworkStats::fallback(),
            last_success_ms: None,
            consecutive_failures: 0,
        }
    }

    /// Ask the provider for fresh statistics
    ///
    /// On error the cached value is kept and the error is returned for the
    /// caller to report.
    pub fn refresh(&mut self, now_ms: u64) -> CommResult<&NetworkStats> {
        match self.provider.current_stats().and_then(Self::sanitize) {
            Ok(stats) => {
                debug!("Network stats: {} dBm, {} ms", stats.signal_dbm, stats.latency_ms);
                self.latest = stats;
                self.last_success_ms = Some(now_ms);
                self.consecutive_failures = 0;
                Ok(&self.latest)
            }
            Err(e) => {
                self.consecutive_failures += 1;
                warn!(
                    "Network stats refresh failed ({} in a row), keeping last value: {}",
                    self.consecutive_failures, e
                );
                Err(e)
            }
        }
    }

    /// Most recent good statistics (or the fallback)
    pub fn latest(&self) -> &NetworkStats {
        &self.latest
    }

    pub fn last_success_ms(&self) -> Option<u64> {
        self.last_success_ms
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    fn sanitize(mut stats: NetworkStats) -> CommResult<NetworkStats> {
        if !SIGNAL_RANGE_DBM.contains(&stats.signal_dbm) {
            return Err(CommError::InvalidResponse {
                service: "network stats".to_string(),
                details: format!("signal {} dBm out of range", stats.signal_dbm),
            });
        }
        if !stats.bandwidth_mbps.is_finite() || stats.bandwidth_mbps < 0.0 {
            return Err(CommError::InvalidResponse {
                service: "network stats".to_string(),
                details: format!("bandwidth {} Mbps", stats.bandwidth_mbps),
            });
        }
        if stats.quality_percent.is_none() {
            stats.quality_percent = Some(estimate_quality_percent(stats.signal_dbm));
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ConnectionType;
    use crate::interfaces::mock::MockNetworkStats;

    fn stats(signal: i32, quality: Option<u8>) -> NetworkStats {
        NetworkStats {
            signal_dbm: signal,
            latency_ms: 12,
            bandwidth_mbps: 140.0,
            quality_percent: quality,
            connection_type: ConnectionType::Wifi,
            provider_name: "office".to_string(),
        }
    }

    #[test]
    fn test_starts_with_fallback() {
        let cache = StatsCache::new(Box::new(MockNetworkStats::new()));
        assert_eq!(cache.latest(), &NetworkStats::fallback());
        assert!(cache.last_success_ms().is_none());
    }

    #[test]
    fn test_refresh_updates_value() {
        let mut mock = MockNetworkStats::new();
        mock.push_stats(stats(-48, Some(90)));
        let mut cache = StatsCache::new(Box::new(mock));

        assert!(cache.refresh(1_000).is_ok());
        assert_eq!(cache.latest().signal_dbm, -48);
        assert_eq!(cache.last_success_ms(), Some(1_000));
    }

    #[test]
    fn test_failure_keeps_last_known() {
        let mut mock = MockNetworkStats::new();
        mock.push_stats(stats(-58, Some(80)));
        mock.push_failure(CommError::Timeout { service: "stats".into(), timeout_ms: 5000 });
        let mut cache = StatsCache::new(Box::new(mock));

        cache.refresh(1_000).unwrap();
        assert!(cache.refresh(2_000).is_err());
        assert_eq!(cache.latest().signal_dbm, -58);
        assert_eq!(cache.consecutive_failures(), 1);
        assert_eq!(cache.last_success_ms(), Some(1_000));
    }

    #[test]
    fn test_out_of_range_signal_rejected() {
        let mut mock = MockNetworkStats::new();
        mock.push_stats(stats(20, Some(80)));
        let mut cache = StatsCache::new(Box::new(mock));

        assert!(matches!(cache.refresh(1_000), Err(CommError::InvalidResponse { .. })));
        assert_eq!(cache.latest(), &NetworkStats::fallback());
    }

    #[test]
    fn test_missing_quality_estimated() {
        let mut mock = MockNetworkStats::new();
        mock.push_stats(stats(-70, None));
        let mut cache = StatsCache::new(Box::new(mock));

        cache.refresh(1_000).unwrap();
        assert_eq!(cache.latest().quality_percent, Some(45));
    }
}
