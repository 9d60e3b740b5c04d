//! Rolling history store
//!
//! Reducer over live updates: every supported observation is appended to its
//! (protocol, asset) series, which is then trimmed to the most recent
//! `capacity` points. Unsupported records are dropped. Series are never
//! evicted when a protocol or asset stops reporting.

use std::collections::{BTreeMap, VecDeque};

use chrono::{Local, TimeZone};
use serde::Serialize;

use yield_core::YieldsUpdate;

/// Points kept per series
pub const DEFAULT_HISTORY_LEN: usize = 60;

/// One observation on a series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryPoint {
    /// Local wall-clock time, `HH:MM:SS`
    pub time: String,
    pub apy: f64,
}

/// Series key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeriesKey {
    pub protocol_key: String,
    pub asset: String,
}

impl SeriesKey {
    pub fn new(protocol_key: &str, asset: &str) -> Self {
        Self {
            protocol_key: protocol_key.to_string(),
            asset: asset.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RollingHistory {
    capacity: usize,
    series: BTreeMap<SeriesKey, VecDeque<HistoryPoint>>,
}

impl RollingHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            series: BTreeMap::new(),
        }
    }

    /// Fold one update in, returning how many points were appended
    pub fn apply(&mut self, update: &YieldsUpdate) -> usize {
        let time = format_time(update.timestamp);
        let mut appended = 0;

        for record in &update.payload {
            let Some(apy) = record.observed_apy() else {
                continue;
            };

            let points = self
                .series
                .entry(SeriesKey::new(&update.protocol_key, &record.asset))
                .or_default();

            points.push_back(HistoryPoint {
                time: time.clone(),
                apy,
            });
            while points.len() > self.capacity {
                points.pop_front();
            }
            appended += 1;
        }

        appended
    }

    /// Points for a series, oldest first
    pub fn series(&self, protocol_key: &str, asset: &str) -> Vec<HistoryPoint> {
        self.series
            .get(&SeriesKey::new(protocol_key, asset))
            .map(|points| points.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn latest(&self, protocol_key: &str, asset: &str) -> Option<&HistoryPoint> {
        self.series
            .get(&SeriesKey::new(protocol_key, asset))
            .and_then(|points| points.back())
    }

    pub fn series_count(&self) -> usize {
        self.series.len()
    }

    pub fn point_count(&self) -> usize {
        self.series.values().map(VecDeque::len).sum()
    }
}

impl Default for RollingHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LEN)
    }
}

/// Unix milliseconds as local `HH:MM:SS`
pub fn format_time(timestamp_ms: i64) -> String {
    Local
        .timestamp_millis_opt(timestamp_ms)
        .single()
        .unwrap_or_else(Local::now)
        .format("%H:%M:%S")
        .to_string()
}

/// Display form of an APY: two decimals and a percent sign, or `N/A`
pub fn format_apy(apy: Option<f64>) -> String {
    match apy {
        Some(value) if value.is_finite() => format!("{value:.2} %"),
        _ => "N/A".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use yield_core::{Network, YieldRecord};

    fn update(protocol_key: &str, timestamp: i64, payload: Vec<YieldRecord>) -> YieldsUpdate {
        YieldsUpdate {
            protocol_key: protocol_key.to_string(),
            protocol: protocol_key.to_uppercase(),
            network: "ethereum".to_string(),
            payload,
            timestamp,
        }
    }

    #[test]
    fn test_keeps_most_recent_points() {
        let mut history = RollingHistory::default();

        for i in 0..70 {
            let record = YieldRecord::supported("USDC", i as f64, Network::Ethereum);
            history.apply(&update("aave", 1_700_000_000_000 + i * 1000, vec![record]));
        }

        let points = history.series("aave", "USDC");
        assert_eq!(points.len(), 60);
        assert_eq!(points.first().unwrap().apy, 10.0);
        assert_eq!(points.last().unwrap().apy, 69.0);
    }

    #[test]
    fn test_unsupported_records_never_append() {
        let mut history = RollingHistory::default();

        let appended = history.apply(&update(
            "venus",
            0,
            vec![
                YieldRecord::unsupported("USDE", None),
                YieldRecord::unsupported("CevUSD", Some(Network::Bnb)),
            ],
        ));

        assert_eq!(appended, 0);
        assert_eq!(history.series_count(), 0);
    }

    #[test]
    fn test_supported_without_apy_is_dropped() {
        let mut history = RollingHistory::default();
        let mut record = YieldRecord::supported("USDT", 1.0, Network::Ethereum);
        record.apy = None;

        assert_eq!(history.apply(&update("spark", 0, vec![record])), 0);
    }

    #[test]
    fn test_series_survive_absence() {
        let mut history = RollingHistory::default();
        history.apply(&update(
            "compound",
            0,
            vec![YieldRecord::supported("USDC", 3.1, Network::Ethereum)],
        ));
        history.apply(&update(
            "compound",
            1000,
            vec![YieldRecord::unsupported("USDC", Some(Network::Ethereum))],
        ));

        assert_eq!(history.series("compound", "USDC").len(), 1);
        assert_eq!(history.latest("compound", "USDC").unwrap().apy, 3.1);
    }

    #[test]
    fn test_out_of_order_timestamps_append_in_arrival_order() {
        let mut history = RollingHistory::new(5);
        history.apply(&update(
            "aave",
            5_000,
            vec![YieldRecord::supported("USDC", 1.0, Network::Ethereum)],
        ));
        history.apply(&update(
            "aave",
            1_000,
            vec![YieldRecord::supported("USDC", 2.0, Network::Ethereum)],
        ));

        let apys: Vec<f64> = history.series("aave", "USDC").iter().map(|p| p.apy).collect();
        assert_eq!(apys, [1.0, 2.0]);
    }

    #[test]
    fn test_time_format() {
        let time = format_time(1_700_000_000_000);
        assert_eq!(time.len(), 8);
        assert_eq!(time.matches(':').count(), 2);
    }

    #[test]
    fn test_format_apy() {
        assert_eq!(format_apy(Some(4.2149)), "4.21 %");
        assert_eq!(format_apy(Some(0.0)), "0.00 %");
        assert_eq!(format_apy(None), "N/A");
        assert_eq!(format_apy(Some(f64::NAN)), "N/A");
    }

    proptest! {
        #[test]
        fn prop_series_never_exceed_capacity(
            capacity in 1usize..80,
            apys in proptest::collection::vec(0.0f64..100.0, 0..200),
        ) {
            let mut history = RollingHistory::new(capacity);
            for (i, apy) in apys.iter().enumerate() {
                let record = YieldRecord::supported("USDC", *apy, Network::Ethereum);
                history.apply(&update("aave", i as i64, vec![record]));
            }

            let points = history.series("aave", "USDC");
            prop_assert_eq!(points.len(), apys.len().min(capacity));
            if let Some(last) = points.last() {
                prop_assert_eq!(last.apy, *apys.last().unwrap());
            }
        }
    }
}
