//! Latest-snapshot state
//!
//! Holds the most recent snapshot per protocol as recorded by the broadcast
//! loop. Readers never block the loop.

use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use yield_core::{ProtocolKey, ProtocolSnapshot};

#[derive(Debug)]
pub struct SnapshotState {
    snapshots: DashMap<ProtocolKey, ProtocolSnapshot>,

    cycle_count: AtomicU64,
    failure_count: AtomicU64,
    last_cycle: RwLock<Option<Instant>>,
}

impl SnapshotState {
    pub fn new() -> Self {
        Self {
            snapshots: DashMap::new(),
            cycle_count: AtomicU64::new(0),
            failure_count: AtomicU64::new(0),
            last_cycle: RwLock::new(None),
        }
    }

    /// Record all snapshots of one completed cycle
    pub fn record_cycle(&self, snapshots: &[ProtocolSnapshot]) {
        let now = Instant::now();

        for snapshot in snapshots {
            if snapshot.is_failed() {
                self.failure_count.fetch_add(1, Ordering::Relaxed);
            }
            self.snapshots.insert(snapshot.protocol_key, snapshot.clone());
        }

        self.cycle_count.fetch_add(1, Ordering::Relaxed);
        *self.last_cycle.write() = Some(now);
    }

    /// Latest snapshots in protocol order
    pub fn latest(&self) -> Vec<ProtocolSnapshot> {
        let mut snapshots: Vec<ProtocolSnapshot> = self
            .snapshots
            .iter()
            .map(|e| e.value().clone())
            .collect();
        snapshots.sort_by_key(|s| s.protocol_key);
        snapshots
    }

    pub fn stats(&self) -> SnapshotStateStats {
        let snapshots = self.latest();
        SnapshotStateStats {
            protocol_count: snapshots.len(),
            failing_protocols: snapshots
                .iter()
                .filter(|s| s.is_failed())
                .map(|s| s.protocol_key)
                .collect(),
            supported_assets: snapshots.iter().map(|s| s.supported_count()).sum(),
            cycle_count: self.cycle_count.load(Ordering::Relaxed),
            failure_count: self.failure_count.load(Ordering::Relaxed),
            last_cycle_age: self.last_cycle.read().map(|t| t.elapsed()),
        }
    }
}

impl Default for SnapshotState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct SnapshotStateStats {
    pub protocol_count: usize,
    pub failing_protocols: Vec<ProtocolKey>,
    pub supported_assets: usize,
    pub cycle_count: u64,
    pub failure_count: u64,
    pub last_cycle_age: Option<Duration>,
}
