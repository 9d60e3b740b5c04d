//! Periodic broadcast loop
//!
//! Every tick runs one aggregation cycle and publishes one message per
//! protocol. Cycles run inline in the loop, so a slow cycle delays the next
//! tick instead of overlapping it; missed ticks are skipped.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{broadcast, oneshot};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use yield_core::{now_ms, StreamMessage};

use crate::aggregator::YieldAggregator;
use crate::state::SnapshotState;

/// Default cycle period
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(1000);

/// Outcome of a single cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub messages: usize,
    pub receivers: usize,
    pub failed: usize,
    pub timestamp: i64,
}

pub struct BroadcastLoop {
    aggregator: Arc<YieldAggregator>,
    state: Arc<SnapshotState>,
    sender: broadcast::Sender<StreamMessage>,
    interval: Duration,
}

impl BroadcastLoop {
    pub fn new(
        aggregator: Arc<YieldAggregator>,
        state: Arc<SnapshotState>,
        sender: broadcast::Sender<StreamMessage>,
        interval: Duration,
    ) -> Self {
        Self {
            aggregator,
            state,
            sender,
            interval,
        }
    }

    /// Run one aggregation cycle and publish its messages
    pub async fn cycle(&self) -> CycleReport {
        let snapshots = self.aggregator.snapshot_all().await;
        self.state.record_cycle(&snapshots);

        // One timestamp shared by every message of the cycle
        let timestamp = now_ms();
        let mut receivers = 0;

        for snapshot in &snapshots {
            let message = StreamMessage::YieldsUpdate(snapshot.to_update(timestamp));
            // Err only means nobody is subscribed right now
            receivers = self.sender.send(message).unwrap_or(0);
        }

        CycleReport {
            messages: snapshots.len(),
            receivers,
            failed: snapshots.iter().filter(|s| s.is_failed()).count(),
            timestamp,
        }
    }

    /// Run until `shutdown` fires. An in-flight cycle finishes first.
    pub async fn run(&self, mut shutdown: oneshot::Receiver<()>) {
        info!(interval_ms = self.interval.as_millis() as u64, "Starting broadcast loop");

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let start = Instant::now();
                    let report = self.cycle().await;

                    debug!(
                        messages = report.messages,
                        receivers = report.receivers,
                        failed = report.failed,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "Broadcast cycle complete"
                    );
                }
                _ = &mut shutdown => {
                    info!("Broadcast loop shutdown requested");
                    break;
                }
            }
        }
    }
}
