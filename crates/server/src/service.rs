//! Yield service - shared state behind every route

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use yield_core::{
    required_networks, supported_protocols, AppConfig, ChainReader, CoreResult, StreamMessage,
};
use yield_feed::{BroadcastLoop, ProtocolRegistry, RpcChainReader, SnapshotState, YieldAggregator};

use crate::dto::HealthStatus;

/// Running broadcast loop
struct LoopControl {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// Service handle, cheap to clone
#[derive(Clone)]
pub struct YieldService {
    aggregator: Arc<YieldAggregator>,
    snapshots: Arc<SnapshotState>,
    updates: broadcast::Sender<StreamMessage>,
    update_interval: Duration,
    start_time: Instant,
    broadcast_loop: Arc<Mutex<Option<LoopControl>>>,
}

impl YieldService {
    /// Service over an arbitrary chain reader
    pub fn with_reader(reader: Arc<dyn ChainReader>, config: &AppConfig) -> Self {
        let registry = ProtocolRegistry::with_defaults(reader);
        let (updates, _) = broadcast::channel(config.ws_buffer.max(1));

        Self {
            aggregator: Arc::new(YieldAggregator::new(registry)),
            snapshots: Arc::new(SnapshotState::new()),
            updates,
            update_interval: config.update_interval(),
            start_time: Instant::now(),
            broadcast_loop: Arc::new(Mutex::new(None)),
        }
    }

    /// Service reading from the configured RPC endpoints.
    ///
    /// Fails if any network a registered protocol lives on has no RPC URL.
    pub fn from_config(config: &AppConfig) -> CoreResult<Self> {
        let required = required_networks(&supported_protocols());
        let reader = RpcChainReader::from_config(config, &required)?;
        Ok(Self::with_reader(Arc::new(reader), config))
    }

    pub fn aggregator(&self) -> &YieldAggregator {
        &self.aggregator
    }

    pub fn snapshots(&self) -> &SnapshotState {
        &self.snapshots
    }

    /// New subscriber to live updates
    pub fn subscribe(&self) -> broadcast::Receiver<StreamMessage> {
        self.updates.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.updates.receiver_count()
    }

    pub fn is_broadcasting(&self) -> bool {
        self.broadcast_loop.lock().is_some()
    }

    /// Start the broadcast loop. No-op if it is already running.
    pub fn start(&self) {
        let mut slot = self.broadcast_loop.lock();
        if slot.is_some() {
            warn!("Broadcast loop already running");
            return;
        }

        let (shutdown, shutdown_rx) = oneshot::channel();
        let broadcast_loop = BroadcastLoop::new(
            Arc::clone(&self.aggregator),
            Arc::clone(&self.snapshots),
            self.updates.clone(),
            self.update_interval,
        );

        let handle = tokio::spawn(async move {
            broadcast_loop.run(shutdown_rx).await;
        });

        *slot = Some(LoopControl { shutdown, handle });
        info!("Broadcast loop started");
    }

    /// Stop the broadcast loop, letting an in-flight cycle finish
    pub async fn stop(&self) {
        let control = self.broadcast_loop.lock().take();

        if let Some(control) = control {
            let _ = control.shutdown.send(());
            if let Err(e) = control.handle.await {
                warn!("Broadcast loop ended abnormally: {}", e);
            }
        }

        info!("All services stopped");
    }

    pub fn health(&self) -> HealthStatus {
        let stats = self.snapshots.stats();

        HealthStatus {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
            uptime_secs: self.start_time.elapsed().as_secs(),
            broadcasting: self.is_broadcasting(),
            subscribers: self.subscriber_count(),
            protocols: stats.protocol_count,
            failing_protocols: stats
                .failing_protocols
                .iter()
                .map(|k| k.key().to_string())
                .collect(),
            supported_assets: stats.supported_assets,
            cycle_count: stats.cycle_count,
            last_cycle_age_ms: stats.last_cycle_age.map(|age| age.as_millis() as u64),
        }
    }
}
