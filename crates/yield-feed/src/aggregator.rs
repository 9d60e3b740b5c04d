//! Yield aggregator - fans out to every protocol fetcher
//!
//! Each protocol runs in its own task. A fetcher that errors or panics only
//! affects its own snapshot, which is replaced by an empty one carrying a
//! generic error message.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, error};

use yield_core::{now_ms, CoreResult, ProtocolInfo, ProtocolKey, ProtocolSnapshot};

use crate::registry::{ProtocolRegistry, RegisteredProtocol};

/// Client-facing message for a failed protocol
pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch protocol yields";

/// Main yield aggregator
pub struct YieldAggregator {
    registry: ProtocolRegistry,
}

impl YieldAggregator {
    pub fn new(registry: ProtocolRegistry) -> Self {
        Self { registry }
    }

    /// Metadata for every registered protocol
    pub fn list_protocols(&self) -> Vec<ProtocolInfo> {
        self.registry.infos()
    }

    /// Snapshot every protocol, in registry order
    pub async fn snapshot_all(&self) -> Vec<ProtocolSnapshot> {
        let started = std::time::Instant::now();

        let tasks = self.registry.iter().cloned().map(snapshot_isolated);
        let snapshots = join_all(tasks).await;

        debug!(
            protocols = snapshots.len(),
            failed = snapshots.iter().filter(|s| s.is_failed()).count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Aggregation cycle complete"
        );

        snapshots
    }

    /// Snapshot a single protocol by key (case-insensitive)
    pub async fn snapshot_one(&self, protocol_key: &str) -> CoreResult<ProtocolSnapshot> {
        let key: ProtocolKey = protocol_key.parse()?;
        let entry = self
            .registry
            .get(key)
            .cloned()
            .ok_or_else(|| yield_core::CoreError::UnknownProtocol(protocol_key.to_string()))?;

        Ok(snapshot_isolated(entry).await)
    }
}

/// Run one fetcher on its own task and fold any failure into the snapshot
async fn snapshot_isolated(entry: RegisteredProtocol) -> ProtocolSnapshot {
    let info = entry.info;
    let fetcher = entry.fetcher;

    let outcome = tokio::spawn(async move { fetcher.fetch_yields().await }).await;

    let (assets, error) = match outcome {
        Ok(Ok(assets)) => (assets, None),
        Ok(Err(e)) => {
            error!(protocol = %info.key, error = %e, "Protocol fetch failed");
            (Vec::new(), Some(FETCH_FAILED_MESSAGE.to_string()))
        }
        Err(e) => {
            error!(protocol = %info.key, error = %e, "Protocol fetch task aborted");
            (Vec::new(), Some(FETCH_FAILED_MESSAGE.to_string()))
        }
    };

    ProtocolSnapshot {
        protocol: info.name,
        protocol_key: info.key,
        network: info.primary_network,
        updated_at: now_ms(),
        assets,
        error,
    }
}
