//! Live stream watcher
//!
//! Subscribes to the yield stream over WebSocket, validates each message and
//! folds it into a [`RollingHistory`]. Reconnects after a delay until the
//! configured attempt limit is reached.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use parking_lot::RwLock;
use thiserror::Error;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use yield_core::{StreamMessage, WatchConfig, YieldsUpdate};

use crate::store::{format_apy, RollingHistory};

/// Message type accepted from the stream
pub const UPDATE_MESSAGE_TYPE: &str = "yields_update";

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("Malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Unexpected message type: {0}")]
    UnexpectedType(String),

    #[error("Message has no type")]
    MissingType,
}

/// Validate and decode one text frame
pub fn parse_message(text: &str) -> Result<YieldsUpdate, MessageError> {
    let value: serde_json::Value = serde_json::from_str(text)?;

    match value.get("type").and_then(|t| t.as_str()) {
        Some(UPDATE_MESSAGE_TYPE) => {}
        Some(other) => return Err(MessageError::UnexpectedType(other.to_string())),
        None => return Err(MessageError::MissingType),
    }

    let message: StreamMessage = serde_json::from_value(value)?;
    let StreamMessage::YieldsUpdate(update) = message;
    Ok(update)
}

pub struct YieldWatcher {
    config: WatchConfig,
    history: Arc<RwLock<RollingHistory>>,
    latest: RwLock<BTreeMap<String, YieldsUpdate>>,
    message_count: AtomicU64,
    rejected_count: AtomicU64,
}

impl YieldWatcher {
    pub fn new(config: WatchConfig) -> Self {
        let history = RollingHistory::new(config.history_len);
        Self {
            config,
            history: Arc::new(RwLock::new(history)),
            latest: RwLock::new(BTreeMap::new()),
            message_count: AtomicU64::new(0),
            rejected_count: AtomicU64::new(0),
        }
    }

    pub fn history(&self) -> Arc<RwLock<RollingHistory>> {
        Arc::clone(&self.history)
    }

    pub fn message_count(&self) -> u64 {
        self.message_count.load(Ordering::Relaxed)
    }

    pub fn rejected_count(&self) -> u64 {
        self.rejected_count.load(Ordering::Relaxed)
    }

    /// Apply one text frame. Invalid frames are counted and skipped.
    pub fn handle_text(&self, text: &str) -> Result<usize, MessageError> {
        let update = match parse_message(text) {
            Ok(update) => update,
            Err(e) => {
                self.rejected_count.fetch_add(1, Ordering::Relaxed);
                return Err(e);
            }
        };

        let appended = self.history.write().apply(&update);
        self.latest.write().insert(update.protocol_key.clone(), update);
        self.message_count.fetch_add(1, Ordering::Relaxed);

        Ok(appended)
    }

    /// One line per protocol with the latest APY of each asset
    pub fn report(&self) -> Vec<String> {
        let latest = self.latest.read();
        let history = self.history.read();

        latest
            .values()
            .map(|update| {
                let assets: Vec<String> = update
                    .payload
                    .iter()
                    .map(|record| {
                        let points = history.series(&update.protocol_key, &record.asset).len();
                        format!(
                            "{} {} [{} pts]",
                            record.asset,
                            format_apy(record.observed_apy()),
                            points
                        )
                    })
                    .collect();

                format!("{} ({}): {}", update.protocol, update.network, assets.join(", "))
            })
            .collect()
    }

    /// Stream until the reconnect budget is spent.
    ///
    /// A session that delivered at least one update resets the budget. A
    /// close before any update counts as a failed attempt, so a server that
    /// accepts and immediately hangs up cannot keep the watcher spinning.
    pub async fn run(&self) {
        let mut reconnect_count = 0;

        loop {
            match self.connect_and_listen().await {
                Ok(received) if received > 0 => {
                    info!(received, "Yield stream closed by server, reconnecting");
                    reconnect_count = 0;
                    tokio::time::sleep(self.config.reconnect_delay()).await;
                    continue;
                }
                Ok(_) => warn!("Yield stream closed before any update"),
                Err(e) => error!("Yield stream error: {}", e),
            }

            reconnect_count += 1;
            if reconnect_count >= self.config.max_reconnects {
                error!("Max reconnects reached for {}", self.config.yield_ws_url);
                break;
            }

            warn!(
                "Reconnecting in {:?} (attempt {}/{})",
                self.config.reconnect_delay(),
                reconnect_count,
                self.config.max_reconnects
            );
            tokio::time::sleep(self.config.reconnect_delay()).await;
        }
    }

    /// One session; returns the number of updates applied before close
    async fn connect_and_listen(&self) -> anyhow::Result<u64> {
        info!("Connecting to yield stream at {}", self.config.yield_ws_url);

        let (ws_stream, _) = connect_async(&self.config.yield_ws_url).await?;
        let (mut write, mut read) = ws_stream.split();
        let mut received = 0;

        info!("Connected to yield stream");

        while let Some(msg) = read.next().await {
            match msg {
                Ok(Message::Text(text)) => match self.handle_text(&text) {
                    Ok(appended) => {
                        received += 1;
                        debug!(appended, "Applied yields update");
                    }
                    Err(e) => warn!("Skipping message: {}", e),
                },
                Ok(Message::Ping(data)) => {
                    write.send(Message::Pong(data)).await?;
                }
                Ok(Message::Close(_)) => {
                    info!("Yield stream sent close frame");
                    break;
                }
                Ok(_) => {}
                Err(e) => return Err(e.into()),
            }
        }

        Ok(received)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AAVE_UPDATE: &str = r#"{
        "type": "yields_update",
        "protocolKey": "aave",
        "protocol": "Aave",
        "network": "ethereum",
        "payload": [
            {"asset": "USDC", "apy": 4.2, "supported": true, "network": "ethereum"},
            {"asset": "USDE", "apy": null, "supported": false, "network": "arbitrum"},
            {"asset": "CevUSD", "apy": null, "supported": false, "network": null}
        ],
        "timestamp": 1700000000000
    }"#;

    #[test]
    fn test_parse_valid_update() {
        let update = parse_message(AAVE_UPDATE).unwrap();
        assert_eq!(update.protocol_key, "aave");
        assert_eq!(update.payload.len(), 3);
        assert_eq!(update.payload[0].apy, Some(4.2));
        assert_eq!(update.payload[2].network, None);
    }

    #[test]
    fn test_parse_rejects_other_types() {
        let err = parse_message(r#"{"type": "heartbeat"}"#).unwrap_err();
        assert!(matches!(err, MessageError::UnexpectedType(t) if t == "heartbeat"));

        let err = parse_message(r#"{"protocolKey": "aave"}"#).unwrap_err();
        assert!(matches!(err, MessageError::MissingType));

        let err = parse_message("not json").unwrap_err();
        assert!(matches!(err, MessageError::Malformed(_)));
    }

    #[test]
    fn test_handle_text_feeds_history() {
        let watcher = YieldWatcher::new(WatchConfig::default());

        assert_eq!(watcher.handle_text(AAVE_UPDATE).unwrap(), 1);
        assert!(watcher.handle_text(r#"{"type": "other"}"#).is_err());

        assert_eq!(watcher.message_count(), 1);
        assert_eq!(watcher.rejected_count(), 1);
        assert_eq!(watcher.history().read().series("aave", "USDC").len(), 1);
    }

    #[test]
    fn test_report_formats_apys() {
        let watcher = YieldWatcher::new(WatchConfig::default());
        watcher.handle_text(AAVE_UPDATE).unwrap();

        let report = watcher.report();
        assert_eq!(report.len(), 1);
        assert_eq!(
            report[0],
            "Aave (ethereum): USDC 4.20 % [1 pts], USDE N/A [0 pts], CevUSD N/A [0 pts]"
        );
    }

    #[tokio::test]
    async fn test_run_gives_up_after_max_reconnects() {
        let config = WatchConfig {
            yield_ws_url: "ws://127.0.0.1:1/ws".to_string(),
            reconnect_delay_ms: 1,
            max_reconnects: 2,
            ..Default::default()
        };
        let watcher = YieldWatcher::new(config);

        tokio::time::timeout(std::time::Duration::from_secs(10), watcher.run())
            .await
            .unwrap();
        assert_eq!(watcher.message_count(), 0);
    }

    #[tokio::test]
    async fn test_run_gives_up_on_servers_that_close_immediately() {
        use std::sync::atomic::AtomicUsize;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accepted = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&accepted);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                if let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await {
                    let _ = ws.close(None).await;
                }
            }
        });

        let config = WatchConfig {
            yield_ws_url: format!("ws://{addr}/ws"),
            reconnect_delay_ms: 1,
            max_reconnects: 3,
            ..Default::default()
        };
        let watcher = YieldWatcher::new(config);

        tokio::time::timeout(std::time::Duration::from_secs(10), watcher.run())
            .await
            .unwrap();
        assert_eq!(accepted.load(Ordering::SeqCst), 3);
        assert_eq!(watcher.message_count(), 0);
    }

    #[tokio::test]
    async fn test_delivered_updates_reset_reconnect_budget() {
        use std::sync::atomic::AtomicUsize;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accepted = Arc::new(AtomicUsize::new(0));

        // First two sessions deliver an update, the rest hang up at once
        let counter = Arc::clone(&accepted);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let session = counter.fetch_add(1, Ordering::SeqCst);
                if let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await {
                    if session < 2 {
                        let _ = ws.send(Message::Text(AAVE_UPDATE.to_string())).await;
                    }
                    let _ = ws.close(None).await;
                }
            }
        });

        let config = WatchConfig {
            yield_ws_url: format!("ws://{addr}/ws"),
            reconnect_delay_ms: 1,
            max_reconnects: 2,
            ..Default::default()
        };
        let watcher = YieldWatcher::new(config);

        tokio::time::timeout(std::time::Duration::from_secs(10), watcher.run())
            .await
            .unwrap();
        assert_eq!(watcher.message_count(), 2);
        assert_eq!(accepted.load(Ordering::SeqCst), 4);
        assert_eq!(watcher.history().read().series("aave", "USDC").len(), 2);
    }
}
