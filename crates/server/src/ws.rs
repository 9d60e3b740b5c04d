//! WebSocket fan-out
//!
//! Each connection gets its own broadcast receiver. A subscriber that falls
//! behind skips the missed updates; a closed socket ends its writer.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

use yield_core::StreamMessage;

use crate::service::YieldService;

pub async fn ws_handler(ws: WebSocketUpgrade, State(service): State<YieldService>) -> Response {
    let updates = service.subscribe();
    ws.on_upgrade(move |socket| stream_updates(socket, updates))
}

async fn stream_updates(socket: WebSocket, mut updates: broadcast::Receiver<StreamMessage>) {
    let (mut sink, mut inbound) = socket.split();
    debug!("Subscriber connected");

    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Ok(message) => {
                    let text = match serde_json::to_string(&message) {
                        Ok(text) => text,
                        Err(e) => {
                            warn!("Failed to encode update: {}", e);
                            continue;
                        }
                    };

                    if sink.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Subscriber lagging, dropped updates");
                }
                Err(RecvError::Closed) => break,
            },
            frame = inbound.next() => match frame {
                // Pings are answered by the protocol layer
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    debug!("Subscriber disconnected");
}
