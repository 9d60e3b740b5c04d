//! HTTP routes

use axum::{
    extract::{Query, State},
    http::Uri,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use yield_core::{ProtocolInfo, ProtocolSnapshot};

use crate::dto::{ApiResponse, HealthStatus};
use crate::errors::ApiError;
use crate::service::YieldService;
use crate::ws::ws_handler;

/// Protocol served by `/api/yields` when none is given
pub const DEFAULT_PROTOCOL: &str = "aave";

#[derive(Debug, Deserialize)]
pub struct YieldsQuery {
    pub protocol: Option<String>,
}

/// All routes, WebSocket stream included
pub fn api_router(service: YieldService) -> Router {
    Router::new()
        .route("/", get(ws_handler))
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .route("/api/protocols", get(list_protocols))
        .route("/api/yields", get(protocol_yields))
        .route("/api/yields/all", get(all_yields))
        .fallback(handler_404)
        .with_state(service)
}

async fn handler_404(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("No route for {}", uri.path()))
}

async fn all_yields(
    State(service): State<YieldService>,
) -> Json<ApiResponse<Vec<ProtocolSnapshot>>> {
    let snapshots = service.aggregator().snapshot_all().await;
    Json(ApiResponse::ok(snapshots))
}

async fn protocol_yields(
    State(service): State<YieldService>,
    Query(query): Query<YieldsQuery>,
) -> Result<Json<ApiResponse<ProtocolSnapshot>>, ApiError> {
    let protocol = query
        .protocol
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .unwrap_or(DEFAULT_PROTOCOL);

    let snapshot = service.aggregator().snapshot_one(protocol).await?;
    Ok(Json(ApiResponse::ok(snapshot)))
}

async fn list_protocols(
    State(service): State<YieldService>,
) -> Json<ApiResponse<Vec<ProtocolInfo>>> {
    let protocols = service.aggregator().list_protocols();
    let count = protocols.len();
    Json(ApiResponse::ok(protocols).with_count(count))
}

async fn health(State(service): State<YieldService>) -> Json<ApiResponse<HealthStatus>> {
    Json(ApiResponse::ok(service.health()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use alloy_primitives::{Address, U256};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use futures_util::StreamExt;
    use serde_json::Value;
    use tower::ServiceExt;

    use yield_core::{AppConfig, ChainReadResult, ChainReader, Network, RateField};

    use super::*;
    use crate::YieldServerBuilder;

    /// 2.7e26 for every pool reserve, ~9.5e-9 per block for every market token
    struct FixedRates;

    #[async_trait::async_trait]
    impl ChainReader for FixedRates {
        async fn read_rate(
            &self,
            _network: Network,
            _contract: Address,
            field: RateField,
        ) -> ChainReadResult<U256> {
            Ok(match field {
                RateField::ReserveLiquidityRate { .. } => {
                    U256::from(27u64) * U256::from(10u64).pow(U256::from(25u64))
                }
                RateField::SupplyRatePerBlock => U256::from(9_512_937_595u64),
            })
        }
    }

    fn service() -> YieldService {
        let config = AppConfig {
            update_interval_ms: 50,
            ..Default::default()
        };
        YieldService::with_reader(Arc::new(FixedRates), &config)
    }

    async fn get_json(uri: &str) -> (StatusCode, Value) {
        let response = api_router(service())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_single_protocol_yields() {
        let (status, json) = get_json("/api/yields?protocol=AAVE").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert!(json["timestamp"].is_i64());

        let data = &json["data"];
        assert_eq!(data["protocolKey"], "aave");
        assert_eq!(data["network"], "ethereum");
        assert_eq!(data["assets"][0]["asset"], "USDC");
        assert_eq!(data["assets"][0]["apy"], 27.0);
        assert_eq!(data["assets"][0]["supported"], true);
        assert_eq!(data["assets"][3]["supported"], false);
        assert!(data["assets"][3]["apy"].is_null());
    }

    #[tokio::test]
    async fn test_default_protocol_is_aave() {
        let (status, json) = get_json("/api/yields").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["protocolKey"], "aave");
    }

    #[tokio::test]
    async fn test_unknown_protocol_is_rejected() {
        let (status, json) = get_json("/api/yields?protocol=maker").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], false);
        assert!(json["error"].as_str().unwrap().contains("maker"));
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let (status, json) = get_json("/api/rates").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "No route for /api/rates");
    }

    #[tokio::test]
    async fn test_all_yields() {
        let (status, json) = get_json("/api/yields/all").await;
        assert_eq!(status, StatusCode::OK);

        let data = json["data"].as_array().unwrap();
        let keys: Vec<&str> = data.iter().map(|s| s["protocolKey"].as_str().unwrap()).collect();
        assert_eq!(keys, ["aave", "compound", "radiant", "silo", "spark", "venus"]);

        let venus_usdc = &data[5]["assets"][0];
        assert_eq!(venus_usdc["network"], "bnb");
        assert_eq!(venus_usdc["supported"], true);
    }

    #[tokio::test]
    async fn test_protocols_listing() {
        let (status, json) = get_json("/api/protocols").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["count"], 6);
        assert_eq!(json["data"][0]["key"], "aave");
        assert_eq!(json["data"][0]["primaryNetwork"], "ethereum");
        assert_eq!(json["data"][5]["networks"][0], "bnb");
    }

    #[tokio::test]
    async fn test_health_before_first_cycle() {
        let (status, json) = get_json("/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["status"], "ok");
        assert_eq!(json["data"]["cycleCount"], 0);
        assert_eq!(json["data"]["broadcasting"], false);
    }

    #[tokio::test]
    async fn test_websocket_receives_updates() {
        let service = service();
        let server = YieldServerBuilder::new().build(service.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
        let serving = tokio::spawn(async move { server.serve(listener, shutdown_rx).await });

        let (mut socket, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
            .await
            .unwrap();

        service.start();

        let mut updates = Vec::new();
        while updates.len() < 6 {
            let frame = tokio::time::timeout(Duration::from_secs(5), socket.next())
                .await
                .unwrap()
                .unwrap()
                .unwrap();
            if let tokio_tungstenite::tungstenite::Message::Text(text) = frame {
                updates.push(serde_json::from_str::<Value>(&text).unwrap());
            }
        }

        assert!(updates.iter().all(|u| u["type"] == "yields_update"));
        assert_eq!(updates[0]["protocolKey"], "aave");
        assert_eq!(updates[5]["protocolKey"], "venus");

        // One cycle, one timestamp
        let timestamp = &updates[0]["timestamp"];
        assert!(updates.iter().all(|u| &u["timestamp"] == timestamp));

        service.stop().await;
        assert!(service.snapshots().stats().cycle_count >= 1);

        drop(socket);
        shutdown_tx.send(()).unwrap();
        serving.await.unwrap().unwrap();
    }
}
