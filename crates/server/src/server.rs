//! HTTP server configuration and startup

use std::net::SocketAddr;

use axum::http::{HeaderValue, Method};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use yield_core::AppConfig;

use crate::routes::api_router;
use crate::service::YieldService;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4000,
            cors_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

impl From<&AppConfig> for ServerConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            cors_origins: config.cors_origins(),
        }
    }
}

/// CORS restricted to `origins`; `*` allows any origin
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any);

    if origins.iter().any(|o| o.trim() == "*") {
        return base.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(origin = %origin, error = %e, "Invalid CORS origin, skipping");
                None
            }
        })
        .collect();

    base.allow_origin(AllowOrigin::list(allowed))
}

/// HTTP + WebSocket server
pub struct YieldServer {
    config: ServerConfig,
    service: YieldService,
}

impl YieldServer {
    pub fn new(config: ServerConfig, service: YieldService) -> Self {
        Self { config, service }
    }

    /// Router with CORS and request tracing
    pub fn router(&self) -> Router {
        api_router(self.service.clone())
            .layer(cors_layer(&self.config.cors_origins))
            .layer(TraceLayer::new_for_http())
    }

    /// Bind the configured address and serve until `shutdown` fires
    pub async fn start_with_shutdown(
        &self,
        shutdown: tokio::sync::oneshot::Receiver<()>,
    ) -> anyhow::Result<()> {
        let addr: SocketAddr = self.address().parse()?;
        let listener = TcpListener::bind(addr).await?;

        info!("Starting yield server on {} (with graceful shutdown)", addr);
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener
    pub async fn serve(
        &self,
        listener: TcpListener,
        shutdown: tokio::sync::oneshot::Receiver<()>,
    ) -> anyhow::Result<()> {
        axum::serve(listener, self.router())
            .with_graceful_shutdown(async {
                shutdown.await.ok();
                info!("Shutdown signal received");
            })
            .await?;

        Ok(())
    }

    /// Get server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }
}

/// Builder for server configuration
pub struct YieldServerBuilder {
    config: ServerConfig,
}

impl YieldServerBuilder {
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            config: ServerConfig::from(config),
        }
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn build(self, service: YieldService) -> YieldServer {
        YieldServer::new(self.config, service)
    }
}

impl Default for YieldServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 4000);
        assert_eq!(config.host, "0.0.0.0");
    }

    #[test]
    fn test_config_from_app_config() {
        let app = AppConfig {
            port: 8080,
            cors_allowed_origins: "http://a.test, http://b.test".to_string(),
            ..Default::default()
        };
        let config = ServerConfig::from(&app);
        assert_eq!(config.port, 8080);
        assert_eq!(config.cors_origins, vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn test_builder() {
        let app = AppConfig {
            ethereum_rpc_url: Some("http://127.0.0.1:1".into()),
            arbitrum_rpc_url: Some("http://127.0.0.1:1".into()),
            bnb_rpc_url: Some("http://127.0.0.1:1".into()),
            ..Default::default()
        };
        let service = YieldService::from_config(&app).unwrap();

        let server = YieldServerBuilder::new()
            .host("127.0.0.1")
            .port(9000)
            .build(service);

        assert_eq!(server.address(), "127.0.0.1:9000");
    }
}
