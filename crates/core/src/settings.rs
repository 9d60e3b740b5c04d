//! Configuration types
//!
//! Values come from defaults overlaid with process environment variables
//! (a `.env` file is loaded by the binaries before calling `load`).

use config::{Config, Environment};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{CoreError, CoreResult, Network};

fn from_env<T: serde::de::DeserializeOwned>(defaults: &[(&str, config::Value)]) -> CoreResult<T> {
    let mut builder = Config::builder();
    for (key, value) in defaults {
        builder = builder
            .set_default(*key, value.clone())
            .map_err(|e| CoreError::InvalidConfig(e.to_string()))?;
    }

    builder
        .add_source(Environment::default().try_parsing(true))
        .build()
        .and_then(Config::try_deserialize)
        .map_err(|e| CoreError::InvalidConfig(e.to_string()))
}

/// Server process configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub ethereum_rpc_url: Option<String>,
    pub arbitrum_rpc_url: Option<String>,
    pub bnb_rpc_url: Option<String>,
    pub rpc_timeout_ms: u64,
    pub update_interval_ms: u64,
    pub cors_allowed_origins: String,
    pub ws_buffer: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4000,
            ethereum_rpc_url: None,
            arbitrum_rpc_url: None,
            bnb_rpc_url: None,
            rpc_timeout_ms: 5_000,
            update_interval_ms: 1_000,
            cors_allowed_origins: "http://localhost:3000".to_string(),
            ws_buffer: 256,
        }
    }
}

impl AppConfig {
    /// Load from environment on top of defaults, then validate
    pub fn load() -> CoreResult<Self> {
        let d = Self::default();
        let config: Self = from_env(&[
            ("host", d.host.into()),
            ("port", i64::from(d.port).into()),
            ("rpc_timeout_ms", (d.rpc_timeout_ms as i64).into()),
            ("update_interval_ms", (d.update_interval_ms as i64).into()),
            ("cors_allowed_origins", d.cors_allowed_origins.into()),
            ("ws_buffer", (d.ws_buffer as i64).into()),
        ])?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.rpc_timeout_ms == 0 {
            return Err(CoreError::InvalidConfig("rpc_timeout_ms must be > 0".into()));
        }
        if self.update_interval_ms == 0 {
            return Err(CoreError::InvalidConfig("update_interval_ms must be > 0".into()));
        }
        if self.ws_buffer == 0 {
            return Err(CoreError::InvalidConfig("ws_buffer must be > 0".into()));
        }
        Ok(())
    }

    /// Configured RPC URL for a network (blank counts as missing)
    pub fn rpc_url(&self, network: Network) -> Option<&str> {
        let url = match network {
            Network::Ethereum => self.ethereum_rpc_url.as_deref(),
            Network::Arbitrum => self.arbitrum_rpc_url.as_deref(),
            Network::Bnb => self.bnb_rpc_url.as_deref(),
        };
        url.map(str::trim).filter(|u| !u.is_empty())
    }

    /// Fail unless every given network has an RPC URL
    pub fn require_rpc_urls(&self, networks: &[Network]) -> CoreResult<()> {
        for network in networks {
            if self.rpc_url(*network).is_none() {
                return Err(CoreError::ChainNotConfigured {
                    network: *network,
                    env_key: network.rpc_env_key(),
                });
            }
        }
        Ok(())
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_timeout_ms)
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_interval_ms)
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Live watcher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    pub yield_ws_url: String,
    pub reconnect_delay_ms: u64,
    pub max_reconnects: u32,
    pub history_len: usize,
    pub report_interval_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            yield_ws_url: "ws://localhost:4000/ws".to_string(),
            reconnect_delay_ms: 5_000,
            max_reconnects: 10,
            history_len: 60,
            report_interval_ms: 10_000,
        }
    }
}

impl WatchConfig {
    pub fn load() -> CoreResult<Self> {
        let d = Self::default();
        let config: Self = from_env(&[
            ("yield_ws_url", d.yield_ws_url.into()),
            ("reconnect_delay_ms", (d.reconnect_delay_ms as i64).into()),
            ("max_reconnects", i64::from(d.max_reconnects).into()),
            ("history_len", (d.history_len as i64).into()),
            ("report_interval_ms", (d.report_interval_ms as i64).into()),
        ])?;

        if config.history_len == 0 {
            return Err(CoreError::InvalidConfig("history_len must be > 0".into()));
        }
        if config.report_interval_ms == 0 {
            return Err(CoreError::InvalidConfig("report_interval_ms must be > 0".into()));
        }
        Ok(config)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_millis(self.report_interval_ms)
    }
}
