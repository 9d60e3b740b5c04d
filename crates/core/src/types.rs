//! Core type definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::CoreError;

/// Supported blockchain networks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Ethereum,
    Arbitrum,
    Bnb,
}

impl Network {
    pub const ALL: [Network; 3] = [Network::Ethereum, Network::Arbitrum, Network::Bnb];

    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Ethereum => 1,
            Network::Arbitrum => 42161,
            Network::Bnb => 56,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Network::Ethereum => "ethereum",
            Network::Arbitrum => "arbitrum",
            Network::Bnb => "bnb",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Network::Ethereum => "Ethereum",
            Network::Arbitrum => "Arbitrum One",
            Network::Bnb => "BNB Chain",
        }
    }

    /// Environment variable holding this network's RPC endpoint
    pub fn rpc_env_key(&self) -> &'static str {
        match self {
            Network::Ethereum => "ETHEREUM_RPC_URL",
            Network::Arbitrum => "ARBITRUM_RPC_URL",
            Network::Bnb => "BNB_RPC_URL",
        }
    }

    /// Average blocks per year, used to compound per-block rates.
    ///
    /// `None` where no per-block market is tracked.
    pub fn blocks_per_year(&self) -> Option<u64> {
        match self {
            Network::Ethereum => Some(4 * 60 * 24 * 365), // ~12s blocks
            Network::Bnb => Some(10_512_000),             // ~3s blocks
            Network::Arbitrum => None,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for Network {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ethereum" => Ok(Network::Ethereum),
            "arbitrum" => Ok(Network::Arbitrum),
            "bnb" => Ok(Network::Bnb),
            _ => Err(CoreError::UnknownNetwork(s.to_string())),
        }
    }
}

/// Supported lending protocols, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolKey {
    Aave,
    Compound,
    Radiant,
    Silo,
    Spark,
    Venus,
}

impl ProtocolKey {
    pub const ALL: [ProtocolKey; 6] = [
        ProtocolKey::Aave,
        ProtocolKey::Compound,
        ProtocolKey::Radiant,
        ProtocolKey::Silo,
        ProtocolKey::Spark,
        ProtocolKey::Venus,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            ProtocolKey::Aave => "aave",
            ProtocolKey::Compound => "compound",
            ProtocolKey::Radiant => "radiant",
            ProtocolKey::Silo => "silo",
            ProtocolKey::Spark => "spark",
            ProtocolKey::Venus => "venus",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ProtocolKey::Aave => "Aave",
            ProtocolKey::Compound => "Compound",
            ProtocolKey::Radiant => "Radiant",
            ProtocolKey::Silo => "Silo",
            ProtocolKey::Spark => "Spark",
            ProtocolKey::Venus => "Venus",
        }
    }
}

impl fmt::Display for ProtocolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for ProtocolKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        ProtocolKey::ALL
            .into_iter()
            .find(|p| p.key() == normalized)
            .ok_or_else(|| CoreError::UnknownProtocol(s.to_string()))
    }
}

/// APY observation for one asset of one protocol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldRecord {
    pub asset: String,
    pub apy: Option<f64>,
    pub supported: bool,
    pub network: Option<Network>,
}

impl YieldRecord {
    pub fn supported(asset: &str, apy: f64, network: Network) -> Self {
        Self {
            asset: asset.to_string(),
            apy: Some(apy),
            supported: true,
            network: Some(network),
        }
    }

    pub fn unsupported(asset: &str, network: Option<Network>) -> Self {
        Self {
            asset: asset.to_string(),
            apy: None,
            supported: false,
            network,
        }
    }

    /// APY if this record carries a usable observation
    pub fn observed_apy(&self) -> Option<f64> {
        if self.supported {
            self.apy.filter(|apy| apy.is_finite())
        } else {
            None
        }
    }
}

/// Result of one aggregation cycle for one protocol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolSnapshot {
    pub protocol: String,
    pub protocol_key: ProtocolKey,
    pub network: Network,
    pub updated_at: i64,
    pub assets: Vec<YieldRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProtocolSnapshot {
    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    pub fn supported_count(&self) -> usize {
        self.assets.iter().filter(|a| a.supported).count()
    }

    /// Wire message for this snapshot, stamped with the cycle timestamp
    pub fn to_update(&self, timestamp: i64) -> YieldsUpdate {
        YieldsUpdate {
            protocol_key: self.protocol_key.key().to_string(),
            protocol: self.protocol.clone(),
            network: self.network.key().to_string(),
            payload: self.assets.clone(),
            timestamp,
        }
    }
}

/// Per-protocol live update pushed to subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YieldsUpdate {
    pub protocol_key: String,
    pub protocol: String,
    pub network: String,
    pub payload: Vec<YieldRecord>,
    pub timestamp: i64,
}

/// Messages on the subscriber stream, tagged by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StreamMessage {
    #[serde(rename = "yields_update")]
    YieldsUpdate(YieldsUpdate),
}

/// Current time in unix milliseconds
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
