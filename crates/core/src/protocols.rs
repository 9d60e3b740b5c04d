//! Protocol metadata for discovery

use serde::{Deserialize, Serialize};

use crate::{Network, ProtocolKey};

/// Public description of a supported protocol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolInfo {
    pub key: ProtocolKey,
    pub name: String,
    pub networks: Vec<Network>,
    pub primary_network: Network,
}

impl ProtocolInfo {
    pub fn for_protocol(key: ProtocolKey) -> Self {
        let networks = match key {
            ProtocolKey::Aave => vec![Network::Ethereum, Network::Arbitrum],
            ProtocolKey::Compound | ProtocolKey::Silo | ProtocolKey::Spark => {
                vec![Network::Ethereum]
            }
            ProtocolKey::Radiant => vec![Network::Arbitrum],
            ProtocolKey::Venus => vec![Network::Bnb],
        };

        Self {
            key,
            name: key.name().to_string(),
            primary_network: networks[0],
            networks,
        }
    }
}

/// All supported protocols, in display order
pub fn supported_protocols() -> Vec<ProtocolInfo> {
    ProtocolKey::ALL
        .into_iter()
        .map(ProtocolInfo::for_protocol)
        .collect()
}

/// Networks at least one protocol is deployed on
pub fn required_networks(protocols: &[ProtocolInfo]) -> Vec<Network> {
    let mut networks: Vec<Network> = protocols
        .iter()
        .flat_map(|p| p.networks.iter().copied())
        .collect();
    networks.sort();
    networks.dedup();
    networks
}
