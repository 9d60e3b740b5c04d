//! Asset → network resolution
//!
//! Each (asset, protocol) pair has an ordered list of candidate networks.
//! The first candidate is the network rates are read from; later entries are
//! informational only and never retried automatically.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::{Network, ProtocolKey};

type CandidateMap = HashMap<ProtocolKey, Vec<Network>>;

/// Candidate networks keyed by uppercased asset symbol
static ASSET_NETWORKS: LazyLock<HashMap<&'static str, CandidateMap>> = LazyLock::new(|| {
    use Network::*;
    use ProtocolKey::*;

    let mut assets = HashMap::new();

    assets.insert("USDC", HashMap::from([
        (Aave, vec![Ethereum, Arbitrum]),
        (Compound, vec![Ethereum]),
        (Spark, vec![Ethereum]),
        (Radiant, vec![Arbitrum]),
        (Silo, vec![Ethereum]),
        (Venus, vec![Bnb]),
    ]));

    assets.insert("USDT", HashMap::from([
        (Aave, vec![Ethereum, Arbitrum]),
        (Compound, vec![Ethereum]),
        (Spark, vec![Ethereum]),
        (Radiant, vec![Arbitrum]),
        (Silo, vec![Ethereum]),
        (Venus, vec![Bnb]),
    ]));

    // Ethena USDe only has Arbitrum candidates
    assets.insert("USDE", HashMap::from([
        (Aave, vec![Arbitrum]),
        (Compound, vec![]),
        (Spark, vec![]),
        (Radiant, vec![Arbitrum]),
        (Silo, vec![]),
        (Venus, vec![]),
    ]));

    assets.insert("CEVUSD", HashMap::from([
        (Aave, vec![]),
        (Compound, vec![]),
        (Spark, vec![]),
        (Radiant, vec![]),
        (Silo, vec![]),
        (Venus, vec![]),
    ]));

    assets
});

fn lookup(protocol_key: &str, asset_symbol: &str) -> &'static [Network] {
    let Ok(protocol) = protocol_key.parse::<ProtocolKey>() else {
        return &[];
    };

    let asset = asset_symbol.trim().to_uppercase();

    ASSET_NETWORKS
        .get(asset.as_str())
        .and_then(|protocols| protocols.get(&protocol))
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Preferred network for an asset on a protocol, or `None` if unknown
pub fn resolve(protocol_key: &str, asset_symbol: &str) -> Option<Network> {
    lookup(protocol_key, asset_symbol).first().copied()
}

/// Full ordered candidate list (fallback order)
pub fn candidates(protocol_key: &str, asset_symbol: &str) -> Vec<Network> {
    lookup(protocol_key, asset_symbol).to_vec()
}
