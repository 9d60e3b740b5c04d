//! Deployment address tables
//!
//! Per protocol and network, the contract that rates are read from for each
//! asset. `None` means the asset is not a real market there; it is not a
//! lookup failure.

use alloy_primitives::{address, Address};

use crate::{Network, ProtocolKey, RateField, ReserveLayout};

/// Assets tracked for every protocol, in display order
pub const TRACKED_ASSETS: [&str; 4] = ["USDC", "USDT", "USDE", "CevUSD"];

/// Where rates for one protocol live on one network
#[derive(Debug, Clone, Copy)]
pub enum DeploymentTable {
    /// Aave-style pool, reserves keyed by underlying token
    LendingPool {
        pool: Address,
        layout: ReserveLayout,
        reserves: &'static [(&'static str, Option<Address>)],
    },
    /// Compound-style markets, one token contract per asset
    MarketTokens {
        markets: &'static [(&'static str, Option<Address>)],
    },
}

/// Contract + field to read for one asset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateSource {
    pub contract: Address,
    pub field: RateField,
}

fn find(entries: &[(&'static str, Option<Address>)], asset: &str) -> Option<Address> {
    entries
        .iter()
        .find(|(symbol, _)| symbol.eq_ignore_ascii_case(asset))
        .and_then(|(_, address)| *address)
}

impl DeploymentTable {
    pub fn rate_source(&self, asset: &str) -> Option<RateSource> {
        match self {
            DeploymentTable::LendingPool {
                pool,
                layout,
                reserves,
            } => find(reserves, asset).map(|underlying| RateSource {
                contract: *pool,
                field: RateField::ReserveLiquidityRate {
                    asset: underlying,
                    layout: *layout,
                },
            }),
            DeploymentTable::MarketTokens { markets } => {
                find(markets, asset).map(|market| RateSource {
                    contract: market,
                    field: RateField::SupplyRatePerBlock,
                })
            }
        }
    }
}

// Aave V3
static AAVE_ETHEREUM: DeploymentTable = DeploymentTable::LendingPool {
    pool: address!("87870Bca3F3fD6335C3F4ce8392D69350B4fA4E2"),
    layout: ReserveLayout::V3,
    reserves: &[
        ("USDC", Some(address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"))),
        ("USDT", Some(address!("dAC17F958D2ee523a2206206994597C13D831ec7"))),
        ("USDE", None),
        ("CevUSD", None),
    ],
};

static AAVE_ARBITRUM: DeploymentTable = DeploymentTable::LendingPool {
    pool: address!("794a61358D6845594F94dc1DB02A252b5b4814aD"),
    layout: ReserveLayout::V3,
    reserves: &[
        ("USDC", Some(address!("af88d065e77c8cC2239327C5EDb3A432268e5831"))),
        ("USDT", Some(address!("Fd086bC7CD5C481DCC9C85ebE478A1C0b69FCbb9"))),
        // USDe exists on Arbitrum but is not a standard reserve
        ("USDE", None),
        ("CevUSD", None),
    ],
};

// Spark Lend (Aave V3 fork), Ethereum only
static SPARK_ETHEREUM: DeploymentTable = DeploymentTable::LendingPool {
    pool: address!("C13e21B648A5Ee794902342038FF3aDAB66BE987"),
    layout: ReserveLayout::V3,
    reserves: &[
        ("USDC", Some(address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"))),
        ("USDT", Some(address!("dAC17F958D2ee523a2206206994597C13D831ec7"))),
        ("USDE", None),
        ("CevUSD", None),
    ],
};

// Radiant (Aave V2 fork), Arbitrum only
static RADIANT_ARBITRUM: DeploymentTable = DeploymentTable::LendingPool {
    pool: address!("2032b9A8e9F7e76768CA9271003d3e43E1616B1F"),
    layout: ReserveLayout::V2,
    reserves: &[
        ("USDC", Some(address!("FF970A61A04b1cA14834A43f5dE4533eBDDB5CC8"))), // USDC.e
        ("USDT", Some(address!("Fd086bC7CD5C481DCC9C85ebE478A1C0b69FCbb9"))),
        ("USDE", None),
        ("CevUSD", None),
    ],
};

// Compound V2 cTokens
static COMPOUND_ETHEREUM: DeploymentTable = DeploymentTable::MarketTokens {
    markets: &[
        ("USDC", Some(address!("39AA39c021dfbaE8faC545936693aC917d5E7563"))),
        ("USDT", Some(address!("f650C3d88D12dB855b8bf7D11Be6C55A4e07dCC9"))),
        ("USDE", None),
        ("CevUSD", None),
    ],
};

// Venus vTokens, BNB Chain only
static VENUS_BNB: DeploymentTable = DeploymentTable::MarketTokens {
    markets: &[
        ("USDC", Some(address!("EC5dCb5Dbf4B114C9d0F65BcCAb49EC54F6A0867"))),
        ("USDT", Some(address!("fD5840Cd36d94D7229439859C0112a4185BC0255"))),
        ("USDE", None),
        ("CevUSD", None),
    ],
};

/// Deployment table for a protocol on a network, `None` if not deployed.
///
/// Silo's isolated markets are not mapped, so every Silo asset resolves to
/// "not a market".
pub fn deployment(protocol: ProtocolKey, network: Network) -> Option<&'static DeploymentTable> {
    match (protocol, network) {
        (ProtocolKey::Aave, Network::Ethereum) => Some(&AAVE_ETHEREUM),
        (ProtocolKey::Aave, Network::Arbitrum) => Some(&AAVE_ARBITRUM),
        (ProtocolKey::Spark, Network::Ethereum) => Some(&SPARK_ETHEREUM),
        (ProtocolKey::Radiant, Network::Arbitrum) => Some(&RADIANT_ARBITRUM),
        (ProtocolKey::Compound, Network::Ethereum) => Some(&COMPOUND_ETHEREUM),
        (ProtocolKey::Venus, Network::Bnb) => Some(&VENUS_BNB),
        _ => None,
    }
}

/// Rate source for an asset, `None` when the asset is absent
pub fn rate_source(protocol: ProtocolKey, network: Network, asset: &str) -> Option<RateSource> {
    deployment(protocol, network)?.rate_source(asset)
}

/// Static asset registry of a protocol
pub fn assets(_protocol: ProtocolKey) -> &'static [&'static str] {
    &TRACKED_ASSETS
}
