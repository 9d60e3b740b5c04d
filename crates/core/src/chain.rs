//! Chain read capability
//!
//! The core never talks to an RPC endpoint directly. Everything it needs from
//! a chain goes through [`ChainReader::read_rate`].

use alloy_primitives::{Address, U256};

use crate::{ChainReadResult, Network};

/// Word order of the `ReserveData` struct a lending pool returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReserveLayout {
    /// configuration, liquidityIndex, variableBorrowIndex, currentLiquidityRate, ...
    V2,
    /// configuration, liquidityIndex, currentLiquidityRate, variableBorrowIndex, ...
    V3,
}

impl ReserveLayout {
    /// Index of the `currentLiquidityRate` word
    pub const fn liquidity_rate_word(self) -> usize {
        match self {
            ReserveLayout::V2 => 3,
            ReserveLayout::V3 => 2,
        }
    }
}

/// Which rate to read from a contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateField {
    /// `getReserveData(asset).currentLiquidityRate` on a lending pool
    ReserveLiquidityRate {
        asset: Address,
        layout: ReserveLayout,
    },
    /// `supplyRatePerBlock()` on a market token
    SupplyRatePerBlock,
}

/// Read-only access to on-chain rates
#[async_trait::async_trait]
pub trait ChainReader: Send + Sync {
    async fn read_rate(
        &self,
        network: Network,
        contract: Address,
        field: RateField,
    ) -> ChainReadResult<U256>;
}
