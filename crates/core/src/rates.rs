//! Rate normalization
//!
//! Converts raw on-chain rates into APY percentages. Raw rates arrive as
//! `U256` and are turned into exact decimals before any division, so values
//! beyond `f64`'s integer range keep their precision.
//!
//! - Liquidity-index markets (Aave-style pools): ray-based, 1e27 = 100%
//! - Per-block markets (Compound-style tokens): 1e18-based rate per block,
//!   compounded over a year of blocks
//!
//! A zero rate is reported as "no data" (`None`), never as 0% APY.

use alloy_primitives::U256;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::{Network, RateField};

/// Fixed-point decimals of a ray (1e27)
pub const RAY_DECIMALS: u32 = 27;

/// Fixed-point decimals of a per-block rate (1e18)
pub const WAD_DECIMALS: u32 = 18;

/// Normalization family of a market
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateFamily {
    LiquidityIndex,
    PerBlock,
}

impl RateField {
    pub fn family(&self) -> RateFamily {
        match self {
            RateField::ReserveLiquidityRate { .. } => RateFamily::LiquidityIndex,
            RateField::SupplyRatePerBlock => RateFamily::PerBlock,
        }
    }
}

/// `raw * 10^-decimals` as `f64`, going through an exact decimal first
fn scaled(raw: U256, decimals: u32) -> Option<f64> {
    if let Ok(mantissa) = i128::try_from(raw) {
        if let Ok(value) = Decimal::try_from_i128_with_scale(mantissa, decimals) {
            return value.normalize().to_f64();
        }
    }

    // Wider than a 96-bit decimal mantissa: parse the full decimal string
    let value: f64 = raw.to_string().parse().ok()?;
    Some(value / 10f64.powi(decimals as i32))
}

/// Ray liquidity rate → APY %
pub fn ray_to_apy(raw: U256) -> Option<f64> {
    if raw.is_zero() {
        return None;
    }

    // raw / 1e27 * 100 == raw / 1e25
    scaled(raw, RAY_DECIMALS - 2).filter(|apy| apy.is_finite() && *apy > 0.0)
}

/// Per-block supply rate → compounded APY %
pub fn block_rate_to_apy(raw: U256, blocks_per_year: Option<u64>) -> Option<f64> {
    let blocks = blocks_per_year.filter(|b| *b > 0)?;
    if raw.is_zero() {
        return None;
    }

    let rate = scaled(raw, WAD_DECIMALS)?;
    if !rate.is_finite() || rate <= 0.0 {
        return None;
    }

    // (1 + r)^n - 1, computed in log space to keep precision for tiny r
    let apy = ((blocks as f64) * rate.ln_1p()).exp_m1() * 100.0;
    (apy.is_finite() && apy > 0.0).then_some(apy)
}

/// Apply the adapter matching the field that was read
pub fn normalize(field: &RateField, raw: U256, network: Network) -> Option<f64> {
    match field.family() {
        RateFamily::LiquidityIndex => ray_to_apy(raw),
        RateFamily::PerBlock => block_rate_to_apy(raw, network.blocks_per_year()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Address;
    use proptest::prelude::*;

    fn pow10(exp: u64) -> U256 {
        U256::from(10u64).pow(U256::from(exp))
    }

    #[test]
    fn test_zero_ray_is_unsupported() {
        assert_eq!(ray_to_apy(U256::ZERO), None);
    }

    #[test]
    fn test_ray_conversion() {
        assert_eq!(ray_to_apy(pow10(27)), Some(100.0));
        assert_eq!(ray_to_apy(U256::from(5u64) * pow10(26)), Some(50.0));
        assert_eq!(ray_to_apy(U256::from(27u64) * pow10(25)), Some(27.0));
    }

    #[test]
    fn test_ray_beyond_decimal_range() {
        // 1e30 ray = 100_000% APY; does not fit a 96-bit mantissa
        let apy = ray_to_apy(pow10(30)).unwrap();
        assert!((apy - 100_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_block_rate_is_unsupported() {
        assert_eq!(block_rate_to_apy(U256::ZERO, Some(2_102_400)), None);
    }

    #[test]
    fn test_missing_blocks_per_year_is_unsupported() {
        assert_eq!(block_rate_to_apy(pow10(9), None), None);
        assert_eq!(block_rate_to_apy(pow10(9), Some(0)), None);
    }

    #[test]
    fn test_block_rate_compounding_exact() {
        // r = 0.5, n = 2 → (1.5^2 - 1) * 100 = 125
        let raw = U256::from(5u64) * pow10(17);
        let apy = block_rate_to_apy(raw, Some(2)).unwrap();
        assert!((apy - 125.0).abs() < 1e-9);
    }

    #[test]
    fn test_block_rate_matches_reference() {
        // ~9.5e-9 per block on Ethereum
        let raw = U256::from(9_512_937_595u64);
        let blocks = 2_102_400u64;

        let r = 9_512_937_595f64 / 1e18;
        let reference = ((1.0 + r).powf(blocks as f64) - 1.0) * 100.0;

        let apy = block_rate_to_apy(raw, Some(blocks)).unwrap();
        assert!(((apy - reference) / reference).abs() < 1e-6, "{apy} vs {reference}");
        assert!(apy > 2.0 && apy < 2.1);
    }

    #[test]
    fn test_normalize_dispatches_on_field() {
        let ray = U256::from(27u64) * pow10(25);
        let pool_field = RateField::ReserveLiquidityRate {
            asset: Address::ZERO,
            layout: crate::ReserveLayout::V2,
        };
        assert_eq!(normalize(&pool_field, ray, Network::Arbitrum), Some(27.0));

        // Arbitrum has no block schedule → per-block rates are unsupported there
        let raw = U256::from(9_512_937_595u64);
        assert_eq!(normalize(&RateField::SupplyRatePerBlock, raw, Network::Arbitrum), None);
        assert!(normalize(&RateField::SupplyRatePerBlock, raw, Network::Bnb).is_some());
    }

    proptest! {
        #[test]
        fn prop_ray_apy_is_raw_over_1e25(raw in 1u128..10u128.pow(29)) {
            let apy = ray_to_apy(U256::from(raw)).unwrap();
            let expected = raw as f64 / 1e25;
            prop_assert!(((apy - expected) / expected).abs() < 1e-12);
        }
    }
}
