//! Core types and utilities for the yield aggregation engine
//!
//! This crate provides shared pieces used across all components:
//! - Network, protocol and yield record definitions
//! - Asset → network resolution
//! - Deployment address tables
//! - Rate normalization (ray and per-block families)
//! - The chain read capability and configuration

pub mod types;
pub mod chain;
pub mod resolver;
pub mod rates;
pub mod deployments;
pub mod protocols;
pub mod settings;
pub mod errors;

pub use types::*;
pub use chain::*;
pub use rates::{block_rate_to_apy, normalize, ray_to_apy, RateFamily};
pub use deployments::{RateSource, DeploymentTable, TRACKED_ASSETS};
pub use protocols::*;
pub use settings::*;
pub use errors::*;
