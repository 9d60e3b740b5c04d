//! Error types

use thiserror::Error;

use crate::Network;

/// Core error types
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Unsupported protocol: {0}")]
    UnknownProtocol(String),

    #[error("Unsupported network: {0}")]
    UnknownNetwork(String),

    #[error("RPC URL not found for network {network}. Missing env: {env_key}")]
    ChainNotConfigured { network: Network, env_key: &'static str },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Chain read errors
#[derive(Debug, Error)]
pub enum ChainReadError {
    #[error("Read timed out after {0}ms")]
    Timeout(u64),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network {0} has no RPC client")]
    NotConfigured(Network),
}

/// Protocol fetcher errors
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Fetch failed: {0}")]
    Internal(String),
}

/// Result type alias
pub type CoreResult<T> = Result<T, CoreError>;
pub type ChainReadResult<T> = Result<T, ChainReadError>;
pub type FetchResult<T> = Result<T, FetchError>;
