//! JSON-RPC backed chain reader
//!
//! One HTTP client per network, created on first use and reused for the
//! process lifetime. All calls are read-only `eth_call`s with a hard timeout.

use std::collections::HashMap;
use std::time::Duration;

use alloy_primitives::{hex, Address, Bytes, U256};
use alloy_sol_types::{sol, SolCall};
use dashmap::DashMap;
use serde::Deserialize;
use tracing::debug;

use yield_core::{
    AppConfig, ChainReadError, ChainReadResult, ChainReader, CoreResult, Network, RateField,
};

sol! {
    /// Aave-style lending pool
    interface ILendingPool {
        function getReserveData(address asset) external view;
    }

    /// Compound-style market token
    interface IMarketToken {
        function supplyRatePerBlock() external view returns (uint256);
    }
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<String>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// Cached per-network client
#[derive(Debug, Clone)]
struct RpcClient {
    http: reqwest::Client,
    url: String,
}

/// Chain reader over plain JSON-RPC endpoints
pub struct RpcChainReader {
    urls: HashMap<Network, String>,
    clients: DashMap<Network, RpcClient>,
    timeout: Duration,
}

impl RpcChainReader {
    pub fn new(urls: HashMap<Network, String>, timeout: Duration) -> Self {
        Self {
            urls,
            clients: DashMap::new(),
            timeout,
        }
    }

    /// Build from config, failing if any required network lacks an RPC URL
    pub fn from_config(config: &AppConfig, required: &[Network]) -> CoreResult<Self> {
        config.require_rpc_urls(required)?;

        let urls = Network::ALL
            .into_iter()
            .filter_map(|n| config.rpc_url(n).map(|url| (n, url.to_string())))
            .collect();

        Ok(Self::new(urls, config.rpc_timeout()))
    }

    pub fn configured_networks(&self) -> Vec<Network> {
        let mut networks: Vec<Network> = self.urls.keys().copied().collect();
        networks.sort();
        networks
    }

    fn client(&self, network: Network) -> ChainReadResult<RpcClient> {
        if let Some(client) = self.clients.get(&network) {
            return Ok(client.value().clone());
        }

        let url = self
            .urls
            .get(&network)
            .ok_or(ChainReadError::NotConfigured(network))?;

        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| ChainReadError::Transport(e.to_string()))?;

        let client = RpcClient {
            http,
            url: url.clone(),
        };

        debug!(network = %network, "Created RPC client");
        Ok(self.clients.entry(network).or_insert(client).value().clone())
    }

    /// Read-only contract call at the latest block
    async fn eth_call(&self, network: Network, to: Address, data: Vec<u8>) -> ChainReadResult<Bytes> {
        let client = self.client(network)?;

        let request_body = serde_json::json!({
            "jsonrpc": "2.0",
            "method": "eth_call",
            "params": [
                {
                    "to": to.to_string(),
                    "data": hex::encode_prefixed(&data),
                },
                "latest"
            ],
            "id": 1
        });

        let call = async {
            let response = client
                .http
                .post(&client.url)
                .json(&request_body)
                .send()
                .await
                .map_err(|e| ChainReadError::Transport(e.to_string()))?;

            response
                .json::<RpcResponse>()
                .await
                .map_err(|e| ChainReadError::InvalidResponse(e.to_string()))
        };

        let response = tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| ChainReadError::Timeout(self.timeout.as_millis() as u64))??;

        if let Some(error) = response.error {
            return Err(ChainReadError::Rpc(format!("{} (code {})", error.message, error.code)));
        }

        let result = response
            .result
            .ok_or_else(|| ChainReadError::InvalidResponse("missing result".into()))?;

        let bytes = hex::decode(result.trim_start_matches("0x"))
            .map_err(|e| ChainReadError::InvalidResponse(e.to_string()))?;

        Ok(bytes.into())
    }
}

/// Calldata for reading `field`
pub fn encode_rate_call(field: &RateField) -> Vec<u8> {
    match field {
        RateField::ReserveLiquidityRate { asset, .. } => {
            ILendingPool::getReserveDataCall { asset: *asset }.abi_encode()
        }
        RateField::SupplyRatePerBlock => IMarketToken::supplyRatePerBlockCall {}.abi_encode(),
    }
}

/// Extract the rate word for `field` from raw return data
pub fn decode_rate(field: &RateField, data: &[u8]) -> ChainReadResult<U256> {
    let index = match field {
        RateField::ReserveLiquidityRate { layout, .. } => layout.liquidity_rate_word(),
        RateField::SupplyRatePerBlock => 0,
    };

    let start = index * 32;
    let word = data.get(start..start + 32).ok_or_else(|| {
        ChainReadError::InvalidResponse(format!(
            "return data too short: {} bytes, need {}",
            data.len(),
            start + 32
        ))
    })?;

    Ok(U256::from_be_slice(word))
}

#[async_trait::async_trait]
impl ChainReader for RpcChainReader {
    async fn read_rate(
        &self,
        network: Network,
        contract: Address,
        field: RateField,
    ) -> ChainReadResult<U256> {
        let data = self.eth_call(network, contract, encode_rate_call(&field)).await?;
        decode_rate(&field, &data)
    }
}
