//! Protocol fetchers
//!
//! Every protocol is served by the same pipeline: resolve the asset's
//! network, look up its rate source, read the raw rate and normalize it.
//! Which adapter applies is decided by the deployment table, not by code
//! per protocol.

use std::sync::Arc;

use futures::future::join_all;
use tracing::debug;

use yield_core::{
    deployments, normalize, resolver, ChainReader, FetchResult, ProtocolKey, YieldRecord,
};

/// Produces one yield record per tracked asset of a protocol
#[async_trait::async_trait]
pub trait ProtocolFetcher: Send + Sync {
    fn protocol(&self) -> ProtocolKey;

    /// Records in registry asset order. Per-asset failures become
    /// unsupported records; an `Err` means the whole protocol failed.
    async fn fetch_yields(&self) -> FetchResult<Vec<YieldRecord>>;
}

/// Table-driven fetcher over a shared chain reader
pub struct MarketFetcher {
    protocol: ProtocolKey,
    reader: Arc<dyn ChainReader>,
}

impl MarketFetcher {
    pub fn new(protocol: ProtocolKey, reader: Arc<dyn ChainReader>) -> Self {
        Self { protocol, reader }
    }

    async fn fetch_asset(&self, asset: &str) -> YieldRecord {
        let Some(network) = resolver::resolve(self.protocol.key(), asset) else {
            return YieldRecord::unsupported(asset, None);
        };

        let Some(source) = deployments::rate_source(self.protocol, network, asset) else {
            return YieldRecord::unsupported(asset, Some(network));
        };

        match self
            .reader
            .read_rate(network, source.contract, source.field)
            .await
        {
            Ok(raw) => match normalize(&source.field, raw, network) {
                Some(apy) => YieldRecord::supported(asset, apy, network),
                None => YieldRecord::unsupported(asset, Some(network)),
            },
            Err(e) => {
                debug!(
                    protocol = %self.protocol,
                    asset,
                    network = %network,
                    error = %e,
                    "Rate read failed"
                );
                YieldRecord::unsupported(asset, Some(network))
            }
        }
    }
}

#[async_trait::async_trait]
impl ProtocolFetcher for MarketFetcher {
    fn protocol(&self) -> ProtocolKey {
        self.protocol
    }

    async fn fetch_yields(&self) -> FetchResult<Vec<YieldRecord>> {
        let assets = deployments::assets(self.protocol);
        let records = join_all(assets.iter().map(|asset| self.fetch_asset(asset))).await;
        Ok(records)
    }
}
