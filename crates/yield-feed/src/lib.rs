//! Yield feed - on-chain rate collection and live distribution
//!
//! Features:
//! - JSON-RPC chain reader with per-network client cache
//! - One table-driven fetcher for all lending protocols
//! - Per-protocol failure isolation
//! - Serialized 1s broadcast cycles
//! - Latest-snapshot state for health reporting

pub mod aggregator;
pub mod broadcast;
pub mod fetcher;
pub mod registry;
pub mod rpc;
pub mod state;

pub use aggregator::{YieldAggregator, FETCH_FAILED_MESSAGE};
pub use broadcast::{BroadcastLoop, CycleReport};
pub use fetcher::{MarketFetcher, ProtocolFetcher};
pub use registry::{ProtocolRegistry, RegisteredProtocol};
pub use rpc::RpcChainReader;
pub use state::{SnapshotState, SnapshotStateStats};
