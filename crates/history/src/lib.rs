//! Consumer side of the yield stream
//!
//! - Rolling per-(protocol, asset) APY history, bounded to the latest points
//! - WebSocket watcher with message validation and reconnection

pub mod client;
pub mod store;

pub use client::{parse_message, MessageError, YieldWatcher};
pub use store::{format_apy, format_time, HistoryPoint, RollingHistory, DEFAULT_HISTORY_LEN};
