//! Static protocol registry

use std::sync::Arc;

use yield_core::{ChainReader, ProtocolInfo, ProtocolKey};

use crate::fetcher::{MarketFetcher, ProtocolFetcher};

/// A protocol's metadata paired with its fetcher
#[derive(Clone)]
pub struct RegisteredProtocol {
    pub info: ProtocolInfo,
    pub fetcher: Arc<dyn ProtocolFetcher>,
}

/// Protocols in display order
#[derive(Clone, Default)]
pub struct ProtocolRegistry {
    entries: Vec<RegisteredProtocol>,
}

impl ProtocolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// All six protocols, reading through `reader`
    pub fn with_defaults(reader: Arc<dyn ChainReader>) -> Self {
        let mut registry = Self::new();
        for key in ProtocolKey::ALL {
            registry.register(Arc::new(MarketFetcher::new(key, Arc::clone(&reader))));
        }
        registry
    }

    /// Add a fetcher, replacing any existing one for the same protocol in place
    pub fn register(&mut self, fetcher: Arc<dyn ProtocolFetcher>) {
        let key = fetcher.protocol();
        let entry = RegisteredProtocol {
            info: ProtocolInfo::for_protocol(key),
            fetcher,
        };

        match self.entries.iter_mut().find(|e| e.info.key == key) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn get(&self, key: ProtocolKey) -> Option<&RegisteredProtocol> {
        self.entries.iter().find(|e| e.info.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredProtocol> {
        self.entries.iter()
    }

    pub fn infos(&self) -> Vec<ProtocolInfo> {
        self.entries.iter().map(|e| e.info.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
