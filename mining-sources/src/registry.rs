//! One shared adapter instance per provider

use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;

use crate::adapter::SourceAdapter;
use crate::bitinfocharts::BitInfoChartsScraper;
use crate::blockchain_info::BlockchainInfoClient;
use crate::blockchair::BlockchairClient;
use crate::kind::SourceKind;
use crate::mempool_space::MempoolSpaceClient;
use crate::static_source::StaticSource;

/// Maps each [`SourceKind`] to a ready adapter.
///
/// Chains for different coins share these instances, so every coin served
/// by Blockchair goes through the same client and host pacer.
#[derive(Clone)]
pub struct SourceRegistry {
    adapters: HashMap<SourceKind, Arc<dyn SourceAdapter>>,
}

impl SourceRegistry {
    /// Registry with the production endpoints
    pub fn new(http: Client, static_source: StaticSource) -> Self {
        let mut adapters: HashMap<SourceKind, Arc<dyn SourceAdapter>> = HashMap::new();
        adapters.insert(
            SourceKind::BlockchainInfo,
            Arc::new(BlockchainInfoClient::new(http.clone())),
        );
        adapters.insert(
            SourceKind::MempoolSpace,
            Arc::new(MempoolSpaceClient::new(http.clone())),
        );
        adapters.insert(SourceKind::Blockchair, Arc::new(BlockchairClient::new(http.clone())));
        adapters.insert(SourceKind::BitInfoCharts, Arc::new(BitInfoChartsScraper::new(http)));
        adapters.insert(SourceKind::Static, Arc::new(static_source));
        Self { adapters }
    }

    /// Registry with no adapters registered
    pub fn empty() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    /// Register or replace the adapter for a kind
    pub fn with_adapter(mut self, kind: SourceKind, adapter: Arc<dyn SourceAdapter>) -> Self {
        self.adapters.insert(kind, adapter);
        self
    }

    pub fn get(&self, kind: SourceKind) -> Option<Arc<dyn SourceAdapter>> {
        self.adapters.get(&kind).cloned()
    }

    /// Adapters for a chain, in order, skipping kinds that are not registered
    pub fn chain(&self, kinds: &[SourceKind]) -> Vec<Arc<dyn SourceAdapter>> {
        kinds.iter().filter_map(|k| self.get(*k)).collect()
    }
}
