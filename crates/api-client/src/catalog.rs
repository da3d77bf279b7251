use std::collections::HashMap;

use core_types::StrategyDescriptor;
use tokio::sync::OnceCell;

use crate::{ApiClient, Result};

/// In-memory cache of the remote strategy catalog.
///
/// The catalog is fetched at most once per process; after that every lookup
/// is served from memory. The batch orchestrator only needs it to label
/// outcomes with display names, so an unloaded catalog degrades to code
/// labels rather than forcing a fetch.
#[derive(Debug)]
pub struct StrategyCatalog {
    client: ApiClient,
    cache: OnceCell<HashMap<String, StrategyDescriptor>>,
}

impl StrategyCatalog {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            cache: OnceCell::new(),
        }
    }

    /// Fetches the catalog on first call; later calls return the cached map
    /// without touching the network.
    pub async fn ensure_loaded(&self) -> Result<&HashMap<String, StrategyDescriptor>> {
        self.cache
            .get_or_try_init(|| async { self.client.get_strategies().await })
            .await
    }

    /// Looks up a descriptor without forcing a fetch. `None` when the
    /// catalog has not been loaded yet or the code is unknown.
    pub fn get(&self, code: &str) -> Option<&StrategyDescriptor> {
        self.cache.get().and_then(|m| m.get(code))
    }

    /// All descriptors sorted by code, for display. Empty when not loaded.
    pub fn all(&self) -> Vec<&StrategyDescriptor> {
        let mut all: Vec<_> = self
            .cache
            .get()
            .map(|m| m.values().collect())
            .unwrap_or_default();
        all.sort_by(|a, b| a.code.cmp(&b.code));
        all
    }
}
