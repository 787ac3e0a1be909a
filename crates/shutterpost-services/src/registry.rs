//! Searcher registry keyed by service name

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::search::RemoteSearcher;

/// Registry of remote searchers.
///
/// Services without a registered searcher run in local-cache-only mode.
/// Reads can proceed concurrently; registration normally happens once at
/// startup.
#[derive(Clone)]
pub struct SearcherRegistry {
    searchers: Arc<RwLock<HashMap<String, Arc<dyn RemoteSearcher>>>>,
}

impl SearcherRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            searchers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a searcher under its service name, replacing any previous one
    pub async fn register(&self, searcher: Arc<dyn RemoteSearcher>) {
        let name = searcher.service().to_string();
        let mut searchers = self.searchers.write().await;
        if searchers.insert(name.clone(), searcher).is_some() {
            tracing::debug!(service = %name, "Replaced registered searcher");
        }
    }

    /// Searcher for `service`, if one is registered
    pub async fn get(&self, service: &str) -> Option<Arc<dyn RemoteSearcher>> {
        self.searchers.read().await.get(service).cloned()
    }

    pub async fn contains(&self, service: &str) -> bool {
        self.searchers.read().await.contains_key(service)
    }

    /// Registered service names, sorted
    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.searchers.read().await.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for SearcherRegistry {
    fn default() -> Self {
        Self::new()
    }
}
