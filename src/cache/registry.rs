//! Named singleton caches with monitor auto-registration

use std::any::Any;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::info;

use super::lru::PressureCache;
use crate::config::CacheConfig;
use crate::error::{Error, Result};
use crate::monitor::MemoryMonitor;

/// Name-keyed registry of caches, one instance per name.
///
/// Caches created here register their cleanup subscriber with the
/// monitor unless the config opts out.
pub struct CacheRegistry {
    caches: DashMap<String, Arc<dyn Any + Send + Sync>>,
    monitor: MemoryMonitor,
}

impl CacheRegistry {
    /// Create a registry wired to the given monitor
    pub fn new(monitor: MemoryMonitor) -> Self {
        Self {
            caches: DashMap::new(),
            monitor,
        }
    }

    /// Return the cache registered under `name`, creating it on first use.
    ///
    /// Idempotent per name; the config only applies on creation. Asking
    /// for an existing name with a different value type is an error.
    pub async fn get_or_create<V>(
        &self,
        name: &str,
        config: CacheConfig,
    ) -> Result<Arc<PressureCache<V>>>
    where
        V: Clone + Send + Sync + 'static,
    {
        if let Some(existing) = self.caches.get(name) {
            return Self::downcast(name, existing.value().clone());
        }

        let monitored = config.monitored;
        let cache = Arc::new(PressureCache::new(name, config)?);

        match self.caches.entry(name.to_string()) {
            Entry::Occupied(slot) => {
                // Another task created it first; use the winner
                let existing = slot.get().clone();
                return Self::downcast(name, existing);
            }
            Entry::Vacant(slot) => {
                slot.insert(cache.clone() as Arc<dyn Any + Send + Sync>);
            }
        }

        if monitored {
            self.monitor.add_cleanup_subscriber(cache.clone()).await;
        }
        info!(cache = name, monitored, "cache registered");

        Ok(cache)
    }

    /// Whether a cache is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.caches.contains_key(name)
    }

    /// Number of registered caches
    pub fn len(&self) -> usize {
        self.caches.len()
    }

    /// Whether no caches are registered
    pub fn is_empty(&self) -> bool {
        self.caches.is_empty()
    }

    /// Names of all registered caches
    pub fn names(&self) -> Vec<String> {
        self.caches.iter().map(|e| e.key().clone()).collect()
    }

    fn downcast<V>(name: &str, cache: Arc<dyn Any + Send + Sync>) -> Result<Arc<PressureCache<V>>>
    where
        V: Clone + Send + Sync + 'static,
    {
        cache
            .downcast::<PressureCache<V>>()
            .map_err(|_| Error::CacheTypeMismatch {
                name: name.to_string(),
            })
    }
}
