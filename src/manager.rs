//! Composition root tying the monitor and cache registry together
//!
//! An explicit root object passed by handle replaces process-global
//! singletons while keeping the one-manager-per-process usage pattern.

use std::sync::Arc;

use crate::cache::{CacheRegistry, PressureCache};
use crate::config::{CacheConfig, MonitorConfig};
use crate::error::Result;
use crate::monitor::MemoryMonitor;

/// Owns one memory monitor and the caches registered against it
pub struct MemoryManager {
    monitor: MemoryMonitor,
    registry: CacheRegistry,
}

impl MemoryManager {
    /// Create a manager with the given monitor configuration
    pub fn new(config: MonitorConfig) -> Result<Self> {
        let monitor = MemoryMonitor::new(config)?;
        let registry = CacheRegistry::new(monitor.clone());

        Ok(Self { monitor, registry })
    }

    /// Start background monitoring
    pub async fn start(&self) -> Result<()> {
        self.monitor.start().await
    }

    /// Stop background monitoring
    pub async fn stop(&self) -> Result<()> {
        self.monitor.stop().await
    }

    /// Fetch or create the named cache, auto-registering its cleanup
    /// subscriber with the monitor unless the config opts out
    pub async fn get_or_create_cache<V>(
        &self,
        name: &str,
        config: CacheConfig,
    ) -> Result<Arc<PressureCache<V>>>
    where
        V: Clone + Send + Sync + 'static,
    {
        self.registry.get_or_create(name, config).await
    }

    /// The underlying monitor handle
    pub fn monitor(&self) -> &MemoryMonitor {
        &self.monitor
    }

    /// The cache registry
    pub fn registry(&self) -> &CacheRegistry {
        &self.registry
    }
}
