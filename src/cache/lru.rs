//! Bounded, pressure-aware LRU cache
//!
//! Enforces both an entry-count ceiling and a memory-byte ceiling. With a
//! single entry class live, eviction is strict recency; with mixed
//! classes it falls back to the lowest priority score, computed fresh at
//! eviction time. TTLs are honored lazily on access and by sweep.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::time::Duration;

use anyhow::Result as AnyResult;
use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::entry::{CacheEntry, EntryClass, EstimateSize};
use crate::config::CacheConfig;
use crate::error::Result;
use crate::pressure::CleanupLevel;
use crate::stats::MemoryStats;
use crate::subscriber::CleanupSubscriber;

/// Operation counters, read-consistent under the cache lock
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Number of cache hits
    pub hits: u64,

    /// Number of cache misses, including expired reads
    pub misses: u64,

    /// Entries evicted to satisfy capacity or cleanup targets
    pub evictions: u64,

    /// Entries removed because their TTL elapsed
    pub expirations: u64,

    /// Admissions rejected because the item alone exceeded the budget
    pub rejected: u64,
}

impl CacheStats {
    /// Hit rate over all lookups
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// One consistent view of a cache's state
#[derive(Debug, Clone, Serialize)]
pub struct CacheSnapshot {
    /// Cache name
    pub name: String,

    /// Live entry count
    pub entries: usize,

    /// Tracked memory usage in bytes
    pub memory_bytes: usize,

    /// Configured entry ceiling
    pub max_entries: usize,

    /// Configured memory budget in bytes
    pub max_memory_bytes: usize,

    /// Hit rate over all lookups
    pub hit_rate: f64,

    /// Raw counters
    pub stats: CacheStats,

    /// Live entry count per class name
    pub class_distribution: BTreeMap<String, usize>,
}

struct CacheInner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    access_order: VecDeque<String>,
    current_bytes: usize,
    stats: CacheStats,
}

impl<V> CacheInner<V> {
    fn remove_entry(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let entry = self.entries.remove(key)?;
        self.current_bytes -= entry.size_bytes;
        if let Some(pos) = self.access_order.iter().position(|k| k == key) {
            self.access_order.remove(pos);
        }
        Some(entry)
    }

    fn mark_recent(&mut self, key: &str) {
        if let Some(pos) = self.access_order.iter().position(|k| k == key) {
            self.access_order.remove(pos);
        }
        self.access_order.push_back(key.to_string());
    }

    fn single_class(&self) -> bool {
        let mut classes = self.entries.values().map(|e| e.class);
        match classes.next() {
            Some(first) => classes.all(|c| c == first),
            None => true,
        }
    }

    fn choose_victim(&self) -> Option<String> {
        if self.entries.is_empty() {
            return None;
        }

        if self.single_class() {
            // Classic LRU: the front of the order queue is coldest
            self.access_order.front().cloned()
        } else {
            self.entries
                .iter()
                .min_by(|(_, a), (_, b)| {
                    a.priority_score()
                        .partial_cmp(&b.priority_score())
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .map(|(key, _)| key.clone())
        }
    }

    fn evict_to(&mut self, max_entries: usize, max_bytes: usize) -> u64 {
        let mut evicted = 0;
        while self.entries.len() > max_entries || self.current_bytes > max_bytes {
            match self.choose_victim() {
                Some(key) => {
                    self.remove_entry(&key);
                    self.stats.evictions += 1;
                    evicted += 1;
                }
                None => break,
            }
        }
        evicted
    }

    fn sweep_expired(&mut self) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.remove_entry(key);
            self.stats.expirations += 1;
        }

        expired.len()
    }
}

/// Bounded cache keyed by string, evicting by recency or priority
pub struct PressureCache<V> {
    name: String,
    config: CacheConfig,
    inner: RwLock<CacheInner<V>>,
}

impl<V> PressureCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create a cache with the given configuration
    pub fn new(name: impl Into<String>, config: CacheConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            name: name.into(),
            config,
            inner: RwLock::new(CacheInner {
                entries: HashMap::new(),
                access_order: VecDeque::new(),
                current_bytes: 0,
                stats: CacheStats::default(),
            }),
        })
    }

    /// Look up a value, updating recency and frequency on a hit.
    ///
    /// An entry whose TTL has elapsed is removed and counted as both a
    /// miss and an expiry.
    pub async fn get(&self, key: &str) -> Option<V> {
        enum Lookup<V> {
            Miss,
            Expired,
            Hit(V),
        }

        let mut inner = self.inner.write().await;

        let outcome = match inner.entries.get_mut(key) {
            None => Lookup::Miss,
            Some(entry) if entry.is_expired() => Lookup::Expired,
            Some(entry) => {
                entry.touch();
                Lookup::Hit(entry.value.clone())
            }
        };

        match outcome {
            Lookup::Miss => {
                inner.stats.misses += 1;
                None
            }
            Lookup::Expired => {
                inner.remove_entry(key);
                inner.stats.misses += 1;
                inner.stats.expirations += 1;
                None
            }
            Lookup::Hit(value) => {
                inner.mark_recent(key);
                inner.stats.hits += 1;
                Some(value)
            }
        }
    }

    /// Look up a value without touching recency or counters
    pub async fn peek(&self, key: &str) -> Option<V> {
        let inner = self.inner.read().await;
        inner
            .entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value.clone())
    }

    /// Insert with the configured default TTL and the General class
    pub async fn put(&self, key: impl Into<String>, value: V) -> bool
    where
        V: EstimateSize,
    {
        let size = value.estimate_bytes();
        self.put_sized(key, value, size, self.config.default_ttl, EntryClass::General)
            .await
    }

    /// Insert with an explicit TTL and class
    pub async fn put_with(
        &self,
        key: impl Into<String>,
        value: V,
        ttl: Option<Duration>,
        class: EntryClass,
    ) -> bool
    where
        V: EstimateSize,
    {
        let size = value.estimate_bytes();
        self.put_sized(key, value, size, ttl, class).await
    }

    /// Insert with a caller-supplied size estimate.
    ///
    /// Returns `false` without storing when the item alone exceeds the
    /// memory budget; otherwise inserts and enforces both ceilings.
    pub async fn put_sized(
        &self,
        key: impl Into<String>,
        value: V,
        size_bytes: usize,
        ttl: Option<Duration>,
        class: EntryClass,
    ) -> bool {
        let key = key.into();
        let mut inner = self.inner.write().await;

        if size_bytes > self.config.max_memory_bytes {
            inner.stats.rejected += 1;
            debug!(
                cache = %self.name,
                %key,
                size_bytes,
                budget = self.config.max_memory_bytes,
                "admission rejected, item exceeds cache memory budget"
            );
            return false;
        }

        inner.remove_entry(&key);

        let entry = CacheEntry::new(value, size_bytes, ttl, class);
        inner.current_bytes += entry.size_bytes;
        inner.entries.insert(key.clone(), entry);
        inner.access_order.push_back(key);

        inner.evict_to(self.config.max_entries, self.config.max_memory_bytes);
        true
    }

    /// Remove a key; absent keys are a no-op returning `None`
    pub async fn remove(&self, key: &str) -> Option<V> {
        let mut inner = self.inner.write().await;
        inner.remove_entry(key).map(|entry| entry.value)
    }

    /// Drop every entry and reset usage tracking
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        inner.entries.clear();
        inner.access_order.clear();
        inner.current_bytes = 0;
        info!(cache = %self.name, "cache cleared");
    }

    /// Whether a live (non-expired) entry exists for the key
    pub async fn contains_key(&self, key: &str) -> bool {
        let inner = self.inner.read().await;
        inner
            .entries
            .get(key)
            .map(|entry| !entry.is_expired())
            .unwrap_or(false)
    }

    /// Current number of entries
    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    /// Whether the cache holds no entries
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Tracked memory usage in bytes
    pub async fn memory_usage_bytes(&self) -> usize {
        self.inner.read().await.current_bytes
    }

    /// Remove all expired entries, returning how many were swept
    pub async fn sweep_expired(&self) -> usize {
        let mut inner = self.inner.write().await;
        inner.sweep_expired()
    }

    /// Shed data proportional to the cleanup level, returning the number
    /// of entries evicted (expiries not included).
    pub async fn cleanup(&self, level: CleanupLevel) -> u64 {
        let mut inner = self.inner.write().await;

        let swept = inner.sweep_expired();

        let evicted = match level {
            CleanupLevel::Light => 0,
            CleanupLevel::Aggressive => {
                let target_bytes = (self.config.max_memory_bytes as f64
                    * self.config.aggressive_memory_ratio) as usize;
                inner.evict_to(self.config.max_entries, target_bytes)
            }
            CleanupLevel::Emergency => {
                let target_bytes = (self.config.max_memory_bytes as f64
                    * self.config.emergency_memory_ratio) as usize;
                let target_entries = (self.config.max_entries as f64
                    * self.config.emergency_entry_ratio) as usize;
                inner.evict_to(target_entries, target_bytes)
            }
        };

        if swept > 0 || evicted > 0 {
            info!(
                cache = %self.name,
                %level,
                swept,
                evicted,
                remaining_bytes = inner.current_bytes,
                "cache cleanup"
            );
        }

        evicted
    }

    /// Current counters
    pub async fn stats(&self) -> CacheStats {
        self.inner.read().await.stats.clone()
    }

    /// One consistent snapshot of entries, usage, and distribution
    pub async fn snapshot(&self) -> CacheSnapshot {
        let inner = self.inner.read().await;

        let mut class_distribution: BTreeMap<String, usize> = BTreeMap::new();
        for entry in inner.entries.values() {
            *class_distribution
                .entry(entry.class.as_str().to_string())
                .or_insert(0) += 1;
        }

        CacheSnapshot {
            name: self.name.clone(),
            entries: inner.entries.len(),
            memory_bytes: inner.current_bytes,
            max_entries: self.config.max_entries,
            max_memory_bytes: self.config.max_memory_bytes,
            hit_rate: inner.stats.hit_rate(),
            stats: inner.stats.clone(),
            class_distribution,
        }
    }

    /// Cache name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cache configuration
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }
}

#[async_trait]
impl<V> CleanupSubscriber for PressureCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn on_cleanup(&self, level: CleanupLevel, _stats: &MemoryStats) -> AnyResult<()> {
        self.cleanup(level).await;
        Ok(())
    }
}
