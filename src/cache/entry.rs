//! Cache entries, entry classes, and the derived priority score

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Classes of cached data, weighted by how expensive they are to recreate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryClass {
    /// Rendered templates, costly to rebuild
    Template,
    /// Generated content
    Content,
    /// Downloaded or transformed images
    Image,
    /// Everything else
    General,
}

impl EntryClass {
    /// Fixed weight applied to the priority score
    pub fn weight(&self) -> f64 {
        match self {
            Self::Template => 3.0,
            Self::Image => 2.5,
            Self::Content => 1.5,
            Self::General => 1.0,
        }
    }

    /// Stable lowercase name used in stats snapshots
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Template => "template",
            Self::Content => "content",
            Self::Image => "image",
            Self::General => "general",
        }
    }
}

/// Approximate in-memory footprint of a cached value.
///
/// Cached values report their own size; the cache never guesses via
/// runtime introspection. Implement this for anything stored through
/// `put`, or use `put_sized` with an explicit byte count.
pub trait EstimateSize {
    /// Approximate heap footprint in bytes
    fn estimate_bytes(&self) -> usize;
}

impl EstimateSize for String {
    fn estimate_bytes(&self) -> usize {
        std::mem::size_of::<String>() + self.len()
    }
}

impl EstimateSize for Vec<u8> {
    fn estimate_bytes(&self) -> usize {
        std::mem::size_of::<Vec<u8>>() + self.len()
    }
}

impl EstimateSize for serde_json::Value {
    fn estimate_bytes(&self) -> usize {
        use serde_json::Value;
        match self {
            Value::Null => 8,
            Value::Bool(_) => 9,
            Value::Number(_) => 24,
            Value::String(s) => 24 + s.len(),
            Value::Array(items) => {
                24 + items.iter().map(EstimateSize::estimate_bytes).sum::<usize>()
            }
            Value::Object(map) => {
                24 + map
                    .iter()
                    .map(|(k, v)| 24 + k.len() + v.estimate_bytes())
                    .sum::<usize>()
            }
        }
    }
}

/// A cached value with the metadata eviction decisions need
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The cached data
    pub value: V,

    /// Estimated size in bytes
    pub size_bytes: usize,

    /// Entry class, used for priority weighting
    pub class: EntryClass,

    /// When the entry was created
    pub created_at: Instant,

    /// When the entry was last accessed
    pub last_accessed: Instant,

    /// Total number of accesses including the insert
    pub access_count: u64,

    /// Optional time-to-live measured from creation
    pub ttl: Option<Duration>,
}

impl<V> CacheEntry<V> {
    /// Create a new entry
    pub fn new(value: V, size_bytes: usize, ttl: Option<Duration>, class: EntryClass) -> Self {
        let now = Instant::now();
        Self {
            value,
            size_bytes,
            class,
            created_at: now,
            last_accessed: now,
            access_count: 1,
            ttl,
        }
    }

    /// Record an access
    pub fn touch(&mut self) {
        self.last_accessed = Instant::now();
        self.access_count += 1;
    }

    /// Whether the TTL has elapsed
    pub fn is_expired(&self) -> bool {
        match self.ttl {
            Some(ttl) => self.created_at.elapsed() >= ttl,
            None => false,
        }
    }

    /// Age since creation
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Time since last access
    pub fn idle(&self) -> Duration {
        self.last_accessed.elapsed()
    }

    /// Eviction priority, computed fresh at decision time - never cached.
    ///
    /// Access frequency normalized by age, plus a recency bonus decaying
    /// with idle time, scaled by the class weight. Lower scores are
    /// evicted first.
    pub fn priority_score(&self) -> f64 {
        let age_secs = self.age().as_secs_f64().max(1.0);
        let frequency = self.access_count as f64 / age_secs;

        // Recency bonus halves roughly every five minutes idle
        let recency = (-self.idle().as_secs_f64() / 300.0).exp();

        (frequency + recency) * self.class.weight()
    }
}
