//! # memsentry
//!
//! A memory-pressure-adaptive caching and alerting engine. A background
//! monitor samples process and system memory, classifies pressure into
//! escalating severity levels, and reacts two ways: fan-out to registered
//! cleanup subscribers (bounded caches shed data proportional to the
//! severity) and deduplicated, cooldown-gated alert notifications.
//!
//! ## Core Features
//!
//! - **Bounded Caches**: entry-count and memory-byte ceilings enforced on
//!   every insert, with admission rejection for oversized items
//! - **Priority-aware Eviction**: strict LRU for homogeneous entries,
//!   class/frequency-weighted priority when entry classes are mixed
//! - **Severity Ladder**: Info/Warning/Critical/Emergency thresholds over
//!   memory, swap, and process RSS, evaluated highest-first
//! - **Alert Lifecycle**: one active alert per severity, cooldown-gated,
//!   acknowledged and cleared explicitly
//! - **Subscriber Isolation**: cleanup and alert fan-out with per-subscriber
//!   failure isolation and bounded invocation time
//!
//! ## Quick Start
//!
//! ```no_run
//! use memsentry::{CacheConfig, MemoryManager, MonitorConfig};
//!
//! # async fn example() -> memsentry::Result<()> {
//! let manager = MemoryManager::new(MonitorConfig::default())?;
//! manager.start().await?;
//!
//! let cache = manager
//!     .get_or_create_cache::<String>("templates", CacheConfig::new(10_000, 64))
//!     .await?;
//!
//! cache.put("greeting", "hello".to_string()).await;
//! assert_eq!(cache.get("greeting").await, Some("hello".to_string()));
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! - [`alert`] - Alert types, records, and the active-alert lifecycle
//! - [`cache`] - Bounded caches, entry priority model, and the registry
//! - [`config`] - Validated configuration structs
//! - [`manager`] - Composition root owning the monitor and registry
//! - [`monitor`] - Background sampling loop and threshold evaluation
//! - [`pressure`] - Severity levels and the threshold ladder
//! - [`stats`] - Memory sampling and the immutable stats snapshot
//! - [`subscriber`] - Subscriber contracts and bundled alert sinks

/// Alert types, records, and the active-alert lifecycle
pub mod alert;
/// Bounded caches, entry priority model, and the registry
pub mod cache;
/// Validated configuration structs
pub mod config;
/// Error types and handling utilities
pub mod error;
/// Composition root owning the monitor and registry
pub mod manager;
/// Background sampling loop and threshold evaluation
pub mod monitor;
/// Severity levels and the threshold ladder
pub mod pressure;
/// Memory sampling and the immutable stats snapshot
pub mod stats;
/// Subscriber contracts and bundled alert sinks
pub mod subscriber;

pub use alert::{AlertRecord, MemoryAlert};
pub use cache::{
    CacheEntry, CacheRegistry, CacheSnapshot, CacheStats, EntryClass, EstimateSize, PressureCache,
};
pub use config::{CacheConfig, MonitorConfig};
pub use error::{Error, Result};
pub use manager::MemoryManager;
pub use monitor::{MemoryMonitor, MonitorReport};
pub use pressure::{default_ladder, CleanupLevel, MemoryThreshold, PressureLevel, ThresholdLadder};
pub use stats::{MemorySampler, MemoryStats};
pub use subscriber::{AlertSubscriber, CleanupSubscriber, JsonlAlertSink, LogAlertSink};
