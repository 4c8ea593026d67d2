//! Configuration types for caches and the memory monitor
//!
//! All recognized fields are explicit struct members with defaults; both
//! configs validate at construction time rather than accepting arbitrary
//! keys at runtime.

use std::time::Duration;

use crate::error::{Error, Result};

/// Configuration for a single bounded cache
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of cache entries
    pub max_entries: usize,

    /// Maximum memory usage in bytes across all live entries
    pub max_memory_bytes: usize,

    /// TTL applied by `put` when no explicit TTL is given
    pub default_ttl: Option<Duration>,

    /// Aggressive cleanup evicts down to this fraction of the memory budget
    pub aggressive_memory_ratio: f64,

    /// Emergency cleanup evicts down to this fraction of the memory budget
    pub emergency_memory_ratio: f64,

    /// Emergency cleanup evicts down to this fraction of the entry ceiling
    pub emergency_entry_ratio: f64,

    /// Register this cache's cleanup subscriber with the monitor on creation
    pub monitored: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            max_memory_bytes: 64 * 1024 * 1024,
            default_ttl: None,
            aggressive_memory_ratio: 0.7,
            emergency_memory_ratio: 0.3,
            emergency_entry_ratio: 0.4,
            monitored: true,
        }
    }
}

impl CacheConfig {
    /// Create a configuration with custom capacity limits
    pub fn new(max_entries: usize, max_memory_mb: usize) -> Self {
        Self {
            max_entries,
            max_memory_bytes: max_memory_mb * 1024 * 1024,
            ..Default::default()
        }
    }

    /// Set the maximum memory budget in bytes
    pub fn with_max_memory_bytes(mut self, bytes: usize) -> Self {
        self.max_memory_bytes = bytes;
        self
    }

    /// Set the default TTL for entries inserted via `put`
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    /// Set the cleanup eviction targets.
    ///
    /// `aggressive` and `emergency` are fractions of the memory budget;
    /// `emergency_entries` is a fraction of the entry ceiling.
    pub fn with_cleanup_ratios(
        mut self,
        aggressive: f64,
        emergency: f64,
        emergency_entries: f64,
    ) -> Self {
        self.aggressive_memory_ratio = aggressive;
        self.emergency_memory_ratio = emergency;
        self.emergency_entry_ratio = emergency_entries;
        self
    }

    /// Opt this cache out of monitor registration
    pub fn unmonitored(mut self) -> Self {
        self.monitored = false;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_entries == 0 {
            return Err(Error::InvalidConfig(
                "max_entries must be greater than 0".into(),
            ));
        }

        if self.max_memory_bytes == 0 {
            return Err(Error::InvalidConfig(
                "max_memory_bytes must be greater than 0".into(),
            ));
        }

        for (name, ratio) in [
            ("aggressive_memory_ratio", self.aggressive_memory_ratio),
            ("emergency_memory_ratio", self.emergency_memory_ratio),
            ("emergency_entry_ratio", self.emergency_entry_ratio),
        ] {
            if !(0.0..=1.0).contains(&ratio) {
                return Err(Error::InvalidConfig(format!(
                    "{name} must be between 0.0 and 1.0"
                )));
            }
        }

        // Cleanup aggressiveness must be ordered: emergency evicts at least
        // as far as aggressive.
        if self.emergency_memory_ratio > self.aggressive_memory_ratio {
            return Err(Error::InvalidConfig(
                "emergency_memory_ratio must not exceed aggressive_memory_ratio".into(),
            ));
        }

        Ok(())
    }
}

/// Configuration for the memory monitor
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Interval between memory samples
    pub sample_interval: Duration,

    /// Minimum time between two alerts of the same severity
    pub cooldown: Duration,

    /// Retention window for the stats/alert history buffers
    pub history_retention: Duration,

    /// Hard cap on history buffer length regardless of window
    pub max_history: usize,

    /// History length enforced when an emergency fires
    pub emergency_history_cap: usize,

    /// Per-subscriber invocation timeout; `None` disables the bound
    pub callback_timeout: Option<Duration>,

    /// How long `stop` waits for the sampling loop to join
    pub stop_timeout: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            sample_interval: Duration::from_secs(30),
            cooldown: Duration::from_secs(300),
            history_retention: Duration::from_secs(3600),
            max_history: 500,
            emergency_history_cap: 16,
            callback_timeout: Some(Duration::from_secs(5)),
            stop_timeout: Duration::from_secs(5),
        }
    }
}

impl MonitorConfig {
    /// Set the sampling interval
    pub fn with_sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval = interval;
        self
    }

    /// Set the per-severity alert cooldown
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Set the history retention window and hard cap
    pub fn with_history(mut self, retention: Duration, max_entries: usize) -> Self {
        self.history_retention = retention;
        self.max_history = max_entries;
        self
    }

    /// Set or disable the per-subscriber invocation timeout
    pub fn with_callback_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.callback_timeout = timeout;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.sample_interval.is_zero() {
            return Err(Error::InvalidConfig(
                "sample_interval must be greater than zero".into(),
            ));
        }

        if self.max_history == 0 {
            return Err(Error::InvalidConfig(
                "max_history must be greater than 0".into(),
            ));
        }

        if self.emergency_history_cap > self.max_history {
            return Err(Error::InvalidConfig(
                "emergency_history_cap must not exceed max_history".into(),
            ));
        }

        if self.stop_timeout.is_zero() {
            return Err(Error::InvalidConfig(
                "stop_timeout must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}
