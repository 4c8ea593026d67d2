//! Memory sampling and the immutable stats snapshot
//!
//! `MemorySampler` wraps `sysinfo` and degrades gracefully: a reading that
//! cannot be taken produces zeroed fields and a log line instead of an
//! error, so the monitor loop is never interrupted by a bad read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sysinfo::{Pid, System};
use tracing::warn;

/// Immutable snapshot of system and process memory at one sampling tick.
///
/// Percentages are on a 0-100 scale. A snapshot is produced once per tick
/// and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryStats {
    /// Total system memory in bytes
    pub total_bytes: u64,

    /// Available system memory in bytes
    pub available_bytes: u64,

    /// Used system memory in bytes
    pub used_bytes: u64,

    /// Used memory as a percentage of total
    pub memory_percent: f64,

    /// Total swap in bytes
    pub swap_total_bytes: u64,

    /// Used swap in bytes
    pub swap_used_bytes: u64,

    /// Used swap as a percentage of total swap
    pub swap_percent: f64,

    /// Resident set size of the current process in bytes
    pub process_rss_bytes: u64,

    /// Process RSS as a percentage of total memory
    pub process_percent: f64,

    /// When the sample was taken
    pub timestamp: DateTime<Utc>,
}

impl MemoryStats {
    /// A fully zeroed snapshot, used when introspection is unavailable
    pub fn zeroed() -> Self {
        Self {
            total_bytes: 0,
            available_bytes: 0,
            used_bytes: 0,
            memory_percent: 0.0,
            swap_total_bytes: 0,
            swap_used_bytes: 0,
            swap_percent: 0.0,
            process_rss_bytes: 0,
            process_percent: 0.0,
            timestamp: Utc::now(),
        }
    }

    /// Build a synthetic snapshot from percentages.
    ///
    /// Used to feed the monitor deterministically in tests and drills;
    /// byte fields are derived from a nominal 16 GiB system.
    pub fn synthetic(memory_percent: f64, swap_percent: f64, process_rss_bytes: u64) -> Self {
        let total: u64 = 16 * 1024 * 1024 * 1024;
        let swap_total: u64 = 4 * 1024 * 1024 * 1024;
        let used = (total as f64 * memory_percent / 100.0) as u64;
        let swap_used = (swap_total as f64 * swap_percent / 100.0) as u64;

        Self {
            total_bytes: total,
            available_bytes: total.saturating_sub(used),
            used_bytes: used,
            memory_percent,
            swap_total_bytes: swap_total,
            swap_used_bytes: swap_used,
            swap_percent,
            process_rss_bytes,
            process_percent: percent_of(process_rss_bytes, total),
            timestamp: Utc::now(),
        }
    }

    /// Process RSS in megabytes
    pub fn process_rss_mb(&self) -> f64 {
        self.process_rss_bytes as f64 / (1024.0 * 1024.0)
    }
}

fn percent_of(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Samples system and process memory via `sysinfo`
pub struct MemorySampler {
    system: System,
    pid: Option<Pid>,
}

impl MemorySampler {
    /// Create a new sampler bound to the current process
    pub fn new() -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                warn!(error = e, "current pid unavailable, process stats will read zero");
                None
            }
        };

        Self {
            system: System::new(),
            pid,
        }
    }

    /// Take a memory snapshot. Never fails; inaccessible readings fall back
    /// to zeroed fields with a warning.
    pub fn sample(&mut self) -> MemoryStats {
        self.system.refresh_memory();

        let total = self.system.total_memory();
        let available = self.system.available_memory();
        let used = self.system.used_memory();
        let swap_total = self.system.total_swap();
        let swap_used = self.system.used_swap();

        let process_rss = match self.pid {
            Some(pid) => {
                self.system.refresh_process(pid);
                match self.system.process(pid) {
                    Some(process) => process.memory(),
                    None => {
                        warn!(%pid, "process not visible to sampler, reporting zero RSS");
                        0
                    }
                }
            }
            None => 0,
        };

        MemoryStats {
            total_bytes: total,
            available_bytes: available,
            used_bytes: used,
            memory_percent: percent_of(used, total),
            swap_total_bytes: swap_total,
            swap_used_bytes: swap_used,
            swap_percent: percent_of(swap_used, swap_total),
            process_rss_bytes: process_rss,
            process_percent: percent_of(process_rss, total),
            timestamp: Utc::now(),
        }
    }
}

impl Default for MemorySampler {
    fn default() -> Self {
        Self::new()
    }
}
