//! Pressure severity levels and the threshold ladder
//!
//! The ladder holds one threshold per severity, kept sorted ascending by
//! memory percentage so evaluation can scan from the top rung down and
//! short-circuit on the first match.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::stats::MemoryStats;

/// Escalating memory pressure severities
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PressureLevel {
    Info,
    Warning,
    Critical,
    Emergency,
}

impl PressureLevel {
    /// Cleanup cascade fired when this level triggers, in invocation order.
    ///
    /// Escalation is explicit: each severity re-runs the lower levels'
    /// cleanup before adding its own.
    pub fn cascade(&self) -> &'static [CleanupLevel] {
        match self {
            Self::Info => &[],
            Self::Warning => &[CleanupLevel::Light],
            Self::Critical => &[CleanupLevel::Light, CleanupLevel::Aggressive],
            Self::Emergency => &[
                CleanupLevel::Light,
                CleanupLevel::Aggressive,
                CleanupLevel::Emergency,
            ],
        }
    }

    /// Stable lowercase name, also used as the record field value
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Critical => "critical",
            Self::Emergency => "emergency",
        }
    }
}

impl fmt::Display for PressureLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggressiveness of a cleanup invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupLevel {
    /// Expired-entry sweep only
    Light,
    /// Sweep plus eviction to the aggressive memory target
    Aggressive,
    /// Deepest eviction, plus trimming of the monitor's own buffers
    Emergency,
}

impl fmt::Display for CleanupLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Light => "light",
            Self::Aggressive => "aggressive",
            Self::Emergency => "emergency",
        };
        f.write_str(name)
    }
}

/// One rung of the severity ladder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryThreshold {
    /// Severity fired when this rung matches
    pub level: PressureLevel,

    /// Fires when used memory reaches this percentage
    pub memory_percent: f64,

    /// Fires when used swap reaches this percentage
    pub swap_percent: f64,

    /// When set, the rung only matches if process RSS is at least this many MB
    pub min_process_mb: Option<f64>,

    /// Human description carried into alerts
    pub description: String,
}

impl MemoryThreshold {
    /// Create a threshold for the given level and triggers
    pub fn new(
        level: PressureLevel,
        memory_percent: f64,
        swap_percent: f64,
        description: impl Into<String>,
    ) -> Self {
        Self {
            level,
            memory_percent,
            swap_percent,
            min_process_mb: None,
            description: description.into(),
        }
    }

    /// Require a minimum process RSS for the rung to match
    pub fn with_min_process_mb(mut self, mb: f64) -> Self {
        self.min_process_mb = Some(mb);
        self
    }

    /// Whether the snapshot trips this rung.
    ///
    /// Memory and swap triggers are OR'd; the process floor, when present,
    /// is AND'd on top.
    pub fn matches(&self, stats: &MemoryStats) -> bool {
        let triggered =
            stats.memory_percent >= self.memory_percent || stats.swap_percent >= self.swap_percent;

        if !triggered {
            return false;
        }

        match self.min_process_mb {
            Some(floor) => stats.process_rss_mb() >= floor,
            None => true,
        }
    }
}

/// The default severity ladder installed by a fresh monitor
pub fn default_ladder() -> Vec<MemoryThreshold> {
    vec![
        MemoryThreshold::new(
            PressureLevel::Info,
            60.0,
            50.0,
            "memory usage elevated, no action needed",
        ),
        MemoryThreshold::new(
            PressureLevel::Warning,
            75.0,
            60.0,
            "memory usage high, light cleanup recommended",
        ),
        MemoryThreshold::new(
            PressureLevel::Critical,
            85.0,
            75.0,
            "memory usage critical, aggressive cleanup required",
        ),
        MemoryThreshold::new(
            PressureLevel::Emergency,
            95.0,
            90.0,
            "memory exhaustion imminent, shedding all non-essential data",
        ),
    ]
}

/// Ordered set of thresholds, at most one per severity level
#[derive(Debug, Clone, Default)]
pub struct ThresholdLadder {
    thresholds: Vec<MemoryThreshold>,
}

impl ThresholdLadder {
    /// Build a ladder from the given thresholds. Later duplicates of a
    /// level replace earlier ones.
    pub fn new(thresholds: Vec<MemoryThreshold>) -> Self {
        let mut ladder = Self {
            thresholds: Vec::with_capacity(thresholds.len()),
        };
        for threshold in thresholds {
            ladder.insert(threshold);
        }
        ladder
    }

    /// Add or replace the rung for a level, keeping the ladder sorted
    /// ascending by memory percentage.
    pub fn insert(&mut self, threshold: MemoryThreshold) {
        self.thresholds.retain(|t| t.level != threshold.level);
        self.thresholds.push(threshold);
        self.thresholds.sort_by(|a, b| {
            a.memory_percent
                .partial_cmp(&b.memory_percent)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    /// Remove the rung for a level; returns whether one was present
    pub fn remove(&mut self, level: PressureLevel) -> bool {
        let before = self.thresholds.len();
        self.thresholds.retain(|t| t.level != level);
        self.thresholds.len() < before
    }

    /// Scan from the highest rung down and return the first match.
    ///
    /// First-match-wins is the single-fire guarantee: one tick never
    /// produces two alerts of different severities.
    pub fn first_match(&self, stats: &MemoryStats) -> Option<&MemoryThreshold> {
        self.thresholds.iter().rev().find(|t| t.matches(stats))
    }

    /// All rungs, ascending by memory percentage
    pub fn thresholds(&self) -> &[MemoryThreshold] {
        &self.thresholds
    }

    /// Number of rungs
    pub fn len(&self) -> usize {
        self.thresholds.len()
    }

    /// Whether the ladder has no rungs
    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }
}
