//! Alert types and the active-alert lifecycle
//!
//! At most one alert is active per severity level; firing a new one
//! replaces the old rather than stacking duplicates. Alerts leave the
//! active set only through an explicit `clear_acknowledged` sweep.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pressure::{MemoryThreshold, PressureLevel};
use crate::stats::MemoryStats;

/// An alert raised when a threshold rung fires
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryAlert {
    /// Unique alert id
    pub id: Uuid,

    /// Severity of the firing rung
    pub level: PressureLevel,

    /// Short summary line
    pub title: String,

    /// Detailed message with the triggering readings
    pub message: String,

    /// The snapshot that tripped the threshold
    pub stats: MemoryStats,

    /// Description carried from the firing threshold
    pub threshold_description: String,

    /// When the alert was created
    pub created_at: DateTime<Utc>,

    /// Whether an operator has acknowledged the alert
    pub acknowledged: bool,
}

impl MemoryAlert {
    /// Build an alert for a fired threshold
    pub fn for_threshold(threshold: &MemoryThreshold, stats: &MemoryStats) -> Self {
        let title = format!("{} memory pressure", threshold.level);
        let message = format!(
            "memory {:.1}%, swap {:.1}%, process {:.1} MB: {}",
            stats.memory_percent,
            stats.swap_percent,
            stats.process_rss_mb(),
            threshold.description,
        );

        Self {
            id: Uuid::new_v4(),
            level: threshold.level,
            title,
            message,
            stats: stats.clone(),
            threshold_description: threshold.description.clone(),
            created_at: Utc::now(),
            acknowledged: false,
        }
    }

    /// Flatten to the stable record shape consumed by external sinks
    pub fn to_record(&self) -> AlertRecord {
        AlertRecord {
            id: self.id.to_string(),
            level: self.level.as_str().to_string(),
            title: self.title.clone(),
            message: self.message.clone(),
            memory_percent: self.stats.memory_percent,
            swap_percent: self.stats.swap_percent,
            process_percent: self.stats.process_percent,
            threshold: self.threshold_description.clone(),
            timestamp: self.created_at.to_rfc3339(),
            acknowledged: self.acknowledged,
        }
    }
}

/// Flat, JSON-serializable alert record.
///
/// Field names and shapes are stable; sinks may persist these as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub id: String,
    pub level: String,
    pub title: String,
    pub message: String,
    pub memory_percent: f64,
    pub swap_percent: f64,
    pub process_percent: f64,
    pub threshold: String,
    pub timestamp: String,
    pub acknowledged: bool,
}

/// The set of currently active alerts, one slot per severity
#[derive(Debug, Default)]
pub(crate) struct ActiveAlerts {
    by_level: HashMap<PressureLevel, MemoryAlert>,
}

impl ActiveAlerts {
    /// Install an alert, returning the one it replaced if any
    pub fn fire(&mut self, alert: MemoryAlert) -> Option<MemoryAlert> {
        self.by_level.insert(alert.level, alert)
    }

    /// Mark an alert acknowledged; unknown ids return false
    pub fn acknowledge(&mut self, id: Uuid) -> bool {
        for alert in self.by_level.values_mut() {
            if alert.id == id {
                alert.acknowledged = true;
                return true;
            }
        }
        false
    }

    /// Drop all acknowledged alerts, returning how many were removed
    pub fn clear_acknowledged(&mut self) -> usize {
        let before = self.by_level.len();
        self.by_level.retain(|_, alert| !alert.acknowledged);
        before - self.by_level.len()
    }

    /// Snapshot of active alerts, most severe first
    pub fn snapshot(&self) -> Vec<MemoryAlert> {
        let mut alerts: Vec<MemoryAlert> = self.by_level.values().cloned().collect();
        alerts.sort_by(|a, b| b.level.cmp(&a.level));
        alerts
    }

    pub fn len(&self) -> usize {
        self.by_level.len()
    }
}
