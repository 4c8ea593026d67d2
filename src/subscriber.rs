//! Subscriber contracts and bundled alert sinks
//!
//! Cleanup and alert fan-out go through explicit traits rather than bare
//! callbacks, so registration is type-checked and failures surface as
//! `Result`s the monitor can isolate per subscriber.

use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::{error, info, warn};

use crate::alert::MemoryAlert;
use crate::pressure::{CleanupLevel, PressureLevel};
use crate::stats::MemoryStats;

/// A component that can shed held resources under memory pressure.
///
/// `on_cleanup` must return promptly; the monitor bounds each invocation
/// with its configured callback timeout and logs overruns. An `Err` return
/// is logged and does not stop the fan-out to later subscribers.
#[async_trait]
pub trait CleanupSubscriber: Send + Sync {
    /// Name used in per-subscriber log lines
    fn name(&self) -> &str;

    /// Shed resources proportional to the given level
    async fn on_cleanup(&self, level: CleanupLevel, stats: &MemoryStats) -> Result<()>;
}

/// A consumer of fired alerts. Same isolation guarantee as
/// [`CleanupSubscriber`]: one failing sink never blocks the next.
#[async_trait]
pub trait AlertSubscriber: Send + Sync {
    /// Name used in per-subscriber log lines
    fn name(&self) -> &str;

    /// Handle a newly fired alert
    async fn on_alert(&self, alert: &MemoryAlert) -> Result<()>;
}

/// Alert sink that emits structured log lines, severity-mapped
#[derive(Debug, Default)]
pub struct LogAlertSink;

#[async_trait]
impl AlertSubscriber for LogAlertSink {
    fn name(&self) -> &str {
        "log-sink"
    }

    async fn on_alert(&self, alert: &MemoryAlert) -> Result<()> {
        match alert.level {
            PressureLevel::Info => info!(
                alert_id = %alert.id,
                memory_percent = alert.stats.memory_percent,
                "{}",
                alert.message
            ),
            PressureLevel::Warning => warn!(
                alert_id = %alert.id,
                memory_percent = alert.stats.memory_percent,
                "{}",
                alert.message
            ),
            PressureLevel::Critical | PressureLevel::Emergency => error!(
                alert_id = %alert.id,
                memory_percent = alert.stats.memory_percent,
                swap_percent = alert.stats.swap_percent,
                "{}",
                alert.message
            ),
        }
        Ok(())
    }
}

/// Alert sink that appends flat alert records as JSON lines.
///
/// The sink owns no storage guarantees beyond the record's field
/// stability; rotation and retention belong to the operator.
#[derive(Debug)]
pub struct JsonlAlertSink {
    path: PathBuf,
}

impl JsonlAlertSink {
    /// Create a sink appending to the given file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file this sink appends to
    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[async_trait]
impl AlertSubscriber for JsonlAlertSink {
    fn name(&self) -> &str {
        "jsonl-sink"
    }

    async fn on_alert(&self, alert: &MemoryAlert) -> Result<()> {
        let mut line = serde_json::to_string(&alert.to_record())?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }
}
