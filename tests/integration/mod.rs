// Integration test modules
pub mod cache_tests;
pub mod end_to_end_tests;

// Test utilities
use async_trait::async_trait;
use memsentry::{AlertSubscriber, CleanupLevel, CleanupSubscriber, MemoryAlert, MemoryStats};
use std::sync::{Arc, Mutex};

/// Route monitor logs through the test output when RUST_LOG is set
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Cleanup subscriber recording every invocation, optionally failing
pub struct RecordingCleanup {
    name: String,
    calls: Mutex<Vec<CleanupLevel>>,
    fail: bool,
}

impl RecordingCleanup {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            calls: Mutex::new(Vec::new()),
            fail: false,
        })
    }

    pub fn failing(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            calls: Mutex::new(Vec::new()),
            fail: true,
        })
    }

    pub fn calls(&self) -> Vec<CleanupLevel> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CleanupSubscriber for RecordingCleanup {
    fn name(&self) -> &str {
        &self.name
    }

    async fn on_cleanup(&self, level: CleanupLevel, _stats: &MemoryStats) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(level);
        if self.fail {
            anyhow::bail!("synthetic failure from {}", self.name);
        }
        Ok(())
    }
}

/// Alert subscriber recording every fired alert
pub struct RecordingAlerts {
    alerts: Mutex<Vec<MemoryAlert>>,
}

impl RecordingAlerts {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            alerts: Mutex::new(Vec::new()),
        })
    }

    pub fn alerts(&self) -> Vec<MemoryAlert> {
        self.alerts.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlertSubscriber for RecordingAlerts {
    fn name(&self) -> &str {
        "recording-alerts"
    }

    async fn on_alert(&self, alert: &MemoryAlert) -> anyhow::Result<()> {
        self.alerts.lock().unwrap().push(alert.clone());
        Ok(())
    }
}
