//! Background memory monitoring, threshold evaluation, and fan-out
//!
//! One spawned task per monitor runs the sample-evaluate loop. The
//! threshold ladder, active alerts, cooldown stamps and history buffers
//! live under a single monitor-wide lock; subscriber fan-out happens
//! after the lock is released, each invocation isolated and bounded by
//! the configured callback timeout.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::alert::{ActiveAlerts, AlertRecord, MemoryAlert};
use crate::config::MonitorConfig;
use crate::error::{Error, Result};
use crate::pressure::{
    default_ladder, CleanupLevel, MemoryThreshold, PressureLevel, ThresholdLadder,
};
use crate::stats::{MemorySampler, MemoryStats};
use crate::subscriber::{AlertSubscriber, CleanupSubscriber};

/// Operator-facing summary of the monitor's current state
#[derive(Debug, Clone, Serialize)]
pub struct MonitorReport {
    /// Whether the sampling loop is running
    pub running: bool,

    /// Most recent sample, if any
    pub latest: Option<MemoryStats>,

    /// Active alerts, most severe first
    pub active_alerts: Vec<AlertRecord>,

    /// Depth of the stats history buffer
    pub stats_history_len: usize,

    /// Number of ladder rungs installed
    pub threshold_count: usize,
}

struct MonitorState {
    ladder: ThresholdLadder,
    alerts: ActiveAlerts,
    last_fired: HashMap<PressureLevel, Instant>,
    stats_history: VecDeque<MemoryStats>,
    alert_history: VecDeque<AlertRecord>,
}

struct RunningLoop {
    handle: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

struct Inner {
    config: MonitorConfig,
    state: Mutex<MonitorState>,
    cleanup_subscribers: RwLock<Vec<Arc<dyn CleanupSubscriber>>>,
    alert_subscribers: RwLock<Vec<Arc<dyn AlertSubscriber>>>,
    sampler: Mutex<MemorySampler>,
    runtime: Mutex<Option<RunningLoop>>,
}

/// Cloneable handle to a background memory monitor.
///
/// Created with the default severity ladder installed; clones share the
/// same underlying monitor.
#[derive(Clone)]
pub struct MemoryMonitor {
    inner: Arc<Inner>,
}

impl MemoryMonitor {
    /// Create a monitor with the default ladder and the given configuration
    pub fn new(config: MonitorConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                state: Mutex::new(MonitorState {
                    ladder: ThresholdLadder::new(default_ladder()),
                    alerts: ActiveAlerts::default(),
                    last_fired: HashMap::new(),
                    stats_history: VecDeque::new(),
                    alert_history: VecDeque::new(),
                }),
                cleanup_subscribers: RwLock::new(Vec::new()),
                alert_subscribers: RwLock::new(Vec::new()),
                sampler: Mutex::new(MemorySampler::new()),
                runtime: Mutex::new(None),
            }),
        })
    }

    /// Start the background sampling loop
    pub async fn start(&self) -> Result<()> {
        let mut runtime = self.inner.runtime.lock().await;
        if runtime.is_some() {
            return Err(Error::AlreadyRunning);
        }

        let (shutdown, mut signal) = watch::channel(false);
        let inner = Arc::clone(&self.inner);
        let interval_duration = self.inner.config.sample_interval;

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(interval_duration);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let stats = inner.sampler.lock().await.sample();
                        inner.process_sample(stats).await;
                    }
                    changed = signal.changed() => {
                        if changed.is_err() || *signal.borrow() {
                            break;
                        }
                    }
                }
            }
            debug!("memory monitor loop exited");
        });

        *runtime = Some(RunningLoop { handle, shutdown });
        info!(interval = ?interval_duration, "memory monitor started");
        Ok(())
    }

    /// Signal the loop to exit after its current tick and join it.
    ///
    /// A loop that fails to join within `stop_timeout` is aborted and
    /// logged, not escalated.
    pub async fn stop(&self) -> Result<()> {
        let running = self
            .inner
            .runtime
            .lock()
            .await
            .take()
            .ok_or(Error::NotRunning)?;

        let _ = running.shutdown.send(true);

        let mut handle = running.handle;
        match tokio::time::timeout(self.inner.config.stop_timeout, &mut handle).await {
            Ok(Ok(())) => info!("memory monitor stopped"),
            Ok(Err(e)) => warn!(error = %e, "memory monitor task ended abnormally"),
            Err(_) => {
                warn!(
                    timeout = ?self.inner.config.stop_timeout,
                    "memory monitor did not stop in time, aborting task"
                );
                handle.abort();
            }
        }
        Ok(())
    }

    /// Whether the sampling loop is currently running
    pub async fn is_running(&self) -> bool {
        self.inner.runtime.lock().await.is_some()
    }

    /// Take an immediate sample outside the loop cadence
    pub async fn sample_now(&self) -> MemoryStats {
        self.inner.sampler.lock().await.sample()
    }

    /// Run one evaluation tick against the given snapshot.
    ///
    /// The loop calls this with live samples; tests and drills can feed
    /// synthetic snapshots for deterministic behavior.
    pub async fn process_sample(&self, stats: MemoryStats) {
        self.inner.process_sample(stats).await;
    }

    /// Add or replace the ladder rung for a severity level
    pub async fn add_threshold(&self, threshold: MemoryThreshold) {
        let mut state = self.inner.state.lock().await;
        state.ladder.insert(threshold);
    }

    /// Remove the ladder rung for a level; returns whether one existed
    pub async fn remove_threshold(&self, level: PressureLevel) -> bool {
        let mut state = self.inner.state.lock().await;
        state.ladder.remove(level)
    }

    /// Replace the entire ladder
    pub async fn set_thresholds(&self, thresholds: Vec<MemoryThreshold>) {
        let mut state = self.inner.state.lock().await;
        state.ladder = ThresholdLadder::new(thresholds);
    }

    /// Current ladder rungs, ascending by memory percentage
    pub async fn thresholds(&self) -> Vec<MemoryThreshold> {
        let state = self.inner.state.lock().await;
        state.ladder.thresholds().to_vec()
    }

    /// Register a cleanup subscriber
    pub async fn add_cleanup_subscriber(&self, subscriber: Arc<dyn CleanupSubscriber>) {
        let mut subscribers = self.inner.cleanup_subscribers.write().await;
        debug!(subscriber = subscriber.name(), "cleanup subscriber registered");
        subscribers.push(subscriber);
    }

    /// Register an alert subscriber
    pub async fn add_alert_subscriber(&self, subscriber: Arc<dyn AlertSubscriber>) {
        let mut subscribers = self.inner.alert_subscribers.write().await;
        debug!(subscriber = subscriber.name(), "alert subscriber registered");
        subscribers.push(subscriber);
    }

    /// Acknowledge an active alert; unknown ids return false
    pub async fn acknowledge(&self, id: Uuid) -> bool {
        let mut state = self.inner.state.lock().await;
        state.alerts.acknowledge(id)
    }

    /// Remove all acknowledged alerts from the active set
    pub async fn clear_acknowledged(&self) -> usize {
        let mut state = self.inner.state.lock().await;
        state.alerts.clear_acknowledged()
    }

    /// Snapshot of active alerts, most severe first
    pub async fn active_alerts(&self) -> Vec<MemoryAlert> {
        let state = self.inner.state.lock().await;
        state.alerts.snapshot()
    }

    /// Retained stats history, oldest first
    pub async fn history(&self) -> Vec<MemoryStats> {
        let state = self.inner.state.lock().await;
        state.stats_history.iter().cloned().collect()
    }

    /// Retained records of fired alerts, oldest first
    pub async fn alert_history(&self) -> Vec<AlertRecord> {
        let state = self.inner.state.lock().await;
        state.alert_history.iter().cloned().collect()
    }

    /// Operator-facing summary of monitor state
    pub async fn report(&self) -> MonitorReport {
        let running = self.is_running().await;
        let state = self.inner.state.lock().await;

        MonitorReport {
            running,
            latest: state.stats_history.back().cloned(),
            active_alerts: state
                .alerts
                .snapshot()
                .iter()
                .map(MemoryAlert::to_record)
                .collect(),
            stats_history_len: state.stats_history.len(),
            threshold_count: state.ladder.len(),
        }
    }

    /// Monitor configuration
    pub fn config(&self) -> &MonitorConfig {
        &self.inner.config
    }
}

impl Inner {
    async fn process_sample(&self, stats: MemoryStats) {
        let fired = {
            let mut state = self.state.lock().await;

            state.stats_history.push_back(stats.clone());
            Self::prune_history(&mut state, &self.config);

            let matched = state.ladder.first_match(&stats).cloned();
            match matched {
                None => None,
                Some(threshold) => self.fire_if_cooled(&mut state, &threshold, &stats),
            }
        };

        if let Some(alert) = fired {
            self.notify_alert(&alert).await;
            self.run_cleanup(alert.level.cascade(), &alert.stats).await;
        }
    }

    /// Fire an alert for the matched rung unless its cooldown is active.
    /// Caller holds the state lock.
    fn fire_if_cooled(
        &self,
        state: &mut MonitorState,
        threshold: &MemoryThreshold,
        stats: &MemoryStats,
    ) -> Option<MemoryAlert> {
        let level = threshold.level;
        let now = Instant::now();

        let in_cooldown = state
            .last_fired
            .get(&level)
            .map(|last| now.duration_since(*last) < self.config.cooldown)
            .unwrap_or(false);

        if in_cooldown {
            debug!(%level, "alert suppressed by cooldown");
            return None;
        }

        state.last_fired.insert(level, now);

        let alert = MemoryAlert::for_threshold(threshold, stats);
        if let Some(previous) = state.alerts.fire(alert.clone()) {
            debug!(%level, replaced = %previous.id, "active alert replaced");
        }

        state.alert_history.push_back(alert.to_record());
        while state.alert_history.len() > self.config.max_history {
            state.alert_history.pop_front();
        }

        if level == PressureLevel::Emergency {
            // The monitor must not feed the pressure it reports
            Self::truncate_history(state, self.config.emergency_history_cap);
        }

        info!(
            %level,
            alert_id = %alert.id,
            memory_percent = stats.memory_percent,
            swap_percent = stats.swap_percent,
            "memory pressure alert fired"
        );

        Some(alert)
    }

    fn prune_history(state: &mut MonitorState, config: &MonitorConfig) {
        if let Ok(window) = chrono::Duration::from_std(config.history_retention) {
            let cutoff = chrono::Utc::now() - window;
            while state
                .stats_history
                .front()
                .map_or(false, |s| s.timestamp < cutoff)
            {
                state.stats_history.pop_front();
            }
        }

        while state.stats_history.len() > config.max_history {
            state.stats_history.pop_front();
        }
    }

    fn truncate_history(state: &mut MonitorState, cap: usize) {
        while state.stats_history.len() > cap {
            state.stats_history.pop_front();
        }
        while state.alert_history.len() > cap {
            state.alert_history.pop_front();
        }
    }

    async fn notify_alert(&self, alert: &MemoryAlert) {
        let subscribers = self.alert_subscribers.read().await.clone();
        for subscriber in &subscribers {
            self.invoke(subscriber.name(), "alert", subscriber.on_alert(alert))
                .await;
        }
    }

    async fn run_cleanup(&self, cascade: &[CleanupLevel], stats: &MemoryStats) {
        if cascade.is_empty() {
            return;
        }

        let subscribers = self.cleanup_subscribers.read().await.clone();
        for level in cascade {
            for subscriber in &subscribers {
                self.invoke(
                    subscriber.name(),
                    "cleanup",
                    subscriber.on_cleanup(*level, stats),
                )
                .await;
            }
        }
    }

    /// Run one subscriber invocation, isolating failures and bounding
    /// execution time so a stuck subscriber cannot stall the cadence.
    async fn invoke<F>(&self, subscriber: &str, kind: &str, fut: F)
    where
        F: Future<Output = anyhow::Result<()>>,
    {
        let result = match self.config.callback_timeout {
            Some(limit) => match tokio::time::timeout(limit, fut).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(
                        subscriber,
                        kind,
                        timeout = ?limit,
                        "subscriber exceeded callback timeout, skipped for this tick"
                    );
                    return;
                }
            },
            None => fut.await,
        };

        if let Err(e) = result {
            warn!(subscriber, kind, error = %e, "subscriber failed");
        }
    }
}
