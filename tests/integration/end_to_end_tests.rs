//! End-to-end scenarios across the manager, monitor, registry, and caches

use std::time::Duration;

use memsentry::{
    CacheConfig, CleanupLevel, EntryClass, MemoryManager, MemoryStats, MemoryThreshold,
    MonitorConfig, PressureLevel,
};
use pretty_assertions::assert_eq;

use super::{RecordingAlerts, RecordingCleanup};

fn manager() -> MemoryManager {
    MemoryManager::new(MonitorConfig::default().with_cooldown(Duration::ZERO)).unwrap()
}

async fn warning_critical_ladder(manager: &MemoryManager) {
    manager
        .monitor()
        .set_thresholds(vec![
            MemoryThreshold::new(PressureLevel::Warning, 70.0, 60.0, "warning rung"),
            MemoryThreshold::new(PressureLevel::Critical, 90.0, 80.0, "critical rung"),
        ])
        .await;
}

#[tokio::test]
async fn test_warning_then_critical_scenario() {
    super::init_tracing();
    let manager = manager();
    warning_critical_ladder(&manager).await;

    let cleanup = RecordingCleanup::new("subscriber");
    let alerts = RecordingAlerts::new();
    manager.monitor().add_cleanup_subscriber(cleanup.clone()).await;
    manager.monitor().add_alert_subscriber(alerts.clone()).await;

    // 75%: exactly one Warning alert, one Light cleanup
    manager
        .monitor()
        .process_sample(MemoryStats::synthetic(75.0, 0.0, 0))
        .await;

    assert_eq!(alerts.alerts().len(), 1);
    assert_eq!(alerts.alerts()[0].level, PressureLevel::Warning);
    assert_eq!(cleanup.calls(), vec![CleanupLevel::Light]);

    // 95% next tick: one Critical alert, cleanup cascade Light then Aggressive
    manager
        .monitor()
        .process_sample(MemoryStats::synthetic(95.0, 0.0, 0))
        .await;

    let fired = alerts.alerts();
    assert_eq!(fired.len(), 2);
    assert_eq!(fired[1].level, PressureLevel::Critical);
    assert_eq!(
        cleanup.calls(),
        vec![
            CleanupLevel::Light,
            CleanupLevel::Light,
            CleanupLevel::Aggressive
        ]
    );

    // One active alert per severity
    let active = manager.monitor().active_alerts().await;
    assert_eq!(active.len(), 2);
    assert_eq!(active[0].level, PressureLevel::Critical);
    assert_eq!(active[1].level, PressureLevel::Warning);
}

#[tokio::test]
async fn test_registered_cache_sheds_under_emergency() {
    let manager = manager();
    warning_critical_ladder(&manager).await;
    manager
        .monitor()
        .add_threshold(MemoryThreshold::new(
            PressureLevel::Emergency,
            95.0,
            90.0,
            "emergency rung",
        ))
        .await;

    let cache = manager
        .get_or_create_cache::<String>(
            "images",
            CacheConfig {
                max_entries: 20,
                max_memory_bytes: 2000,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    for i in 0..20 {
        cache
            .put_sized(format!("img{i}"), "bytes".to_string(), 100, None, EntryClass::Image)
            .await;
    }
    assert_eq!(cache.len().await, 20);
    assert_eq!(cache.memory_usage_bytes().await, 2000);

    // Emergency tick drives the registered cache down to emergency targets
    manager
        .monitor()
        .process_sample(MemoryStats::synthetic(97.0, 0.0, 0))
        .await;

    assert!(cache.memory_usage_bytes().await <= 600); // 30% of budget
    assert!(cache.len().await <= 8); // 40% of entry ceiling
    assert!(cache.stats().await.evictions > 0);
}

#[tokio::test]
async fn test_unmonitored_cache_is_left_alone() {
    let manager = manager();
    warning_critical_ladder(&manager).await;

    let cache = manager
        .get_or_create_cache::<String>(
            "private",
            CacheConfig {
                max_entries: 10,
                max_memory_bytes: 1000,
                monitored: false,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    for i in 0..10 {
        cache
            .put_sized(format!("key{i}"), "v".to_string(), 100, None, EntryClass::General)
            .await;
    }

    manager
        .monitor()
        .process_sample(MemoryStats::synthetic(95.0, 0.0, 0))
        .await;

    // No cleanup subscriber was registered, so nothing was evicted
    assert_eq!(cache.len().await, 10);
    assert_eq!(cache.stats().await.evictions, 0);
}

#[tokio::test]
async fn test_acknowledge_and_clear_through_manager() {
    let manager = manager();
    warning_critical_ladder(&manager).await;

    manager
        .monitor()
        .process_sample(MemoryStats::synthetic(75.0, 0.0, 0))
        .await;
    manager
        .monitor()
        .process_sample(MemoryStats::synthetic(95.0, 0.0, 0))
        .await;

    let active = manager.monitor().active_alerts().await;
    assert_eq!(active.len(), 2);

    for alert in &active {
        assert!(manager.monitor().acknowledge(alert.id).await);
    }
    assert_eq!(manager.monitor().clear_acknowledged().await, 2);
    assert!(manager.monitor().active_alerts().await.is_empty());

    // History still records what fired
    assert_eq!(manager.monitor().alert_history().await.len(), 2);
}

#[tokio::test]
async fn test_live_sampling_loop_populates_history() {
    let manager = MemoryManager::new(
        MonitorConfig::default().with_sample_interval(Duration::from_millis(10)),
    )
    .unwrap();

    manager.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(60)).await;

    // An on-demand sample works alongside the loop cadence
    let stats = manager.monitor().sample_now().await;
    assert!(stats.memory_percent >= 0.0);

    manager.stop().await.unwrap();

    let history = manager.monitor().history().await;
    assert!(
        !history.is_empty(),
        "live loop should have recorded at least one sample"
    );
    // Samples carry real or zeroed-fallback readings, never negatives
    for stats in &history {
        assert!(stats.memory_percent >= 0.0);
    }
}
