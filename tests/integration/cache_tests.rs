//! Cache behavior across the public surface

use std::time::Duration;

use memsentry::{CacheConfig, CleanupLevel, EntryClass, PressureCache};
use pretty_assertions::assert_eq;

fn cache_of(max_entries: usize, max_memory_bytes: usize) -> PressureCache<String> {
    PressureCache::new(
        "it-cache",
        CacheConfig {
            max_entries,
            max_memory_bytes,
            monitored: false,
            ..Default::default()
        },
    )
    .unwrap()
}

#[tokio::test]
async fn test_bounds_hold_for_any_put_sequence() {
    let cache = cache_of(5, 2000);

    for i in 0..50 {
        let size = 100 + (i * 37) % 500;
        cache
            .put_sized(format!("key{i}"), "payload".to_string(), size, None, EntryClass::General)
            .await;

        assert!(cache.len().await <= 5, "entry ceiling violated at put {i}");
        assert!(
            cache.memory_usage_bytes().await <= 2000,
            "memory ceiling violated at put {i}"
        );
    }
}

#[tokio::test]
async fn test_ttl_boundary() {
    let cache = cache_of(10, 1 << 20);
    let ttl = Duration::from_millis(60);

    cache
        .put_with("entry", "value".to_string(), Some(ttl), EntryClass::General)
        .await;

    // Well before the TTL elapses the entry is retrievable
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(cache.get("entry").await, Some("value".to_string()));

    // Strictly after it, a lookup is a recorded miss and the entry is gone
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(cache.get("entry").await, None);
    assert!(!cache.contains_key("entry").await);

    let stats = cache.stats().await;
    assert_eq!(stats.expirations, 1);
    assert_eq!(stats.misses, 1);
}

#[tokio::test]
async fn test_homogeneous_eviction_is_strict_lru() {
    let cache = cache_of(3, 1 << 20);

    cache.put("a", "1".to_string()).await;
    cache.put("b", "2".to_string()).await;
    cache.put("c", "3".to_string()).await;

    // Touch a and b so c is coldest
    cache.get("a").await;
    cache.get("b").await;

    cache.put("d", "4".to_string()).await;

    assert!(!cache.contains_key("c").await);
    assert!(cache.contains_key("a").await);
    assert!(cache.contains_key("b").await);
    assert!(cache.contains_key("d").await);
}

#[tokio::test]
async fn test_priority_eviction_prefers_low_weight_class() {
    let cache = cache_of(2, 1 << 20);

    // Equal recency, different class weights
    cache
        .put_with("cheap", "v".to_string(), None, EntryClass::General)
        .await;
    cache
        .put_with("expensive", "v".to_string(), None, EntryClass::Image)
        .await;

    cache
        .put_with("incoming", "v".to_string(), None, EntryClass::Content)
        .await;

    assert!(!cache.contains_key("cheap").await);
    assert!(cache.contains_key("expensive").await);
    assert!(cache.contains_key("incoming").await);
    assert_eq!(cache.stats().await.evictions, 1);
}

#[tokio::test]
async fn test_admission_rejection_leaves_cache_untouched() {
    let cache = cache_of(10, 1000);

    cache
        .put_sized("resident", "v".to_string(), 400, None, EntryClass::General)
        .await;

    let admitted = cache
        .put_sized("oversized", "v".to_string(), 1001, None, EntryClass::General)
        .await;

    assert!(!admitted);
    assert!(cache.contains_key("resident").await);
    assert_eq!(cache.memory_usage_bytes().await, 400);
    assert_eq!(cache.stats().await.rejected, 1);
}

#[tokio::test]
async fn test_cleanup_aggressiveness_ordering() {
    let light = cache_of(20, 2000);
    let aggressive = cache_of(20, 2000);
    let emergency = cache_of(20, 2000);

    for cache in [&light, &aggressive, &emergency] {
        for i in 0..20 {
            cache
                .put_sized(format!("key{i}"), "v".to_string(), 100, None, EntryClass::General)
                .await;
        }
    }

    light.cleanup(CleanupLevel::Light).await;
    aggressive.cleanup(CleanupLevel::Aggressive).await;
    emergency.cleanup(CleanupLevel::Emergency).await;

    let light_bytes = light.memory_usage_bytes().await;
    let aggressive_bytes = aggressive.memory_usage_bytes().await;
    let emergency_bytes = emergency.memory_usage_bytes().await;

    assert!(light_bytes >= aggressive_bytes);
    assert!(aggressive_bytes >= emergency_bytes);
    assert!(emergency_bytes <= 600); // 30% of budget
    assert!(emergency.len().await <= 8); // 40% of entry ceiling
}

#[tokio::test]
async fn test_remove_and_clear_are_total() {
    let cache = cache_of(10, 1 << 20);

    cache.put("a", "1".to_string()).await;
    cache.put("b", "2".to_string()).await;

    assert_eq!(cache.remove("a").await, Some("1".to_string()));
    assert_eq!(cache.remove("a").await, None);
    assert_eq!(cache.remove("never-existed").await, None);

    cache.clear().await;
    assert!(cache.is_empty().await);
    assert_eq!(cache.memory_usage_bytes().await, 0);
}
