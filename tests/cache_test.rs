//! Unit tests for the TTL cache
//!
//! Covers expiry on access, the no-expiry sentinel, typed downcasts, and
//! clearing.

use dockobserver::TtlCache;
use std::time::Duration;

#[test]
fn test_set_then_get() {
    let cache = TtlCache::new();
    cache.set("digest:nginx:1.25", "nginx@sha256:abc".to_string(), Duration::from_secs(60));
    assert_eq!(
        cache.get::<String>("digest:nginx:1.25"),
        Some("nginx@sha256:abc".to_string())
    );
}

#[test]
fn test_missing_key() {
    let cache = TtlCache::new();
    assert_eq!(cache.get::<String>("nope"), None);
}

#[tokio::test]
async fn test_expired_entry_is_evicted() {
    let cache = TtlCache::new();
    cache.set("short", 7u64, Duration::from_millis(10));
    assert_eq!(cache.get::<u64>("short"), Some(7));
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(cache.get::<u64>("short"), None);
}

#[tokio::test]
async fn test_zero_ttl_never_expires() {
    let cache = TtlCache::new();
    cache.set("forever", 1u64, Duration::ZERO);
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(cache.get::<u64>("forever"), Some(1));
}

#[test]
fn test_type_mismatch_returns_none() {
    let cache = TtlCache::new();
    cache.set("key", 42u64, Duration::from_secs(60));
    assert_eq!(cache.get::<String>("key"), None);
    // the entry itself is still there under its real type
    assert_eq!(cache.get::<u64>("key"), Some(42));
}

#[test]
fn test_overwrite_replaces_value() {
    let cache = TtlCache::new();
    cache.set("key", "old".to_string(), Duration::from_secs(60));
    cache.set("key", "new".to_string(), Duration::from_secs(60));
    assert_eq!(cache.get::<String>("key"), Some("new".to_string()));
}

#[test]
fn test_clear_empties_the_cache() {
    let cache = TtlCache::new();
    cache.set("a", 1u64, Duration::ZERO);
    cache.set("b", 2u64, Duration::ZERO);
    cache.clear();
    assert_eq!(cache.get::<u64>("a"), None);
    assert_eq!(cache.get::<u64>("b"), None);
}
