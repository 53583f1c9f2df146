//! Unit tests for the persistent registry store
//!
//! Covers tolerance for missing and corrupt documents, persistence across
//! reopen, message trimming, and the lastCheck bookkeeping.

use chrono::{TimeZone, Utc};
use dockobserver::registry::RegistryStore;

#[test]
fn test_missing_file_is_empty_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = RegistryStore::open(dir.path().join("registry_cache.json"));
    assert!(store.get("nginx:1.25").is_none());
    assert!(store.last_check().is_none());
    assert!(store.messages(0).is_empty());
}

#[test]
fn test_corrupt_file_is_empty_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("registry_cache.json");
    std::fs::write(&path, "{not json at all").unwrap();
    let store = RegistryStore::open(&path);
    assert!(store.get("nginx:1.25").is_none());
}

#[test]
fn test_document_with_missing_maps_is_tolerated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("registry_cache.json");
    std::fs::write(&path, r#"{"lastCheck":"2024-03-01T12:00:00Z"}"#).unwrap();
    let store = RegistryStore::open(&path);
    assert!(store.get("anything").is_none());
    assert_eq!(
        store.last_check(),
        Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap())
    );
}

#[test]
fn test_put_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("registry_cache.json");
    let latest = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
    {
        let store = RegistryStore::open(&path);
        store.put("nginx:1.25", Some(latest), "1.25.4");
    }

    let reopened = RegistryStore::open(&path);
    let entry = reopened.get("nginx:1.25").unwrap();
    assert_eq!(entry.latest_update, Some(latest));
    assert_eq!(entry.latest_version, "1.25.4");
    assert!(entry.checked_at.is_some());
    // put also bumps lastCheck
    assert!(reopened.last_check().is_some());
}

#[test]
fn test_clear_removes_entry() {
    let dir = tempfile::tempdir().unwrap();
    let store = RegistryStore::open(dir.path().join("registry_cache.json"));
    store.put("redis:7", None, "");
    assert!(store.get("redis:7").is_some());
    store.clear("redis:7");
    assert!(store.get("redis:7").is_none());
}

#[test]
fn test_messages_trim_to_limit() {
    let dir = tempfile::tempdir().unwrap();
    let store = RegistryStore::open(dir.path().join("registry_cache.json"));
    for i in 0..5 {
        store.append_message(&format!("cycle {i}"), 3);
    }
    let messages = store.messages(0);
    assert_eq!(messages.len(), 3);
    let texts: Vec<&str> = messages.iter().map(|m| m.message.as_str()).collect();
    assert_eq!(texts, vec!["cycle 2", "cycle 3", "cycle 4"]);

    // a smaller read window returns the newest entries in order
    let tail = store.messages(2);
    let texts: Vec<&str> = tail.iter().map(|m| m.message.as_str()).collect();
    assert_eq!(texts, vec!["cycle 3", "cycle 4"]);
}

#[test]
fn test_touch_last_auto_check() {
    let dir = tempfile::tempdir().unwrap();
    let store = RegistryStore::open(dir.path().join("registry_cache.json"));
    assert!(store.last_auto_check().is_none());
    store.touch_last_auto_check();
    assert!(store.last_auto_check().is_some());
    assert!(store.last_check().is_none());
}

#[test]
fn test_unwritable_path_is_swallowed() {
    let store = RegistryStore::open("/definitely/not/writable/registry_cache.json");
    // writes fail silently, the in-memory state still works
    store.put("nginx:1.25", None, "");
    assert!(store.get("nginx:1.25").is_some());
}
