//! Expiring Store Tests
//!
//! Tests verify:
//! - Set/get/delete and argument validation
//! - Capacity-bounded eviction
//! - Pagination in recency order
//! - Sweeping of expired entries, on demand and in the background

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use atlasdb::kv::{ExpiringStore, Sweeper};
use atlasdb::{AtlasError, Config};
use serde_json::{json, Value};

fn store() -> ExpiringStore {
    ExpiringStore::new(10, Duration::from_secs(10))
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_from_config_defaults() {
    let store = ExpiringStore::from_config(&Config::default()).unwrap();
    assert_eq!(store.default_ttl(), Duration::from_secs(10));
    assert!(store.is_empty());
}

#[test]
fn test_set_and_get() {
    let store = store();
    store.set("greeting", json!("hello"), None).unwrap();

    assert_eq!(store.get("greeting"), Some(json!("hello")));
    assert_eq!(store.get("missing"), None);
    assert_eq!(store.len(), 1);
}

#[test]
fn test_set_rejects_missing_key_or_value() {
    let store = store();

    let err = store.set("", json!(1), None).unwrap_err();
    assert!(matches!(err, AtlasError::InvalidArgument(_)));
    assert_eq!(err.to_string(), "Invalid argument: Key or Value missing");

    assert!(store.set("k", Value::Null, None).is_err());
    assert!(store.is_empty());
}

#[test]
fn test_custom_ttl_is_kept() {
    let store = store();
    store.set("k", json!(1), Some(Duration::from_secs(3))).unwrap();
    assert_eq!(store.entry("k").unwrap().ttl, Duration::from_secs(3));
}

#[test]
fn test_delete() {
    let store = store();
    store.set("k", json!(1), None).unwrap();

    assert!(store.delete("k"));
    assert!(!store.delete("k"));
    assert!(store.get("k").is_none());
}

#[test]
fn test_capacity_evicts_least_recent() {
    let store = ExpiringStore::new(2, Duration::from_secs(10));
    store.set("a", json!(1), None).unwrap();
    store.set("b", json!(2), None).unwrap();
    store.get("a");

    assert_eq!(store.set("c", json!(3), None).unwrap(), Some("b".to_string()));
    assert!(store.get("b").is_none());
}

// =============================================================================
// Pagination Tests
// =============================================================================

#[test]
fn test_page_in_recency_order() {
    let store = store();
    for i in 0..5 {
        store.set(&format!("k{i}"), json!(i), None).unwrap();
    }

    let first = store.page(1, 2);
    let keys: Vec<&str> = first.items.iter().map(|item| item.key.as_str()).collect();
    assert_eq!(keys, vec!["k4", "k3"]);
    assert_eq!((first.page, first.limit), (1, 2));
    assert_eq!(first.items[0].ttl, 10.0);

    let last = store.page(3, 2);
    assert_eq!(last.items.len(), 1);
    assert_eq!(last.items[0].key, "k0");

    assert!(store.page(4, 2).items.is_empty());
}

#[test]
fn test_page_serializes() {
    let store = store();
    store.set("k", json!({ "nested": true }), None).unwrap();

    let payload = serde_json::to_value(store.page(1, 20)).unwrap();
    assert_eq!(payload["page"], json!(1));
    assert_eq!(payload["limit"], json!(20));
    assert_eq!(payload["items"][0]["key"], json!("k"));
    assert_eq!(payload["items"][0]["value"], json!({ "nested": true }));
    assert!(payload["items"][0]["created_at"].as_u64().unwrap() > 0);
}

// =============================================================================
// Expiry Tests
// =============================================================================

#[test]
fn test_sweep_removes_only_expired() {
    let store = store();
    store.set("short", json!(1), Some(Duration::from_secs(2))).unwrap();
    store.set("long", json!(2), Some(Duration::from_secs(60))).unwrap();

    assert!(store.sweep().is_empty());

    let removed = store.sweep_at(Instant::now() + Duration::from_secs(5));
    assert_eq!(removed, vec!["short".to_string()]);
    assert!(store.get("long").is_some());
}

#[test]
fn test_background_sweeper() {
    let store = Arc::new(store());
    store.set("short", json!(1), Some(Duration::from_millis(30))).unwrap();
    store.set("long", json!(2), Some(Duration::from_secs(60))).unwrap();

    let sweeper = Sweeper::spawn(Arc::clone(&store), Duration::from_millis(10));
    assert!(sweeper.is_running());

    let deadline = Instant::now() + Duration::from_secs(5);
    while store.get("short").is_some() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }

    sweeper.shutdown();
    assert!(!sweeper.is_running());
    assert!(store.get("short").is_none());
    assert!(store.get("long").is_some());
}

#[test]
fn test_sweeper_stops_on_drop() {
    let store = Arc::new(store());
    {
        let _sweeper = Sweeper::spawn(Arc::clone(&store), Duration::from_millis(5));
        thread::sleep(Duration::from_millis(20));
    }
    // The thread released its clone of the store
    assert_eq!(Arc::strong_count(&store), 1);
}
