//! LRU Cache Tests
//!
//! Tests verify:
//! - Get/set/delete semantics
//! - Eviction of the least recently used entry at capacity
//! - Promotion on read and on overwrite
//! - Agreement with a simple model over random operation sequences

use atlasdb::cache::BoundedCache;
use proptest::prelude::*;

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_new_cache_is_empty() {
    let cache: BoundedCache<String, i32> = BoundedCache::new(3);
    assert!(cache.is_empty());
    assert_eq!(cache.capacity(), 3);
}

#[test]
fn test_default_capacity() {
    let cache: BoundedCache<String, i32> = BoundedCache::default();
    assert_eq!(cache.capacity(), 100);
}

#[test]
fn test_set_and_get() {
    let mut cache = BoundedCache::new(2);
    cache.set("a".to_string(), 1);

    assert_eq!(cache.get("a"), Some(&1));
    assert_eq!(cache.get("missing"), None);
}

#[test]
fn test_set_overwrites() {
    let mut cache = BoundedCache::new(2);
    cache.set("a".to_string(), 1);
    cache.set("a".to_string(), 2);

    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get("a"), Some(&2));
    cache.debug_validate_invariants();
}

#[test]
fn test_delete() {
    let mut cache = BoundedCache::new(2);
    cache.set("a".to_string(), 1);

    assert!(cache.delete("a"));
    assert!(!cache.delete("a"));
    assert!(cache.get("a").is_none());
    cache.debug_validate_invariants();
}

// =============================================================================
// Eviction Tests
// =============================================================================

#[test]
fn test_evicts_least_recently_used() {
    let mut cache = BoundedCache::new(3);
    for (k, v) in [("a", 1), ("b", 2), ("c", 3)] {
        assert!(cache.set(k, v).is_none());
    }

    assert_eq!(cache.set("d", 4), Some(("a", 1)));
    assert_eq!(cache.keys(), vec!["d", "c", "b"]);
    cache.debug_validate_invariants();
}

#[test]
fn test_get_protects_from_eviction() {
    let mut cache = BoundedCache::new(3);
    cache.set("a", 1);
    cache.set("b", 2);
    cache.set("c", 3);

    cache.get("a");
    assert_eq!(cache.set("d", 4), Some(("b", 2)));
    assert!(cache.contains("a"));
}

#[test]
fn test_overwrite_promotes() {
    let mut cache = BoundedCache::new(2);
    cache.set("a", 1);
    cache.set("b", 2);
    cache.set("a", 10);

    assert_eq!(cache.set("c", 3), Some(("b", 2)));
    assert_eq!(cache.peek("a"), Some(&10));
}

#[test]
fn test_peek_does_not_promote() {
    let mut cache = BoundedCache::new(2);
    cache.set("a", 1);
    cache.set("b", 2);

    assert_eq!(cache.peek("a"), Some(&1));
    assert_eq!(cache.set("c", 3), Some(("a", 1)));
}

#[test]
fn test_n_inserts_keep_last_capacity_keys() {
    let capacity = 5;
    let mut cache = BoundedCache::new(capacity);
    for i in 0..(capacity + 7) {
        cache.set(i, i * 10);
    }

    assert_eq!(cache.len(), capacity);
    let mut kept = cache.keys();
    kept.sort_unstable();
    assert_eq!(kept, (7..12).collect::<Vec<_>>());
}

#[test]
fn test_capacity_one() {
    let mut cache = BoundedCache::new(1);
    cache.set("a", 1);
    assert_eq!(cache.set("b", 2), Some(("a", 1)));
    assert_eq!(cache.keys(), vec!["b"]);
}

// =============================================================================
// Retain / Clear Tests
// =============================================================================

#[test]
fn test_retain_where_removes_matches() {
    let mut cache = BoundedCache::new(5);
    for i in 0..5 {
        cache.set(i, i);
    }

    let mut removed = cache.retain_where(|_, v| v % 2 == 0);
    removed.sort_unstable();

    assert_eq!(removed, vec![0, 2, 4]);
    assert_eq!(cache.keys(), vec![3, 1]);
    cache.debug_validate_invariants();
}

#[test]
fn test_clear() {
    let mut cache = BoundedCache::new(3);
    cache.set("a", 1);
    cache.clear();

    assert!(cache.is_empty());
    assert!(cache.get("a").is_none());
}

// =============================================================================
// Property Tests
// =============================================================================

#[derive(Debug, Clone)]
enum Op {
    Set(u8, u32),
    Get(u8),
    Delete(u8),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..12, any::<u32>()).prop_map(|(k, v)| Op::Set(k, v)),
        (0u8..12).prop_map(Op::Get),
        (0u8..12).prop_map(Op::Delete),
    ]
}

/// Reference model: most recently used at the front
fn model_touch(model: &mut Vec<(u8, u32)>, key: u8) -> Option<u32> {
    let pos = model.iter().position(|(k, _)| *k == key)?;
    let entry = model.remove(pos);
    model.insert(0, entry);
    Some(entry.1)
}

proptest! {
    #[test]
    fn prop_matches_recency_model(
        capacity in 1usize..6,
        ops in prop::collection::vec(op_strategy(), 0..200),
    ) {
        let mut cache = BoundedCache::new(capacity);
        let mut model: Vec<(u8, u32)> = Vec::new();

        for op in ops {
            match op {
                Op::Set(k, v) => {
                    model.retain(|(mk, _)| *mk != k);
                    model.insert(0, (k, v));
                    let expected_eviction = if model.len() > capacity { model.pop() } else { None };
                    prop_assert_eq!(cache.set(k, v), expected_eviction);
                }
                Op::Get(k) => {
                    let expected = model_touch(&mut model, k);
                    prop_assert_eq!(cache.get(&k).copied(), expected);
                }
                Op::Delete(k) => {
                    let present = model.iter().any(|(mk, _)| *mk == k);
                    model.retain(|(mk, _)| *mk != k);
                    prop_assert_eq!(cache.delete(&k), present);
                }
            }

            prop_assert!(cache.len() <= capacity);
            let order: Vec<u8> = model.iter().map(|(k, _)| *k).collect();
            prop_assert_eq!(cache.keys(), order);
        }
        cache.debug_validate_invariants();
    }
}
