//! B-Tree Tests
//!
//! Tests verify:
//! - Search, insert and delete through the public API
//! - Duplicate keys
//! - Inclusive range queries
//! - Structural invariants after arbitrary operation sequences

use std::collections::BTreeMap;

use atlasdb::index::{BTree, IndexKey};
use proptest::prelude::*;

fn key(n: i64) -> IndexKey {
    IndexKey::from(n)
}

fn tree_of(t: usize, keys: &[i64]) -> BTree<i64> {
    let mut tree = BTree::with_min_degree(t).unwrap();
    for &k in keys {
        tree.insert(key(k), k);
    }
    tree
}

fn as_numbers(keys: &[IndexKey]) -> Vec<i64> {
    keys.iter()
        .map(|k| match k {
            IndexKey::Number(n) => *n as i64,
            IndexKey::Text(s) => panic!("unexpected text key {s}"),
        })
        .collect()
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_new_tree_is_empty() {
    let tree: BTree<String> = BTree::new();
    assert!(tree.is_empty());
    assert_eq!(tree.len(), 0);
    assert_eq!(tree.height(), 1);
    assert!(tree.search(&key(1)).is_none());
    assert!(tree.check_invariants().is_ok());
}

#[test]
fn test_rejects_min_degree_below_two() {
    assert!(BTree::<i64>::with_min_degree(1).is_err());
    assert!(BTree::<i64>::with_min_degree(0).is_err());
}

#[test]
fn test_insert_and_search() {
    let tree = tree_of(3, &[10, 20, 5, 6, 12, 30, 7, 17]);

    assert_eq!(tree.len(), 8);
    assert_eq!(tree.get(&key(12)), Some(&12));
    assert_eq!(tree.get(&key(17)), Some(&17));
    assert!(tree.get(&key(13)).is_none());
    assert!(tree.check_invariants().is_ok());
}

#[test]
fn test_keys_come_out_sorted() {
    let tree = tree_of(2, &[50, 3, 99, 14, 27, 1, 76, 8, 64, 33]);
    assert_eq!(
        as_numbers(&tree.keys()),
        vec![1, 3, 8, 14, 27, 33, 50, 64, 76, 99]
    );
}

#[test]
fn test_text_keys_follow_numbers() {
    let mut tree = BTree::new();
    for raw in ["pear", "10", "apple", "2", "fig"] {
        tree.insert(IndexKey::parse(raw), raw.to_string());
    }

    let values: Vec<&String> = tree.values();
    assert_eq!(values, vec!["2", "10", "apple", "fig", "pear"]);
}

#[test]
fn test_sequential_inserts_grow_height_logarithmically() {
    let keys: Vec<i64> = (0..1_000).collect();
    let tree = tree_of(3, &keys);

    assert!(tree.check_invariants().is_ok());
    // t = 3 holds at least 2 keys per non-root node
    assert!(tree.height() <= 7);
}

// =============================================================================
// Duplicate Key Tests
// =============================================================================

#[test]
fn test_duplicates_are_all_kept() {
    let tree = tree_of(2, &[5, 5, 5, 1, 5, 9, 5]);

    assert_eq!(tree.len(), 7);
    assert_eq!(tree.find_in_range(&key(5), &key(5)).len(), 5);
    assert!(tree.check_invariants().is_ok());
}

#[test]
fn test_delete_removes_one_duplicate() {
    let mut tree = tree_of(2, &[4, 4, 4]);

    assert_eq!(tree.delete(&key(4)), Some(4));
    assert_eq!(tree.len(), 2);
    assert!(tree.contains_key(&key(4)));
    assert!(tree.check_invariants().is_ok());
}

// =============================================================================
// Deletion Tests
// =============================================================================

#[test]
fn test_delete_missing_key_is_noop() {
    let mut tree = tree_of(3, &[1, 2, 3, 4, 5, 6, 7, 8, 9]);
    let before = tree.keys();

    assert!(tree.delete(&key(42)).is_none());
    assert_eq!(tree.keys(), before);
    assert!(tree.check_invariants().is_ok());
}

#[test]
fn test_delete_everything_in_mixed_order() {
    let keys: Vec<i64> = (0..200).map(|i| (i * 37) % 200).collect();
    let mut tree = tree_of(3, &keys);

    for k in (0..200).rev().step_by(2).chain((0..200).step_by(2)) {
        assert_eq!(tree.delete(&key(k)), Some(k), "deleting {k}");
        tree.check_invariants().unwrap();
    }
    assert!(tree.is_empty());
    assert_eq!(tree.height(), 1);
}

// =============================================================================
// Range Tests
// =============================================================================

#[test]
fn test_range_is_inclusive() {
    let tree = tree_of(3, &(1..=50).collect::<Vec<_>>());
    let found: Vec<i64> = tree
        .find_in_range(&key(10), &key(15))
        .into_iter()
        .map(|(_, v)| *v)
        .collect();
    assert_eq!(found, vec![10, 11, 12, 13, 14, 15]);
}

#[test]
fn test_range_with_low_above_high_is_empty() {
    let tree = tree_of(3, &[1, 2, 3]);
    assert!(tree.find_in_range(&key(3), &key(1)).is_empty());
}

#[test]
fn test_range_outside_keys_is_empty() {
    let tree = tree_of(3, &[10, 20, 30]);
    assert!(tree.find_in_range(&key(31), &key(100)).is_empty());
    assert!(tree.find_in_range(&key(-5), &key(9)).is_empty());
}

// =============================================================================
// Property Tests
// =============================================================================

#[derive(Debug, Clone)]
enum Op {
    Insert(i64),
    Delete(i64),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0i64..60).prop_map(Op::Insert),
        2 => (0i64..60).prop_map(Op::Delete),
    ]
}

proptest! {
    #[test]
    fn prop_matches_multiset_model(
        t in 2usize..5,
        ops in prop::collection::vec(op_strategy(), 0..300),
    ) {
        let mut tree = BTree::with_min_degree(t).unwrap();
        let mut model: BTreeMap<i64, usize> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(k) => {
                    tree.insert(key(k), k);
                    *model.entry(k).or_insert(0) += 1;
                }
                Op::Delete(k) => {
                    let removed = tree.delete(&key(k));
                    match model.get_mut(&k) {
                        Some(count) => {
                            prop_assert_eq!(removed, Some(k));
                            *count -= 1;
                            if *count == 0 {
                                model.remove(&k);
                            }
                        }
                        None => prop_assert!(removed.is_none()),
                    }
                }
            }
            prop_assert!(tree.check_invariants().is_ok());
        }

        let expected: Vec<i64> = model
            .iter()
            .flat_map(|(&k, &count)| std::iter::repeat(k).take(count))
            .collect();
        prop_assert_eq!(as_numbers(&tree.keys()), expected);
    }

    #[test]
    fn prop_range_matches_filter(
        keys in prop::collection::vec(-100i64..100, 0..200),
        low in -120i64..120,
        high in -120i64..120,
    ) {
        let tree = tree_of(3, &keys);

        let mut expected: Vec<i64> = keys
            .iter()
            .copied()
            .filter(|k| *k >= low && *k <= high)
            .collect();
        expected.sort_unstable();

        let found: Vec<i64> = tree
            .find_in_range(&key(low), &key(high))
            .into_iter()
            .map(|(_, v)| *v)
            .collect();
        prop_assert_eq!(found, expected);
    }
}
