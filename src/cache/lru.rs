//! Bounded LRU cache
//!
//! A key -> [`EntryId`] table in front of a [`RecencyList`]. Every hit
//! promotes the entry to the head; inserting past capacity evicts the tail.
//! All operations are O(1).

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use super::list::{EntryId, Iter, RecencyList};

/// Fixed-capacity least-recently-used cache
///
/// Not internally synchronized; shared owners wrap it in a mutex. Note that
/// [`BoundedCache::get`] mutates recency order and therefore needs `&mut self`.
#[derive(Debug)]
pub struct BoundedCache<K, V> {
    table: HashMap<K, EntryId>,
    list: RecencyList<K, V>,
    capacity: usize,
}

impl<K, V> BoundedCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Capacity used by [`BoundedCache::default`]
    pub const DEFAULT_CAPACITY: usize = 100;

    pub fn new(capacity: usize) -> Self {
        Self {
            table: HashMap::with_capacity(capacity),
            list: RecencyList::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Whether `key` is cached (does not touch recency)
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.table.contains_key(key)
    }

    /// Look up `key`, promoting it to most recently used on a hit
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let id = *self.table.get(key)?;
        self.list.move_to_front(id);
        self.list.get(id).map(|(_, value)| value)
    }

    /// Look up `key` without changing recency order
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let id = *self.table.get(key)?;
        self.list.get(id).map(|(_, value)| value)
    }

    /// Store `key -> value` as most recently used
    ///
    /// An existing entry for `key` is replaced outright. Returns the entry
    /// evicted to stay within capacity, if any.
    pub fn set(&mut self, key: K, value: V) -> Option<(K, V)> {
        if let Some(old) = self.table.remove(&key) {
            self.list.remove(old);
        }

        let id = self.list.push_front(key.clone(), value);
        self.table.insert(key, id);

        // Inserting grows the table by at most one, so one eviction suffices
        if self.table.len() > self.capacity {
            if let Some((evicted_key, evicted_value)) = self.list.pop_back() {
                self.table.remove(&evicted_key);
                return Some((evicted_key, evicted_value));
            }
        }
        None
    }

    /// Remove `key`; returns whether it was present
    pub fn delete<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        match self.table.remove(key) {
            Some(id) => {
                self.list.remove(id);
                true
            }
            None => false,
        }
    }

    /// Entries from most to least recently used (does not touch recency)
    pub fn iter(&self) -> Iter<'_, K, V> {
        self.list.iter()
    }

    /// Keys from most to least recently used
    pub fn keys(&self) -> Vec<K> {
        self.list.iter().map(|(key, _)| key.clone()).collect()
    }

    /// Remove every entry for which `expired` returns true
    pub fn retain_where<F>(&mut self, mut expired: F) -> Vec<K>
    where
        F: FnMut(&K, &V) -> bool,
    {
        let doomed: Vec<K> = self
            .list
            .iter()
            .filter(|(key, value)| expired(*key, *value))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &doomed {
            self.delete(key);
        }
        doomed
    }

    pub fn clear(&mut self) {
        self.table.clear();
        self.list.clear();
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        self.list.debug_validate_invariants();
        assert_eq!(self.table.len(), self.list.len());
        assert!(self.table.len() <= self.capacity.max(1));
        for (key, id) in &self.table {
            let (stored, _) = self.list.get(*id).expect("table points at a freed entry");
            assert!(stored == key, "table and list disagree on a key");
        }
    }
}

impl<K, V> Default for BoundedCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
