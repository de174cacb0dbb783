//! Lock Module
//!
//! Per-key advisory locking for the storage façade.
//!
//! ## Semantics
//! - A write acquisition waits until the key is free, then marks it held
//! - A read acquisition waits until the key is free but does not mark it
//! - Releasing clears the mark unconditionally and wakes the key's waiters
//!
//! So writers exclude writers and readers wait behind an in-progress
//! writer, readers never block each other, and a reader in flight does not
//! block a writer that arrives after it. There is no FIFO ordering among
//! waiters and no timeout: acquisition retries until it succeeds.
//!
//! ## Waiting
//! Each held key owns a condition variable. Waiters park on it and are woken
//! by release; they also re-check every `poll_interval` in case a wakeup
//! raced with their arrival.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

/// How a key is being accessed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// Waits for writers, never marks the key held
    Read,

    /// Exclusive with other writers
    Write,
}

/// State for one key that is held or has waiters
#[derive(Debug)]
struct KeySlot {
    held: bool,
    waiters: usize,
    released: Arc<Condvar>,
}

impl KeySlot {
    fn new() -> Self {
        Self {
            held: false,
            waiters: 0,
            released: Arc::new(Condvar::new()),
        }
    }
}

/// Table of per-key locks
///
/// A key with no slot is free. Slots are created on acquisition and dropped
/// once the key is released with nobody waiting.
#[derive(Debug)]
pub struct KeyLockManager {
    table: Mutex<HashMap<String, KeySlot>>,
    poll_interval: Duration,
}

impl KeyLockManager {
    /// Poll interval used by [`KeyLockManager::default`]
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

    pub fn new(poll_interval: Duration) -> Self {
        Self {
            table: Mutex::new(HashMap::new()),
            poll_interval,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Acquire `key` and return a guard that releases a write lock on drop
    ///
    /// Read guards release nothing: a read never marks the key, so clearing
    /// it on the way out could free a writer's lock.
    pub fn acquire(&self, key: &str, mode: LockMode) -> KeyLockGuard<'_> {
        self.acquire_lock(key, mode == LockMode::Read);
        KeyLockGuard {
            manager: self,
            key: key.to_string(),
            mode,
        }
    }

    /// Block until `key` is not held; mark it held unless `read_only`
    pub fn acquire_lock(&self, key: &str, read_only: bool) {
        let mut table = self.table.lock();
        let mut waited = false;

        loop {
            let released = match table.get_mut(key) {
                Some(slot) if slot.held => {
                    slot.waiters += 1;
                    Arc::clone(&slot.released)
                }
                _ => break,
            };

            waited = true;
            released.wait_for(&mut table, self.poll_interval);

            // The slot cannot vanish while we are counted as a waiter
            if let Some(slot) = table.get_mut(key) {
                slot.waiters -= 1;
            }
        }

        if read_only {
            let idle = table
                .get(key)
                .is_some_and(|slot| !slot.held && slot.waiters == 0);
            if idle {
                table.remove(key);
            }
        } else {
            table
                .entry(key.to_string())
                .or_insert_with(KeySlot::new)
                .held = true;
        }

        if waited {
            tracing::debug!(key, read_only, "lock acquired after waiting");
        } else {
            tracing::trace!(key, read_only, "lock acquired");
        }
    }

    /// Clear the held mark for `key` and wake its waiters
    pub fn release_lock(&self, key: &str) {
        let mut table = self.table.lock();
        if let Some(slot) = table.get_mut(key) {
            slot.held = false;
            if slot.waiters == 0 {
                table.remove(key);
            } else {
                slot.released.notify_all();
            }
        }
        tracing::trace!(key, "lock released");
    }

    /// Whether `key` is currently write-locked
    pub fn is_held(&self, key: &str) -> bool {
        self.table.lock().get(key).is_some_and(|slot| slot.held)
    }

    /// Number of keys currently write-locked
    pub fn held_count(&self) -> usize {
        self.table.lock().values().filter(|slot| slot.held).count()
    }
}

impl Default for KeyLockManager {
    fn default() -> Self {
        Self::new(Self::DEFAULT_POLL_INTERVAL)
    }
}

/// RAII guard for a key lock
///
/// Dropping a write guard releases the key on every exit path, including
/// early returns and unwinding.
#[derive(Debug)]
pub struct KeyLockGuard<'a> {
    manager: &'a KeyLockManager,
    key: String,
    mode: LockMode,
}

impl KeyLockGuard<'_> {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn mode(&self) -> LockMode {
        self.mode
    }
}

impl Drop for KeyLockGuard<'_> {
    fn drop(&mut self) {
        if self.mode == LockMode::Write {
            self.manager.release_lock(&self.key);
        }
    }
}
