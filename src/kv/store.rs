//! Expiring store
//!
//! Entries carry their creation time on two clocks: a wall-clock stamp for
//! display and a monotonic [`Instant`] for expiry decisions.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;

use crate::cache::BoundedCache;
use crate::config::Config;
use crate::error::{AtlasError, Result};

// =============================================================================
// Stored Entries
// =============================================================================

/// A value together with its expiry bookkeeping
#[derive(Debug, Clone)]
pub struct ExpiringValue {
    pub value: Value,
    pub created_at: SystemTime,
    pub ttl: Duration,
    inserted: Instant,
}

impl ExpiringValue {
    fn new(value: Value, ttl: Duration) -> Self {
        Self {
            value,
            created_at: SystemTime::now(),
            ttl,
            inserted: Instant::now(),
        }
    }

    /// Whether `created_at + ttl` has passed as of `now`
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.inserted) >= self.ttl
    }

    fn created_at_millis(&self) -> u64 {
        self.created_at
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// One row of a [`Page`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageItem {
    pub key: String,
    pub value: Value,
    /// Creation time in unix milliseconds
    pub created_at: u64,
    /// Time-to-live in seconds
    pub ttl: f64,
}

/// A slice of the store in recency order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub items: Vec<PageItem>,
    pub page: usize,
    pub limit: usize,
}

// =============================================================================
// Expiring Store
// =============================================================================

/// Bounded key-value store whose entries expire
#[derive(Debug)]
pub struct ExpiringStore {
    cache: Mutex<BoundedCache<String, ExpiringValue>>,
    default_ttl: Duration,
}

impl ExpiringStore {
    pub fn new(capacity: usize, default_ttl: Duration) -> Self {
        Self {
            cache: Mutex::new(BoundedCache::new(capacity)),
            default_ttl,
        }
    }

    /// Build from the `kv_*` settings of `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config.kv_capacity, config.kv_default_ttl))
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.lock().is_empty()
    }

    /// Store `value` under `key`, expiring after `ttl` (or the default)
    ///
    /// Returns the key evicted to make room, if any.
    pub fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<Option<String>> {
        if key.is_empty() || value.is_null() {
            return Err(AtlasError::InvalidArgument("Key or Value missing".to_string()));
        }

        let ttl = ttl.filter(|ttl| !ttl.is_zero()).unwrap_or(self.default_ttl);
        let evicted = self
            .cache
            .lock()
            .set(key.to_string(), ExpiringValue::new(value, ttl))
            .map(|(evicted, _)| evicted);

        tracing::debug!(key, ttl_ms = ttl.as_millis() as u64, evicted = ?evicted, "kv set");
        Ok(evicted)
    }

    /// Read `key`, marking it most recently used
    pub fn get(&self, key: &str) -> Option<Value> {
        self.cache.lock().get(key).map(|entry| entry.value.clone())
    }

    /// Full entry for `key`, marking it most recently used
    pub fn entry(&self, key: &str) -> Option<ExpiringValue> {
        self.cache.lock().get(key).cloned()
    }

    pub fn delete(&self, key: &str) -> bool {
        self.cache.lock().delete(key)
    }

    /// 1-based page of entries, most recently used first
    pub fn page(&self, page: usize, limit: usize) -> Page {
        let page = page.max(1);
        let cache = self.cache.lock();
        let items = cache
            .iter()
            .skip((page - 1).saturating_mul(limit))
            .take(limit)
            .map(|(key, entry)| PageItem {
                key: key.clone(),
                value: entry.value.clone(),
                created_at: entry.created_at_millis(),
                ttl: entry.ttl.as_secs_f64(),
            })
            .collect();

        Page { items, page, limit }
    }

    /// Remove every expired entry; returns the removed keys
    pub fn sweep(&self) -> Vec<String> {
        self.sweep_at(Instant::now())
    }

    /// [`ExpiringStore::sweep`] against an explicit clock reading
    pub fn sweep_at(&self, now: Instant) -> Vec<String> {
        let removed = self
            .cache
            .lock()
            .retain_where(|_, entry| entry.is_expired_at(now));

        for key in &removed {
            tracing::info!(key = %key, "Deleted due to expiration");
        }
        removed
    }
}
