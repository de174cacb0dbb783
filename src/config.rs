//! Configuration for AtlasDB
//!
//! Centralized configuration with sensible defaults.

use std::time::Duration;

use crate::error::{AtlasError, Result};

/// Main configuration for an AtlasDB instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Index Configuration
    // -------------------------------------------------------------------------
    /// Minimum degree `t` of every B-Tree index.
    /// Nodes hold between `t - 1` and `2t - 1` keys (the root may hold fewer).
    pub min_degree: usize,

    // -------------------------------------------------------------------------
    // Cache Configuration
    // -------------------------------------------------------------------------
    /// Number of entries the record/query cache holds before evicting
    pub cache_capacity: usize,

    /// Treat cached findAll/findInRange results as misses once any
    /// create/update/delete has happened since they were cached
    pub invalidate_query_cache_on_write: bool,

    // -------------------------------------------------------------------------
    // Lock Configuration
    // -------------------------------------------------------------------------
    /// Longest a lock waiter sleeps before re-checking the key
    pub lock_poll_interval: Duration,

    // -------------------------------------------------------------------------
    // Expiring KV Configuration
    // -------------------------------------------------------------------------
    /// Capacity of the expiring key-value store
    pub kv_capacity: usize,

    /// Time-to-live applied when a set does not carry one
    pub kv_default_ttl: Duration,

    /// How often the background sweeper looks for expired entries
    pub kv_sweep_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_degree: 3,
            cache_capacity: 100,
            invalidate_query_cache_on_write: false,
            lock_poll_interval: Duration::from_millis(10),
            kv_capacity: 10,
            kv_default_ttl: Duration::from_secs(10),
            kv_sweep_interval: Duration::from_secs(1),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject values the data structures cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.min_degree < 2 {
            return Err(AtlasError::Config(format!(
                "min_degree must be at least 2, got {}",
                self.min_degree
            )));
        }
        if self.cache_capacity == 0 {
            return Err(AtlasError::Config("cache_capacity must be non-zero".to_string()));
        }
        if self.kv_capacity == 0 {
            return Err(AtlasError::Config("kv_capacity must be non-zero".to_string()));
        }
        if self.lock_poll_interval.is_zero() {
            return Err(AtlasError::Config(
                "lock_poll_interval must be non-zero".to_string(),
            ));
        }
        if self.kv_sweep_interval.is_zero() {
            return Err(AtlasError::Config(
                "kv_sweep_interval must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the B-Tree minimum degree
    pub fn min_degree(mut self, t: usize) -> Self {
        self.config.min_degree = t;
        self
    }

    /// Set the cache capacity (entries)
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.config.cache_capacity = capacity;
        self
    }

    /// Enable or disable query-cache invalidation on writes
    pub fn invalidate_query_cache_on_write(mut self, enabled: bool) -> Self {
        self.config.invalidate_query_cache_on_write = enabled;
        self
    }

    /// Set the lock poll interval
    pub fn lock_poll_interval(mut self, interval: Duration) -> Self {
        self.config.lock_poll_interval = interval;
        self
    }

    /// Set the expiring store capacity
    pub fn kv_capacity(mut self, capacity: usize) -> Self {
        self.config.kv_capacity = capacity;
        self
    }

    /// Set the default time-to-live for the expiring store
    pub fn kv_default_ttl(mut self, ttl: Duration) -> Self {
        self.config.kv_default_ttl = ttl;
        self
    }

    /// Set the sweep interval for the expiring store
    pub fn kv_sweep_interval(mut self, interval: Duration) -> Self {
        self.config.kv_sweep_interval = interval;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
