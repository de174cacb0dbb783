//! Database façade
//!
//! Composes the primary record map, the LRU cache, the per-key lock
//! manager and the secondary indexes into CRUD, index and range-query
//! operations.
//!
//! ## Responsibilities
//! - Primary map is the single source of truth
//! - Cache records on create, keep cached records in step with update/delete
//! - Keep the identifier index in step with every mutation
//! - Serve equality and range queries from indexes when one exists
//!
//! ## Query Cache
//! `find_all` and `find_in_range` cache their result lists under a key
//! derived from the query. Those entries are NOT invalidated by later
//! writes unless `Config::invalidate_query_cache_on_write` is set, so by
//! default a repeated query can return a stale list.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use uuid::Uuid;

use crate::cache::BoundedCache;
use crate::config::Config;
use crate::error::{AtlasError, Result};
use crate::index::{IndexKey, OrderedIndex};
use crate::lock::{KeyLockManager, LockMode};

use super::query::{FindOptions, RangeQuery, Where};
use super::record::{Fields, Record, ID_FIELD};
use super::response::Ack;

/// Shared handle to one secondary index
pub type IndexHandle = Arc<RwLock<OrderedIndex>>;

/// What the cache holds: single records under their id, query results
/// under their query key
#[derive(Debug, Clone)]
pub enum CachedValue {
    Record(Record),

    /// Result list tagged with the mutation count it was computed at
    Query { version: u64, records: Vec<Record> },
}

/// The storage façade
///
/// ## Concurrency
/// Mutations of one key are serialized by `locks`. The containers below are
/// additionally guarded by their own short-lived locks, always taken in
/// this order when nested:
///
/// `indexes` → `data` → an index handle → `cache`
///
/// `create` holds `indexes` for reading across its whole update so that a
/// concurrent `create_index` sees either all of it or none of it.
pub struct Database {
    config: Config,

    /// Primary map: id -> record
    data: RwLock<HashMap<String, Record>>,

    /// Record and query cache
    cache: Mutex<BoundedCache<String, CachedValue>>,

    /// Field name -> index; always contains the identifier index
    indexes: RwLock<HashMap<String, IndexHandle>>,

    /// Per-key locks around mutations
    locks: KeyLockManager,

    /// Count of successful mutations, used to age query results
    version: AtomicU64,
}

impl Database {
    /// Create an empty database with the given config
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        let id_index = OrderedIndex::with_min_degree(config.min_degree)?;
        let mut indexes = HashMap::new();
        indexes.insert(ID_FIELD.to_string(), Arc::new(RwLock::new(id_index)));

        tracing::debug!(
            min_degree = config.min_degree,
            cache_capacity = config.cache_capacity,
            "database opened"
        );

        Ok(Self {
            cache: Mutex::new(BoundedCache::new(config.cache_capacity)),
            locks: KeyLockManager::new(config.lock_poll_interval),
            data: RwLock::new(HashMap::new()),
            indexes: RwLock::new(indexes),
            version: AtomicU64::new(0),
            config,
        })
    }

    // =========================================================================
    // CRUD
    // =========================================================================

    /// Store a new record under a fresh identifier
    ///
    /// The record is cached, added to the identifier index and to every
    /// other index whose field it carries.
    pub fn create(&self, fields: Fields) -> Record {
        let id = Uuid::new_v4().to_string();
        let _guard = self.locks.acquire(&id, LockMode::Write);
        let record = Record::new(id.clone(), fields);

        {
            let indexes = self.indexes.read();
            self.data.write().insert(id.clone(), record.clone());

            for (field, handle) in indexes.iter() {
                if let Some(key) = record.index_key(field) {
                    handle.write().insert(key, id.clone());
                }
            }
        }

        self.cache_record(&record);
        self.bump_version();

        tracing::debug!(id = %id, "record created");
        record
    }

    /// Fetch a record: cache first, then identifier index, then primary map
    pub fn find_by_id(&self, id: &str) -> Result<Record> {
        let _guard = self.locks.acquire(id, LockMode::Read);

        if let Some(CachedValue::Record(record)) = self.cache.lock().get(id) {
            tracing::trace!(id, "record served from cache");
            return Ok(record.clone());
        }

        let indexed = self.index(ID_FIELD).is_some_and(|handle| {
            let index = handle.read();
            index.contains_key(&IndexKey::parse(id))
        });

        match self.data.read().get(id) {
            Some(record) => {
                tracing::trace!(id, indexed, "record served from primary map");
                Ok(record.clone())
            }
            None => {
                if indexed {
                    tracing::warn!(id, "identifier index points at a missing record");
                }
                tracing::debug!(id, "record not found");
                Err(AtlasError::NotFound(id.to_string()))
            }
        }
    }

    /// Fetch the first record (in identifier order, or index order when
    /// `field` is indexed) whose `field` equals `value`
    pub fn find_by_field(&self, field: &str, value: Value) -> Result<Record> {
        let label = format!("{}={}", field, value);
        let first = self
            .find_all(FindOptions::equals(field, value))?
            .into_iter()
            .next();

        match first {
            Some(record) => self.find_by_id(&record.id),
            None => {
                tracing::debug!(lookup = %label, "no record matches");
                Err(AtlasError::NotFound(label))
            }
        }
    }

    /// Replace the fields of an existing record
    pub fn update_by_id(&self, id: &str, fields: Fields) -> Result<Ack> {
        let _guard = self.locks.acquire(id, LockMode::Write);

        let record = Record::new(id, fields);
        {
            let mut data = self.data.write();
            match data.get_mut(id) {
                Some(slot) => *slot = record.clone(),
                None => {
                    tracing::debug!(id, "update of missing record");
                    return Err(AtlasError::NotFound(id.to_string()));
                }
            }
        }

        {
            let mut cache = self.cache.lock();
            if cache.contains(id) {
                cache.set(id.to_string(), CachedValue::Record(record));
            }
        }

        if let Some(handle) = self.index(ID_FIELD) {
            let key = IndexKey::parse(id);
            let mut index = handle.write();
            if index.delete(&key).is_some() {
                index.insert(key, id.to_string());
            }
        }

        self.bump_version();
        tracing::debug!(id, "record updated");
        Ok(Ack::success(format!("Data updated for {}", id)))
    }

    /// Remove a record from the primary map, the cache and the identifier index
    pub fn delete_by_id(&self, id: &str) -> Result<Ack> {
        let _guard = self.locks.acquire(id, LockMode::Write);

        if self.data.write().remove(id).is_none() {
            tracing::debug!(id, "delete of missing record");
            return Err(AtlasError::NotFound(id.to_string()));
        }

        self.cache.lock().delete(id);

        if let Some(handle) = self.index(ID_FIELD) {
            handle.write().delete(&IndexKey::parse(id));
        }

        self.bump_version();
        tracing::debug!(id, "record deleted");
        Ok(Ack::success(format!("Data deleted for {}", id)))
    }

    // =========================================================================
    // Indexes
    // =========================================================================

    /// Build (or rebuild) the index on `field` from every stored record
    pub fn create_index(&self, field: &str) -> Result<IndexHandle> {
        let _guard = self.locks.acquire(field, LockMode::Write);
        let mut indexes = self.indexes.write();

        let mut index = OrderedIndex::with_min_degree(self.config.min_degree).inspect_err(|e| {
            tracing::error!(field, error = %e, "index construction failed");
        })?;

        let ids = match indexes.get(ID_FIELD) {
            Some(id_index) => Self::ids_in_order(&id_index.read()),
            None => Vec::new(),
        };
        {
            let data = self.data.read();
            for record in ids.iter().filter_map(|id| data.get(id)) {
                if let Some(key) = record.index_key(field) {
                    index.insert(key, record.id.clone());
                }
            }
        }

        let entries = index.len();
        let handle = Arc::new(RwLock::new(index));
        let replaced = indexes
            .insert(field.to_string(), Arc::clone(&handle))
            .is_some();

        tracing::info!(field, entries, replaced, "index created");
        Ok(handle)
    }

    /// The index on `field`, if one exists
    pub fn index(&self, field: &str) -> Option<IndexHandle> {
        self.indexes.read().get(field).cloned()
    }

    pub fn has_index(&self, field: &str) -> bool {
        self.indexes.read().contains_key(field)
    }

    /// Indexed field names, sorted
    pub fn index_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.indexes.read().keys().cloned().collect();
        names.sort();
        names
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Records matching `options.filter`
    ///
    /// An equality filter on an indexed field is answered from that index
    /// (built on demand when `options.index.create` is set). Anything else,
    /// and an index lookup that finds nothing, falls back to a full scan in
    /// identifier order.
    pub fn find_all(&self, options: FindOptions) -> Result<Vec<Record>> {
        let version = self.current_version();
        let cache_key = options.filter.cache_key();

        if let Some(key) = &cache_key {
            if let Some(records) = self.cached_query(key) {
                return Ok(records);
            }
        }

        let mut results = Vec::new();

        let index_field = options
            .index
            .key
            .clone()
            .or_else(|| options.filter.equality_field().map(str::to_string));

        if let Some(field) = index_field {
            let handle = match self.index(&field) {
                Some(handle) => Some(handle),
                None if options.index.create => Some(self.create_index(&field)?),
                None => None,
            };

            if let (Some(handle), Where::Equals { key, value }) = (handle, &options.filter) {
                if *key == field {
                    let probe = IndexKey::from_value(value);
                    results = self.records_in_index_range(&handle, key, &probe, &probe);
                    tracing::debug!(field = %key, hits = results.len(), "equality answered from index");
                }
            }
        }

        if results.is_empty() {
            results = self.scan(|record| options.filter.matches(record));
            tracing::debug!(filter = ?options.filter, hits = results.len(), "full scan");
        }

        if let Some(key) = cache_key {
            self.cache_query(key, version, &results);
        }
        Ok(results)
    }

    /// Records with `query.low <= record[query.key] <= query.high`
    pub fn find_in_range(&self, query: &RangeQuery) -> Result<Vec<Record>> {
        let version = self.current_version();
        let cache_key = query.cache_key();

        if let Some(records) = self.cached_query(&cache_key) {
            return Ok(records);
        }

        let results = match self.index(&query.key) {
            Some(handle) => {
                let records = self.records_in_index_range(
                    &handle,
                    &query.key,
                    &query.low_key(),
                    &query.high_key(),
                );
                tracing::debug!(field = %query.key, hits = records.len(), "range answered from index");
                records
            }
            None => {
                let records = self.scan(|record| query.contains(record));
                tracing::debug!(field = %query.key, hits = records.len(), "range answered by full scan");
                records
            }
        };

        self.cache_query(cache_key, version, &results);
        Ok(results)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Number of cache entries (records and query results)
    pub fn cached_entries(&self) -> usize {
        self.cache.lock().len()
    }

    /// Whether `key` (a record id or query key) is cached; does not touch recency
    pub fn is_cached(&self, key: &str) -> bool {
        self.cache.lock().contains(key)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn current_version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    fn bump_version(&self) {
        self.version.fetch_add(1, Ordering::AcqRel);
    }

    fn cache_record(&self, record: &Record) {
        if let Some((evicted, _)) = self
            .cache
            .lock()
            .set(record.id.clone(), CachedValue::Record(record.clone()))
        {
            tracing::trace!(key = %evicted, "cache eviction");
        }
    }

    fn cached_query(&self, key: &str) -> Option<Vec<Record>> {
        let current = self.current_version();
        let mut cache = self.cache.lock();

        match cache.get(key) {
            Some(CachedValue::Query { version, records }) => {
                if self.config.invalidate_query_cache_on_write && *version != current {
                    tracing::debug!(key, "cached query result is stale");
                    None
                } else {
                    tracing::trace!(key, "query served from cache");
                    Some(records.clone())
                }
            }
            _ => None,
        }
    }

    fn cache_query(&self, key: String, version: u64, records: &[Record]) {
        let value = CachedValue::Query {
            version,
            records: records.to_vec(),
        };
        if let Some((evicted, _)) = self.cache.lock().set(key, value) {
            tracing::trace!(key = %evicted, "cache eviction");
        }
    }

    fn ids_in_order(index: &OrderedIndex) -> Vec<String> {
        index.values().into_iter().cloned().collect()
    }

    /// Every record accepted by `filter`, in identifier order
    fn scan<F>(&self, filter: F) -> Vec<Record>
    where
        F: Fn(&Record) -> bool,
    {
        let ids = match self.index(ID_FIELD) {
            Some(handle) => Self::ids_in_order(&handle.read()),
            None => Vec::new(),
        };

        let data = self.data.read();
        ids.iter()
            .filter_map(|id| data.get(id))
            .filter(|record| filter(record))
            .cloned()
            .collect()
    }

    /// Records the index maps into `[low, high]`, re-checked against the
    /// primary map, which wins when the index is out of date
    fn records_in_index_range(
        &self,
        handle: &IndexHandle,
        field: &str,
        low: &IndexKey,
        high: &IndexKey,
    ) -> Vec<Record> {
        let ids: Vec<String> = handle
            .read()
            .find_in_range(low, high)
            .into_iter()
            .map(|(_, id)| id.clone())
            .collect();

        let data = self.data.read();
        let mut records = Vec::with_capacity(ids.len());
        for id in &ids {
            let Some(record) = data.get(id) else {
                tracing::warn!(field, id = %id, "index entry for a missing record");
                continue;
            };
            let current = record.index_key(field);
            if current.as_ref().is_some_and(|k| k >= low && k <= high) {
                records.push(record.clone());
            }
        }
        records
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("records", &self.len())
            .field("indexes", &self.index_names())
            .field("cached_entries", &self.cached_entries())
            .finish()
    }
}
