//! # AtlasDB
//!
//! An embeddable, in-memory record store with:
//! - B-Tree ordered indexes for equality and range lookups
//! - A bounded LRU cache in front of record and query reads
//! - Per-key read/write locking for concurrent callers
//! - An expiring key-value layer over the same cache
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Database (façade)                       │
//! │        create / find / update / delete / index / range       │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┼────────────┬──────────────┐
//!          │            │            │              │
//!          ▼            ▼            ▼              ▼
//!   ┌────────────┐ ┌──────────┐ ┌──────────┐ ┌────────────┐
//!   │ KeyLock    │ │ Primary  │ │ Bounded  │ │  Ordered   │
//!   │ Manager    │ │ Map      │ │ LRU Cache│ │  Indexes   │
//!   └────────────┘ └──────────┘ └────┬─────┘ │  (B-Tree)  │
//!                                    │       └────────────┘
//!                                    ▼
//!                             ┌─────────────┐
//!                             │ExpiringStore│
//!                             │ + Sweeper   │
//!                             └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod cache;
pub mod db;
pub mod index;
pub mod kv;
pub mod lock;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use cache::BoundedCache;
pub use config::Config;
pub use db::{Database, FindOptions, RangeQuery, Record, Where};
pub use error::{AtlasError, Result};
pub use index::{BTree, IndexKey};
pub use kv::ExpiringStore;
pub use lock::KeyLockManager;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of AtlasDB
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
