//! KV Module
//!
//! A small key -> JSON value store with per-entry time-to-live, layered on
//! the bounded LRU cache.
//!
//! ## Responsibilities
//! - Bounded storage with least-recently-used eviction
//! - Paged listing in recency order
//! - Expiry sweeping, on demand or from a background [`Sweeper`]

mod store;
mod sweeper;

pub use store::{ExpiringStore, ExpiringValue, Page, PageItem};
pub use sweeper::Sweeper;
