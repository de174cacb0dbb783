//! Cache Module
//!
//! Bounded recency cache used in front of the primary record map.
//!
//! ## Responsibilities
//! - O(1) lookup, promotion, insertion and eviction
//! - Stable entry handles so the lookup table never aliases list storage
//!
//! ## Data Structure Choice
//! A `HashMap<K, EntryId>` plus a doubly linked list stored in a slot arena.
//! The table and the list refer to entries by index, never by pointer.

mod list;
mod lru;

pub use list::{EntryId, Iter, RecencyList};
pub use lru::BoundedCache;
