//! Index Module
//!
//! Ordered indexes over record fields.
//!
//! ## Responsibilities
//! - Total key ordering across numeric and textual keys
//! - Point search, in-order traversal and range scans
//! - Balanced insertion (node splitting) and deletion (borrow / merge)
//!
//! ## Data Structure Choice
//! A minimum-degree B-Tree kept in memory. Nodes own their children
//! directly, so there are no parent pointers and no shared ownership.

mod btree;
mod key;
mod node;

pub use btree::{BTree, Iter};
pub use key::{compare_keys, IndexKey};

/// Secondary index: field value -> record identifier
pub type OrderedIndex = BTree<String>;
