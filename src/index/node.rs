//! B-Tree node
//!
//! A node owns its children outright; there are no parent links. Every
//! algorithm walks top-down and passes the parent and child index around
//! explicitly.

use super::key::IndexKey;

/// A single node of the tree
///
/// `keys` and `values` are parallel; an internal node has exactly
/// `keys.len() + 1` children, a leaf has none.
#[derive(Debug, Clone)]
pub(crate) struct Node<V> {
    pub(crate) keys: Vec<IndexKey>,
    pub(crate) values: Vec<V>,
    pub(crate) children: Vec<Node<V>>,
}

impl<V> Node<V> {
    /// Create an empty leaf
    pub(crate) fn new() -> Self {
        Self {
            keys: Vec::new(),
            values: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Build a leaf from parallel keys/values
    #[cfg(test)]
    pub(crate) fn leaf(keys: Vec<IndexKey>, values: Vec<V>) -> Self {
        Self {
            keys,
            values,
            children: Vec::new(),
        }
    }

    /// Build an internal node from parallel keys/values and its children
    #[cfg(test)]
    pub(crate) fn internal(keys: Vec<IndexKey>, values: Vec<V>, children: Vec<Node<V>>) -> Self {
        Self {
            keys,
            values,
            children,
        }
    }

    pub(crate) fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.keys.len()
    }

    /// Index of the first key `>= key`
    pub(crate) fn lower_bound(&self, key: &IndexKey) -> usize {
        self.keys.partition_point(|k| k < key)
    }

    /// Index of the first key `> key`
    pub(crate) fn upper_bound(&self, key: &IndexKey) -> usize {
        self.keys.partition_point(|k| k <= key)
    }
}

impl<V> Default for Node<V> {
    fn default() -> Self {
        Self::new()
    }
}
