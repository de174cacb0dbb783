//! B-Tree implementation
//!
//! Classic minimum-degree B-Tree kept entirely in memory.
//!
//! ## Properties
//! - All leaves have the same depth
//! - A node holds at most `2t - 1` keys
//! - A non-root node holds at least `t - 1` keys
//! - Keys in `children[i]` are `<= keys[i]`, keys in `children[i + 1]` are `>= keys[i]`
//!
//! Insertion splits full nodes on the way down, so it never has to walk
//! back up. Deletion does the mirror image: before descending into a child
//! holding only `t - 1` keys it borrows a key from a sibling or merges
//! with one, so the key can always be removed from the node it is found in.
//!
//! The tree is not internally synchronized. Callers that share one across
//! threads wrap it in a lock.

use std::mem;

use crate::error::{AtlasError, Result};

use super::key::IndexKey;
use super::node::Node;

/// An ordered mapping from [`IndexKey`] to `V`
///
/// Duplicate keys are not rejected: inserting an existing key stores a
/// second entry next to the first. Callers that want replace semantics
/// delete first.
#[derive(Debug, Clone)]
pub struct BTree<V> {
    root: Node<V>,
    min_degree: usize,
    len: usize,
}

impl<V> BTree<V> {
    /// Minimum degree used by [`BTree::new`]
    pub const DEFAULT_MIN_DEGREE: usize = 3;

    /// Create an empty tree with the default minimum degree
    pub fn new() -> Self {
        Self {
            root: Node::new(),
            min_degree: Self::DEFAULT_MIN_DEGREE,
            len: 0,
        }
    }

    /// Create an empty tree with minimum degree `t` (fixed for its lifetime)
    pub fn with_min_degree(t: usize) -> Result<Self> {
        if t < 2 {
            return Err(AtlasError::Config(format!(
                "B-Tree minimum degree must be at least 2, got {}",
                t
            )));
        }
        Ok(Self {
            root: Node::new(),
            min_degree: t,
            len: 0,
        })
    }

    /// Build a tree around a prepared root, e.g. a hand-laid-out fixture
    #[cfg(test)]
    pub(crate) fn from_root(t: usize, root: Node<V>) -> Self {
        let mut tree = Self {
            root,
            min_degree: t,
            len: 0,
        };
        tree.len = tree.iter().count();
        tree
    }

    pub fn min_degree(&self) -> usize {
        self.min_degree
    }

    /// Number of entries stored
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of levels (an empty tree has height 1)
    pub fn height(&self) -> usize {
        let mut height = 1;
        let mut node = &self.root;
        while let Some(first) = node.children.first() {
            height += 1;
            node = first;
        }
        height
    }

    pub fn clear(&mut self) {
        self.root = Node::new();
        self.len = 0;
    }

    fn max_keys(&self) -> usize {
        2 * self.min_degree - 1
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// Find the entry stored under `key`
    pub fn search(&self, key: &IndexKey) -> Option<(&IndexKey, &V)> {
        let mut node = &self.root;
        loop {
            let i = node.lower_bound(key);
            if i < node.len() && node.keys[i] == *key {
                return Some((&node.keys[i], &node.values[i]));
            }
            if node.is_leaf() {
                return None;
            }
            node = &node.children[i];
        }
    }

    pub fn get(&self, key: &IndexKey) -> Option<&V> {
        self.search(key).map(|(_, value)| value)
    }

    pub fn contains_key(&self, key: &IndexKey) -> bool {
        self.search(key).is_some()
    }

    // =========================================================================
    // Insertion
    // =========================================================================

    /// Insert `key -> value`
    ///
    /// A full root is split first, which is the only way the tree grows
    /// taller.
    pub fn insert(&mut self, key: IndexKey, value: V) {
        let t = self.min_degree;
        if self.root.len() == self.max_keys() {
            let old_root = mem::take(&mut self.root);
            self.root.children.push(old_root);
            Self::split_child(&mut self.root, 0, t);
        }
        Self::insert_non_full(&mut self.root, key, value, t);
        self.len += 1;
    }

    fn insert_non_full(node: &mut Node<V>, key: IndexKey, value: V, t: usize) {
        // Equal keys go after existing ones
        let mut i = node.upper_bound(&key);

        if node.is_leaf() {
            node.keys.insert(i, key);
            node.values.insert(i, value);
            return;
        }

        if node.children[i].len() == 2 * t - 1 {
            Self::split_child(node, i, t);
            if key >= node.keys[i] {
                i += 1;
            }
        }
        Self::insert_non_full(&mut node.children[i], key, value, t);
    }

    /// Split the full child `parent.children[index]`
    ///
    /// The median moves up into `parent` at `index`; the upper half becomes
    /// a new right sibling at `index + 1`.
    fn split_child(parent: &mut Node<V>, index: usize, t: usize) {
        let child = &mut parent.children[index];
        debug_assert_eq!(child.len(), 2 * t - 1, "split_child on a non-full node");

        let right_keys = child.keys.split_off(t);
        let right_values = child.values.split_off(t);
        let right_children = if child.is_leaf() {
            Vec::new()
        } else {
            child.children.split_off(t)
        };
        let median_key = child.keys.remove(t - 1);
        let median_value = child.values.remove(t - 1);

        parent.keys.insert(index, median_key);
        parent.values.insert(index, median_value);
        parent.children.insert(
            index + 1,
            Node {
                keys: right_keys,
                values: right_values,
                children: right_children,
            },
        );
    }

    // =========================================================================
    // Deletion
    // =========================================================================

    /// Remove the entry stored under `key`, returning its value
    ///
    /// Deleting an absent key leaves the tree untouched apart from the
    /// rebalancing done on the way down, which preserves every invariant.
    pub fn delete(&mut self, key: &IndexKey) -> Option<V> {
        let t = self.min_degree;
        let removed = Self::delete_from(&mut self.root, key, t);

        // A merge at the root can leave it keyless with a single child
        if self.root.keys.is_empty() && !self.root.is_leaf() {
            self.root = self.root.children.remove(0);
        }

        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }

    fn delete_from(node: &mut Node<V>, key: &IndexKey, t: usize) -> Option<V> {
        let i = node.lower_bound(key);

        if i < node.len() && node.keys[i] == *key {
            return Some(Self::remove_at(node, i, t));
        }
        if node.is_leaf() {
            return None;
        }

        let i = Self::fill_child(node, i, t);
        Self::delete_from(&mut node.children[i], key, t)
    }

    /// Remove `node.keys[index]`, returning its value
    fn remove_at(node: &mut Node<V>, index: usize, t: usize) -> V {
        if node.is_leaf() {
            node.keys.remove(index);
            return node.values.remove(index);
        }

        if node.children[index].len() >= t {
            // Replace with the in-order predecessor
            let (key, value) = Self::pop_max(&mut node.children[index], t);
            node.keys[index] = key;
            mem::replace(&mut node.values[index], value)
        } else if node.children[index + 1].len() >= t {
            // Replace with the in-order successor
            let (key, value) = Self::pop_min(&mut node.children[index + 1], t);
            node.keys[index] = key;
            mem::replace(&mut node.values[index], value)
        } else {
            // Both neighbours are minimal: pull the key down into a merge
            let position = node.children[index].len();
            Self::merge_children(node, index);
            Self::remove_at(&mut node.children[index], position, t)
        }
    }

    /// Remove and return the largest entry under `node` (which has `>= t` keys)
    fn pop_max(node: &mut Node<V>, t: usize) -> (IndexKey, V) {
        if node.is_leaf() {
            debug_assert!(!node.keys.is_empty(), "pop_max on an empty leaf");
            let last = node.len() - 1;
            return (node.keys.remove(last), node.values.remove(last));
        }
        let last = node.children.len() - 1;
        let i = Self::fill_child(node, last, t);
        Self::pop_max(&mut node.children[i], t)
    }

    /// Remove and return the smallest entry under `node` (which has `>= t` keys)
    fn pop_min(node: &mut Node<V>, t: usize) -> (IndexKey, V) {
        if node.is_leaf() {
            debug_assert!(!node.keys.is_empty(), "pop_min on an empty leaf");
            return (node.keys.remove(0), node.values.remove(0));
        }
        let i = Self::fill_child(node, 0, t);
        Self::pop_min(&mut node.children[i], t)
    }

    /// Make sure `node.children[index]` has at least `t` keys before we
    /// descend into it. Returns the index of the child to descend into,
    /// which moves left by one when the child is merged into its left
    /// sibling.
    fn fill_child(node: &mut Node<V>, index: usize, t: usize) -> usize {
        if node.children[index].len() >= t {
            return index;
        }

        let has_left = index > 0;
        let has_right = index + 1 < node.children.len();

        if has_left && node.children[index - 1].len() >= t {
            Self::borrow_from_left(node, index);
            index
        } else if has_right && node.children[index + 1].len() >= t {
            Self::borrow_from_right(node, index);
            index
        } else if has_right {
            Self::merge_children(node, index);
            index
        } else {
            Self::merge_children(node, index - 1);
            index - 1
        }
    }

    /// Rotate the left sibling's last key up through the parent into `children[index]`
    fn borrow_from_left(node: &mut Node<V>, index: usize) {
        let (before, after) = node.children.split_at_mut(index);
        let left = &mut before[index - 1];
        let child = &mut after[0];

        let last = left.len() - 1;
        let key = left.keys.remove(last);
        let value = left.values.remove(last);

        let separator_key = mem::replace(&mut node.keys[index - 1], key);
        let separator_value = mem::replace(&mut node.values[index - 1], value);
        child.keys.insert(0, separator_key);
        child.values.insert(0, separator_value);

        if let Some(grandchild) = left.children.pop() {
            child.children.insert(0, grandchild);
        }
    }

    /// Rotate the right sibling's first key up through the parent into `children[index]`
    fn borrow_from_right(node: &mut Node<V>, index: usize) {
        let (before, after) = node.children.split_at_mut(index + 1);
        let child = &mut before[index];
        let right = &mut after[0];

        let key = right.keys.remove(0);
        let value = right.values.remove(0);

        let separator_key = mem::replace(&mut node.keys[index], key);
        let separator_value = mem::replace(&mut node.values[index], value);
        child.keys.push(separator_key);
        child.values.push(separator_value);

        if !right.children.is_empty() {
            child.children.push(right.children.remove(0));
        }
    }

    /// Fold `children[index + 1]` and the separating key into `children[index]`
    fn merge_children(node: &mut Node<V>, index: usize) {
        let right = node.children.remove(index + 1);
        let separator_key = node.keys.remove(index);
        let separator_value = node.values.remove(index);

        let left = &mut node.children[index];
        left.keys.push(separator_key);
        left.values.push(separator_value);
        left.keys.extend(right.keys);
        left.values.extend(right.values);
        left.children.extend(right.children);
    }

    // =========================================================================
    // Traversal
    // =========================================================================

    /// In-order iterator over all entries
    pub fn iter(&self) -> Iter<'_, V> {
        let mut iter = Iter { stack: Vec::new() };
        iter.descend_left(&self.root);
        iter
    }

    /// All keys in order
    pub fn keys(&self) -> Vec<IndexKey> {
        self.iter().map(|(key, _)| key.clone()).collect()
    }

    /// All values in key order
    pub fn values(&self) -> Vec<&V> {
        self.iter().map(|(_, value)| value).collect()
    }

    /// Every entry with `low <= key <= high`, in key order
    ///
    /// Subtrees that cannot overlap the range are skipped.
    pub fn find_in_range(&self, low: &IndexKey, high: &IndexKey) -> Vec<(&IndexKey, &V)> {
        let mut out = Vec::new();
        Self::collect_range(&self.root, low, high, &mut out);
        out
    }

    fn collect_range<'a>(
        node: &'a Node<V>,
        low: &IndexKey,
        high: &IndexKey,
        out: &mut Vec<(&'a IndexKey, &'a V)>,
    ) {
        for (i, key) in node.keys.iter().enumerate() {
            // children[i] only holds keys <= key
            if !node.is_leaf() && key >= low {
                Self::collect_range(&node.children[i], low, high, out);
            }
            if key > high {
                return;
            }
            if key >= low {
                out.push((key, &node.values[i]));
            }
        }
        if let Some(last) = node.children.last() {
            Self::collect_range(last, low, high, out);
        }
    }

    /// Keys grouped per node, level by level from the root
    pub fn levels(&self) -> Vec<Vec<Vec<IndexKey>>> {
        let mut levels = Vec::new();
        let mut current = vec![&self.root];
        while !current.is_empty() {
            levels.push(current.iter().map(|node| node.keys.clone()).collect());
            current = current
                .iter()
                .flat_map(|&node| node.children.iter())
                .collect();
        }
        levels
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Walk the whole tree and verify every structural invariant
    pub fn check_invariants(&self) -> Result<()> {
        let mut leaf_depth = None;
        let count = self.check_node(&self.root, 0, None, None, &mut leaf_depth)?;
        if count != self.len {
            return Err(AtlasError::InvariantViolation(format!(
                "tree holds {} entries but len is {}",
                count, self.len
            )));
        }
        Ok(())
    }

    fn check_node(
        &self,
        node: &Node<V>,
        depth: usize,
        lower: Option<&IndexKey>,
        upper: Option<&IndexKey>,
        leaf_depth: &mut Option<usize>,
    ) -> Result<usize> {
        let violation = |msg: String| Err(AtlasError::InvariantViolation(msg));
        let t = self.min_degree;

        if node.keys.len() != node.values.len() {
            return violation(format!(
                "node at depth {} has {} keys but {} values",
                depth,
                node.keys.len(),
                node.values.len()
            ));
        }
        if node.len() > 2 * t - 1 {
            return violation(format!("node at depth {} is overfull ({} keys)", depth, node.len()));
        }
        if depth > 0 && node.len() < t - 1 {
            return violation(format!("node at depth {} is underfull ({} keys)", depth, node.len()));
        }
        if node.keys.windows(2).any(|pair| pair[0] > pair[1]) {
            return violation(format!("keys out of order at depth {}", depth));
        }
        for key in &node.keys {
            if lower.is_some_and(|bound| key < bound) || upper.is_some_and(|bound| key > bound) {
                return violation(format!("key {} escapes its subtree bounds", key));
            }
        }

        if node.is_leaf() {
            match *leaf_depth {
                None => *leaf_depth = Some(depth),
                Some(expected) if expected != depth => {
                    return violation(format!(
                        "leaves at depths {} and {}",
                        expected, depth
                    ));
                }
                Some(_) => {}
            }
            return Ok(node.len());
        }

        if node.children.len() != node.len() + 1 {
            return violation(format!(
                "internal node at depth {} has {} keys but {} children",
                depth,
                node.len(),
                node.children.len()
            ));
        }

        let mut count = node.len();
        for (i, child) in node.children.iter().enumerate() {
            let child_lower = if i == 0 { lower } else { Some(&node.keys[i - 1]) };
            let child_upper = if i == node.len() { upper } else { Some(&node.keys[i]) };
            count += self.check_node(child, depth + 1, child_lower, child_upper, leaf_depth)?;
        }
        Ok(count)
    }
}

impl<V> Default for BTree<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// In-order iterator over a [`BTree`]
pub struct Iter<'a, V> {
    /// Path from the root: each node with the index of its next key to yield
    stack: Vec<(&'a Node<V>, usize)>,
}

impl<'a, V> Iter<'a, V> {
    fn descend_left(&mut self, mut node: &'a Node<V>) {
        loop {
            self.stack.push((node, 0));
            match node.children.first() {
                Some(first) => node = first,
                None => break,
            }
        }
    }
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a IndexKey, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (node, i) = {
                let top = self.stack.last_mut()?;
                let position = top.1;
                top.1 += 1;
                (top.0, position)
            };

            if i < node.len() {
                if !node.is_leaf() {
                    self.descend_left(&node.children[i + 1]);
                }
                return Some((&node.keys[i], &node.values[i]));
            }
            self.stack.pop();
        }
    }
}
