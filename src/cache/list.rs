//! Recency list
//!
//! Doubly linked list whose entries live in a slot arena and link to each
//! other by [`EntryId`]. Handles stay valid until the entry is removed, so
//! a lookup table can point straight at an entry and unlink it in O(1)
//! without any shared ownership between table and list.
//!
//! ```text
//!   slots: [ Some(A) | None | Some(C) | Some(B) ]     free: [1]
//!
//!   head ─► A ◄──► B ◄──► C ◄── tail
//!          MRU                LRU
//! ```

/// Stable handle to a list entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId(usize);

impl EntryId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug)]
struct Entry<K, V> {
    key: K,
    value: V,
    prev: Option<EntryId>,
    next: Option<EntryId>,
}

/// Doubly linked list ordered by recency (head = most recently used)
#[derive(Debug)]
pub struct RecencyList<K, V> {
    slots: Vec<Option<Entry<K, V>>>,
    free: Vec<usize>,
    head: Option<EntryId>,
    tail: Option<EntryId>,
    len: usize,
}

impl<K, V> RecencyList<K, V> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            ..Self::new()
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn front_id(&self) -> Option<EntryId> {
        self.head
    }

    pub fn back_id(&self) -> Option<EntryId> {
        self.tail
    }

    pub fn contains(&self, id: EntryId) -> bool {
        self.entry(id).is_some()
    }

    /// Key and value stored at `id`
    pub fn get(&self, id: EntryId) -> Option<(&K, &V)> {
        self.entry(id).map(|entry| (&entry.key, &entry.value))
    }

    pub fn get_mut(&mut self, id: EntryId) -> Option<&mut V> {
        self.entry_mut(id).map(|entry| &mut entry.value)
    }

    /// Insert a new entry at the head
    pub fn push_front(&mut self, key: K, value: V) -> EntryId {
        let entry = Entry {
            key,
            value,
            prev: None,
            next: self.head,
        };
        let id = match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(entry);
                EntryId(index)
            }
            None => {
                self.slots.push(Some(entry));
                EntryId(self.slots.len() - 1)
            }
        };

        match self.head {
            Some(old_head) => {
                if let Some(head) = self.entry_mut(old_head) {
                    head.prev = Some(id);
                }
            }
            None => self.tail = Some(id),
        }
        self.head = Some(id);
        self.len += 1;
        id
    }

    /// Remove and return the tail (least recently used) entry
    pub fn pop_back(&mut self) -> Option<(K, V)> {
        let id = self.tail?;
        self.remove(id)
    }

    /// Unlink `id` wherever it sits and free its slot
    pub fn remove(&mut self, id: EntryId) -> Option<(K, V)> {
        self.unlink(id)?;
        let entry = self.slots.get_mut(id.0)?.take()?;
        self.free.push(id.0);
        self.len -= 1;
        Some((entry.key, entry.value))
    }

    /// Move an existing entry to the head. Returns `false` for a stale id.
    pub fn move_to_front(&mut self, id: EntryId) -> bool {
        if !self.contains(id) {
            return false;
        }
        if self.head == Some(id) {
            return true;
        }
        self.unlink(id);

        let old_head = self.head;
        if let Some(entry) = self.entry_mut(id) {
            entry.next = old_head;
        }
        if let Some(old_head) = old_head {
            if let Some(head) = self.entry_mut(old_head) {
                head.prev = Some(id);
            }
        } else {
            self.tail = Some(id);
        }
        self.head = Some(id);
        true
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    /// Iterate from head (most recent) to tail
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            list: self,
            current: self.head,
        }
    }

    fn entry(&self, id: EntryId) -> Option<&Entry<K, V>> {
        self.slots.get(id.0).and_then(|slot| slot.as_ref())
    }

    fn entry_mut(&mut self, id: EntryId) -> Option<&mut Entry<K, V>> {
        self.slots.get_mut(id.0).and_then(|slot| slot.as_mut())
    }

    /// Detach `id` from its neighbours and clear its own links
    fn unlink(&mut self, id: EntryId) -> Option<()> {
        let (prev, next) = {
            let entry = self.entry(id)?;
            (entry.prev, entry.next)
        };

        match prev {
            Some(prev_id) => {
                if let Some(prev_entry) = self.entry_mut(prev_id) {
                    prev_entry.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(next_id) => {
                if let Some(next_entry) = self.entry_mut(next_id) {
                    next_entry.prev = prev;
                }
            }
            None => self.tail = prev,
        }

        let entry = self.entry_mut(id)?;
        entry.prev = None;
        entry.next = None;
        Some(())
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        let mut count = 0;
        let mut prev = None;
        let mut current = self.head;
        while let Some(id) = current {
            let entry = self.entry(id).expect("linked entry missing from arena");
            assert_eq!(entry.prev, prev, "broken back link");
            prev = Some(id);
            current = entry.next;
            count += 1;
            assert!(count <= self.len, "cycle in recency list");
        }
        assert_eq!(self.tail, prev, "tail does not end the chain");
        assert_eq!(count, self.len);
    }
}

impl<K, V> Default for RecencyList<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Head-to-tail iterator over a [`RecencyList`]
pub struct Iter<'a, K, V> {
    list: &'a RecencyList<K, V>,
    current: Option<EntryId>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        let entry = self.list.entry(id)?;
        self.current = entry.next;
        Some((&entry.key, &entry.value))
    }
}
