//! Arena-backed least-recently-used map.
//!
//! Entries live in a `Vec` of slots linked into a doubly-linked recency list
//! by index rather than by pointer. A `HashMap` maps each key to its slot.
//! Touching and evicting are both `O(1)`.
//!
//! # Invariants
//!
//! - Every key in `index` names exactly one linked slot, and every slot is
//!   named by exactly one key in `index`.
//! - `head` is the most recently used slot, `tail` the least recently used.
//! - `slots.len() <= capacity`. Once full, inserting a new key recycles the
//!   tail slot in place, so the arena never grows past capacity and never
//!   holds a vacant slot.

use std::collections::HashMap;
use std::hash::Hash;
use std::iter::FusedIterator;
use std::num::NonZeroUsize;

#[derive(Debug)]
struct Slot<K, V> {
    key: K,
    value: V,
    /// Towards the head (more recently used).
    prev: Option<usize>,
    /// Towards the tail (less recently used).
    next: Option<usize>,
}

/// A bounded map that evicts its least recently used entry on overflow.
#[derive(Debug)]
pub struct LruCache<K, V> {
    index: HashMap<K, usize>,
    slots: Vec<Slot<K, V>>,
    head: Option<usize>,
    tail: Option<usize>,
    capacity: NonZeroUsize,
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Creates an empty cache holding at most `capacity` entries.
    pub fn new(capacity: NonZeroUsize) -> Self {
        LruCache {
            index: HashMap::with_capacity(capacity.get()),
            slots: Vec::with_capacity(capacity.get()),
            head: None,
            tail: None,
            capacity,
        }
    }

    /// Returns the value for `key`, marking it most recently used.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let idx = *self.index.get(key)?;
        self.move_to_front(idx);
        Some(&self.slots[idx].value)
    }

    /// Returns the value for `key` without touching its recency.
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.index.get(key).map(|&idx| &self.slots[idx].value)
    }

    /// Returns true if `key` is present. Does not touch recency.
    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Inserts or replaces `key`, making it the most recently used entry.
    ///
    /// Returns the evicted entry when a new key had to displace the least
    /// recently used one.
    pub fn insert(&mut self, key: K, value: V) -> Option<(K, V)> {
        if let Some(&idx) = self.index.get(&key) {
            self.slots[idx].value = value;
            self.move_to_front(idx);
            return None;
        }

        if self.slots.len() < self.capacity.get() {
            let idx = self.slots.len();
            self.slots.push(Slot {
                key: key.clone(),
                value,
                prev: None,
                next: None,
            });
            self.index.insert(key, idx);
            self.push_front(idx);
            return None;
        }

        // Full: recycle the tail slot for the new entry.
        let idx = self.tail.expect("a full cache with non-zero capacity has a tail");
        self.unlink(idx);
        let slot = &mut self.slots[idx];
        let old_key = std::mem::replace(&mut slot.key, key.clone());
        let old_value = std::mem::replace(&mut slot.value, value);
        self.index.remove(&old_key);
        self.index.insert(key, idx);
        self.push_front(idx);
        Some((old_key, old_value))
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn capacity(&self) -> NonZeroUsize {
        self.capacity
    }

    /// Iterates entries from most to least recently used.
    ///
    /// Iterating does not touch recency; call again to restart.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            slots: &self.slots,
            cursor: self.head,
            remaining: self.index.len(),
        }
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    /// Values from most to least recently used.
    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }

    fn move_to_front(&mut self, idx: usize) {
        if self.head == Some(idx) {
            return;
        }
        self.unlink(idx);
        self.push_front(idx);
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = (self.slots[idx].prev, self.slots[idx].next);
        match prev {
            Some(p) => self.slots[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.slots[n].prev = prev,
            None => self.tail = prev,
        }
        self.slots[idx].prev = None;
        self.slots[idx].next = None;
    }

    fn push_front(&mut self, idx: usize) {
        self.slots[idx].prev = None;
        self.slots[idx].next = self.head;
        if let Some(old_head) = self.head {
            self.slots[old_head].prev = Some(idx);
        }
        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }
}

/// Most-recently-used-first iterator over an [`LruCache`].
pub struct Iter<'a, K, V> {
    slots: &'a [Slot<K, V>],
    cursor: Option<usize>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.cursor?;
        let slot = &self.slots[idx];
        self.cursor = slot.next;
        self.remaining -= 1;
        Some((&slot.key, &slot.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}
