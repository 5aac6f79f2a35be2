//! Arena-backed recency list with per-entry expiry.
//!
//! Entries live in a `Vec` of slots linked into a doubly-linked list by index, with a
//! hash index from key to slot. Vacated slots go on a free list and are reused, so the
//! arena never grows past `capacity + 1` slots.
//!
//! The list is pure: callers pass the current `Instant` into every operation that
//! needs to judge expiry.

use ahash::RandomState;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Result of looking up a key.
#[derive(Debug, PartialEq, Eq)]
pub enum Lookup<'a, V> {
    /// Entry is present and fresh; it is now the most recently used
    Hit(&'a V),
    /// No entry for the key
    Miss,
    /// Entry had expired and was purged by this lookup
    Expired,
}

impl<'a, V> Lookup<'a, V> {
    /// Get the value of a hit.
    pub fn hit(self) -> Option<&'a V> {
        match self {
            Lookup::Hit(value) => Some(value),
            Lookup::Miss | Lookup::Expired => None,
        }
    }
}

#[derive(Debug)]
struct Node<K, V> {
    key: K,
    value: V,
    expires_at: Option<Instant>,
    prev: Option<usize>,
    next: Option<usize>,
}

impl<K, V> Node<K, V> {
    fn is_expired(&self, now: Instant) -> bool {
        matches!(self.expires_at, Some(at) if now >= at)
    }
}

/// Compute the expiry instant for an entry written at `now`.
///
/// A TTL too large to represent is treated as "never expires".
pub fn expiry_for(now: Instant, ttl: Option<Duration>) -> Option<Instant> {
    ttl.and_then(|ttl| now.checked_add(ttl))
}

/// Capacity-bounded recency list, most recent entry at the head.
#[derive(Debug)]
pub struct RecencyList<K, V> {
    slots: Vec<Option<Node<K, V>>>,
    free: Vec<usize>,
    index: HashMap<K, usize, RandomState>,
    head: Option<usize>,
    tail: Option<usize>,
    capacity: usize,
}

impl<K, V> RecencyList<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Create an empty list holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "recency list capacity must be positive");
        Self {
            slots: Vec::with_capacity(capacity.min(1024) + 1),
            free: Vec::new(),
            index: HashMap::with_capacity_and_hasher(capacity.min(1024), RandomState::new()),
            head: None,
            tail: None,
            capacity,
        }
    }

    /// Look up a key, promoting it on a hit and purging it if it has expired.
    pub fn get<Q>(&mut self, key: &Q, now: Instant) -> Lookup<'_, V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(&idx) = self.index.get(key) else {
            return Lookup::Miss;
        };

        if self.node(idx).is_expired(now) {
            self.remove_at(idx);
            return Lookup::Expired;
        }

        self.move_to_front(idx);
        Lookup::Hit(&self.node(idx).value)
    }

    /// Check for a fresh entry without touching recency or purging.
    pub fn contains<Q>(&self, key: &Q, now: Instant) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index
            .get(key)
            .is_some_and(|&idx| !self.node(idx).is_expired(now))
    }

    /// Insert or refresh an entry, making it the most recently used.
    ///
    /// Refreshing an existing key replaces its value and expiry in place. Inserting a new
    /// key into a full list evicts the tail and returns it, whatever its expiry state.
    pub fn insert(&mut self, key: K, value: V, expires_at: Option<Instant>) -> Option<(K, V)> {
        if let Some(&idx) = self.index.get(&key) {
            let node = self.node_mut(idx);
            node.value = value;
            node.expires_at = expires_at;
            self.move_to_front(idx);
            return None;
        }

        let idx = self.alloc(Node {
            key: key.clone(),
            value,
            expires_at,
            prev: None,
            next: None,
        });
        self.index.insert(key, idx);
        self.push_front(idx);

        if self.index.len() > self.capacity {
            let tail = self.tail?;
            let node = self.remove_at(tail);
            return Some((node.key, node.value));
        }
        None
    }

    /// Remove an entry regardless of its expiry state.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = *self.index.get(key)?;
        Some(self.remove_at(idx).value)
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.index.clear();
        self.head = None;
        self.tail = None;
    }

    /// Number of occupied slots, stale entries included.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate from most to least recently used.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            list: self,
            cursor: self.head,
        }
    }

    fn node(&self, idx: usize) -> &Node<K, V> {
        match self.slots.get(idx) {
            Some(Some(node)) => node,
            _ => unreachable!("recency index points at vacant slot {idx}"),
        }
    }

    fn node_mut(&mut self, idx: usize) -> &mut Node<K, V> {
        match self.slots.get_mut(idx) {
            Some(Some(node)) => node,
            _ => unreachable!("recency index points at vacant slot {idx}"),
        }
    }

    fn alloc(&mut self, node: Node<K, V>) -> usize {
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(node);
                idx
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        }
    }

    fn remove_at(&mut self, idx: usize) -> Node<K, V> {
        self.unlink(idx);
        let node = match self.slots[idx].take() {
            Some(node) => node,
            None => unreachable!("removing vacant slot {idx}"),
        };
        self.free.push(idx);
        self.index.remove(&node.key);
        node
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = {
            let node = self.node(idx);
            (node.prev, node.next)
        };

        match prev {
            Some(p) => self.node_mut(p).next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.node_mut(n).prev = prev,
            None => self.tail = prev,
        }

        let node = self.node_mut(idx);
        node.prev = None;
        node.next = None;
    }

    fn push_front(&mut self, idx: usize) {
        let old_head = self.head;
        {
            let node = self.node_mut(idx);
            node.prev = None;
            node.next = old_head;
        }
        match old_head {
            Some(h) => self.node_mut(h).prev = Some(idx),
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
    }

    fn move_to_front(&mut self, idx: usize) {
        if self.head == Some(idx) {
            return;
        }
        self.unlink(idx);
        self.push_front(idx);
    }
}

/// Iterator over entries in recency order.
pub struct Iter<'a, K, V> {
    list: &'a RecencyList<K, V>,
    cursor: Option<usize>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V>
where
    K: Hash + Eq + Clone,
{
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.list.node(self.cursor?);
        self.cursor = node.next;
        Some((&node.key, &node.value))
    }
}
