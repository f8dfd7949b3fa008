//! Insertion-ordered cache with an optional capacity bound.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

/// Entry in the cache.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    /// Insertion sequence number.
    seq: u64,
}

/// A map that evicts its oldest insertion once `capacity` is reached.
///
/// `None` capacity never evicts. A capacity of zero stores nothing.
#[derive(Debug, Clone)]
pub struct FifoCache<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    order: VecDeque<K>,
    capacity: Option<usize>,
    next_seq: u64,
}

impl<K, V> FifoCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates a cache with the given capacity bound.
    #[must_use]
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity,
            next_seq: 0,
        }
    }

    /// Creates a cache that never evicts.
    #[must_use]
    pub fn unbounded() -> Self {
        Self::new(None)
    }

    /// Creates a cache holding at most `capacity` entries.
    #[must_use]
    pub fn bounded(capacity: usize) -> Self {
        Self::new(Some(capacity))
    }

    /// Gets a cached value.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key).map(|entry| &entry.value)
    }

    /// Returns true if `key` is cached.
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns the insertion sequence number of `key`.
    pub fn sequence(&self, key: &K) -> Option<u64> {
        self.entries.get(key).map(|entry| entry.seq)
    }

    /// Stores a value, returning the key evicted to make room, if any.
    ///
    /// Storing an existing key replaces its value in place; the key keeps
    /// its original eviction position.
    pub fn insert(&mut self, key: K, value: V) -> Option<K> {
        if self.capacity == Some(0) {
            return None;
        }

        if let Some(entry) = self.entries.get_mut(&key) {
            entry.value = value;
            return None;
        }

        let evicted = match self.capacity {
            Some(capacity) if self.entries.len() >= capacity => self.evict_oldest(),
            _ => None,
        };

        let seq = self.next_seq;
        self.next_seq += 1;
        self.order.push_back(key.clone());
        self.entries.insert(key, CacheEntry { value, seq });

        evicted
    }

    /// Returns the number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the capacity bound.
    pub const fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Iterates keys from oldest to newest insertion.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.order.iter()
    }

    /// Clears all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    fn evict_oldest(&mut self) -> Option<K> {
        let oldest = self.order.pop_front()?;
        self.entries.remove(&oldest);
        Some(oldest)
    }
}

impl<K, V> Default for FifoCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::unbounded()
    }
}
