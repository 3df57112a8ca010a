//! Memo table for a single traversal.
//!
//! A [`Cache`] maps the identity of an input node to the result computed for
//! it. It lives exactly as long as the traversal that owns it and is never
//! shared, so it needs no synchronization. Being keyed by identity rather than
//! content, each distinct node instance is computed at most once no matter how
//! many parents reference it, and repeated visits return the very same result.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::Hash;

/// Largest table allocated up front; bigger caches grow on demand.
const MAX_INITIAL_BITS: usize = 16;

/// A cache backed by [HashMap], with hit/miss counters.
pub struct Cache<K, V> {
    map: HashMap<K, V>,
    hits: usize,
    misses: usize,
}

impl<K, V> Default for Cache<K, V> {
    fn default() -> Self {
        Self::new(12)
    }
}

impl<K, V> Cache<K, V> {
    /// Creates a new cache sized for `2^bits` entries.
    ///
    /// `bits` is a hint: at most `2^16` slots are reserved up front.
    pub fn new(bits: usize) -> Self {
        assert!(bits <= 31, "Cache bits must be in range 0..=31, got {}", bits);
        Self {
            map: HashMap::with_capacity(1 << bits.min(MAX_INITIAL_BITS)),
            hits: 0,
            misses: 0,
        }
    }

    /// Returns the number of entries in the cache.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Number of entries the cache holds before it reallocates.
    pub fn capacity(&self) -> usize {
        self.map.capacity()
    }

    /// Returns the number of cache hits.
    pub fn hits(&self) -> usize {
        self.hits
    }

    /// Returns the number of cache misses.
    pub fn misses(&self) -> usize {
        self.misses
    }
}

impl<K, V> Cache<K, V>
where
    K: Hash + Eq,
    V: Clone,
{
    /// Looks up a key, counting the hit or miss.
    #[inline]
    pub fn get(&mut self, key: &K) -> Option<V> {
        match self.map.get(key) {
            Some(v) => {
                self.hits += 1;
                Some(v.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Looks up a key without touching the counters.
    #[inline]
    pub fn peek(&self, key: &K) -> Option<V> {
        self.map.get(key).cloned()
    }

    #[inline]
    pub fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Inserts a key-value pair into the cache.
    #[inline]
    pub fn insert(&mut self, key: K, value: V) {
        self.map.insert(key, value);
    }

    /// Inserts only if the key is not cached yet.
    #[inline]
    pub fn insert_if_absent(&mut self, key: K, value: V) {
        self.map.entry(key).or_insert(value);
    }

    /// Return the cached value for `key`, running `compute` on a miss.
    ///
    /// `compute` runs at most once per key over the lifetime of the cache; if
    /// it fails, nothing is stored.
    pub fn lookup_or_compute<E>(&mut self, key: K, compute: impl FnOnce() -> Result<V, E>) -> Result<V, E> {
        match self.map.entry(key) {
            Entry::Occupied(entry) => {
                self.hits += 1;
                Ok(entry.get().clone())
            }
            Entry::Vacant(entry) => {
                self.misses += 1;
                let value = compute()?;
                Ok(entry.insert(value).clone())
            }
        }
    }
}
