//! Cache State Module
//!
//! Bundles the sequenced store and the index so that every mutation keeps
//! both in step.

use std::sync::Arc;

use crate::cache::{CacheEntry, CacheIndex, SequencedStore};

// == Cache State ==
/// Store and index of the cache, mutated only by the cache actor.
///
/// Invariants after every method returns:
/// - `len() <= capacity()`
/// - every key in the index resolves to a live entry carrying that key
#[derive(Debug)]
pub struct CacheState {
    store: SequencedStore<Arc<CacheEntry>>,
    index: CacheIndex,
    capacity: usize,
}

impl CacheState {
    // == Constructor ==
    /// Creates an empty state holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            store: SequencedStore::with_capacity(capacity),
            index: CacheIndex::with_capacity(capacity),
            capacity,
        }
    }

    // == Insert ==
    /// Appends an entry, evicting the oldest one first if the cache is full.
    ///
    /// Returns the evicted entry, if any. Re-inserting a key does not remove
    /// the earlier copy; the index moves to the new one and the old copy ages
    /// out in order.
    pub fn insert(&mut self, entry: Arc<CacheEntry>) -> Option<Arc<CacheEntry>> {
        let evicted = if self.store.size() >= self.capacity {
            self.evict_oldest()
        } else {
            None
        };

        let key = entry.key.clone();
        let seq = self.store.append(entry);
        self.index.set(key, seq);

        evicted
    }

    // == Evict Oldest ==
    /// Removes the oldest entry from the store and unlinks its key.
    ///
    /// Both capacity eviction and the periodic sweep go through here.
    pub fn evict_oldest(&mut self) -> Option<Arc<CacheEntry>> {
        let (seq, entry) = self.store.pop_oldest()?;
        self.index.remove_if(&entry.key, seq);
        Some(entry)
    }

    // == Clear ==
    /// Drops every entry. Returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.store.size();
        self.store.clear();
        self.index.clear();
        removed
    }

    // == Lookup ==
    /// Resolves a key through the index to its live entry.
    pub fn lookup(&self, key: &str) -> Option<Arc<CacheEntry>> {
        let seq = self.index.get(key)?;
        self.store.peek(seq).cloned()
    }

    // == Length ==
    /// Number of stored entries, orphaned duplicates included.
    pub fn len(&self) -> usize {
        self.store.size()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Number of distinct keys reachable through the index.
    #[cfg(test)]
    pub(crate) fn key_count(&self) -> usize {
        self.index.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Checks the capacity bound and the index-to-store mapping.
    #[cfg(test)]
    pub(crate) fn is_consistent(&self) -> bool {
        self.store.size() <= self.capacity
            && self.index.iter().all(|(key, seq)| {
                self.store
                    .peek(seq)
                    .map(|entry| entry.key == key)
                    .unwrap_or(false)
            })
    }
}
