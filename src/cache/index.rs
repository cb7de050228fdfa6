//! Cache Index Module
//!
//! Maps request keys to absolute sequence numbers in the store.

use std::collections::HashMap;

// == Cache Index ==
/// Key to sequence-number lookup table.
#[derive(Debug, Default)]
pub struct CacheIndex {
    positions: HashMap<String, u64>,
}

impl CacheIndex {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            positions: HashMap::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            positions: HashMap::with_capacity(capacity),
        }
    }

    // == Set ==
    /// Points `key` at `seq`, replacing any earlier position.
    pub fn set(&mut self, key: String, seq: u64) {
        self.positions.insert(key, seq);
    }

    // == Get ==
    pub fn get(&self, key: &str) -> Option<u64> {
        self.positions.get(key).copied()
    }

    // == Remove ==
    pub fn remove(&mut self, key: &str) -> Option<u64> {
        self.positions.remove(key)
    }

    // == Remove If ==
    /// Removes `key` only while it still points at `seq`.
    ///
    /// Returns true if the key was removed. A key that was re-added since
    /// keeps pointing at its newer entry.
    pub fn remove_if(&mut self, key: &str, seq: u64) -> bool {
        if self.get(key) == Some(seq) {
            self.positions.remove(key);
            true
        } else {
            false
        }
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.positions.clear();
    }

    // == Length ==
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Iterates over every `(key, seq)` pair.
    #[cfg(test)]
    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.positions.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut index = CacheIndex::new();
        index.set("/a".to_string(), 3);

        assert_eq!(index.get("/a"), Some(3));
        assert_eq!(index.get("/b"), None);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_set_overwrites() {
        let mut index = CacheIndex::new();
        index.set("/a".to_string(), 0);
        index.set("/a".to_string(), 5);

        assert_eq!(index.get("/a"), Some(5));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut index = CacheIndex::new();
        index.set("/a".to_string(), 0);

        assert_eq!(index.remove("/a"), Some(0));
        assert_eq!(index.remove("/a"), None);
        assert!(index.is_empty());
    }

    #[test]
    fn test_remove_if_matching_seq() {
        let mut index = CacheIndex::new();
        index.set("/a".to_string(), 7);

        assert!(index.remove_if("/a", 7));
        assert!(index.get("/a").is_none());
    }

    #[test]
    fn test_remove_if_keeps_newer_position() {
        let mut index = CacheIndex::new();
        index.set("/a".to_string(), 1);
        index.set("/a".to_string(), 4);

        // Evicting the orphaned copy at 1 must not unlink the live copy at 4
        assert!(!index.remove_if("/a", 1));
        assert_eq!(index.get("/a"), Some(4));
    }

    #[test]
    fn test_clear() {
        let mut index = CacheIndex::new();
        index.set("/a".to_string(), 0);
        index.set("/b".to_string(), 1);

        index.clear();
        assert!(index.is_empty());
    }
}
