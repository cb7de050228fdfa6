//! Sequenced Store Module
//!
//! FIFO container that hands out absolute sequence numbers.

use std::collections::VecDeque;

// == Sequenced Store ==
/// Ordered container with stable, absolute positions.
///
/// Every appended item gets the sequence number `base + len`. Popping from the
/// head advances `base` by one, so positions recorded elsewhere stay valid
/// without being rewritten.
///
/// - Front = oldest (sequence number `base`)
/// - Back = newest
#[derive(Debug)]
pub struct SequencedStore<T> {
    items: VecDeque<T>,
    /// Sequence number of the item at the front
    base: u64,
}

impl<T> SequencedStore<T> {
    // == Constructor ==
    /// Creates an empty store starting at sequence number 0.
    pub fn new() -> Self {
        Self {
            items: VecDeque::new(),
            base: 0,
        }
    }

    /// Creates an empty store with room for `capacity` items.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            base: 0,
        }
    }

    // == Append ==
    /// Appends an item at the tail and returns its sequence number.
    pub fn append(&mut self, item: T) -> u64 {
        let seq = self.next_seq();
        self.items.push_back(item);
        seq
    }

    // == Pop Oldest ==
    /// Removes the item with the lowest surviving sequence number.
    ///
    /// Returns the item together with its sequence number, or None if empty.
    pub fn pop_oldest(&mut self) -> Option<(u64, T)> {
        let item = self.items.pop_front()?;
        let seq = self.base;
        self.base += 1;
        Some((seq, item))
    }

    // == Peek ==
    /// Returns the item stored under `seq`.
    ///
    /// None if `seq` was already popped or has not been handed out yet.
    pub fn peek(&self, seq: u64) -> Option<&T> {
        let offset = seq.checked_sub(self.base)?;
        self.items.get(usize::try_from(offset).ok()?)
    }

    /// Returns the oldest item without removing it.
    #[cfg(test)]
    pub(crate) fn peek_oldest(&self) -> Option<&T> {
        self.items.front()
    }

    // == Clear ==
    /// Drops every item.
    ///
    /// The base jumps past all handed-out numbers, so stale positions can
    /// never resolve to a later item.
    pub fn clear(&mut self) {
        self.base = self.next_seq();
        self.items.clear();
    }

    /// Sequence number the next appended item will receive.
    pub fn next_seq(&self) -> u64 {
        self.base + self.items.len() as u64
    }

    /// Sequence number of the oldest item (equal to `next_seq` when empty).
    #[cfg(test)]
    pub(crate) fn base(&self) -> u64 {
        self.base
    }

    // == Length ==
    pub fn size(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for SequencedStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_new() {
        let store: SequencedStore<&str> = SequencedStore::new();
        assert!(store.is_empty());
        assert_eq!(store.size(), 0);
        assert_eq!(store.next_seq(), 0);
    }

    #[test]
    fn test_append_assigns_increasing_numbers() {
        let mut store = SequencedStore::new();

        assert_eq!(store.append("a"), 0);
        assert_eq!(store.append("b"), 1);
        assert_eq!(store.append("c"), 2);
        assert_eq!(store.size(), 3);
    }

    #[test]
    fn test_pop_oldest_is_fifo() {
        let mut store = SequencedStore::new();
        store.append("a");
        store.append("b");

        assert_eq!(store.pop_oldest(), Some((0, "a")));
        assert_eq!(store.pop_oldest(), Some((1, "b")));
        assert_eq!(store.pop_oldest(), None);
    }

    #[test]
    fn test_peek_survives_head_removal() {
        let mut store = SequencedStore::new();
        store.append("a");
        let b = store.append("b");
        let c = store.append("c");

        store.pop_oldest();

        // Positions handed out before the pop still resolve
        assert_eq!(store.peek(b), Some(&"b"));
        assert_eq!(store.peek(c), Some(&"c"));
        assert_eq!(store.base(), 1);
    }

    #[test]
    fn test_peek_out_of_range() {
        let mut store = SequencedStore::new();
        let a = store.append("a");
        store.append("b");
        store.pop_oldest();

        // Below base
        assert_eq!(store.peek(a), None);
        // Beyond tail
        assert_eq!(store.peek(2), None);
        assert_eq!(store.peek(u64::MAX), None);
    }

    #[test]
    fn test_numbers_keep_growing_after_pops() {
        let mut store = SequencedStore::new();
        store.append("a");
        store.pop_oldest();
        store.append("b");
        store.pop_oldest();

        assert_eq!(store.append("c"), 2);
        assert_eq!(store.peek_oldest(), Some(&"c"));
    }

    #[test]
    fn test_clear_invalidates_old_positions() {
        let mut store = SequencedStore::new();
        let a = store.append("a");
        store.append("b");

        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.peek(a), None);

        // New items never reuse cleared numbers
        let c = store.append("c");
        assert_eq!(c, 2);
        assert_eq!(store.peek(a), None);
        assert_eq!(store.peek(c), Some(&"c"));
    }
}
