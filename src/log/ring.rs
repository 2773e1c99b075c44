//! Bounded ring buffer over changes.

use crate::types::{Change, Revision};
use std::collections::VecDeque;

/// Fixed-capacity FIFO of changes with oldest-first eviction.
///
/// Pure data structure: revision watermarks and watcher delivery live in
/// the owning [`EventLog`](super::EventLog). Entries are expected to be
/// pushed in ascending revision order (single-writer contract).
#[derive(Debug)]
pub(super) struct RingBuffer {
    buf: VecDeque<Change>,
    capacity: usize,
}

impl RingBuffer {
    pub(super) fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0);
        Self {
            buf: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a change, returning the evicted oldest change if full.
    pub(super) fn push(&mut self, change: Change) -> Option<Change> {
        let evicted = if self.buf.len() == self.capacity {
            self.buf.pop_front()
        } else {
            None
        };
        self.buf.push_back(change);
        evicted
    }

    /// Remove all buffered changes with revision <= threshold.
    ///
    /// Entries are revision-ascending, so removal stops at the first
    /// survivor. Duplicated revisions (replayed input) are all removed,
    /// not just the first match.
    pub(super) fn remove_through(&mut self, threshold: Revision) -> Vec<Change> {
        let mut removed = Vec::new();
        while let Some(front) = self.buf.front() {
            if front.revision > threshold {
                break;
            }
            removed.push(self.buf.pop_front().expect("front checked above"));
        }
        removed
    }

    /// Buffered changes with revision >= from, in order.
    pub(super) fn collect_since(&self, from: Revision) -> Vec<Change> {
        self.buf
            .iter()
            .filter(|c| c.revision >= from)
            .cloned()
            .collect()
    }

    pub(super) fn oldest_revision(&self) -> Option<Revision> {
        self.buf.front().map(|c| c.revision)
    }

    pub(super) fn len(&self) -> usize {
        self.buf.len()
    }

    pub(super) fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Change;

    fn put(rev: i64) -> Change {
        Change::put(format!("k{}", rev), b"v".to_vec(), Revision(rev), Revision(rev))
    }

    #[test]
    fn test_push_within_capacity() {
        let mut ring = RingBuffer::new(3);
        assert!(ring.push(put(1)).is_none());
        assert!(ring.push(put(2)).is_none());
        assert_eq!(ring.len(), 2);
    }

    #[test]
    fn test_push_evicts_oldest() {
        let mut ring = RingBuffer::new(2);
        ring.push(put(1));
        ring.push(put(2));
        let evicted = ring.push(put(3)).unwrap();
        assert_eq!(evicted.revision, Revision(1));
        assert_eq!(ring.oldest_revision(), Some(Revision(2)));
        assert_eq!(ring.len(), 2);
    }

    #[test]
    fn test_collect_since() {
        let mut ring = RingBuffer::new(5);
        for rev in 1..=5 {
            ring.push(put(rev));
        }
        let since = ring.collect_since(Revision(3));
        let revs: Vec<i64> = since.iter().map(|c| c.revision.0).collect();
        assert_eq!(revs, vec![3, 4, 5]);
    }

    #[test]
    fn test_remove_through() {
        let mut ring = RingBuffer::new(5);
        for rev in 1..=5 {
            ring.push(put(rev));
        }
        let removed = ring.remove_through(Revision(3));
        assert_eq!(removed.len(), 3);
        assert_eq!(ring.oldest_revision(), Some(Revision(4)));

        // Threshold zero removes nothing.
        assert!(ring.remove_through(Revision::ZERO).is_empty());

        // Threshold past the end empties the buffer.
        let removed = ring.remove_through(Revision(100));
        assert_eq!(removed.len(), 2);
        assert!(ring.is_empty());
    }

    #[test]
    fn test_remove_through_duplicate_revisions() {
        let mut ring = RingBuffer::new(5);
        ring.push(put(1));
        ring.push(put(2));
        ring.push(put(2)); // replayed duplicate
        ring.push(put(3));
        let removed = ring.remove_through(Revision(2));
        assert_eq!(removed.len(), 3);
        assert_eq!(ring.oldest_revision(), Some(Revision(3)));
    }
}
