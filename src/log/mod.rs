//! Bounded, append-only log of changes with replay and live-tail watches.

mod ring;

use crate::error::{CacheError, Result};
use crate::types::{Change, Revision};
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use ring::RingBuffer;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// Unique identifier for a watch registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WatchId(pub u64);

#[derive(Debug)]
struct LogInner {
    ring: RingBuffer,
    /// Highest revision ever appended. Never reduced by eviction or
    /// compaction.
    latest: Revision,
    /// Highest revision ever removed from the buffer, by capacity
    /// eviction or explicit compaction. A watch starting at or below
    /// this point would miss changes.
    compacted: Revision,
    /// Live watchers, fed under the append lock.
    watchers: HashMap<WatchId, Sender<Change>>,
    next_watch_id: u64,
}

/// Bounded, ordered history of [`Change`] records.
///
/// Holds at most `capacity` of the most recent changes; older ones are
/// evicted silently on overflow. Append order is exactly the order the
/// owning store accepted the changes, and watches deliver that order
/// with no gap or duplicate across the replay/live boundary.
#[derive(Debug)]
pub struct EventLog {
    capacity: usize,
    inner: Arc<Mutex<LogInner>>,
}

impl EventLog {
    /// Create a log retaining at most `capacity` changes.
    ///
    /// Zero capacity is rejected up front rather than deferred into
    /// runtime failures.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(CacheError::InvalidCapacity(capacity));
        }
        Ok(Self {
            capacity,
            inner: Arc::new(Mutex::new(LogInner {
                ring: RingBuffer::new(capacity),
                latest: Revision::ZERO,
                compacted: Revision::ZERO,
                watchers: HashMap::new(),
                next_watch_id: 1,
            })),
        })
    }

    /// Append a change, evicting the oldest buffered change if full, and
    /// push it to every live watcher.
    ///
    /// Always succeeds. Delivery happens inside the same lock as the
    /// buffer mutation, so a concurrent `watch` either sees the change
    /// in its replay or receives it live, never both and never neither.
    pub fn append(&self, change: Change) {
        let mut inner = self.inner.lock();

        if let Some(evicted) = inner.ring.push(change.clone()) {
            trace!(revision = evicted.revision.0, "evicted change at capacity");
            inner.compacted = inner.compacted.max(evicted.revision);
        }
        inner.latest = inner.latest.max(change.revision);

        let mut disconnected = Vec::new();
        for (id, sender) in inner.watchers.iter() {
            if sender.send(change.clone()).is_err() {
                disconnected.push(*id);
            }
        }
        for id in disconnected {
            trace!(watch_id = id.0, "pruning disconnected watcher");
            inner.watchers.remove(&id);
        }
    }

    /// Buffered changes with revision >= `from`, ascending.
    pub fn list_since(&self, from: Revision) -> Vec<Change> {
        self.inner.lock().ring.collect_since(from)
    }

    /// Remove all buffered changes with revision <= `threshold`.
    ///
    /// Returns the number removed. `compact(Revision::ZERO)` retains
    /// everything; a threshold at or beyond the newest buffered revision
    /// empties the buffer. The latest-revision watermark is unaffected.
    pub fn compact(&self, threshold: Revision) -> usize {
        let mut inner = self.inner.lock();
        let removed = inner.ring.remove_through(threshold);
        if let Some(last) = removed.last() {
            inner.compacted = inner.compacted.max(last.revision);
            debug!(
                threshold = threshold.0,
                removed = removed.len(),
                "compacted event log"
            );
        }
        removed.len()
    }

    /// Highest revision ever appended, regardless of what remains
    /// buffered.
    pub fn latest_revision(&self) -> Revision {
        self.inner.lock().latest
    }

    /// Highest revision ever removed from the buffer.
    pub fn compacted_revision(&self) -> Revision {
        self.inner.lock().compacted
    }

    /// Open a watch starting at `from`.
    ///
    /// Replays every buffered change with revision >= `from` into the
    /// returned handle, then streams each subsequent append until the
    /// handle is cancelled or dropped.
    ///
    /// Fails with [`CacheError::HistoryExceeded`] if a change at or
    /// after `from` has already been evicted or compacted away; resuming
    /// from a later revision would silently hide the missed changes.
    pub fn watch(&self, from: Revision) -> Result<WatchHandle> {
        let mut inner = self.inner.lock();

        if inner.compacted != Revision::ZERO && from <= inner.compacted {
            return Err(CacheError::HistoryExceeded {
                needed: from,
                compacted: inner.compacted,
            });
        }

        let (sender, receiver) = unbounded();
        for change in inner.ring.collect_since(from) {
            // Replay into our own channel cannot fail: we hold the receiver.
            let _ = sender.send(change);
        }

        let id = WatchId(inner.next_watch_id);
        inner.next_watch_id += 1;
        inner.watchers.insert(id, sender);
        trace!(watch_id = id.0, from = from.0, "watch opened");

        Ok(WatchHandle {
            id,
            receiver,
            inner: Arc::clone(&self.inner),
        })
    }

    /// Number of live watchers (for leak checks).
    pub fn watcher_count(&self) -> usize {
        self.inner.lock().watchers.len()
    }

    /// Number of changes currently buffered.
    pub fn len(&self) -> usize {
        self.inner.lock().ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().ring.is_empty()
    }

    /// Configured retention capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Handle to an open watch: replayed history followed by the live tail.
///
/// Cancelling (or dropping) the handle deregisters the watcher; already
/// queued changes remain readable until the channel drains, after which
/// `recv` reports disconnection.
#[derive(Debug)]
pub struct WatchHandle {
    id: WatchId,
    receiver: Receiver<Change>,
    inner: Arc<Mutex<LogInner>>,
}

impl WatchHandle {
    pub fn id(&self) -> WatchId {
        self.id
    }

    /// Receive the next change (blocking).
    pub fn recv(&self) -> Result<Change> {
        self.receiver.recv().map_err(|_| CacheError::WatchClosed)
    }

    /// Try to receive a change without blocking. `Ok(None)` means no
    /// change is queued right now.
    pub fn try_recv(&self) -> Result<Option<Change>> {
        match self.receiver.try_recv() {
            Ok(change) => Ok(Some(change)),
            Err(crossbeam_channel::TryRecvError::Empty) => Ok(None),
            Err(crossbeam_channel::TryRecvError::Disconnected) => Err(CacheError::WatchClosed),
        }
    }

    /// Receive with a timeout. `Ok(None)` means the timeout elapsed.
    pub fn recv_timeout(&self, timeout: std::time::Duration) -> Result<Option<Change>> {
        match self.receiver.recv_timeout(timeout) {
            Ok(change) => Ok(Some(change)),
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => Ok(None),
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => Err(CacheError::WatchClosed),
        }
    }

    /// Stop live delivery. Idempotent; safe concurrently with appends.
    pub fn cancel(&self) {
        let mut inner = self.inner.lock();
        if inner.watchers.remove(&self.id).is_some() {
            trace!(watch_id = self.id.0, "watch cancelled");
        }
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}
