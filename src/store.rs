//! The authoritative revision-ordered key-value store.

use crate::error::Result;
use crate::log::EventLog;
use crate::sink::EventSink;
use crate::snapshot::SnapshotView;
use crate::source::ChangeSource;
use crate::types::{Change, ChangeKind, Entry, KeyValue, Revision};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

struct StoreState {
    entries: HashMap<String, Entry>,
    /// Highest revision ever accepted. Non-decreasing.
    revision: Revision,
}

/// The authoritative key -> [`Entry`] mapping.
///
/// Applies pre-ordered changes from a single logical writer stream,
/// rejects stale ones per key, and advances a global revision counter.
/// An optional [`EventSink`] is notified and an optional [`EventLog`]
/// appended to inside the same write critical section, so sink order
/// and log order are exactly apply order.
///
/// `get` and `snapshot` take the shared side of the lock; `snapshot`
/// deep-copies every entry while holding it, so its cost grows with
/// store size. That contention is accepted, not an error.
pub struct RevisionedStore {
    inner: RwLock<StoreState>,
    sink: Option<Box<dyn EventSink>>,
    log: Option<Arc<EventLog>>,
}

impl RevisionedStore {
    /// Create a store with no sink and no log attached.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StoreState {
                entries: HashMap::new(),
                revision: Revision::ZERO,
            }),
            sink: None,
            log: None,
        }
    }

    /// Attach a sink, notified synchronously for each accepted change.
    pub fn with_sink(mut self, sink: Box<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Attach an event log; every accepted change is appended to it.
    pub fn with_log(mut self, log: Arc<EventLog>) -> Self {
        self.log = Some(log);
        self
    }

    /// The attached event log, if any.
    pub fn log(&self) -> Option<&Arc<EventLog>> {
        self.log.as_ref()
    }

    /// Apply a put. Returns whether the change was accepted; a stale
    /// revision (at or below the key's current one) is a silent no-op.
    ///
    /// The source revision recorded in the log equals the local
    /// revision here; use [`apply_change`](Self::apply_change) when the
    /// two differ.
    pub fn apply_put(&self, key: impl Into<String>, value: Vec<u8>, revision: Revision) -> bool {
        let key = key.into();
        let source = revision;
        self.apply(Change::put(key, value, revision, source))
    }

    /// Apply a delete. Same staleness contract as
    /// [`apply_put`](Self::apply_put); the key is truly removed, so
    /// prefix scans and lookups no longer see it. Deleting an absent
    /// key is accepted and still advances the global revision.
    pub fn apply_delete(&self, key: impl Into<String>, revision: Revision) -> bool {
        let key = key.into();
        let source = revision;
        self.apply(Change::delete(key, revision, source))
    }

    /// Apply a change, dispatching on its kind.
    pub fn apply_change(&self, change: Change) -> bool {
        self.apply(change)
    }

    /// Apply a wire-level notification whose kind is still a raw tag.
    ///
    /// Unknown tags fail with
    /// [`CacheError::UnsupportedChangeKind`](crate::CacheError::UnsupportedChangeKind)
    /// before touching any state.
    pub fn apply_raw(
        &self,
        tag: i32,
        key: impl Into<String>,
        value: Option<Vec<u8>>,
        revision: Revision,
        source_revision: Revision,
    ) -> Result<bool> {
        let change = match ChangeKind::from_raw(tag)? {
            ChangeKind::Put => Change::put(
                key,
                value.unwrap_or_default(),
                revision,
                source_revision,
            ),
            ChangeKind::Delete => Change::delete(key, revision, source_revision),
        };
        Ok(self.apply(change))
    }

    /// Drain a change source, applying each change in order.
    ///
    /// Returns the number of changes accepted (stale ones are skipped,
    /// not counted).
    pub fn ingest(&self, source: &mut dyn ChangeSource) -> u64 {
        let mut accepted = 0;
        while let Some(change) = source.next_change() {
            if self.apply(change) {
                accepted += 1;
            }
        }
        accepted
    }

    fn apply(&self, change: Change) -> bool {
        let mut state = self.inner.write();

        if let Some(existing) = state.entries.get(&change.key) {
            if change.revision <= existing.revision {
                trace!(
                    key = %change.key,
                    revision = change.revision.0,
                    current = existing.revision.0,
                    "stale change ignored"
                );
                return false;
            }
        }

        match change.kind {
            ChangeKind::Put => {
                state.entries.insert(
                    change.key.clone(),
                    Entry {
                        key: change.key.clone(),
                        value: change.value.clone().unwrap_or_default(),
                        revision: change.revision,
                    },
                );
            }
            ChangeKind::Delete => {
                state.entries.remove(&change.key);
            }
        }
        state.revision = state.revision.max(change.revision);

        // Sink and log run inside the write critical section: delivery
        // order and log order are apply order by construction. A sink
        // that blocks here blocks the writer.
        if let Some(sink) = &self.sink {
            match change.kind {
                ChangeKind::Put => {
                    sink.handle_put(&change.key, change.value.as_deref().unwrap_or_default())
                }
                ChangeKind::Delete => sink.handle_delete(&change.key),
            }
        }
        if let Some(log) = &self.log {
            log.append(change);
        }

        true
    }

    /// Look up a key, returning a copy of its entry.
    pub fn get(&self, key: &str) -> Option<Entry> {
        self.inner.read().entries.get(key).cloned()
    }

    /// The current global revision.
    pub fn revision(&self) -> Revision {
        self.inner.read().revision
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().entries.is_empty()
    }

    /// Capture an immutable, deep-copied view of the whole store at the
    /// current revision.
    pub fn snapshot(&self) -> SnapshotView {
        let state = self.inner.read();
        let items: Vec<KeyValue> = state.entries.values().map(KeyValue::from).collect();
        SnapshotView::new(items, state.revision)
    }
}

impl Default for RevisionedStore {
    fn default() -> Self {
        Self::new()
    }
}
