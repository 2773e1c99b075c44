//! Per-consumer sessions: one snapshot plus live change subscriptions.

use crate::error::{CacheError, Result};
use crate::log::{EventLog, WatchHandle};
use crate::snapshot::SnapshotView;
use crate::store::RevisionedStore;
use crate::types::{Change, KeyValue, Revision};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Filter applied to a session watch stream.
#[derive(Clone, Debug)]
pub enum WatchFilter {
    /// Exact key match.
    Key(String),
    /// Lexicographic key prefix match.
    Prefix(String),
}

impl WatchFilter {
    fn matches(&self, change: &Change) -> bool {
        match self {
            WatchFilter::Key(key) => change.key == *key,
            WatchFilter::Prefix(prefix) => change.key.starts_with(prefix),
        }
    }
}

/// A watch stream filtered to one key or key prefix.
///
/// Non-matching changes are consumed and skipped; matching ones come
/// out in log order.
#[derive(Debug)]
pub struct KeyWatch {
    inner: Arc<WatchHandle>,
    filter: WatchFilter,
}

impl KeyWatch {
    /// Receive the next matching change (blocking).
    pub fn recv(&self) -> Result<Change> {
        loop {
            let change = self.inner.recv()?;
            if self.filter.matches(&change) {
                return Ok(change);
            }
        }
    }

    /// Next matching change without blocking; `Ok(None)` if nothing
    /// matching is queued.
    pub fn try_recv(&self) -> Result<Option<Change>> {
        while let Some(change) = self.inner.try_recv()? {
            if self.filter.matches(&change) {
                return Ok(Some(change));
            }
        }
        Ok(None)
    }

    /// Next matching change within `timeout`; `Ok(None)` on timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<Change>> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.inner.recv_timeout(remaining)? {
                Some(change) if self.filter.matches(&change) => return Ok(Some(change)),
                Some(_) => continue,
                None => return Ok(None),
            }
        }
    }

    /// Stop this watch only. Idempotent.
    pub fn cancel(&self) {
        self.inner.cancel();
    }
}

/// A consumer's handle: an isolated snapshot at revision R plus a
/// gapless subscription to every change after R.
///
/// The union of [`list`](Self::list) and everything delivered through
/// [`events`](Self::events) reconstructs the key space with no gap or
/// duplicate, as long as the log still retained revision R + 1 when the
/// session opened.
///
/// Lifetime is explicit: [`stop`](Self::stop) cancels the primary
/// stream and every filtered watch opened through the session, and is
/// idempotent. Dropping the session stops it.
pub struct Session {
    id: String,
    snapshot: SnapshotView,
    log: Arc<EventLog>,
    events: WatchHandle,
    /// Filtered watches opened via this session, cancelled on stop.
    watches: Mutex<Vec<Arc<WatchHandle>>>,
    stopped: AtomicBool,
}

impl Session {
    /// Open a session: capture the store snapshot at revision R, then
    /// subscribe to the log from R + 1.
    pub fn open(
        client_id: impl Into<String>,
        store: &RevisionedStore,
        log: Arc<EventLog>,
    ) -> Result<Self> {
        let id = client_id.into();
        let snapshot = store.snapshot();
        let events = log.watch(snapshot.revision().next())?;
        debug!(session = %id, revision = snapshot.revision().0, "session opened");

        Ok(Self {
            id,
            snapshot,
            log,
            events,
            watches: Mutex::new(Vec::new()),
            stopped: AtomicBool::new(false),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The revision the session's snapshot was captured at.
    pub fn revision(&self) -> Revision {
        self.snapshot.revision()
    }

    /// The initial snapshot view.
    pub fn snapshot(&self) -> &SnapshotView {
        &self.snapshot
    }

    /// The initial snapshot contents, revision-ascending.
    pub fn list(&self) -> Vec<KeyValue> {
        self.snapshot.iter().cloned().collect()
    }

    /// The session's primary stream: every change after the snapshot
    /// revision, in order.
    pub fn events(&self) -> &WatchHandle {
        &self.events
    }

    /// Watch one key, starting at `from`.
    ///
    /// Fails with [`CacheError::HistoryExceeded`] if `from` has already
    /// been evicted or compacted out of the log, and with
    /// [`CacheError::SessionStopped`] after [`stop`](Self::stop).
    pub fn watch(&self, key: impl Into<String>, from: Revision) -> Result<KeyWatch> {
        self.open_filtered(WatchFilter::Key(key.into()), from)
    }

    /// Watch every key under a prefix, starting at `from`.
    pub fn watch_prefix(&self, prefix: impl Into<String>, from: Revision) -> Result<KeyWatch> {
        self.open_filtered(WatchFilter::Prefix(prefix.into()), from)
    }

    fn open_filtered(&self, filter: WatchFilter, from: Revision) -> Result<KeyWatch> {
        if self.stopped.load(Ordering::SeqCst) {
            return Err(CacheError::SessionStopped);
        }
        let handle = Arc::new(self.log.watch(from)?);
        self.watches.lock().push(Arc::clone(&handle));
        Ok(KeyWatch {
            inner: handle,
            filter,
        })
    }

    /// Cancel the primary stream and every watch opened through this
    /// session. Safe to call more than once or concurrently with
    /// delivery.
    pub fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        self.events.cancel();
        for handle in self.watches.lock().drain(..) {
            handle.cancel();
        }
        debug!(session = %self.id, "session stopped");
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.stop();
    }
}
