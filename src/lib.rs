//! # Revision Cache
//!
//! A local, in-memory caching layer in front of a remote,
//! revision-versioned key-value store and its change-notification
//! stream.
//!
//! ## Core Concepts
//!
//! - **RevisionedStore**: the authoritative key space; applies ordered
//!   changes, rejects stale revisions, advances a global revision
//! - **EventLog**: bounded, append-only history of accepted changes
//!   with replay, compaction, and live-tail watches
//! - **SnapshotView**: deep-copied, revision-ordered view at one instant
//! - **Session**: a consumer's snapshot plus a gapless stream of every
//!   change after it
//!
//! ## Example
//!
//! ```
//! use revcache::{EventLog, Revision, RevisionedStore, Session};
//! use std::sync::Arc;
//!
//! let log = Arc::new(EventLog::new(1024)?);
//! let store = RevisionedStore::new().with_log(Arc::clone(&log));
//!
//! // Changes arrive pre-ordered from the remote store's watch stream.
//! store.apply_put("user/alice", b"{}".to_vec(), Revision(1));
//!
//! // A consumer gets the state at revision 1 plus everything after it.
//! let session = Session::open("client-1", &store, Arc::clone(&log))?;
//! store.apply_put("user/bob", b"{}".to_vec(), Revision(2));
//!
//! assert_eq!(session.list().len(), 1);
//! assert_eq!(session.events().recv()?.revision, Revision(2));
//! session.stop();
//! # Ok::<(), revcache::CacheError>(())
//! ```

pub mod error;
pub mod log;
pub mod session;
pub mod sink;
pub mod snapshot;
pub mod source;
pub mod store;
pub mod types;

// Re-exports
pub use error::{CacheError, Result};
pub use log::{EventLog, WatchHandle, WatchId};
pub use session::{KeyWatch, Session, WatchFilter};
pub use sink::{EventSink, MirrorSink, SinkSet};
pub use snapshot::SnapshotView;
pub use source::{ChangeSource, VecSource};
pub use store::RevisionedStore;
pub use types::{Change, ChangeKind, Entry, KeyValue, Revision};
