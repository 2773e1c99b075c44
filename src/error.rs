//! Error types for the revision cache.

use crate::types::Revision;
use thiserror::Error;

/// Main error type for cache operations.
///
/// Stale revisions and missing keys are deliberately not represented
/// here: the former is a defined no-op (`apply_*` returns `false`), the
/// latter an `Option` result.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Unsupported change kind tag: {0}")]
    UnsupportedChangeKind(i32),

    #[error("Invalid event log capacity: {0}")]
    InvalidCapacity(usize),

    #[error("History exceeded: revision {needed} required but log is compacted through {compacted}")]
    HistoryExceeded {
        /// The revision the caller needs to resume from.
        needed: Revision,
        /// The highest revision removed from the log so far.
        compacted: Revision,
    },

    #[error("Session is stopped")]
    SessionStopped,

    #[error("Watch stream is closed")]
    WatchClosed,
}

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
