//! Core types for the revision cache.

use crate::error::{CacheError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Monotonically increasing revision assigned to each accepted change.
///
/// Revisions order changes globally and drive staleness checks: a change
/// carrying a revision at or below a key's current revision is a no-op.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Revision(pub i64);

impl Revision {
    /// Revision zero, before any change has been accepted.
    pub const ZERO: Revision = Revision(0);

    pub fn next(self) -> Self {
        Revision(self.0 + 1)
    }
}

impl fmt::Debug for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rev({})", self.0)
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of operation recorded in a change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Put,
    Delete,
}

impl ChangeKind {
    /// Decode a wire-level tag into a kind.
    ///
    /// Remote notification streams carry the operation as a raw integer;
    /// anything other than the known tags is rejected as
    /// [`CacheError::UnsupportedChangeKind`].
    pub fn from_raw(tag: i32) -> Result<Self> {
        match tag {
            0 => Ok(ChangeKind::Put),
            1 => Ok(ChangeKind::Delete),
            other => Err(CacheError::UnsupportedChangeKind(other)),
        }
    }
}

/// An immutable record of one accepted put or delete.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    /// Put or delete.
    pub kind: ChangeKind,

    /// The key that changed.
    pub key: String,

    /// The new value; `None` for deletes.
    pub value: Option<Vec<u8>>,

    /// Local monotonic revision assigned by the cache.
    pub revision: Revision,

    /// The remote store's own revision for this change (opaque).
    pub source_revision: Revision,
}

impl Change {
    /// Build a put change.
    pub fn put(
        key: impl Into<String>,
        value: Vec<u8>,
        revision: Revision,
        source_revision: Revision,
    ) -> Self {
        Self {
            kind: ChangeKind::Put,
            key: key.into(),
            value: Some(value),
            revision,
            source_revision,
        }
    }

    /// Build a delete change.
    pub fn delete(key: impl Into<String>, revision: Revision, source_revision: Revision) -> Self {
        Self {
            kind: ChangeKind::Delete,
            key: key.into(),
            value: None,
            revision,
            source_revision,
        }
    }
}

/// Current value and revision for one key, owned by the store.
///
/// Entries never leave the store by reference; every read clones.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub key: String,
    pub value: Vec<u8>,
    pub revision: Revision,
}

/// A key-value triple as returned by snapshot reads.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: Vec<u8>,
    pub revision: Revision,
}

impl From<&Entry> for KeyValue {
    fn from(entry: &Entry) -> Self {
        Self {
            key: entry.key.clone(),
            value: entry.value.clone(),
            revision: entry.revision,
        }
    }
}
