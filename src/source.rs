//! Upstream change producers.

use crate::types::Change;

/// Producer of pre-ordered change notifications.
///
/// The wire client that talks to the remote store implements this; the
/// cache only assumes changes arrive already ordered, exactly once
/// each. Connection lifecycle, retries, and reconnection stay on the
/// source's side of the boundary.
pub trait ChangeSource {
    /// The next change, or `None` when the source is exhausted.
    fn next_change(&mut self) -> Option<Change>;
}

/// A source over a fixed list of changes, for tests and demos.
pub struct VecSource {
    changes: std::vec::IntoIter<Change>,
}

impl VecSource {
    pub fn new(changes: Vec<Change>) -> Self {
        Self {
            changes: changes.into_iter(),
        }
    }
}

impl ChangeSource for VecSource {
    fn next_change(&mut self) -> Option<Change> {
        self.changes.next()
    }
}
