//! Immutable point-in-time view of store state.

use crate::types::{KeyValue, Revision};
use std::collections::HashMap;

/// A deep-copied, revision-ordered view of the store at one instant.
///
/// Built once by [`RevisionedStore::snapshot`](crate::RevisionedStore::snapshot)
/// and never mutated afterwards, so it is safe for unlimited concurrent
/// reads and reflects no later store mutation.
pub struct SnapshotView {
    /// All entries at capture time, revision-ascending. This order is
    /// the stable iteration order for `list` and `page`.
    items: Vec<KeyValue>,
    /// Key -> position in `items`.
    index: HashMap<String, usize>,
    /// Global revision at capture time.
    revision: Revision,
}

impl SnapshotView {
    /// Build a view from already-copied entries.
    ///
    /// Entries are sorted by revision here so construction is the only
    /// place ordering is established.
    pub(crate) fn new(mut items: Vec<KeyValue>, revision: Revision) -> Self {
        items.sort_by_key(|kv| kv.revision);
        let index = items
            .iter()
            .enumerate()
            .map(|(i, kv)| (kv.key.clone(), i))
            .collect();
        Self {
            items,
            index,
            revision,
        }
    }

    /// Look up a single key.
    pub fn get(&self, key: &str) -> Option<KeyValue> {
        self.index.get(key).map(|&i| self.items[i].clone())
    }

    /// All entries whose key starts with `prefix`, in revision-ascending
    /// order.
    pub fn list(&self, prefix: &str) -> Vec<KeyValue> {
        self.items
            .iter()
            .filter(|kv| kv.key.starts_with(prefix))
            .cloned()
            .collect()
    }

    /// One page of the revision-ordered sequence.
    ///
    /// Pages are 1-based. A page beyond the end, a zero page number, or
    /// a zero size all return an empty vector rather than an error.
    pub fn page(&self, page: usize, size: usize) -> Vec<KeyValue> {
        if page == 0 || size == 0 {
            return Vec::new();
        }
        let start = (page - 1) * size;
        if start >= self.items.len() {
            return Vec::new();
        }
        let end = (start + size).min(self.items.len());
        self.items[start..end].to_vec()
    }

    /// The global revision this view was captured at.
    pub fn revision(&self) -> Revision {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate all entries in revision-ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &KeyValue> {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kv(key: &str, rev: i64) -> KeyValue {
        KeyValue {
            key: key.to_string(),
            value: format!("v{}", rev).into_bytes(),
            revision: Revision(rev),
        }
    }

    fn view() -> SnapshotView {
        // Deliberately unsorted input; construction sorts by revision.
        SnapshotView::new(
            vec![kv("b", 2), kv("aa", 3), kv("a", 1)],
            Revision(3),
        )
    }

    #[test]
    fn test_get() {
        let v = view();
        assert_eq!(v.get("a").unwrap().revision, Revision(1));
        assert!(v.get("missing").is_none());
    }

    #[test]
    fn test_list_prefix_in_revision_order() {
        let v = view();
        let listed = v.list("a");
        let keys: Vec<&str> = listed.iter().map(|kv| kv.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "aa"]);
        assert!(v.list("zzz").is_empty());
        // Empty prefix matches everything.
        assert_eq!(v.list("").len(), 3);
    }

    #[test]
    fn test_page() {
        let v = view();
        let revs = |page, size| {
            v.page(page, size)
                .iter()
                .map(|kv| kv.revision.0)
                .collect::<Vec<_>>()
        };
        assert_eq!(revs(1, 2), vec![1, 2]);
        assert_eq!(revs(2, 2), vec![3]);
        assert_eq!(revs(3, 2), Vec::<i64>::new());
        assert_eq!(revs(0, 2), Vec::<i64>::new());
        assert_eq!(revs(1, 0), Vec::<i64>::new());
    }

    #[test]
    fn test_revision_and_len() {
        let v = view();
        assert_eq!(v.revision(), Revision(3));
        assert_eq!(v.len(), 3);
        assert!(!v.is_empty());
    }
}
