//! Ordered, identity-deduplicated element collections.
//!
//! Selector output, filter output, and the final result of a path
//! evaluation are all logically *sets with memory of arrival order*: an
//! element appears at most once, at the position where it first arrived.
//! [`CandidateSet`] implements that with a cost model tuned for the common
//! case -- most candidate lists are tiny, so membership starts as a linear
//! scan over the backing vector and only switches to a hash set once the
//! list outgrows a small threshold.

use std::collections::HashSet;

use crate::tree::NodeId;

/// Below this length membership checks are linear scans; at this length a
/// hash set is allocated and maintained for the rest of the set's life.
const LINEAR_SCAN_MAX: usize = 16;

/// An insertion-ordered set of element handles.
///
/// Membership is by element identity (`NodeId` equality), never by tag or
/// content. Candidate sets live only for the duration of a single path
/// evaluation.
#[derive(Debug, Default)]
pub(crate) struct CandidateSet {
    /// Elements in first-arrival order.
    items: Vec<NodeId>,
    /// Lazily allocated membership index, present once `items` has reached
    /// `LINEAR_SCAN_MAX` entries.
    lookup: Option<HashSet<NodeId>>,
}

impl CandidateSet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Appends `id` unless it is already present. Returns `true` if the
    /// element was inserted.
    pub(crate) fn add(&mut self, id: NodeId) -> bool {
        if self.contains(id) {
            return false;
        }
        self.items.push(id);
        match &mut self.lookup {
            Some(set) => {
                set.insert(id);
            }
            None if self.items.len() >= LINEAR_SCAN_MAX => {
                self.lookup = Some(self.items.iter().copied().collect());
            }
            None => {}
        }
        true
    }

    /// Appends every absent element of `other`, preserving `other`'s order.
    pub(crate) fn merge<I: IntoIterator<Item = NodeId>>(&mut self, other: I) {
        for id in other {
            self.add(id);
        }
    }

    pub(crate) fn contains(&self, id: NodeId) -> bool {
        match &self.lookup {
            Some(set) => set.contains(&id),
            None => self.items.contains(&id),
        }
    }

    /// Consumes the set, returning the elements in first-arrival order.
    pub(crate) fn into_vec(self) -> Vec<NodeId> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Document;

    /// Builds a document with `n` sibling elements and returns their ids.
    fn make_ids(n: usize) -> Vec<NodeId> {
        let mut doc = Document::new();
        let root = doc.root();
        (0..n).map(|_| doc.create_element(root, "e")).collect()
    }

    #[test]
    fn test_add_preserves_first_arrival_order() {
        let ids = make_ids(3);
        let mut set = CandidateSet::new();
        assert!(set.add(ids[1]));
        assert!(set.add(ids[0]));
        assert!(set.add(ids[2]));

        assert_eq!(set.into_vec(), vec![ids[1], ids[0], ids[2]]);
    }

    #[test]
    fn test_add_rejects_duplicates() {
        let ids = make_ids(2);
        let mut set = CandidateSet::new();
        assert!(set.add(ids[0]));
        assert!(!set.add(ids[0]));
        assert!(set.add(ids[1]));
        assert!(!set.add(ids[0]));

        assert_eq!(set.into_vec(), vec![ids[0], ids[1]]);
    }

    #[test]
    fn test_merge_keeps_receiver_positions() {
        let ids = make_ids(4);
        let mut set = CandidateSet::new();
        set.add(ids[0]);
        set.add(ids[1]);

        // ids[1] is already present; only ids[2] and ids[3] append.
        set.merge([ids[1], ids[2], ids[3], ids[0]]);
        assert_eq!(set.into_vec(), vec![ids[0], ids[1], ids[2], ids[3]]);
    }

    #[test]
    fn test_dedup_across_small_to_large_transition() {
        let ids = make_ids(100);
        let mut set = CandidateSet::new();
        for &id in &ids {
            set.add(id);
        }
        assert!(set.lookup.is_some());

        // Every re-add is rejected after the hash set takes over.
        for &id in &ids {
            assert!(!set.add(id));
            assert!(set.contains(id));
        }
        assert_eq!(set.into_vec(), ids);
    }

    #[test]
    fn test_small_sets_never_allocate_lookup() {
        let ids = make_ids(LINEAR_SCAN_MAX - 1);
        let mut set = CandidateSet::new();
        for &id in &ids {
            set.add(id);
        }
        assert!(set.lookup.is_none());
        assert_eq!(set.into_vec(), ids);
    }
}
