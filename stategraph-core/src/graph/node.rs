//! Graph Nodes
//!
//! This module defines the node handles and bookkeeping that live in the
//! arena.

use std::sync::atomic::{AtomicU64, Ordering};

use smallvec::SmallVec;

/// Unique identifier for a node in a tracker arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Generate a new unique node ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// Node data stored in an [`Arena`](super::Arena).
///
/// The arena owns the parent side of every edge. The child side lives in the
/// node data, which is why the arena asks the data for it when a node is
/// freed or when it walks down from the root.
pub trait GraphNode {
    /// Every outgoing edge, once per edge. A child reached through two
    /// members appears twice.
    fn children(&self) -> Vec<NodeId>;
}

/// Arena bookkeeping for one node.
#[derive(Debug)]
pub(super) struct Entry<T> {
    pub(super) data: T,

    /// One entry per incoming edge. A parent holding the node through two
    /// members is listed twice.
    pub(super) parents: SmallVec<[NodeId; 2]>,

    /// Number of root handles.
    pub(super) roots: usize,
}

impl<T> Entry<T> {
    pub(super) fn new(data: T) -> Self {
        Self {
            data,
            parents: SmallVec::new(),
            roots: 0,
        }
    }

    /// Incoming edges plus root handles.
    pub(super) fn ref_count(&self) -> usize {
        self.parents.len() + self.roots
    }

    /// Drop one incoming edge from `parent`. Returns false if there was none.
    pub(super) fn remove_parent(&mut self, parent: NodeId) -> bool {
        match self.parents.iter().position(|p| *p == parent) {
            Some(i) => {
                self.parents.swap_remove(i);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_ids_are_unique() {
        let id1 = NodeId::new();
        let id2 = NodeId::new();
        assert_ne!(id1, id2);
        assert!(id2.raw() > id1.raw());
    }

    #[test]
    fn parents_form_a_multiset() {
        let mut entry = Entry::new(());
        let parent = NodeId::new();
        entry.parents.push(parent);
        entry.parents.push(parent);
        entry.roots = 1;
        assert_eq!(entry.ref_count(), 3);

        assert!(entry.remove_parent(parent));
        assert_eq!(entry.ref_count(), 2);
        assert!(entry.remove_parent(parent));
        assert!(!entry.remove_parent(parent));
        assert_eq!(entry.ref_count(), 1);
    }
}
