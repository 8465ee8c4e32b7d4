//! Dirty tracker nodes.

use indexmap::IndexMap;

use crate::graph::{Edge, GraphNode, NodeId};
use crate::notify::SubscriptionId;
use crate::reflect::ObjectRef;

/// Constant edge states that need no node of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Sentinel {
    /// The slot differs as a whole: two different leaves, objects of
    /// different types, an object and null, or two identities compared by
    /// reference.
    AlwaysDirty,
    /// The slot never takes part: an ignored member or an indexer.
    NeverDirty,
}

/// What an edge of a node points at. An edge that is absent is an equal leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    Child(NodeId),
    Sentinel(Sentinel),
}

/// Mirror of one `(x, y)` object pair.
#[derive(Debug)]
pub(crate) struct DirtyNode {
    pub(crate) x: ObjectRef,
    pub(crate) y: ObjectRef,
    pub(crate) edges: IndexMap<Edge, Slot>,
    /// Whether the pair differs anywhere below. Kept current by upward
    /// propagation.
    pub(crate) dirty: bool,
    pub(crate) x_subscription: Option<SubscriptionId>,
    pub(crate) y_subscription: Option<SubscriptionId>,
}

impl DirtyNode {
    pub(crate) fn new(x: &ObjectRef, y: &ObjectRef) -> Self {
        Self {
            x: x.clone(),
            y: y.clone(),
            edges: IndexMap::new(),
            dirty: false,
            x_subscription: None,
            y_subscription: None,
        }
    }

    /// True if one of the node's own slots differs.
    pub(crate) fn has_difference(&self) -> bool {
        self.edges
            .values()
            .any(|s| *s == Slot::Sentinel(Sentinel::AlwaysDirty))
    }

    /// Remove every notification handler this node registered.
    pub(crate) fn unsubscribe(&mut self) {
        if let (Some(id), Some(notifier)) = (self.x_subscription.take(), self.x.notifier()) {
            notifier.unsubscribe(id);
        }
        if let (Some(id), Some(notifier)) = (self.y_subscription.take(), self.y.notifier()) {
            notifier.unsubscribe(id);
        }
    }
}

impl GraphNode for DirtyNode {
    fn children(&self) -> Vec<NodeId> {
        self.edges
            .values()
            .filter_map(|s| match s {
                Slot::Child(id) => Some(*id),
                Slot::Sentinel(_) => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::Index;
    use crate::test_types::pair_with;

    #[test]
    fn children_skip_sentinels() {
        let (a, b) = (pair_with("a", 1), pair_with("a", 1));
        let mut node = DirtyNode::new(&a, &b);
        let child = NodeId::new();
        node.edges.insert(Edge::Index(Index::Position(0)), Slot::Child(child));
        node.edges.insert(Edge::Index(Index::Position(1)), Slot::Sentinel(Sentinel::NeverDirty));
        assert_eq!(node.children(), vec![child]);
        assert!(!node.has_difference());

        node.edges.insert(Edge::Index(Index::Position(2)), Slot::Sentinel(Sentinel::AlwaysDirty));
        assert!(node.has_difference());
    }
}
