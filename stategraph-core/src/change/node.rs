//! Change tracker nodes.

use indexmap::IndexMap;

use crate::graph::{Edge, GraphNode, NodeId};
use crate::notify::SubscriptionId;
use crate::reflect::ObjectRef;

/// Mirror of one tracked object.
///
/// Only slots holding a tracked object have an edge. Leaves, ignored members
/// and identities kept by reference have none.
#[derive(Debug)]
pub(crate) struct ChangeNode {
    pub(crate) object: ObjectRef,
    pub(crate) edges: IndexMap<Edge, NodeId>,
    pub(crate) subscription: Option<SubscriptionId>,
}

impl ChangeNode {
    pub(crate) fn new(object: &ObjectRef) -> Self {
        Self {
            object: object.clone(),
            edges: IndexMap::new(),
            subscription: None,
        }
    }

    /// The edge that leads to `child`, if any.
    pub(crate) fn edge_to(&self, child: NodeId) -> Option<&Edge> {
        self.edges
            .iter()
            .find_map(|(edge, id)| (*id == child).then_some(edge))
    }

    pub(crate) fn unsubscribe(&mut self) {
        if let (Some(id), Some(notifier)) = (self.subscription.take(), self.object.notifier()) {
            notifier.unsubscribe(id);
        }
    }
}

impl GraphNode for ChangeNode {
    fn children(&self) -> Vec<NodeId> {
        self.edges.values().copied().collect()
    }
}
