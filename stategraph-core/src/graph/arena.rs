//! Node Arena
//!
//! The arena owns every node of one tracker tree and counts the references
//! to each: one per incoming edge plus one per root handle. A node reached
//! through several members or from several parents is stored once.
//!
//! # Lifecycle
//!
//! 1. [`insert`](Arena::insert) a node, then [`acquire`](Arena::acquire) it
//!    from its parent (or make it the root).
//! 2. When a parent stops pointing at a child, remove the edge from the
//!    parent's data and [`release`](Arena::release) it. A node whose count
//!    drops to zero is freed, and its own children are released in turn.
//! 3. Reference counts alone cannot free a cycle that lost its last edge
//!    from outside. `release` notices a surviving node that can no longer
//!    reach the root and sweeps everything unreachable.
//!
//! Freed node data is handed back to the caller, who still owns whatever the
//! data holds (subscriptions, lookups by object identity).

use std::collections::{HashMap, HashSet, VecDeque};

use super::node::{Entry, GraphNode, NodeId};

/// Reference-counted node storage for one tree.
#[derive(Debug)]
pub struct Arena<T> {
    /// All nodes, indexed by ID.
    nodes: HashMap<NodeId, Entry<T>>,
    root: Option<NodeId>,
}

impl<T: GraphNode> Arena<T> {
    /// Create a new empty arena.
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            root: None,
        }
    }

    /// Add a node with no references.
    pub fn insert(&mut self, data: T) -> NodeId {
        let id = NodeId::new();
        self.nodes.insert(id, Entry::new(data));
        id
    }

    /// Get a reference to a node.
    pub fn get(&self, id: NodeId) -> Option<&T> {
        self.nodes.get(&id).map(|e| &e.data)
    }

    /// Get a mutable reference to a node.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.nodes.get_mut(&id).map(|e| &mut e.data)
    }

    /// True if the node is alive.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Get the total number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the arena holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The root node, once set.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Make `id` the root and hold a root handle on it.
    pub fn set_root(&mut self, id: NodeId) {
        if let Some(entry) = self.nodes.get_mut(&id) {
            entry.roots += 1;
            self.root = Some(id);
        }
    }

    /// Incoming edges, one entry per edge.
    pub fn parents(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(&id).map(|e| e.parents.as_slice()).unwrap_or(&[])
    }

    /// Incoming edges plus root handles.
    pub fn ref_count(&self, id: NodeId) -> usize {
        self.nodes.get(&id).map_or(0, Entry::ref_count)
    }

    /// Record an edge from `parent` to `child`.
    pub fn acquire(&mut self, parent: NodeId, child: NodeId) {
        if let Some(entry) = self.nodes.get_mut(&child) {
            entry.parents.push(parent);
        }
    }

    /// Drop an edge from `parent` to `child`, returning every node freed.
    ///
    /// The edge must already be gone from the parent's data.
    pub fn release(&mut self, parent: NodeId, child: NodeId) -> Vec<T> {
        let mut freed = Vec::new();
        let mut survivors = Vec::new();
        let mut pending = vec![(parent, child)];

        while let Some((parent, child)) = pending.pop() {
            let Some(entry) = self.nodes.get_mut(&child) else {
                continue;
            };
            if !entry.remove_parent(parent) {
                continue;
            }
            if entry.ref_count() > 0 {
                survivors.push(child);
                continue;
            }
            if let Some(entry) = self.nodes.remove(&child) {
                pending.extend(entry.data.children().into_iter().map(|c| (child, c)));
                freed.push(entry.data);
            }
        }

        let orphaned = survivors
            .iter()
            .any(|id| self.contains(*id) && self.path_from_root(*id).is_none());
        if orphaned {
            freed.extend(self.sweep_unreachable());
        }
        freed
    }

    /// Free every node the root can no longer reach.
    pub fn sweep_unreachable(&mut self) -> Vec<T> {
        let reachable = self.reachable();
        let dead: HashSet<NodeId> = self
            .nodes
            .keys()
            .filter(|id| !reachable.contains(id))
            .copied()
            .collect();
        if dead.is_empty() {
            return Vec::new();
        }

        let freed = dead
            .iter()
            .filter_map(|id| self.nodes.remove(id))
            .map(|e| e.data)
            .collect();
        for entry in self.nodes.values_mut() {
            entry.parents.retain(|p| !dead.contains(p));
        }
        freed
    }

    /// Remove every node, root included.
    pub fn drain(&mut self) -> Vec<T> {
        self.root = None;
        self.nodes.drain().map(|(_, e)| e.data).collect()
    }

    /// Walk up from `start`, breadth first.
    ///
    /// `visit` is called once per node. Returning true continues the walk
    /// to the node's parents; returning false stops it along that route.
    pub fn propagate<F>(&mut self, start: NodeId, mut visit: F)
    where
        F: FnMut(&mut Self, NodeId) -> bool,
    {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([start]);

        while let Some(id) = queue.pop_front() {
            if !visited.insert(id) {
                continue;
            }
            if visit(self, id) {
                if let Some(entry) = self.nodes.get(&id) {
                    queue.extend(entry.parents.iter().copied());
                }
            }
        }
    }

    /// The shortest chain of nodes from the root down to `id`, both included.
    pub fn path_from_root(&self, id: NodeId) -> Option<Vec<NodeId>> {
        let root = self.root?;
        if !self.contains(id) {
            return None;
        }
        // Maps a node to the child it was reached from.
        let mut came_from: HashMap<NodeId, NodeId> = HashMap::new();
        let mut visited = HashSet::from([id]);
        let mut queue = VecDeque::from([id]);

        while let Some(current) = queue.pop_front() {
            if current == root {
                let mut chain = vec![root];
                let mut node = root;
                while let Some(next) = came_from.get(&node) {
                    chain.push(*next);
                    node = *next;
                }
                return Some(chain);
            }
            for parent in self.parents(current) {
                if visited.insert(*parent) {
                    came_from.insert(*parent, current);
                    queue.push_back(*parent);
                }
            }
        }
        None
    }

    fn reachable(&self) -> HashSet<NodeId> {
        let mut reachable = HashSet::new();
        let mut queue: VecDeque<NodeId> = self.root.into_iter().collect();
        while let Some(id) = queue.pop_front() {
            if !reachable.insert(id) {
                continue;
            }
            if let Some(entry) = self.nodes.get(&id) {
                queue.extend(entry.data.children());
            }
        }
        reachable
    }
}

impl<T: GraphNode> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct TestNode {
        name: &'static str,
        children: Vec<NodeId>,
    }

    impl GraphNode for TestNode {
        fn children(&self) -> Vec<NodeId> {
            self.children.clone()
        }
    }

    fn node(name: &'static str) -> TestNode {
        TestNode {
            name,
            children: Vec::new(),
        }
    }

    fn link(arena: &mut Arena<TestNode>, parent: NodeId, child: NodeId) {
        arena.get_mut(parent).unwrap().children.push(child);
        arena.acquire(parent, child);
    }

    fn unlink(arena: &mut Arena<TestNode>, parent: NodeId, child: NodeId) -> Vec<&'static str> {
        let children = &mut arena.get_mut(parent).unwrap().children;
        let i = children.iter().position(|c| *c == child).unwrap();
        children.remove(i);
        let mut names: Vec<_> = arena.release(parent, child).into_iter().map(|n| n.name).collect();
        names.sort_unstable();
        names
    }

    #[test]
    fn release_cascades_to_children() {
        let mut arena = Arena::new();
        let root = arena.insert(node("root"));
        arena.set_root(root);
        let a = arena.insert(node("a"));
        let b = arena.insert(node("b"));
        link(&mut arena, root, a);
        link(&mut arena, a, b);

        assert_eq!(arena.len(), 3);
        assert_eq!(unlink(&mut arena, root, a), ["a", "b"]);
        assert_eq!(arena.len(), 1);
        assert!(arena.contains(root));
    }

    #[test]
    fn shared_nodes_survive_until_the_last_edge() {
        let mut arena = Arena::new();
        let root = arena.insert(node("root"));
        arena.set_root(root);
        let shared = arena.insert(node("shared"));
        link(&mut arena, root, shared);
        link(&mut arena, root, shared);
        assert_eq!(arena.ref_count(shared), 2);

        assert!(unlink(&mut arena, root, shared).is_empty());
        assert_eq!(arena.ref_count(shared), 1);
        assert_eq!(unlink(&mut arena, root, shared), ["shared"]);
    }

    #[test]
    fn detached_cycles_are_swept() {
        let mut arena = Arena::new();
        let root = arena.insert(node("root"));
        arena.set_root(root);
        let a = arena.insert(node("a"));
        let b = arena.insert(node("b"));
        link(&mut arena, root, a);
        link(&mut arena, a, b);
        link(&mut arena, b, a);

        assert_eq!(unlink(&mut arena, root, a), ["a", "b"]);
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn cycles_through_the_root_are_kept() {
        let mut arena = Arena::new();
        let root = arena.insert(node("root"));
        arena.set_root(root);
        let a = arena.insert(node("a"));
        let b = arena.insert(node("b"));
        link(&mut arena, root, a);
        link(&mut arena, a, root);
        link(&mut arena, root, b);

        assert_eq!(unlink(&mut arena, root, b), ["b"]);
        assert_eq!(arena.ref_count(root), 2);
        assert_eq!(arena.parents(a), [root]);
    }

    #[test]
    fn path_from_root_is_shortest() {
        let mut arena = Arena::new();
        let root = arena.insert(node("root"));
        arena.set_root(root);
        let a = arena.insert(node("a"));
        let b = arena.insert(node("b"));
        let c = arena.insert(node("c"));
        link(&mut arena, root, a);
        link(&mut arena, a, b);
        link(&mut arena, b, c);
        link(&mut arena, root, c);

        assert_eq!(arena.path_from_root(c), Some(vec![root, c]));
        assert_eq!(arena.path_from_root(b), Some(vec![root, a, b]));
        assert_eq!(arena.path_from_root(root), Some(vec![root]));
    }

    #[test]
    fn propagate_stops_where_visit_says_so() {
        let mut arena = Arena::new();
        let root = arena.insert(node("root"));
        arena.set_root(root);
        let a = arena.insert(node("a"));
        let b = arena.insert(node("b"));
        link(&mut arena, root, a);
        link(&mut arena, a, b);

        let mut seen = Vec::new();
        arena.propagate(b, |arena, id| {
            let name = arena.get(id).unwrap().name;
            seen.push(name);
            name != "a"
        });
        assert_eq!(seen, ["b", "a"]);
    }

    #[test]
    fn drain_empties_the_arena() {
        let mut arena = Arena::new();
        let root = arena.insert(node("root"));
        arena.set_root(root);
        let a = arena.insert(node("a"));
        link(&mut arena, root, a);

        assert_eq!(arena.drain().len(), 2);
        assert!(arena.is_empty());
        assert!(arena.root().is_none());
    }
}
