//! Dirty Tracker Implementation
//!
//! The tracker mirrors a pair of graphs with one [`DirtyNode`] per pair of
//! objects reached at the same position on both sides. A node's edges say,
//! per member or element, whether that slot is equal (no edge), differs as a
//! whole ([`Sentinel::AlwaysDirty`]), takes no part
//! ([`Sentinel::NeverDirty`]) or leads to another pair (a child node).
//!
//! # Updates
//!
//! Every node subscribes to both of its objects. A notification resyncs the
//! affected edges of that node only:
//!
//! 1. Read both sides of the slot and compute the new edge. A new pair of
//!    objects gets a node (shared if the pair is already mirrored).
//! 2. Acquire the new child before releasing the old one, so a child that
//!    stays is never freed in between.
//! 3. Settle the dirty flags of nodes created on the way, then walk up from
//!    the notified node. A new difference marks ancestors until one is
//!    already dirty.
//!
//! A node is dirty when some node reachable from it has an `AlwaysDirty`
//! edge. When a node loses its own difference, its flag and those of its
//! ancestors are settled again from the edges, so a cycle can never keep
//! itself dirty after the difference is gone.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use super::node::{DirtyNode, Sentinel, Slot};
use crate::diff::ValueDiff;
use crate::graph::{Arena, Edge, NodeId};
use crate::notify::{CollectionChange, Notification, Notifier, SubscriptionId};
use crate::reflect::{Index, ObjectId, ObjectRef, Value};
use crate::settings::{MemberSettings, ReferenceHandling};
use crate::verify::{is_tracking_leaf, verify_can_track_dirty};
use crate::walk::equal;
use crate::{Error, Result};

const ALWAYS_DIRTY: Slot = Slot::Sentinel(Sentinel::AlwaysDirty);
const NEVER_DIRTY: Slot = Slot::Sentinel(Sentinel::NeverDirty);

/// Raised after a notification changed the difference between the graphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyTrackerEvent {
    /// Whether the graphs differ now.
    pub is_dirty: bool,
    /// Whether `is_dirty` flipped with this change.
    pub dirty_changed: bool,
}

/// Live comparison of two object graphs.
///
/// Construction walks both graphs once. From then on the tracker follows the
/// change notifications of every object it mirrors and keeps
/// [`is_dirty`](Self::is_dirty) and [`diff`](Self::diff) current without
/// walking the graphs again.
///
/// Dropping the tracker (or calling [`dispose`](Self::dispose)) removes every
/// notification handler it registered.
///
/// ```rust
/// use std::sync::OnceLock;
/// use stategraph_core::reflect::{types, Record, TypeInfo, Value};
/// use stategraph_core::{DirtyTracker, MemberSettings, ReferenceHandling};
///
/// fn pair() -> &'static TypeInfo {
///     static TYPE: OnceLock<TypeInfo> = OnceLock::new();
///     TYPE.get_or_init(|| {
///         TypeInfo::class("DirtyDocPair")
///             .property("name", types::string)
///             .property("value", types::int)
///             .build()
///     })
/// }
///
/// let x = Record::with(pair(), [("name", Value::from("a"))]).unwrap();
/// let y = Record::with(pair(), [("name", Value::from("a"))]).unwrap();
/// let settings = MemberSettings::properties(ReferenceHandling::Structural);
/// let tracker = DirtyTracker::new(&x, &y, settings).unwrap();
/// assert!(!tracker.is_dirty());
///
/// x.set("value", Value::from(1)).unwrap();
/// assert!(tracker.is_dirty());
/// assert_eq!(tracker.diff().unwrap().unwrap().to_string(), "DirtyDocPair\n  value x: 1 y: 0");
/// ```
pub struct DirtyTracker {
    shared: Arc<Shared>,
}

struct Shared {
    state: Mutex<State>,
    events: Notifier<DirtyTrackerEvent>,
}

struct State {
    this: Weak<Shared>,
    settings: Arc<MemberSettings>,
    arena: Arena<DirtyNode>,
    by_pair: HashMap<(ObjectId, ObjectId), NodeId>,
    disposed: bool,
}

impl DirtyTracker {
    /// Start tracking the difference between `x` and `y`.
    ///
    /// The type is verified for
    /// [`Requirement::TrackDirty`](crate::verify::Requirement::TrackDirty)
    /// first. Both objects must have the same runtime type.
    pub fn new(x: &ObjectRef, y: &ObjectRef, settings: Arc<MemberSettings>) -> Result<Self> {
        let ty = x.type_info();
        verify_can_track_dirty(ty, &settings)?;
        if !ty.ptr_eq(y.type_info()) {
            return Err(Error::TypeMismatch {
                expected: ty.name().to_string(),
                actual: y.type_info().name().to_string(),
            });
        }

        let shared = Arc::new_cyclic(|this| Shared {
            state: Mutex::new(State {
                this: this.clone(),
                settings,
                arena: Arena::new(),
                by_pair: HashMap::new(),
                disposed: false,
            }),
            events: Notifier::new(),
        });
        {
            let mut state = shared.state.lock();
            if let Err(err) = state.build(x, y) {
                state.dispose();
                return Err(err);
            }
            debug!(
                type_name = ty.name(),
                nodes = state.arena.len(),
                dirty = state.is_dirty(),
                "dirty tracker created"
            );
        }
        Ok(Self { shared })
    }

    /// True if the graphs currently differ. Always false once disposed.
    pub fn is_dirty(&self) -> bool {
        self.shared.state.lock().is_dirty()
    }

    /// The current difference, or `None` when the graphs are equal.
    pub fn diff(&self) -> Result<Option<ValueDiff>> {
        self.shared.state.lock().diff()
    }

    /// Register a handler for [`DirtyTrackerEvent`]s.
    ///
    /// Handlers run after the tracker has released its lock, so they may
    /// query the tracker or mutate the graphs.
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&DirtyTrackerEvent) + Send + Sync + 'static,
    {
        self.shared.events.subscribe(handler)
    }

    /// Remove an event handler.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.events.unsubscribe(id)
    }

    /// Number of object pairs mirrored.
    pub fn node_count(&self) -> usize {
        self.shared.state.lock().arena.len()
    }

    /// The settings the tracker compares with.
    pub fn settings(&self) -> Arc<MemberSettings> {
        Arc::clone(&self.shared.state.lock().settings)
    }

    /// Stop tracking and unsubscribe from every object.
    pub fn dispose(&self) {
        self.shared.state.lock().dispose();
    }

    /// True after [`dispose`](Self::dispose).
    pub fn is_disposed(&self) -> bool {
        self.shared.state.lock().disposed
    }
}

impl Drop for DirtyTracker {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for DirtyTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("DirtyTracker")
            .field("is_dirty", &state.is_dirty())
            .field("nodes", &state.arena.len())
            .field("disposed", &state.disposed)
            .finish()
    }
}

impl Shared {
    fn on_notification(&self, node: NodeId, notification: &Notification) {
        let event = self.state.lock().handle(node, notification);
        if let Some(event) = event {
            self.events.raise(&event);
        }
    }
}

impl State {
    fn build(&mut self, x: &ObjectRef, y: &ObjectRef) -> Result<()> {
        let root = self.insert_node(x, y);
        self.arena.set_root(root);
        let mut created = vec![root];
        self.fill(root, &mut created)?;
        self.settle(&created);
        Ok(())
    }

    fn is_dirty(&self) -> bool {
        self.arena
            .root()
            .and_then(|root| self.arena.get(root))
            .is_some_and(|node| node.dirty)
    }

    // ------------------------------------------------------------------------
    // Building
    // ------------------------------------------------------------------------

    fn insert_node(&mut self, x: &ObjectRef, y: &ObjectRef) -> NodeId {
        let id = self.arena.insert(DirtyNode::new(x, y));
        self.by_pair.insert((x.id(), y.id()), id);
        let x_subscription = self.subscribe(x, id);
        let y_subscription = if x.ptr_eq(y) {
            None
        } else {
            self.subscribe(y, id)
        };
        if let Some(node) = self.arena.get_mut(id) {
            node.x_subscription = x_subscription;
            node.y_subscription = y_subscription;
        }
        id
    }

    fn subscribe(&self, object: &ObjectRef, node: NodeId) -> Option<SubscriptionId> {
        let notifier = object.notifier()?;
        let this = self.this.clone();
        Some(notifier.subscribe(move |notification| {
            if let Some(shared) = this.upgrade() {
                shared.on_notification(node, notification);
            }
        }))
    }

    fn fill(&mut self, id: NodeId, created: &mut Vec<NodeId>) -> Result<()> {
        let Some(node) = self.arena.get(id) else {
            return Ok(());
        };
        let (x, y) = (node.x.clone(), node.y.clone());
        for edge in Edge::all(&self.settings, &x, &y) {
            if let Some(slot) = self.slot_for(id, &edge, &x, &y, created)? {
                if let Some(node) = self.arena.get_mut(id) {
                    node.edges.insert(edge, slot);
                }
            }
        }
        Ok(())
    }

    /// The edge `parent` needs for `edge`. A child node is acquired for it.
    fn slot_for(
        &mut self,
        parent: NodeId,
        edge: &Edge,
        x: &ObjectRef,
        y: &ObjectRef,
        created: &mut Vec<NodeId>,
    ) -> Result<Option<Slot>> {
        if edge.is_excluded(&self.settings) {
            return Ok(Some(NEVER_DIRTY));
        }
        let (a, b) = match (edge.read(x)?, edge.read(y)?) {
            (Some(a), Some(b)) => (a, b),
            (None, None) => return Ok(None),
            _ => return Ok(Some(ALWAYS_DIRTY)),
        };
        let (a, b) = match (&a, &b) {
            (Value::Object(a), Value::Object(b)) => (a, b),
            _ if a.same(&b) => return Ok(None),
            _ => return Ok(Some(ALWAYS_DIRTY)),
        };
        if a.ptr_eq(b) {
            return Ok(None);
        }
        let ty = a.type_info();
        if !ty.ptr_eq(b.type_info()) {
            return Ok(Some(ALWAYS_DIRTY));
        }
        if is_tracking_leaf(&self.settings, ty) {
            return Ok((!equal(a, b, &self.settings)?).then_some(ALWAYS_DIRTY));
        }
        if self.settings.reference_handling() != ReferenceHandling::Structural {
            return Ok(Some(ALWAYS_DIRTY));
        }

        let child = match self.by_pair.get(&(a.id(), b.id())) {
            Some(id) => *id,
            None => {
                let id = self.insert_node(a, b);
                created.push(id);
                self.fill(id, created)?;
                id
            }
        };
        self.arena.acquire(parent, child);
        Ok(Some(Slot::Child(child)))
    }

    // ------------------------------------------------------------------------
    // Dirty flags
    // ------------------------------------------------------------------------

    /// Compute the flags of freshly built nodes. Every other node's flag must
    /// be current.
    fn settle(&mut self, ids: &[NodeId]) {
        let fresh: HashSet<NodeId> = ids.iter().copied().collect();
        for id in ids {
            if let Some(node) = self.arena.get_mut(*id) {
                node.dirty = false;
            }
        }
        let mut queue: VecDeque<NodeId> = ids
            .iter()
            .copied()
            .filter(|id| self.dirty_from_edges(*id, &fresh))
            .collect();
        while let Some(id) = queue.pop_front() {
            match self.arena.get_mut(id) {
                Some(node) if !node.dirty => node.dirty = true,
                _ => continue,
            }
            queue.extend(self.arena.parents(id).iter().filter(|p| fresh.contains(*p)));
        }
    }

    fn dirty_from_edges(&self, id: NodeId, fresh: &HashSet<NodeId>) -> bool {
        let Some(node) = self.arena.get(id) else {
            return false;
        };
        node.edges.values().any(|slot| match slot {
            Slot::Sentinel(sentinel) => *sentinel == Sentinel::AlwaysDirty,
            Slot::Child(child) => {
                !fresh.contains(child) && self.arena.get(*child).is_some_and(|c| c.dirty)
            }
        })
    }

    /// Bring the flags above `start` up to date after its edges changed.
    ///
    /// A node that turns dirty marks its ancestors until one is already
    /// dirty. A dirty node without a difference of its own may only be kept
    /// dirty by a cycle through itself, so it and its ancestors are settled
    /// again. Nothing outside the ancestors can reach `start`.
    fn propagate(&mut self, start: NodeId) {
        let Some(node) = self.arena.get(start) else {
            return;
        };
        if node.dirty && node.has_difference() {
            return;
        }
        if !node.dirty {
            if self.dirty_from_edges(start, &HashSet::new()) {
                self.arena.propagate(start, |arena, id| match arena.get_mut(id) {
                    Some(node) if !node.dirty => {
                        node.dirty = true;
                        true
                    }
                    _ => false,
                });
            }
            return;
        }
        let mut ancestors = Vec::new();
        self.arena.propagate(start, |_, id| {
            ancestors.push(id);
            true
        });
        self.settle(&ancestors);
    }

    fn edge_is_dirty(&self, id: NodeId, edge: &Edge) -> bool {
        match self.arena.get(id).and_then(|node| node.edges.get(edge)) {
            Some(Slot::Sentinel(Sentinel::AlwaysDirty)) => true,
            Some(Slot::Child(child)) => self.arena.get(*child).is_some_and(|c| c.dirty),
            _ => false,
        }
    }

    // ------------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------------

    fn handle(&mut self, id: NodeId, notification: &Notification) -> Option<DirtyTrackerEvent> {
        if self.disposed {
            return None;
        }
        let node = self.arena.get(id)?;
        let (x, y) = (node.x.clone(), node.y.clone());
        trace!(type_name = x.type_info().name(), ?notification, "dirty tracker notified");

        let edges = self.affected_edges(id, &x, &y, notification)?;
        let was_dirty = self.is_dirty();
        let before: Vec<bool> = edges.iter().map(|e| self.edge_is_dirty(id, e)).collect();

        let mut created = Vec::new();
        for edge in &edges {
            if let Err(err) = self.resync(id, edge, &x, &y, &mut created) {
                warn!(%err, %edge, "could not refresh a tracked slot, marking it dirty");
                self.replace_slot(id, edge.clone(), Some(ALWAYS_DIRTY));
                let freed = self.arena.sweep_unreachable();
                self.forget(freed);
            }
        }
        created.retain(|node| self.arena.contains(*node));
        self.settle(&created);
        self.propagate(id);

        let is_dirty = self.is_dirty();
        let changed = before
            .into_iter()
            .zip(&edges)
            .any(|(before, edge)| before || self.edge_is_dirty(id, edge));
        (changed || was_dirty != is_dirty).then_some(DirtyTrackerEvent {
            is_dirty,
            dirty_changed: was_dirty != is_dirty,
        })
    }

    fn affected_edges(
        &self,
        id: NodeId,
        x: &ObjectRef,
        y: &ObjectRef,
        notification: &Notification,
    ) -> Option<Vec<Edge>> {
        match notification {
            Notification::PropertyChanged(Some(name)) => {
                let ty = x.type_info();
                let Some(member) = ty.member(name) else {
                    warn!(
                        type_name = ty.name(),
                        member = %name,
                        "notification names an unknown member"
                    );
                    return None;
                };
                let walked = self.settings.members(ty).iter().any(|m| m.ptr_eq(member));
                walked.then(|| vec![Edge::Member(member)])
            }
            Notification::PropertyChanged(None) => Some(self.all_edges(id, x, y)),
            Notification::CollectionChanged(change) => Some(match change {
                CollectionChange::Replace(index) => vec![Edge::Index(index.clone())],
                CollectionChange::Add(index @ Index::Key(_))
                | CollectionChange::Remove(index @ Index::Key(_)) => {
                    vec![Edge::Index(index.clone())]
                }
                _ => self.all_edges(id, x, y),
            }),
        }
    }

    /// Every current slot plus the node's stale edges.
    fn all_edges(&self, id: NodeId, x: &ObjectRef, y: &ObjectRef) -> Vec<Edge> {
        let mut edges = Edge::all(&self.settings, x, y);
        if let Some(node) = self.arena.get(id) {
            let current: HashSet<Edge> = edges.iter().cloned().collect();
            edges.extend(node.edges.keys().filter(|e| !current.contains(*e)).cloned());
        }
        edges
    }

    fn resync(
        &mut self,
        id: NodeId,
        edge: &Edge,
        x: &ObjectRef,
        y: &ObjectRef,
        created: &mut Vec<NodeId>,
    ) -> Result<()> {
        let slot = self.slot_for(id, edge, x, y, created)?;
        self.replace_slot(id, edge.clone(), slot);
        Ok(())
    }

    fn replace_slot(&mut self, id: NodeId, edge: Edge, slot: Option<Slot>) {
        let Some(node) = self.arena.get_mut(id) else {
            return;
        };
        let old = match slot {
            Some(slot) => node.edges.insert(edge, slot),
            None => node.edges.shift_remove(&edge),
        };
        if let Some(Slot::Child(child)) = old {
            let freed = self.arena.release(id, child);
            self.forget(freed);
        }
    }

    fn forget(&mut self, freed: Vec<DirtyNode>) {
        for mut node in freed {
            node.unsubscribe();
            self.by_pair.remove(&(node.x.id(), node.y.id()));
        }
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    fn diff(&self) -> Result<Option<ValueDiff>> {
        if self.disposed {
            return Err(Error::Disposed);
        }
        match self.arena.root() {
            Some(root) => self.diff_node(root, &mut HashSet::new()),
            None => Ok(None),
        }
    }

    fn diff_node(&self, id: NodeId, open: &mut HashSet<NodeId>) -> Result<Option<ValueDiff>> {
        let Some(node) = self.arena.get(id) else {
            return Ok(None);
        };
        if !node.dirty || !open.insert(id) {
            return Ok(None);
        }
        let mut diffs = Vec::new();
        for edge in Edge::all(&self.settings, &node.x, &node.y) {
            let diff = match node.edges.get(&edge) {
                Some(Slot::Sentinel(Sentinel::AlwaysDirty)) => Some(ValueDiff::leaf(
                    edge.read(&node.x)?.unwrap_or(Value::Null),
                    edge.read(&node.y)?.unwrap_or(Value::Null),
                )),
                Some(Slot::Child(child)) => self.diff_node(*child, open)?,
                _ => None,
            };
            if let Some(diff) = diff {
                diffs.push(edge.sub_diff(diff));
            }
        }
        open.remove(&id);
        Ok((!diffs.is_empty())
            .then(|| ValueDiff::new(Value::from(&node.x), Value::from(&node.y), diffs)))
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        let nodes = self.arena.drain();
        let count = nodes.len();
        self.forget(nodes);
        self.by_pair.clear();
        debug!(nodes = count, "dirty tracker disposed");
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::{Key, ObservableList, ObservableMap, Record};
    use crate::test_types::{child, pair, pair_list, pair_map, pair_with, parent, silent_holder};
    use std::sync::atomic::{AtomicI32, Ordering};

    fn structural() -> Arc<MemberSettings> {
        MemberSettings::properties(ReferenceHandling::Structural)
    }

    fn record_events(tracker: &DirtyTracker) -> Arc<parking_lot::Mutex<Vec<DirtyTrackerEvent>>> {
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        tracker.subscribe(move |e| seen_clone.lock().push(*e));
        seen
    }

    fn family(parent_name: &str, child_name: &str) -> (ObjectRef, ObjectRef) {
        let p = Record::with(parent(), [("name", parent_name)]).unwrap();
        let c = Record::with(child(), [("name", child_name)]).unwrap();
        p.set("child", Value::from(&c)).unwrap();
        c.set("parent", Value::from(&p)).unwrap();
        (p, c)
    }

    #[test]
    fn leaf_change_flips_dirty_and_back() {
        let (x, y) = (pair_with("a", 1), pair_with("a", 1));
        let tracker = DirtyTracker::new(&x, &y, structural()).unwrap();
        let seen = record_events(&tracker);
        assert!(!tracker.is_dirty());
        assert!(tracker.diff().unwrap().is_none());

        x.set("value", Value::from(2)).unwrap();
        assert!(tracker.is_dirty());
        assert_eq!(
            *seen.lock(),
            vec![DirtyTrackerEvent { is_dirty: true, dirty_changed: true }]
        );

        x.set("value", Value::from(1)).unwrap();
        assert!(!tracker.is_dirty());
        assert_eq!(seen.lock().len(), 2);
        assert!(!seen.lock()[1].is_dirty);
    }

    #[test]
    fn changes_on_either_side_are_seen() {
        let (x, y) = (pair_with("a", 1), pair_with("a", 1));
        let tracker = DirtyTracker::new(&x, &y, structural()).unwrap();
        y.set("name", Value::from("b")).unwrap();
        assert!(tracker.is_dirty());
        let diff = tracker.diff().unwrap().unwrap();
        assert_eq!(diff.to_string(), "Pair\n  name x: \"a\" y: \"b\"");

        x.set("name", Value::from("b")).unwrap();
        assert!(!tracker.is_dirty());
    }

    #[test]
    fn nested_changes_propagate_to_the_root() {
        let (x, _) = family("p", "c");
        let (y, y_child) = family("p", "c");
        let tracker = DirtyTracker::new(&x, &y, structural()).unwrap();
        assert!(!tracker.is_dirty());
        assert_eq!(tracker.node_count(), 2);

        y_child.set("name", Value::from("changed")).unwrap();
        assert!(tracker.is_dirty());
        let diff = tracker.diff().unwrap().unwrap();
        assert!(diff.find(&["child", "name"]).unwrap().is_leaf());

        y_child.set("name", Value::from("c")).unwrap();
        assert!(!tracker.is_dirty());
    }

    #[test]
    fn replaced_children_are_unsubscribed() {
        let (x, x_child) = family("p", "c");
        let (y, _) = family("p", "c");
        let tracker = DirtyTracker::new(&x, &y, structural()).unwrap();
        assert_eq!(x_child.notifier().unwrap().subscriber_count(), 1);

        let replacement = Record::with(child(), [("name", "c")]).unwrap();
        replacement.set("parent", Value::from(&x)).unwrap();
        x.set("child", Value::from(&replacement)).unwrap();

        assert_eq!(x_child.notifier().unwrap().subscriber_count(), 0);
        assert_eq!(replacement.notifier().unwrap().subscriber_count(), 1);
        assert!(!tracker.is_dirty());

        let calls = Arc::new(AtomicI32::new(0));
        let calls_clone = calls.clone();
        tracker.subscribe(move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });
        x_child.set("name", Value::from("stale")).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!tracker.is_dirty());
    }

    #[test]
    fn list_edits_are_tracked() {
        let x = ObservableList::from_items(pair_list(), [pair_with("a", 1)]);
        let y = ObservableList::from_items(pair_list(), [pair_with("a", 1)]);
        let tracker = DirtyTracker::new(&x, &y, structural()).unwrap();

        x.as_list().unwrap().push(Value::from(pair_with("b", 2))).unwrap();
        assert!(tracker.is_dirty());
        let diff = tracker.diff().unwrap().unwrap();
        assert!(diff.find(&["[1]"]).unwrap().y().is_null());

        y.as_list().unwrap().push(Value::from(pair_with("b", 2))).unwrap();
        assert!(!tracker.is_dirty());

        let first = x.as_list().unwrap().item(0).unwrap();
        first.as_object().unwrap().set("value", Value::from(5)).unwrap();
        assert!(tracker.is_dirty());
        assert!(tracker.diff().unwrap().unwrap().find(&["[0]", "value"]).is_some());
    }

    #[test]
    fn trailing_null_items_are_dirty() {
        let x = ObservableList::from_items(pair_list(), [pair_with("a", 1)]);
        let y = ObservableList::from_items(pair_list(), [pair_with("a", 1)]);
        let tracker = DirtyTracker::new(&x, &y, structural()).unwrap();

        x.as_list().unwrap().push(Value::Null).unwrap();
        assert!(tracker.is_dirty());
        assert!(!equal(&x, &y, &structural()).unwrap());
        let diff = tracker.diff().unwrap().unwrap();
        assert!(diff.find(&["[1]"]).unwrap().is_leaf());

        y.as_list().unwrap().push(Value::Null).unwrap();
        assert!(!tracker.is_dirty());
        x.as_list().unwrap().remove_at(1).unwrap();
        assert!(tracker.is_dirty());
    }

    #[test]
    fn null_map_values_differ_from_missing_keys() {
        let x = ObservableMap::new(pair_map());
        let y = ObservableMap::new(pair_map());
        let tracker = DirtyTracker::new(&x, &y, structural()).unwrap();

        x.as_map().unwrap().insert(Key::from("k"), Value::Null).unwrap();
        assert!(tracker.is_dirty());
        assert!(tracker.diff().unwrap().unwrap().find(&["[\"k\"]"]).is_some());

        y.as_map().unwrap().insert(Key::from("k"), Value::Null).unwrap();
        assert!(!tracker.is_dirty());
        assert!(tracker.diff().unwrap().is_none());
    }

    #[test]
    fn one_item_of_a_long_list() {
        let items = |n: usize| {
            ObservableList::from_items(pair_list(), (0..n).map(|i| pair_with("p", i as i64)))
        };
        let (x, y) = (items(2000), items(2000));
        let tracker = DirtyTracker::new(&x, &y, structural()).unwrap();
        let seen = record_events(&tracker);
        assert_eq!(tracker.node_count(), 2001);

        let item = x.as_list().unwrap().item(1500).unwrap();
        let item = item.as_object().unwrap().clone();
        item.set("value", Value::from(-1)).unwrap();
        assert!(tracker.is_dirty());
        let diff = tracker.diff().unwrap().unwrap();
        assert_eq!(diff.diffs().len(), 1);
        assert!(diff.find(&["[1500]", "value"]).is_some());

        // A second difference keeps the list dirty when the first goes away.
        let other = y.as_list().unwrap().item(3).unwrap();
        other.as_object().unwrap().set("name", Value::from("q")).unwrap();
        item.set("value", Value::from(1500)).unwrap();
        assert!(tracker.is_dirty());
        other.as_object().unwrap().set("name", Value::from("p")).unwrap();
        assert!(!tracker.is_dirty());
        assert_eq!(seen.lock().iter().filter(|e| e.dirty_changed).count(), 2);
    }

    #[test]
    fn ignored_members_never_dirty() {
        let settings = MemberSettings::builder()
            .reference_handling(ReferenceHandling::Structural)
            .ignore_member("Pair", "name")
            .build();
        let (x, y) = (pair_with("a", 1), pair_with("b", 1));
        let tracker = DirtyTracker::new(&x, &y, settings).unwrap();
        assert!(!tracker.is_dirty());
        x.set("name", Value::from("c")).unwrap();
        assert!(!tracker.is_dirty());
    }

    #[test]
    fn references_compare_members_by_identity() {
        let settings = MemberSettings::properties(ReferenceHandling::References);
        let shared_child = Record::new(child());
        let x = Record::with(parent(), [("child", Value::from(&shared_child))]).unwrap();
        let y = Record::with(parent(), [("child", Value::from(&shared_child))]).unwrap();
        let tracker = DirtyTracker::new(&x, &y, settings).unwrap();
        assert!(!tracker.is_dirty());

        y.set("child", Value::from(Record::new(child()))).unwrap();
        assert!(tracker.is_dirty());
        assert!(tracker.diff().unwrap().unwrap().find(&["child"]).unwrap().is_leaf());
    }

    #[test]
    fn dispose_unsubscribes_everything() {
        let (x, x_child) = family("p", "c");
        let (y, y_child) = family("p", "c");
        let tracker = DirtyTracker::new(&x, &y, structural()).unwrap();
        for object in [&x, &x_child, &y, &y_child] {
            assert_eq!(object.notifier().unwrap().subscriber_count(), 1);
        }

        tracker.dispose();
        assert!(tracker.is_disposed());
        for object in [&x, &x_child, &y, &y_child] {
            assert_eq!(object.notifier().unwrap().subscriber_count(), 0);
        }
        assert!(matches!(tracker.diff(), Err(Error::Disposed)));
    }

    #[test]
    fn drop_unsubscribes_everything() {
        let (x, y) = (pair_with("a", 1), pair_with("a", 1));
        {
            let _tracker = DirtyTracker::new(&x, &y, structural()).unwrap();
            assert_eq!(x.notifier().unwrap().subscriber_count(), 1);
        }
        assert_eq!(x.notifier().unwrap().subscriber_count(), 0);
        assert_eq!(y.notifier().unwrap().subscriber_count(), 0);
    }

    #[test]
    fn rejects_types_that_do_not_notify() {
        let x = Record::new(silent_holder());
        let y = Record::new(silent_holder());
        assert!(matches!(
            DirtyTracker::new(&x, &y, structural()),
            Err(Error::Verification(_))
        ));
    }

    #[test]
    fn rejects_mismatched_roots() {
        let err = DirtyTracker::new(&Record::new(pair()), &Record::new(parent()), structural())
            .unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }
}
