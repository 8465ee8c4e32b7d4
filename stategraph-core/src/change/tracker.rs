//! Change Tracker Implementation
//!
//! One [`ChangeNode`] mirrors every mutable object reachable from the root.
//! A node subscribes to its object and, on a notification, resyncs the edges
//! the notification can have touched before reporting the change upward with
//! the path it happened at.
//!
//! Paths are computed when the change is reported: the shortest route from
//! the root to the notified node, labelled with the edge taken at each hop.
//! A shared object therefore reports one path however many routes reach it.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use super::event::{ChangeEvent, ChangeKind};
use super::node::ChangeNode;
use crate::graph::{Arena, Edge, NodeId};
use crate::notify::{CollectionChange, Notification, Notifier, SubscriptionId};
use crate::path::MemberPath;
use crate::reflect::{Index, ObjectId, ObjectRef, Value};
use crate::settings::{MemberSettings, ReferenceHandling};
use crate::verify::{is_tracking_leaf, verify_can_track_changes};
use crate::Result;

/// Live observation of one object graph.
///
/// Every change anywhere below the root raises a [`ChangeEvent`] and bumps
/// the [`changes`](Self::changes) counter once. When a member is assigned a
/// new object, the old subtree is unsubscribed and the new one is walked and
/// subscribed.
///
/// ```rust
/// use std::sync::OnceLock;
/// use stategraph_core::reflect::{types, Record, TypeInfo, Value};
/// use stategraph_core::{ChangeTracker, MemberSettings, ReferenceHandling};
///
/// fn pair() -> &'static TypeInfo {
///     static TYPE: OnceLock<TypeInfo> = OnceLock::new();
///     TYPE.get_or_init(|| {
///         TypeInfo::class("ChangeDocPair")
///             .property("name", types::string)
///             .property("value", types::int)
///             .build()
///     })
/// }
///
/// let root = Record::new(pair());
/// let settings = MemberSettings::properties(ReferenceHandling::Structural);
/// let tracker = ChangeTracker::new(&root, settings).unwrap();
///
/// root.set("value", Value::from(1)).unwrap();
/// root.set("name", Value::from("a")).unwrap();
/// assert_eq!(tracker.changes(), 2);
/// ```
pub struct ChangeTracker {
    shared: Arc<Shared>,
}

struct Shared {
    state: Mutex<State>,
    events: Notifier<ChangeEvent>,
}

struct State {
    this: Weak<Shared>,
    settings: Arc<MemberSettings>,
    arena: Arena<ChangeNode>,
    by_object: HashMap<ObjectId, NodeId>,
    changes: usize,
    disposed: bool,
}

impl ChangeTracker {
    /// Start observing the graph below `root`.
    ///
    /// The type is verified for
    /// [`Requirement::TrackChanges`](crate::verify::Requirement::TrackChanges)
    /// first.
    pub fn new(root: &ObjectRef, settings: Arc<MemberSettings>) -> Result<Self> {
        let ty = root.type_info();
        verify_can_track_changes(ty, &settings)?;

        let shared = Arc::new_cyclic(|this| Shared {
            state: Mutex::new(State {
                this: this.clone(),
                settings,
                arena: Arena::new(),
                by_object: HashMap::new(),
                changes: 0,
                disposed: false,
            }),
            events: Notifier::new(),
        });
        {
            let mut state = shared.state.lock();
            if let Err(err) = state.build(root) {
                state.dispose();
                return Err(err);
            }
            debug!(type_name = ty.name(), nodes = state.arena.len(), "change tracker created");
        }
        Ok(Self { shared })
    }

    /// Number of changes observed so far.
    pub fn changes(&self) -> usize {
        self.shared.state.lock().changes
    }

    /// Register a handler for [`ChangeEvent`]s. Handlers run after the
    /// tracker has released its lock.
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.shared.events.subscribe(handler)
    }

    /// Remove an event handler.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.events.unsubscribe(id)
    }

    /// Number of objects observed.
    pub fn node_count(&self) -> usize {
        self.shared.state.lock().arena.len()
    }

    /// The settings the graph is walked with.
    pub fn settings(&self) -> Arc<MemberSettings> {
        Arc::clone(&self.shared.state.lock().settings)
    }

    /// Stop observing and unsubscribe from every object.
    pub fn dispose(&self) {
        self.shared.state.lock().dispose();
    }

    /// True after [`dispose`](Self::dispose).
    pub fn is_disposed(&self) -> bool {
        self.shared.state.lock().disposed
    }
}

impl Drop for ChangeTracker {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for ChangeTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("ChangeTracker")
            .field("changes", &state.changes)
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
    fn build(&mut self, root: &ObjectRef) -> Result<()> {
        let id = self.insert_node(root);
        self.arena.set_root(id);
        self.fill(id)
    }

    // ------------------------------------------------------------------------
    // Building
    // ------------------------------------------------------------------------

    fn insert_node(&mut self, object: &ObjectRef) -> NodeId {
        let id = self.arena.insert(ChangeNode::new(object));
        self.by_object.insert(object.id(), id);
        let subscription = self.subscribe(object, id);
        if let Some(node) = self.arena.get_mut(id) {
            node.subscription = subscription;
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

    fn fill(&mut self, id: NodeId) -> Result<()> {
        let Some(node) = self.arena.get(id) else {
            return Ok(());
        };
        let object = node.object.clone();
        for edge in Edge::all(&self.settings, &object, &object) {
            if edge.is_excluded(&self.settings) {
                continue;
            }
            if let Some(child) = self.child_for(id, &edge, &object)? {
                if let Some(node) = self.arena.get_mut(id) {
                    node.edges.insert(edge, child);
                }
            }
        }
        Ok(())
    }

    /// The node `parent` needs behind `edge`, acquired for it.
    fn child_for(
        &mut self,
        parent: NodeId,
        edge: &Edge,
        object: &ObjectRef,
    ) -> Result<Option<NodeId>> {
        let Some(Value::Object(value)) = edge.read(object)? else {
            return Ok(None);
        };
        if !self.is_tracked(&value) {
            return Ok(None);
        }
        let child = match self.by_object.get(&value.id()) {
            Some(id) => *id,
            None => {
                let id = self.insert_node(&value);
                self.fill(id)?;
                id
            }
        };
        self.arena.acquire(parent, child);
        Ok(Some(child))
    }

    fn is_tracked(&self, object: &ObjectRef) -> bool {
        let ty = object.type_info();
        self.settings.reference_handling() == ReferenceHandling::Structural
            && !self.settings.is_ignoring_type(ty)
            && !is_tracking_leaf(&self.settings, ty)
    }

    // ------------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------------

    fn handle(&mut self, id: NodeId, notification: &Notification) -> Option<ChangeEvent> {
        if self.disposed {
            return None;
        }
        let object = self.arena.get(id)?.object.clone();
        trace!(type_name = object.type_info().name(), ?notification, "change tracker notified");

        let path = self.path_to(id, &object);
        let (path, kind) = match notification {
            Notification::PropertyChanged(Some(name)) => {
                let ty = object.type_info();
                let Some(member) = ty.member(name) else {
                    warn!(
                        type_name = ty.name(),
                        member = %name,
                        "notification names an unknown member"
                    );
                    return None;
                };
                let walked = self.settings.members(ty).iter().any(|m| m.ptr_eq(member));
                let edge = Edge::Member(member);
                if !walked || edge.is_excluded(&self.settings) {
                    return None;
                }
                self.resync(id, &edge, &object);
                (edge.extend(&path), ChangeKind::Property(name.clone()))
            }
            Notification::PropertyChanged(None) => {
                for edge in self.all_edges(id, &object) {
                    self.resync(id, &edge, &object);
                }
                (path, ChangeKind::Reset)
            }
            Notification::CollectionChanged(change) => {
                let kind = match change {
                    CollectionChange::Replace(index) => {
                        self.resync(id, &Edge::Index(index.clone()), &object);
                        ChangeKind::Replace(index.clone())
                    }
                    CollectionChange::Add(index) | CollectionChange::Remove(index) => {
                        match index {
                            Index::Key(_) => self.resync(id, &Edge::Index(index.clone()), &object),
                            Index::Position(_) => {
                                for edge in self.all_edges(id, &object) {
                                    self.resync(id, &edge, &object);
                                }
                            }
                        }
                        match change {
                            CollectionChange::Add(_) => ChangeKind::Add(index.clone()),
                            _ => ChangeKind::Remove(index.clone()),
                        }
                    }
                    CollectionChange::Move { from, to } => {
                        for edge in self.all_edges(id, &object) {
                            self.resync(id, &edge, &object);
                        }
                        ChangeKind::Move { from: *from, to: *to }
                    }
                    CollectionChange::Reset => {
                        self.reset(id);
                        ChangeKind::Reset
                    }
                };
                (path, kind)
            }
        };

        self.changes += 1;
        Some(ChangeEvent { path, kind })
    }

    /// Shortest path from the root to `id`.
    fn path_to(&self, id: NodeId, object: &ObjectRef) -> MemberPath {
        let Some(route) = self.arena.path_from_root(id) else {
            return MemberPath::root(object.type_info());
        };
        let mut hops = route.iter();
        let Some(root) = hops.next().and_then(|root| self.arena.get(*root)) else {
            return MemberPath::root(object.type_info());
        };
        let mut path = MemberPath::root(root.object.type_info());
        let mut parent = root;
        for hop in hops {
            let Some(node) = self.arena.get(*hop) else {
                break;
            };
            if let Some(edge) = parent.edge_to(*hop) {
                path = edge.extend(&path);
            }
            parent = node;
        }
        path
    }

    /// Every current slot plus the node's stale edges.
    fn all_edges(&self, id: NodeId, object: &ObjectRef) -> Vec<Edge> {
        let mut edges = Edge::all(&self.settings, object, object);
        if let Some(node) = self.arena.get(id) {
            let current: HashSet<Edge> = edges.iter().cloned().collect();
            edges.extend(node.edges.keys().filter(|e| !current.contains(*e)).cloned());
        }
        edges
    }

    fn resync(&mut self, id: NodeId, edge: &Edge, object: &ObjectRef) {
        let child = if edge.is_excluded(&self.settings) {
            Ok(None)
        } else {
            self.child_for(id, edge, object)
        };
        match child {
            Ok(child) => self.replace_edge(id, edge.clone(), child),
            Err(err) => {
                warn!(%err, %edge, "could not refresh a tracked slot, dropping it");
                self.replace_edge(id, edge.clone(), None);
                let freed = self.arena.sweep_unreachable();
                self.forget(freed);
            }
        }
    }

    /// Drop every subtree below `id`, then walk the object again.
    fn reset(&mut self, id: NodeId) {
        let Some(node) = self.arena.get_mut(id) else {
            return;
        };
        let old = std::mem::take(&mut node.edges);
        let object = node.object.clone();
        for child in old.into_values() {
            let freed = self.arena.release(id, child);
            self.forget(freed);
        }
        if let Err(err) = self.fill(id) {
            warn!(
                %err,
                type_name = object.type_info().name(),
                "could not rebuild a reset collection"
            );
            let freed = self.arena.sweep_unreachable();
            self.forget(freed);
        }
    }

    fn replace_edge(&mut self, id: NodeId, edge: Edge, child: Option<NodeId>) {
        let Some(node) = self.arena.get_mut(id) else {
            return;
        };
        let old = match child {
            Some(child) => node.edges.insert(edge, child),
            None => node.edges.shift_remove(&edge),
        };
        if let Some(old) = old {
            let freed = self.arena.release(id, old);
            self.forget(freed);
        }
    }

    fn forget(&mut self, freed: Vec<ChangeNode>) {
        for mut node in freed {
            node.unsubscribe();
            self.by_object.remove(&node.object.id());
        }
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        let nodes = self.arena.drain();
        let count = nodes.len();
        self.forget(nodes);
        self.by_object.clear();
        debug!(nodes = count, changes = self.changes, "change tracker disposed");
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
