//! Tracker Graph
//!
//! Both trackers keep a shadow graph of nodes next to the live object graph.
//! This module holds the storage those nodes live in.
//!
//! # Overview
//!
//! - Nodes are identified by [`NodeId`] and stored in an [`Arena`].
//! - Edges point from a parent node to a child node and are labelled with
//!   the member or element they follow ([`Edge`]). The child side is kept
//!   by the node data (see [`GraphNode`]); the arena keeps the parent side
//!   and the reference counts.
//! - An object reached along several routes is mirrored by one node with
//!   several incoming edges, so it is subscribed to once.
//!
//! The graph may contain cycles because the object graph may. Upward walks
//! ([`Arena::propagate`], [`Arena::path_from_root`]) keep a visited set, and
//! release sweeps cycles that lost their connection to the root.

mod arena;
mod edge;
mod node;

pub use arena::Arena;
pub use edge::Edge;
pub use node::{GraphNode, NodeId};
