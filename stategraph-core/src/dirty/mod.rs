//! Dirty Tracking
//!
//! A [`DirtyTracker`] keeps the difference between two live graphs current.
//! It is the incremental counterpart of [`diff`](crate::diff()): built once
//! by walking both graphs, then updated from change notifications only.
//!
//! Objects reached at the same position on both sides form a pair. Each pair
//! is mirrored by one node, however many routes lead to it, so aliased and
//! cyclic graphs are tracked with one subscription per object and node.
//!
//! Equatable types that can still change are walked member by member here,
//! unlike in the one-shot walker: the tracker has to see their members change.

mod node;
mod tracker;

pub use tracker::{DirtyTracker, DirtyTrackerEvent};
