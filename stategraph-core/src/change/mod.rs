//! Change Tracking
//!
//! A [`ChangeTracker`] observes one live graph and reports every mutation
//! below its root as a [`ChangeEvent`] carrying the path it happened at.
//!
//! Each mutable object is observed once, however many routes lead to it.
//! Assigning a new object to a member moves the subscriptions with it: the
//! old subtree is released and the new one is walked.

mod event;
mod node;
mod tracker;

pub use event::{ChangeEvent, ChangeKind};
pub use tracker::ChangeTracker;
