//! Change Notifications
//!
//! Tracked objects report their own mutations through a [`Notifier`]. This is
//! the only way a tracker learns that the graph changed: nothing is polled and
//! nothing is re-walked on a timer.
//!
//! Two notification families exist:
//!
//! - `PropertyChanged` - a member of a class instance was assigned. `None`
//!   means "any member may have changed" and forces a full refresh of the
//!   node.
//! - `CollectionChanged` - a list or map was mutated, decomposed into the
//!   add / remove / replace / move / reset primitives.

mod notifier;
mod subscription;

pub use notifier::Notifier;
pub use subscription::{Handler, Subscription, SubscriptionId};

use crate::reflect::Index;

/// A single notification raised by an observable object.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// A member was assigned. `None` means every member may have changed.
    PropertyChanged(Option<String>),
    /// A collection was mutated.
    CollectionChanged(CollectionChange),
}

impl Notification {
    /// Shorthand for a named property change.
    pub fn property(name: impl Into<String>) -> Self {
        Self::PropertyChanged(Some(name.into()))
    }
}

/// The primitive mutations of a list or map.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionChange {
    /// An item was inserted at the index (or key).
    Add(Index),
    /// The item at the index (or key) was removed.
    Remove(Index),
    /// The item at the index (or key) was replaced.
    Replace(Index),
    /// An item moved between two list positions.
    Move {
        /// Position before the move.
        from: usize,
        /// Position after the move.
        to: usize,
    },
    /// The collection changed wholesale.
    Reset,
}
