//! Notifier Implementation
//!
//! A `Notifier` is the change-notification capability an observable object
//! exposes. Trackers subscribe to it; the object raises a [`Notification`]
//! after every mutation. The trackers reuse the same registry, with their own
//! event type, for the events they raise to application code.
//!
//! # Re-entrancy
//!
//! Raising takes a snapshot of the registered handlers and releases the lock
//! before invoking them. A handler may therefore subscribe or unsubscribe
//! (on this notifier or any other) while it runs, which is exactly what a
//! tracker does when a replaced member forces it to re-wire its subtree.

use parking_lot::RwLock;

use super::subscription::{Subscription, SubscriptionId};
use super::Notification;

/// Registry of event handlers for one source.
pub struct Notifier<E = Notification> {
    subscriptions: RwLock<Vec<Subscription<E>>>,
}

impl<E> Default for Notifier<E> {
    fn default() -> Self {
        Self {
            subscriptions: RwLock::new(Vec::new()),
        }
    }
}

impl<E> Notifier<E> {
    /// Create a notifier with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. The returned id removes it again.
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let subscription = Subscription::new(handler);
        let id = subscription.id();
        self.subscriptions.write().push(subscription);
        id
    }

    /// Remove a handler. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscriptions = self.subscriptions.write();
        let before = subscriptions.len();
        subscriptions.retain(|s| s.id() != id);
        subscriptions.len() != before
    }

    /// Deliver an event to every handler registered at the time of the call.
    pub fn raise(&self, event: &E) {
        let snapshot: Vec<Subscription<E>> = self.subscriptions.read().clone();
        for subscription in &snapshot {
            subscription.deliver(event);
        }
    }

    /// Get the number of registered handlers.
    pub fn subscriber_count(&self) -> usize {
        self.subscriptions.read().len()
    }
}

impl<E> std::fmt::Debug for Notifier<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
