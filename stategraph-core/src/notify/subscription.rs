//! Subscription handles for the notification system.
//!
//! A subscription represents one handler registered with a
//! [`Notifier`](super::Notifier). The id is what the owner keeps in order to
//! unsubscribe later; trackers store one per node and per tracked object.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::Notification;

/// Unique identifier for a subscription.
///
/// Ids are process-unique so that a handler can be removed from a notifier
/// without comparing closures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Generate a new unique subscription ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

/// A handler invoked with every event raised by its source.
pub type Handler<E = Notification> = Arc<dyn Fn(&E) + Send + Sync>;

/// A registered handler together with its id.
pub struct Subscription<E = Notification> {
    id: SubscriptionId,
    handler: Handler<E>,
}

impl<E> Clone for Subscription<E> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<E> Subscription<E> {
    /// Create a new subscription with a fresh id.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        Self {
            id: SubscriptionId::new(),
            handler: Arc::new(handler),
        }
    }

    /// Get the subscription's unique ID.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Deliver an event to the handler.
    pub fn deliver(&self, event: &E) {
        (self.handler)(event);
    }
}

impl<E> std::fmt::Debug for Subscription<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
