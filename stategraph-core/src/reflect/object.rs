//! The accessor capability.
//!
//! [`Reflect`] is what the algorithms need from an instance: its descriptor,
//! get/set by member name, optional collection views and optional change
//! notification. Everything else (how slots are stored, how a setter
//! validates) is up to the implementor. [`Record`](super::Record),
//! [`ObservableList`](super::ObservableList) and
//! [`ObservableMap`](super::ObservableMap) are the stock implementations.

use std::any::Any;

use super::{Key, TypeInfo, Value};
use crate::notify::Notifier;
use crate::Result;

/// A reflective object instance.
pub trait Reflect: Send + Sync + 'static {
    /// The instance's runtime type.
    fn type_info(&self) -> &'static TypeInfo;

    /// Read a member.
    fn get(&self, member: &str) -> Result<Value>;

    /// Assign a member.
    fn set(&self, member: &str, value: Value) -> Result<()>;

    /// List view, for list-kind instances.
    fn as_list(&self) -> Option<&dyn ListAccess> {
        None
    }

    /// Map view, for map-kind instances.
    fn as_map(&self) -> Option<&dyn MapAccess> {
        None
    }

    /// Change notifications, for instances that raise them.
    fn notifier(&self) -> Option<&Notifier> {
        None
    }

    /// Value equality for equatable types. `None` means "not equatable".
    fn value_equals(&self, _other: &dyn Reflect) -> Option<bool> {
        None
    }

    /// Support for downcasting to the concrete type.
    fn as_any(&self) -> &dyn Any;
}

/// Ordered, index-addressed collection access.
pub trait ListAccess {
    /// Number of items.
    fn len(&self) -> usize;

    /// `true` when there are no items.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The item at `index`.
    fn item(&self, index: usize) -> Option<Value>;

    /// Snapshot of all items.
    fn items(&self) -> Vec<Value>;

    /// Replace the item at `index`.
    fn set_item(&self, index: usize, value: Value) -> Result<()>;

    /// Insert before `index`; `index == len` appends.
    fn insert(&self, index: usize, value: Value) -> Result<()>;

    /// Append an item.
    fn push(&self, value: Value) -> Result<()> {
        self.insert(self.len(), value)
    }

    /// Remove and return the item at `index`.
    fn remove_at(&self, index: usize) -> Result<Value>;

    /// Move an item from one position to another.
    fn move_item(&self, from: usize, to: usize) -> Result<()>;

    /// Drop every item from `len` on.
    fn truncate(&self, len: usize);

    /// Remove all items.
    fn clear(&self) {
        self.truncate(0);
    }
}

/// Keyed collection access. Iteration follows insertion order.
pub trait MapAccess {
    /// Number of entries.
    fn len(&self) -> usize;

    /// `true` when there are no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the keys.
    fn keys(&self) -> Vec<Key>;

    /// The value stored under `key`.
    fn value(&self, key: &Key) -> Option<Value>;

    /// Insert or replace, returning the previous value.
    fn insert(&self, key: Key, value: Value) -> Result<Option<Value>>;

    /// Remove an entry, returning its value.
    fn remove(&self, key: &Key) -> Option<Value>;

    /// Remove all entries.
    fn clear(&self);
}
