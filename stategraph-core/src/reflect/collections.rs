//! Observable collections.
//!
//! [`ObservableList`] and [`ObservableMap`] are the stock list and map
//! instances. Each mutation raises exactly one `CollectionChanged`
//! notification describing it, after the storage lock has been released.
//! Types declared `silent` expose no notifier and raise nothing.

use std::any::Any;

use indexmap::IndexMap;
use parking_lot::RwLock;

use super::{Index, Key, ListAccess, MapAccess, ObjectRef, Reflect, TypeInfo, Value};
use crate::notify::{CollectionChange, Notification, Notifier};
use crate::{Error, Result};

fn check_element(element: &'static TypeInfo, value: &Value) -> Result<()> {
    if element.accepts(value) {
        Ok(())
    } else {
        Err(Error::TypeMismatch {
            expected: element.name().to_string(),
            actual: value.type_name().to_string(),
        })
    }
}

/// An observable list instance.
pub struct ObservableList {
    type_info: &'static TypeInfo,
    items: RwLock<Vec<Value>>,
    notifier: Notifier,
}

impl ObservableList {
    /// Create an empty list. `type_info` must be a list type.
    pub fn new(type_info: &'static TypeInfo) -> ObjectRef {
        Self::from_items(type_info, Vec::<Value>::new())
    }

    /// Create a list holding `items`. No notifications are raised.
    pub fn from_items<I, V>(type_info: &'static TypeInfo, items: I) -> ObjectRef
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        debug_assert!(type_info.as_list().is_some(), "{} is not a list type", type_info);
        ObjectRef::new(Self {
            type_info,
            items: RwLock::new(items.into_iter().map(Into::into).collect()),
            notifier: Notifier::new(),
        })
    }

    fn element(&self) -> &'static TypeInfo {
        match self.type_info.as_list() {
            Some(list) => list.element(),
            None => self.type_info,
        }
    }

    fn raise(&self, change: CollectionChange) {
        if self.type_info.notifies() {
            self.notifier.raise(&Notification::CollectionChanged(change));
        }
    }
}

impl Reflect for ObservableList {
    fn type_info(&self) -> &'static TypeInfo {
        self.type_info
    }

    fn get(&self, member: &str) -> Result<Value> {
        Err(Error::member_not_found(self.type_info.name(), member))
    }

    fn set(&self, member: &str, _value: Value) -> Result<()> {
        Err(Error::member_not_found(self.type_info.name(), member))
    }

    fn as_list(&self) -> Option<&dyn ListAccess> {
        Some(self)
    }

    fn notifier(&self) -> Option<&Notifier> {
        self.type_info.notifies().then_some(&self.notifier)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ListAccess for ObservableList {
    fn len(&self) -> usize {
        self.items.read().len()
    }

    fn item(&self, index: usize) -> Option<Value> {
        self.items.read().get(index).cloned()
    }

    fn items(&self) -> Vec<Value> {
        self.items.read().clone()
    }

    fn set_item(&self, index: usize, value: Value) -> Result<()> {
        check_element(self.element(), &value)?;
        let changed = {
            let mut items = self.items.write();
            let len = items.len();
            let slot = items
                .get_mut(index)
                .ok_or(Error::IndexOutOfRange { index, len })?;
            let changed = !slot.same(&value);
            *slot = value;
            changed
        };
        if changed {
            self.raise(CollectionChange::Replace(Index::Position(index)));
        }
        Ok(())
    }

    fn insert(&self, index: usize, value: Value) -> Result<()> {
        check_element(self.element(), &value)?;
        {
            let mut items = self.items.write();
            if index > items.len() {
                return Err(Error::IndexOutOfRange {
                    index,
                    len: items.len(),
                });
            }
            items.insert(index, value);
        }
        self.raise(CollectionChange::Add(Index::Position(index)));
        Ok(())
    }

    fn remove_at(&self, index: usize) -> Result<Value> {
        let removed = {
            let mut items = self.items.write();
            if index >= items.len() {
                return Err(Error::IndexOutOfRange {
                    index,
                    len: items.len(),
                });
            }
            items.remove(index)
        };
        self.raise(CollectionChange::Remove(Index::Position(index)));
        Ok(removed)
    }

    fn move_item(&self, from: usize, to: usize) -> Result<()> {
        {
            let mut items = self.items.write();
            let len = items.len();
            if from >= len || to >= len {
                return Err(Error::IndexOutOfRange {
                    index: from.max(to),
                    len,
                });
            }
            let item = items.remove(from);
            items.insert(to, item);
        }
        if from != to {
            self.raise(CollectionChange::Move { from, to });
        }
        Ok(())
    }

    fn truncate(&self, len: usize) {
        let changed = {
            let mut items = self.items.write();
            let before = items.len();
            items.truncate(len);
            before != items.len()
        };
        if changed {
            self.raise(CollectionChange::Reset);
        }
    }
}

impl std::fmt::Debug for ObservableList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.items.read().iter()).finish()
    }
}

/// An observable map instance.
pub struct ObservableMap {
    type_info: &'static TypeInfo,
    entries: RwLock<IndexMap<Key, Value>>,
    notifier: Notifier,
}

impl ObservableMap {
    /// Create an empty map. `type_info` must be a map type.
    pub fn new(type_info: &'static TypeInfo) -> ObjectRef {
        Self::from_entries(type_info, Vec::<(Key, Value)>::new())
    }

    /// Create a map holding `entries`. No notifications are raised.
    pub fn from_entries<I, K, V>(type_info: &'static TypeInfo, entries: I) -> ObjectRef
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Key>,
        V: Into<Value>,
    {
        debug_assert!(type_info.as_map().is_some(), "{} is not a map type", type_info);
        ObjectRef::new(Self {
            type_info,
            entries: RwLock::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
            notifier: Notifier::new(),
        })
    }

    fn raise(&self, change: CollectionChange) {
        if self.type_info.notifies() {
            self.notifier.raise(&Notification::CollectionChanged(change));
        }
    }
}

impl Reflect for ObservableMap {
    fn type_info(&self) -> &'static TypeInfo {
        self.type_info
    }

    fn get(&self, member: &str) -> Result<Value> {
        Err(Error::member_not_found(self.type_info.name(), member))
    }

    fn set(&self, member: &str, _value: Value) -> Result<()> {
        Err(Error::member_not_found(self.type_info.name(), member))
    }

    fn as_map(&self) -> Option<&dyn MapAccess> {
        Some(self)
    }

    fn notifier(&self) -> Option<&Notifier> {
        self.type_info.notifies().then_some(&self.notifier)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl MapAccess for ObservableMap {
    fn len(&self) -> usize {
        self.entries.read().len()
    }

    fn keys(&self) -> Vec<Key> {
        self.entries.read().keys().cloned().collect()
    }

    fn value(&self, key: &Key) -> Option<Value> {
        self.entries.read().get(key).cloned()
    }

    fn insert(&self, key: Key, value: Value) -> Result<Option<Value>> {
        if let Some(map) = self.type_info.as_map() {
            check_element(map.value(), &value)?;
        }
        let previous = self.entries.write().insert(key.clone(), value.clone());
        match &previous {
            None => self.raise(CollectionChange::Add(Index::Key(key))),
            Some(old) if !old.same(&value) => {
                self.raise(CollectionChange::Replace(Index::Key(key)))
            }
            Some(_) => {}
        }
        Ok(previous)
    }

    fn remove(&self, key: &Key) -> Option<Value> {
        let removed = self.entries.write().shift_remove(key);
        if removed.is_some() {
            self.raise(CollectionChange::Remove(Index::Key(key.clone())));
        }
        removed
    }

    fn clear(&self) {
        let changed = {
            let mut entries = self.entries.write();
            let changed = !entries.is_empty();
            entries.clear();
            changed
        };
        if changed {
            self.raise(CollectionChange::Reset);
        }
    }
}

impl std::fmt::Debug for ObservableMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.entries.read().iter()).finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
