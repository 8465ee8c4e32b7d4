//! Record Implementation
//!
//! A `Record` is the stock class instance: an ordered slot per member of its
//! type (inherited members included) behind a lock, plus a [`Notifier`].
//!
//! # Notifications
//!
//! `set` raises `PropertyChanged` only when the stored value actually changes
//! (leaves by value, objects by identity) and only after the slot lock has
//! been released, so handlers are free to read the record again.

use std::any::Any;

use indexmap::IndexMap;
use parking_lot::RwLock;

use super::{ObjectRef, Reflect, TypeInfo, Value};
use crate::notify::{Notification, Notifier};
use crate::{Error, Result};

/// An observable class instance.
pub struct Record {
    type_info: &'static TypeInfo,
    slots: RwLock<IndexMap<String, Value>>,
    notifier: Notifier,
}

impl Record {
    /// Create a record with every member at its default value.
    pub fn create(type_info: &'static TypeInfo) -> Self {
        let slots = type_info
            .all_members()
            .into_iter()
            .map(|m| (m.name().to_string(), m.value_type().default_value()))
            .collect();
        Self {
            type_info,
            slots: RwLock::new(slots),
            notifier: Notifier::new(),
        }
    }

    /// Create a shared record with every member at its default value.
    pub fn new(type_info: &'static TypeInfo) -> ObjectRef {
        ObjectRef::new(Self::create(type_info))
    }

    /// Create a shared record with initial values.
    ///
    /// The initializer may assign readonly members. No notifications are raised.
    pub fn with<I, V>(type_info: &'static TypeInfo, values: I) -> Result<ObjectRef>
    where
        I: IntoIterator<Item = (&'static str, V)>,
        V: Into<Value>,
    {
        let record = Self::create(type_info);
        {
            let mut slots = record.slots.write();
            for (name, value) in values {
                let value = value.into();
                record.check(name, &value)?;
                slots.insert(name.to_string(), value);
            }
        }
        Ok(ObjectRef::new(record))
    }

    /// Raise a property-changed notification by hand. `None` means "all members".
    pub fn raise_property_changed(&self, name: Option<&str>) {
        if self.type_info.notifies() {
            self.notifier
                .raise(&Notification::PropertyChanged(name.map(str::to_string)));
        }
    }

    fn check(&self, name: &str, value: &Value) -> Result<()> {
        let member = self
            .type_info
            .member(name)
            .ok_or_else(|| Error::member_not_found(self.type_info.name(), name))?;
        if !member.value_type().accepts(value) {
            return Err(Error::TypeMismatch {
                expected: member.value_type().name().to_string(),
                actual: value.type_name().to_string(),
            });
        }
        Ok(())
    }
}

impl Reflect for Record {
    fn type_info(&self) -> &'static TypeInfo {
        self.type_info
    }

    fn get(&self, member: &str) -> Result<Value> {
        self.slots
            .read()
            .get(member)
            .cloned()
            .ok_or_else(|| Error::member_not_found(self.type_info.name(), member))
    }

    fn set(&self, member: &str, value: Value) -> Result<()> {
        self.check(member, &value)?;
        let info = self
            .type_info
            .member(member)
            .ok_or_else(|| Error::member_not_found(self.type_info.name(), member))?;
        if info.is_readonly() {
            return Err(Error::ReadonlyMember {
                type_name: info.declaring_type().to_string(),
                member: member.to_string(),
            });
        }

        let changed = {
            let mut slots = self.slots.write();
            let old = slots.insert(member.to_string(), value.clone());
            !old.is_some_and(|old| old.same(&value))
        };
        if changed {
            self.raise_property_changed(Some(member));
        }
        Ok(())
    }

    fn notifier(&self) -> Option<&Notifier> {
        self.type_info.notifies().then_some(&self.notifier)
    }

    fn value_equals(&self, other: &dyn Reflect) -> Option<bool> {
        let class = self.type_info.as_class()?;
        if !class.is_equatable() {
            return None;
        }
        if !self.type_info.ptr_eq(other.type_info()) {
            return Some(false);
        }
        let slots = self.slots.read().clone();
        for (name, mine) in &slots {
            let Ok(theirs) = other.get(name) else {
                return Some(false);
            };
            let equal = match (mine, &theirs) {
                (Value::Object(a), Value::Object(b)) => {
                    a.ptr_eq(b) || a.value_equals(&**b).unwrap_or(false)
                }
                _ => mine.same(&theirs),
            };
            if !equal {
                return Some(false);
            }
        }
        Some(true)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl std::fmt::Debug for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct(self.type_info.name());
        for (name, value) in self.slots.read().iter() {
            s.field(name, value);
        }
        s.finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
