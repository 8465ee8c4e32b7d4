//! Values stored in members, list slots and map entries.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use super::{Reflect, TypeInfo};

/// A member value: either an immutable leaf or a shared object reference.
#[derive(Clone)]
pub enum Value {
    /// Absent reference.
    Null,
    /// Boolean leaf.
    Bool(bool),
    /// Integer leaf.
    Int(i64),
    /// Float leaf.
    Float(f64),
    /// String leaf.
    Str(Arc<str>),
    /// Shared reference to a reflective object.
    Object(ObjectRef),
}

impl Value {
    /// Shorthand for a string value.
    pub fn str(s: impl AsRef<str>) -> Self {
        Self::Str(Arc::from(s.as_ref()))
    }

    /// `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The object reference, if this is one.
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// The integer, if this is one.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// The string, if this is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The boolean, if this is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Value equality for leaves, identity for objects.
    ///
    /// Floats compare NaN equal to NaN so that a copied NaN is not reported
    /// as a difference.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Human-readable name of the value's type.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Object(obj) => obj.type_info().name(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x:?}"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Object(obj) => write!(f, "{obj:?}"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::str(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(Arc::from(s))
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Self::Object(obj)
    }
}

impl From<&ObjectRef> for Value {
    fn from(obj: &ObjectRef) -> Self {
        Self::Object(obj.clone())
    }
}

impl From<Option<ObjectRef>> for Value {
    fn from(obj: Option<ObjectRef>) -> Self {
        obj.map_or(Self::Null, Self::Object)
    }
}

impl From<&Value> for Value {
    fn from(value: &Value) -> Self {
        value.clone()
    }
}

/// Identity of a live object, valid while the object is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(usize);

/// A shared reference to a reflective object.
#[derive(Clone)]
pub struct ObjectRef(Arc<dyn Reflect>);

impl ObjectRef {
    /// Wrap an object.
    pub fn new<T: Reflect>(object: T) -> Self {
        Self(Arc::new(object))
    }

    /// Wrap an already shared object.
    pub fn from_arc(object: Arc<dyn Reflect>) -> Self {
        Self(object)
    }

    /// Identity of the referenced object.
    pub fn id(&self) -> ObjectId {
        ObjectId(Arc::as_ptr(&self.0) as *const () as usize)
    }

    /// True if both references point at the same object.
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        self.id() == other.id()
    }

    /// The object's type descriptor.
    pub fn type_info(&self) -> &'static TypeInfo {
        self.0.type_info()
    }

    /// Borrow the concrete object type.
    pub fn downcast_ref<T: Reflect>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }
}

impl Deref for ObjectRef {
    type Target = dyn Reflect;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:x}", self.type_info().name(), self.id().0)
    }
}

/// A primitive map key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    /// Boolean key.
    Bool(bool),
    /// Integer key.
    Int(i64),
    /// String key.
    Str(Arc<str>),
}

impl Key {
    /// The key as a member value.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::Int(*i),
            Self::Str(s) => Value::Str(s.clone()),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Str(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Self::Str(Arc::from(s))
    }
}

impl From<i64> for Key {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Key {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<bool> for Key {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Position of an element: a list index or a map key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Index {
    /// List position.
    Position(usize),
    /// Map key.
    Key(Key),
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Position(i) => write!(f, "[{i}]"),
            Self::Key(k) => write!(f, "[{k}]"),
        }
    }
}

impl From<usize> for Index {
    fn from(i: usize) -> Self {
        Self::Position(i)
    }
}

impl From<Key> for Index {
    fn from(k: Key) -> Self {
        Self::Key(k)
    }
}
