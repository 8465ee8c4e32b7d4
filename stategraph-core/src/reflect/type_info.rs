//! Runtime Type Descriptors
//!
//! A [`TypeInfo`] describes the shape of a type the graph algorithms can walk:
//! its kind, its members, and the capabilities its instances promise (value
//! equality, change notification, default construction).
//!
//! Descriptors live for the whole process and are handed around as
//! `&'static TypeInfo`. The usual way to declare one is a `OnceLock` behind a
//! function, which also makes recursive type graphs expressible because
//! member types are referenced lazily through [`TypeRef`]:
//!
//! ```rust
//! use std::sync::OnceLock;
//! use stategraph_core::reflect::{types, Record, TypeInfo};
//!
//! fn parent() -> &'static TypeInfo {
//!     static TYPE: OnceLock<TypeInfo> = OnceLock::new();
//!     TYPE.get_or_init(|| {
//!         TypeInfo::class("Parent")
//!             .property("name", types::string)
//!             .property("child", child)
//!             .constructor(|| Record::new(parent()))
//!             .build()
//!     })
//! }
//!
//! fn child() -> &'static TypeInfo {
//!     static TYPE: OnceLock<TypeInfo> = OnceLock::new();
//!     TYPE.get_or_init(|| {
//!         TypeInfo::class("Child")
//!             .property("parent", parent)
//!             .constructor(|| Record::new(child()))
//!             .build()
//!     })
//! }
//!
//! assert_eq!(parent().member("child").unwrap().value_type().name(), "Child");
//! ```
//!
//! Type identity is the descriptor's address, exposed as [`TypeKey`]. Names
//! must still be unique because settings refer to types and members by name.

use std::fmt;
use std::sync::Arc;

use super::{ObjectRef, Value};

/// Factory producing a fresh, default-initialized instance.
pub type Constructor = Arc<dyn Fn() -> ObjectRef + Send + Sync>;

/// Lazily resolved reference to a type descriptor.
#[derive(Clone, Copy)]
pub struct TypeRef(fn() -> &'static TypeInfo);

impl TypeRef {
    /// Wrap a descriptor function.
    pub const fn new(resolve: fn() -> &'static TypeInfo) -> Self {
        Self(resolve)
    }

    /// Resolve the descriptor.
    pub fn get(&self) -> &'static TypeInfo {
        (self.0)()
    }
}

impl From<fn() -> &'static TypeInfo> for TypeRef {
    fn from(resolve: fn() -> &'static TypeInfo) -> Self {
        Self(resolve)
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeRef({})", self.get().name())
    }
}

/// Identity of a type descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey(usize);

/// Builtin immutable leaf kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// `true` / `false`.
    Bool,
    /// 64-bit signed integer.
    Int,
    /// 64-bit float.
    Float,
    /// Immutable string. May be null.
    String,
}

/// Whether a member is a property or a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    /// Accessor-backed member.
    Property,
    /// Storage member.
    Field,
}

/// Member visibility, filtered by the binding flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// Visible to everyone.
    Public,
    /// Private or internal.
    NonPublic,
}

/// Description of one member of a class.
#[derive(Debug)]
pub struct MemberInfo {
    name: String,
    declaring_type: String,
    kind: MemberKind,
    visibility: Visibility,
    value_type: TypeRef,
    readonly: bool,
    indexer: bool,
}

impl MemberInfo {
    /// The member name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the type that declares the member.
    pub fn declaring_type(&self) -> &str {
        &self.declaring_type
    }

    /// Property or field.
    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    /// Public or non-public.
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Declared type of the member's value.
    pub fn value_type(&self) -> &'static TypeInfo {
        self.value_type.get()
    }

    /// Readonly members can only be set by the initializer.
    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    /// Indexers take an argument and can never be walked.
    pub fn is_indexer(&self) -> bool {
        self.indexer
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &MemberInfo) -> bool {
        std::ptr::eq(self, other)
    }
}

impl fmt::Display for MemberInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.declaring_type, self.name)
    }
}

/// Class-specific type information.
pub struct ClassInfo {
    members: Vec<MemberInfo>,
    base: Option<TypeRef>,
    immutable: bool,
    equatable: bool,
    notifies: bool,
    constructor: Option<Constructor>,
}

impl ClassInfo {
    /// Members declared on this class, excluding inherited ones.
    pub fn declared_members(&self) -> &[MemberInfo] {
        &self.members
    }

    /// The base class, if any.
    pub fn base(&self) -> Option<&'static TypeInfo> {
        self.base.map(|b| b.get())
    }

    /// Declared immutable by its author.
    pub fn is_immutable(&self) -> bool {
        self.immutable
    }

    /// Instances implement value equality.
    pub fn is_equatable(&self) -> bool {
        self.equatable
    }

    /// Instances raise property-changed notifications.
    pub fn notifies(&self) -> bool {
        self.notifies
    }
}

/// List-specific type information.
pub struct ListInfo {
    element: TypeRef,
    notifies: bool,
    constructor: Option<Constructor>,
}

impl ListInfo {
    /// Declared element type.
    pub fn element(&self) -> &'static TypeInfo {
        self.element.get()
    }

    /// Instances raise collection-changed notifications.
    pub fn notifies(&self) -> bool {
        self.notifies
    }
}

/// Map-specific type information. Keys are always primitive [`Key`](super::Key)s.
pub struct MapInfo {
    value: TypeRef,
    notifies: bool,
    constructor: Option<Constructor>,
}

impl MapInfo {
    /// Declared value type.
    pub fn value(&self) -> &'static TypeInfo {
        self.value.get()
    }

    /// Instances raise collection-changed notifications.
    pub fn notifies(&self) -> bool {
        self.notifies
    }
}

/// The kind of a type.
pub enum TypeKind {
    /// An immutable builtin leaf.
    Primitive(Primitive),
    /// A class with members.
    Class(ClassInfo),
    /// An ordered list.
    List(ListInfo),
    /// A keyed dictionary.
    Map(MapInfo),
}

/// A runtime type descriptor.
pub struct TypeInfo {
    name: String,
    kind: TypeKind,
}

impl TypeInfo {
    /// Create a primitive descriptor. Only the builtin [`types`](super::types) should need this.
    pub fn primitive(name: impl Into<String>, primitive: Primitive) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::Primitive(primitive),
        }
    }

    /// Start declaring a class.
    pub fn class(name: impl Into<String>) -> ClassBuilder {
        ClassBuilder {
            name: name.into(),
            members: Vec::new(),
            base: None,
            immutable: false,
            equatable: false,
            notifies: true,
            constructor: None,
        }
    }

    /// Start declaring a list type.
    pub fn list(name: impl Into<String>, element: fn() -> &'static TypeInfo) -> CollectionBuilder {
        CollectionBuilder {
            name: name.into(),
            element: TypeRef::new(element),
            is_map: false,
            notifies: true,
            constructor: None,
        }
    }

    /// Start declaring a map type.
    pub fn map(name: impl Into<String>, value: fn() -> &'static TypeInfo) -> CollectionBuilder {
        CollectionBuilder {
            name: name.into(),
            element: TypeRef::new(value),
            is_map: true,
            notifies: true,
            constructor: None,
        }
    }

    /// The type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The type kind.
    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    /// Identity key of this descriptor.
    pub fn key(&self) -> TypeKey {
        TypeKey(self as *const TypeInfo as usize)
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &TypeInfo) -> bool {
        std::ptr::eq(self, other)
    }

    /// `Some` for primitives.
    pub fn as_primitive(&self) -> Option<Primitive> {
        match self.kind {
            TypeKind::Primitive(p) => Some(p),
            _ => None,
        }
    }

    /// `Some` for classes.
    pub fn as_class(&self) -> Option<&ClassInfo> {
        match &self.kind {
            TypeKind::Class(c) => Some(c),
            _ => None,
        }
    }

    /// `Some` for lists.
    pub fn as_list(&self) -> Option<&ListInfo> {
        match &self.kind {
            TypeKind::List(l) => Some(l),
            _ => None,
        }
    }

    /// `Some` for maps.
    pub fn as_map(&self) -> Option<&MapInfo> {
        match &self.kind {
            TypeKind::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Lists and maps.
    pub fn is_collection(&self) -> bool {
        matches!(self.kind, TypeKind::List(_) | TypeKind::Map(_))
    }

    /// Whether instances raise change notifications of their kind.
    pub fn notifies(&self) -> bool {
        match &self.kind {
            TypeKind::Primitive(_) => false,
            TypeKind::Class(c) => c.notifies,
            TypeKind::List(l) => l.notifies,
            TypeKind::Map(m) => m.notifies,
        }
    }

    /// Whether [`create_instance`](Self::create_instance) can succeed.
    pub fn has_constructor(&self) -> bool {
        self.constructor().is_some()
    }

    /// Create a default instance, if the type is default-constructible.
    pub fn create_instance(&self) -> Option<ObjectRef> {
        self.constructor().map(|ctor| ctor())
    }

    fn constructor(&self) -> Option<&Constructor> {
        match &self.kind {
            TypeKind::Primitive(_) => None,
            TypeKind::Class(c) => c.constructor.as_ref(),
            TypeKind::List(l) => l.constructor.as_ref(),
            TypeKind::Map(m) => m.constructor.as_ref(),
        }
    }

    /// Find a member by name, searching base classes.
    pub fn member(&self, name: &str) -> Option<&MemberInfo> {
        let class = self.as_class()?;
        class
            .members
            .iter()
            .find(|m| m.name == name)
            .or_else(|| class.base().and_then(|b| b.member(name)))
    }

    /// All members including inherited ones, base members first.
    pub fn all_members(&self) -> Vec<&MemberInfo> {
        let Some(class) = self.as_class() else {
            return Vec::new();
        };
        let mut members = class.base().map(|b| b.all_members()).unwrap_or_default();
        members.extend(class.members.iter());
        members
    }

    /// True if `self` is `other` or one of its base classes.
    pub fn is_assignable_from(&self, other: &TypeInfo) -> bool {
        let mut current = Some(other);
        while let Some(ty) = current {
            if self.ptr_eq(ty) {
                return true;
            }
            current = ty.as_class().and_then(|c| c.base());
        }
        false
    }

    /// Default slot value for a member of this type.
    pub fn default_value(&self) -> Value {
        match self.kind {
            TypeKind::Primitive(Primitive::Bool) => Value::Bool(false),
            TypeKind::Primitive(Primitive::Int) => Value::Int(0),
            TypeKind::Primitive(Primitive::Float) => Value::Float(0.0),
            _ => Value::Null,
        }
    }

    /// Check that `value` may be stored in a slot of this type.
    pub fn accepts(&self, value: &Value) -> bool {
        match (&self.kind, value) {
            (TypeKind::Primitive(Primitive::Bool), Value::Bool(_))
            | (TypeKind::Primitive(Primitive::Int), Value::Int(_))
            | (TypeKind::Primitive(Primitive::Float), Value::Float(_))
            | (TypeKind::Primitive(Primitive::String), Value::Str(_) | Value::Null) => true,
            (TypeKind::Primitive(_), _) => false,
            (_, Value::Null) => true,
            (_, Value::Object(obj)) => self.is_assignable_from(obj.type_info()),
            _ => false,
        }
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            TypeKind::Primitive(_) => "primitive",
            TypeKind::Class(_) => "class",
            TypeKind::List(_) => "list",
            TypeKind::Map(_) => "map",
        };
        f.debug_struct("TypeInfo")
            .field("name", &self.name)
            .field("kind", &kind)
            .finish()
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

// ----------------------------------------------------------------------------
// Builders
// ----------------------------------------------------------------------------

/// Builder for class descriptors.
pub struct ClassBuilder {
    name: String,
    members: Vec<MemberInfo>,
    base: Option<TypeRef>,
    immutable: bool,
    equatable: bool,
    notifies: bool,
    constructor: Option<Constructor>,
}

impl ClassBuilder {
    fn push(
        mut self,
        name: &str,
        ty: fn() -> &'static TypeInfo,
        kind: MemberKind,
        visibility: Visibility,
        readonly: bool,
        indexer: bool,
    ) -> Self {
        self.members.push(MemberInfo {
            name: name.to_string(),
            declaring_type: self.name.clone(),
            kind,
            visibility,
            value_type: TypeRef::new(ty),
            readonly,
            indexer,
        });
        self
    }

    /// A public, settable property.
    pub fn property(self, name: &str, ty: fn() -> &'static TypeInfo) -> Self {
        self.push(name, ty, MemberKind::Property, Visibility::Public, false, false)
    }

    /// A public property without a setter.
    pub fn readonly_property(self, name: &str, ty: fn() -> &'static TypeInfo) -> Self {
        self.push(name, ty, MemberKind::Property, Visibility::Public, true, false)
    }

    /// A public field.
    pub fn field(self, name: &str, ty: fn() -> &'static TypeInfo) -> Self {
        self.push(name, ty, MemberKind::Field, Visibility::Public, false, false)
    }

    /// A non-public field.
    pub fn private_field(self, name: &str, ty: fn() -> &'static TypeInfo) -> Self {
        self.push(name, ty, MemberKind::Field, Visibility::NonPublic, false, false)
    }

    /// A public readonly field.
    pub fn readonly_field(self, name: &str, ty: fn() -> &'static TypeInfo) -> Self {
        self.push(name, ty, MemberKind::Field, Visibility::Public, true, false)
    }

    /// An indexer property. Indexers must be ignored by settings to be walkable.
    pub fn indexer(self, name: &str, ty: fn() -> &'static TypeInfo) -> Self {
        self.push(name, ty, MemberKind::Property, Visibility::Public, false, true)
    }

    /// Inherit the members of a base class.
    pub fn base(mut self, base: fn() -> &'static TypeInfo) -> Self {
        self.base = Some(TypeRef::new(base));
        self
    }

    /// Declare instances immutable.
    pub fn immutable(mut self) -> Self {
        self.immutable = true;
        self
    }

    /// Declare that instances implement value equality.
    pub fn equatable(mut self) -> Self {
        self.equatable = true;
        self
    }

    /// Declare that instances do not raise notifications.
    pub fn silent(mut self) -> Self {
        self.notifies = false;
        self
    }

    /// Register the default constructor.
    pub fn constructor<F>(mut self, ctor: F) -> Self
    where
        F: Fn() -> ObjectRef + Send + Sync + 'static,
    {
        self.constructor = Some(Arc::new(ctor));
        self
    }

    /// Finish the descriptor.
    pub fn build(self) -> TypeInfo {
        TypeInfo {
            name: self.name,
            kind: TypeKind::Class(ClassInfo {
                members: self.members,
                base: self.base,
                immutable: self.immutable,
                equatable: self.equatable,
                notifies: self.notifies,
                constructor: self.constructor,
            }),
        }
    }
}

/// Builder for list and map descriptors.
pub struct CollectionBuilder {
    name: String,
    element: TypeRef,
    is_map: bool,
    notifies: bool,
    constructor: Option<Constructor>,
}

impl CollectionBuilder {
    /// Declare that instances do not raise collection-changed notifications.
    pub fn silent(mut self) -> Self {
        self.notifies = false;
        self
    }

    /// Register the default constructor.
    pub fn constructor<F>(mut self, ctor: F) -> Self
    where
        F: Fn() -> ObjectRef + Send + Sync + 'static,
    {
        self.constructor = Some(Arc::new(ctor));
        self
    }

    /// Finish the descriptor.
    pub fn build(self) -> TypeInfo {
        let kind = if self.is_map {
            TypeKind::Map(MapInfo {
                value: self.element,
                notifies: self.notifies,
                constructor: self.constructor,
            })
        } else {
            TypeKind::List(ListInfo {
                element: self.element,
                notifies: self.notifies,
                constructor: self.constructor,
            })
        };
        TypeInfo {
            name: self.name,
            kind,
        }
    }
}
