//! Reflection Layer
//!
//! The graph algorithms never know concrete Rust types. They see instances
//! through three capabilities:
//!
//! - **Member enumeration** - a [`TypeInfo`] lists the members of a type, its
//!   base type, and what its instances promise.
//! - **Member access** - the [`Reflect`] trait reads and writes members by
//!   name and exposes list/map views.
//! - **Change notification** - `Reflect::notifier` hands out the object's
//!   [`Notifier`](crate::notify::Notifier), if it has one.
//!
//! [`Record`], [`ObservableList`] and [`ObservableMap`] implement all three
//! and cover the common case of plain data classes. Anything else can
//! implement [`Reflect`] directly.

mod collections;
mod object;
mod record;
mod type_info;
mod value;

pub mod types;

pub use collections::{ObservableList, ObservableMap};
pub use object::{ListAccess, MapAccess, Reflect};
pub use record::Record;
pub use type_info::{
    ClassBuilder, ClassInfo, CollectionBuilder, Constructor, ListInfo, MapInfo, MemberInfo,
    MemberKind, Primitive, TypeInfo, TypeKey, TypeKind, TypeRef, Visibility,
};
pub use value::{Index, Key, ObjectId, ObjectRef, Value};
