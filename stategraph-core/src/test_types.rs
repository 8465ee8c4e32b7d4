//! Type descriptors shared by the unit tests.

use std::sync::OnceLock;

use crate::reflect::{types, ObjectRef, ObservableList, ObservableMap, Record, TypeInfo, Value};

macro_rules! descriptor {
    ($(#[$meta:meta])* $name:ident => $init:expr) => {
        $(#[$meta])*
        pub fn $name() -> &'static TypeInfo {
            static TYPE: OnceLock<TypeInfo> = OnceLock::new();
            TYPE.get_or_init(|| $init)
        }
    };
}

// ---- Pairs

descriptor!(
    /// `name: string`, `value: int`.
    pair => TypeInfo::class("Pair")
        .property("name", types::string)
        .property("value", types::int)
        .constructor(|| Record::new(pair()))
        .build()
);

/// A `Pair` holding `name` and `value`.
pub fn pair_with(name: &str, value: i64) -> ObjectRef {
    let record = Record::new(pair());
    record
        .set("name", Value::from(name))
        .and_then(|_| record.set("value", Value::from(value)))
        .expect("pair members accept strings and ints");
    record
}

descriptor!(
    /// A pair whose members can only be set at construction.
    frozen_pair => TypeInfo::class("FrozenPair")
        .readonly_property("name", types::string)
        .readonly_property("value", types::int)
        .build()
);

descriptor!(
    silent_pair => TypeInfo::class("SilentPair")
        .property("name", types::string)
        .property("value", types::int)
        .silent()
        .constructor(|| Record::new(silent_pair()))
        .build()
);

descriptor!(
    /// Equatable and mutable.
    point => TypeInfo::class("Point")
        .property("x", types::int)
        .property("y", types::int)
        .equatable()
        .constructor(|| Record::new(point()))
        .build()
);

// ---- Parent / child

descriptor!(
    parent => TypeInfo::class("Parent")
        .property("name", types::string)
        .property("child", child)
        .constructor(|| Record::new(parent()))
        .build()
);

descriptor!(
    child => TypeInfo::class("Child")
        .property("name", types::string)
        .property("parent", parent)
        .constructor(|| Record::new(child()))
        .build()
);

descriptor!(
    parent_list => TypeInfo::list("ParentList", parent)
        .constructor(|| ObservableList::new(parent_list()))
        .build()
);

// ---- Inheritance

descriptor!(
    item => TypeInfo::class("Item")
        .property("name", types::string)
        .property("value", types::int)
        .constructor(|| Record::new(item()))
        .build()
);

descriptor!(
    derived_item => TypeInfo::class("DerivedItem")
        .base(item)
        .property("extra", types::int)
        .constructor(|| Record::new(derived_item()))
        .build()
);

// ---- Member shapes

descriptor!(
    with_private => TypeInfo::class("WithPrivate")
        .property("visible", types::int)
        .private_field("hidden", types::int)
        .constructor(|| Record::new(with_private()))
        .build()
);

descriptor!(
    /// Readonly all the way down, but reaches itself.
    immutable_loop => TypeInfo::class("ImmutableLoop")
        .readonly_property("next", immutable_loop)
        .build()
);

descriptor!(
    with_indexer => TypeInfo::class("WithIndexer")
        .property("name", types::string)
        .indexer("item", types::int)
        .constructor(|| Record::new(with_indexer()))
        .build()
);

// ---- Collections

descriptor!(
    int_list => TypeInfo::list("IntList", types::int)
        .constructor(|| ObservableList::new(int_list()))
        .build()
);

descriptor!(
    silent_int_list => TypeInfo::list("SilentIntList", types::int)
        .silent()
        .constructor(|| ObservableList::new(silent_int_list()))
        .build()
);

descriptor!(
    pair_list => TypeInfo::list("PairList", pair)
        .constructor(|| ObservableList::new(pair_list()))
        .build()
);

descriptor!(
    pair_map => TypeInfo::map("PairMap", pair)
        .constructor(|| ObservableMap::new(pair_map()))
        .build()
);

// ---- Holders

descriptor!(
    holder => TypeInfo::class("Holder")
        .property("inner", no_ctor)
        .constructor(|| Record::new(holder()))
        .build()
);

descriptor!(
    /// Mutable but cannot be created by a copy.
    no_ctor => TypeInfo::class("NoCtor")
        .property("value", types::int)
        .build()
);

descriptor!(
    readonly_holder => TypeInfo::class("ReadonlyHolder")
        .readonly_property("pair", pair)
        .constructor(|| Record::new(readonly_holder()))
        .build()
);

descriptor!(
    silent_holder => TypeInfo::class("SilentHolder")
        .property("inner", silent_pair)
        .constructor(|| Record::new(silent_holder()))
        .build()
);

descriptor!(
    silent_list_holder => TypeInfo::class("SilentListHolder")
        .property("items", silent_int_list)
        .constructor(|| Record::new(silent_list_holder()))
        .build()
);
