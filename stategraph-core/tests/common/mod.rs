//! Types shared by the integration tests.
//!
//! An order book: `Order { id, customer, lines: LineList }` with
//! `Line { sku, qty }`, plus the classic `Parent`/`Child` cycle.

#![allow(dead_code)]

use std::sync::OnceLock;

use stategraph_core::reflect::{
    types, ListAccess, ObjectRef, ObservableList, Record, TypeInfo, Value,
};

pub fn pair() -> &'static TypeInfo {
    static TYPE: OnceLock<TypeInfo> = OnceLock::new();
    TYPE.get_or_init(|| {
        TypeInfo::class("Pair")
            .property("name", types::string)
            .property("value", types::int)
            .constructor(|| Record::new(pair()))
            .build()
    })
}

pub fn pair_with(name: &str, value: i64) -> ObjectRef {
    Record::with(pair(), [("name", Value::from(name)), ("value", Value::from(value))]).unwrap()
}

/// Readonly members of immutable types only: a leaf.
pub fn money() -> &'static TypeInfo {
    static TYPE: OnceLock<TypeInfo> = OnceLock::new();
    TYPE.get_or_init(|| {
        TypeInfo::class("Money")
            .readonly_property("currency", types::string)
            .readonly_property("cents", types::int)
            .build()
    })
}

pub fn money_of(currency: &str, cents: i64) -> ObjectRef {
    Record::with(money(), [("currency", Value::from(currency)), ("cents", Value::from(cents))])
        .unwrap()
}

pub fn line() -> &'static TypeInfo {
    static TYPE: OnceLock<TypeInfo> = OnceLock::new();
    TYPE.get_or_init(|| {
        TypeInfo::class("Line")
            .property("sku", types::string)
            .property("qty", types::int)
            .property("price", money)
            .constructor(|| Record::new(line()))
            .build()
    })
}

pub fn line_list() -> &'static TypeInfo {
    static TYPE: OnceLock<TypeInfo> = OnceLock::new();
    TYPE.get_or_init(|| {
        TypeInfo::list("LineList", line)
            .constructor(|| ObservableList::new(line_list()))
            .build()
    })
}

pub fn order() -> &'static TypeInfo {
    static TYPE: OnceLock<TypeInfo> = OnceLock::new();
    TYPE.get_or_init(|| {
        TypeInfo::class("Order")
            .property("id", types::int)
            .property("customer", types::string)
            .property("lines", line_list)
            .constructor(|| Record::new(order()))
            .build()
    })
}

pub fn line_of(sku: &str, qty: i64) -> ObjectRef {
    Record::with(
        line(),
        [
            ("sku", Value::from(sku)),
            ("qty", Value::from(qty)),
            ("price", Value::from(money_of("EUR", qty * 100))),
        ],
    )
    .unwrap()
}

pub fn order_of(id: i64, customer: &str, lines: &[(&str, i64)]) -> ObjectRef {
    let list = ObservableList::new(line_list());
    for (sku, qty) in lines {
        list.as_list().unwrap().push(Value::from(line_of(sku, *qty))).unwrap();
    }
    Record::with(
        order(),
        [
            ("id", Value::from(id)),
            ("customer", Value::from(customer)),
            ("lines", Value::from(list)),
        ],
    )
    .unwrap()
}

/// The `lines` list of an order.
pub fn lines(order: &ObjectRef) -> ObjectRef {
    order.get("lines").unwrap().as_object().unwrap().clone()
}

pub fn parent() -> &'static TypeInfo {
    static TYPE: OnceLock<TypeInfo> = OnceLock::new();
    TYPE.get_or_init(|| {
        TypeInfo::class("Parent")
            .property("name", types::string)
            .property("child", child)
            .constructor(|| Record::new(parent()))
            .build()
    })
}

pub fn child() -> &'static TypeInfo {
    static TYPE: OnceLock<TypeInfo> = OnceLock::new();
    TYPE.get_or_init(|| {
        TypeInfo::class("Child")
            .property("name", types::string)
            .property("parent", parent)
            .constructor(|| Record::new(child()))
            .build()
    })
}

/// A parent and child pointing at each other.
pub fn family(parent_name: &str, child_name: &str) -> (ObjectRef, ObjectRef) {
    let p = Record::with(parent(), [("name", parent_name)]).unwrap();
    let c = Record::with(child(), [("name", child_name)]).unwrap();
    p.set("child", Value::from(&c)).unwrap();
    c.set("parent", Value::from(&p)).unwrap();
    (p, c)
}
