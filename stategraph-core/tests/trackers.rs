//! Integration Tests for the Trackers
//!
//! Dirty and change trackers attached to live order books and cyclic graphs.
//! The property tests replay random edits and check the tracker against a
//! fresh one-shot comparison after every step.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use proptest::prelude::*;

use common::{family, line_of, lines, order_of, pair_with, parent};
use stategraph_core::reflect::{ListAccess, ObjectRef, Record, Value};
use stategraph_core::{
    diff, equal, ChangeKind, ChangeTracker, DirtyTracker, Error, MemberSettings, ReferenceHandling,
};

fn structural() -> Arc<MemberSettings> {
    MemberSettings::properties(ReferenceHandling::Structural)
}

fn counter() -> (Arc<AtomicUsize>, impl Fn() -> usize) {
    let count = Arc::new(AtomicUsize::new(0));
    let read = {
        let count = count.clone();
        move || count.load(Ordering::SeqCst)
    };
    (count, read)
}

/// Test that one leaf edit raises exactly one dirty event, and reverting it another.
#[test]
fn dirty_flips_on_a_leaf_and_back() {
    let (x, y) = (pair_with("a", 1), pair_with("a", 1));
    let tracker = DirtyTracker::new(&x, &y, structural()).unwrap();
    let (count, events) = counter();
    tracker.subscribe(move |_| {
        count.fetch_add(1, Ordering::SeqCst);
    });
    assert!(!tracker.is_dirty());

    x.set("value", Value::from(2)).unwrap();
    assert!(tracker.is_dirty());
    assert_eq!(events(), 1);

    x.set("value", Value::from(1)).unwrap();
    assert!(!tracker.is_dirty());
    assert_eq!(events(), 2);
}

/// Test that a trailing null line makes the orders differ everywhere.
#[test]
fn trailing_null_lines_are_a_difference() {
    let settings = structural();
    let x = order_of(1, "ada", &[("apple", 2)]);
    let y = order_of(1, "ada", &[("apple", 2)]);
    let tracker = DirtyTracker::new(&x, &y, settings.clone()).unwrap();

    lines(&x).as_list().unwrap().push(Value::Null).unwrap();
    assert!(!equal(&x, &y, &settings).unwrap());
    assert!(tracker.is_dirty());
    let from_tracker = tracker.diff().unwrap().unwrap();
    let one_shot = diff(&x, &y, &settings).unwrap().unwrap();
    assert_eq!(from_tracker.to_string(), one_shot.to_string());
    assert!(one_shot.find(&["lines", "[1]"]).unwrap().is_leaf());

    lines(&y).as_list().unwrap().push(Value::Null).unwrap();
    assert!(equal(&x, &y, &settings).unwrap());
    assert!(diff(&x, &y, &settings).unwrap().is_none());
    assert!(!tracker.is_dirty());
}

/// Test that edits deep inside both orders keep the diff current.
#[test]
fn dirty_tracks_nested_lists() {
    let x = order_of(1, "ada", &[("apple", 2)]);
    let y = order_of(1, "ada", &[("apple", 2)]);
    let tracker = DirtyTracker::new(&x, &y, structural()).unwrap();
    assert!(!tracker.is_dirty());

    let x_lines = lines(&x);
    x_lines.as_list().unwrap().push(Value::from(line_of("pear", 1))).unwrap();
    assert!(tracker.is_dirty());
    assert!(tracker.diff().unwrap().unwrap().find(&["lines", "[1]"]).is_some());

    lines(&y).as_list().unwrap().push(Value::from(line_of("pear", 1))).unwrap();
    assert!(!tracker.is_dirty());

    // Replacing the whole list with an equal one keeps the graphs equal.
    let fresh = order_of(0, "", &[("apple", 2), ("pear", 1)]);
    y.set("lines", Value::from(lines(&fresh))).unwrap();
    assert!(!tracker.is_dirty());
    assert_eq!(x_lines.notifier().unwrap().subscriber_count(), 1);
}

/// Test that a dirty tracker handles the parent/child cycle.
#[test]
fn dirty_tracks_cycles() {
    let (x, x_child) = family("p", "c");
    let (y, _) = family("p", "c");
    let tracker = DirtyTracker::new(&x, &y, structural()).unwrap();
    assert!(!tracker.is_dirty());

    x_child.set("name", Value::from("d")).unwrap();
    assert!(tracker.is_dirty());
    x_child.set("name", Value::from("c")).unwrap();
    assert!(!tracker.is_dirty());

    // Breaking the cycle on one side only.
    x_child.set("parent", Value::Null).unwrap();
    assert!(tracker.is_dirty());
    assert!(tracker
        .diff()
        .unwrap()
        .unwrap()
        .find(&["child", "parent"])
        .unwrap()
        .is_leaf());
}

/// Test the replace scenario: one change, the old subtree goes quiet.
#[test]
fn change_tracker_replaces_subtrees() {
    let (p, old_child) = family("p", "c");
    let tracker = ChangeTracker::new(&p, structural()).unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = seen.clone();
    tracker.subscribe(move |e| seen_clone.lock().push(e.clone()));

    let replacement = Record::new(common::child());
    p.set("child", Value::from(&replacement)).unwrap();
    assert_eq!(tracker.changes(), 1);
    assert_eq!(seen.lock()[0].path.to_string(), "Parent.child");
    assert_eq!(seen.lock()[0].kind, ChangeKind::Property("child".into()));

    old_child.set("name", Value::from("ignored")).unwrap();
    assert_eq!(old_child.notifier().unwrap().subscriber_count(), 0);
    assert_eq!(tracker.changes(), 1);

    replacement.set("name", Value::from("seen")).unwrap();
    assert_eq!(tracker.changes(), 2);
    assert_eq!(seen.lock()[1].path.to_string(), "Parent.child.name");
}

/// Test change paths through a list of lines.
#[test]
fn change_tracker_reports_list_paths() {
    let order = order_of(7, "ada", &[("apple", 2), ("pear", 1)]);
    let tracker = ChangeTracker::new(&order, structural()).unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = seen.clone();
    tracker.subscribe(move |e| seen_clone.lock().push(e.path.to_string()));

    let list = lines(&order);
    let pear = list.as_list().unwrap().item(1).unwrap();
    pear.as_object().unwrap().set("qty", Value::from(4)).unwrap();
    list.as_list().unwrap().move_item(1, 0).unwrap();
    pear.as_object().unwrap().set("qty", Value::from(5)).unwrap();
    list.as_list().unwrap().clear();
    pear.as_object().unwrap().set("qty", Value::from(6)).unwrap();

    assert_eq!(
        *seen.lock(),
        vec![
            "Order.lines[1].qty",
            "Order.lines",
            "Order.lines[0].qty",
            "Order.lines",
        ]
    );
    assert_eq!(tracker.changes(), 4);
    assert_eq!(tracker.node_count(), 2);
}

/// Test that both trackers refuse unverifiable settings up front.
#[test]
fn trackers_verify_first() {
    let throw = MemberSettings::properties(ReferenceHandling::Throw);
    let (p, c) = family("p", "c");
    assert!(matches!(ChangeTracker::new(&p, throw.clone()), Err(Error::Verification(_))));
    assert!(matches!(
        DirtyTracker::new(&p, &Record::new(parent()), throw),
        Err(Error::Verification(_))
    ));
    assert_eq!(p.notifier().unwrap().subscriber_count(), 0);
    assert_eq!(c.notifier().unwrap().subscriber_count(), 0);
}

// ---- Properties

#[derive(Debug, Clone)]
enum Edit {
    Push { left: bool, sku: String, qty: i64 },
    PushNull { left: bool },
    Remove { left: bool, at: usize },
    SetQty { left: bool, at: usize, qty: i64 },
    Replace { left: bool, at: usize, qty: i64 },
    Customer { left: bool, name: String },
}

fn any_edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (any::<bool>(), "[ab]", 0i64..3).prop_map(|(left, sku, qty)| Edit::Push { left, sku, qty }),
        any::<bool>().prop_map(|left| Edit::PushNull { left }),
        (any::<bool>(), 0usize..4).prop_map(|(left, at)| Edit::Remove { left, at }),
        (any::<bool>(), 0usize..4, 0i64..3)
            .prop_map(|(left, at, qty)| Edit::SetQty { left, at, qty }),
        (any::<bool>(), 0usize..4, 0i64..3)
            .prop_map(|(left, at, qty)| Edit::Replace { left, at, qty }),
        (any::<bool>(), "[ab]").prop_map(|(left, name)| Edit::Customer { left, name }),
    ]
}

fn apply(edit: &Edit, x: &ObjectRef, y: &ObjectRef) {
    let side = |left: bool| if left { x } else { y };
    match edit {
        Edit::Push { left, sku, qty } => {
            let list = lines(side(*left));
            list.as_list().unwrap().push(Value::from(line_of(sku, *qty))).unwrap();
        }
        Edit::PushNull { left } => {
            lines(side(*left)).as_list().unwrap().push(Value::Null).unwrap();
        }
        Edit::Remove { left, at } => {
            let list = lines(side(*left));
            let items = list.as_list().unwrap();
            if *at < items.len() {
                items.remove_at(*at).unwrap();
            }
        }
        Edit::SetQty { left, at, qty } => {
            let list = lines(side(*left));
            if let Some(Value::Object(item)) = list.as_list().unwrap().item(*at) {
                item.set("qty", Value::from(*qty)).unwrap();
            }
        }
        Edit::Replace { left, at, qty } => {
            let list = lines(side(*left));
            let items = list.as_list().unwrap();
            if *at < items.len() {
                items.set_item(*at, Value::from(line_of("a", *qty))).unwrap();
            }
        }
        Edit::Customer { left, name } => {
            side(*left).set("customer", Value::from(name.as_str())).unwrap();
        }
    }
}

proptest! {
    #[test]
    fn dirty_tracker_agrees_with_equal(edits in prop::collection::vec(any_edit(), 0..12)) {
        let settings = structural();
        let x = order_of(1, "a", &[("a", 1)]);
        let y = order_of(1, "a", &[("a", 1)]);
        let tracker = DirtyTracker::new(&x, &y, settings.clone()).unwrap();

        for edit in &edits {
            apply(edit, &x, &y);
            let equal_now = equal(&x, &y, &settings).unwrap();
            prop_assert_eq!(tracker.is_dirty(), !equal_now, "after {:?}", edit);
            prop_assert_eq!(tracker.diff().unwrap().is_none(), equal_now);
        }
    }

    #[test]
    fn change_tracker_counts_every_edit(edits in prop::collection::vec(any_edit(), 0..12)) {
        let x = order_of(1, "a", &[("a", 1)]);
        let y = order_of(1, "a", &[("a", 1)]);
        let tracker = ChangeTracker::new(&x, structural()).unwrap();

        let mut expected = 0;
        for edit in &edits {
            let before = tracker.changes();
            let snapshot = lines(&x).as_list().unwrap().len();
            apply(edit, &x, &y);
            let changed = tracker.changes() - before;
            prop_assert!(changed <= 1, "one notification, at most one change: {:?}", edit);
            expected += changed;
            if matches!(edit, Edit::Push { left: true, .. } | Edit::PushNull { left: true }) {
                prop_assert_eq!(changed, 1);
                prop_assert_eq!(lines(&x).as_list().unwrap().len(), snapshot + 1);
            }
        }
        prop_assert_eq!(tracker.changes(), expected);
        drop(tracker);
        prop_assert_eq!(x.notifier().unwrap().subscriber_count(), 0);
    }
}
