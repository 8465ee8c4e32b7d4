//! Runtime cycle detection.

use std::collections::HashSet;

use crate::reflect::{ObjectId, ObjectRef};

/// The `(x, y)` object pairs on the current recursion stack.
///
/// A pair that is already being compared is treated as equal when reached
/// again, which is what makes walking cyclic graphs terminate. Pairs are
/// removed when their comparison finishes, so an object reachable along two
/// routes is compared along both.
///
/// Walkers [`insert`](Self::insert) a pair before its comparer runs and
/// [`remove`](Self::remove) it once the comparer returns, on error too.
#[derive(Debug, Default)]
pub struct ReferencePairs {
    pairs: HashSet<(ObjectId, ObjectId)>,
}

impl ReferencePairs {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the pair as being walked. Returns false if it already was.
    pub fn insert(&mut self, x: &ObjectRef, y: &ObjectRef) -> bool {
        self.pairs.insert((x.id(), y.id()))
    }

    /// Mark the pair as finished.
    pub fn remove(&mut self, x: &ObjectRef, y: &ObjectRef) {
        self.pairs.remove(&(x.id(), y.id()));
    }
}
