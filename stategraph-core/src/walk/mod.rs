//! Graph Walker
//!
//! One-shot structural operations over live object graphs. For every pair of
//! values the walker decides, in order:
//!
//! 1. Both null, or both the same object: equal.
//! 2. Non-object leaves: compare by value.
//! 3. Objects of an equatable type: the type's own equality.
//! 4. Below the root with [`ReferenceHandling::References`], mutable objects
//!    compare and copy by identity.
//! 5. Otherwise recurse through the comparer registry: per key
//!    for maps, per position for lists, per member for classes.
//!
//! Runtime cycles are cut by [`ReferencePairs`]: a pair already on the
//! recursion stack is reported equal when reached again.
//!
//! [`ReferenceHandling::References`]: crate::settings::ReferenceHandling::References

pub(crate) mod comparers;
mod copy;
mod equal;
mod pairs;

pub use copy::copy;
pub use equal::equal;
pub use pairs::ReferencePairs;

pub(crate) use comparers::walked_members;
pub(crate) use equal::leaf_equal;
