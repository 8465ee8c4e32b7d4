//! Diffs
//!
//! A [`ValueDiff`] describes where two graphs differ, as a tree that mirrors
//! the members and elements walked. [`diff`] computes one on demand; a
//! [`DirtyTracker`](crate::DirtyTracker) keeps one up to date.

mod builder;
mod value_diff;

pub use builder::diff;
pub use value_diff::{SubDiff, ValueDiff};

pub(crate) use builder::DiffBuilder;
