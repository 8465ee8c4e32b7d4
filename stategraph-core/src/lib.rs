//! Stategraph Core
//!
//! Structural operations over live, reflective object graphs:
//!
//! - Deep equality and diffs between two graphs
//! - Deep copy of one graph onto another, reusing the target's instances
//! - Dirty tracking: the difference between two graphs, kept current from
//!   change notifications
//! - Change tracking: every mutation below a root, reported with its path
//!
//! Graphs may share objects and contain cycles. How references are treated
//! is decided by [`MemberSettings`]; every operation first verifies that the
//! type can be handled under those settings and fails with a report naming
//! each offending member otherwise.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reflect`: Type descriptors, values and the stock observable instances
//! - `notify`: Change notifications raised by observable instances
//! - `settings`: Member selection, reference handling and canonical settings
//! - `verify`: Type-graph verification with cached verdicts
//! - `walk`: One-shot equality and copy
//! - `diff`: Difference trees
//! - `graph`: Reference-counted node arena shared by the trackers
//! - `dirty` / `change`: The two trackers
//!
//! # Example
//!
//! ```rust
//! use std::sync::OnceLock;
//! use stategraph_core::reflect::{types, Record, TypeInfo, Value};
//! use stategraph_core::{copy, equal, MemberSettings, ReferenceHandling};
//!
//! fn point() -> &'static TypeInfo {
//!     static TYPE: OnceLock<TypeInfo> = OnceLock::new();
//!     TYPE.get_or_init(|| {
//!         TypeInfo::class("LibPoint")
//!             .property("x", types::int)
//!             .property("y", types::int)
//!             .build()
//!     })
//! }
//!
//! let settings = MemberSettings::properties(ReferenceHandling::Structural);
//! let a = Record::with(point(), [("x", 1), ("y", 2)]).unwrap();
//! let b = Record::new(point());
//! assert!(!equal(&a, &b, &settings).unwrap());
//!
//! copy(&a, &b, &settings).unwrap();
//! assert!(equal(&a, &b, &settings).unwrap());
//! assert_eq!(b.get("y").unwrap(), Value::from(2));
//! ```

pub mod change;
pub mod diff;
pub mod dirty;
pub mod error;
pub mod graph;
pub mod notify;
pub mod path;
pub mod reflect;
pub mod settings;
pub mod verify;
pub mod walk;

#[cfg(test)]
mod test_types;

pub use change::{ChangeEvent, ChangeKind, ChangeTracker};
pub use diff::{diff, SubDiff, ValueDiff};
pub use dirty::{DirtyTracker, DirtyTrackerEvent};
pub use error::{Error, Result};
pub use path::MemberPath;
pub use settings::{MemberSettings, ReferenceHandling, SettingsConfig};
pub use verify::{
    verify_can_copy, verify_can_equal, verify_can_track_changes, verify_can_track_dirty,
};
pub use walk::{copy, equal};
