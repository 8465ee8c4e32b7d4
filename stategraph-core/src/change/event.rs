//! Change events.

use std::fmt;

use crate::path::MemberPath;
use crate::reflect::Index;

/// What changed at the end of a [`ChangeEvent`] path.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeKind {
    /// The named member was assigned.
    Property(String),
    /// An item was added at the position or key.
    Add(Index),
    /// The item at the position or key was removed.
    Remove(Index),
    /// The item at the position or key was replaced.
    Replace(Index),
    /// A list item moved.
    Move {
        /// Position before the move.
        from: usize,
        /// Position after the move.
        to: usize,
    },
    /// The object changed wholesale: a collection reset, or a class raising
    /// a change for all of its members.
    Reset,
}

/// One change somewhere in a tracked graph.
///
/// For [`ChangeKind::Property`] the path ends with the changed member. For
/// collection changes it ends at the collection and the kind carries the
/// position or key.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    /// Route from the tracked root to the change.
    pub path: MemberPath,
    /// What happened there.
    pub kind: ChangeKind,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Property(_) => f.write_str("assigned"),
            Self::Add(index) => write!(f, "added {index}"),
            Self::Remove(index) => write!(f, "removed {index}"),
            Self::Replace(index) => write!(f, "replaced {index}"),
            Self::Move { from, to } => write!(f, "moved [{from}] to [{to}]"),
            Self::Reset => f.write_str("reset"),
        }
    }
}

impl fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.path, self.kind)
    }
}
