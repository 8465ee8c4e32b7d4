//! The diff tree.

use std::fmt;

use crate::reflect::{Index, MemberInfo, Value};

/// The difference between two values.
///
/// A diff without sub-diffs is a leaf: `x` and `y` differ as a whole (two
/// different leaf values, objects of different types, an object and null).
/// A composite diff lists the members or elements that differ.
#[derive(Debug, Clone)]
pub struct ValueDiff {
    x: Value,
    y: Value,
    diffs: Vec<SubDiff>,
}

/// One differing member or element inside a composite diff.
#[derive(Debug, Clone)]
pub enum SubDiff {
    /// A differing member.
    Member {
        /// The member.
        member: &'static MemberInfo,
        /// How its values differ.
        diff: ValueDiff,
    },
    /// A differing list position or map entry.
    Index {
        /// The position or key.
        index: Index,
        /// How the elements differ.
        diff: ValueDiff,
    },
}

impl SubDiff {
    /// The nested diff.
    pub fn diff(&self) -> &ValueDiff {
        match self {
            Self::Member { diff, .. } | Self::Index { diff, .. } => diff,
        }
    }

    /// Member name or `[index]`.
    pub fn label(&self) -> String {
        match self {
            Self::Member { member, .. } => member.name().to_string(),
            Self::Index { index, .. } => index.to_string(),
        }
    }
}

impl ValueDiff {
    /// `x` and `y` differ as a whole.
    pub fn leaf(x: Value, y: Value) -> Self {
        Self {
            x,
            y,
            diffs: Vec::new(),
        }
    }

    /// `x` and `y` differ in the listed members or elements.
    pub fn new(x: Value, y: Value, diffs: Vec<SubDiff>) -> Self {
        Self { x, y, diffs }
    }

    /// The left value.
    pub fn x(&self) -> &Value {
        &self.x
    }

    /// The right value.
    pub fn y(&self) -> &Value {
        &self.y
    }

    /// The differing members or elements.
    pub fn diffs(&self) -> &[SubDiff] {
        &self.diffs
    }

    /// True if this diff has no sub-diffs.
    pub fn is_leaf(&self) -> bool {
        self.diffs.is_empty()
    }

    /// True if no leaf in the tree records a difference.
    ///
    /// A leaf always records one; a composite is empty when all its
    /// sub-diffs are.
    pub fn is_empty(&self) -> bool {
        !self.is_leaf() && self.diffs.iter().all(|d| d.diff().is_empty())
    }

    /// Follow member names and `[index]` labels down the tree.
    pub fn find(&self, labels: &[&str]) -> Option<&ValueDiff> {
        let Some((first, rest)) = labels.split_first() else {
            return Some(self);
        };
        self.diffs
            .iter()
            .find(|d| d.label() == *first)
            .and_then(|d| d.diff().find(rest))
    }

    fn write_tree(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        for sub in &self.diffs {
            write!(f, "\n{:indent$}{}", "", sub.label(), indent = depth * 2)?;
            let diff = sub.diff();
            if diff.is_leaf() {
                write!(f, " x: {} y: {}", diff.x, diff.y)?;
            } else {
                diff.write_tree(f, depth + 1)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for ValueDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_leaf() {
            return write!(f, "x: {} y: {}", self.x, self.y);
        }
        let name = match (&self.x, &self.y) {
            (Value::Object(o), _) | (_, Value::Object(o)) => o.type_info().name(),
            _ => self.x.type_name(),
        };
        f.write_str(name)?;
        self.write_tree(f, 1)
    }
}
