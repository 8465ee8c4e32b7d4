//! Edge labels.
//!
//! An [`Edge`] names the slot of a live object a tracker node mirrors: a
//! member of a class instance, a list position or a map key.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::diff::{SubDiff, ValueDiff};
use crate::path::MemberPath;
use crate::reflect::{Index, MemberInfo, ObjectRef, TypeKind, Value};
use crate::settings::MemberSettings;
use crate::Result;

/// A member or element slot of an object.
#[derive(Debug, Clone)]
pub enum Edge {
    /// A property or field, identified by its descriptor.
    Member(&'static MemberInfo),
    /// A list position or map key.
    Index(Index),
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Member(a), Self::Member(b)) => a.ptr_eq(b),
            (Self::Index(a), Self::Index(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Edge {}

impl Hash for Edge {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Self::Member(m) => {
                0u8.hash(state);
                std::ptr::hash(*m, state);
            }
            Self::Index(i) => {
                1u8.hash(state);
                i.hash(state);
            }
        }
    }
}

impl Edge {
    /// Every slot of `x` and `y` in walk order.
    ///
    /// Classes yield the enumerated members (ignored ones and indexers
    /// included), lists every position up to the longer length, maps the
    /// keys of `x` followed by the keys only `y` has.
    pub fn all(settings: &MemberSettings, x: &ObjectRef, y: &ObjectRef) -> Vec<Edge> {
        match x.type_info().kind() {
            TypeKind::Class(_) => settings
                .members(x.type_info())
                .into_iter()
                .map(Edge::Member)
                .collect(),
            TypeKind::List(_) => {
                let len = |o: &ObjectRef| o.as_list().map_or(0, |l| l.len());
                (0..len(x).max(len(y)))
                    .map(|i| Edge::Index(Index::Position(i)))
                    .collect()
            }
            TypeKind::Map(_) => {
                let keys = |o: &ObjectRef| o.as_map().map(|m| m.keys()).unwrap_or_default();
                let mut keys_x = keys(x);
                for key in keys(y) {
                    if !keys_x.contains(&key) {
                        keys_x.push(key);
                    }
                }
                keys_x.into_iter().map(|k| Edge::Index(Index::Key(k))).collect()
            }
            TypeKind::Primitive(_) => Vec::new(),
        }
    }

    /// The current value in the slot, or `None` when `object` has no such
    /// position or key. A member is always present.
    pub fn read(&self, object: &ObjectRef) -> Result<Option<Value>> {
        Ok(match self {
            Self::Member(member) => Some(object.get(member.name())?),
            Self::Index(Index::Position(i)) => object.as_list().and_then(|l| l.item(*i)),
            Self::Index(Index::Key(key)) => object.as_map().and_then(|m| m.value(key)),
        })
    }

    /// True for indexers and ignored members.
    pub fn is_excluded(&self, settings: &MemberSettings) -> bool {
        match self {
            Self::Member(member) => member.is_indexer() || settings.is_ignoring_member(member),
            Self::Index(_) => false,
        }
    }

    /// Extend `path` through this slot.
    pub fn extend(&self, path: &MemberPath) -> MemberPath {
        match self {
            Self::Member(member) => path.with_member(member),
            Self::Index(index) => path.with_index(index.clone()),
        }
    }

    /// Attach a nested diff to this slot.
    pub fn sub_diff(&self, diff: ValueDiff) -> SubDiff {
        match self {
            Self::Member(member) => SubDiff::Member { member, diff },
            Self::Index(index) => SubDiff::Index {
                index: index.clone(),
                diff,
            },
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Member(member) => f.write_str(member.name()),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}
