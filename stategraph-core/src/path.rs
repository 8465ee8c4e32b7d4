//! Member Paths
//!
//! A [`MemberPath`] is the route from a graph root to the member currently
//! being visited: `Parent.children[3].name`. Paths are append-only and share
//! their prefixes, so extending one during a walk is a single allocation.
//!
//! Paths serve two purposes:
//!
//! - Error reporting: every verification error and every runtime comparison
//!   or copy failure names the path where it happened.
//! - Static loop detection during verification: [`MemberPath::has_loop`]
//!   reports a path whose last member already occurs earlier, meaning the
//!   type graph reaches itself. This is independent of runtime cycle
//!   detection over live object identity.

use std::fmt;
use std::sync::Arc;

use crate::reflect::{Index, MemberInfo, MemberKind, TypeInfo};

/// One segment of a path.
#[derive(Debug, Clone)]
pub enum PathItem {
    /// The type the walk started from.
    Root(&'static TypeInfo),
    /// A property or field.
    Member(&'static MemberInfo),
    /// Any element of a collection (type-level walks).
    Element,
    /// A concrete list position or map key (instance-level walks).
    Index(Index),
}

impl PartialEq for PathItem {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Root(a), Self::Root(b)) => a.ptr_eq(b),
            (Self::Member(a), Self::Member(b)) => a.ptr_eq(b),
            (Self::Element, Self::Element) => true,
            (Self::Index(a), Self::Index(b)) => a == b,
            _ => false,
        }
    }
}

struct PathNode {
    item: PathItem,
    parent: Option<MemberPath>,
    len: usize,
}

/// An immutable, prefix-sharing path from a root type to a member.
#[derive(Clone)]
pub struct MemberPath(Arc<PathNode>);

impl MemberPath {
    /// A path consisting of the root only.
    pub fn root(ty: &'static TypeInfo) -> Self {
        Self(Arc::new(PathNode {
            item: PathItem::Root(ty),
            parent: None,
            len: 1,
        }))
    }

    fn push(&self, item: PathItem) -> Self {
        Self(Arc::new(PathNode {
            item,
            parent: Some(self.clone()),
            len: self.0.len + 1,
        }))
    }

    /// Extend with a property or field.
    pub fn with_member(&self, member: &'static MemberInfo) -> Self {
        self.push(PathItem::Member(member))
    }

    /// Extend with a property.
    pub fn with_property(&self, member: &'static MemberInfo) -> Self {
        debug_assert_eq!(member.kind(), MemberKind::Property);
        self.with_member(member)
    }

    /// Extend with a field.
    pub fn with_field(&self, member: &'static MemberInfo) -> Self {
        debug_assert_eq!(member.kind(), MemberKind::Field);
        self.with_member(member)
    }

    /// Extend with "any element" of a collection.
    pub fn with_element(&self) -> Self {
        self.push(PathItem::Element)
    }

    /// Extend with a concrete index or key.
    pub fn with_index(&self, index: impl Into<Index>) -> Self {
        self.push(PathItem::Index(index.into()))
    }

    /// The last segment.
    pub fn last(&self) -> &PathItem {
        &self.0.item
    }

    /// The path without its last segment.
    pub fn parent(&self) -> Option<&MemberPath> {
        self.0.parent.as_ref()
    }

    /// Number of segments, root included.
    pub fn len(&self) -> usize {
        self.0.len
    }

    /// Always false: a path has at least its root.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The member of the last segment, if it is one.
    pub fn last_member(&self) -> Option<&'static MemberInfo> {
        match self.0.item {
            PathItem::Member(m) => Some(m),
            _ => None,
        }
    }

    /// The type the path starts from.
    pub fn root_type(&self) -> &'static TypeInfo {
        let mut current = self;
        while let Some(parent) = current.parent() {
            current = parent;
        }
        match current.0.item {
            PathItem::Root(ty) => ty,
            _ => unreachable!("a path always starts at a root"),
        }
    }

    /// The declared type at the end of the path.
    pub fn last_type(&self) -> &'static TypeInfo {
        match &self.0.item {
            PathItem::Root(ty) => ty,
            PathItem::Member(m) => m.value_type(),
            PathItem::Element | PathItem::Index(_) => {
                let container = self
                    .parent()
                    .map(MemberPath::last_type)
                    .unwrap_or_else(|| self.root_type());
                if let Some(list) = container.as_list() {
                    list.element()
                } else if let Some(map) = container.as_map() {
                    map.value()
                } else {
                    container
                }
            }
        }
    }

    /// Segments from the root to the last one.
    pub fn items(&self) -> Vec<PathItem> {
        let mut items = Vec::with_capacity(self.len());
        let mut current = Some(self);
        while let Some(path) = current {
            items.push(path.0.item.clone());
            current = path.parent();
        }
        items.reverse();
        items
    }

    /// True if any segment is `member`.
    pub fn contains(&self, member: &MemberInfo) -> bool {
        let mut current = Some(self);
        while let Some(path) = current {
            if let PathItem::Member(m) = path.0.item {
                if m.ptr_eq(member) {
                    return true;
                }
            }
            current = path.parent();
        }
        false
    }

    /// True if the last member already occurs earlier in the path.
    pub fn has_loop(&self) -> bool {
        match (self.last_member(), self.parent()) {
            (Some(last), Some(parent)) => parent.contains(last),
            _ => false,
        }
    }
}

impl PartialEq for MemberPath {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.items() == other.items()
    }
}

impl fmt::Display for MemberPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for item in self.items() {
            match item {
                PathItem::Root(ty) => f.write_str(ty.name())?,
                PathItem::Member(m) => write!(f, ".{}", m.name())?,
                PathItem::Element => f.write_str("[]")?,
                PathItem::Index(index) => write!(f, "{index}")?,
            }
        }
        Ok(())
    }
}

impl fmt::Debug for MemberPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemberPath({self})")
    }
}
