//! Verification error values.
//!
//! A [`TypeErrors`] holds everything wrong with one type, in the order the
//! members were visited. Problems found inside a member's type are attached
//! as a [`TypeError::Nested`] set, so the result mirrors the shape of the type
//! graph. [`TypeErrors::all_errors`] flattens the tree once, on first use.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::path::MemberPath;
use crate::reflect::{MemberInfo, TypeInfo};

/// One reason a type cannot be processed under a settings tuple.
#[derive(Debug, Clone)]
pub enum TypeError {
    /// A mutable reference member was reached with `ReferenceHandling::Throw`.
    RequiresReferenceHandling {
        /// Where the member was reached.
        path: MemberPath,
        /// The member's declared type.
        ty: &'static TypeInfo,
    },

    /// Copy would need to create an instance of a type without a constructor.
    CannotCreateInstance {
        /// Where the instance would be created.
        path: MemberPath,
        /// The type lacking a constructor.
        ty: &'static TypeInfo,
    },

    /// Indexers cannot be walked and must be ignored.
    UnsupportedIndexer {
        /// Path to the indexer.
        path: MemberPath,
        /// The indexer member.
        member: &'static MemberInfo,
    },

    /// Tracking needs property-changed notifications from this type.
    TypeMustNotify {
        /// Where the type was reached.
        path: MemberPath,
        /// The silent class.
        ty: &'static TypeInfo,
    },

    /// Tracking needs collection-changed notifications from this type.
    CollectionMustNotify {
        /// Where the collection was reached.
        path: MemberPath,
        /// The silent collection type.
        ty: &'static TypeInfo,
    },

    /// A readonly member of a mutable type cannot be copied by reference.
    ReadonlyMemberReference {
        /// Path to the member.
        path: MemberPath,
        /// The readonly member.
        member: &'static MemberInfo,
    },

    /// The type graph reaches the same member again.
    ReferenceLoop {
        /// Path ending in the repeated member.
        path: MemberPath,
    },

    /// Errors found inside a member's type.
    Nested(Arc<TypeErrors>),
}

impl TypeError {
    /// The path where the error was found.
    pub fn path(&self) -> &MemberPath {
        match self {
            Self::RequiresReferenceHandling { path, .. }
            | Self::CannotCreateInstance { path, .. }
            | Self::UnsupportedIndexer { path, .. }
            | Self::TypeMustNotify { path, .. }
            | Self::CollectionMustNotify { path, .. }
            | Self::ReadonlyMemberReference { path, .. }
            | Self::ReferenceLoop { path } => path,
            Self::Nested(nested) => nested.path(),
        }
    }

    /// The member at the end of the path, if the path ends in one.
    pub fn member(&self) -> Option<&'static MemberInfo> {
        self.path().last_member()
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequiresReferenceHandling { path, ty } => write!(
                f,
                "{path}: the type {ty} is a mutable reference type and requires a reference handling other than throw"
            ),
            Self::CannotCreateInstance { path, ty } => write!(
                f,
                "{path}: cannot create an instance of {ty}, it has no default constructor"
            ),
            Self::UnsupportedIndexer { path, member } => {
                write!(f, "{path}: the indexer {member} is not supported")
            }
            Self::TypeMustNotify { path, ty } => {
                write!(f, "{path}: the type {ty} must raise property-changed notifications")
            }
            Self::CollectionMustNotify { path, ty } => write!(
                f,
                "{path}: the collection {ty} must raise collection-changed notifications"
            ),
            Self::ReadonlyMemberReference { path, member } => write!(
                f,
                "{path}: the readonly member {member} of mutable type {} cannot be copied by reference",
                member.value_type()
            ),
            Self::ReferenceLoop { path } => {
                write!(f, "{path}: the type graph loops back on itself")
            }
            Self::Nested(nested) => write!(
                f,
                "{}: the type {} has errors",
                nested.path(),
                nested.type_info()
            ),
        }
    }
}

/// All errors of one type, in visit order.
pub struct TypeErrors {
    ty: &'static TypeInfo,
    path: MemberPath,
    errors: Vec<TypeError>,
    flat: OnceLock<Vec<TypeError>>,
}

impl TypeErrors {
    pub(crate) fn new(ty: &'static TypeInfo, path: MemberPath, errors: Vec<TypeError>) -> Self {
        Self {
            ty,
            path,
            errors,
            flat: OnceLock::new(),
        }
    }

    /// The type the errors belong to.
    pub fn type_info(&self) -> &'static TypeInfo {
        self.ty
    }

    /// Where the type was reached.
    pub fn path(&self) -> &MemberPath {
        &self.path
    }

    /// The direct errors, nested sets included as [`TypeError::Nested`].
    pub fn errors(&self) -> &[TypeError] {
        &self.errors
    }

    /// Every non-nested error in the tree, depth first.
    ///
    /// A nested set reachable along several routes is visited once.
    pub fn all_errors(&self) -> &[TypeError] {
        self.flat.get_or_init(|| {
            let mut out = Vec::new();
            let mut seen = HashSet::new();
            seen.insert(self as *const TypeErrors as usize);
            flatten(&self.errors, &mut seen, &mut out);
            out
        })
    }

    /// Number of flattened errors.
    pub fn len(&self) -> usize {
        self.all_errors().len()
    }

    /// Always false for a verdict; an error-free type has no `TypeErrors`.
    pub fn is_empty(&self) -> bool {
        self.all_errors().is_empty()
    }
}

fn flatten(errors: &[TypeError], seen: &mut HashSet<usize>, out: &mut Vec<TypeError>) {
    for error in errors {
        match error {
            TypeError::Nested(nested) => {
                if seen.insert(Arc::as_ptr(nested) as usize) {
                    flatten(&nested.errors, seen, out);
                }
            }
            other => out.push(other.clone()),
        }
    }
}

impl fmt::Debug for TypeErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeErrors")
            .field("type", &self.ty.name())
            .field("path", &self.path)
            .field("errors", &self.errors)
            .finish()
    }
}
