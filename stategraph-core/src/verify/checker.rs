//! The recursive walk over the type graph.
//!
//! The root type is always walked member by member. Every edge below it
//! (a member or a collection element) is then resolved against the
//! reference handling:
//!
//! - leaves (immutable or equatable types) and ignored types stop the walk;
//! - `References` stops the walk, the edge is handled by identity;
//! - `Throw` reports the edge and keeps walking, so the caller sees every
//!   problem at once;
//! - `Structural` keeps walking.
//!
//! The walk terminates on recursive types through [`MemberPath::has_loop`].
//! Under `Throw` the loop itself is an error. Under `Structural` it is fine:
//! cycles in live data are caught by the runtime identity checks.
//!
//! A nested type that passes without the walk being cut short anywhere below
//! it would pass on its own too, so that verdict is cached for the type
//! itself. Cached passes are not walked again. Failures are not cached for
//! nested types: their paths start at the root that was verified.

use std::sync::Arc;

use super::{Requirement, TypeError, TypeErrors};
use crate::path::MemberPath;
use crate::reflect::{MemberInfo, TypeInfo, TypeKey, TypeKind};
use crate::settings::{MemberSettings, ReferenceHandling};

pub(super) fn check(
    ty: &'static TypeInfo,
    settings: &MemberSettings,
    requirement: Requirement,
) -> Option<Arc<TypeErrors>> {
    let mut checker = Checker {
        settings,
        requirement,
        open_collections: Vec::new(),
        cuts: 0,
    };
    checker.check_type(ty, &MemberPath::root(ty))
}

/// Whether the trackers treat `ty` as a leaf.
///
/// Trackers cannot observe in-place mutation of an equatable object, so only
/// immutable types are leaves for them.
pub(crate) fn is_tracking_leaf(settings: &MemberSettings, ty: &'static TypeInfo) -> bool {
    settings.is_immutable(ty)
}

struct Checker<'a> {
    settings: &'a MemberSettings,
    requirement: Requirement,
    // Collections have no member to repeat, so a list of lists of itself
    // is caught here instead of by the path.
    open_collections: Vec<TypeKey>,
    /// Places the walk stopped on a loop.
    cuts: usize,
}

impl Checker<'_> {
    fn is_leaf(&self, ty: &'static TypeInfo) -> bool {
        if self.requirement.is_tracking() {
            is_tracking_leaf(self.settings, ty)
        } else {
            self.settings.is_leaf(ty)
        }
    }

    fn check_type(
        &mut self,
        ty: &'static TypeInfo,
        path: &MemberPath,
    ) -> Option<Arc<TypeErrors>> {
        if self.is_leaf(ty) {
            return None;
        }
        if let Some(None) = self.settings.cached_verdict(ty, self.requirement) {
            return None;
        }
        let cuts = self.cuts;
        let mut errors = Vec::new();
        if self.requirement.is_tracking() && !ty.notifies() {
            errors.push(if ty.is_collection() {
                TypeError::CollectionMustNotify { path: path.clone(), ty }
            } else {
                TypeError::TypeMustNotify { path: path.clone(), ty }
            });
        }

        match ty.kind() {
            TypeKind::Primitive(_) => {}
            TypeKind::Class(_) => {
                for member in self.settings.members(ty) {
                    if self.settings.is_ignoring_member(member) {
                        continue;
                    }
                    let member_path = path.with_member(member);
                    if member.is_indexer() {
                        errors.push(TypeError::UnsupportedIndexer { path: member_path, member });
                        continue;
                    }
                    let readonly = member.is_readonly().then_some(member);
                    self.check_edge(member.value_type(), &member_path, readonly, &mut errors);
                }
            }
            TypeKind::List(_) | TypeKind::Map(_) => {
                if self.open_collections.contains(&ty.key()) {
                    self.cuts += 1;
                } else {
                    let element = match ty.kind() {
                        TypeKind::List(list) => list.element(),
                        TypeKind::Map(map) => map.value(),
                        _ => unreachable!(),
                    };
                    self.open_collections.push(ty.key());
                    self.check_edge(element, &path.with_element(), None, &mut errors);
                    self.open_collections.pop();
                }
            }
        }

        if errors.is_empty() {
            if self.cuts == cuts {
                self.settings.store_verdict(ty, self.requirement, None);
            }
            None
        } else {
            Some(Arc::new(TypeErrors::new(ty, path.clone(), errors)))
        }
    }

    fn check_edge(
        &mut self,
        ty: &'static TypeInfo,
        path: &MemberPath,
        readonly: Option<&'static MemberInfo>,
        errors: &mut Vec<TypeError>,
    ) {
        if self.settings.is_ignoring_type(ty) || self.is_leaf(ty) {
            return;
        }
        match self.settings.reference_handling() {
            ReferenceHandling::References => {
                if let (Requirement::Copy, Some(member)) = (self.requirement, readonly) {
                    errors.push(TypeError::ReadonlyMemberReference { path: path.clone(), member });
                }
                return;
            }
            ReferenceHandling::Throw => {
                if path.has_loop() {
                    self.cuts += 1;
                    errors.push(TypeError::ReferenceLoop { path: path.clone() });
                    return;
                }
                errors.push(TypeError::RequiresReferenceHandling { path: path.clone(), ty });
            }
            ReferenceHandling::Structural => {
                if path.has_loop() {
                    self.cuts += 1;
                    return;
                }
                // Readonly members are copied into the target's existing instance.
                if self.requirement == Requirement::Copy
                    && readonly.is_none()
                    && !ty.has_constructor()
                {
                    errors.push(TypeError::CannotCreateInstance { path: path.clone(), ty });
                }
            }
        }
        if let Some(nested) = self.check_type(ty, path) {
            errors.push(TypeError::Nested(nested));
        }
    }
}
