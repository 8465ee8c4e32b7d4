//! Verification Engine
//!
//! Before any graph is walked, the type is checked against the settings.
//! Verification runs over the *type* graph, never over instances, and reports
//! every problem it finds with the path that leads to it:
//!
//! ```text
//! Equal of Parent is not supported with ReferenceHandling::Throw (3 errors):
//!   Parent.child: the type Child is a mutable reference type ...
//!   Parent.child.parent: the type Parent is a mutable reference type ...
//!   Parent.child.parent.child: the type graph loops back on itself
//! Solve the problem by any of:
//!   - ignore the member Child.parent
//!   ...
//! ```
//!
//! # Caching
//!
//! Verdicts are cached per settings instance and `(type, requirement)`, so
//! verifying the same type twice never walks it again and returns the very
//! same [`TypeErrors`] allocation. Because settings are canonical, equal
//! configurations share one cache.

mod checker;
mod errors;
mod report;

pub use errors::{TypeError, TypeErrors};
pub use report::{Suggestion, VerificationError};

pub(crate) use checker::is_tracking_leaf;

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::reflect::TypeInfo;
use crate::settings::MemberSettings;
use crate::Result;

/// The operation a type is verified for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Requirement {
    /// Structural equality.
    Equal,
    /// Structural copy.
    Copy,
    /// Live comparison of two graphs.
    TrackDirty,
    /// Live observation of one graph.
    TrackChanges,
}

impl Requirement {
    /// The trackers need change notifications from every walked type.
    pub fn is_tracking(self) -> bool {
        matches!(self, Self::TrackDirty | Self::TrackChanges)
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Equal => "Equal",
            Self::Copy => "Copy",
            Self::TrackDirty => "Dirty tracking",
            Self::TrackChanges => "Change tracking",
        })
    }
}

/// Verify `ty` for `requirement`, returning the cached error set if any.
pub fn verify(
    ty: &'static TypeInfo,
    settings: &MemberSettings,
    requirement: Requirement,
) -> Option<Arc<TypeErrors>> {
    if let Some(verdict) = settings.cached_verdict(ty, requirement) {
        return verdict;
    }
    debug!(type_name = ty.name(), %requirement, "verifying type");
    let verdict = checker::check(ty, settings, requirement);
    if let Some(errors) = &verdict {
        debug!(
            type_name = ty.name(),
            %requirement,
            errors = errors.len(),
            "type failed verification"
        );
    }
    settings.store_verdict(ty, requirement, verdict)
}

fn verify_can(
    ty: &'static TypeInfo,
    settings: &MemberSettings,
    requirement: Requirement,
) -> Result<()> {
    match verify(ty, settings, requirement) {
        None => Ok(()),
        Some(errors) => {
            Err(VerificationError::new(requirement, settings.reference_handling(), errors).into())
        }
    }
}

/// Check that instances of `ty` can be compared with [`equal`](crate::equal).
pub fn verify_can_equal(ty: &'static TypeInfo, settings: &MemberSettings) -> Result<()> {
    verify_can(ty, settings, Requirement::Equal)
}

/// Check that instances of `ty` can be copied with [`copy`](crate::copy).
pub fn verify_can_copy(ty: &'static TypeInfo, settings: &MemberSettings) -> Result<()> {
    verify_can(ty, settings, Requirement::Copy)
}

/// Check that instances of `ty` can be tracked by a [`DirtyTracker`](crate::DirtyTracker).
pub fn verify_can_track_dirty(ty: &'static TypeInfo, settings: &MemberSettings) -> Result<()> {
    verify_can(ty, settings, Requirement::TrackDirty)
}

/// Check that instances of `ty` can be tracked by a [`ChangeTracker`](crate::ChangeTracker).
pub fn verify_can_track_changes(ty: &'static TypeInfo, settings: &MemberSettings) -> Result<()> {
    verify_can(ty, settings, Requirement::TrackChanges)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::ReferenceHandling;
    use crate::test_types::{
        child, holder, no_ctor, pair, pair_list, parent, parent_list, point, readonly_holder,
        silent_holder, silent_list_holder, with_indexer,
    };
    use crate::Error;

    fn errors_of(result: Result<()>) -> Arc<TypeErrors> {
        match result {
            Err(Error::Verification(err)) => err.errors().clone(),
            other => panic!("expected a verification error, got {other:?}"),
        }
    }

    #[test]
    fn leaf_classes_pass_everything() {
        for handling in [
            ReferenceHandling::Throw,
            ReferenceHandling::References,
            ReferenceHandling::Structural,
        ] {
            let settings = MemberSettings::properties(handling);
            assert!(verify_can_equal(pair(), &settings).is_ok());
            assert!(verify_can_copy(pair(), &settings).is_ok());
            assert!(verify_can_track_dirty(pair(), &settings).is_ok());
            assert!(verify_can_track_changes(point(), &settings).is_ok());
        }
    }

    #[test]
    fn structural_accepts_cyclic_types() {
        let settings = MemberSettings::properties(ReferenceHandling::Structural);
        assert!(verify_can_equal(parent(), &settings).is_ok());
        assert!(verify_can_copy(parent(), &settings).is_ok());
        assert!(verify_can_track_dirty(parent(), &settings).is_ok());
        assert!(verify_can_track_changes(parent_list(), &settings).is_ok());
    }

    #[test]
    fn throw_reports_every_reference_member_and_the_loop() {
        let settings = MemberSettings::properties(ReferenceHandling::Throw);
        let errors = errors_of(verify_can_equal(parent(), &settings));
        let paths: Vec<_> = errors.all_errors().iter().map(|e| e.path().to_string()).collect();
        assert_eq!(
            paths,
            ["Parent.child", "Parent.child.parent", "Parent.child.parent.child"]
        );
        assert!(matches!(errors.all_errors()[2], TypeError::ReferenceLoop { .. }));
    }

    #[test]
    fn references_never_recurse() {
        let settings = MemberSettings::properties(ReferenceHandling::References);
        assert!(verify_can_equal(parent(), &settings).is_ok());
        assert!(verify_can_track_dirty(silent_holder(), &settings).is_ok());
    }

    #[test]
    fn copy_by_reference_into_readonly_member_fails() {
        let settings = MemberSettings::properties(ReferenceHandling::References);
        let errors = errors_of(verify_can_copy(readonly_holder(), &settings));
        assert!(matches!(
            errors.all_errors()[0],
            TypeError::ReadonlyMemberReference { .. }
        ));

        let structural = MemberSettings::properties(ReferenceHandling::Structural);
        assert!(verify_can_copy(readonly_holder(), &structural).is_ok());
    }

    #[test]
    fn structural_copy_needs_constructors() {
        let settings = MemberSettings::properties(ReferenceHandling::Structural);
        assert!(verify_can_equal(holder(), &settings).is_ok());

        let errors = errors_of(verify_can_copy(holder(), &settings));
        match &errors.all_errors()[0] {
            TypeError::CannotCreateInstance { path, ty } => {
                assert_eq!(path.to_string(), "Holder.inner");
                assert_eq!(ty.name(), "NoCtor");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn indexers_must_be_ignored() {
        let settings = MemberSettings::properties(ReferenceHandling::Structural);
        let errors = errors_of(verify_can_equal(with_indexer(), &settings));
        assert!(matches!(errors.all_errors()[0], TypeError::UnsupportedIndexer { .. }));

        let ignoring = MemberSettings::builder()
            .ignore_member("WithIndexer", "item")
            .build();
        assert!(verify_can_equal(with_indexer(), &ignoring).is_ok());
    }

    #[test]
    fn tracking_requires_notifications() {
        let settings = MemberSettings::properties(ReferenceHandling::Structural);
        assert!(verify_can_equal(silent_holder(), &settings).is_ok());

        let errors = errors_of(verify_can_track_changes(silent_holder(), &settings));
        assert!(matches!(errors.all_errors()[0], TypeError::TypeMustNotify { .. }));

        let errors = errors_of(verify_can_track_dirty(silent_list_holder(), &settings));
        assert!(matches!(errors.all_errors()[0], TypeError::CollectionMustNotify { .. }));
    }

    #[test]
    fn nested_passes_are_cached_for_the_nested_type() {
        let settings = MemberSettings::builder()
            .reference_handling(ReferenceHandling::Structural)
            .ignore_type("NestedVerdictsOnly")
            .build();
        assert!(settings.cached_verdict(pair(), Requirement::Equal).is_none());
        assert!(verify(pair_list(), &settings, Requirement::Equal).is_none());
        assert!(verify(holder(), &settings, Requirement::Equal).is_none());
        assert!(matches!(settings.cached_verdict(pair(), Requirement::Equal), Some(None)));
        assert!(matches!(settings.cached_verdict(no_ctor(), Requirement::Equal), Some(None)));
        assert!(settings.cached_verdict(pair(), Requirement::Copy).is_none());

        // Walks below Parent stop on the loop back, so nothing nested is kept.
        assert!(verify(parent_list(), &settings, Requirement::Equal).is_none());
        assert!(settings.cached_verdict(parent(), Requirement::Equal).is_none());
        assert!(settings.cached_verdict(child(), Requirement::Equal).is_none());
    }

    #[test]
    fn verdicts_are_cached_instances() {
        let settings = MemberSettings::properties(ReferenceHandling::Throw);
        let first = verify(parent(), &settings, Requirement::TrackDirty).unwrap();
        let second = verify(parent(), &settings, Requirement::TrackDirty).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let a = errors_of(verify_can_track_dirty(parent(), &settings));
        assert!(Arc::ptr_eq(&a, &first));
    }
}
