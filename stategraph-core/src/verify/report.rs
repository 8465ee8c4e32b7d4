//! The error raised by the `verify_can_*` functions.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use super::{Requirement, TypeError, TypeErrors};
use crate::path::{MemberPath, PathItem};
use crate::reflect::MemberInfo;
use crate::settings::ReferenceHandling;

/// A way to make a failing type pass verification.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Suggestion {
    /// Add `Type.member` to the ignored members.
    IgnoreMember(String),
    /// Add the type to the ignored types.
    IgnoreType(String),
    /// Switch to another reference handling.
    UseReferenceHandling(ReferenceHandling),
}

impl fmt::Display for Suggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IgnoreMember(member) => write!(f, "ignore the member {member}"),
            Self::IgnoreType(ty) => write!(f, "ignore the type {ty}"),
            Self::UseReferenceHandling(handling) => {
                write!(f, "use ReferenceHandling::{handling:?}")
            }
        }
    }
}

/// A type failed pre-flight verification.
#[derive(Debug, Clone)]
pub struct VerificationError {
    requirement: Requirement,
    reference_handling: ReferenceHandling,
    errors: Arc<TypeErrors>,
}

impl VerificationError {
    pub(crate) fn new(
        requirement: Requirement,
        reference_handling: ReferenceHandling,
        errors: Arc<TypeErrors>,
    ) -> Self {
        Self {
            requirement,
            reference_handling,
            errors,
        }
    }

    /// The operation that was verified.
    pub fn requirement(&self) -> Requirement {
        self.requirement
    }

    /// The cached error set of the root type.
    pub fn errors(&self) -> &Arc<TypeErrors> {
        &self.errors
    }

    /// Remediations, deduplicated and sorted.
    pub fn suggestions(&self) -> Vec<Suggestion> {
        let mut out = BTreeSet::new();
        for error in self.errors.all_errors() {
            self.suggest(error, &mut out);
        }
        out.into_iter().collect()
    }

    fn suggest(&self, error: &TypeError, out: &mut BTreeSet<Suggestion>) {
        let mut handlings: Vec<ReferenceHandling> = Vec::new();
        let mut ignore_type = None;
        match error {
            TypeError::RequiresReferenceHandling { ty, .. } => {
                handlings.extend([ReferenceHandling::Structural, ReferenceHandling::References]);
                ignore_type = Some(ty.name());
            }
            TypeError::CannotCreateInstance { ty, .. } => {
                handlings.push(ReferenceHandling::References);
                ignore_type = Some(ty.name());
            }
            TypeError::TypeMustNotify { ty, .. } | TypeError::CollectionMustNotify { ty, .. } => {
                handlings.push(ReferenceHandling::References);
                ignore_type = Some(ty.name());
            }
            TypeError::ReadonlyMemberReference { .. } => {
                handlings.push(ReferenceHandling::Structural);
            }
            TypeError::ReferenceLoop { .. } => {
                handlings.extend([ReferenceHandling::Structural, ReferenceHandling::References]);
            }
            TypeError::UnsupportedIndexer { .. } | TypeError::Nested(_) => {}
        }
        for h in handlings {
            if h != self.reference_handling {
                out.insert(Suggestion::UseReferenceHandling(h));
            }
        }
        if let Some(member) = nearest_member(error.path()) {
            out.insert(Suggestion::IgnoreMember(member.to_string()));
        }
        if let Some(ty) = ignore_type {
            out.insert(Suggestion::IgnoreType(ty.to_string()));
        }
    }
}

fn nearest_member(path: &MemberPath) -> Option<&'static MemberInfo> {
    let mut current = Some(path);
    while let Some(p) = current {
        if let PathItem::Member(member) = p.last() {
            return Some(*member);
        }
        current = p.parent();
    }
    None
}

impl fmt::Display for VerificationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let errors = self.errors.all_errors();
        writeln!(
            f,
            "{} of {} is not supported with ReferenceHandling::{:?} ({} error{}):",
            self.requirement,
            self.errors.type_info(),
            self.reference_handling,
            errors.len(),
            if errors.len() == 1 { "" } else { "s" },
        )?;
        for error in errors {
            writeln!(f, "  {error}")?;
        }
        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            writeln!(f, "Solve the problem by any of:")?;
            for suggestion in suggestions {
                writeln!(f, "  - {suggestion}")?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for VerificationError {}
