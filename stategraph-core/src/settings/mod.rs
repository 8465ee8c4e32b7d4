//! Member Settings
//!
//! A [`MemberSettings`] decides which members take part in an operation and
//! how references are treated while walking a graph. Settings are canonical:
//! every configuration tuple ([`SettingsKey`]) maps to exactly one shared
//! instance, so later cache lookups (verification verdicts, immutability
//! verdicts) can rely on reference identity of the settings object.
//!
//! # Caches
//!
//! Three process-wide, append-only caches live here:
//!
//! - the canonical instances, keyed by `SettingsKey`;
//! - per settings, the immutability verdict of each type;
//! - per settings, the verification verdict of each `(type, requirement)`.
//!
//! All of them are "compute or fetch" maps. Two threads racing on the same
//! key compute the same value; the first insert wins and later readers see
//! that instance.

mod config;

pub use config::{MemberSelection, SettingsConfig};

use std::collections::{BTreeSet, HashSet};
use std::sync::{Arc, OnceLock};

use bitflags::bitflags;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::reflect::{MemberInfo, MemberKind, TypeInfo, TypeKey, TypeKind, Visibility};
use crate::verify::{Requirement, TypeErrors};

/// How the walker treats a reference-typed member or collection element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceHandling {
    /// Any mutable reference member is a verification error.
    Throw,
    /// Reference members are compared and copied by identity.
    References,
    /// Reference members are walked recursively.
    #[default]
    Structural,
}

bitflags! {
    /// Which members the member enumerator yields.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    pub struct BindingFlags: u8 {
        /// Include properties.
        const PROPERTIES = 0b0000_0001;
        /// Include fields.
        const FIELDS = 0b0000_0010;
        /// Include public members.
        const PUBLIC = 0b0000_0100;
        /// Include non-public members.
        const NON_PUBLIC = 0b0000_1000;
        /// Skip members inherited from base classes.
        const DECLARED_ONLY = 0b0001_0000;
    }
}

impl BindingFlags {
    /// Public properties, including inherited ones.
    pub fn default_properties() -> Self {
        Self::PROPERTIES | Self::PUBLIC
    }

    /// All fields, including inherited ones.
    pub fn default_fields() -> Self {
        Self::FIELDS | Self::PUBLIC | Self::NON_PUBLIC
    }

    fn admits(&self, member: &MemberInfo) -> bool {
        let kind = match member.kind() {
            MemberKind::Property => Self::PROPERTIES,
            MemberKind::Field => Self::FIELDS,
        };
        let visibility = match member.visibility() {
            Visibility::Public => Self::PUBLIC,
            Visibility::NonPublic => Self::NON_PUBLIC,
        };
        self.contains(kind | visibility)
    }
}

/// A member addressed by declaring type name and member name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemberKey {
    /// Declaring type name.
    pub type_name: String,
    /// Member name.
    pub member: String,
}

impl MemberKey {
    /// Create a member key.
    pub fn new(type_name: impl Into<String>, member: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            member: member.into(),
        }
    }

    /// The key of a described member.
    pub fn of(member: &MemberInfo) -> Self {
        Self::new(member.declaring_type(), member.name())
    }
}

/// The configuration tuple identifying a canonical settings instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SettingsKey {
    /// Member enumeration flags.
    pub flags: BindingFlags,
    /// Reference handling policy.
    pub reference_handling: ReferenceHandling,
    /// Members excluded from every operation.
    pub ignored_members: BTreeSet<MemberKey>,
    /// Types whose members (of that type) are excluded.
    pub ignored_types: BTreeSet<String>,
    /// Types treated as immutable leaves.
    pub immutable_types: BTreeSet<String>,
}

impl SettingsKey {
    /// A key with no ignore lists.
    pub fn new(flags: BindingFlags, reference_handling: ReferenceHandling) -> Self {
        Self {
            flags,
            reference_handling,
            ignored_members: BTreeSet::new(),
            ignored_types: BTreeSet::new(),
            immutable_types: BTreeSet::new(),
        }
    }
}

type VerifyKey = (TypeKey, Requirement);

/// Canonical, immutable settings plus their verdict caches.
pub struct MemberSettings {
    key: SettingsKey,
    immutable: DashMap<TypeKey, bool>,
    verified: DashMap<VerifyKey, Option<Arc<TypeErrors>>>,
}

static SETTINGS: OnceLock<DashMap<SettingsKey, Arc<MemberSettings>>> = OnceLock::new();

fn canonical_settings() -> &'static DashMap<SettingsKey, Arc<MemberSettings>> {
    SETTINGS.get_or_init(DashMap::new)
}

impl MemberSettings {
    /// Return the canonical instance for `key`, creating it on first use.
    pub fn get_or_create(key: SettingsKey) -> Arc<Self> {
        let cache = canonical_settings();
        if let Some(existing) = cache.get(&key) {
            return Arc::clone(existing.value());
        }
        let entry = cache.entry(key.clone()).or_insert_with(|| {
            debug!(
                reference_handling = ?key.reference_handling,
                flags = ?key.flags,
                "creating member settings"
            );
            Arc::new(Self {
                key,
                immutable: DashMap::new(),
                verified: DashMap::new(),
            })
        });
        Arc::clone(entry.value())
    }

    /// Public properties with the given reference handling.
    pub fn properties(reference_handling: ReferenceHandling) -> Arc<Self> {
        Self::get_or_create(SettingsKey::new(
            BindingFlags::default_properties(),
            reference_handling,
        ))
    }

    /// All fields with the given reference handling.
    pub fn fields(reference_handling: ReferenceHandling) -> Arc<Self> {
        Self::get_or_create(SettingsKey::new(
            BindingFlags::default_fields(),
            reference_handling,
        ))
    }

    /// Start building settings with ignore lists.
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder {
            key: SettingsKey::new(BindingFlags::default_properties(), ReferenceHandling::default()),
        }
    }

    /// The configuration tuple.
    pub fn key(&self) -> &SettingsKey {
        &self.key
    }

    /// The reference handling policy.
    pub fn reference_handling(&self) -> ReferenceHandling {
        self.key.reference_handling
    }

    /// The member enumeration flags.
    pub fn binding_flags(&self) -> BindingFlags {
        self.key.flags
    }

    /// Members of `ty` admitted by the binding flags, base members first.
    ///
    /// Ignored members are still included; callers check
    /// [`is_ignoring_member`](Self::is_ignoring_member).
    pub fn members(&self, ty: &'static TypeInfo) -> Vec<&'static MemberInfo> {
        let declared_only = self.key.flags.contains(BindingFlags::DECLARED_ONLY);
        let candidates: Vec<&'static MemberInfo> = if declared_only {
            ty.as_class()
                .map(|c| c.declared_members().iter().collect())
                .unwrap_or_default()
        } else {
            ty.all_members()
        };
        candidates
            .into_iter()
            .filter(|m| self.key.flags.admits(m))
            .collect()
    }

    /// True if the member is excluded, directly or through its type.
    pub fn is_ignoring_member(&self, member: &MemberInfo) -> bool {
        self.key.ignored_members.contains(&MemberKey::of(member))
            || self.is_ignoring_type(member.value_type())
    }

    /// True if members of this type are excluded.
    pub fn is_ignoring_type(&self, ty: &TypeInfo) -> bool {
        self.key.ignored_types.contains(ty.name())
    }

    /// True if instances of `ty` never change observable state.
    ///
    /// Primitives, types configured or declared immutable, and classes whose
    /// members are all readonly and of immutable types. A class that reaches
    /// itself through its members is not immutable.
    pub fn is_immutable(&self, ty: &'static TypeInfo) -> bool {
        if let Some(cached) = self.immutable.get(&ty.key()) {
            return *cached;
        }
        let mut visiting = HashSet::new();
        self.compute_immutable(ty, &mut visiting)
    }

    fn compute_immutable(&self, ty: &'static TypeInfo, visiting: &mut HashSet<TypeKey>) -> bool {
        if let Some(cached) = self.immutable.get(&ty.key()) {
            return *cached;
        }
        if !visiting.insert(ty.key()) {
            return false;
        }
        let verdict = if self.key.immutable_types.contains(ty.name()) {
            true
        } else {
            match ty.kind() {
                TypeKind::Primitive(_) => true,
                TypeKind::List(_) | TypeKind::Map(_) => false,
                TypeKind::Class(class) => {
                    class.is_immutable()
                        || ty.all_members().into_iter().all(|m| {
                            m.is_readonly() && self.compute_immutable(m.value_type(), visiting)
                        })
                }
            }
        };
        visiting.remove(&ty.key());
        *self.immutable.entry(ty.key()).or_insert(verdict)
    }

    /// True if instances of `ty` are compared with their own value equality.
    pub fn is_equatable(&self, ty: &TypeInfo) -> bool {
        match ty.kind() {
            TypeKind::Primitive(_) => true,
            TypeKind::Class(class) => class.is_equatable(),
            _ => false,
        }
    }

    /// True if the walker treats `ty` as a leaf under these settings.
    pub fn is_leaf(&self, ty: &'static TypeInfo) -> bool {
        self.is_equatable(ty) || self.is_immutable(ty)
    }

    pub(crate) fn cached_verdict(
        &self,
        ty: &TypeInfo,
        requirement: Requirement,
    ) -> Option<Option<Arc<TypeErrors>>> {
        self.verified
            .get(&(ty.key(), requirement))
            .map(|v| v.value().clone())
    }

    /// Store a verdict unless one is already present; returns the stored one.
    pub(crate) fn store_verdict(
        &self,
        ty: &TypeInfo,
        requirement: Requirement,
        verdict: Option<Arc<TypeErrors>>,
    ) -> Option<Arc<TypeErrors>> {
        self.verified
            .entry((ty.key(), requirement))
            .or_insert(verdict)
            .value()
            .clone()
    }
}

impl std::fmt::Debug for MemberSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemberSettings")
            .field("key", &self.key)
            .field("verified", &self.verified.len())
            .finish()
    }
}

/// Builder producing canonical settings.
#[derive(Debug, Clone)]
pub struct SettingsBuilder {
    key: SettingsKey,
}

impl SettingsBuilder {
    /// Set the reference handling policy.
    pub fn reference_handling(mut self, handling: ReferenceHandling) -> Self {
        self.key.reference_handling = handling;
        self
    }

    /// Set the member enumeration flags.
    pub fn binding_flags(mut self, flags: BindingFlags) -> Self {
        self.key.flags = flags;
        self
    }

    /// Exclude `Type.member`.
    pub fn ignore_member(mut self, type_name: &str, member: &str) -> Self {
        self.key.ignored_members.insert(MemberKey::new(type_name, member));
        self
    }

    /// Exclude every member whose type is `type_name`.
    pub fn ignore_type(mut self, type_name: &str) -> Self {
        self.key.ignored_types.insert(type_name.to_string());
        self
    }

    /// Treat `type_name` as an immutable leaf.
    pub fn treat_as_immutable(mut self, type_name: &str) -> Self {
        self.key.immutable_types.insert(type_name.to_string());
        self
    }

    /// Return the canonical instance for the configured tuple.
    pub fn build(self) -> Arc<MemberSettings> {
        MemberSettings::get_or_create(self.key)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::types;
    use crate::test_types::{
        derived_item, frozen_pair, immutable_loop, pair, parent, point, with_private,
    };

    #[test]
    fn equal_tuples_share_one_instance() {
        let a = MemberSettings::properties(ReferenceHandling::Structural);
        let b = MemberSettings::properties(ReferenceHandling::Structural);
        assert!(Arc::ptr_eq(&a, &b));

        let c = MemberSettings::properties(ReferenceHandling::References);
        assert!(!Arc::ptr_eq(&a, &c));

        let d = MemberSettings::builder()
            .reference_handling(ReferenceHandling::Structural)
            .ignore_member("Pair", "name")
            .build();
        let e = MemberSettings::builder()
            .ignore_member("Pair", "name")
            .reference_handling(ReferenceHandling::Structural)
            .build();
        assert!(Arc::ptr_eq(&d, &e));
        assert!(!Arc::ptr_eq(&a, &d));
    }

    #[test]
    fn members_follow_binding_flags() {
        let props = MemberSettings::properties(ReferenceHandling::Structural);
        let names: Vec<_> = props.members(with_private()).iter().map(|m| m.name()).collect();
        assert_eq!(names, ["visible"]);

        let fields = MemberSettings::fields(ReferenceHandling::Structural);
        let names: Vec<_> = fields.members(with_private()).iter().map(|m| m.name()).collect();
        assert_eq!(names, ["hidden"]);

        let declared = MemberSettings::builder()
            .binding_flags(BindingFlags::default_properties() | BindingFlags::DECLARED_ONLY)
            .build();
        let names: Vec<_> = declared.members(derived_item()).iter().map(|m| m.name()).collect();
        assert_eq!(names, ["extra"]);
    }

    #[test]
    fn ignoring_members_and_types() {
        let settings = MemberSettings::builder()
            .ignore_member("Pair", "name")
            .ignore_type("Child")
            .build();
        assert!(settings.is_ignoring_member(pair().member("name").unwrap()));
        assert!(!settings.is_ignoring_member(pair().member("value").unwrap()));
        assert!(settings.is_ignoring_member(parent().member("child").unwrap()));
    }

    #[test]
    fn immutability_verdicts() {
        let settings = MemberSettings::properties(ReferenceHandling::Structural);
        assert!(settings.is_immutable(types::string()));
        assert!(settings.is_immutable(frozen_pair()));
        assert!(!settings.is_immutable(pair()));
        assert!(!settings.is_immutable(immutable_loop()));

        let configured = MemberSettings::builder().treat_as_immutable("Pair").build();
        assert!(configured.is_immutable(pair()));
    }

    #[test]
    fn equatable_types() {
        let settings = MemberSettings::properties(ReferenceHandling::Structural);
        assert!(settings.is_equatable(types::int()));
        assert!(settings.is_equatable(point()));
        assert!(!settings.is_equatable(pair()));
    }
}
