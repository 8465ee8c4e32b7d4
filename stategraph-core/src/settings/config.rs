//! Settings configuration files.
//!
//! A JSON document describing one settings tuple, for applications that keep
//! their comparison policy next to the rest of their configuration:
//!
//! ```json
//! {
//!   "members": "properties",
//!   "reference_handling": "structural",
//!   "ignored_members": ["Order.last_modified"],
//!   "ignored_types": ["Cache"],
//!   "immutable_types": ["Money"]
//! }
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{BindingFlags, MemberKey, MemberSettings, ReferenceHandling, SettingsKey};
use crate::{Error, Result};

/// Which member kind the settings enumerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberSelection {
    /// Public properties (plus non-public ones with `include_non_public`).
    #[default]
    Properties,
    /// All fields.
    Fields,
}

/// Serializable description of a settings tuple.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsConfig {
    /// Properties or fields.
    pub members: MemberSelection,
    /// Also enumerate non-public properties.
    pub include_non_public: bool,
    /// Skip inherited members.
    pub declared_only: bool,
    /// Reference handling policy.
    pub reference_handling: ReferenceHandling,
    /// Members to ignore, as `Type.member`.
    pub ignored_members: Vec<String>,
    /// Type names whose members are ignored.
    pub ignored_types: Vec<String>,
    /// Type names treated as immutable.
    pub immutable_types: Vec<String>,
}

impl SettingsConfig {
    /// Parse a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// The binding flags this configuration selects.
    pub fn binding_flags(&self) -> BindingFlags {
        let mut flags = match self.members {
            MemberSelection::Properties => BindingFlags::default_properties(),
            MemberSelection::Fields => BindingFlags::default_fields(),
        };
        if self.include_non_public {
            flags |= BindingFlags::NON_PUBLIC;
        }
        if self.declared_only {
            flags |= BindingFlags::DECLARED_ONLY;
        }
        flags
    }

    /// The canonical settings key for this configuration.
    pub fn to_key(&self) -> Result<SettingsKey> {
        let mut key = SettingsKey::new(self.binding_flags(), self.reference_handling);
        for reference in &self.ignored_members {
            let (type_name, member) = reference
                .rsplit_once('.')
                .filter(|(t, m)| !t.is_empty() && !m.is_empty())
                .ok_or_else(|| Error::InvalidMemberReference(reference.clone()))?;
            key.ignored_members.insert(MemberKey::new(type_name, member));
        }
        key.ignored_types.extend(self.ignored_types.iter().cloned());
        key.immutable_types.extend(self.immutable_types.iter().cloned());
        Ok(key)
    }
}

impl MemberSettings {
    /// Canonical settings for a parsed configuration.
    pub fn from_config(config: &SettingsConfig) -> Result<Arc<Self>> {
        Ok(Self::get_or_create(config.to_key()?))
    }
}
