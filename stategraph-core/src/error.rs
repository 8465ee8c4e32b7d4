//! Error types
//!
//! Every fallible operation in the crate returns [`Result`]. The variants
//! follow the three failure families of the graph algorithms:
//!
//! - [`Error::Verification`] - a type cannot be processed under the given
//!   settings. Always raised before any traversal starts.
//! - [`Error::Comparison`] - the data encountered during a walk cannot be
//!   compared (for example a collection whose runtime shape does not match
//!   its declared kind).
//! - [`Error::CopyIntegrity`] - a readonly or immutable member still differs
//!   after a structural copy.
//!
//! The remaining variants come from the member-access layer.

use crate::verify::VerificationError;

/// The crate-wide error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Pre-flight verification of a type failed.
    #[error(transparent)]
    Verification(#[from] VerificationError),

    /// Two values could not be compared.
    #[error("comparison failed at {path}: {message}")]
    Comparison {
        /// Path of the member being compared.
        path: String,
        /// What went wrong.
        message: String,
    },

    /// A copy could not bring the target in line with the source.
    #[error("copy incomplete at {path}: {message}")]
    CopyIntegrity {
        /// Path of the member that still differs.
        path: String,
        /// What went wrong.
        message: String,
    },

    /// The named member does not exist on the type.
    #[error("type {type_name} has no member named '{member}'")]
    MemberNotFound {
        /// Name of the type that was searched.
        type_name: String,
        /// The requested member name.
        member: String,
    },

    /// Attempted to assign a readonly member after construction.
    #[error("member {type_name}.{member} is readonly")]
    ReadonlyMember {
        /// Declaring type.
        type_name: String,
        /// Member name.
        member: String,
    },

    /// A list index was outside the list.
    #[error("index {index} is out of range for a list of length {len}")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Current length of the list.
        len: usize,
    },

    /// A value does not conform to the declared type of its slot.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Declared type name.
        expected: String,
        /// Name of the value's type.
        actual: String,
    },

    /// A new instance was needed but the type has no default constructor.
    #[error("type {0} has no default constructor")]
    NoConstructor(String),

    /// A settings configuration file could not be parsed.
    #[error("invalid settings configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// A configured member reference is not of the form `Type.member`.
    #[error("invalid member reference '{0}', expected Type.member")]
    InvalidMemberReference(String),

    /// The tracker was used after disposal.
    #[error("tracker has been disposed")]
    Disposed,
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn comparison(path: impl ToString, message: impl Into<String>) -> Self {
        Self::Comparison {
            path: path.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn copy_integrity(path: impl ToString, message: impl Into<String>) -> Self {
        Self::CopyIntegrity {
            path: path.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn member_not_found(type_name: &str, member: &str) -> Self {
        Self::MemberNotFound {
            type_name: type_name.to_string(),
            member: member.to_string(),
        }
    }
}
