//! Unified error type definition

use serde::Serialize;
use thiserror::Error;

// Re-export probe error type
pub use domain_verifier_probe::ProbeError;

/// Why a save was rejected by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ConflictKind {
    /// The record was modified since it was read (version mismatch).
    StaleVersion,
    /// Another record already holds this domain in status `active`.
    ActiveDomainTaken,
}

/// Core layer error type
#[derive(Error, Debug, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum CoreError {
    /// Missing or malformed argument
    #[error("Invalid option '{option}': {kind}")]
    InvalidOption { option: String, kind: String },

    /// Lookup miss
    #[error("{resource} not found: {id}")]
    NotFound { resource: String, id: String },

    /// Domain format or record schema violation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Concurrent modification or active-domain uniqueness violation
    #[error("Conflict ({kind:?}): {detail}")]
    Conflict { kind: ConflictKind, detail: String },

    /// DNS probe could not obtain an answer
    #[error("{0}")]
    Probe(#[from] ProbeError),

    /// Storage layer error
    #[error("Storage error: {0}")]
    StorageError(String),

    /// serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Invalid configuration (fatal at startup)
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl CoreError {
    pub fn invalid_option(option: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::InvalidOption {
            option: option.into(),
            kind: kind.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    pub fn conflict(kind: ConflictKind, detail: impl Into<String>) -> Self {
        Self::Conflict {
            kind,
            detail: detail.into(),
        }
    }

    /// Whether this is a stale-version conflict (reload and retry).
    #[must_use]
    pub fn is_stale_version(&self) -> bool {
        matches!(
            self,
            Self::Conflict {
                kind: ConflictKind::StaleVersion,
                ..
            }
        )
    }

    /// Whether it is expected behavior (user input, resource does not exist, transient DNS trouble, etc.) is used for log classification.
    ///
    /// Level `warn` should be used when returning `true` and level `error` when returning `false`.
    /// **Please update this method simultaneously when new variants are added. **
    #[must_use]
    pub fn is_expected(&self) -> bool {
        match self {
            Self::InvalidOption { .. }
            | Self::NotFound { .. }
            | Self::ValidationError(_)
            | Self::Conflict { .. } => true,
            Self::Probe(e) => e.is_transient(),
            Self::StorageError(_) | Self::SerializationError(_) | Self::ConfigError(_) => false,
        }
    }
}

/// Core layer Result type alias
pub type CoreResult<T> = std::result::Result<T, CoreError>;
