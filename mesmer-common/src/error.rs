//! Error types for the Mesmer workspace.

use thiserror::Error;

use crate::validation::ValidationError;

/// Result type alias using the Mesmer error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for Mesmer operations.
///
/// Trigger denials (cooldown, capacity, authorization) are not errors — they
/// are ordinary outcomes of message evaluation and live in the engine's
/// outcome enum. This type carries the cases that genuinely fail.
#[derive(Error, Debug)]
pub enum Error {
    /// Rejected configuration snapshot; the previous snapshot stays active
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    /// Admin operation targeting an absent identity or user
    #[error("Not found: {0}")]
    NotFound(String),

    /// The external configuration collaborator failed to persist a change
    #[error("Persistence error: {0}")]
    Persist(String),

    /// IO error (configuration loading)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Check if this is a configuration rejection.
    pub const fn is_config_invalid(&self) -> bool {
        matches!(self, Self::ConfigInvalid(_))
    }

    /// Check if this is a not-found no-op.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<ValidationError> for Error {
    fn from(err: ValidationError) -> Self {
        Self::ConfigInvalid(err.to_string())
    }
}
