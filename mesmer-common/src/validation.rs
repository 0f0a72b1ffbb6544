//! Configuration validation.
//!
//! A snapshot is validated before it is adopted; a failing snapshot is
//! rejected whole and the previously active one stays in place.

use thiserror::Error;

use crate::config::EngineConfig;

/// Configuration validation error.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Multiple validation errors: {0:?}")]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Trait for validatable configuration sections.
pub trait Validate {
    /// Validate this configuration section.
    fn validate(&self) -> ValidationResult<()>;
}

impl Validate for EngineConfig {
    fn validate(&self) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if self.duration_seconds == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "duration_seconds".into(),
                reason: "must be positive".into(),
            });
        }

        if self.max_concurrent == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "max_concurrent".into(),
                reason: "must be positive".into(),
            });
        }

        if self.sensitivity > 100 {
            errors.push(ValidationError::InvalidValue {
                field: "sensitivity".into(),
                reason: "must be between 0 and 100".into(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else if errors.len() == 1 {
            Err(errors.remove(0))
        } else {
            Err(ValidationError::Multiple(errors))
        }
    }
}
