use thiserror::Error;

use crate::config::error::ConfigError;
use crate::jobs::JobError;

/// Application-wide error type that represents all possible errors in the system.
///
/// Job implementations return this from their bodies and constructors, so it
/// carries both structured variants and an `anyhow` escape hatch for
/// unexpected failures.
#[derive(Error, Debug)]
pub enum AppError {
    /// Validation error with field-specific details
    #[error("Validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Configuration error with key information
    #[error("Configuration error: {key}")]
    Configuration {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// Failure raised by the scheduling core
    #[error(transparent)]
    Job(#[from] JobError),

    /// Internal error for unexpected failures
    #[error("Internal error")]
    Internal {
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal { source: error }
    }
}

impl From<ConfigError> for AppError {
    fn from(error: ConfigError) -> Self {
        let key = match &error {
            ConfigError::ValidationError { field, .. } => field.clone(),
            _ => "config".to_string(),
        };
        AppError::Configuration {
            key,
            source: anyhow::Error::from(error),
        }
    }
}

/// Type alias for Result with AppError to simplify function signatures
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_internal_error_keeps_source() {
        let err = AppError::from(anyhow::anyhow!("disk on fire"));
        assert_eq!(err.to_string(), "Internal error");
        assert_eq!(err.source().map(|s| s.to_string()), Some("disk on fire".to_string()));
    }

    #[test]
    fn test_config_validation_maps_field_to_key() {
        let err = AppError::from(ConfigError::validation("scheduler.standard_lane", "bad"));
        match err {
            AppError::Configuration { key, .. } => assert_eq!(key, "scheduler.standard_lane"),
            other => panic!("Expected Configuration error, got {other:?}"),
        }
    }

    #[test]
    fn test_job_error_is_transparent() {
        let err = AppError::from(JobError::InvalidInterval("ticker".to_string()));
        assert_eq!(
            err.to_string(),
            JobError::InvalidInterval("ticker".to_string()).to_string()
        );
    }
}
