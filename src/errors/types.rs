//! # Error Types
//!
//! Crate-level errors. Secret fetch failures keep their own type
//! ([`SecretsError`]) and are wrapped here when they cross into configuration or
//! middleware code.

use crate::secrets::SecretsError;

/// Custom result type for crate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Configuration loading errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation errors
    #[error("Validation error: {message}")]
    Validation { message: String, field: Option<String> },

    /// I/O errors with additional context
    #[error("I/O error: {context}")]
    Io {
        #[source]
        source: std::io::Error,
        context: String,
    },

    /// Secret fetch or parse failures surfaced under `throwOnFailedCall`
    #[error(transparent)]
    Secrets(#[from] SecretsError),
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), source: None }
    }

    /// Create a configuration error with source
    pub fn config_with_source<S: Into<String>>(
        message: S,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Config { message: message.into(), source: Some(source) }
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation { message: message.into(), field: None }
    }

    /// Create a validation error with field information
    pub fn validation_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::Validation { message: message.into(), field: Some(field.into()) }
    }

    /// Create an I/O error with context
    pub fn io<S: Into<String>>(source: std::io::Error, context: S) -> Self {
        Self::Io { source, context: context.into() }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::io(error, "I/O operation failed")
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields = errors.field_errors().into_iter().collect::<Vec<_>>();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        let message = fields
            .iter()
            .map(|(field, field_errors)| {
                let error_messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message.as_ref().map_or("Invalid value".to_string(), |m| m.to_string())
                    })
                    .collect();
                format!("{}: {}", field, error_messages.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ");

        match fields.as_slice() {
            [(field, _)] => {
                Self::validation_field(format!("Validation failed: {}", message), field.to_string())
            }
            _ => Self::validation(format!("Validation failed: {}", message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 1, message = "name cannot be empty"))]
        name: String,
    }

    #[test]
    fn test_config_error_display() {
        let err = Error::config("unsupported file extension");
        assert_eq!(err.to_string(), "Configuration error: unsupported file extension");
    }

    #[test]
    fn test_validation_errors_conversion() {
        let errors = Sample { name: String::new() }.validate().unwrap_err();
        let err = Error::from(errors);

        match err {
            Error::Validation { message, field } => {
                assert!(message.contains("name cannot be empty"));
                assert_eq!(field.as_deref(), Some("name"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_secrets_error_is_transparent() {
        let err = Error::from(SecretsError::provider("rds_login", "oops"));
        assert_eq!(err.to_string(), "Provider call failed for 'rds_login': oops");
    }
}
