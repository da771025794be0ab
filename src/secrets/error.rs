//! Error types for secret fetching and resolution.

use thiserror::Error;

/// Result type for secrets operations.
pub type Result<T> = std::result::Result<T, SecretsError>;

/// Errors raised while fetching or interpreting a secret.
///
/// Messages carry the remote identifier and the provider's reason, never the
/// secret value itself.
#[derive(Error, Debug)]
pub enum SecretsError {
    /// The secret store has no secret under this identifier.
    #[error("Secret not found: {identifier}")]
    NotFound { identifier: String },

    /// The remote fetch failed (network, permissions, throttling, ...).
    #[error("Provider call failed for '{identifier}': {message}")]
    Provider { identifier: String, message: String },

    /// The fetched payload could not be interpreted as a secret value.
    #[error("Invalid payload for secret '{identifier}': {reason}")]
    Parse { identifier: String, reason: String },
}

impl SecretsError {
    /// Create a not found error.
    pub fn not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound { identifier: identifier.into() }
    }

    /// Create a provider error.
    pub fn provider(identifier: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider { identifier: identifier.into(), message: message.into() }
    }

    /// Create a parse error.
    pub fn parse(identifier: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse { identifier: identifier.into(), reason: reason.into() }
    }

    /// Remote identifier the failure relates to.
    pub fn identifier(&self) -> &str {
        match self {
            Self::NotFound { identifier }
            | Self::Provider { identifier, .. }
            | Self::Parse { identifier, .. } => identifier,
        }
    }

    /// Short label used for log fields and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Provider { .. } => "provider",
            Self::Parse { .. } => "parse",
        }
    }
}
