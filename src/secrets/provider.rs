//! Secret provider capability and raw payload type.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use zeroize::Zeroize;

use super::error::Result;

/// Raw response from a secret store lookup.
///
/// Mirrors the usual "get secret value" response shape: a secret is either stored
/// as text or as binary, and a well-behaved store sets exactly one of them.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SecretPayload {
    pub text: Option<String>,
    pub binary: Option<Vec<u8>>,
}

impl SecretPayload {
    /// Payload carrying a text secret.
    pub fn text(value: impl Into<String>) -> Self {
        Self { text: Some(value.into()), binary: None }
    }

    /// Payload carrying a binary secret.
    pub fn binary(value: impl Into<Vec<u8>>) -> Self {
        Self { text: None, binary: Some(value.into()) }
    }

    /// Payload carrying a JSON document as text.
    pub fn json(value: &serde_json::Value) -> Self {
        Self::text(value.to_string())
    }

    /// A response with no secret content at all.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.binary.is_none()
    }
}

impl fmt::Debug for SecretPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretPayload")
            .field("text", &self.text.as_ref().map(|_| super::types::REDACTED))
            .field("binary_len", &self.binary.as_ref().map(Vec::len))
            .finish()
    }
}

impl Drop for SecretPayload {
    fn drop(&mut self) {
        self.text.zeroize();
        self.binary.zeroize();
    }
}

/// Capability that fetches one secret's current value from a remote store.
///
/// Implementations are owned by the host process and injected into the cache.
/// They must not log secret values and are responsible for bounding their own
/// network latency; the cache applies no timeout.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use secrets_cache::secrets::{Result, SecretPayload, SecretProvider, SecretsError};
///
/// struct StoreClient { /* sdk handle */ }
///
/// #[async_trait]
/// impl SecretProvider for StoreClient {
///     async fn fetch(&self, identifier: &str) -> Result<SecretPayload> {
///         let response = self.get_secret_value(identifier).await
///             .map_err(|e| SecretsError::provider(identifier, e.to_string()))?;
///         Ok(SecretPayload { text: response.secret_string, binary: response.secret_binary })
///     }
/// }
/// ```
#[async_trait]
pub trait SecretProvider: Send + Sync {
    /// Fetch the current payload for `identifier`.
    ///
    /// # Errors
    ///
    /// - [`SecretsError::NotFound`](super::SecretsError::NotFound) if no such secret exists
    /// - [`SecretsError::Provider`](super::SecretsError::Provider) for any other remote failure
    async fn fetch(&self, identifier: &str) -> Result<SecretPayload>;

    /// Short name used in log fields.
    fn provider_type(&self) -> &'static str {
        "custom"
    }
}

#[async_trait]
impl<T: SecretProvider + ?Sized> SecretProvider for Arc<T> {
    async fn fetch(&self, identifier: &str) -> Result<SecretPayload> {
        (**self).fetch(identifier).await
    }

    fn provider_type(&self) -> &'static str {
        (**self).provider_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_constructors() {
        assert_eq!(SecretPayload::text("abc").text.as_deref(), Some("abc"));
        assert_eq!(SecretPayload::binary(vec![1, 2]).binary, Some(vec![1, 2]));
        assert!(SecretPayload::empty().is_empty());
        assert!(!SecretPayload::text("").is_empty());
    }

    #[test]
    fn test_payload_debug_is_redacted() {
        let payload = SecretPayload::json(&serde_json::json!({ "Password": "hunter2" }));
        let debug = format!("{:?}", payload);

        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("hunter2"));
    }
}
