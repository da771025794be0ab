//! Environment variable secret provider.
//!
//! Intended for **development and local runs only**. Environment variables are
//! visible in process listings, have no access control and cannot be rotated
//! remotely. Use a real secret store client in production.
//!
//! # Usage
//!
//! A remote identifier is mapped to `SECRETS_CACHE_SECRET_<IDENTIFIER>`, upper-cased
//! with every non-alphanumeric character replaced by `_`:
//!
//! ```bash
//! export SECRETS_CACHE_SECRET_RDS_LOGIN='{"Username":"svc","Password":"hunter2"}'
//! export SECRETS_CACHE_SECRET_PROD_API_KEY='plain-key'   # identifier "prod/api-key"
//! ```

use async_trait::async_trait;
use std::env;

use super::error::{Result, SecretsError};
use super::provider::{SecretPayload, SecretProvider};

/// Default environment variable prefix.
pub const DEFAULT_SECRET_PREFIX: &str = "SECRETS_CACHE_SECRET_";

/// Reads secrets from prefixed environment variables.
#[derive(Debug, Clone)]
pub struct EnvSecretProvider {
    prefix: String,
}

impl EnvSecretProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom variable prefix.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    /// Environment variable consulted for `identifier`.
    pub fn env_var_for(&self, identifier: &str) -> String {
        let suffix: String = identifier
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
            .collect();
        format!("{}{}", self.prefix, suffix)
    }
}

impl Default for EnvSecretProvider {
    fn default() -> Self {
        Self::with_prefix(DEFAULT_SECRET_PREFIX)
    }
}

#[async_trait]
impl SecretProvider for EnvSecretProvider {
    async fn fetch(&self, identifier: &str) -> Result<SecretPayload> {
        let var = self.env_var_for(identifier);

        match env::var(&var) {
            Ok(value) => Ok(SecretPayload::text(value)),
            Err(env::VarError::NotPresent) => Err(SecretsError::not_found(identifier)),
            Err(env::VarError::NotUnicode(_)) => Err(SecretsError::provider(
                identifier,
                format!("environment variable {} is not valid unicode", var),
            )),
        }
    }

    fn provider_type(&self) -> &'static str {
        "env"
    }
}
