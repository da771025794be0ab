//! # Configuration Settings
//!
//! Options recognised by the secrets middleware, loadable from TOML, YAML or
//! JSON files and overridable from the environment.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use validator::{Validate, ValidationError};

use crate::errors::{Error, Result};
use crate::secrets::CachePolicy;

/// Environment variable enabling cache reuse (`true`/`false`).
pub const ENV_CACHE: &str = "SECRETS_CACHE_ENABLED";
/// Environment variable holding the refresh window in milliseconds.
pub const ENV_CACHE_EXPIRY_MS: &str = "SECRETS_CACHE_EXPIRY_MS";
/// Environment variable enabling strict failure mode.
pub const ENV_THROW_ON_FAILED_CALL: &str = "SECRETS_CACHE_THROW_ON_FAILED_CALL";
/// Environment variable with comma-separated `context_key=identifier` pairs.
pub const ENV_SECRETS: &str = "SECRETS_CACHE_SECRETS";

/// Secrets middleware configuration.
///
/// ```toml
/// cache = true
/// cacheExpiryInMillis = 300000
/// throwOnFailedCall = false
///
/// [secrets]
/// DB_LOGIN = "rds_login"
/// API_KEY = "prod/api-key"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct SecretsConfig {
    /// Context-key → remote identifier, resolved on every invocation
    #[validate(custom(function = "validate_secret_mapping"))]
    pub secrets: BTreeMap<String, String>,

    /// Reuse fetched values until the refresh window elapses
    pub cache: bool,

    /// Refresh window in milliseconds; unset keeps values for the process lifetime
    #[validate(range(min = 1, message = "cacheExpiryInMillis must be greater than zero"))]
    pub cache_expiry_in_millis: Option<u64>,

    /// Fail the invocation when a secret cannot be fetched and nothing is cached
    pub throw_on_failed_call: bool,
}

impl SecretsConfig {
    /// Load and validate a configuration file. The format is picked from the
    /// extension: `.toml`, `.yaml`/`.yml` or `.json`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::io(e, format!("Failed to read configuration file {}", path.display()))
        })?;

        let extension =
            path.extension().and_then(|ext| ext.to_str()).unwrap_or_default().to_lowercase();
        let invalid = |kind: &str, source: Box<dyn std::error::Error + Send + Sync>| {
            Error::config_with_source(format!("Invalid {} in {}", kind, path.display()), source)
        };
        let config: Self = match extension.as_str() {
            "toml" => toml::from_str(&raw).map_err(|e| invalid("TOML", Box::new(e)))?,
            "yaml" | "yml" => serde_yaml::from_str(&raw).map_err(|e| invalid("YAML", Box::new(e)))?,
            "json" => serde_json::from_str(&raw).map_err(|e| invalid("JSON", Box::new(e)))?,
            other => {
                return Err(Error::config(format!(
                    "Unsupported configuration format '{}' for {}. Use .toml, .yaml or .json",
                    other,
                    path.display()
                )))
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Build configuration purely from environment variables.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Override fields from any of the `SECRETS_CACHE_*` variables that are set.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(cache) = read_env(ENV_CACHE)? {
            self.cache = parse_bool(ENV_CACHE, &cache)?;
        }

        if let Some(expiry) = read_env(ENV_CACHE_EXPIRY_MS)? {
            let millis = expiry.trim().parse::<u64>().map_err(|e| {
                Error::config(format!("Invalid {} value '{}': {}", ENV_CACHE_EXPIRY_MS, expiry, e))
            })?;
            self.cache_expiry_in_millis = Some(millis);
        }

        if let Some(throw) = read_env(ENV_THROW_ON_FAILED_CALL)? {
            self.throw_on_failed_call = parse_bool(ENV_THROW_ON_FAILED_CALL, &throw)?;
        }

        if let Some(pairs) = read_env(ENV_SECRETS)? {
            self.secrets.extend(parse_secret_pairs(&pairs)?);
        }

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(Error::from)
    }

    /// Cache policy described by this configuration.
    pub fn policy(&self) -> CachePolicy {
        CachePolicy {
            caching_enabled: self.cache,
            expiry: self.cache_expiry(),
            throw_on_failed_call: self.throw_on_failed_call,
        }
    }

    /// Refresh window as a Duration (None = never expires)
    pub fn cache_expiry(&self) -> Option<Duration> {
        self.cache_expiry_in_millis.map(Duration::from_millis)
    }
}

fn read_env(name: &str) -> Result<Option<String>> {
    match std::env::var(name) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(Error::config_with_source(format!("Invalid {}", name), Box::new(e))),
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(Error::config(format!("Invalid {} value '{}': expected a boolean", name, value))),
    }
}

/// Parse `KEY=identifier,OTHER=identifier` into a mapping.
fn parse_secret_pairs(raw: &str) -> Result<BTreeMap<String, String>> {
    raw.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, identifier) = pair.split_once('=').ok_or_else(|| {
                Error::config(format!(
                    "Invalid {} entry '{}': expected context_key=identifier",
                    ENV_SECRETS, pair
                ))
            })?;
            Ok((key.trim().to_string(), identifier.trim().to_string()))
        })
        .collect()
}

fn validate_secret_mapping(
    secrets: &BTreeMap<String, String>,
) -> std::result::Result<(), ValidationError> {
    for (key, identifier) in secrets {
        if key.trim().is_empty() {
            return Err(ValidationError::new("empty_context_key")
                .with_message("context keys cannot be empty".into()));
        }
        if identifier.trim().is_empty() {
            return Err(ValidationError::new("empty_identifier")
                .with_message(format!("secret '{}' has an empty identifier", key).into()));
        }
    }
    Ok(())
}
