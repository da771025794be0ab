//! Parsed secret values.
//!
//! Secret stores hand back either a JSON document (`{"Username": .., "Password": ..}`)
//! or an opaque string. [`SecretValue::parse`] tries the structured form first and
//! falls back to a scalar, so both shapes can live side by side in one cache.

use serde::Serialize;
use std::collections::BTreeMap;
use zeroize::Zeroizing;

use super::error::{Result, SecretsError};
use super::provider::SecretPayload;
use super::types::SecretString;

/// A resolved secret, either an opaque string or a field → string mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SecretValue {
    Scalar(SecretString),
    Structured(BTreeMap<String, SecretString>),
}

impl SecretValue {
    /// Interpret a provider payload.
    ///
    /// Text wins over binary; binary must be UTF-8. A JSON object becomes
    /// [`SecretValue::Structured`] (non-string members keep their compact JSON
    /// text), anything else becomes [`SecretValue::Scalar`].
    ///
    /// # Errors
    ///
    /// [`SecretsError::Parse`] when the payload has no content or the binary form
    /// is not UTF-8.
    pub fn parse(identifier: &str, mut payload: SecretPayload) -> Result<Self> {
        let text = match (payload.text.take(), payload.binary.take()) {
            (Some(text), _) => Zeroizing::new(text),
            (None, Some(bytes)) => {
                let text = String::from_utf8(bytes).map_err(|e| {
                    let mut bytes = e.into_bytes();
                    zeroize::Zeroize::zeroize(&mut bytes);
                    SecretsError::parse(identifier, "binary payload is not valid UTF-8")
                })?;
                Zeroizing::new(text)
            }
            (None, None) => {
                return Err(SecretsError::parse(identifier, "payload contains no secret value"))
            }
        };

        Ok(Self::from_text(&text))
    }

    /// Structured-first interpretation of a secret string.
    pub fn from_text(text: &str) -> Self {
        match serde_json::from_str::<serde_json::Value>(text) {
            Ok(serde_json::Value::Object(members)) => Self::Structured(
                members
                    .into_iter()
                    .map(|(field, value)| {
                        let value = match value {
                            serde_json::Value::String(s) => s,
                            other => other.to_string(),
                        };
                        (field, SecretString::new(value))
                    })
                    .collect(),
            ),
            _ => Self::Scalar(SecretString::new(text)),
        }
    }

    /// Build a structured value from field/value pairs.
    pub fn structured<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<SecretString>,
    {
        Self::Structured(fields.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    pub fn scalar(value: impl Into<SecretString>) -> Self {
        Self::Scalar(value.into())
    }

    /// The raw string of a scalar value.
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Self::Scalar(value) => Some(value.expose_secret()),
            Self::Structured(_) => None,
        }
    }

    /// One field of a structured value.
    pub fn field(&self, name: &str) -> Option<&str> {
        match self {
            Self::Structured(fields) => fields.get(name).map(SecretString::expose_secret),
            Self::Scalar(_) => None,
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Structured(_))
    }

    /// `"scalar"` or `"structured"`, for log fields.
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::Structured(_) => "structured",
        }
    }

    /// Unredacted JSON rendering. Only for handing the value to its consumer.
    pub fn to_exposed_json(&self) -> serde_json::Value {
        match self {
            Self::Scalar(value) => serde_json::Value::String(value.expose_secret().to_string()),
            Self::Structured(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), serde_json::Value::String(v.expose_secret().into())))
                    .collect(),
            ),
        }
    }
}
