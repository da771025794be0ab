//! Scripted provider for tests and local replays.
//!
//! [`ScriptedProvider`] answers each fetch from, in order:
//!
//! 1. the queue of one-shot responses (`push_*`)
//! 2. a response registered for the identifier (`respond_*`)
//! 3. the default response (`set_default_*`)
//!
//! and fails with a provider error when none applies. Every call is recorded.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use super::error::{Result, SecretsError};
use super::provider::{SecretPayload, SecretProvider};

/// One scripted answer.
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    Payload(SecretPayload),
    Failure(String),
}

impl ScriptedResponse {
    fn into_result(self, identifier: &str) -> Result<SecretPayload> {
        match self {
            Self::Payload(payload) => Ok(payload),
            Self::Failure(message) => Err(SecretsError::provider(identifier, message)),
        }
    }
}

#[derive(Debug, Default)]
struct Script {
    queued: VecDeque<ScriptedResponse>,
    by_identifier: HashMap<String, ScriptedResponse>,
    default: Option<ScriptedResponse>,
    calls: Vec<String>,
}

/// Test double implementing [`SecretProvider`].
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    script: Mutex<Script>,
    latency: Option<Duration>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider answering every call with `value` serialized as a text secret.
    pub fn with_default_json(value: serde_json::Value) -> Self {
        let provider = Self::new();
        provider.set_default_json(value);
        provider
    }

    /// Sleep this long inside every fetch.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn set_default(&self, response: ScriptedResponse) {
        self.lock().default = Some(response);
    }

    pub fn set_default_json(&self, value: serde_json::Value) {
        self.set_default(ScriptedResponse::Payload(SecretPayload::json(&value)));
    }

    /// Queue a one-shot response.
    pub fn push(&self, response: ScriptedResponse) {
        self.lock().queued.push_back(response);
    }

    pub fn push_json(&self, value: serde_json::Value) {
        self.push(ScriptedResponse::Payload(SecretPayload::json(&value)));
    }

    pub fn push_payload(&self, payload: SecretPayload) {
        self.push(ScriptedResponse::Payload(payload));
    }

    pub fn push_failure(&self, message: impl Into<String>) {
        self.push(ScriptedResponse::Failure(message.into()));
    }

    /// Answer every call for `identifier` with `response` (after the queue drains).
    pub fn respond(&self, identifier: impl Into<String>, response: ScriptedResponse) {
        self.lock().by_identifier.insert(identifier.into(), response);
    }

    pub fn respond_json(&self, identifier: impl Into<String>, value: serde_json::Value) {
        self.respond(identifier, ScriptedResponse::Payload(SecretPayload::json(&value)));
    }

    pub fn respond_failure(&self, identifier: impl Into<String>, message: impl Into<String>) {
        self.respond(identifier, ScriptedResponse::Failure(message.into()));
    }

    /// Total number of fetches so far.
    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    /// Number of fetches for one identifier.
    pub fn calls_for(&self, identifier: &str) -> usize {
        self.lock().calls.iter().filter(|call| call.as_str() == identifier).count()
    }

    /// Identifiers fetched, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Forget recorded calls, keeping the script.
    pub fn reset_calls(&self) {
        self.lock().calls.clear();
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn next_response(&self, identifier: &str) -> Option<ScriptedResponse> {
        let mut script = self.lock();
        script.calls.push(identifier.to_string());
        script
            .queued
            .pop_front()
            .or_else(|| script.by_identifier.get(identifier).cloned())
            .or_else(|| script.default.clone())
    }
}

#[async_trait]
impl SecretProvider for ScriptedProvider {
    async fn fetch(&self, identifier: &str) -> Result<SecretPayload> {
        let response = self.next_response(identifier);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        match response {
            Some(response) => response.into_result(identifier),
            None => Err(SecretsError::provider(identifier, "no scripted response")),
        }
    }

    fn provider_type(&self) -> &'static str {
        "scripted"
    }
}
