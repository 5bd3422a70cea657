//! LLM Client: the single point of entry for all model calls.
//!
//! ARCHITECTURAL RULE: No other module talks to a model backend directly.
//! Business logic holds an `Arc<dyn LlmProvider>` chosen once at startup from
//! `ProviderConfig`; it never branches on which backend is behind it.
//!
//! Retries are a caller concern. A provider makes exactly one request per call.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

pub mod hosted;
pub mod local;

pub use hosted::{HostedApiProvider, HostedModel};
pub use local::LocalEndpointProvider;

pub const DEFAULT_LOCAL_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_LOCAL_MODEL: &str = "qwen2.5-coder:32b";
pub const DEFAULT_LOCAL_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_HOSTED_ENDPOINT: &str = "https://models.inference.ai.azure.com/chat/completions";
pub const DEFAULT_HOSTED_TIMEOUT: Duration = Duration::from_secs(60);

/// Longest slice of an error body carried into `ProviderError::Api`.
const MAX_ERROR_MESSAGE_CHARS: usize = 300;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    #[error("LLM request timed out")]
    Timeout,

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Missing credential: {0}")]
    MissingCredential(&'static str),

    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,
}

impl ProviderError {
    /// Maps a reqwest failure, keeping timeouts distinguishable from other transport errors.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else {
            ProviderError::Http(err)
        }
    }
}

/// Capability shared by every model backend: send one prompt, receive raw text.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;

    /// Backend label, e.g. "local" or "hosted".
    fn name(&self) -> &'static str;

    fn model(&self) -> &str;
}

// ────────────────────────────────────────────────────────────────────────────
// Provider configuration
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct LocalEndpointConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: Option<f32>,
    pub timeout: Duration,
}

impl Default for LocalEndpointConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_LOCAL_BASE_URL.to_string(),
            model: DEFAULT_LOCAL_MODEL.to_string(),
            temperature: None,
            timeout: DEFAULT_LOCAL_TIMEOUT,
        }
    }
}

#[derive(Clone, PartialEq)]
pub struct HostedApiConfig {
    pub token: String,
    pub model: HostedModel,
    pub endpoint: String,
    pub temperature: Option<f32>,
    pub timeout: Duration,
}

impl HostedApiConfig {
    pub fn new(token: impl Into<String>, model: HostedModel) -> Self {
        Self {
            token: token.into(),
            model,
            endpoint: DEFAULT_HOSTED_ENDPOINT.to_string(),
            temperature: None,
            timeout: DEFAULT_HOSTED_TIMEOUT,
        }
    }
}

// Token is never printed.
impl fmt::Debug for HostedApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostedApiConfig")
            .field("token", &"<redacted>")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Which backend to use. Decided once, at construction.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderConfig {
    Local(LocalEndpointConfig),
    Hosted(HostedApiConfig),
}

/// Builds the configured provider.
pub fn build_provider(config: &ProviderConfig) -> Result<Arc<dyn LlmProvider>, ProviderError> {
    Ok(match config {
        ProviderConfig::Local(cfg) => Arc::new(LocalEndpointProvider::new(cfg.clone())?),
        ProviderConfig::Hosted(cfg) => Arc::new(HostedApiProvider::new(cfg.clone())?),
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Error body helpers
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    // {"error": {"code": "...", "message": "..."}}
    Nested { error: NestedError },
    // {"error": "..."}
    Flat { error: String },
}

#[derive(Debug, Deserialize)]
struct NestedError {
    message: String,
}

/// Pulls a human-readable message out of a non-2xx response body.
pub(crate) fn api_error_message(body: &str) -> String {
    let message = match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody::Nested { error }) => error.message,
        Ok(ErrorBody::Flat { error }) => error,
        Err(_) => body.trim().to_string(),
    };
    message.chars().take(MAX_ERROR_MESSAGE_CHARS).collect()
}
