//! Hosted-API provider: GitHub Models chat completions behind a bearer token.
//!
//! Request and response bodies are never logged: prompts carry a developer's
//! free-text description of their work.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{api_error_message, HostedApiConfig, LlmProvider, ProviderError};

/// Chat models the hosted endpoint accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostedModel {
    Gpt4o,
    Gpt4oMini,
    O1Mini,
    O1Preview,
    Phi35MiniInstruct,
    MetaLlama31_8bInstruct,
    MetaLlama31_70bInstruct,
    MistralLarge,
}

impl HostedModel {
    pub const ALL: [HostedModel; 8] = [
        HostedModel::Gpt4o,
        HostedModel::Gpt4oMini,
        HostedModel::O1Mini,
        HostedModel::O1Preview,
        HostedModel::Phi35MiniInstruct,
        HostedModel::MetaLlama31_8bInstruct,
        HostedModel::MetaLlama31_70bInstruct,
        HostedModel::MistralLarge,
    ];

    pub fn id(self) -> &'static str {
        match self {
            HostedModel::Gpt4o => "gpt-4o",
            HostedModel::Gpt4oMini => "gpt-4o-mini",
            HostedModel::O1Mini => "o1-mini",
            HostedModel::O1Preview => "o1-preview",
            HostedModel::Phi35MiniInstruct => "Phi-3.5-mini-instruct",
            HostedModel::MetaLlama31_8bInstruct => "Meta-Llama-3.1-8B-Instruct",
            HostedModel::MetaLlama31_70bInstruct => "Meta-Llama-3.1-70B-Instruct",
            HostedModel::MistralLarge => "Mistral-large",
        }
    }
}

impl fmt::Display for HostedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for HostedModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        HostedModel::ALL
            .into_iter()
            .find(|m| m.id().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unsupported hosted model '{wanted}'"))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl ChatResponse {
    fn into_text(self) -> Option<String> {
        self.choices.into_iter().next().and_then(|c| c.message.content)
    }
}

pub struct HostedApiProvider {
    client: Client,
    endpoint: String,
    token: String,
    model: HostedModel,
    temperature: Option<f32>,
}

impl HostedApiProvider {
    pub fn new(config: HostedApiConfig) -> Result<Self, ProviderError> {
        if config.token.trim().is_empty() {
            return Err(ProviderError::MissingCredential("hosted API token"));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ProviderError::Http)?;

        Ok(Self {
            client,
            endpoint: config.endpoint,
            token: config.token,
            model: config.model,
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl LlmProvider for HostedApiProvider {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let request_body = ChatRequest {
            model: self.model.id(),
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&request_body)
            .send()
            .await
            .map_err(ProviderError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }

        let body = response
            .text()
            .await
            .map_err(ProviderError::from_transport)?;
        let parsed: ChatResponse = serde_json::from_str(&body)?;
        let text = parsed.into_text().ok_or(ProviderError::EmptyContent)?;

        debug!(
            "Hosted LLM call succeeded: model={}, status={}, response_bytes={}",
            self.model,
            status.as_u16(),
            text.len()
        );

        Ok(text)
    }

    fn name(&self) -> &'static str {
        "hosted"
    }

    fn model(&self) -> &str {
        self.model.id()
    }
}
