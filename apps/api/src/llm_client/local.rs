//! Local-endpoint provider: a self-hosted model behind a plain `/api/generate` endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{api_error_message, LlmProvider, LocalEndpointConfig, ProviderError};

const GENERATE_PATH: &str = "/api/generate";

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    // Single JSON object instead of a line-delimited stream.
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

pub struct LocalEndpointProvider {
    client: Client,
    generate_url: String,
    model: String,
    temperature: Option<f32>,
}

impl LocalEndpointProvider {
    pub fn new(config: LocalEndpointConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ProviderError::Http)?;

        Ok(Self {
            client,
            generate_url: format!("{}{GENERATE_PATH}", config.base_url.trim_end_matches('/')),
            model: config.model,
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl LlmProvider for LocalEndpointProvider {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let request_body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&self.generate_url)
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
        let parsed: GenerateResponse = serde_json::from_str(&body)?;

        debug!(
            "Local LLM call succeeded: model={}, prompt_bytes={}, response_bytes={}",
            self.model,
            prompt.len(),
            parsed.response.len()
        );

        Ok(parsed.response)
    }

    fn name(&self) -> &'static str {
        "local"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

    use super::*;
    use crate::llm_client::test_support::spawn_mock_server;

    fn config(base_url: String) -> LocalEndpointConfig {
        LocalEndpointConfig {
            base_url,
            model: "qwen2.5-coder:32b".to_string(),
            temperature: None,
            timeout: Duration::from_secs(5),
        }
    }

    /// Mock that echoes the received request body back as the generated text.
    fn echo_router() -> Router {
        Router::new().route(
            "/api/generate",
            post(|Json(body): Json<Value>| async move {
                Json(json!({
                    "model": body["model"],
                    "response": body.to_string(),
                    "done": true
                }))
            }),
        )
    }

    #[tokio::test]
    async fn test_generate_returns_response_field() {
        let base = spawn_mock_server(Router::new().route(
            "/api/generate",
            post(|| async { Json(json!({"response": "[]", "done": true})) }),
        ))
        .await;
        let provider = LocalEndpointProvider::new(config(base)).unwrap();

        let text = provider.generate("hello").await.unwrap();
        assert_eq!(text, "[]");
    }

    #[tokio::test]
    async fn test_request_body_matches_wire_contract() {
        let base = spawn_mock_server(echo_router()).await;
        let provider = LocalEndpointProvider::new(config(base)).unwrap();

        let echoed = provider.generate("match these goals").await.unwrap();
        let body: Value = serde_json::from_str(&echoed).unwrap();
        assert_eq!(body["model"], "qwen2.5-coder:32b");
        assert_eq!(body["prompt"], "match these goals");
        assert_eq!(body["stream"], false);
        assert!(body.get("temperature").is_none());
    }

    #[tokio::test]
    async fn test_temperature_is_sent_when_configured() {
        let base = spawn_mock_server(echo_router()).await;
        let mut cfg = config(base);
        cfg.temperature = Some(0.5);
        let provider = LocalEndpointProvider::new(cfg).unwrap();

        let echoed = provider.generate("p").await.unwrap();
        let body: Value = serde_json::from_str(&echoed).unwrap();
        assert_eq!(body["temperature"], 0.5);
    }

    #[tokio::test]
    async fn test_trailing_slash_in_base_url_is_tolerated() {
        let base = spawn_mock_server(echo_router()).await;
        let provider = LocalEndpointProvider::new(config(format!("{base}/"))).unwrap();
        assert!(provider.generate("p").await.is_ok());
    }

    #[tokio::test]
    async fn test_non_success_status_is_api_error() {
        let base = spawn_mock_server(Router::new().route(
            "/api/generate",
            post(|| async {
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({"error": "model 'qwen2.5-coder:32b' not found"})),
                )
            }),
        ))
        .await;
        let provider = LocalEndpointProvider::new(config(base)).unwrap();

        match provider.generate("p").await {
            Err(ProviderError::Api { status, message }) => {
                assert_eq!(status, 404);
                assert!(message.contains("not found"));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_response_field_is_decode_error() {
        let base = spawn_mock_server(Router::new().route(
            "/api/generate",
            post(|| async { Json(json!({"done": true})) }),
        ))
        .await;
        let provider = LocalEndpointProvider::new(config(base)).unwrap();

        let result = provider.generate("p").await;
        assert!(matches!(result, Err(ProviderError::Decode(_))));
    }

    #[tokio::test]
    async fn test_slow_endpoint_times_out() {
        let base = spawn_mock_server(Router::new().route(
            "/api/generate",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                Json(json!({"response": "too late"}))
            }),
        ))
        .await;
        let mut cfg = config(base);
        cfg.timeout = Duration::from_millis(100);
        let provider = LocalEndpointProvider::new(cfg).unwrap();

        let result = provider.generate("p").await;
        assert!(matches!(result, Err(ProviderError::Timeout)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_http_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let provider = LocalEndpointProvider::new(config(format!("http://{addr}"))).unwrap();
        let result = provider.generate("p").await;
        assert!(matches!(result, Err(ProviderError::Http(_))));
    }
}
