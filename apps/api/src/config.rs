use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};

use crate::catalog::Language;
use crate::llm_client::{
    HostedApiConfig, HostedModel, LocalEndpointConfig, ProviderConfig, DEFAULT_LOCAL_BASE_URL,
    DEFAULT_LOCAL_MODEL, DEFAULT_LOCAL_TIMEOUT,
};

/// Application configuration loaded from environment variables.
/// This is the only place that reads process environment; everything else
/// receives explicit values.
#[derive(Debug, Clone)]
pub struct Config {
    pub provider: ProviderConfig,
    pub catalog_dir: PathBuf,
    pub default_language: Language,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key → value source. Empty values count as unset.
    pub fn from_lookup<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        let temperature = var("LLM_TEMPERATURE")
            .map(|v| v.parse::<f32>())
            .transpose()
            .context("LLM_TEMPERATURE must be a number")?;

        let provider = match var("LLM_PROVIDER")
            .unwrap_or_else(|| "local".to_string())
            .to_lowercase()
            .as_str()
        {
            "local" => {
                let timeout_secs = var("OLLAMA_TIMEOUT_SECS")
                    .map(|v| v.parse::<u64>())
                    .transpose()
                    .context("OLLAMA_TIMEOUT_SECS must be a whole number of seconds")?;
                if timeout_secs == Some(0) {
                    bail!("OLLAMA_TIMEOUT_SECS must be greater than zero");
                }

                ProviderConfig::Local(LocalEndpointConfig {
                    base_url: var("OLLAMA_BASE_URL")
                        .unwrap_or_else(|| DEFAULT_LOCAL_BASE_URL.to_string()),
                    model: var("OLLAMA_MODEL").unwrap_or_else(|| DEFAULT_LOCAL_MODEL.to_string()),
                    temperature,
                    timeout: timeout_secs
                        .map(Duration::from_secs)
                        .unwrap_or(DEFAULT_LOCAL_TIMEOUT),
                })
            }
            "hosted" => {
                let token =
                    var("GH_TOKEN").context("Required environment variable 'GH_TOKEN' is not set")?;
                let model = var("GITHUB_MODEL")
                    .map(|v| v.parse::<HostedModel>())
                    .transpose()
                    .map_err(|e| anyhow!("GITHUB_MODEL: {e}"))?
                    .unwrap_or(HostedModel::Gpt4oMini);

                let mut hosted = HostedApiConfig::new(token, model);
                hosted.temperature = temperature;
                ProviderConfig::Hosted(hosted)
            }
            other => {
                return Err(anyhow!(
                    "LLM_PROVIDER must be 'local' or 'hosted', got '{other}'"
                ))
            }
        };

        let default_language = var("DEFAULT_LANGUAGE")
            .unwrap_or_else(|| "en".to_string())
            .parse::<Language>()
            .context("DEFAULT_LANGUAGE must be a supported language code")?;

        Ok(Config {
            provider,
            catalog_dir: PathBuf::from(var("CATALOG_DIR").unwrap_or_else(|| "data".to_string())),
            default_language,
            port: var("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: var("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}
