// Competence goal matching.
// Flow: build prompt → provider.generate → extract candidates → reconcile against the catalog.
// All model calls go through llm_client; nothing here knows which backend is configured.

use thiserror::Error;

use crate::llm_client::ProviderError;

pub mod extract;
pub mod handlers;
pub mod pipeline;
pub mod prompts;
pub mod reconcile;

pub use pipeline::{MatchOutcome, MatchingPipeline};

/// Failures that abort a match call. Bad model output is not one of them.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Failed to serialize competence goals: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("LLM provider error: {0}")]
    Provider(#[from] ProviderError),
}
