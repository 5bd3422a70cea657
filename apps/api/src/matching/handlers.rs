use std::sync::Arc;

use anyhow::anyhow;
use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::catalog::{Goal, GoalCatalog, Language};
use crate::errors::AppError;
use crate::matching::MatchOutcome;
use crate::state::AppState;

/// Longest developer text accepted by the match endpoint.
pub const MAX_TEXT_CHARS: usize = 20_000;

#[derive(Debug, Deserialize)]
pub struct MatchRequest {
    pub text: String,
    /// Catalog language code; the configured default when absent.
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MatchResponse {
    pub language: Language,
    pub provider: String,
    pub model: String,
    #[serde(flatten)]
    pub outcome: MatchOutcome,
}

#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub language: Language,
    pub goals: Vec<Goal>,
}

fn resolve_catalog(
    state: &AppState,
    code: Option<&str>,
) -> Result<(Language, Arc<GoalCatalog>), AppError> {
    let language = match code {
        Some(code) => code.parse::<Language>()?,
        None => state.config.default_language,
    };
    let catalog = state
        .catalogs
        .get(language)
        .ok_or_else(|| AppError::Internal(anyhow!("Catalog for '{language}' is not loaded")))?;
    Ok((language, catalog))
}

/// POST /api/v1/match
pub async fn handle_match(
    State(state): State<AppState>,
    Json(req): Json<MatchRequest>,
) -> Result<Json<MatchResponse>, AppError> {
    if req.text.chars().count() > MAX_TEXT_CHARS {
        return Err(AppError::Validation(format!(
            "text must be at most {MAX_TEXT_CHARS} characters"
        )));
    }

    let (language, catalog) = resolve_catalog(&state, req.language.as_deref())?;
    let outcome = state.pipeline.run(&req.text, &catalog).await?;

    let provider = state.pipeline.provider();
    Ok(Json(MatchResponse {
        language,
        provider: provider.name().to_string(),
        model: provider.model().to_string(),
        outcome,
    }))
}

/// GET /api/v1/catalogs/:language
pub async fn handle_get_catalog(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<CatalogResponse>, AppError> {
    let (language, catalog) = resolve_catalog(&state, Some(code.as_str()))?;
    Ok(Json(CatalogResponse {
        language,
        goals: catalog.goals().to_vec(),
    }))
}
