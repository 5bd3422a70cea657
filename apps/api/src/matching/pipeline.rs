#![allow(dead_code)]

//! Matching Pipeline: composes prompt → provider → extract → reconcile.
//!
//! Provider failures propagate as `MatchError::Provider`. Unusable model output
//! is not an error: it yields `Ok` with no goals, and the reason is reported in
//! `MatchOutcome::payload`.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::catalog::GoalCatalog;
use crate::llm_client::LlmProvider;
use crate::matching::extract::{extract_candidates, PayloadStatus};
use crate::matching::prompts::build_matching_prompt;
use crate::matching::reconcile::{reconcile, MatchedGoal};
use crate::matching::MatchError;

/// Result of one match call, with diagnostics for callers that want them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchOutcome {
    pub goals: Vec<MatchedGoal>,
    pub payload: PayloadStatus,
    pub skipped_entries: usize,
    pub dropped_goal_ids: Vec<i64>,
}

/// Stateless; clone freely and share across tasks.
#[derive(Clone)]
pub struct MatchingPipeline {
    provider: Arc<dyn LlmProvider>,
}

impl MatchingPipeline {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &dyn LlmProvider {
        self.provider.as_ref()
    }

    /// Matches `developer_text` against `catalog`, returning only the goals.
    pub async fn match_goals(
        &self,
        developer_text: &str,
        catalog: &GoalCatalog,
    ) -> Result<Vec<MatchedGoal>, MatchError> {
        Ok(self.run(developer_text, catalog).await?.goals)
    }

    /// Runs the full pipeline once. No retries.
    pub async fn run(
        &self,
        developer_text: &str,
        catalog: &GoalCatalog,
    ) -> Result<MatchOutcome, MatchError> {
        let prompt = build_matching_prompt(developer_text, catalog)?;

        let raw = self.provider.generate(&prompt).await?;

        let extraction = extract_candidates(&raw);
        let reconciled = reconcile(&extraction.candidates, catalog);

        info!(
            "Matched {} goal(s) via {} ({}): payload={:?}, candidates={}, dropped={}",
            reconciled.goals.len(),
            self.provider.name(),
            self.provider.model(),
            extraction.payload,
            extraction.candidates.len(),
            reconciled.dropped_unknown.len()
        );

        Ok(MatchOutcome {
            goals: reconciled.goals,
            payload: extraction.payload,
            skipped_entries: extraction.skipped_entries,
            dropped_goal_ids: reconciled.dropped_unknown,
        })
    }
}
