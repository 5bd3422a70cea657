#![allow(dead_code)]

//! Goal Catalog: the authoritative set of competence goals a description is matched against.
//!
//! A catalog is built once per language at startup and is read-only afterwards.
//! It is shared across requests behind an `Arc` and never mutated.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod loader;

pub use loader::{CatalogStore, Language};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Failed to read catalog file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse catalog file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Duplicate goal id {0} in catalog")]
    DuplicateGoalId(i64),
}

/// A single competence goal with its ordered sub-goals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: i64,
    pub title: String,
    pub sub_goals: Vec<String>,
}

/// Ordered goals, unique by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct GoalCatalog {
    goals: Vec<Goal>,
}

impl GoalCatalog {
    /// Builds a catalog, rejecting any id that appears twice.
    pub fn new(goals: Vec<Goal>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::with_capacity(goals.len());
        for goal in &goals {
            if !seen.insert(goal.id) {
                return Err(CatalogError::DuplicateGoalId(goal.id));
            }
        }
        Ok(Self { goals })
    }

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    pub fn len(&self) -> usize {
        self.goals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.goals.is_empty()
    }

    pub fn contains(&self, id: i64) -> bool {
        self.goals.iter().any(|g| g.id == id)
    }
}
