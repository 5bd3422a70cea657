//! Reconciler: validates candidates against the authoritative catalog.
//!
//! Identity (`id`, `title`) always comes from the catalog. Sub-goals come from
//! the model as-is and are NOT checked against the goal's own sub-goal list.
//! Unknown ids are dropped. Duplicate ids are all kept, in emission order.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::catalog::{Goal, GoalCatalog};
use crate::matching::extract::MatchCandidate;

/// A catalog goal the description matched, with the sub-goals the model selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedGoal {
    pub id: i64,
    pub title: String,
    pub sub_goals: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciled {
    pub goals: Vec<MatchedGoal>,
    /// Candidate ids with no goal in the catalog, in emission order.
    pub dropped_unknown: Vec<i64>,
}

pub fn reconcile(candidates: &[MatchCandidate], catalog: &GoalCatalog) -> Reconciled {
    let by_id: HashMap<i64, &Goal> = catalog.goals().iter().map(|g| (g.id, g)).collect();

    let mut reconciled = Reconciled::default();
    for candidate in candidates {
        match by_id.get(&candidate.competence_goal_id) {
            Some(goal) => reconciled.goals.push(MatchedGoal {
                id: goal.id,
                title: goal.title.clone(),
                sub_goals: candidate.matching_sub_goals.clone().unwrap_or_default(),
            }),
            None => reconciled.dropped_unknown.push(candidate.competence_goal_id),
        }
    }

    if !reconciled.dropped_unknown.is_empty() {
        warn!(
            "Dropped {} candidate(s) with unknown goal ids: {:?}",
            reconciled.dropped_unknown.len(),
            reconciled.dropped_unknown
        );
    }

    reconciled
}
