//! Response Extractor: turns a model's raw text into typed match candidates.
//!
//! Models wrap the answer in prose and may emit `<think>` reasoning before or
//! between parts of it. Extraction:
//! 1. removes every `<think>…</think>` block, and reasoning closed by a dangling `</think>`
//! 2. takes the first bracket-balanced `[...]` span, starting at the earliest `[`
//! 3. parses that span strictly as a JSON array
//! 4. keeps each entry that is a valid candidate object and skips the rest
//!
//! A missing or malformed payload is an expected outcome, reported through
//! `PayloadStatus` and never as an error.

use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

const THINK_CLOSE: &str = "</think>";

static THINK_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<think>.*?</think>").unwrap());

/// One provisional match as emitted by the model. Not yet checked against the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchCandidate {
    #[serde(deserialize_with = "lenient_goal_id")]
    pub competence_goal_id: i64,
    /// `None` when the field is missing or `null`.
    #[serde(default, deserialize_with = "lenient_sub_goals")]
    pub matching_sub_goals: Option<Vec<String>>,
}

/// Accepts `7`, `7.0` and `"7"`. Fractions, booleans and other shapes are rejected.
fn lenient_goal_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let id = match &value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    id.ok_or_else(|| de::Error::custom(format!("competenceGoalId is not an integer: {value}")))
}

/// Scalar items are kept as text (`3` becomes `"3"`), `null` items are dropped,
/// nested arrays or objects reject the whole entry.
fn lenient_sub_goals<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(items) = Option::<Vec<Value>>::deserialize(deserializer)? else {
        return Ok(None);
    };

    let mut sub_goals = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::String(s) => sub_goals.push(s),
            Value::Number(n) => sub_goals.push(n.to_string()),
            Value::Bool(b) => sub_goals.push(b.to_string()),
            Value::Null => {}
            other => {
                return Err(de::Error::custom(format!(
                    "matchingSubGoals item is not text: {other}"
                )))
            }
        }
    }
    Ok(Some(sub_goals))
}

/// What extraction found in the raw response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadStatus {
    /// A JSON array was found and parsed.
    Parsed,
    /// No JSON array anywhere in the response.
    Absent,
    /// An array-looking span was found but is not valid JSON.
    Malformed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub candidates: Vec<MatchCandidate>,
    pub payload: PayloadStatus,
    /// Array entries that were not candidate objects.
    pub skipped_entries: usize,
}

impl Extraction {
    fn empty(payload: PayloadStatus) -> Self {
        Self {
            candidates: Vec::new(),
            payload,
            skipped_entries: 0,
        }
    }
}

/// Extracts match candidates from a raw model response.
pub fn extract_candidates(raw: &str) -> Extraction {
    let cleaned = strip_reasoning(raw);

    let Some(span) = find_first_json_array(&cleaned) else {
        debug!("No JSON array in LLM response ({} bytes)", raw.len());
        return Extraction::empty(PayloadStatus::Absent);
    };

    let entries: Vec<Value> = match serde_json::from_str(span) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(
                "Malformed JSON array in LLM response ({} bytes): {e}",
                span.len()
            );
            return Extraction::empty(PayloadStatus::Malformed);
        }
    };

    let mut candidates = Vec::with_capacity(entries.len());
    let mut skipped_entries = 0;
    for (index, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<MatchCandidate>(entry) {
            Ok(candidate) => candidates.push(candidate),
            Err(e) => {
                skipped_entries += 1;
                debug!("Skipping array entry {index}: {e}");
            }
        }
    }

    if skipped_entries > 0 {
        warn!(
            "Skipped {} of {} entries in LLM response",
            skipped_entries,
            skipped_entries + candidates.len()
        );
    }

    Extraction {
        candidates,
        payload: PayloadStatus::Parsed,
        skipped_entries,
    }
}

/// Removes reasoning blocks.
///
/// Some models omit the opening tag. The first `</think>` left after removing
/// paired blocks ends the reasoning only when it sits outside the first JSON
/// array and an array still follows it. Otherwise the text is kept as is.
fn strip_reasoning(raw: &str) -> String {
    let without_blocks = THINK_BLOCK.replace_all(raw, "");

    if let Some(pos) = without_blocks.find(THINK_CLOSE) {
        let inside_payload =
            json_array_bounds(&without_blocks).is_some_and(|span| span.contains(&pos));
        let after = &without_blocks[pos + THINK_CLOSE.len()..];
        if !inside_payload && json_array_bounds(after).is_some() {
            return after.to_string();
        }
    }

    without_blocks.into_owned()
}

/// Returns the span from the earliest `[` to its matching `]`.
///
/// Brackets inside JSON strings (including escaped quotes) do not count.
/// `None` when there is no `[` or it is never closed.
fn find_first_json_array(text: &str) -> Option<&str> {
    json_array_bounds(text).map(|span| &text[span])
}

fn json_array_bounds(text: &str) -> Option<Range<usize>> {
    let start = text.find('[')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start..start + offset + 1);
                }
            }
            _ => {}
        }
    }

    None
}
