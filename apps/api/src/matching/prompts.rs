// Prompt template for competence goal matching.

use crate::catalog::GoalCatalog;
use crate::matching::MatchError;

/// Matching prompt template. Replace `{goals_json}` and `{developer_text}` before sending.
pub const MATCHING_PROMPT_TEMPLATE: &str = r#"You are an assistant that matches a developer's description of their recent work to competence goals.

COMPETENCE GOALS:
{goals_json}

DEVELOPER RESPONSE:
{developer_text}

<think>
Analyze the developer's response and identify which competence goals it matches.
For each matching goal, identify which specific subgoals are matched.
</think>

Return a JSON array of matching competence goals in this format:
[
  {
    "competenceGoalId": 123,
    "matchingSubGoals": ["subgoal1", "subgoal2"]
  }
]

RULES:
1. `competenceGoalId` MUST be the integer `id` of a goal listed above
2. `matchingSubGoals` MUST be an array of strings copied from that goal's `subGoals`
3. Only include goals where there is a clear match to the developer's response
4. If nothing matches, return an empty array: []"#;

/// Builds the matching prompt for one developer response against `catalog`.
///
/// Deterministic: the same text and catalog always produce the same prompt.
pub fn build_matching_prompt(
    developer_text: &str,
    catalog: &GoalCatalog,
) -> Result<String, MatchError> {
    let goals_json = serde_json::to_string(catalog.goals())?;

    Ok(fill_placeholders(
        MATCHING_PROMPT_TEMPLATE,
        &[
            ("{goals_json}", goals_json.as_str()),
            ("{developer_text}", developer_text),
        ],
    ))
}

/// Substitutes placeholders in one pass over `template`. Inserted values are
/// never rescanned, so braces in catalog or developer text stay literal.
fn fill_placeholders(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        match values.iter().find(|(key, _)| tail.starts_with(key)) {
            Some((key, value)) => {
                out.push_str(value);
                rest = &tail[key.len()..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Goal;

    fn sample_catalog() -> GoalCatalog {
        GoalCatalog::new(vec![
            Goal {
                id: 1,
                title: "Cloud Deployment".to_string(),
                sub_goals: vec!["Deploy to GCP".to_string(), "Use CI/CD".to_string()],
            },
            Goal {
                id: 2,
                title: "Testing".to_string(),
                sub_goals: vec!["Write unit tests".to_string()],
            },
        ])
        .unwrap()
    }

    #[test]
    fn test_prompt_embeds_compact_catalog_json() {
        let prompt = build_matching_prompt("anything", &sample_catalog()).unwrap();
        assert!(prompt.contains(
            r#"[{"id":1,"title":"Cloud Deployment","subGoals":["Deploy to GCP","Use CI/CD"]},{"id":2,"title":"Testing","subGoals":["Write unit tests"]}]"#
        ));
    }

    #[test]
    fn test_prompt_embeds_developer_text() {
        let prompt =
            build_matching_prompt("I deployed a service to Google Cloud", &sample_catalog())
                .unwrap();
        assert!(prompt.contains("DEVELOPER RESPONSE:\nI deployed a service to Google Cloud"));
    }

    #[test]
    fn test_prompt_specifies_output_shape() {
        let prompt = build_matching_prompt("x", &sample_catalog()).unwrap();
        assert!(prompt.contains("\"competenceGoalId\""));
        assert!(prompt.contains("\"matchingSubGoals\""));
        assert!(prompt.contains("clear match"));
    }

    #[test]
    fn test_no_placeholders_survive() {
        let prompt = build_matching_prompt("x", &sample_catalog()).unwrap();
        assert!(!prompt.contains("{goals_json}"));
        assert!(!prompt.contains("{developer_text}"));
    }

    #[test]
    fn test_empty_catalog_lists_no_goals() {
        let prompt = build_matching_prompt("x", &GoalCatalog::default()).unwrap();
        assert!(prompt.contains("COMPETENCE GOALS:\n[]\n"));
    }

    #[test]
    fn test_empty_developer_text_is_accepted() {
        assert!(build_matching_prompt("", &sample_catalog()).is_ok());
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let catalog = sample_catalog();
        let a = build_matching_prompt("same text", &catalog).unwrap();
        let b = build_matching_prompt("same text", &catalog).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_placeholder_in_catalog_text_is_not_expanded() {
        let catalog = GoalCatalog::new(vec![Goal {
            id: 9,
            title: "Templates with {developer_text}".to_string(),
            sub_goals: vec!["Escape {goals_json}".to_string()],
        }])
        .unwrap();
        let prompt = build_matching_prompt("SECRET", &catalog).unwrap();
        assert!(prompt.contains("Templates with {developer_text}"));
        assert!(prompt.contains("Escape {goals_json}"));
        assert_eq!(prompt.matches("SECRET").count(), 1);
    }

    #[test]
    fn test_json_braces_in_template_are_kept() {
        let prompt = build_matching_prompt("x", &sample_catalog()).unwrap();
        assert!(prompt.contains("  {\n    \"competenceGoalId\": 123,"));
    }

    #[test]
    fn test_placeholder_in_developer_text_is_not_expanded() {
        let prompt = build_matching_prompt("see {goals_json}", &sample_catalog()).unwrap();
        assert!(prompt.contains("see {goals_json}"));
    }
}
