//! Suggestion prioritization.
//!
//! Asks the language model to rate every suggestion's impact and
//! difficulty, maps the ratings back onto the original suggestions by
//! text, and orders the result by impact.

use crate::llm::{LanguageModel, LlmResponse};
use crate::models::{Rating, Suggestion, MAPPING_FAILED_SOURCE};
use serde_json::Value;
use tracing::{debug, info, warn};

/// Rates and orders `suggestions`. Every input suggestion appears exactly once
/// in the output; records the model returned with altered text are appended
/// with source [`MAPPING_FAILED_SOURCE`].
pub async fn prioritize(llm: &dyn LanguageModel, suggestions: &[Suggestion]) -> Vec<Suggestion> {
    if suggestions.is_empty() {
        return Vec::new();
    }

    let response = llm.query(&build_prompt(suggestions)).await;

    let scored = match response {
        Ok(response) => match as_list(&response) {
            Some(items) => items,
            None => {
                warn!(
                    "Suggestion prioritization returned an unexpected format: {}",
                    response.describe()
                );
                return unscored(suggestions);
            }
        },
        Err(e) => {
            warn!("Suggestion prioritization failed: {}", e);
            return unscored(suggestions);
        }
    };

    let mut prioritized = apply_scores(suggestions, &scored);
    sort_by_impact(&mut prioritized);

    info!("Prioritized {} suggestions", prioritized.len());
    prioritized
}

fn build_prompt(suggestions: &[Suggestion]) -> String {
    let listing = suggestions
        .iter()
        .map(|s| format!("- {} (Source: {})", s.text, s.source))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Below is a list of suggestions for improving a documentation page. Rate each one for its **impact** on the reader's understanding and experience, and for the **difficulty** of making the change.

Use High, Medium or Low for both ratings.

Suggestions:
{listing}

Reply with a JSON list containing one object per suggestion, with these keys:
1. "suggestion": the suggestion text, copied exactly as given.
2. "impact": "High", "Medium" or "Low".
3. "difficulty": "High", "Medium" or "Low".

Example:
[
  {{"suggestion": "Sentence X is too long...", "impact": "Medium", "difficulty": "Low"}},
  {{"suggestion": "Add an example demonstrating feature Y.", "impact": "High", "difficulty": "Medium"}}
]
"#
    )
}

fn as_list(response: &LlmResponse) -> Option<Vec<Value>> {
    match response.decode_json() {
        Ok(Value::Array(items)) => Some(items),
        _ => None,
    }
}

/// Copies the returned ratings onto the originals, keeping input order.
fn apply_scores(suggestions: &[Suggestion], scored: &[Value]) -> Vec<Suggestion> {
    let mut result: Vec<Suggestion> = suggestions
        .iter()
        .cloned()
        .map(|s| s.with_ratings(Rating::NotAssessed, Rating::NotAssessed))
        .collect();
    let mut matched = vec![false; result.len()];
    let mut unmapped = Vec::new();

    for item in scored {
        let Some(text) = item.get("suggestion").and_then(Value::as_str) else {
            warn!("Ignoring scored item without suggestion text: {}", item);
            continue;
        };
        let impact = Rating::from_json(item.get("impact"));
        let difficulty = Rating::from_json(item.get("difficulty"));

        match find_unmatched(&result, &matched, text) {
            Some(index) => {
                matched[index] = true;
                result[index].impact = impact;
                result[index].difficulty = difficulty;
            }
            None if result.iter().any(|s| s.text == text) => {
                debug!("Ignoring repeated score for suggestion: {}", text);
            }
            None => {
                warn!("Could not map prioritized suggestion back: {}", text);
                unmapped.push(
                    Suggestion::new(text, MAPPING_FAILED_SOURCE).with_ratings(impact, difficulty),
                );
            }
        }
    }

    for (suggestion, _) in result.iter().zip(&matched).filter(|(_, m)| !**m) {
        warn!("Suggestion not scored by LLM: {}", suggestion.text);
    }

    result.extend(unmapped);
    result
}

/// First not-yet-matched suggestion with exactly this text, else one whose
/// text differs only in case or whitespace.
fn find_unmatched(suggestions: &[Suggestion], matched: &[bool], text: &str) -> Option<usize> {
    let open = |i: &usize| !matched[*i];

    (0..suggestions.len())
        .filter(open)
        .find(|&i| suggestions[i].text == text)
        .or_else(|| {
            let wanted = normalize(text);
            (0..suggestions.len())
                .filter(open)
                .find(|&i| normalize(&suggestions[i].text) == wanted)
        })
}

fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn unscored(suggestions: &[Suggestion]) -> Vec<Suggestion> {
    suggestions
        .iter()
        .cloned()
        .map(|s| s.with_ratings(Rating::NotAssessed, Rating::NotAssessed))
        .collect()
}

/// Stable sort, High first and N/A last.
pub fn sort_by_impact(suggestions: &mut [Suggestion]) {
    suggestions.sort_by_key(|s| s.impact.rank());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedModel;
    use serde_json::json;

    fn sample() -> Vec<Suggestion> {
        vec![
            Suggestion::new("a", "Readability"),
            Suggestion::new("b", "Structure Flow"),
            Suggestion::new("c", "Style Adherence"),
            Suggestion::new("d", "Readability"),
        ]
    }

    fn texts(suggestions: &[Suggestion]) -> Vec<&str> {
        suggestions.iter().map(|s| s.text.as_str()).collect()
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_call() {
        let llm = ScriptedModel::new();
        assert!(prioritize(&llm, &[]).await.is_empty());
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_sort_is_stable_by_impact() {
        let llm = ScriptedModel::new().with_json(json!([
            {"suggestion": "d", "impact": "High", "difficulty": "Low"},
            {"suggestion": "c", "impact": "Medium", "difficulty": "Low"},
            {"suggestion": "b", "impact": "High", "difficulty": "High"},
            {"suggestion": "a", "impact": "Low", "difficulty": "Medium"}
        ]));

        let result = prioritize(&llm, &sample()).await;

        assert_eq!(texts(&result), vec!["b", "d", "c", "a"]);
        assert_eq!(result[0].difficulty, Rating::High);
        assert_eq!(result[3].difficulty, Rating::Medium);

        let prompt = &llm.prompts()[0];
        assert!(prompt.contains("- a (Source: Readability)"));
        assert!(prompt.contains("- b (Source: Structure Flow)"));
    }

    #[tokio::test]
    async fn test_unscored_suggestions_are_kept_as_not_assessed() {
        let llm = ScriptedModel::new().with_json(json!([
            {"suggestion": "c", "impact": "High", "difficulty": "Low"}
        ]));

        let result = prioritize(&llm, &sample()).await;

        assert_eq!(result.len(), 4);
        assert_eq!(texts(&result), vec!["c", "a", "b", "d"]);
        assert!(result[1..]
            .iter()
            .all(|s| s.impact == Rating::NotAssessed && s.difficulty == Rating::NotAssessed));
    }

    #[tokio::test]
    async fn test_altered_text_is_appended_as_mapping_failed() {
        let llm = ScriptedModel::new().with_json(json!([
            {"suggestion": "a", "impact": "Low", "difficulty": "Low"},
            {"suggestion": "B ", "impact": "Medium", "difficulty": "Low"},
            {"suggestion": "something new", "impact": "High", "difficulty": "Low"}
        ]));

        let result = prioritize(&llm, &sample()[..2]).await;

        assert_eq!(result.len(), 3);
        assert_eq!(result[0].source, MAPPING_FAILED_SOURCE);
        assert_eq!(result[0].text, "something new");
        assert_eq!(result[1].text, "b");
        assert_eq!(result[1].impact, Rating::Medium);
        assert_eq!(result[2].text, "a");
    }

    #[tokio::test]
    async fn test_duplicate_texts_matched_in_order() {
        let input = vec![
            Suggestion::new("same", "Readability"),
            Suggestion::new("same", "Style Adherence"),
        ];
        let llm = ScriptedModel::new().with_json(json!([
            {"suggestion": "same", "impact": "Low", "difficulty": "Low"},
            {"suggestion": "same", "impact": "High", "difficulty": "Low"},
            {"suggestion": "same", "impact": "Medium", "difficulty": "Low"}
        ]));

        let result = prioritize(&llm, &input).await;

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].source, "Style Adherence");
        assert_eq!(result[0].impact, Rating::High);
        assert_eq!(result[1].source, "Readability");
        assert_eq!(result[1].impact, Rating::Low);
    }

    #[tokio::test]
    async fn test_unknown_rating_becomes_not_assessed() {
        let llm = ScriptedModel::new().with_json(json!([
            {"suggestion": "a", "impact": "Critical", "difficulty": 3}
        ]));

        let result = prioritize(&llm, &sample()[..1]).await;
        assert_eq!(result[0].impact, Rating::NotAssessed);
        assert_eq!(result[0].difficulty, Rating::NotAssessed);
    }

    #[tokio::test]
    async fn test_total_failure_preserves_order() {
        let mut input = sample();
        input[2].impact = Rating::High;

        for llm in [
            ScriptedModel::new().with_failure(),
            ScriptedModel::new().with_json(json!({"a": "High"})),
            ScriptedModel::new().with_text("Sorry, I can't rate these."),
        ] {
            let result = prioritize(&llm, &input).await;
            assert_eq!(texts(&result), vec!["a", "b", "c", "d"]);
            assert!(result.iter().all(|s| s.impact == Rating::NotAssessed));
        }
    }

    #[tokio::test]
    async fn test_fenced_text_response_is_decoded() {
        let llm = ScriptedModel::new().with_text(
            "```json\n[{\"suggestion\": \"b\", \"impact\": \"High\", \"difficulty\": \"Low\"}]\n```",
        );

        let result = prioritize(&llm, &sample()[..2]).await;
        assert_eq!(texts(&result), vec!["b", "a"]);
    }
}
