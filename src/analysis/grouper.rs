//! Thematic grouping of prioritized suggestions.
//!
//! Suggestions are sent to the language model under positional ids
//! (`sugg_0`, `sugg_1`, ...) and the model answers with a theme to id list
//! mapping. Whatever the model returns, every suggestion ends up in exactly
//! one theme.

use crate::llm::LanguageModel;
use crate::models::{Suggestion, ThemeGroups};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

/// Theme that collects suggestions the model did not place.
pub const UNCATEGORIZED_THEME: &str = "Uncategorized";

/// Groups `suggestions` into named themes.
///
/// Falls back to grouping by source when the model's answer places nothing.
/// Leftovers from a partial answer go under [`UNCATEGORIZED_THEME`].
pub async fn group(llm: &dyn LanguageModel, suggestions: &[Suggestion]) -> ThemeGroups {
    if suggestions.is_empty() {
        debug!("No suggestions provided for grouping");
        return ThemeGroups::new();
    }

    let mapping = match llm.query(&build_prompt(suggestions)).await {
        Ok(response) => match response.decode_json() {
            Ok(Value::Object(map)) => Some(map),
            Ok(other) => {
                warn!("Grouping response is not a JSON object: {}", other);
                None
            }
            Err(e) => {
                warn!(
                    "Failed to decode grouping response as JSON: {} ({})",
                    e,
                    response.describe()
                );
                None
            }
        },
        Err(e) => {
            warn!("Suggestion grouping failed: {}", e);
            None
        }
    };

    let mut placed = vec![false; suggestions.len()];
    let mut groups = match mapping {
        Some(map) => place_by_id(&map, suggestions, &mut placed),
        None => ThemeGroups::new(),
    };

    if groups.is_empty() {
        warn!("LLM grouping produced no themes, falling back to grouping by source");
        return ThemeGroups::by_source(suggestions);
    }

    let leftovers: Vec<&Suggestion> = suggestions
        .iter()
        .zip(&placed)
        .filter(|(_, placed)| !**placed)
        .map(|(suggestion, _)| suggestion)
        .collect();

    if !leftovers.is_empty() {
        warn!(
            "{} suggestions were not categorized by the LLM and placed in '{}'",
            leftovers.len(),
            UNCATEGORIZED_THEME
        );
        for suggestion in leftovers {
            groups.push(UNCATEGORIZED_THEME, suggestion.clone());
        }
    }

    info!(
        "Grouped suggestions into themes: {}",
        groups.names().join(", ")
    );
    groups
}

fn build_prompt(suggestions: &[Suggestion]) -> String {
    let listing = suggestions
        .iter()
        .enumerate()
        .map(|(i, s)| {
            format!(
                "- ID: {}, Suggestion: {} (Impact: {}, Difficulty: {}, Source: {})",
                suggestion_id(i),
                s.text,
                s.impact,
                s.difficulty,
                s.source
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Group the following prioritized documentation suggestions into logical themes. Each suggestion has a unique ID. Pick short, descriptive theme names (for example "Clarity & Conciseness", "Structural Enhancements", "Example Addition", "Tone Adjustment").

Suggestions:
{listing}

Reply ONLY with a JSON object whose keys are theme names and whose values are lists of suggestion IDs (for example ["sugg_0", "sugg_5"]). Do not repeat the suggestion text and do not wrap the object in markdown.

Example:
{{
  "Clarity & Conciseness": ["sugg_1", "sugg_4"],
  "Structural Enhancements": ["sugg_0"],
  "User Experience": ["sugg_2", "sugg_3"]
}}
"#
    )
}

fn suggestion_id(index: usize) -> String {
    format!("sugg_{}", index)
}

fn parse_id(id: &str, count: usize) -> Option<usize> {
    id.strip_prefix("sugg_")?
        .parse::<usize>()
        .ok()
        .filter(|index| *index < count)
}

/// Resolves theme id lists into suggestions. Each suggestion is placed at most
/// once; themes left without suggestions are dropped.
fn place_by_id(
    mapping: &Map<String, Value>,
    suggestions: &[Suggestion],
    placed: &mut [bool],
) -> ThemeGroups {
    let mut groups = ThemeGroups::new();

    for (theme, ids) in mapping {
        let Value::Array(ids) = ids else {
            warn!("Invalid format for theme '{}', expected a list of IDs", theme);
            continue;
        };

        for id in ids {
            let index = id
                .as_str()
                .and_then(|id| parse_id(id, suggestions.len()));

            match index {
                Some(index) if placed[index] => {
                    debug!("{} already placed, ignoring repeat in '{}'", id, theme);
                }
                Some(index) => {
                    placed[index] = true;
                    groups.push(theme, suggestions[index].clone());
                }
                None => {
                    warn!("Unknown or invalid suggestion ID {} for theme '{}'", id, theme);
                }
            }
        }
    }

    groups
}
