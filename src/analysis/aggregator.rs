//! Suggestion aggregation.
//!
//! Flattens the suggestions of every analyzer into one list, tagging each
//! with the display name of the analyzer that produced it.

use crate::models::{display_name, AnalysisResults, Rating, Suggestion, SuggestionEntry};
use tracing::{debug, warn};

/// Collects all analyzer suggestions in analyzer order, then suggestion order.
pub fn aggregate(results: &AnalysisResults) -> Vec<Suggestion> {
    let mut suggestions = Vec::new();

    for (analyzer, result) in results.iter() {
        let source = display_name(analyzer);

        for entry in &result.suggestions {
            match entry {
                SuggestionEntry::Text(text) => {
                    suggestions.push(Suggestion::new(text.clone(), source.clone()));
                }
                SuggestionEntry::Partial {
                    text,
                    impact,
                    difficulty,
                } => {
                    let rating = |r: &Option<String>| r.as_deref().map(Rating::from).unwrap_or_default();
                    suggestions.push(
                        Suggestion::new(text.clone(), source.clone())
                            .with_ratings(rating(impact), rating(difficulty)),
                    );
                }
                SuggestionEntry::Unrecognized(value) => {
                    warn!("Skipping malformed suggestion from {}: {}", source, value);
                }
            }
        }
    }

    debug!(
        "Aggregated {} suggestions from {} analyzers",
        suggestions.len(),
        results.len()
    );
    suggestions
}
