//! Executive summary generation.

use crate::llm::{truncate_chars, LanguageModel, LlmResponse};
use crate::models::{display_name, AnalysisResults, ThemeGroups};
use serde_json::Value;
use tracing::{info, warn};

/// Returned when there is nothing to summarize.
pub const NOTHING_TO_SUMMARIZE: &str =
    "No analysis results or suggestions available to generate a summary.";

const NO_THEMES: &str = "No specific themes identified.";

/// Raw replies shorter than this (and brace-free) are taken as the summary.
const RAW_SUMMARY_MAX_CHARS: usize = 500;

const FALLBACK_MAX_CHARS: usize = 300;

/// Writes a short executive summary of the findings. Always returns a
/// non-empty string.
pub async fn generate(
    llm: &dyn LanguageModel,
    results: &AnalysisResults,
    themes: &ThemeGroups,
) -> String {
    if results.is_empty() && themes.is_empty() {
        return NOTHING_TO_SUMMARIZE.to_string();
    }

    let findings = findings_lines(results);
    let theme_names = if themes.is_empty() {
        NO_THEMES.to_string()
    } else {
        themes.names().join(", ")
    };

    let summary = match llm.query(&build_prompt(&findings, &theme_names)).await {
        Ok(response) => extract_summary(&response),
        Err(e) => {
            warn!("Summary generation failed: {}", e);
            None
        }
    };

    match summary {
        Some(summary) => {
            info!("Executive summary generated");
            summary
        }
        None => {
            warn!("Using fallback summary");
            fallback_summary(&findings, &theme_names)
        }
    }
}

fn findings_lines(results: &AnalysisResults) -> Vec<String> {
    results
        .iter()
        .map(|(name, result)| format!("- {}: {}", display_name(name), result.assessment))
        .collect()
}

fn build_prompt(findings: &[String], theme_names: &str) -> String {
    format!(
        r#"Using the analysis findings and suggestion themes below for one documentation article, write a concise executive summary of 2-4 sentences. Mention the main strengths and the most important areas to improve.

Analysis Findings:
{}

Suggestion Themes:
{}

Reply ONLY with a JSON object with a single key "summary" whose value is the summary text, without markdown formatting.

Example:
{{
  "summary": "The article is generally clear but needs more examples and would benefit from subheadings."
}}
"#,
        findings.join("\n"),
        theme_names
    )
}

/// Pulls the summary out of a reply, accepting a bare sentence as-is.
fn extract_summary(response: &LlmResponse) -> Option<String> {
    match response.decode_json() {
        Ok(Value::Object(map)) => match map.get("summary").and_then(Value::as_str) {
            Some(summary) if !summary.trim().is_empty() => Some(summary.trim().to_string()),
            _ => {
                warn!("Summary response has no 'summary' string: {}", response.describe());
                None
            }
        },
        Ok(other) => {
            warn!("Summary response is not a JSON object: {}", other);
            None
        }
        Err(_) => {
            let raw = match response {
                LlmResponse::Text(text) => text.as_str(),
                LlmResponse::Structured(_) => return None,
            };
            let looks_like_sentence =
                raw.chars().count() < RAW_SUMMARY_MAX_CHARS && !raw.contains('{');
            let raw = raw.trim();

            if looks_like_sentence && !raw.is_empty() {
                info!("Using raw LLM response as summary");
                Some(raw.to_string())
            } else {
                warn!("Failed to decode summary response: {}", response.describe());
                None
            }
        }
    }
}

fn fallback_summary(findings: &[String], theme_names: &str) -> String {
    let summary = format!(
        "Executive summary could not be automatically generated. Key findings include: {}. Key suggestion themes: {}.",
        findings.join("; "),
        theme_names
    );
    truncate_chars(&summary, FALLBACK_MAX_CHARS)
}
