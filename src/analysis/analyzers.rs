//! Content analyzers.
//!
//! Each analyzer sends one fixed prompt about the page content to the
//! language model and decodes the reply into an [`AnalysisResult`].
//! Analyzers never fail: a missing or malformed reply yields a
//! default-filled result.

use crate::llm::{LanguageModel, LlmResponse};
use crate::models::{AnalysisResult, AnalysisResults, SuggestionEntry};
use serde_json::{Map, Value};
use tracing::{info, warn};

const MISSING_ASSESSMENT: &str = "Analysis failed or format incorrect.";

/// The four documentation quality analyses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalyzerKind {
    Readability,
    StructureFlow,
    CompletenessExamples,
    StyleAdherence,
}

impl AnalyzerKind {
    /// All analyzers, in the order they run.
    pub const ALL: [AnalyzerKind; 4] = [
        AnalyzerKind::Readability,
        AnalyzerKind::StructureFlow,
        AnalyzerKind::CompletenessExamples,
        AnalyzerKind::StyleAdherence,
    ];

    /// Key used in [`AnalysisResults`].
    pub fn key(&self) -> &'static str {
        match self {
            AnalyzerKind::Readability => "readability",
            AnalyzerKind::StructureFlow => "structure_flow",
            AnalyzerKind::CompletenessExamples => "completeness_examples",
            AnalyzerKind::StyleAdherence => "style_adherence",
        }
    }

    /// Human-readable label for log lines.
    pub fn label(&self) -> &'static str {
        match self {
            AnalyzerKind::Readability => "Readability",
            AnalyzerKind::StructureFlow => "Structure/Flow",
            AnalyzerKind::CompletenessExamples => "Completeness/Examples",
            AnalyzerKind::StyleAdherence => "Style Adherence",
        }
    }

    /// The analyzer-specific JSON field, if any.
    fn extra_field(&self) -> Option<&'static str> {
        match self {
            AnalyzerKind::Readability => Some("persona_pain_points"),
            AnalyzerKind::StructureFlow => Some("quantified_issues"),
            AnalyzerKind::CompletenessExamples => None,
            AnalyzerKind::StyleAdherence => Some("snippet_specific_feedback"),
        }
    }

    fn instructions(&self) -> &'static str {
        match self {
            AnalyzerKind::Readability => {
                r#"Review the documentation below strictly as a non-technical marketer would read it, and judge its readability for that reader. Provide:
1. A short overall assessment (1-2 sentences) explaining why the text is or is not readable for this persona.
2. Specific, actionable suggestions, quoting sentences or phrases where possible. Focus on clarity, sentence structure and reducing jargon.
3. Positive feedback about what already reads well.
4. Persona pain points: passages likely to confuse or frustrate a marketer.

Reply with a JSON object with keys "assessment" (string), "suggestions" (list of strings), "positive_feedback" (string) and "persona_pain_points" (string)."#
            }
            AnalyzerKind::StructureFlow => {
                r#"Review the structure and logical flow of the documentation below. Consider heading and subheading usage, paragraph length and focus, use of lists, and whether information progresses logically so readers can find what they need. Provide:
1. A short overall assessment (1-2 sentences) of structure and flow.
2. Specific, actionable suggestions about headings, paragraphs, lists, ordering and navigation.
3. Positive feedback about the structure.
4. Quantified issues you observed (for example, the number of overlong paragraphs).

Reply with a JSON object with keys "assessment" (string), "suggestions" (list of strings), "positive_feedback" (string) and "quantified_issues" (string)."#
            }
            AnalyzerKind::CompletenessExamples => {
                r#"Review the documentation below for completeness of information and for the quality and sufficiency of its examples. Consider whether a reader could understand and apply the feature from this page alone, whether the examples are clear and relevant, where information is incomplete or ambiguous, and where an example would help most. Provide:
1. A short overall assessment (1-2 sentences) of completeness and example usage.
2. Specific, actionable suggestions: missing details to add or concrete examples to include (for example "Add an example showing how to configure X").
3. Positive feedback about completeness or the existing examples.

Reply with a JSON object with keys "assessment" (string), "suggestions" (list of strings) and "positive_feedback" (string)."#
            }
            AnalyzerKind::StyleAdherence => {
                r#"Review the documentation below against these style guidelines:
- Voice and tone: customer-focused, clear and concise.
- Clarity and conciseness: no needlessly complex sentences or jargon.
- Action-oriented language: tells the reader what to do.
Provide:
1. A short overall assessment (1-2 sentences) of adherence to these guidelines.
2. Specific, actionable suggestions quoting sentences or phrases where possible.
3. Positive feedback about the style.
4. One or two snippet-specific compliments (for example "The call to action in step 3 is effective").

Reply with a JSON object with keys "assessment" (string), "suggestions" (list of strings), "positive_feedback" (string) and "snippet_specific_feedback" (string)."#
            }
        }
    }

    /// Builds the full prompt for `content`.
    pub fn prompt(&self, content: &str) -> String {
        format!(
            "{}\n\nContent to analyze:\n---\n{}\n---\n",
            self.instructions(),
            content
        )
    }

    /// Runs this analysis. Never fails.
    pub async fn analyze(&self, llm: &dyn LanguageModel, content: &str) -> AnalysisResult {
        match llm.query(&self.prompt(content)).await {
            Ok(LlmResponse::Structured(Value::Object(map))) => self.decode(&map),
            Ok(other) => {
                warn!(
                    "{} analysis returned an unexpected format: {}",
                    self.label(),
                    other.describe()
                );
                self.unavailable()
            }
            Err(e) => {
                warn!("{} analysis failed: {}", self.label(), e);
                self.unavailable()
            }
        }
    }

    fn decode(&self, map: &Map<String, Value>) -> AnalysisResult {
        let suggestions = match map.get("suggestions") {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    serde_json::from_value(item.clone())
                        .unwrap_or_else(|_| SuggestionEntry::Unrecognized(item.clone()))
                })
                .collect(),
            None | Some(Value::Null) => Vec::new(),
            Some(other) => {
                warn!(
                    "Suggestions from {} are not a list: {}",
                    self.label(),
                    other
                );
                Vec::new()
            }
        };

        let extra = self
            .extra_field()
            .and_then(|field| text_field(map, field))
            .filter(|text| !text.is_empty());

        let mut result = AnalysisResult {
            assessment: text_field(map, "assessment")
                .filter(|text| !text.is_empty())
                .unwrap_or_else(|| MISSING_ASSESSMENT.to_string()),
            suggestions,
            positive_feedback: text_field(map, "positive_feedback").unwrap_or_default(),
            ..Default::default()
        };

        match self {
            AnalyzerKind::Readability => result.persona_pain_points = extra,
            AnalyzerKind::StructureFlow => result.quantified_issues = extra,
            AnalyzerKind::StyleAdherence => result.snippet_specific_feedback = extra,
            AnalyzerKind::CompletenessExamples => {}
        }

        result
    }

    fn unavailable(&self) -> AnalysisResult {
        AnalysisResult::with_assessment(format!(
            "{} analysis could not be performed.",
            self.label()
        ))
    }
}

/// Reads a free-text field. Lists of strings are joined with "; ".
fn text_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.trim().to_string()),
        Value::Array(items) => Some(
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.trim().to_string(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join("; "),
        ),
        other => Some(other.to_string()),
    }
}

/// Runs every analyzer over `content`, sequentially, in [`AnalyzerKind::ALL`] order.
pub async fn run_all(llm: &dyn LanguageModel, content: &str) -> AnalysisResults {
    let mut results = AnalysisResults::new();

    for kind in AnalyzerKind::ALL {
        let result = kind.analyze(llm, content).await;
        info!(
            "{} analysis complete ({} suggestions)",
            kind.label(),
            result.suggestions.len()
        );
        results.insert(kind.key(), result);
    }

    results
}
