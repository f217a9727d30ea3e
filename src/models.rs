//! Data models for the documentation auditor.
//!
//! This module contains the records that flow through the pipeline:
//! analyzer output, suggestions with their ratings, theme groups, and
//! the final report.

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Source label given to suggestions the LLM returned with altered text.
pub const MAPPING_FAILED_SOURCE: &str = "Unknown (Mapping Failed)";

/// Impact or difficulty rating assigned by the prioritizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Rating {
    High,
    Medium,
    Low,
    /// Not scored (yet, or the LLM failed to score it).
    #[default]
    #[serde(rename = "N/A")]
    NotAssessed,
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rating::High => write!(f, "High"),
            Rating::Medium => write!(f, "Medium"),
            Rating::Low => write!(f, "Low"),
            Rating::NotAssessed => write!(f, "N/A"),
        }
    }
}

impl From<&str> for Rating {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "high" => Rating::High,
            "medium" => Rating::Medium,
            "low" => Rating::Low,
            _ => Rating::NotAssessed,
        }
    }
}

impl Rating {
    /// Sort rank used when ordering by impact (lower sorts first).
    pub fn rank(&self) -> u8 {
        match self {
            Rating::High => 0,
            Rating::Medium => 1,
            Rating::Low => 2,
            Rating::NotAssessed => 3,
        }
    }

    /// Returns an emoji representation of the rating.
    pub fn emoji(&self) -> &'static str {
        match self {
            Rating::High => "🔴",
            Rating::Medium => "🟡",
            Rating::Low => "🟢",
            Rating::NotAssessed => "⚪",
        }
    }

    /// Reads a rating out of an optional JSON value, defaulting to N/A.
    pub fn from_json(value: Option<&Value>) -> Self {
        value
            .and_then(|v| v.as_str())
            .map(Rating::from)
            .unwrap_or_default()
    }
}

/// A single actionable recommendation plus its scoring metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    /// The recommendation text. Stages match suggestions on this field.
    pub text: String,
    /// Display name of the analyzer that produced it.
    pub source: String,
    #[serde(default)]
    pub impact: Rating,
    #[serde(default)]
    pub difficulty: Rating,
}

impl Suggestion {
    /// Creates an unscored suggestion.
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
            impact: Rating::NotAssessed,
            difficulty: Rating::NotAssessed,
        }
    }

    /// Returns a copy with both ratings set.
    pub fn with_ratings(mut self, impact: Rating, difficulty: Rating) -> Self {
        self.impact = impact;
        self.difficulty = difficulty;
        self
    }
}

/// One element of an analyzer's `suggestions` list, as the LLM returned it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SuggestionEntry {
    /// Plain suggestion text (the common case).
    Text(String),
    /// A partially formed suggestion record.
    Partial {
        #[serde(rename = "suggestion", alias = "text")]
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        impact: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        difficulty: Option<String>,
    },
    /// Anything else; kept so the aggregator can report it.
    Unrecognized(Value),
}

impl fmt::Display for SuggestionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuggestionEntry::Text(text) | SuggestionEntry::Partial { text, .. } => {
                write!(f, "{}", text)
            }
            SuggestionEntry::Unrecognized(value) => write!(f, "{}", value),
        }
    }
}

/// Structured assessment produced by one analyzer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub assessment: String,
    #[serde(default)]
    pub suggestions: Vec<SuggestionEntry>,
    #[serde(default)]
    pub positive_feedback: String,
    /// Readability only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona_pain_points: Option<String>,
    /// Structure/flow only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantified_issues: Option<String>,
    /// Style adherence only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet_specific_feedback: Option<String>,
}

impl AnalysisResult {
    /// Creates a result carrying only an assessment and no suggestions.
    pub fn with_assessment(assessment: impl Into<String>) -> Self {
        Self {
            assessment: assessment.into(),
            ..Default::default()
        }
    }

    /// Creates a result from plain suggestion strings.
    #[cfg(test)]
    pub fn with_suggestions(assessment: &str, suggestions: &[&str]) -> Self {
        Self {
            assessment: assessment.to_string(),
            suggestions: suggestions
                .iter()
                .map(|s| SuggestionEntry::Text(s.to_string()))
                .collect(),
            ..Default::default()
        }
    }
}

/// Analyzer results keyed by analyzer name, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisResults {
    entries: Vec<(String, AnalysisResult)>,
}

impl AnalysisResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a result, replacing any earlier result under the same key in place.
    pub fn insert(&mut self, name: impl Into<String>, result: AnalysisResult) {
        let name = name.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => *existing = result,
            None => self.entries.push((name, result)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&AnalysisResult> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, result)| result)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AnalysisResult)> {
        self.entries.iter().map(|(key, result)| (key.as_str(), result))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for AnalysisResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, result) in &self.entries {
            map.serialize_entry(name, result)?;
        }
        map.end()
    }
}

/// A named cluster of suggestions.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub name: String,
    pub suggestions: Vec<Suggestion>,
}

/// Theme name to suggestions, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThemeGroups {
    themes: Vec<Theme>,
}

impl ThemeGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a suggestion to the named theme, creating the theme if needed.
    pub fn push(&mut self, theme: &str, suggestion: Suggestion) {
        match self.themes.iter_mut().find(|t| t.name == theme) {
            Some(existing) => existing.suggestions.push(suggestion),
            None => self.themes.push(Theme {
                name: theme.to_string(),
                suggestions: vec![suggestion],
            }),
        }
    }

    /// Groups suggestions by their `source` field, preserving first-seen order.
    pub fn by_source(suggestions: &[Suggestion]) -> Self {
        let mut groups = Self::new();
        for suggestion in suggestions {
            groups.push(&suggestion.source, suggestion.clone());
        }
        groups
    }

    pub fn get(&self, theme: &str) -> Option<&[Suggestion]> {
        self.themes
            .iter()
            .find(|t| t.name == theme)
            .map(|t| t.suggestions.as_slice())
    }

    pub fn names(&self) -> Vec<&str> {
        self.themes.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Theme> {
        self.themes.iter()
    }

    pub fn len(&self) -> usize {
        self.themes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.themes.is_empty()
    }

    /// Total number of suggestions across all themes.
    pub fn suggestion_count(&self) -> usize {
        self.themes.iter().map(|t| t.suggestions.len()).sum()
    }
}

impl Serialize for ThemeGroups {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.themes.len()))?;
        for theme in &self.themes {
            map.serialize_entry(&theme.name, &theme.suggestions)?;
        }
        map.end()
    }
}

/// Metadata about the audit report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    /// URL (or file path) of the analyzed page.
    pub url: String,
    /// Date and time of the analysis.
    pub analysis_date: DateTime<Utc>,
    /// Name of the LLM model used.
    pub model_used: String,
    /// LLM provider backing the model.
    pub provider: String,
    /// Length of the extracted markdown, in characters.
    pub content_chars: usize,
    /// Number of suggestions after prioritization.
    pub total_suggestions: usize,
    /// Duration of the analysis in seconds.
    pub duration_seconds: f64,
}

/// The complete documentation audit report.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    /// Executive summary.
    pub summary: String,
    /// Suggestions sorted by impact.
    pub prioritized: Vec<Suggestion>,
    /// Suggestions grouped by theme.
    pub themes: ThemeGroups,
    /// Raw per-analyzer results.
    pub analysis: AnalysisResults,
}

/// Turns an analyzer key such as `structure_flow` into `Structure Flow`.
pub fn display_name(analyzer: &str) -> String {
    analyzer
        .replace('_', " ")
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
