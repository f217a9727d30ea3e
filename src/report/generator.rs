//! Markdown and JSON report generation.
//!
//! This module renders the finished [`Report`] for humans (Markdown) or
//! for other tools (JSON).

use crate::config::ReportConfig;
use crate::models::{display_name, AnalysisResults, Report, ReportMetadata, Suggestion, ThemeGroups};
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report, options: &ReportConfig) -> String {
    let mut output = String::new();

    // Title
    output.push_str("# Documentation Analysis Report\n\n");

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_summary_section(&report.summary));
    output.push_str(&generate_top_suggestions_section(
        &report.prioritized,
        options.top_n,
    ));

    if options.include_analysis_details {
        output.push_str(&generate_analysis_section(&report.analysis));
    }

    output.push_str(&generate_themes_section(&report.themes, &report.prioritized));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str(&format!("- **URL Analyzed:** {}\n", metadata.url));
    section.push_str(&format!(
        "- **Report Generated:** {}\n",
        metadata.analysis_date.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Model Used:** `{}` ({})\n",
        metadata.model_used, metadata.provider
    ));
    section.push_str(&format!(
        "- **Content Length:** {} characters\n",
        metadata.content_chars
    ));
    section.push_str(&format!(
        "- **Total Suggestions:** {}\n",
        metadata.total_suggestions
    ));
    section.push_str(&format!(
        "- **Analysis Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push_str("\n---\n\n");

    section
}

fn generate_summary_section(summary: &str) -> String {
    format!("## Executive Summary\n\n{}\n\n---\n\n", summary)
}

/// Generate the highlighted top-N list.
fn generate_top_suggestions_section(prioritized: &[Suggestion], top_n: usize) -> String {
    let mut section = String::new();

    section.push_str(&format!(
        "## Top {} Actionable Suggestions (Prioritized)\n\n",
        top_n
    ));

    if prioritized.is_empty() {
        section.push_str("No suggestions were generated.\n");
    } else {
        let top = &prioritized[..top_n.min(prioritized.len())];
        section.push_str(&generate_suggestion_list(top));
    }
    section.push_str("\n---\n\n");

    section
}

/// Generate the per-analyzer breakdown.
fn generate_analysis_section(analysis: &AnalysisResults) -> String {
    let mut section = String::new();

    section.push_str("## Detailed Analysis Breakdown\n\n");

    for (name, result) in analysis.iter() {
        section.push_str(&format!("### {}\n\n", display_name(name)));
        section.push_str(&format!("**Assessment:** {}\n\n", result.assessment));

        if !result.positive_feedback.is_empty() {
            section.push_str(&format!(
                "**Positive Feedback:** {}\n\n",
                result.positive_feedback
            ));
        }

        let extras = [
            ("Potential Persona Pain Points", &result.persona_pain_points),
            ("Quantified Issues", &result.quantified_issues),
            ("Snippet-Specific Feedback", &result.snippet_specific_feedback),
        ];
        for (label, value) in extras {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                section.push_str(&format!("**{}:** {}\n\n", label, value));
            }
        }

        if !result.suggestions.is_empty() {
            section.push_str("**Suggestions:**\n\n");
            for entry in &result.suggestions {
                section.push_str(&format!("- {}\n", entry));
            }
            section.push('\n');
        }
    }

    section.push_str("---\n\n");

    section
}

/// Generate the themed listing, or the flat list when grouping produced nothing.
fn generate_themes_section(themes: &ThemeGroups, prioritized: &[Suggestion]) -> String {
    let mut section = String::new();

    section.push_str("## All Suggestions by Theme (Prioritized)\n\n");

    if themes.is_empty() {
        section.push_str("Suggestions could not be grouped thematically.\n\n");
        if prioritized.is_empty() {
            section.push_str("No suggestions available.\n\n");
        } else {
            section.push_str("**Full Prioritized List:**\n\n");
            section.push_str(&generate_suggestion_list(prioritized));
            section.push('\n');
        }
        return section;
    }

    for theme in themes.iter() {
        section.push_str(&format!("### {}\n\n", theme.name));
        section.push_str(&generate_suggestion_list(&theme.suggestions));
        section.push('\n');
    }

    section
}

/// Numbered suggestion list with ratings.
fn generate_suggestion_list(suggestions: &[Suggestion]) -> String {
    let mut list = String::new();

    for (i, suggestion) in suggestions.iter().enumerate() {
        list.push_str(&format!("{}. **{}**\n", i + 1, suggestion.text));
        list.push_str(&format!(
            "   - *Impact:* {} {}, *Difficulty:* {}, *Source:* {}\n",
            suggestion.impact.emoji(),
            suggestion.impact,
            suggestion.difficulty,
            suggestion.source
        ));
    }

    list
}

/// Generate the report footer.
fn generate_footer() -> String {
    format!(
        "---\n\n*Report generated by docaudit v{}*\n",
        env!("CARGO_PKG_VERSION")
    )
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write rendered report content to a file.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create report file: {}", path.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write report to {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalysisResult, Rating};
    use chrono::Utc;

    fn create_test_report() -> Report {
        let prioritized = vec![
            Suggestion::new("Add a code example", "Completeness Examples")
                .with_ratings(Rating::High, Rating::Medium),
            Suggestion::new("Shorten the intro", "Readability")
                .with_ratings(Rating::Medium, Rating::Low),
            Suggestion::new("Use active voice", "Style Adherence"),
        ];

        let mut themes = ThemeGroups::new();
        themes.push("Examples", prioritized[0].clone());
        themes.push("Clarity", prioritized[1].clone());
        themes.push("Clarity", prioritized[2].clone());

        let mut readability = AnalysisResult::with_suggestions("Clear enough.", &["Shorten the intro"]);
        readability.positive_feedback = "Friendly tone.".to_string();
        readability.persona_pain_points = Some("Webhook jargon".to_string());
        let mut analysis = AnalysisResults::new();
        analysis.insert("readability", readability);
        analysis.insert(
            "structure_flow",
            AnalysisResult::with_assessment("Structure/Flow analysis could not be performed."),
        );

        Report {
            metadata: ReportMetadata {
                url: "https://help.example.com/articles/42".to_string(),
                analysis_date: Utc::now(),
                model_used: "gemini-2.0-flash".to_string(),
                provider: "gemini".to_string(),
                content_chars: 1234,
                total_suggestions: prioritized.len(),
                duration_seconds: 12.5,
            },
            summary: "Readable page that needs examples.".to_string(),
            prioritized,
            themes,
            analysis,
        }
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report();
        let markdown = generate_markdown_report(&report, &ReportConfig::default());

        assert!(markdown.starts_with("# Documentation Analysis Report"));
        assert!(markdown.contains("**URL Analyzed:** https://help.example.com/articles/42"));
        assert!(markdown.contains("## Executive Summary\n\nReadable page that needs examples."));
        assert!(markdown.contains("## Top 5 Actionable Suggestions (Prioritized)"));
        assert!(markdown.contains("1. **Add a code example**"));
        assert!(markdown.contains(
            "   - *Impact:* 🔴 High, *Difficulty:* Medium, *Source:* Completeness Examples"
        ));
        assert!(markdown.contains("### Structure Flow"));
        assert!(markdown.contains("**Potential Persona Pain Points:** Webhook jargon"));
        assert!(markdown.contains("### Clarity\n\n1. **Shorten the intro**"));
        assert!(markdown.contains("2. **Use active voice**"));
    }

    #[test]
    fn test_top_n_limits_highlighted_suggestions() {
        let report = create_test_report();
        let section = generate_top_suggestions_section(&report.prioritized, 2);

        assert!(section.contains("## Top 2 Actionable"));
        assert!(section.contains("2. **Shorten the intro**"));
        assert!(!section.contains("Use active voice"));
    }

    #[test]
    fn test_analysis_details_can_be_omitted() {
        let report = create_test_report();
        let options = ReportConfig {
            include_analysis_details: false,
            ..Default::default()
        };

        let markdown = generate_markdown_report(&report, &options);
        assert!(!markdown.contains("## Detailed Analysis Breakdown"));
        assert!(markdown.contains("## All Suggestions by Theme"));
    }

    #[test]
    fn test_ungrouped_report_lists_everything() {
        let report = create_test_report();

        let section = generate_themes_section(&ThemeGroups::new(), &report.prioritized);
        assert!(section.contains("Suggestions could not be grouped thematically."));
        assert!(section.contains("3. **Use active voice**"));

        let section = generate_themes_section(&ThemeGroups::new(), &[]);
        assert!(section.contains("No suggestions available."));
        assert!(generate_top_suggestions_section(&[], 5).contains("No suggestions were generated."));
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report();
        let json = generate_json_report(&report).unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["prioritized"][2]["impact"], "N/A");
        assert_eq!(value["themes"]["Clarity"][0]["text"], "Shorten the intro");
        assert_eq!(
            value["analysis"]["readability"]["suggestions"][0],
            "Shorten the intro"
        );
        assert!(json.find("\"Examples\"").unwrap() < json.find("\"Clarity\"").unwrap());
    }

    #[test]
    fn test_write_report() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("report.md");

        write_report("# Report\n", &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# Report\n");

        assert!(write_report("x", &dir.path().join("missing/report.md")).is_err());
    }
}
