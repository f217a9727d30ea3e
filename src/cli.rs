//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::config::Provider;
use clap::Parser;
use std::path::PathBuf;

/// docaudit - LLM-powered quality auditor for documentation pages
///
/// Fetches a documentation article, reviews it for readability, structure,
/// completeness and style, then writes a prioritized, themed report.
///
/// Examples:
///   docaudit --url https://help.example.com/articles/123
///   docaudit --url https://help.example.com/articles/123 --format json
///   docaudit --provider ollama --model llama3.2:latest --url https://docs.example.com/page
///   docaudit --html-file ./saved_page.html
///   docaudit --url https://docs.example.com/page --dry-run
///   docaudit --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// URL of the documentation page to analyze
    #[arg(
        short,
        long,
        value_name = "URL",
        required_unless_present_any = ["init_config", "html_file"]
    )]
    pub url: Option<String>,

    /// Analyze a saved HTML file instead of fetching a URL
    #[arg(long, value_name = "FILE")]
    pub html_file: Option<PathBuf>,

    /// LLM provider (gemini, ollama)
    #[arg(long, value_name = "PROVIDER")]
    pub provider: Option<Provider>,

    /// Model to use for analysis
    ///
    /// Defaults to gemini-2.0-flash for Gemini and llama3.2:latest for Ollama.
    #[arg(short, long, env = "DOCAUDIT_MODEL")]
    pub model: Option<String>,

    /// Gemini API key (also read from GEMINI_API_KEY or a .env file)
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Ollama API endpoint URL
    #[arg(long, env = "OLLAMA_URL")]
    pub ollama_url: Option<String>,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Number of top suggestions to highlight in the report
    #[arg(long, value_name = "COUNT")]
    pub top_n: Option<usize>,

    /// CSS selector for the main article element
    #[arg(long, value_name = "SELECTOR")]
    pub content_selector: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .docaudit.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Temperature for LLM responses (0.0 - 2.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Request timeout in seconds (page fetch and each LLM call)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Attempts per LLM call before falling back
    #[arg(long, value_name = "COUNT")]
    pub retries: Option<usize>,

    /// Delay between LLM attempts in seconds
    #[arg(long, value_name = "SECS")]
    pub retry_delay: Option<u64>,

    /// Dry run: fetch and extract the page, print the markdown, no LLM calls
    #[arg(long)]
    pub dry_run: bool,

    /// Also print the finished report to stdout
    #[arg(long)]
    pub stdout: bool,

    /// Generate a default .docaudit.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Label for the analyzed page: the URL, or the HTML file path.
    pub fn source_label(&self) -> String {
        match (&self.url, &self.html_file) {
            (Some(url), _) => url.clone(),
            (None, Some(path)) => path.display().to_string(),
            (None, None) => String::new(),
        }
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        match (&self.url, &self.html_file) {
            (Some(url), None) => {
                let parsed =
                    url::Url::parse(url).map_err(|e| format!("Invalid URL '{}': {}", url, e))?;
                if parsed.scheme() != "http" && parsed.scheme() != "https" {
                    return Err("URL must start with 'http://' or 'https://'".to_string());
                }
            }
            (_, Some(path)) => {
                if !path.is_file() {
                    return Err(format!("HTML file does not exist: {}", path.display()));
                }
            }
            (None, None) => return Err("Either --url or --html-file is required".to_string()),
        }

        if let Some(ref ollama_url) = self.ollama_url {
            if !ollama_url.starts_with("http://") && !ollama_url.starts_with("https://") {
                return Err("Ollama URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err("Temperature must be between 0.0 and 2.0".to_string());
            }
        }

        if self.retries == Some(0) {
            return Err("Retries must be at least 1".to_string());
        }

        if self.top_n == Some(0) {
            return Err("Top-N must be at least 1".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn make_args() -> Args {
        Args {
            url: Some("https://help.example.com/articles/42".to_string()),
            html_file: None,
            provider: None,
            model: None,
            api_key: None,
            ollama_url: None,
            output: None,
            format: OutputFormat::Markdown,
            top_n: None,
            content_selector: None,
            config: None,
            verbose: false,
            quiet: false,
            temperature: None,
            timeout: None,
            retries: None,
            retry_delay: None,
            dry_run: false,
            stdout: false,
            init_config: false,
        }
    }

    #[test]
    fn test_valid_args() {
        assert!(make_args().validate().is_ok());
    }

    #[test]
    fn test_validation_invalid_url() {
        let mut args = make_args();
        args.url = Some("help.example.com/articles".to_string());
        assert!(args.validate().is_err());

        args.url = Some("ftp://example.com/doc".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_missing_html_file() {
        let mut args = make_args();
        args.url = None;
        args.html_file = Some(PathBuf::from("/nonexistent/page.html"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_html_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut args = make_args();
        args.url = None;
        args.html_file = Some(file.path().to_path_buf());
        assert!(args.validate().is_ok());
        assert_eq!(args.source_label(), file.path().display().to_string());
    }

    #[test]
    fn test_validation_ranges() {
        let mut args = make_args();
        args.temperature = Some(2.5);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.retries = Some(0);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.top_n = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_parse_from_command_line() {
        let args = Args::try_parse_from([
            "docaudit",
            "--url",
            "https://docs.example.com/page",
            "--provider",
            "ollama",
            "--format",
            "json",
            "--top-n",
            "3",
        ])
        .unwrap();

        assert_eq!(args.provider, Some(Provider::Ollama));
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.top_n, Some(3));
    }
}
