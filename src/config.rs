//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.docaudit.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".docaudit.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Model settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Page fetching and extraction settings.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "analysis_report.md".to_string()
}

/// Which LLM provider to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Google Gemini (requires GEMINI_API_KEY)
    #[default]
    Gemini,
    /// Ollama server
    Ollama,
}

impl Provider {
    /// Model used when none is configured for this provider.
    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Gemini => "gemini-2.0-flash",
            Provider::Ollama => "llama3.2:latest",
        }
    }
}

/// LLM model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// LLM provider.
    #[serde(default)]
    pub provider: Provider,

    /// Model name.
    #[serde(default = "default_model")]
    pub name: String,

    /// Ollama API URL.
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    /// Gemini API base URL.
    #[serde(default = "default_gemini_url")]
    pub gemini_url: String,

    /// Temperature for generation.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Attempts per LLM call before giving up.
    #[serde(default = "default_retries")]
    pub retries: usize,

    /// Delay between attempts, in seconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_seconds: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            name: default_model(),
            ollama_url: default_ollama_url(),
            gemini_url: default_gemini_url(),
            temperature: default_temperature(),
            timeout_seconds: default_timeout(),
            retries: default_retries(),
            retry_delay_seconds: default_retry_delay(),
        }
    }
}

fn default_model() -> String {
    Provider::Gemini.default_model().to_string()
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_gemini_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_timeout() -> u64 {
    120
}

fn default_retries() -> usize {
    3
}

fn default_retry_delay() -> u64 {
    5
}

/// Page fetching and content extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// HTTP timeout in seconds.
    #[serde(default = "default_fetch_timeout")]
    pub timeout_seconds: u64,

    /// User-Agent header sent with page requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// CSS selector for the main article element.
    #[serde(default = "default_content_selector")]
    pub content_selector: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_fetch_timeout(),
            user_agent: default_user_agent(),
            content_selector: default_content_selector(),
        }
    }
}

fn default_fetch_timeout() -> u64 {
    60
}

fn default_user_agent() -> String {
    format!(
        "Mozilla/5.0 (compatible; docaudit/{})",
        env!("CARGO_PKG_VERSION")
    )
}

fn default_content_selector() -> String {
    "div.article-body".to_string()
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Number of top suggestions highlighted at the start of the report.
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Include the per-analyzer breakdown section.
    #[serde(default = "default_true")]
    pub include_analysis_details: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            include_analysis_details: true,
        }
    }
}

fn default_top_n() -> usize {
    5
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// Only explicitly provided values override.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(provider) = args.provider {
            // Switching provider without naming a model picks that provider's default
            if provider != self.model.provider && args.model.is_none() {
                self.model.name = provider.default_model().to_string();
            }
            self.model.provider = provider;
        }
        if let Some(ref model) = args.model {
            self.model.name = model.clone();
        }
        if let Some(ref ollama_url) = args.ollama_url {
            self.model.ollama_url = ollama_url.clone();
        }
        if let Some(temperature) = args.temperature {
            self.model.temperature = temperature;
        }
        if let Some(timeout) = args.timeout {
            self.model.timeout_seconds = timeout;
            self.fetch.timeout_seconds = timeout;
        }
        if let Some(retries) = args.retries {
            self.model.retries = retries;
        }
        if let Some(delay) = args.retry_delay {
            self.model.retry_delay_seconds = delay;
        }

        if let Some(ref selector) = args.content_selector {
            self.fetch.content_selector = selector.clone();
        }

        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
        if let Some(top_n) = args.top_n {
            self.report.top_n = top_n;
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::tests::make_args;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.model.provider, Provider::Gemini);
        assert_eq!(config.model.name, "gemini-2.0-flash");
        assert_eq!(config.model.retries, 3);
        assert_eq!(config.report.top_n, 5);
        assert_eq!(config.fetch.content_selector, "div.article-body");
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output = "custom_report.md"
verbose = true

[model]
provider = "ollama"
name = "qwen2.5:14b"
temperature = 0.4

[report]
top_n = 10
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output, "custom_report.md");
        assert!(config.general.verbose);
        assert_eq!(config.model.provider, Provider::Ollama);
        assert_eq!(config.model.name, "qwen2.5:14b");
        assert_eq!(config.model.temperature, 0.4);
        assert_eq!(config.model.retry_delay_seconds, 5);
        assert_eq!(config.report.top_n, 10);
        assert!(config.report.include_analysis_details);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[fetch]\ncontent_selector = \"main\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.fetch.content_selector, "main");
        assert_eq!(config.fetch.timeout_seconds, 60);

        std::fs::write(&path, "[model\nname = ").unwrap();
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_merge_with_args() {
        let mut config = Config::default();
        let mut args = make_args();
        args.model = Some("gemini-1.5-pro".to_string());
        args.retries = Some(5);
        args.top_n = Some(3);
        args.timeout = Some(30);

        config.merge_with_args(&args);

        assert_eq!(config.model.name, "gemini-1.5-pro");
        assert_eq!(config.model.retries, 5);
        assert_eq!(config.model.timeout_seconds, 30);
        assert_eq!(config.fetch.timeout_seconds, 30);
        assert_eq!(config.report.top_n, 3);
        assert_eq!(config.model.temperature, 0.2);
    }

    #[test]
    fn test_provider_switch_picks_default_model() {
        let mut config = Config::default();
        let mut args = make_args();
        args.provider = Some(Provider::Ollama);

        config.merge_with_args(&args);

        assert_eq!(config.model.provider, Provider::Ollama);
        assert_eq!(config.model.name, "llama3.2:latest");
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[model]"));
        assert!(toml_str.contains("[fetch]"));
        assert!(toml_str.contains("[report]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.model.name, "gemini-2.0-flash");
    }
}
