//! docaudit - LLM-powered documentation page auditor
//!
//! A CLI tool that fetches a documentation article, runs it through a set
//! of LLM-backed analyses (readability, structure and flow, completeness and
//! examples, style adherence) and writes a prioritized, themed report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (invalid arguments, missing API key, fetch failure, etc.)

mod analysis;
mod cli;
mod config;
mod content;
mod llm;
mod models;
mod report;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use content::{read_html_file, ContentExtractor, PageFetcher};
use indicatif::{ProgressBar, ProgressStyle};
use llm::{LanguageModel, LlmService};
use models::{Rating, Report, ReportMetadata};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Pick up GEMINI_API_KEY and friends from a local .env file
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    let mut config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(&args, &config);

    info!("docaudit v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    debug!("Configuration: {:?}", config);

    // Run the audit
    if let Err(e) = run_audit(&args, &config).await {
        error!("Audit failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .docaudit.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize the provider, model, content selector, and more.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args, config: &Config) {
    let level = if config.general.verbose && !args.quiet {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the complete audit workflow.
async fn run_audit(args: &Args, config: &Config) -> Result<()> {
    let start_time = Instant::now();
    let source = args.source_label();

    // Step 1: Get the page
    let html = match (&args.html_file, &args.url) {
        (Some(path), _) => {
            println!("📄 Reading HTML file: {}", path.display());
            read_html_file(path)?
        }
        (None, Some(url)) => {
            println!("📥 Fetching page: {}", url);
            let fetcher = PageFetcher::new(&config.fetch)?;
            fetcher.fetch(url).await?
        }
        (None, None) => anyhow::bail!("Either --url or --html-file is required"),
    };

    // Step 2: Extract the article as markdown
    let extractor = ContentExtractor::new(config.fetch.content_selector.clone());
    let content = extractor.extract(&html);
    if content.is_empty() {
        anyhow::bail!("No readable content could be extracted from {}", source);
    }
    let content_chars = content.chars().count();
    println!("   Extracted {} characters of content", content_chars);

    // Handle --dry-run: show the extracted content and exit
    if args.dry_run {
        return handle_dry_run(&content);
    }

    // Step 3: Connect to the model
    let llm = LlmService::from_config(&config.model, args.api_key.clone())?;

    println!("🤖 Initializing LLM service...");
    println!("   Provider: {}", llm.provider());
    println!("   Model: {}", llm.model_name());
    println!("   Timeout: {}s", config.model.timeout_seconds);

    // Step 4: Run the analysis pipeline
    println!("\n🔬 Analyzing documentation...");
    let spinner = create_spinner(args.quiet);

    spinner.set_message("Running readability, structure, completeness and style analyses...");
    let results = analysis::run_all(&llm, &content).await;

    let suggestions = analysis::aggregate(&results);
    info!("Collected {} suggestions", suggestions.len());

    spinner.set_message(format!("Prioritizing {} suggestions...", suggestions.len()));
    let prioritized = analysis::prioritize(&llm, &suggestions).await;

    spinner.set_message("Grouping suggestions into themes...");
    let themes = analysis::group(&llm, &prioritized).await;

    spinner.set_message("Writing executive summary...");
    let summary = analysis::generate_summary(&llm, &results, &themes).await;

    spinner.finish_and_clear();

    // Step 5: Build the report
    println!("\n📝 Generating report...");

    let duration = start_time.elapsed().as_secs_f64();
    let report = Report {
        metadata: ReportMetadata {
            url: source,
            analysis_date: Utc::now(),
            model_used: llm.model_name().to_string(),
            provider: llm.provider().to_string(),
            content_chars,
            total_suggestions: prioritized.len(),
            duration_seconds: duration,
        },
        summary,
        prioritized,
        themes,
        analysis: results,
    };

    // Step 6: Render and save the report
    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report, &config.report),
    };

    let output_path = output_path(args, config);
    report::write_report(&output, &output_path)?;

    if args.stdout {
        println!("\n{}", output);
    }

    // Print summary
    let count = |rating: Rating| {
        report
            .prioritized
            .iter()
            .filter(|s| s.impact == rating)
            .count()
    };

    println!("\n📊 Analysis Summary:");
    println!("   Suggestions: {}", report.prioritized.len());
    println!(
        "   - {} High: {} | {} Medium: {} | {} Low: {} | {} N/A: {}",
        Rating::High.emoji(),
        count(Rating::High),
        Rating::Medium.emoji(),
        count(Rating::Medium),
        Rating::Low.emoji(),
        count(Rating::Low),
        Rating::NotAssessed.emoji(),
        count(Rating::NotAssessed)
    );
    println!("   Themes: {}", report.themes.len());
    println!("   Duration: {:.1}s", duration);
    println!(
        "\n✅ Audit complete! Report saved to: {}",
        output_path.display()
    );

    Ok(())
}

/// Handle --dry-run: print the extracted markdown, no LLM calls.
fn handle_dry_run(content: &str) -> Result<()> {
    println!("\n🔍 Dry run: extracted content (no LLM calls)...\n");
    println!("{}", content);
    println!("\n✅ Dry run complete. No LLM calls were made.");
    Ok(())
}

fn create_spinner(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed}] {msg}") {
        spinner.set_style(style);
    }
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

/// Report path; a JSON report defaults to the configured name with a .json extension.
fn output_path(args: &Args, config: &Config) -> PathBuf {
    let path = PathBuf::from(&config.general.output);
    if args.output.is_none() && args.format == OutputFormat::Json {
        path.with_extension("json")
    } else {
        path
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Ok(Config::default()),
        Err(e) => {
            eprintln!("⚠️  Failed to load {}: {:#}. Using defaults.", CONFIG_FILE_NAME, e);
            Ok(Config::default())
        }
    }
}
