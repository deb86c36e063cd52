//! Site-Audit main entry point
//!
//! This is the command-line interface for the Site-Audit website diagnostic.

use anyhow::{bail, Context};
use clap::Parser;
use site_audit::config::{load_config_with_hash, validate_crawl_config, Config};
use site_audit::output::{format_history, format_json_report, load_report, write_markdown_report};
use site_audit::scoring::{ChatCompletionScorer, ScoreSource};
use site_audit::storage::{SqliteStorage, Storage};
use site_audit::{AuditPipeline, AuditRequest, AuditRun, AuditStatus, BusinessProfile};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Site-Audit: diagnose the marketing and SEO health of a business website
///
/// Site-Audit crawls the site politely within a fixed budget, scores it with
/// an AI model when one is configured (falling back to crawl-based scores
/// otherwise), and records every finding with its evidence.
#[derive(Parser, Debug)]
#[command(name = "site-audit")]
#[command(version)]
#[command(about = "Crawl a business website and score its SEO health", long_about = None)]
struct Cli {
    /// Root URL of the website to audit
    #[arg(value_name = "URL", required_unless_present = "history")]
    url: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Maximum number of pages to crawl
    #[arg(long)]
    max_pages: Option<usize>,

    /// Pages fetched in parallel
    #[arg(long)]
    concurrency: Option<usize>,

    /// Pause between batches in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Per-request timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Wall-clock budget for the whole crawl in milliseconds
    #[arg(long)]
    total_timeout_ms: Option<u64>,

    /// Business name shown to the AI scorer
    #[arg(long)]
    name: Option<String>,

    /// Social profile URL (repeatable)
    #[arg(long = "social", value_name = "URL")]
    social: Vec<String>,

    /// Google Business profile URL
    #[arg(long, value_name = "URL")]
    google_business: Option<String>,

    /// Review site profile URL (repeatable)
    #[arg(long = "review", value_name = "URL")]
    review: Vec<String>,

    /// Write the markdown report to the configured report path
    #[arg(long)]
    report: bool,

    /// Print the run and its findings as JSON
    #[arg(long)]
    json: bool,

    /// List recent audits from the database and exit
    #[arg(long, conflicts_with = "url")]
    history: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let (mut config, config_hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (cfg, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        None => (Config::default(), String::new()),
    };

    if cli.history {
        return handle_history(&config);
    }

    apply_overrides(&mut config, &cli);
    validate_crawl_config(&config.crawler)?;

    let Some(url) = cli.url.clone() else {
        bail!("a website URL is required");
    };

    handle_audit(config, config_hash, url, &cli).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_audit=info,warn"),
            1 => EnvFilter::new("site_audit=debug,info"),
            2 => EnvFilter::new("site_audit=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Command-line flags win over the config file
fn apply_overrides(config: &mut Config, cli: &Cli) {
    let crawler = &mut config.crawler;
    if let Some(n) = cli.max_pages {
        crawler.max_pages = n;
    }
    if let Some(n) = cli.concurrency {
        crawler.concurrency = n;
    }
    if let Some(ms) = cli.delay_ms {
        crawler.delay_ms = ms;
    }
    if let Some(ms) = cli.timeout_ms {
        crawler.timeout_ms = ms;
    }
    if let Some(ms) = cli.total_timeout_ms {
        crawler.total_timeout_ms = ms;
    }
}

fn open_storage(config: &Config) -> anyhow::Result<SqliteStorage> {
    let path = Path::new(&config.output.database_path);
    SqliteStorage::new(path).with_context(|| format!("failed to open database {}", path.display()))
}

/// Handles --history: lists recent runs and exits
fn handle_history(config: &Config) -> anyhow::Result<()> {
    let storage = open_storage(config)?;
    let runs = storage.latest_runs(20)?;
    print!("{}", format_history(&runs));
    Ok(())
}

/// Runs one audit and prints the result
async fn handle_audit(
    config: Config,
    config_hash: String,
    url: String,
    cli: &Cli,
) -> anyhow::Result<()> {
    let storage = open_storage(&config)?;
    let mut pipeline = AuditPipeline::new(storage);

    match config.scoring.clone().unwrap_or_default().resolve() {
        Some(settings) => {
            tracing::info!("AI scoring enabled ({})", settings.model);
            pipeline = pipeline.with_provider(Box::new(ChatCompletionScorer::new(&settings)?));
        }
        None => tracing::warn!("No AI API key configured; scores will be computed from crawl data"),
    }

    let mut business = BusinessProfile::new(url.clone());
    business.name = cli.name.clone();
    business.social_profile_urls = cli.social.clone();
    business.google_business_url = cli.google_business.clone();
    business.review_profile_urls = cli.review.clone();

    let request = AuditRequest {
        root_url: url,
        business,
        crawl: config.crawler.clone(),
        user_agent: config.user_agent.clone(),
        config_hash,
    };

    let run = pipeline.run(request).await?;
    let report = load_report(pipeline.storage(), run.id)?;

    if cli.report {
        let path = Path::new(&config.output.report_path);
        write_markdown_report(&report.run, &report.findings, path)?;
        tracing::info!("Report written to {}", path.display());
    }

    if cli.json {
        println!("{}", format_json_report(&report)?);
    } else {
        print_summary(&run, report.findings.len());
    }

    if run.status == AuditStatus::Failed {
        std::process::exit(1);
    }
    Ok(())
}

fn print_summary(run: &AuditRun, findings: usize) {
    println!("\n=== Site Audit #{} ===", run.id);
    println!("URL:    {}", run.root_url);
    println!("Status: {}", run.status.to_db_string());

    if let Some(reason) = &run.failure_reason {
        println!("\n{}", reason);
        return;
    }

    if let Some(scores) = &run.scores {
        let source = match run.score_source {
            Some(ScoreSource::Ai) => "AI",
            _ => "crawl data",
        };
        println!("\nScores (from {}):", source);
        println!("  Overall:    {}", scores.overall_score);
        println!("  Website:    {}", scores.website_score);
        println!("  SEO:        {}", scores.seo_score);
        println!("  Social:     {}", scores.social_score);
        println!("  Offer:      {}", scores.offer_score);
        println!("  Reputation: {}", scores.reputation_score);
        println!("  Local:      {}", scores.local_score);
        println!("\n{}", scores.root_cause_summary);
    }

    if let Some(stats) = &run.crawl_stats {
        println!(
            "\nCrawled {} page(s) in {:.1}s; stopped: {}",
            stats.pages_crawled,
            stats.duration_ms as f64 / 1000.0,
            stats.stop_reason.describe()
        );
    }
    println!("Findings: {}", findings);
}
