//! SEO Lantern main entry point
//!
//! This is the command-line interface for the SEO Lantern page auditor.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use seo_lantern::config::{load_config_with_hash, Config};
use seo_lantern::output::{format_markdown_report, DEFAULT_MAX_PAGES};
use seo_lantern::{orchestrate_with_cancel, CrawlReport, CrawlRequest, FetchMode};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// SEO Lantern: an on-page SEO auditor
///
/// SEO Lantern crawls same-site pages from a seed URL while respecting
/// robots.txt, and scores every page against a catalog of SEO rules.
#[derive(Parser, Debug)]
#[command(name = "seo-lantern")]
#[command(version = "1.0.0")]
#[command(about = "An on-page SEO auditor", long_about = None)]
struct Cli {
    /// Seed URL to start the audit from
    #[arg(value_name = "URL")]
    url: String,

    /// Maximum number of pages to audit (1-200)
    #[arg(long, default_value_t = DEFAULT_MAX_PAGES)]
    max_pages: u32,

    /// Render pages in a browser through WebDriver
    #[arg(long)]
    js: bool,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Json)]
    format: ReportFormat,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Validate the request and configuration, then exit without crawling
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Json,
    Markdown,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    let mode = if cli.js {
        FetchMode::Rendered
    } else {
        FetchMode::Static
    };
    let request = CrawlRequest::new(&cli.url, cli.max_pages, mode)?;

    if cli.dry_run {
        handle_dry_run(&request, &config)?;
        return Ok(());
    }

    let report = handle_crawl(request, &config).await?;

    let rendered = match cli.format {
        ReportFormat::Json => report.to_json_pretty()?,
        ReportFormat::Markdown => format_markdown_report(&report),
    };

    match &cli.output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            tracing::info!("Report written to: {}", path.display());
        }
        None => println!("{}", rendered),
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr; stdout carries only the report.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("seo_lantern=info,warn"),
            1 => EnvFilter::new("seo_lantern=debug,info"),
            2 => EnvFilter::new("seo_lantern=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows what would be audited
fn handle_dry_run(request: &CrawlRequest, config: &Config) -> anyhow::Result<()> {
    seo_lantern::config::validate(config)?;

    println!("=== SEO Lantern Dry Run ===\n");

    println!("Request:");
    println!("  Seed: {}", request.seed);
    println!("  Max pages: {}", request.max_pages);
    println!("  Mode: {:?}", request.mode);

    println!("\nCrawler Configuration:");
    println!("  Workers: {}", config.crawler.concurrency);
    println!("  Fetch timeout: {}ms", config.crawler.fetch_timeout_ms);
    println!(
        "  Rendered fetch timeout: {}ms",
        config.crawler.rendered_timeout_ms
    );
    println!("  Max body size: {} bytes", config.crawler.max_body_bytes);
    println!("  Run deadline: {}ms", config.crawler.run_deadline_ms);
    println!(
        "  Discovery files: {}",
        config.crawler.check_discovery_files
    );

    println!("\nUser Agent: {}", config.user_agent.header_value());
    if request.mode == FetchMode::Rendered {
        println!("WebDriver: {}", config.renderer.webdriver_url);
    }

    println!("\nPenalties:");
    println!("  critical: {}", config.scoring.critical);
    println!("  warning: {}", config.scoring.warning);
    println!("  info: {}", config.scoring.info);

    let catalog = seo_lantern::rules::default_catalog();
    println!("\nRules ({}):", catalog.len());
    for rule in catalog.rules() {
        println!("  - {} [{}, {}]", rule.id, rule.topic, rule.severity);
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the main audit, cancelling it on Ctrl-C
async fn handle_crawl(request: CrawlRequest, config: &Config) -> anyhow::Result<CrawlReport> {
    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, finishing with partial results");
                cancel.cancel();
            }
        })
    };

    let result = orchestrate_with_cancel(request, config, cancel).await;
    interrupt.abort();

    match result {
        Ok(report) => {
            tracing::info!("Audit completed successfully ({} pages)", report.pages);
            Ok(report)
        }
        Err(e) => {
            tracing::error!("Audit failed: {}", e);
            Err(e.into())
        }
    }
}
