//! Crawler module for fetching, parsing and auditing pages
//!
//! This module contains the core crawling logic, including:
//! - The `Fetcher` interface with plain HTTP and rendered backends
//! - HTML parsing into a `PageDocument`
//! - The shared frontier and the worker pool that drains it
//! - Site-level discovery checks
//! - The `orchestrate` entry points

mod coordinator;
mod discovery;
mod fetcher;
mod frontier;
mod parser;
mod renderer;

pub use coordinator::Coordinator;
pub use discovery::{
    check_discovery_files, DISCOVERY_AI_TXT_MISSING, DISCOVERY_LLMS_TXT_MISSING,
    ROBOTS_TXT_MISSING,
};
pub use fetcher::{build_http_client, build_page_client, Fetcher, HttpFetcher, RawResponse};
pub use frontier::{EnqueueOutcome, Frontier, Job};
pub use parser::parse_document;
pub use renderer::RenderedFetcher;

pub(crate) use parser::charset_param;

use crate::config::{validate, Config};
use crate::output::{CrawlReport, CrawlRequest, FetchMode};
use crate::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Runs a complete audit
///
/// This is the main entry point for an audit. It will:
/// 1. Re-validate the request and the configuration
/// 2. Build the HTTP clients and the fetcher for the request's mode
/// 3. Crawl same-site pages up to the page budget
/// 4. Evaluate and score every fetched page
///
/// # Example
///
/// ```no_run
/// use seo_lantern::{orchestrate, Config, CrawlRequest, FetchMode};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let request = CrawlRequest::new("https://example.com", 10, FetchMode::Static)?;
/// let report = orchestrate(request, &Config::default()).await?;
/// println!("{}", report.to_json_pretty()?);
/// # Ok(())
/// # }
/// ```
pub async fn orchestrate(request: CrawlRequest, config: &Config) -> Result<CrawlReport> {
    orchestrate_with_cancel(request, config, CancellationToken::new()).await
}

/// Runs an audit that stops when `cancel` is cancelled
///
/// The configured run deadline cancels a child of `cancel`; the caller's
/// token is never cancelled by the crate. Pages finished before
/// cancellation stay in the report.
pub async fn orchestrate_with_cancel(
    request: CrawlRequest,
    config: &Config,
    cancel: CancellationToken,
) -> Result<CrawlReport> {
    let request = CrawlRequest::new(request.seed.as_str(), request.max_pages, request.mode)?;
    validate(config)?;

    let client = build_http_client(&config.user_agent)?;
    let http = HttpFetcher::new(build_page_client(&config.user_agent)?, &config.crawler);
    let fetcher: Arc<dyn Fetcher> = match request.mode {
        FetchMode::Static => Arc::new(http),
        FetchMode::Rendered => Arc::new(RenderedFetcher::new(
            &config.renderer,
            &config.crawler,
            http,
        )),
    };

    let run_token = cancel.child_token();
    let deadline = (config.crawler.run_deadline_ms > 0).then(|| {
        let token = run_token.clone();
        let limit = Duration::from_millis(config.crawler.run_deadline_ms);
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(limit) => {
                    tracing::warn!("Run deadline of {:?} reached", limit);
                    token.cancel();
                }
                _ = token.cancelled() => {}
            }
        })
    });

    let coordinator = Coordinator::new(
        request,
        Arc::new(config.clone()),
        fetcher,
        client,
        run_token,
    );
    let report = coordinator.run().await;

    if let Some(deadline) = deadline {
        deadline.abort();
    }

    report
}

/// Runs an audit on a fresh Tokio runtime and blocks until it finishes
///
/// For callers without an async context. Must not be called from inside a
/// Tokio runtime.
pub fn orchestrate_blocking(request: CrawlRequest, config: &Config) -> Result<CrawlReport> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(orchestrate(request, config))
}
