//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the worker pool that drives one audit run:
//! - Seeding the frontier with the normalized seed URL
//! - Running a bounded number of fetch+parse+evaluate pipelines
//! - Checking robots.txt before any URL is fetched, redirect targets included
//! - Feeding same-site links back into the frontier
//! - Handling cancellation and assembling the final report

use crate::config::Config;
use crate::crawler::discovery::{check_discovery_files, robots_finding};
use crate::crawler::fetcher::{Fetcher, RawResponse};
use crate::crawler::frontier::{EnqueueOutcome, Frontier, Job};
use crate::crawler::parser::parse_document;
use crate::output::{CrawlReport, CrawlRequest, FetchMode, PageResult};
use crate::robots::{self, RobotsCache};
use crate::rules::{default_catalog, evidence, Evidence, Finding, RuleCatalog};
use crate::scoring::{score, PenaltyTable};
use crate::state::UrlState;
use crate::url::{is_same_site, normalize, origin_of};
use crate::{AuditError, FetchError};
use reqwest::Client;
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Redirect hops followed for one page before giving up
const MAX_REDIRECT_HOPS: usize = 10;

/// State shared by every worker of a run
struct WorkerContext {
    seed: Url,
    fetcher: Arc<dyn Fetcher>,
    client: Client,
    frontier: Arc<Frontier>,
    robots: Arc<RobotsCache>,
    catalog: &'static RuleCatalog,
    config: Arc<Config>,
    penalties: PenaltyTable,
    fetch_timeout: Duration,
    robots_timeout: Duration,
    cancel: CancellationToken,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    request: CrawlRequest,
    context: Arc<WorkerContext>,
}

impl Coordinator {
    /// Creates a coordinator for one run
    ///
    /// # Arguments
    ///
    /// * `request` - The validated crawl request
    /// * `config` - The crawler configuration
    /// * `fetcher` - Backend selected from the request's fetch mode
    /// * `client` - Plain HTTP client for robots.txt and discovery files
    /// * `cancel` - Cancelling this token stops dispatching new pages
    pub fn new(
        request: CrawlRequest,
        config: Arc<Config>,
        fetcher: Arc<dyn Fetcher>,
        client: Client,
        cancel: CancellationToken,
    ) -> Self {
        let fetch_timeout = Duration::from_millis(match fetcher.mode() {
            FetchMode::Static => config.crawler.fetch_timeout_ms,
            FetchMode::Rendered => config.crawler.rendered_timeout_ms,
        });

        let context = WorkerContext {
            seed: request.seed.clone(),
            fetcher,
            client,
            frontier: Arc::new(Frontier::new(request.max_pages as usize)),
            robots: Arc::new(RobotsCache::new()),
            catalog: default_catalog(),
            penalties: PenaltyTable::from(&config.scoring),
            fetch_timeout,
            robots_timeout: Duration::from_millis(config.crawler.robots_timeout_ms),
            config,
            cancel,
        };

        Self {
            request,
            context: Arc::new(context),
        }
    }

    /// Runs the crawl to completion or cancellation
    ///
    /// Per-page failures end up in the report. The only run-level failure is
    /// a seed that cannot be connected to at all.
    pub async fn run(self) -> Result<CrawlReport, AuditError> {
        let ctx = &self.context;
        let start_time = Instant::now();
        let origin = origin_of(&ctx.seed);

        tracing::info!(
            "Starting audit of {} (max {} pages, {:?} mode, {} workers)",
            ctx.seed,
            self.request.max_pages,
            ctx.fetcher.mode(),
            ctx.config.crawler.concurrency
        );

        ctx.frontier.try_enqueue(ctx.seed.clone());

        // Cancellation drains the queue; the drained jobs are reported as skipped
        let watcher = {
            let frontier = Arc::clone(&ctx.frontier);
            let cancel = ctx.cancel.clone();
            tokio::spawn(async move {
                cancel.cancelled().await;
                tracing::warn!("Crawl cancelled, abandoning queued pages");
                frontier.cancel()
            })
        };

        let discovery = ctx.config.crawler.check_discovery_files.then(|| {
            let client = ctx.client.clone();
            let origin = origin.clone();
            let timeout = ctx.robots_timeout;
            tokio::spawn(async move { check_discovery_files(&client, &origin, timeout).await })
        });

        let mut workers = JoinSet::new();
        for worker_id in 0..ctx.config.crawler.concurrency {
            let ctx = Arc::clone(&self.context);
            workers.spawn(async move { worker_loop(worker_id, ctx).await });
        }

        let mut results: Vec<(usize, PageResult)> = Vec::new();
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(mut pages) => results.append(&mut pages),
                Err(e) => tracing::error!("Worker task failed: {}", e),
            }
        }

        if ctx.cancel.is_cancelled() {
            match watcher.await {
                Ok(skipped) => results.extend(skipped.into_iter().map(|job| {
                    (
                        job.seq,
                        PageResult::skipped(&job.url, FetchError::Cancelled.kind(), cancelled_evidence()),
                    )
                })),
                Err(e) => tracing::error!("Cancellation watcher failed: {}", e),
            }
        } else {
            watcher.abort();
        }

        ctx.fetcher.shutdown().await;

        results.sort_by_key(|(seq, _)| *seq);

        if let Some((_, seed)) = results.first().filter(|(seq, _)| *seq == 0) {
            if let Some(error) = seed.error.as_ref().filter(|e| e.kind == "connection_error") {
                let reason = error
                    .evidence
                    .get("reason")
                    .and_then(|r| r.as_str())
                    .unwrap_or("connection failed")
                    .to_string();
                return Err(AuditError::SeedUnreachable {
                    url: ctx.seed.to_string(),
                    reason,
                });
            }
        }

        let mut site_recommendations: Vec<Finding> = Vec::new();
        if let Some(robots) = ctx.robots.get(&origin) {
            site_recommendations.extend(robots_finding(&origin, &robots));
        }
        if let Some(discovery) = discovery {
            if ctx.cancel.is_cancelled() {
                discovery.abort();
            } else {
                match discovery.await {
                    Ok(findings) => site_recommendations.extend(findings),
                    Err(e) => tracing::warn!("Discovery check failed: {}", e),
                }
            }
        }

        let data: Vec<PageResult> = results.into_iter().map(|(_, page)| page).collect();
        tracing::info!(
            "Audit completed: {} pages in {:?}",
            data.len(),
            start_time.elapsed()
        );

        Ok(CrawlReport::new(data, site_recommendations))
    }
}

/// Pulls jobs until the frontier is exhausted or cancelled
async fn worker_loop(worker_id: u32, ctx: Arc<WorkerContext>) -> Vec<(usize, PageResult)> {
    let mut pages = Vec::new();

    while let Some(job) = ctx.frontier.next_job().await {
        tracing::debug!("Worker {} processing {}", worker_id, job.url);
        let (state, result) = process_job(&ctx, &job).await;

        if let Err(e) = ctx.frontier.complete(job.seq, state) {
            tracing::warn!("Failed to record state of {}: {}", job.url, e);
        }
        pages.push((job.seq, result));
    }

    pages
}

/// Runs one URL through robots check, fetch, parse, evaluation and scoring
///
/// Returns the terminal state with the page's result. Links are enqueued
/// before the job completes so idle workers never see an empty, finished
/// frontier while links are still being added.
async fn process_job(ctx: &WorkerContext, job: &Job) -> (UrlState, PageResult) {
    if ctx.cancel.is_cancelled() {
        return (
            UrlState::Skipped,
            PageResult::skipped(&job.url, FetchError::Cancelled.kind(), cancelled_evidence()),
        );
    }

    if let Some(evidence) = robots_exclusion(ctx, &job.url).await {
        tracing::info!("URL {} disallowed by robots.txt", job.url);
        return (
            UrlState::Skipped,
            PageResult::skipped(&job.url, "robots_disallowed", evidence),
        );
    }

    if let Err(e) = ctx.frontier.start_fetch(job.seq) {
        tracing::warn!("Failed to start fetch of {}: {}", job.url, e);
    }

    let raw = match fetch_following_redirects(ctx, job).await {
        Ok(raw) => raw,
        Err(failed) => return (UrlState::Failed, failed),
    };

    let doc = match parse_document(&raw, &job.url) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::warn!("Not parsing {}: {}", job.url, e);
            let evidence = evidence(json!({
                "reason": e.to_string(),
                "content_type": raw.content_type().unwrap_or_default(),
            }));
            return (
                UrlState::Failed,
                PageResult::failed(&job.url, Some(raw.status), "not_html", evidence),
            );
        }
    };

    enqueue_links(ctx, &doc.links);

    let findings = ctx.catalog.evaluate(&doc, &ctx.config.thresholds);
    let scores = score(&findings, &ctx.penalties);
    tracing::debug!(
        "{} scored {} ({} findings)",
        job.url,
        scores.global,
        findings.len()
    );

    (UrlState::Done, PageResult::evaluated(&doc, findings, scores))
}

/// Fetches a job's URL, following redirects one vetted hop at a time
///
/// Each `Location` must stay on the seed's site and be allowed by robots.txt
/// before it is requested. The requested URL was already fetched when a hop
/// is refused, so the page ends as failed rather than skipped.
async fn fetch_following_redirects(
    ctx: &WorkerContext,
    job: &Job,
) -> Result<RawResponse, PageResult> {
    let mut current = job.url.clone();
    let mut chain: Vec<String> = Vec::new();

    loop {
        let raw = fetch_once(ctx, &current)
            .await
            .map_err(|e| fetch_failure(job, None, e, &chain))?;

        let Some(location) = raw.redirect_location() else {
            return Ok(raw);
        };
        chain.push(location.to_string());

        if chain.len() > MAX_REDIRECT_HOPS {
            let e = FetchError::TooManyRedirects {
                limit: MAX_REDIRECT_HOPS,
            };
            return Err(fetch_failure(job, Some(raw.status), e, &chain));
        }

        if !is_same_site(&location, &ctx.seed) {
            let e = FetchError::OffSiteRedirect {
                location: location.to_string(),
            };
            return Err(fetch_failure(job, Some(raw.status), e, &chain));
        }

        if let Some(mut evidence) = robots_exclusion(ctx, &location).await {
            tracing::info!(
                "{} redirects to {}, disallowed by robots.txt",
                job.url,
                location
            );
            evidence.insert("redirect_chain".to_string(), json!(chain));
            return Err(PageResult::failed(
                &job.url,
                Some(raw.status),
                "robots_disallowed",
                evidence,
            ));
        }

        // The target is audited here, not again when a link to it turns up
        if let Ok(key) = normalize(&location) {
            ctx.frontier.mark_seen(&key);
        }

        tracing::debug!("Following redirect {} -> {}", current, location);
        current = location;
    }
}

/// One fetch, abandoned as soon as the run is cancelled
async fn fetch_once(ctx: &WorkerContext, url: &Url) -> Result<RawResponse, FetchError> {
    tokio::select! {
        biased;
        _ = ctx.cancel.cancelled() => Err(FetchError::Cancelled),
        result = ctx.fetcher.fetch(url, ctx.fetch_timeout) => result,
    }
}

fn fetch_failure(job: &Job, status: Option<u16>, e: FetchError, chain: &[String]) -> PageResult {
    tracing::warn!("Fetch of {} failed: {}", job.url, e);
    let mut evidence = evidence(json!({ "reason": e.to_string() }));
    match &e {
        FetchError::Timeout { after_ms } => {
            evidence.insert("timeout_ms".to_string(), json!(after_ms));
        }
        FetchError::OffSiteRedirect { location } => {
            evidence.insert("location".to_string(), json!(location));
        }
        _ => {}
    }
    if !chain.is_empty() {
        evidence.insert("redirect_chain".to_string(), json!(chain));
    }
    PageResult::failed(&job.url, status, e.kind(), evidence)
}

/// Evidence for a robots.txt exclusion of `url`, or `None` when allowed
async fn robots_exclusion(ctx: &WorkerContext, url: &Url) -> Option<Evidence> {
    let policy = robots::resolve(&ctx.robots, &ctx.client, url, ctx.robots_timeout).await;
    let product_token = &ctx.config.user_agent.crawler_name;
    if policy.is_allowed(url.as_str(), product_token) {
        return None;
    }

    Some(evidence(json!({
        "url": url.as_str(),
        "robots_url": format!("{}/robots.txt", origin_of(url)),
        "robots_fetched_at": policy.fetched_at.to_rfc3339(),
        "user_agent": product_token,
    })))
}

/// Feeds same-site links into the frontier in document order
fn enqueue_links(ctx: &WorkerContext, links: &[crate::document::Link]) {
    for link in links {
        let normalized = match normalize(&link.url) {
            Ok(n) => n,
            Err(e) => {
                tracing::trace!("Failed to normalize URL {}: {}", link.url, e);
                continue;
            }
        };

        if !is_same_site(&normalized, &ctx.seed) {
            continue;
        }

        match ctx.frontier.try_enqueue(normalized) {
            EnqueueOutcome::Added(seq) => tracing::trace!("Queued {} as #{}", link.url, seq),
            EnqueueOutcome::Duplicate => {}
            // Budget spent, nothing later in the page can be queued either
            EnqueueOutcome::OverBudget => break,
        }
    }
}

fn cancelled_evidence() -> Evidence {
    evidence(json!({ "reason": "run cancelled before the page completed" }))
}
