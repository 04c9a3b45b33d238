//! Site-level discovery checks
//!
//! Auxiliary discovery files are fetched once per crawl for the seed origin,
//! next to the page pipeline rather than inside it. robots.txt presence is
//! read from the robots cache, which already fetched it.

use crate::robots::CachedRobots;
use crate::rules::{evidence, Finding, Severity, Topic};
use reqwest::{Client, StatusCode};
use serde_json::json;
use std::time::Duration;

pub const DISCOVERY_LLMS_TXT_MISSING: &str = "DISCOVERY_LLMS_TXT_MISSING";
pub const DISCOVERY_AI_TXT_MISSING: &str = "DISCOVERY_AI_TXT_MISSING";
pub const ROBOTS_TXT_MISSING: &str = "ROBOTS_TXT_MISSING";

/// Whether `{origin}{path}` answers 200 with a non-empty body
async fn file_present(client: &Client, origin: &str, path: &str, timeout: Duration) -> bool {
    let url = format!("{}{}", origin, path);
    match client.get(&url).timeout(timeout).send().await {
        Ok(response) if response.status() == StatusCode::OK => response
            .bytes()
            .await
            .map(|body| !body.iter().all(u8::is_ascii_whitespace))
            .unwrap_or(false),
        Ok(response) => {
            tracing::debug!("{} returned HTTP {}", url, response.status());
            false
        }
        Err(e) => {
            tracing::debug!("{} unavailable: {}", url, e);
            false
        }
    }
}

/// Fetches `/llms.txt` and `/ai.txt` on the origin
pub async fn check_discovery_files(
    client: &Client,
    origin: &str,
    timeout: Duration,
) -> Vec<Finding> {
    let (llms, ai) = tokio::join!(
        file_present(client, origin, "/llms.txt", timeout),
        file_present(client, origin, "/ai.txt", timeout),
    );

    let mut findings = Vec::new();
    if !llms {
        findings.push(Finding::new(
            DISCOVERY_LLMS_TXT_MISSING,
            Topic::Discovery,
            Severity::Info,
            "No /llms.txt file describing the site for language models",
            evidence(json!({ "url": format!("{}/llms.txt", origin) })),
        ));
    }
    if !ai {
        findings.push(Finding::new(
            DISCOVERY_AI_TXT_MISSING,
            Topic::Discovery,
            Severity::Info,
            "No /ai.txt file declaring AI usage preferences",
            evidence(json!({ "url": format!("{}/ai.txt", origin) })),
        ));
    }
    findings
}

/// Reports a missing robots.txt from the cached lookup
pub fn robots_finding(origin: &str, robots: &CachedRobots) -> Option<Finding> {
    if robots.found {
        return None;
    }
    Some(Finding::new(
        ROBOTS_TXT_MISSING,
        Topic::Discovery,
        Severity::Info,
        "No robots.txt file; crawlers assume everything is allowed",
        evidence(json!({
            "url": format!("{}/robots.txt", origin),
            "checked_at": robots.fetched_at.to_rfc3339(),
        })),
    ))
}
