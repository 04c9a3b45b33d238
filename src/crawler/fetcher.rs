//! HTTP fetcher implementation
//!
//! This module defines the `Fetcher` interface the frontier is written
//! against, plus the plain HTTP backend:
//! - Building the HTTP clients with the crawler's user agent
//! - Single-hop GET requests with a per-fetch timeout
//! - Streaming the body up to a size limit and flagging truncation
//! - Error classification into `FetchError`

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::output::FetchMode;
use crate::FetchError;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

/// Maximum number of redirects followed for robots.txt and discovery files
const MAX_REDIRECTS: usize = 10;

/// Raw result of a fetch, before parsing
///
/// HTTP error statuses (4xx, 5xx) are successful fetches: the page is still
/// parsed and evaluated from whatever body came back.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// Final URL after redirects
    pub final_url: Url,
    pub status: u16,
    /// Response headers with lowercased names
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
    /// Whether `body` was cut at the configured maximum size
    pub truncated: bool,
}

impl RawResponse {
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(String::as_str)
    }

    /// Target of a redirect response, resolved against the responding URL
    ///
    /// Returns `None` for non-redirect statuses and for redirects without a
    /// usable `Location`; those are evaluated like any other response.
    pub fn redirect_location(&self) -> Option<Url> {
        if !matches!(self.status, 301 | 302 | 303 | 307 | 308) {
            return None;
        }

        let location = self.headers.get("location")?;
        let mut target = self.final_url.join(location.trim()).ok()?;
        target.set_fragment(None);
        matches!(target.scheme(), "http" | "https").then_some(target)
    }
}

/// A document-fetching backend
///
/// The frontier treats every implementation identically; the mode only
/// selects the timeout budget. Fetches are single-hop: a redirect comes back
/// as a 3xx response so the caller can vet each `Location` before following
/// it. Implementations enforce `timeout` themselves, and time spent waiting
/// for a shared backend does not count against it.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches a URL, giving up after `timeout`
    async fn fetch(&self, url: &Url, timeout: Duration) -> Result<RawResponse, FetchError>;

    /// Which backend this is
    fn mode(&self) -> FetchMode;

    /// Releases backend resources at the end of a run
    async fn shutdown(&self) {}
}

fn client_builder(config: &UserAgentConfig) -> reqwest::ClientBuilder {
    Client::builder()
        .user_agent(config.header_value())
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
}

/// Builds the client for site files (robots.txt, llms.txt, ai.txt)
///
/// The User-Agent follows `CrawlerName/Version (+ContactURL)`. Redirects are
/// followed up to a fixed limit. Timeouts are set per request.
///
/// # Example
///
/// ```no_run
/// use seo_lantern::config::UserAgentConfig;
/// use seo_lantern::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    client_builder(config)
        .redirect(Policy::limited(MAX_REDIRECTS))
        .build()
}

/// Builds the client for audited pages
///
/// Redirects are not followed; the crawl checks scope and robots.txt on
/// every hop.
pub fn build_page_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    client_builder(config)
        .redirect(Policy::none()) // Handle redirects manually
        .build()
}

/// Plain HTTP backend
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    max_body_bytes: u64,
    reject_body_bytes: u64,
}

impl HttpFetcher {
    pub fn new(client: Client, config: &CrawlerConfig) -> Self {
        Self {
            client,
            max_body_bytes: config.max_body_bytes,
            reject_body_bytes: config.reject_body_bytes,
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Fetches status and headers, reading at most `body_limit` body bytes
    pub(crate) async fn fetch_with_limit(
        &self,
        url: &Url,
        timeout: Duration,
        body_limit: u64,
    ) -> Result<RawResponse, FetchError> {
        let mut response = self
            .client
            .get(url.as_str())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_error(&e, timeout))?;

        if let Some(declared) = response.content_length() {
            if declared > self.reject_body_bytes {
                return Err(FetchError::TooLarge {
                    declared,
                    limit: self.reject_body_bytes,
                });
            }
        }

        let final_url = response.url().clone();
        let status = response.status().as_u16();

        let mut headers = BTreeMap::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                // Repeated headers are folded the way HTTP allows
                headers
                    .entry(name.as_str().to_ascii_lowercase())
                    .and_modify(|existing: &mut String| {
                        existing.push_str(", ");
                        existing.push_str(value);
                    })
                    .or_insert_with(|| value.to_string());
            }
        }

        let limit = usize::try_from(body_limit).unwrap_or(usize::MAX);
        let mut body = Vec::new();
        let mut truncated = false;

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| classify_error(&e, timeout))?
        {
            let room = limit.saturating_sub(body.len());
            if chunk.len() > room {
                body.extend_from_slice(&chunk[..room]);
                truncated = true;
                break;
            }
            body.extend_from_slice(&chunk);
        }

        if truncated {
            tracing::debug!("Body of {} truncated at {} bytes", url, limit);
        }

        Ok(RawResponse {
            final_url,
            status,
            headers,
            body,
            truncated,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url, timeout: Duration) -> Result<RawResponse, FetchError> {
        self.fetch_with_limit(url, timeout, self.max_body_bytes)
            .await
    }

    fn mode(&self) -> FetchMode {
        FetchMode::Static
    }
}

/// Maps a reqwest error onto the fetch error taxonomy
pub(crate) fn classify_error(error: &reqwest::Error, timeout: Duration) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            after_ms: timeout.as_millis() as u64,
        }
    } else if error.is_connect() {
        FetchError::Connection(error.to_string())
    } else {
        FetchError::Http(error.to_string())
    }
}
