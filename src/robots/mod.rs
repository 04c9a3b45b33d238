//! Robots.txt handling module
//!
//! This module fetches, parses and caches robots.txt per origin. Any failure
//! to obtain a policy (network error, timeout, non-200 status) resolves to
//! allow-all.

mod cache;
mod parser;

pub use cache::{CachedRobots, RobotsCache};
pub use parser::ParsedRobots;

use crate::url::origin_of;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Fetches robots.txt for an origin
///
/// # Arguments
///
/// * `client` - The HTTP client to use (carries the crawler's User-Agent)
/// * `origin` - `scheme://host[:port]` of the site
/// * `timeout` - Upper bound for the whole request
///
/// # Returns
///
/// A `CachedRobots` that is never an error: failures become allow-all with
/// `found == false`.
pub async fn fetch_robots(client: &Client, origin: &str, timeout: Duration) -> CachedRobots {
    let robots_url = format!("{}/robots.txt", origin);
    tracing::debug!("Fetching robots.txt: {}", robots_url);

    let response = match client.get(&robots_url).timeout(timeout).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!("robots.txt unavailable for {}: {}", origin, e);
            return CachedRobots::new(ParsedRobots::allow_all(), false);
        }
    };

    if response.status() != StatusCode::OK {
        tracing::debug!(
            "robots.txt for {} returned HTTP {}, allowing all",
            origin,
            response.status()
        );
        return CachedRobots::new(ParsedRobots::allow_all(), false);
    }

    match response.text().await {
        Ok(body) => CachedRobots::new(ParsedRobots::from_content(&body), true),
        Err(e) => {
            tracing::debug!("Failed to read robots.txt body for {}: {}", origin, e);
            CachedRobots::new(ParsedRobots::allow_all(), false)
        }
    }
}

/// Returns the robots policy for the URL's origin, fetching it on first access
pub async fn resolve(
    cache: &RobotsCache,
    client: &Client,
    url: &Url,
    timeout: Duration,
) -> Arc<CachedRobots> {
    let origin = origin_of(url);
    if let Some(cached) = cache.get(&origin) {
        return cached;
    }

    let fetched = fetch_robots(client, &origin, timeout).await;
    cache.insert(&origin, fetched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_robots_parses_policy() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private/"),
            )
            .mount(&server)
            .await;

        let robots = fetch_robots(&Client::new(), &server.uri(), Duration::from_secs(5)).await;
        assert!(robots.found);
        let blocked = format!("{}/private/page", server.uri());
        assert!(!robots.is_allowed(&blocked, "TestBot"));
    }

    #[tokio::test]
    async fn test_missing_robots_allows_all() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let robots = fetch_robots(&Client::new(), &server.uri(), Duration::from_secs(5)).await;
        assert!(!robots.found);
        assert!(robots.content.is_allow_all());
    }

    #[tokio::test]
    async fn test_resolve_fetches_once_per_origin() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nAllow: /"))
            .expect(1)
            .mount(&server)
            .await;

        let cache = RobotsCache::new();
        let client = Client::new();
        for page in ["/a", "/b", "/c"] {
            let url = Url::parse(&format!("{}{}", server.uri(), page)).unwrap();
            let robots = resolve(&cache, &client, &url, Duration::from_secs(5)).await;
            assert!(robots.found);
        }
        assert_eq!(cache.len(), 1);
    }
}
