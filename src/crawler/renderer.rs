//! Browser-rendered fetching through WebDriver
//!
//! The rendered backend drives a single WebDriver session (chromedriver,
//! geckodriver or a Selenium grid). WebDriver does not expose response
//! status or headers, so those come from a plain HTTP request for the same URL;
//! the body is the DOM after scripts have run.

use crate::config::{CrawlerConfig, RendererConfig};
use crate::crawler::fetcher::{Fetcher, HttpFetcher, RawResponse};
use crate::output::FetchMode;
use crate::FetchError;
use async_trait::async_trait;
use fantoccini::{Client, ClientBuilder};
use std::time::Duration;
use tokio::sync::Mutex;
use url::Url;

/// A live browser that can load a page and hand back its DOM
#[async_trait]
pub(crate) trait BrowserSession: Send + Sync {
    /// Loads `url` and returns the URL the browser ended on with the DOM
    async fn render(&self, url: &Url) -> Result<(Url, String), FetchError>;

    /// Closes the session
    async fn end(self: Box<Self>);
}

#[async_trait]
impl BrowserSession for Client {
    async fn render(&self, url: &Url) -> Result<(Url, String), FetchError> {
        self.goto(url.as_str())
            .await
            .map_err(|e| FetchError::Http(format!("Navigation failed: {}", e)))?;
        let source = self
            .source()
            .await
            .map_err(|e| FetchError::Http(format!("Reading rendered DOM failed: {}", e)))?;
        let final_url = self.current_url().await.unwrap_or_else(|_| url.clone());

        Ok((final_url, source))
    }

    async fn end(self: Box<Self>) {
        if let Err(e) = Client::close(*self).await {
            tracing::warn!("Failed to close WebDriver session: {}", e);
        }
    }
}

/// Rendered backend
pub struct RenderedFetcher {
    webdriver_url: String,
    http: HttpFetcher,
    max_body_bytes: u64,
    /// One browser session, shared; rendering is serialized through it
    session: Mutex<Option<Box<dyn BrowserSession>>>,
}

impl RenderedFetcher {
    pub fn new(renderer: &RendererConfig, crawler: &CrawlerConfig, http: HttpFetcher) -> Self {
        Self {
            webdriver_url: renderer.webdriver_url.clone(),
            http,
            max_body_bytes: crawler.max_body_bytes,
            session: Mutex::new(None),
        }
    }

    /// Returns the session, connecting on first use
    async fn session<'a>(
        &self,
        slot: &'a mut Option<Box<dyn BrowserSession>>,
    ) -> Result<&'a dyn BrowserSession, FetchError> {
        if slot.is_none() {
            tracing::debug!("Connecting to WebDriver at {}", self.webdriver_url);
            let client = ClientBuilder::native()
                .connect(&self.webdriver_url)
                .await
                .map_err(|e| {
                    FetchError::Connection(format!(
                        "WebDriver at {} unavailable: {}",
                        self.webdriver_url, e
                    ))
                })?;
            *slot = Some(Box::new(client));
        }

        slot.as_deref()
            .ok_or_else(|| FetchError::Connection("WebDriver session missing".to_string()))
    }

    /// Renders `url` once the shared session is free
    ///
    /// The `timeout` budget starts after the session lock is acquired, so a
    /// page queued behind other renders is not charged for the wait.
    async fn render(&self, url: &Url, timeout: Duration) -> Result<(Url, String), FetchError> {
        let mut slot = self.session.lock().await;

        let work = async {
            match self.session(&mut slot).await {
                Ok(session) => session.render(url).await,
                Err(e) => Err(e),
            }
        };

        tokio::time::timeout(timeout, work)
            .await
            .map_err(|_| FetchError::Timeout {
                after_ms: timeout.as_millis() as u64,
            })?
    }
}

#[async_trait]
impl Fetcher for RenderedFetcher {
    async fn fetch(&self, url: &Url, timeout: Duration) -> Result<RawResponse, FetchError> {
        // Status and headers only; the body comes from the browser
        let head = self.http.fetch_with_limit(url, timeout, 0).await?;
        if head.redirect_location().is_some() {
            // The caller vets the hop before anything is rendered
            return Ok(head);
        }

        let (final_url, source) = self.render(url, timeout).await?;

        let mut body = source.into_bytes();
        let limit = usize::try_from(self.max_body_bytes).unwrap_or(usize::MAX);
        let truncated = body.len() > limit;
        body.truncate(limit);

        let mut headers = head.headers;
        // The rendered DOM is always serialized HTML
        headers.insert(
            "content-type".to_string(),
            "text/html; charset=utf-8".to_string(),
        );

        Ok(RawResponse {
            final_url,
            status: head.status,
            headers,
            body,
            truncated,
        })
    }

    fn mode(&self) -> FetchMode {
        FetchMode::Rendered
    }

    async fn shutdown(&self) {
        if let Some(session) = self.session.lock().await.take() {
            session.end().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UserAgentConfig;
    use crate::crawler::fetcher::build_page_client;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Browser stand-in that takes a fixed time per page
    struct SlowBrowser {
        delay: Duration,
        renders: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl BrowserSession for SlowBrowser {
        async fn render(&self, url: &Url) -> Result<(Url, String), FetchError> {
            self.renders.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok((url.clone(), "<html><body><h1>Rendered</h1></body></html>".to_string()))
        }

        async fn end(self: Box<Self>) {}
    }

    fn rendered_fetcher(webdriver_url: &str) -> RenderedFetcher {
        let crawler = CrawlerConfig::default();
        let client = build_page_client(&UserAgentConfig::default()).unwrap();
        let renderer = RendererConfig {
            webdriver_url: webdriver_url.to_string(),
        };
        RenderedFetcher::new(&renderer, &crawler, HttpFetcher::new(client, &crawler))
    }

    fn with_browser(delay: Duration) -> (RenderedFetcher, Arc<AtomicUsize>) {
        let renders = Arc::new(AtomicUsize::new(0));
        let browser: Box<dyn BrowserSession> = Box::new(SlowBrowser {
            delay,
            renders: Arc::clone(&renders),
        });
        let mut fetcher = rendered_fetcher("http://127.0.0.1:9");
        fetcher.session = Mutex::new(Some(browser));
        (fetcher, renders)
    }

    #[test]
    fn test_mode_is_rendered() {
        assert_eq!(
            rendered_fetcher("http://localhost:4444").mode(),
            FetchMode::Rendered
        );
    }

    #[tokio::test]
    async fn test_unreachable_target_fails_before_rendering() {
        let fetcher = rendered_fetcher("http://127.0.0.1:9");
        let url = Url::parse("http://127.0.0.1:9/").unwrap();
        let result = fetcher.fetch(&url, Duration::from_secs(5)).await;
        assert!(matches!(result, Err(FetchError::Connection(_))));
        // No session was ever opened
        fetcher.shutdown().await;
    }

    #[tokio::test]
    async fn test_queued_renders_are_not_charged_for_the_wait() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("<html></html>", "text/html"))
            .mount(&server)
            .await;

        let (fetcher, renders) = with_browser(Duration::from_millis(300));
        let fetcher = Arc::new(fetcher);
        let timeout = Duration::from_millis(500);

        // Serialized, the third render starts about 600ms in
        let mut handles = Vec::new();
        for page in ["/a", "/b", "/c"] {
            let fetcher = Arc::clone(&fetcher);
            let url = Url::parse(&format!("{}{}", server.uri(), page)).unwrap();
            handles.push(tokio::spawn(async move { fetcher.fetch(&url, timeout).await }));
        }

        for handle in handles {
            let raw = handle.await.unwrap().unwrap();
            assert_eq!(raw.status, 200);
            assert_eq!(raw.content_type(), Some("text/html; charset=utf-8"));
        }
        assert_eq!(renders.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_slow_render_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("<html></html>", "text/html"))
            .mount(&server)
            .await;

        let (fetcher, _) = with_browser(Duration::from_secs(2));
        let url = Url::parse(&format!("{}/slow", server.uri())).unwrap();
        let result = fetcher.fetch(&url, Duration::from_millis(200)).await;
        assert_eq!(result.unwrap_err(), FetchError::Timeout { after_ms: 200 });
    }

    #[tokio::test]
    async fn test_redirect_is_returned_without_rendering() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", "/new"))
            .mount(&server)
            .await;

        let (fetcher, renders) = with_browser(Duration::ZERO);
        let url = Url::parse(&format!("{}/old", server.uri())).unwrap();
        let raw = fetcher.fetch(&url, Duration::from_secs(5)).await.unwrap();

        assert_eq!(raw.status, 302);
        assert!(raw.redirect_location().is_some());
        assert_eq!(renders.load(Ordering::SeqCst), 0);
    }
}
