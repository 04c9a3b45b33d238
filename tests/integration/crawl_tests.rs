//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run full audits
//! end-to-end through `orchestrate`.

use seo_lantern::config::Config;
use seo_lantern::crawler::{DISCOVERY_AI_TXT_MISSING, DISCOVERY_LLMS_TXT_MISSING, ROBOTS_TXT_MISSING};
use seo_lantern::{
    orchestrate, orchestrate_blocking, AuditError, CrawlRequest, FetchMode, Severity, UrlState,
};
use std::collections::HashSet;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HTML: &str = "text/html; charset=utf-8";

/// Creates a test configuration without the discovery-file check
fn create_test_config() -> Config {
    let mut config = Config::default();
    config.crawler.concurrency = 4;
    config.crawler.fetch_timeout_ms = 2_000;
    config.crawler.robots_timeout_ms = 1_000;
    config.crawler.check_discovery_files = false;
    config.user_agent.crawler_name = "TestBot".to_string();
    config
}

fn html_page(body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.into(), HTML)
}

async fn mount_robots(server: &MockServer, content: &str) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(content.to_string()))
        .mount(server)
        .await;
}

/// A page that satisfies every rule except the meta description
fn compliant_page() -> String {
    let words = "lantern ".repeat(320);
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>Compliant Example Page</title>
  <link rel="canonical" href="/">
  <link rel="icon" href="/favicon.ico">
  <link rel="preconnect" href="https://cdn.example.com">
  <meta property="og:title" content="Compliant Example Page">
  <meta property="og:description" content="An example page">
  <meta property="og:image" content="https://cdn.example.com/og.webp">
  <meta name="twitter:card" content="summary">
  <meta name="content-summary" content="An example page used to check the audit">
  <link rel="manifest" href="/site.webmanifest">
  <script type="application/ld+json">{{"@context": "https://schema.org", "@type": "Article", "headline": "Compliant Example Page", "author": {{"@type": "Person", "name": "Ada Lovelace"}}}}</script>
</head>
<body>
  <header><nav><a href="/about">About</a></nav></header>
  <main>
    <h1>Compliant Example Page</h1>
    <h2>Details</h2>
    <p>{}</p>
  </main>
  <footer>
    <a href="/privacy">Privacy</a>
    <a href="/terms">Terms</a>
    <a href="/contact">Contact</a>
  </footer>
</body>
</html>"#,
        words
    )
}

#[tokio::test]
async fn test_only_missing_description_fires() {
    let mock_server = MockServer::start().await;
    mount_robots(&mock_server, "User-agent: *\nAllow: /").await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            html_page(compliant_page())
                .insert_header("Content-Security-Policy", "default-src 'self'")
                .insert_header("X-Frame-Options", "DENY"),
        )
        .mount(&mock_server)
        .await;

    let request = CrawlRequest::new(&mock_server.uri(), 1, FetchMode::Static).unwrap();
    let report = orchestrate(request, &create_test_config()).await.unwrap();

    assert_eq!(report.pages, 1);
    let page = &report.data[0];
    assert_eq!(page.state, UrlState::Done);
    assert_eq!(page.status, 200);
    assert_eq!(page.title, "Compliant Example Page");
    assert_eq!(page.h1_count, 1);
    assert!(page.word_count >= 300);

    let ids: Vec<&str> = page
        .recommendations
        .iter()
        .map(|f| f.rule_id.as_str())
        .collect();
    assert_eq!(ids, vec!["META_DESC_MISSING"]);
    assert_eq!(page.recommendations[0].severity, Severity::Warning);

    assert_eq!(page.score_legacy, 94);
    assert_eq!(page.score_rules, 0);
    assert_eq!(page.score_global, 94);
    assert!(report.site_recommendations.is_empty());

    // Wire shape
    let json: serde_json::Value = serde_json::from_str(&report.to_json_pretty().unwrap()).unwrap();
    assert_eq!(json["pages"], 1);
    assert_eq!(json["data"][0]["recommendations"][0]["rule_id"], "META_DESC_MISSING");
    assert_eq!(json["data"][0]["recommendations"][0]["topic"], "meta");
}

#[tokio::test]
async fn test_not_found_seed_is_scored() {
    let mock_server = MockServer::start().await;
    mount_robots(&mock_server, "User-agent: *\nAllow: /").await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(404).set_body_raw("", HTML))
        .mount(&mock_server)
        .await;

    let request = CrawlRequest::new(&mock_server.uri(), 10, FetchMode::Static).unwrap();
    let report = orchestrate(request, &create_test_config()).await.unwrap();

    assert_eq!(report.pages, 1);
    let page = &report.data[0];
    assert_eq!(page.status, 404);
    assert_eq!(page.state, UrlState::Done);
    assert_eq!(page.title, "");

    let ids: HashSet<&str> = page
        .recommendations
        .iter()
        .map(|f| f.rule_id.as_str())
        .collect();
    for expected in [
        "META_TITLE_MISSING",
        "META_DESC_MISSING",
        "HEADINGS_NONE",
        "H1_MISSING",
        "VIEWPORT_MISSING",
    ] {
        assert!(ids.contains(expected), "missing {}", expected);
    }
    // Nothing image-related can fire on an empty document
    assert!(!ids.contains("IMG_ALT_MISSING"));
    assert!((0..=100).contains(&page.score_global));
}

#[tokio::test]
async fn test_robots_disallowed_page_is_skipped() {
    let mock_server = MockServer::start().await;
    mount_robots(&mock_server, "User-agent: *\nDisallow: /private/").await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(
            r#"<html><body><a href="/private/page">secret</a><a href="/public">open</a></body></html>"#,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/public"))
        .respond_with(html_page("<html><body><p>public</p></body></html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/private/page"))
        .respond_with(html_page("<html></html>"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let request = CrawlRequest::new(&mock_server.uri(), 10, FetchMode::Static).unwrap();
    let report = orchestrate(request, &create_test_config()).await.unwrap();

    assert_eq!(report.pages, 3);
    let private = report
        .data
        .iter()
        .find(|p| p.url.ends_with("/private/page"))
        .unwrap();
    assert_eq!(private.state, UrlState::Skipped);
    assert!(private.recommendations.is_empty());
    assert_eq!(
        private.error.as_ref().map(|e| e.kind.as_str()),
        Some("robots_disallowed")
    );
}

fn redirect_to(location: &str) -> ResponseTemplate {
    ResponseTemplate::new(301).insert_header("Location", location)
}

async fn requests_to(server: &MockServer, target: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == target)
        .count()
}

#[tokio::test]
async fn test_redirect_into_disallowed_path_is_never_fetched() {
    let mock_server = MockServer::start().await;
    mount_robots(&mock_server, "User-agent: *\nDisallow: /private/").await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(r#"<html><body><a href="/go">go</a></body></html>"#))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/go"))
        .respond_with(redirect_to("/private/page"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/private/page"))
        .respond_with(html_page("<html></html>"))
        .mount(&mock_server)
        .await;

    let request = CrawlRequest::new(&mock_server.uri(), 10, FetchMode::Static).unwrap();
    let report = orchestrate(request, &create_test_config()).await.unwrap();

    assert_eq!(report.pages, 2);
    let go = &report.data[1];
    assert!(go.url.ends_with("/go"));
    assert_eq!(go.state, UrlState::Failed);
    assert_eq!(go.status, 301);
    assert!(go.recommendations.is_empty());

    let error = go.error.as_ref().unwrap();
    assert_eq!(error.kind, "robots_disallowed");
    assert!(error.evidence["url"].as_str().unwrap().ends_with("/private/page"));
    assert!(error.evidence.contains_key("robots_fetched_at"));
    assert_eq!(requests_to(&mock_server, "/private/page").await, 0);
}

#[tokio::test]
async fn test_same_site_redirect_is_followed() {
    let mock_server = MockServer::start().await;
    mount_robots(&mock_server, "User-agent: *\nAllow: /").await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(r#"<html><body><a href="/old">old</a></body></html>"#))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(redirect_to("/new"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(html_page(
            r#"<html><head><title>Moved Here</title></head><body><a href="/new">self</a></body></html>"#,
        ))
        .mount(&mock_server)
        .await;

    let request = CrawlRequest::new(&mock_server.uri(), 10, FetchMode::Static).unwrap();
    let report = orchestrate(request, &create_test_config()).await.unwrap();

    // The self link on the target is a duplicate of the redirect it came from
    assert_eq!(report.pages, 2);
    let old = &report.data[1];
    assert!(old.url.ends_with("/old"));
    assert_eq!(old.state, UrlState::Done);
    assert_eq!(old.status, 200);
    assert_eq!(old.title, "Moved Here");
    assert_eq!(
        old.final_url.as_deref(),
        Some(format!("{}/new", mock_server.uri()).as_str())
    );
    assert_eq!(requests_to(&mock_server, "/new").await, 1);
}

#[tokio::test]
async fn test_off_site_redirect_is_reported_not_followed() {
    let mock_server = MockServer::start().await;
    mount_robots(&mock_server, "User-agent: *\nAllow: /").await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(r#"<html><body><a href="/out">out</a></body></html>"#))
        .mount(&mock_server)
        .await;

    // Same host, different port: another site
    Mock::given(method("GET"))
        .and(path("/out"))
        .respond_with(redirect_to("http://127.0.0.1:9/landing"))
        .mount(&mock_server)
        .await;

    let request = CrawlRequest::new(&mock_server.uri(), 10, FetchMode::Static).unwrap();
    let report = orchestrate(request, &create_test_config()).await.unwrap();

    assert_eq!(report.pages, 2);
    let out = &report.data[1];
    assert_eq!(out.state, UrlState::Failed);
    assert_eq!(out.status, 301);
    assert_eq!(out.score_global, 0);

    let error = out.error.as_ref().unwrap();
    assert_eq!(error.kind, "redirect_off_site");
    assert_eq!(error.evidence["location"], "http://127.0.0.1:9/landing");
    assert_eq!(error.evidence["redirect_chain"][0], "http://127.0.0.1:9/landing");
}

#[tokio::test]
async fn test_self_links_and_budget() {
    let mock_server = MockServer::start().await;
    mount_robots(&mock_server, "User-agent: *\nAllow: /").await;

    let mut body = String::from("<html><body>");
    for _ in 0..50 {
        body.push_str(r#"<a href="/">home</a>"#);
    }
    for i in 0..10 {
        body.push_str(&format!(r#"<a href="/page{}">page</a><a href="/">again</a>"#, i));
    }
    body.push_str("</body></html>");

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(body))
        .expect(1)
        .mount(&mock_server)
        .await;

    for i in 0..10 {
        Mock::given(method("GET"))
            .and(path(format!("/page{}", i)))
            .respond_with(html_page(r#"<html><body><a href="/">home</a></body></html>"#))
            .expect(0..=1)
            .mount(&mock_server)
            .await;
    }

    let request = CrawlRequest::new(&mock_server.uri(), 5, FetchMode::Static).unwrap();
    let report = orchestrate(request, &create_test_config()).await.unwrap();

    assert_eq!(report.pages, 5);
    let unique: HashSet<&str> = report.data.iter().map(|p| p.url.as_str()).collect();
    assert_eq!(unique.len(), 5);

    // Seed first, then links in the order they were discovered
    let urls: Vec<String> = report.data.iter().map(|p| p.url.clone()).collect();
    let base = mock_server.uri();
    assert_eq!(
        urls,
        vec![
            format!("{}/", base),
            format!("{}/page0", base),
            format!("{}/page1", base),
            format!("{}/page2", base),
            format!("{}/page3", base),
        ]
    );
}

#[tokio::test]
async fn test_slow_page_times_out_without_blocking_run() {
    let mock_server = MockServer::start().await;
    mount_robots(&mock_server, "User-agent: *\nAllow: /").await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(
            r#"<html><body><a href="/slow">slow</a><a href="/fast">fast</a></body></html>"#,
        ))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html_page("<html></html>").set_delay(Duration::from_secs(5)))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fast"))
        .respond_with(html_page("<html><body>fast</body></html>"))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config();
    config.crawler.fetch_timeout_ms = 300;

    let request = CrawlRequest::new(&mock_server.uri(), 10, FetchMode::Static).unwrap();
    let report = orchestrate(request, &config).await.unwrap();

    assert_eq!(report.pages, 3);
    let slow = &report.data[1];
    assert!(slow.url.ends_with("/slow"));
    assert_eq!(slow.state, UrlState::Failed);
    assert_eq!(slow.error.as_ref().map(|e| e.kind.as_str()), Some("timeout"));
    assert_eq!(slow.score_global, 0);
    assert_eq!(report.data[2].state, UrlState::Done);
}

#[tokio::test]
async fn test_non_html_page_fails_with_no_findings() {
    let mock_server = MockServer::start().await;
    mount_robots(&mock_server, "User-agent: *\nAllow: /").await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(r#"<html><body><a href="/report.pdf">pdf</a></body></html>"#))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/report.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"%PDF-1.4\0\0".to_vec(), "application/pdf"))
        .mount(&mock_server)
        .await;

    let request = CrawlRequest::new(&mock_server.uri(), 10, FetchMode::Static).unwrap();
    let report = orchestrate(request, &create_test_config()).await.unwrap();

    let pdf = &report.data[1];
    assert_eq!(pdf.state, UrlState::Failed);
    assert_eq!(pdf.status, 200);
    assert!(pdf.recommendations.is_empty());
    assert_eq!(pdf.error.as_ref().map(|e| e.kind.as_str()), Some("not_html"));
}

#[tokio::test]
async fn test_site_level_discovery_findings() {
    let mock_server = MockServer::start().await;
    // No robots.txt, no ai.txt: wiremock answers 404
    Mock::given(method("GET"))
        .and(path("/llms.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("# Site\n"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page("<html><body>home</body></html>"))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config();
    config.crawler.check_discovery_files = true;

    let request = CrawlRequest::new(&mock_server.uri(), 1, FetchMode::Static).unwrap();
    let report = orchestrate(request, &config).await.unwrap();

    let ids: Vec<&str> = report
        .site_recommendations
        .iter()
        .map(|f| f.rule_id.as_str())
        .collect();
    assert!(ids.contains(&ROBOTS_TXT_MISSING));
    assert!(ids.contains(&DISCOVERY_AI_TXT_MISSING));
    assert!(!ids.contains(&DISCOVERY_LLMS_TXT_MISSING));

    // Page findings never include site-level checks
    assert!(report.data[0]
        .recommendations
        .iter()
        .all(|f| !f.rule_id.starts_with("DISCOVERY_")));
}

#[tokio::test]
async fn test_run_deadline_keeps_partial_report() {
    let mock_server = MockServer::start().await;
    mount_robots(&mock_server, "User-agent: *\nAllow: /").await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page("<html></html>").set_delay(Duration::from_secs(5)))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config();
    config.crawler.fetch_timeout_ms = 10_000;
    config.crawler.run_deadline_ms = 500;

    let request = CrawlRequest::new(&mock_server.uri(), 10, FetchMode::Static).unwrap();
    let report = orchestrate(request, &config).await.unwrap();

    assert_eq!(report.pages, 1);
    assert_eq!(report.data[0].state, UrlState::Failed);
    assert_eq!(
        report.data[0].error.as_ref().map(|e| e.kind.as_str()),
        Some("cancelled")
    );
}

#[tokio::test]
async fn test_unreachable_seed_fails_run() {
    let request = CrawlRequest::new("http://127.0.0.1:9/", 5, FetchMode::Static).unwrap();
    let result = orchestrate(request, &create_test_config()).await;
    assert!(matches!(result, Err(AuditError::SeedUnreachable { .. })));
}

#[tokio::test]
async fn test_invalid_requests_fail_before_network() {
    assert!(CrawlRequest::new("not a url", 5, FetchMode::Static).is_err());

    // Hand-built requests are re-validated
    let request = CrawlRequest {
        seed: url::Url::parse("http://127.0.0.1:9/").unwrap(),
        max_pages: 0,
        mode: FetchMode::Static,
    };
    let result = orchestrate(request, &create_test_config()).await;
    assert!(matches!(result, Err(AuditError::Validation(_))));

    let mut config = create_test_config();
    config.crawler.concurrency = 0;
    let request = CrawlRequest::new("http://127.0.0.1:9/", 5, FetchMode::Static).unwrap();
    let result = orchestrate(request, &config).await;
    assert!(matches!(result, Err(AuditError::Config(_))));
}

#[test]
fn test_blocking_entry_point_validates() {
    let request = CrawlRequest {
        seed: url::Url::parse("http://127.0.0.1:9/").unwrap(),
        max_pages: 500,
        mode: FetchMode::Static,
    };
    let result = orchestrate_blocking(request, &create_test_config());
    assert!(matches!(result, Err(AuditError::Validation(_))));
}
