//! Crawl request and report types
//!
//! The serialized field names of `CrawlReport` and `PageResult` are an
//! external contract; other tooling binds to them.

use crate::document::PageDocument;
use crate::rules::{Evidence, Finding};
use crate::scoring::Scores;
use crate::state::UrlState;
use crate::url::normalize;
use crate::ValidationError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Default page budget when the caller does not give one
pub const DEFAULT_MAX_PAGES: u32 = 60;

/// Largest page budget a caller may request
pub const MAX_PAGES_LIMIT: u32 = 200;

/// Errors that can occur while writing reports
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Which fetcher backend a crawl uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// Plain HTTP client
    #[default]
    Static,
    /// Browser-rendered DOM through WebDriver
    Rendered,
}

/// Raw input as received from a caller (JSON body, CLI)
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlRequestInput {
    pub url: String,
    #[serde(default)]
    pub max_pages: Option<i64>,
    #[serde(default)]
    pub js: Option<bool>,
}

/// A validated crawl request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlRequest {
    /// Normalized seed URL
    pub seed: Url,
    pub max_pages: u32,
    pub mode: FetchMode,
}

impl CrawlRequest {
    /// Validates and normalizes a request
    ///
    /// # Examples
    ///
    /// ```
    /// use seo_lantern::{CrawlRequest, FetchMode};
    ///
    /// let request = CrawlRequest::new("https://Example.com/#top", 10, FetchMode::Static).unwrap();
    /// assert_eq!(request.seed.as_str(), "https://example.com/");
    ///
    /// assert!(CrawlRequest::new("not a url", 10, FetchMode::Static).is_err());
    /// assert!(CrawlRequest::new("https://example.com/", 0, FetchMode::Static).is_err());
    /// ```
    pub fn new(url: &str, max_pages: u32, mode: FetchMode) -> Result<Self, ValidationError> {
        Self::validate(url, i64::from(max_pages), mode)
    }

    fn validate(url: &str, max_pages: i64, mode: FetchMode) -> Result<Self, ValidationError> {
        let parsed =
            Url::parse(url.trim()).map_err(|e| ValidationError::InvalidUrl(format!("{url}: {e}")))?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ValidationError::UnsupportedScheme(
                parsed.scheme().to_string(),
            ));
        }
        if parsed.host_str().map_or(true, str::is_empty) {
            return Err(ValidationError::MissingHost);
        }

        let max_pages = u32::try_from(max_pages)
            .ok()
            .filter(|n| (1..=MAX_PAGES_LIMIT).contains(n))
            .ok_or(ValidationError::MaxPagesOutOfRange {
                got: max_pages,
                max: MAX_PAGES_LIMIT,
            })?;

        let seed = normalize(&parsed).map_err(|e| ValidationError::InvalidUrl(e.to_string()))?;

        Ok(Self {
            seed,
            max_pages,
            mode,
        })
    }
}

impl TryFrom<CrawlRequestInput> for CrawlRequest {
    type Error = ValidationError;

    fn try_from(input: CrawlRequestInput) -> Result<Self, Self::Error> {
        let mode = if input.js.unwrap_or(false) {
            FetchMode::Rendered
        } else {
            FetchMode::Static
        };
        Self::validate(
            &input.url,
            input.max_pages.unwrap_or(i64::from(DEFAULT_MAX_PAGES)),
            mode,
        )
    }
}

/// Why a page was not evaluated
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageError {
    /// Stable tag: timeout, connection_error, http_error, too_large,
    /// cancelled, not_html, robots_disallowed, redirect_off_site,
    /// too_many_redirects
    pub kind: String,
    pub evidence: Evidence,
}

/// Result for one URL
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageResult {
    pub url: String,
    /// HTTP status, 0 when no response was received
    pub status: u16,
    pub title: String,
    pub score_global: i32,
    pub score_legacy: i32,
    pub score_rules: i32,
    pub recommendations: Vec<Finding>,
    pub meta_description: String,
    pub h1_count: usize,
    pub images_without_alt: usize,
    pub word_count: usize,
    pub state: UrlState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<PageError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical: Option<String>,
    /// Where redirects led, when that differs from `url`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_url: Option<String>,
    pub h2_count: usize,
    pub images_count: usize,
    pub html_bytes: usize,
}

impl PageResult {
    /// Result of a fully evaluated page
    pub fn evaluated(doc: &PageDocument, findings: Vec<Finding>, scores: Scores) -> Self {
        Self {
            url: doc.url.to_string(),
            status: doc.status,
            title: doc.title.clone().unwrap_or_default(),
            score_global: scores.global,
            score_legacy: scores.legacy,
            score_rules: scores.rules,
            recommendations: findings,
            meta_description: doc.meta("description").unwrap_or_default().to_string(),
            h1_count: doc.h1_count(),
            images_without_alt: doc.images_without_alt(),
            word_count: doc.word_count,
            state: UrlState::Done,
            error: None,
            canonical: doc
                .canonical()
                .and_then(|c| c.resolved.as_ref().map(Url::to_string)),
            final_url: (doc.final_url != doc.url).then(|| doc.final_url.to_string()),
            h2_count: doc.heading_count(2),
            images_count: doc.images.len(),
            html_bytes: doc.byte_size,
        }
    }

    /// Result of a page that could not be evaluated
    pub fn failed(url: &Url, status: Option<u16>, kind: &str, evidence: Evidence) -> Self {
        Self::unevaluated(url, status, UrlState::Failed, kind, evidence)
    }

    /// Result of a page that was never fetched
    pub fn skipped(url: &Url, kind: &str, evidence: Evidence) -> Self {
        Self::unevaluated(url, None, UrlState::Skipped, kind, evidence)
    }

    fn unevaluated(
        url: &Url,
        status: Option<u16>,
        state: UrlState,
        kind: &str,
        evidence: Evidence,
    ) -> Self {
        Self {
            url: url.to_string(),
            status: status.unwrap_or(0),
            title: String::new(),
            score_global: 0,
            score_legacy: 0,
            score_rules: 0,
            recommendations: Vec::new(),
            meta_description: String::new(),
            h1_count: 0,
            images_without_alt: 0,
            word_count: 0,
            state,
            error: Some(PageError {
                kind: kind.to_string(),
                evidence,
            }),
            canonical: None,
            final_url: None,
            h2_count: 0,
            images_count: 0,
            html_bytes: 0,
        }
    }
}

/// Final report of one crawl run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrawlReport {
    /// Number of entries in `data`
    pub pages: usize,
    /// Page results in discovery order
    pub data: Vec<PageResult>,
    /// Site-level findings (auxiliary discovery files, robots.txt)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub site_recommendations: Vec<Finding>,
}

impl CrawlReport {
    pub fn new(data: Vec<PageResult>, site_recommendations: Vec<Finding>) -> Self {
        Self {
            pages: data.len(),
            data,
            site_recommendations,
        }
    }

    pub fn to_json_pretty(&self) -> OutputResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Results that reached the `done` state
    pub fn evaluated(&self) -> impl Iterator<Item = &PageResult> {
        self.data.iter().filter(|p| p.state == UrlState::Done)
    }
}
