//! SEO Lantern: an on-page SEO auditor
//!
//! This crate crawls a bounded set of same-site pages, respecting robots.txt,
//! and scores each page against a catalog of SEO rules. Every score is
//! explained by the findings that produced it.

pub mod config;
pub mod crawler;
pub mod document;
pub mod output;
pub mod robots;
pub mod rules;
pub mod scoring;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for crawl runs
///
/// Only request validation and an unreachable seed end a run early; every
/// other failure is recorded on the affected page.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Invalid crawl request: {0}")]
    Validation(#[from] ValidationError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Seed URL {url} is unreachable: {reason}")]
    SeedUnreachable { url: String, reason: String },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::UrlState,
        to: state::UrlState,
    },

    #[error("Runtime error: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Errors raised while validating a crawl request, before any network activity
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("URL is not a valid absolute URL: {0}")]
    InvalidUrl(String),

    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("URL has no host")]
    MissingHost,

    #[error("max_pages must be between 1 and {max}, got {got}")]
    MaxPagesOutOfRange { got: i64, max: u32 },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Per-page fetch failures
///
/// These never abort a run; they are recorded on the page's result.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Request timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Response too large: {declared} bytes declared, limit is {limit}")]
    TooLarge { declared: u64, limit: u64 },

    #[error("Redirect left the audited site: {location}")]
    OffSiteRedirect { location: String },

    #[error("More than {limit} redirects")]
    TooManyRedirects { limit: usize },

    #[error("Fetch cancelled")]
    Cancelled,
}

impl FetchError {
    /// Stable tag used in report evidence
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::Connection(_) => "connection_error",
            Self::Http(_) => "http_error",
            Self::TooLarge { .. } => "too_large",
            Self::OffSiteRedirect { .. } => "redirect_off_site",
            Self::TooManyRedirects { .. } => "too_many_redirects",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Raised when a fetched body is not an HTML document
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Content-Type {content_type} is not HTML")]
    NotHtml { content_type: String },

    #[error("Body looks like binary data")]
    Binary,
}

/// Result type alias for crawl runs
pub type Result<T> = std::result::Result<T, AuditError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{orchestrate, orchestrate_blocking, orchestrate_with_cancel};
pub use output::{CrawlReport, CrawlRequest, CrawlRequestInput, FetchMode, PageResult};
pub use rules::{Finding, Severity, Topic};
pub use state::UrlState;
