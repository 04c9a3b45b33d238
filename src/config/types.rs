use serde::{Deserialize, Serialize};

/// Main configuration structure for SEO Lantern
///
/// Every section is optional in the TOML file; missing sections and keys
/// fall back to the defaults below.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub renderer: RendererConfig,
    pub scoring: ScoringConfig,
    pub thresholds: Thresholds,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Number of concurrent fetch+parse+evaluate workers
    pub concurrency: u32,

    /// Per-fetch timeout for plain HTTP fetches (milliseconds)
    pub fetch_timeout_ms: u64,

    /// Per-fetch timeout for browser-rendered fetches (milliseconds)
    pub rendered_timeout_ms: u64,

    /// Timeout for robots.txt and discovery-file requests (milliseconds)
    pub robots_timeout_ms: u64,

    /// Bodies larger than this are truncated and flagged
    pub max_body_bytes: u64,

    /// Responses declaring a larger Content-Length are rejected outright
    pub reject_body_bytes: u64,

    /// Overall run deadline (milliseconds, 0 disables it)
    pub run_deadline_ms: u64,

    /// Whether to fetch /llms.txt and /ai.txt on the seed origin
    pub check_discovery_files: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            fetch_timeout_ms: 15_000,
            rendered_timeout_ms: 30_000,
            robots_timeout_ms: 6_000,
            max_body_bytes: 2_000_000,
            reject_body_bytes: 20_000_000,
            run_deadline_ms: 120_000,
            check_discovery_files: true,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct UserAgentConfig {
    /// Name of the crawler, also the robots.txt product token
    pub crawler_name: String,

    /// Version of the crawler
    pub crawler_version: String,

    /// URL with information about the crawler
    pub contact_url: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "SeoLantern".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/bot".to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the full User-Agent header: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{})",
            self.crawler_name, self.crawler_version, self.contact_url
        )
    }
}

/// Browser renderer configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RendererConfig {
    /// WebDriver endpoint (chromedriver, geckodriver, selenium)
    pub webdriver_url: String,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:4444".to_string(),
        }
    }
}

/// Severity to penalty table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub critical: u32,
    pub warning: u32,
    pub info: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            critical: 15,
            warning: 6,
            info: 2,
        }
    }
}

/// Tunable rule boundaries
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Thresholds {
    pub title_min: usize,
    pub title_max: usize,
    pub description_min: usize,
    pub description_max: usize,
    pub html_size_max_bytes: usize,
    pub min_word_count: usize,
    /// Minimum share of images that declare both width and height
    pub image_dimension_coverage: f64,
    /// Pages with fewer images are not expected to lazy-load
    pub lazy_image_min_count: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            title_min: 10,
            title_max: 70,
            description_min: 50,
            description_max: 160,
            html_size_max_bytes: 150_000,
            min_word_count: 300,
            image_dimension_coverage: 0.8,
            lazy_image_min_count: 3,
        }
    }
}
