use crate::config::types::{Config, CrawlerConfig, RendererConfig, Thresholds, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Upper bound for the worker pool
const MAX_CONCURRENCY: u32 = 32;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_renderer_config(&config.renderer)?;
    validate_thresholds(&config.thresholds)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > MAX_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and {}, got {}",
            MAX_CONCURRENCY, config.concurrency
        )));
    }

    for (name, value) in [
        ("fetch-timeout-ms", config.fetch_timeout_ms),
        ("rendered-timeout-ms", config.rendered_timeout_ms),
        ("robots-timeout-ms", config.robots_timeout_ms),
        ("max-body-bytes", config.max_body_bytes),
    ] {
        if value == 0 {
            return Err(ConfigError::Validation(format!("{} must be > 0", name)));
        }
    }

    if config.max_body_bytes > config.reject_body_bytes {
        return Err(ConfigError::Validation(format!(
            "max-body-bytes ({}) cannot exceed reject-body-bytes ({})",
            config.max_body_bytes, config.reject_body_bytes
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Crawler name doubles as the robots.txt product token
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler-name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "crawler-name must contain only alphanumeric characters, hyphens and underscores, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::Validation(format!("Invalid contact-url: {}", e)))?;

    Ok(())
}

fn validate_renderer_config(config: &RendererConfig) -> Result<(), ConfigError> {
    Url::parse(&config.webdriver_url)
        .map_err(|e| ConfigError::Validation(format!("Invalid webdriver-url: {}", e)))?;
    Ok(())
}

/// Validates rule thresholds
fn validate_thresholds(thresholds: &Thresholds) -> Result<(), ConfigError> {
    if thresholds.title_min > thresholds.title_max {
        return Err(ConfigError::Validation(format!(
            "title-min ({}) cannot exceed title-max ({})",
            thresholds.title_min, thresholds.title_max
        )));
    }

    if thresholds.description_min > thresholds.description_max {
        return Err(ConfigError::Validation(format!(
            "description-min ({}) cannot exceed description-max ({})",
            thresholds.description_min, thresholds.description_max
        )));
    }

    if !(0.0..=1.0).contains(&thresholds.image_dimension_coverage) {
        return Err(ConfigError::Validation(format!(
            "image-dimension-coverage must be within [0, 1], got {}",
            thresholds.image_dimension_coverage
        )));
    }

    Ok(())
}
