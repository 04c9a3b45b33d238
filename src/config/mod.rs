//! Configuration module for SEO Lantern
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! The configuration is optional: `Config::default()` is a valid configuration.
//!
//! # Example
//!
//! ```no_run
//! use seo_lantern::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("lantern.toml")).unwrap();
//! println!("Workers: {}", config.crawler.concurrency);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, RendererConfig, ScoringConfig, Thresholds, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
