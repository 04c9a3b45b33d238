//! Output module for crawl requests and reports
//!
//! This module handles:
//! - Validating crawl requests
//! - The per-page result and report types returned to callers
//! - Rendering reports as JSON or markdown

mod markdown;
mod report;

pub use markdown::{format_markdown_report, generate_markdown_report};
pub use report::{
    CrawlReport, CrawlRequest, CrawlRequestInput, FetchMode, OutputError, OutputResult,
    PageError, PageResult, DEFAULT_MAX_PAGES, MAX_PAGES_LIMIT,
};
