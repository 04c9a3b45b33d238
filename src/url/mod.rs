//! URL handling module for SEO Lantern
//!
//! This module provides URL normalization (the frontier's dedup key) and the
//! same-site scope check used when following discovered links.

mod domain;
mod normalize;

// Re-export main functions
pub use domain::{extract_domain, is_same_site, origin_of};
pub use normalize::{normalize, normalize_url};
