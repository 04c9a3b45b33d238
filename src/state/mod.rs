//! State module for tracking crawl progress
//!
//! Every URL admitted to the frontier carries a `UrlState`. Transitions are
//! checked so that a URL is fetched at most once and reaches exactly one
//! terminal state.

mod page_state;

// Re-export main types
pub use page_state::UrlState;
