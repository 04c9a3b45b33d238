//! Per-origin robots.txt cache
//!
//! The cache lives for a single crawl run. It is read-mostly: each origin is
//! written once on first access. Two workers racing on the same origin may
//! both fetch; the last write wins, which is harmless since the policy is the
//! same either way.

use crate::robots::ParsedRobots;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Cached robots.txt data for one origin
#[derive(Debug, Clone)]
pub struct CachedRobots {
    /// The parsed robots.txt content
    pub content: ParsedRobots,

    /// Whether the origin actually served a robots.txt (HTTP 200)
    pub found: bool,

    /// When the robots.txt was fetched
    pub fetched_at: DateTime<Utc>,
}

impl CachedRobots {
    /// Creates a new CachedRobots stamped with the current time
    pub fn new(content: ParsedRobots, found: bool) -> Self {
        Self {
            content,
            found,
            fetched_at: Utc::now(),
        }
    }

    /// Checks if a URL is allowed according to the cached robots.txt
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        self.content.is_allowed(url, user_agent)
    }
}

/// Shared robots.txt cache keyed by origin (`scheme://host[:port]`)
#[derive(Debug, Default)]
pub struct RobotsCache {
    entries: RwLock<HashMap<String, Arc<CachedRobots>>>,
}

impl RobotsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached entry for an origin, if any
    pub fn get(&self, origin: &str) -> Option<Arc<CachedRobots>> {
        let entries = self
            .entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.get(origin).cloned()
    }

    /// Stores an entry, replacing any previous one for the origin
    pub fn insert(&self, origin: &str, robots: CachedRobots) -> Arc<CachedRobots> {
        let robots = Arc::new(robots);
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.insert(origin.to_string(), Arc::clone(&robots));
        robots
    }

    /// Number of cached origins
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
