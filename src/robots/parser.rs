//! robots.txt policy
//!
//! Matching is delegated to the robotstxt crate, which implements the same
//! longest-match semantics as Google's parser.

use robotstxt::DefaultMatcher;

/// A site's robots.txt policy
///
/// Holds the raw file and matches on demand, so the policy is cheap to clone
/// and share between workers. `None` means there is nothing to obey.
#[derive(Debug, Clone, Default)]
pub struct ParsedRobots {
    rules: Option<String>,
}

impl ParsedRobots {
    /// Builds a policy from the body of a robots.txt response
    pub fn from_content(content: &str) -> Self {
        let rules = (!content.trim().is_empty()).then(|| content.to_string());
        Self { rules }
    }

    /// Policy used when robots.txt is missing, unreachable or errors
    pub fn allow_all() -> Self {
        Self::default()
    }

    pub fn is_allow_all(&self) -> bool {
        self.rules.is_none()
    }

    /// Whether `product_token` may fetch `url`
    ///
    /// `url` is absolute; the matcher only looks at its path and query.
    pub fn is_allowed(&self, url: &str, product_token: &str) -> bool {
        match &self.rules {
            None => true,
            Some(rules) => {
                DefaultMatcher::default().one_agent_allowed_by_robots(rules, product_token, url)
            }
        }
    }
}
