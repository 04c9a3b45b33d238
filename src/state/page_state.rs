/// URL state definitions for tracking crawl progress
use crate::AuditError;
use serde::Serialize;
use std::fmt;

/// Represents the current state of a URL record in one crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UrlState {
    // ===== Active States =====
    /// Admitted to the frontier and waiting for a worker
    Queued,

    /// A worker is fetching and evaluating the URL
    Fetching,

    // ===== Terminal States =====
    /// Fetched, parsed and evaluated
    Done,

    /// Fetch or parse failed, or the run was cancelled mid-flight
    Failed,

    /// Never fetched (disallowed by robots.txt or cancelled while queued)
    Skipped,
}

impl UrlState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed | Self::Skipped)
    }

    /// Returns true if the transition `self -> to` is part of the lifecycle
    ///
    /// `Fetching -> Skipped` is not allowed: once a fetch has started the
    /// URL can only end as `Done` or `Failed`.
    pub fn can_transition_to(&self, to: UrlState) -> bool {
        matches!(
            (self, to),
            (Self::Queued, Self::Fetching)
                | (Self::Queued, Self::Skipped)
                | (Self::Fetching, Self::Done)
                | (Self::Fetching, Self::Failed)
        )
    }

    /// Performs a checked transition
    pub fn transition(self, to: UrlState) -> Result<UrlState, AuditError> {
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err(AuditError::InvalidTransition { from: self, to })
        }
    }

    /// Stable lowercase name, as serialized in reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Fetching => "fetching",
            Self::Done => "done",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for UrlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
