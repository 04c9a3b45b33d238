//! Scoring aggregator
//!
//! Scores start at 100 and lose a fixed, severity-dependent penalty per
//! finding. Three numbers are reported:
//!
//! - `legacy`: 100 minus the penalties of the must-have rules (title, meta
//!   description, one H1, viewport), clamped to [0, 100]
//! - `rules`: minus the penalties of every other rule (zero or negative)
//! - `global`: `legacy + rules`, clamped to [0, 100]

use crate::config::ScoringConfig;
use crate::rules::{Finding, Severity};

const MAX_SCORE: i64 = 100;

/// Fixed severity to penalty table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PenaltyTable {
    critical: u32,
    warning: u32,
    info: u32,
}

impl PenaltyTable {
    pub fn penalty(&self, severity: Severity) -> u32 {
        match severity {
            Severity::Critical => self.critical,
            Severity::Warning => self.warning,
            Severity::Info => self.info,
        }
    }
}

impl From<&ScoringConfig> for PenaltyTable {
    fn from(config: &ScoringConfig) -> Self {
        Self {
            critical: config.critical,
            warning: config.warning,
            info: config.info,
        }
    }
}

impl Default for PenaltyTable {
    fn default() -> Self {
        Self::from(&ScoringConfig::default())
    }
}

/// The three scores reported per page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Scores {
    pub global: i32,
    pub legacy: i32,
    pub rules: i32,
}

/// Scores a page from its findings
pub fn score(findings: &[Finding], table: &PenaltyTable) -> Scores {
    let (legacy_penalty, rules_penalty) =
        findings
            .iter()
            .fold((0i64, 0i64), |(legacy, rules), finding| {
                let penalty = i64::from(table.penalty(finding.severity));
                if finding.legacy {
                    (legacy + penalty, rules)
                } else {
                    (legacy, rules + penalty)
                }
            });

    let legacy = (MAX_SCORE - legacy_penalty).clamp(0, MAX_SCORE);
    let rules = -rules_penalty;
    let global = (legacy + rules).clamp(0, MAX_SCORE);

    Scores {
        global: global as i32,
        legacy: legacy as i32,
        rules: i32::try_from(rules).unwrap_or(i32::MIN),
    }
}
