//! Heading structure rules

use crate::config::Thresholds;
use crate::document::PageDocument;
use crate::rules::{evidence, Capability, Evidence, Rule, RuleError, Severity, Topic};
use serde_json::json;

pub(super) const RULES: &[Rule] = &[
    Rule {
        id: "HEADINGS_NONE",
        topic: Topic::Headings,
        severity: Severity::Warning,
        legacy: false,
        reads: &[Capability::Headings],
        message: "Page has no headings at all; its outline is empty",
        check: headings_none,
    },
    Rule {
        id: "H1_MISSING",
        topic: Topic::Headings,
        severity: Severity::Critical,
        legacy: true,
        reads: &[Capability::Headings],
        message: "Page has no <h1>",
        check: h1_missing,
    },
    Rule {
        id: "H1_MULTIPLE",
        topic: Topic::Headings,
        severity: Severity::Warning,
        legacy: true,
        reads: &[Capability::Headings],
        message: "Page has {h1_count} <h1> elements; use exactly one",
        check: h1_multiple,
    },
    Rule {
        id: "HEADING_LEVEL_SKIP",
        topic: Topic::Headings,
        severity: Severity::Warning,
        legacy: false,
        reads: &[Capability::Headings],
        message: "Heading level jumps from {from} to {to}",
        check: heading_level_skip,
    },
];

fn headings_none(doc: &PageDocument, _: &Thresholds) -> Result<Vec<Evidence>, RuleError> {
    Ok(match doc.headings.len() {
        0 => vec![evidence(json!({ "headings": 0 }))],
        _ => Vec::new(),
    })
}

fn h1_missing(doc: &PageDocument, _: &Thresholds) -> Result<Vec<Evidence>, RuleError> {
    Ok(match doc.h1_count() {
        0 => vec![evidence(json!({ "h1_count": 0 }))],
        _ => Vec::new(),
    })
}

fn h1_multiple(doc: &PageDocument, _: &Thresholds) -> Result<Vec<Evidence>, RuleError> {
    let texts: Vec<&str> = doc
        .headings
        .iter()
        .filter(|h| h.level == 1)
        .map(|h| h.text.as_str())
        .collect();
    if texts.len() <= 1 {
        return Ok(Vec::new());
    }
    Ok(vec![evidence(json!({
        "h1_count": texts.len(),
        "texts": texts,
    }))])
}

/// One finding per place where the outline descends more than one level
fn heading_level_skip(doc: &PageDocument, _: &Thresholds) -> Result<Vec<Evidence>, RuleError> {
    let hits = doc
        .headings
        .windows(2)
        .filter(|pair| pair[1].level > pair[0].level + 1)
        .map(|pair| {
            evidence(json!({
                "from": format!("h{}", pair[0].level),
                "to": format!("h{}", pair[1].level),
                "text": pair[1].text,
            }))
        })
        .collect();
    Ok(hits)
}
