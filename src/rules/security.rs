//! Security header rules

use crate::config::Thresholds;
use crate::document::PageDocument;
use crate::rules::{evidence, Capability, Evidence, Rule, RuleError, Severity, Topic};
use serde_json::json;

pub(super) const RULES: &[Rule] = &[
    Rule {
        id: "SEC_CSP_MISSING",
        topic: Topic::Security,
        severity: Severity::Warning,
        legacy: false,
        reads: &[Capability::Headers],
        message: "No Content-Security-Policy header",
        check: csp_missing,
    },
    Rule {
        id: "SEC_HSTS_MISSING",
        topic: Topic::Security,
        severity: Severity::Warning,
        legacy: false,
        reads: &[Capability::Headers],
        message: "HTTPS page without Strict-Transport-Security header",
        check: hsts_missing,
    },
    Rule {
        id: "SEC_FRAME_OPTIONS_MISSING",
        topic: Topic::Security,
        severity: Severity::Info,
        legacy: false,
        reads: &[Capability::Headers],
        message: "Neither X-Frame-Options nor CSP frame-ancestors restricts framing",
        check: frame_options_missing,
    },
];

fn csp_missing(doc: &PageDocument, _: &Thresholds) -> Result<Vec<Evidence>, RuleError> {
    Ok(match doc.header("content-security-policy") {
        Some(_) => Vec::new(),
        None => vec![evidence(json!({ "header": "content-security-policy", "found": false }))],
    })
}

fn hsts_missing(doc: &PageDocument, _: &Thresholds) -> Result<Vec<Evidence>, RuleError> {
    if !doc.is_https() || doc.header("strict-transport-security").is_some() {
        return Ok(Vec::new());
    }
    Ok(vec![evidence(json!({ "header": "strict-transport-security", "found": false }))])
}

fn frame_options_missing(doc: &PageDocument, _: &Thresholds) -> Result<Vec<Evidence>, RuleError> {
    let frame_ancestors = doc
        .header("content-security-policy")
        .is_some_and(|csp| csp.to_ascii_lowercase().contains("frame-ancestors"));
    if doc.header("x-frame-options").is_some() || frame_ancestors {
        return Ok(Vec::new());
    }
    Ok(vec![evidence(json!({
        "checked": ["x-frame-options", "content-security-policy frame-ancestors"],
    }))])
}
