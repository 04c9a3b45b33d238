//! Accessibility rules

use crate::config::Thresholds;
use crate::document::PageDocument;
use crate::rules::{evidence, Capability, Evidence, Rule, RuleError, Severity, Topic};
use serde_json::json;

/// How many offending image sources are quoted in evidence
const SAMPLE_SIZE: usize = 5;

const LANDMARKS: &[&str] = &["main", "nav", "header", "footer"];

pub(super) const RULES: &[Rule] = &[
    Rule {
        id: "VIEWPORT_MISSING",
        topic: Topic::Accessibility,
        severity: Severity::Critical,
        legacy: true,
        reads: &[Capability::Meta],
        message: "No viewport meta tag; the page will not scale on mobile",
        check: viewport_missing,
    },
    Rule {
        id: "IMG_ALT_MISSING",
        topic: Topic::Accessibility,
        severity: Severity::Warning,
        legacy: false,
        reads: &[Capability::Images],
        message: "{missing} of {total} images have no alt text",
        check: img_alt_missing,
    },
    Rule {
        id: "HTML_LANG_MISSING",
        topic: Topic::Accessibility,
        severity: Severity::Warning,
        legacy: false,
        reads: &[Capability::Body],
        message: "The <html> element has no lang attribute",
        check: html_lang_missing,
    },
    Rule {
        id: "LANDMARKS_MISSING",
        topic: Topic::Accessibility,
        severity: Severity::Info,
        legacy: false,
        reads: &[Capability::Landmarks],
        message: "Landmark regions missing: {missing_list}",
        check: landmarks_missing,
    },
];

fn viewport_missing(doc: &PageDocument, _: &Thresholds) -> Result<Vec<Evidence>, RuleError> {
    Ok(match doc.meta("viewport") {
        Some(_) => Vec::new(),
        None => vec![evidence(json!({ "meta": "viewport", "found": false }))],
    })
}

fn img_alt_missing(doc: &PageDocument, _: &Thresholds) -> Result<Vec<Evidence>, RuleError> {
    let missing: Vec<&str> = doc
        .images
        .iter()
        .filter(|img| !img.has_alt())
        .map(|img| img.src.as_deref().unwrap_or(""))
        .collect();
    if missing.is_empty() {
        return Ok(Vec::new());
    }
    Ok(vec![evidence(json!({
        "missing": missing.len(),
        "total": doc.images.len(),
        "sample": missing.iter().take(SAMPLE_SIZE).collect::<Vec<_>>(),
    }))])
}

fn html_lang_missing(doc: &PageDocument, _: &Thresholds) -> Result<Vec<Evidence>, RuleError> {
    Ok(match doc.html_lang {
        Some(_) => Vec::new(),
        None => vec![evidence(json!({ "attribute": "lang", "found": false }))],
    })
}

fn landmarks_missing(doc: &PageDocument, _: &Thresholds) -> Result<Vec<Evidence>, RuleError> {
    let missing: Vec<&str> = LANDMARKS
        .iter()
        .copied()
        .filter(|landmark| !doc.landmarks.contains(*landmark))
        .collect();
    if missing.is_empty() {
        return Ok(Vec::new());
    }
    Ok(vec![evidence(json!({
        "missing": missing,
        "missing_list": missing.join(", "),
    }))])
}
