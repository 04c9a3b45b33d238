//! Trust and authorship signals
//!
//! Search engines weigh who stands behind a page. These rules look for the
//! pages a legitimate site usually links to and for a declared author.

use crate::config::Thresholds;
use crate::document::PageDocument;
use crate::rules::{
    evidence, json_ld_types, Capability, Evidence, Rule, RuleError, Severity, Topic,
};
use serde_json::json;

/// Keywords matched against link targets and anchor text
const TRUST_PAGE_KEYWORDS: &[&str] = &["privacy", "terms", "legal", "mentions", "about", "contact"];

/// How many distinct keywords must be linked
const MIN_TRUST_PAGES: usize = 4;

pub(super) const RULES: &[Rule] = &[
    Rule {
        id: "TRUST_PAGES_MISSING",
        topic: Topic::Trust,
        severity: Severity::Warning,
        legacy: false,
        reads: &[Capability::Links],
        message: "Only {found_count} of {min} trust pages are linked (missing: {missing_list})",
        check: trust_pages_missing,
    },
    Rule {
        id: "AUTHOR_SCHEMA_MISSING",
        topic: Topic::Trust,
        severity: Severity::Info,
        legacy: false,
        reads: &[Capability::StructuredData],
        message: "No Person schema declares who wrote the page",
        check: author_schema_missing,
    },
];

fn trust_pages_missing(doc: &PageDocument, _: &Thresholds) -> Result<Vec<Evidence>, RuleError> {
    let haystacks: Vec<String> = doc
        .links
        .iter()
        .map(|link| format!("{} {}", link.href, link.text).to_lowercase())
        .collect();

    let (found, missing): (Vec<&str>, Vec<&str>) = TRUST_PAGE_KEYWORDS
        .iter()
        .copied()
        .partition(|keyword| haystacks.iter().any(|h| h.contains(keyword)));

    if found.len() >= MIN_TRUST_PAGES {
        return Ok(Vec::new());
    }
    Ok(vec![evidence(json!({
        "found": found,
        "found_count": found.len(),
        "min": MIN_TRUST_PAGES,
        "missing_list": missing.join(", "),
    }))])
}

fn author_schema_missing(doc: &PageDocument, _: &Thresholds) -> Result<Vec<Evidence>, RuleError> {
    let types = json_ld_types(doc);
    if types.contains("Person") {
        return Ok(Vec::new());
    }
    Ok(vec![evidence(json!({
        "schema": "Person",
        "types_found": types,
    }))])
}
