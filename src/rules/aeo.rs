//! Answer-engine readiness and emerging web standards
//!
//! AI assistants quote pages that say plainly what they contain. These rules
//! check for the meta tags and schema types those engines read, plus the web
//! app manifest.

use crate::config::Thresholds;
use crate::document::PageDocument;
use crate::rules::{
    evidence, json_ld_types, Capability, Evidence, Rule, RuleError, Severity, Topic,
};
use serde_json::json;

const AEO_META_NAMES: &[&str] = &["ai-content-declaration", "llm-friendly", "content-summary"];

/// Schema types answer engines lift answers from
const ANSWER_SCHEMA_TYPES: &[&str] = &["FAQPage", "HowTo", "QAPage", "BlogPosting"];

pub(super) const RULES: &[Rule] = &[
    Rule {
        id: "AEO_META_TAGS_MISSING",
        topic: Topic::Aeo,
        severity: Severity::Info,
        legacy: false,
        reads: &[Capability::Meta],
        message: "No AI-facing meta tag ({expected_list})",
        check: aeo_meta_tags_missing,
    },
    Rule {
        id: "SCHEMA_ANSWER_TYPES_MISSING",
        topic: Topic::StructuredData,
        severity: Severity::Info,
        legacy: false,
        reads: &[Capability::StructuredData],
        message: "Structured data has no FAQPage, HowTo or Article type",
        check: answer_schema_missing,
    },
    Rule {
        id: "WEB_MANIFEST_MISSING",
        topic: Topic::Aeo,
        severity: Severity::Info,
        legacy: false,
        reads: &[Capability::LinkTags],
        message: "No <link rel=\"manifest\"> web app manifest",
        check: web_manifest_missing,
    },
];

fn aeo_meta_tags_missing(doc: &PageDocument, _: &Thresholds) -> Result<Vec<Evidence>, RuleError> {
    if AEO_META_NAMES.iter().any(|name| doc.meta(name).is_some()) {
        return Ok(Vec::new());
    }
    Ok(vec![evidence(json!({
        "expected": AEO_META_NAMES,
        "expected_list": AEO_META_NAMES.join(", "),
    }))])
}

fn is_answer_type(schema_type: &str) -> bool {
    // Article, NewsArticle, TechArticle, ScholarlyArticle...
    schema_type.ends_with("Article") || ANSWER_SCHEMA_TYPES.contains(&schema_type)
}

/// Fires only on pages that carry JSON-LD; its absence is `JSONLD_MISSING`
fn answer_schema_missing(doc: &PageDocument, _: &Thresholds) -> Result<Vec<Evidence>, RuleError> {
    if doc.json_ld.is_empty() {
        return Ok(Vec::new());
    }
    let types = json_ld_types(doc);
    if types.iter().any(|t| is_answer_type(t)) {
        return Ok(Vec::new());
    }
    Ok(vec![evidence(json!({ "types_found": types }))])
}

fn web_manifest_missing(doc: &PageDocument, _: &Thresholds) -> Result<Vec<Evidence>, RuleError> {
    if doc.link_tags.iter().any(|tag| tag.has_rel("manifest")) {
        return Ok(Vec::new());
    }
    Ok(vec![evidence(json!({ "rel": "manifest", "found": false }))])
}
