//! Rule evaluation engine
//!
//! Rules are plain functions over a `PageDocument`. Each one declares the
//! document capabilities it reads, a fixed severity and topic, and a message
//! template filled from the evidence it returns. Rules are collected in a
//! `RuleCatalog` that is frozen before any crawl starts and shared read-only
//! by all workers.
//!
//! # Example
//!
//! ```
//! use seo_lantern::config::Thresholds;
//! use seo_lantern::rules::default_catalog;
//!
//! let catalog = default_catalog();
//! assert!(catalog.get("META_DESC_MISSING").is_some());
//! # let _ = Thresholds::default();
//! ```

mod accessibility;
mod aeo;
mod catalog;
mod content;
mod headings;
mod meta;
mod performance;
mod security;
mod social;
mod trust;

pub use catalog::{default_catalog, evaluate, RuleCatalog, RuleCatalogBuilder};

use crate::config::Thresholds;
use crate::document::PageDocument;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Id of the diagnostic finding emitted when a rule fails
pub const RULE_EVALUATION_ERROR: &str = "RULE_EVALUATION_ERROR";

/// Concrete evidence attached to a finding, e.g. `{"length": 182}`
pub type Evidence = Map<String, Value>;

/// Ordinal severity: info < warning < critical
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Topic a finding is reported under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Topic {
    Meta,
    Headings,
    Accessibility,
    Social,
    StructuredData,
    Performance,
    Security,
    Content,
    Trust,
    Aeo,
    Discovery,
    Engine,
}

impl Topic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Meta => "meta",
            Self::Headings => "headings",
            Self::Accessibility => "accessibility",
            Self::Social => "social",
            Self::StructuredData => "structured-data",
            Self::Performance => "performance",
            Self::Security => "security",
            Self::Content => "content",
            Self::Trust => "trust",
            Self::Aeo => "aeo",
            Self::Discovery => "discovery",
            Self::Engine => "engine",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Part of a `PageDocument` a rule reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Title,
    Meta,
    Headings,
    Images,
    Links,
    LinkTags,
    StructuredData,
    Headers,
    Body,
    Landmarks,
}

/// A rule's own failure, isolated by the engine
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("rule {rule_id} failed: {reason}")]
    Failed { rule_id: String, reason: String },

    #[error("rule {rule_id} panicked: {reason}")]
    Panicked { rule_id: String, reason: String },

    #[error("rule id {0} is already registered")]
    DuplicateId(String),
}

/// Rule body: returns one evidence map per finding, in document order
pub type RuleCheck = fn(&PageDocument, &Thresholds) -> Result<Vec<Evidence>, RuleError>;

/// A registered rule
#[derive(Clone, Copy)]
pub struct Rule {
    pub id: &'static str,
    pub topic: Topic,
    pub severity: Severity,
    /// Counts toward the legacy must-have score
    pub legacy: bool,
    pub reads: &'static [Capability],
    /// Message template; `{key}` is replaced by the evidence value
    pub message: &'static str,
    pub check: RuleCheck,
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("topic", &self.topic)
            .field("severity", &self.severity)
            .field("legacy", &self.legacy)
            .field("reads", &self.reads)
            .finish_non_exhaustive()
    }
}

impl Rule {
    /// Runs the rule and turns its evidence into findings
    pub fn run(
        &self,
        doc: &PageDocument,
        thresholds: &Thresholds,
    ) -> Result<Vec<Finding>, RuleError> {
        let hits = (self.check)(doc, thresholds)?;
        Ok(hits
            .into_iter()
            .map(|evidence| Finding {
                rule_id: self.id.to_string(),
                topic: self.topic,
                severity: self.severity,
                message: render_message(self.message, &evidence),
                evidence,
                legacy: self.legacy,
            })
            .collect())
    }

    pub fn reads(&self, capability: Capability) -> bool {
        self.reads.contains(&capability)
    }
}

/// One rule's output for one page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub rule_id: String,
    pub topic: Topic,
    pub severity: Severity,
    pub message: String,
    pub evidence: Evidence,
    #[serde(skip)]
    pub legacy: bool,
}

impl Finding {
    /// Builds a finding outside of a page rule (site-level checks, diagnostics)
    pub fn new(
        rule_id: &str,
        topic: Topic,
        severity: Severity,
        message: impl Into<String>,
        evidence: Evidence,
    ) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            topic,
            severity,
            message: message.into(),
            evidence,
            legacy: false,
        }
    }

    /// Diagnostic finding for a rule that failed or panicked
    pub fn rule_error(error: &RuleError) -> Self {
        let rule_id = match error {
            RuleError::Failed { rule_id, .. }
            | RuleError::Panicked { rule_id, .. } => rule_id.clone(),
            RuleError::DuplicateId(id) => id.clone(),
        };
        Self::new(
            RULE_EVALUATION_ERROR,
            Topic::Engine,
            Severity::Info,
            format!("Rule {} could not be evaluated", rule_id),
            evidence(serde_json::json!({
                "rule_id": rule_id,
                "error": error.to_string(),
            })),
        )
    }
}

/// Converts a JSON object into evidence; other values land under `value`
pub fn evidence(value: Value) -> Evidence {
    match value {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), other);
            map
        }
    }
}

/// Fills `{key}` placeholders from the evidence
fn render_message(template: &str, evidence: &Evidence) -> String {
    let mut message = template.to_string();
    for (key, value) in evidence {
        let placeholder = format!("{{{}}}", key);
        if message.contains(&placeholder) {
            let text = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            message = message.replace(&placeholder, &text);
        }
    }
    message
}

/// Every `@type` declared in the page's parseable JSON-LD blocks
///
/// Nested objects count (`author`, `@graph`, `mainEntity`), so a `Person`
/// author inside an `Article` is found. Blocks that fail to parse are
/// skipped; `JSONLD_INVALID` reports them.
pub(crate) fn json_ld_types(doc: &PageDocument) -> BTreeSet<String> {
    fn collect(value: &Value, types: &mut BTreeSet<String>) {
        match value {
            Value::Object(map) => {
                match map.get("@type") {
                    Some(Value::String(t)) => {
                        types.insert(t.clone());
                    }
                    Some(Value::Array(list)) => {
                        types.extend(list.iter().filter_map(Value::as_str).map(str::to_string));
                    }
                    _ => {}
                }
                map.values().for_each(|v| collect(v, types));
            }
            Value::Array(items) => items.iter().for_each(|v| collect(v, types)),
            _ => {}
        }
    }

    let mut types = BTreeSet::new();
    for block in &doc.json_ld {
        if let Ok(value) = serde_json::from_str::<Value>(block) {
            collect(&value, &mut types);
        }
    }
    types
}

/// Character length as users perceive it
pub(crate) fn char_len(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Critical);
    }

    #[test]
    fn test_render_message() {
        let ev = evidence(json!({"length": 182, "max": 160, "tag": "title"}));
        assert_eq!(
            render_message("{tag} is {length} characters (max {max})", &ev),
            "title is 182 characters (max 160)"
        );
        assert_eq!(render_message("no placeholders", &ev), "no placeholders");
    }

    #[test]
    fn test_finding_serialization() {
        let finding = Finding::new(
            "META_DESC_MISSING",
            Topic::Meta,
            Severity::Warning,
            "Missing",
            evidence(json!({"meta": "description"})),
        );
        let value = serde_json::to_value(&finding).unwrap();
        assert_eq!(
            value,
            json!({
                "rule_id": "META_DESC_MISSING",
                "topic": "meta",
                "severity": "warning",
                "message": "Missing",
                "evidence": {"meta": "description"}
            })
        );
    }

    #[test]
    fn test_topic_serialization() {
        assert_eq!(
            serde_json::to_string(&Topic::StructuredData).unwrap(),
            "\"structured-data\""
        );
        assert_eq!(Topic::StructuredData.as_str(), "structured-data");
        assert_eq!(serde_json::to_string(&Topic::Aeo).unwrap(), "\"aeo\"");
        assert_eq!(Topic::Trust.to_string(), "trust");
    }

    #[test]
    fn test_json_ld_types_walks_nested_values() {
        let mut doc = crate::document::fixtures::empty_document();
        doc.json_ld = vec![
            r#"{"@type": "Article", "author": {"@type": "Person", "name": "Ada"}}"#.to_string(),
            r#"{"@graph": [{"@type": ["FAQPage", "WebPage"]}]}"#.to_string(),
            "{not json".to_string(),
        ];

        let types: Vec<String> = json_ld_types(&doc).into_iter().collect();
        assert_eq!(types, vec!["Article", "FAQPage", "Person", "WebPage"]);
    }

    #[test]
    fn test_rule_error_finding() {
        let finding = Finding::rule_error(&RuleError::Panicked {
            rule_id: "X".to_string(),
            reason: "boom".to_string(),
        });
        assert_eq!(finding.rule_id, RULE_EVALUATION_ERROR);
        assert_eq!(finding.topic, Topic::Engine);
        assert_eq!(finding.evidence["rule_id"], json!("X"));
    }
}
