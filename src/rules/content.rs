//! Content and linking rules

use crate::config::Thresholds;
use crate::document::PageDocument;
use crate::rules::{evidence, Capability, Evidence, Rule, RuleError, Severity, Topic};
use serde_json::json;

pub(super) const RULES: &[Rule] = &[
    Rule {
        id: "CONTENT_THIN",
        topic: Topic::Content,
        severity: Severity::Info,
        legacy: false,
        reads: &[Capability::Body],
        message: "Page has {word_count} words; aim for at least {min}",
        check: content_thin,
    },
    Rule {
        id: "LINKS_INTERNAL_NONE",
        topic: Topic::Content,
        severity: Severity::Info,
        legacy: false,
        reads: &[Capability::Links],
        message: "Page links to no other page on the same site",
        check: internal_links_none,
    },
];

fn content_thin(doc: &PageDocument, t: &Thresholds) -> Result<Vec<Evidence>, RuleError> {
    if doc.word_count >= t.min_word_count {
        return Ok(Vec::new());
    }
    Ok(vec![evidence(json!({
        "word_count": doc.word_count,
        "min": t.min_word_count,
    }))])
}

fn internal_links_none(doc: &PageDocument, _: &Thresholds) -> Result<Vec<Evidence>, RuleError> {
    if doc.internal_links().next().is_some() {
        return Ok(Vec::new());
    }
    Ok(vec![evidence(json!({
        "internal_links": 0,
        "total_links": doc.links.len(),
    }))])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::fixtures::empty_document;
    use crate::document::Link;
    use url::Url;

    #[test]
    fn test_thin_content() {
        let t = Thresholds::default();
        let mut doc = empty_document();
        doc.word_count = 120;
        let hits = content_thin(&doc, &t).unwrap();
        assert_eq!(hits[0]["word_count"], json!(120));

        doc.word_count = 300;
        assert!(content_thin(&doc, &t).unwrap().is_empty());
    }

    #[test]
    fn test_internal_links() {
        let t = Thresholds::default();
        let mut doc = empty_document();
        doc.links.push(Link {
            href: "https://other.com/".to_string(),
            url: Url::parse("https://other.com/").unwrap(),
            text: "Elsewhere".to_string(),
            rel: None,
        });
        let hits = internal_links_none(&doc, &t).unwrap();
        assert_eq!(hits[0]["total_links"], json!(1));

        doc.links.push(Link {
            href: "/about".to_string(),
            url: Url::parse("https://example.com/about").unwrap(),
            text: "About".to_string(),
            rel: None,
        });
        assert!(internal_links_none(&doc, &t).unwrap().is_empty());
    }
}
