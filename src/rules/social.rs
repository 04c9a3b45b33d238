//! Social metadata and structured-data rules

use crate::config::Thresholds;
use crate::document::PageDocument;
use crate::rules::{evidence, Capability, Evidence, Rule, RuleError, Severity, Topic};
use crate::url::normalize;
use serde_json::json;
use std::collections::HashSet;

const OPEN_GRAPH_TAGS: &[&str] = &["og:title", "og:description", "og:image"];

pub(super) const RULES: &[Rule] = &[
    Rule {
        id: "OG_INCOMPLETE",
        topic: Topic::Social,
        severity: Severity::Info,
        legacy: false,
        reads: &[Capability::Meta],
        message: "Open Graph tags missing: {missing_list}",
        check: open_graph_incomplete,
    },
    Rule {
        id: "TWITTER_CARD_MISSING",
        topic: Topic::Social,
        severity: Severity::Info,
        legacy: false,
        reads: &[Capability::Meta],
        message: "No twitter:card meta tag",
        check: twitter_card_missing,
    },
    Rule {
        id: "JSONLD_MISSING",
        topic: Topic::StructuredData,
        severity: Severity::Info,
        legacy: false,
        reads: &[Capability::StructuredData],
        message: "No JSON-LD structured data found",
        check: json_ld_missing,
    },
    Rule {
        id: "JSONLD_INVALID",
        topic: Topic::StructuredData,
        severity: Severity::Warning,
        legacy: false,
        reads: &[Capability::StructuredData],
        message: "JSON-LD block #{index} does not parse: {error}",
        check: json_ld_invalid,
    },
    Rule {
        id: "HREFLANG_INVALID",
        topic: Topic::StructuredData,
        severity: Severity::Warning,
        legacy: false,
        reads: &[Capability::LinkTags],
        message: "hreflang alternate \"{hreflang}\" is invalid: {reason}",
        check: hreflang_invalid,
    },
    Rule {
        id: "HREFLANG_NO_SELF",
        topic: Topic::StructuredData,
        severity: Severity::Warning,
        legacy: false,
        reads: &[Capability::LinkTags],
        message: "hreflang alternates do not reference the page itself",
        check: hreflang_no_self,
    },
];

fn open_graph_incomplete(doc: &PageDocument, _: &Thresholds) -> Result<Vec<Evidence>, RuleError> {
    let missing: Vec<&str> = OPEN_GRAPH_TAGS
        .iter()
        .copied()
        .filter(|tag| doc.meta(tag).is_none())
        .collect();
    if missing.is_empty() {
        return Ok(Vec::new());
    }
    Ok(vec![evidence(json!({
        "missing": missing,
        "missing_list": missing.join(", "),
    }))])
}

fn twitter_card_missing(doc: &PageDocument, _: &Thresholds) -> Result<Vec<Evidence>, RuleError> {
    Ok(match doc.meta("twitter:card") {
        Some(_) => Vec::new(),
        None => vec![evidence(json!({ "meta": "twitter:card", "found": false }))],
    })
}

fn json_ld_missing(doc: &PageDocument, _: &Thresholds) -> Result<Vec<Evidence>, RuleError> {
    if doc.json_ld.is_empty() {
        Ok(vec![evidence(json!({ "blocks": 0 }))])
    } else {
        Ok(Vec::new())
    }
}

fn json_ld_invalid(doc: &PageDocument, _: &Thresholds) -> Result<Vec<Evidence>, RuleError> {
    let hits = doc
        .json_ld
        .iter()
        .enumerate()
        .filter_map(|(index, block)| {
            serde_json::from_str::<serde_json::Value>(block)
                .err()
                .map(|e| evidence(json!({ "index": index, "error": e.to_string() })))
        })
        .collect();
    Ok(hits)
}

/// Accepts `x-default`, a 2-3 letter language, and an optional region or
/// script subtag (`en`, `en-GB`, `zh-Hant`, `es-419`)
fn is_valid_hreflang(code: &str) -> bool {
    if code.eq_ignore_ascii_case("x-default") {
        return true;
    }
    let mut parts = code.split('-');
    let language_ok = parts
        .next()
        .is_some_and(|l| (2..=3).contains(&l.len()) && l.chars().all(|c| c.is_ascii_alphabetic()));
    let subtag_ok = match parts.next() {
        None => true,
        Some(s) => {
            ((2..=4).contains(&s.len()) && s.chars().all(|c| c.is_ascii_alphabetic()))
                || (s.len() == 3 && s.chars().all(|c| c.is_ascii_digit()))
        }
    };
    language_ok && subtag_ok && parts.next().is_none()
}

fn hreflang_invalid(doc: &PageDocument, _: &Thresholds) -> Result<Vec<Evidence>, RuleError> {
    let mut seen = HashSet::new();
    let mut hits = Vec::new();

    for tag in doc.hreflang_alternates() {
        let code = tag.hreflang.as_deref().unwrap_or("");
        let href = tag.href.as_deref().unwrap_or("");

        let reason = if !is_valid_hreflang(code) {
            Some("invalid language code")
        } else if !tag
            .resolved
            .as_ref()
            .is_some_and(|url| matches!(url.scheme(), "http" | "https"))
        {
            Some("href does not resolve to an http(s) URL")
        } else if !seen.insert(code.to_ascii_lowercase()) {
            Some("duplicate language code")
        } else {
            None
        };

        if let Some(reason) = reason {
            hits.push(evidence(json!({
                "hreflang": code,
                "href": href,
                "reason": reason,
            })));
        }
    }

    Ok(hits)
}

fn hreflang_no_self(doc: &PageDocument, _: &Thresholds) -> Result<Vec<Evidence>, RuleError> {
    let alternates: Vec<_> = doc.hreflang_alternates().collect();
    if alternates.is_empty() {
        return Ok(Vec::new());
    }

    let own: Vec<_> = [&doc.url, &doc.final_url]
        .into_iter()
        .filter_map(|url| normalize(url).ok())
        .collect();
    let references_self = alternates.iter().any(|tag| {
        tag.resolved
            .as_ref()
            .and_then(|url| normalize(url).ok())
            .is_some_and(|url| own.contains(&url))
    });
    if references_self {
        return Ok(Vec::new());
    }

    Ok(vec![evidence(json!({
        "alternates": alternates.len(),
        "page": doc.final_url.as_str(),
    }))])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::fixtures::{empty_document, link_tag};

    #[test]
    fn test_open_graph() {
        let t = Thresholds::default();
        let mut doc = empty_document();
        doc.meta.insert("og:title".to_string(), "T".to_string());
        let hits = open_graph_incomplete(&doc, &t).unwrap();
        assert_eq!(hits[0]["missing"], json!(["og:description", "og:image"]));

        doc.meta.insert("og:description".to_string(), "D".to_string());
        doc.meta.insert("og:image".to_string(), "/i.png".to_string());
        assert!(open_graph_incomplete(&doc, &t).unwrap().is_empty());
    }

    #[test]
    fn test_twitter_card() {
        let t = Thresholds::default();
        let mut doc = empty_document();
        assert_eq!(twitter_card_missing(&doc, &t).unwrap().len(), 1);
        doc.meta
            .insert("twitter:card".to_string(), "summary".to_string());
        assert!(twitter_card_missing(&doc, &t).unwrap().is_empty());
    }

    #[test]
    fn test_json_ld_presence_and_validity() {
        let t = Thresholds::default();
        let mut doc = empty_document();
        assert_eq!(json_ld_missing(&doc, &t).unwrap().len(), 1);

        doc.json_ld = vec![
            r#"{"@type": "Organization"}"#.to_string(),
            r#"{"@type": "#.to_string(),
            "not json".to_string(),
        ];
        assert!(json_ld_missing(&doc, &t).unwrap().is_empty());
        let hits = json_ld_invalid(&doc, &t).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0]["index"], json!(1));
        assert_eq!(hits[1]["index"], json!(2));
    }

    #[test]
    fn test_hreflang_codes() {
        for code in ["en", "en-GB", "zh-Hant", "es-419", "x-default", "fil"] {
            assert!(is_valid_hreflang(code), "{code} should be valid");
        }
        for code in ["", "english", "en_GB", "en-GB-x", "e1"] {
            assert!(!is_valid_hreflang(code), "{code} should be invalid");
        }
    }

    #[test]
    fn test_hreflang_invalid_per_offender() {
        let t = Thresholds::default();
        let mut doc = empty_document();
        doc.link_tags = vec![
            link_tag("alternate", "https://example.com/", Some("en")),
            link_tag("alternate", "https://example.com/fr", Some("french")),
            link_tag("alternate", "https://example.com/en2", Some("EN")),
        ];
        let hits = hreflang_invalid(&doc, &t).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0]["hreflang"], json!("french"));
        assert_eq!(hits[1]["reason"], json!("duplicate language code"));
    }

    #[test]
    fn test_hreflang_self_reference() {
        let t = Thresholds::default();
        let mut doc = empty_document();
        assert!(hreflang_no_self(&doc, &t).unwrap().is_empty());

        doc.link_tags = vec![link_tag("alternate", "https://example.com/fr", Some("fr"))];
        assert_eq!(hreflang_no_self(&doc, &t).unwrap().len(), 1);

        doc.link_tags
            .push(link_tag("alternate", "https://EXAMPLE.com/#top", Some("en")));
        assert!(hreflang_no_self(&doc, &t).unwrap().is_empty());
    }
}
