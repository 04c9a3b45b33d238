//! Meta and document-head rules

use crate::config::Thresholds;
use crate::crawler::charset_param;
use crate::document::PageDocument;
use crate::rules::{char_len, evidence, Capability, Evidence, Rule, RuleError, Severity, Topic};
use serde_json::json;

pub(super) const RULES: &[Rule] = &[
    Rule {
        id: "META_TITLE_MISSING",
        topic: Topic::Meta,
        severity: Severity::Critical,
        legacy: true,
        reads: &[Capability::Title],
        message: "Page has no <title>",
        check: title_missing,
    },
    Rule {
        id: "META_TITLE_LENGTH",
        topic: Topic::Meta,
        severity: Severity::Warning,
        legacy: false,
        reads: &[Capability::Title],
        message: "Title is {length} characters; keep it between {min} and {max}",
        check: title_length,
    },
    Rule {
        id: "META_DESC_MISSING",
        topic: Topic::Meta,
        severity: Severity::Warning,
        legacy: true,
        reads: &[Capability::Meta],
        message: "Page has no meta description",
        check: description_missing,
    },
    Rule {
        id: "META_DESC_LENGTH",
        topic: Topic::Meta,
        severity: Severity::Info,
        legacy: false,
        reads: &[Capability::Meta],
        message: "Meta description is {length} characters; keep it between {min} and {max}",
        check: description_length,
    },
    Rule {
        id: "CANONICAL_MISSING",
        topic: Topic::Meta,
        severity: Severity::Warning,
        legacy: false,
        reads: &[Capability::LinkTags],
        message: "No <link rel=\"canonical\"> declared",
        check: canonical_missing,
    },
    Rule {
        id: "CANONICAL_INVALID",
        topic: Topic::Meta,
        severity: Severity::Warning,
        legacy: false,
        reads: &[Capability::LinkTags],
        message: "Canonical URL \"{href}\" is not an absolute http(s) URL",
        check: canonical_invalid,
    },
    Rule {
        id: "ROBOTS_NOINDEX",
        topic: Topic::Meta,
        severity: Severity::Critical,
        legacy: false,
        reads: &[Capability::Meta, Capability::Headers],
        message: "Page is excluded from indexing by {source} ({value})",
        check: robots_noindex,
    },
    Rule {
        id: "CHARSET_MISSING",
        topic: Topic::Meta,
        severity: Severity::Info,
        legacy: false,
        reads: &[Capability::Meta, Capability::Headers],
        message: "No character encoding declared",
        check: charset_missing,
    },
    Rule {
        id: "FAVICON_MISSING",
        topic: Topic::Meta,
        severity: Severity::Info,
        legacy: false,
        reads: &[Capability::LinkTags],
        message: "No favicon declared",
        check: favicon_missing,
    },
];

fn title_missing(doc: &PageDocument, _: &Thresholds) -> Result<Vec<Evidence>, RuleError> {
    Ok(match doc.title {
        Some(_) => Vec::new(),
        None => vec![evidence(json!({ "element": "title", "found": false }))],
    })
}

fn title_length(doc: &PageDocument, t: &Thresholds) -> Result<Vec<Evidence>, RuleError> {
    let Some(title) = doc.title.as_deref() else {
        return Ok(Vec::new());
    };
    let length = char_len(title);
    if (t.title_min..=t.title_max).contains(&length) {
        return Ok(Vec::new());
    }
    Ok(vec![evidence(json!({
        "length": length,
        "min": t.title_min,
        "max": t.title_max,
        "title": title,
    }))])
}

fn description_missing(doc: &PageDocument, _: &Thresholds) -> Result<Vec<Evidence>, RuleError> {
    Ok(match doc.meta("description") {
        Some(_) => Vec::new(),
        None => vec![evidence(json!({ "meta": "description", "found": false }))],
    })
}

fn description_length(doc: &PageDocument, t: &Thresholds) -> Result<Vec<Evidence>, RuleError> {
    let Some(description) = doc.meta("description") else {
        return Ok(Vec::new());
    };
    let length = char_len(description);
    if (t.description_min..=t.description_max).contains(&length) {
        return Ok(Vec::new());
    }
    Ok(vec![evidence(json!({
        "length": length,
        "min": t.description_min,
        "max": t.description_max,
    }))])
}

fn canonical_missing(doc: &PageDocument, _: &Thresholds) -> Result<Vec<Evidence>, RuleError> {
    Ok(match doc.canonical() {
        Some(_) => Vec::new(),
        None => vec![evidence(json!({ "link_rel": "canonical", "found": false }))],
    })
}

fn canonical_invalid(doc: &PageDocument, _: &Thresholds) -> Result<Vec<Evidence>, RuleError> {
    let Some(canonical) = doc.canonical() else {
        return Ok(Vec::new());
    };
    let valid = canonical
        .resolved
        .as_ref()
        .is_some_and(|url| matches!(url.scheme(), "http" | "https"));
    if valid {
        return Ok(Vec::new());
    }
    Ok(vec![evidence(json!({
        "href": canonical.href.clone().unwrap_or_default(),
    }))])
}

fn robots_noindex(doc: &PageDocument, _: &Thresholds) -> Result<Vec<Evidence>, RuleError> {
    let mut hits = Vec::new();
    let sources = [
        ("meta robots", doc.meta("robots")),
        ("X-Robots-Tag header", doc.header("x-robots-tag")),
    ];
    for (source, value) in sources {
        if let Some(value) = value {
            if value.to_ascii_lowercase().contains("noindex") {
                hits.push(evidence(json!({ "source": source, "value": value })));
            }
        }
    }
    Ok(hits)
}

fn charset_missing(doc: &PageDocument, _: &Thresholds) -> Result<Vec<Evidence>, RuleError> {
    let from_header = doc.header("content-type").and_then(charset_param);
    if doc.charset.is_some() || from_header.is_some() {
        return Ok(Vec::new());
    }
    Ok(vec![evidence(json!({
        "checked": ["meta charset", "Content-Type header"],
    }))])
}

fn favicon_missing(doc: &PageDocument, _: &Thresholds) -> Result<Vec<Evidence>, RuleError> {
    if doc.link_tags.iter().any(|tag| tag.has_rel("icon")) {
        return Ok(Vec::new());
    }
    Ok(vec![evidence(json!({ "link_rel": "icon", "found": false }))])
}
