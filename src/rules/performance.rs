//! Performance proxy rules

use crate::config::Thresholds;
use crate::document::PageDocument;
use crate::rules::{evidence, Capability, Evidence, Rule, RuleError, Severity, Topic};
use serde_json::json;
use std::collections::BTreeSet;

const MODERN_IMAGE_FORMATS: &[&str] = &["webp", "avif"];

const RESOURCE_HINTS: &[&str] = &["preconnect", "preload", "dns-prefetch", "modulepreload"];

pub(super) const RULES: &[Rule] = &[
    Rule {
        id: "HTML_SIZE_EXCESSIVE",
        topic: Topic::Performance,
        severity: Severity::Warning,
        legacy: false,
        reads: &[Capability::Body],
        message: "HTML is {bytes} bytes, above the {max} byte budget",
        check: html_size_excessive,
    },
    Rule {
        id: "HTML_TRUNCATED",
        topic: Topic::Performance,
        severity: Severity::Warning,
        legacy: false,
        reads: &[Capability::Body],
        message: "Body was truncated after {bytes} bytes; findings are partial",
        check: html_truncated,
    },
    Rule {
        id: "IMG_LAZY_MISSING",
        topic: Topic::Performance,
        severity: Severity::Info,
        legacy: false,
        reads: &[Capability::Images],
        message: "None of the {images} images below the first uses loading=\"lazy\"",
        check: img_lazy_missing,
    },
    Rule {
        id: "IMG_LEGACY_FORMAT",
        topic: Topic::Performance,
        severity: Severity::Info,
        legacy: false,
        reads: &[Capability::Images],
        message: "No image uses a modern format (WebP or AVIF)",
        check: img_legacy_format,
    },
    Rule {
        id: "IMG_DIMENSIONS_MISSING",
        topic: Topic::Performance,
        severity: Severity::Info,
        legacy: false,
        reads: &[Capability::Images],
        message: "Only {with_dimensions} of {total} images declare width and height",
        check: img_dimensions_missing,
    },
    Rule {
        id: "IMG_FETCHPRIORITY_MISSING",
        topic: Topic::Performance,
        severity: Severity::Info,
        legacy: false,
        reads: &[Capability::Images],
        message: "No image is marked fetchpriority=\"high\"; the likely LCP image is {first_image}",
        check: img_fetchpriority_missing,
    },
    Rule {
        id: "RESOURCE_HINTS_MISSING",
        topic: Topic::Performance,
        severity: Severity::Info,
        legacy: false,
        reads: &[Capability::LinkTags],
        message: "No preconnect, preload or dns-prefetch hints",
        check: resource_hints_missing,
    },
];

fn html_size_excessive(doc: &PageDocument, t: &Thresholds) -> Result<Vec<Evidence>, RuleError> {
    if doc.byte_size <= t.html_size_max_bytes {
        return Ok(Vec::new());
    }
    Ok(vec![evidence(json!({
        "bytes": doc.byte_size,
        "max": t.html_size_max_bytes,
    }))])
}

fn html_truncated(doc: &PageDocument, _: &Thresholds) -> Result<Vec<Evidence>, RuleError> {
    if !doc.truncated {
        return Ok(Vec::new());
    }
    Ok(vec![evidence(json!({ "bytes": doc.byte_size, "truncated": true }))])
}

/// The first image is usually above the fold and should load eagerly
fn img_lazy_missing(doc: &PageDocument, t: &Thresholds) -> Result<Vec<Evidence>, RuleError> {
    if doc.images.len() < t.lazy_image_min_count.max(2) {
        return Ok(Vec::new());
    }
    if doc.images.iter().skip(1).any(|img| img.is_lazy()) {
        return Ok(Vec::new());
    }
    Ok(vec![evidence(json!({
        "images": doc.images.len() - 1,
        "lazy": 0,
    }))])
}

fn img_legacy_format(doc: &PageDocument, _: &Thresholds) -> Result<Vec<Evidence>, RuleError> {
    let formats: BTreeSet<String> = doc.images.iter().filter_map(|img| img.extension()).collect();
    if formats.is_empty() {
        return Ok(Vec::new());
    }
    if formats
        .iter()
        .any(|f| MODERN_IMAGE_FORMATS.contains(&f.as_str()))
    {
        return Ok(Vec::new());
    }
    Ok(vec![evidence(json!({
        "formats": formats,
        "images": doc.images.len(),
    }))])
}

fn img_dimensions_missing(doc: &PageDocument, t: &Thresholds) -> Result<Vec<Evidence>, RuleError> {
    let total = doc.images.len();
    if total == 0 {
        return Ok(Vec::new());
    }
    let with_dimensions = doc.images.iter().filter(|img| img.has_dimensions()).count();
    let coverage = with_dimensions as f64 / total as f64;
    if coverage >= t.image_dimension_coverage {
        return Ok(Vec::new());
    }
    Ok(vec![evidence(json!({
        "with_dimensions": with_dimensions,
        "total": total,
        "required_coverage": t.image_dimension_coverage,
    }))])
}

/// The first image is taken as the largest contentful paint candidate
fn img_fetchpriority_missing(
    doc: &PageDocument,
    _: &Thresholds,
) -> Result<Vec<Evidence>, RuleError> {
    let Some(first) = doc.images.first() else {
        return Ok(Vec::new());
    };
    if doc.images.iter().any(|img| img.is_high_priority()) {
        return Ok(Vec::new());
    }
    Ok(vec![evidence(json!({
        "images": doc.images.len(),
        "first_image": first.src.as_deref().unwrap_or("(no src)"),
    }))])
}

fn resource_hints_missing(doc: &PageDocument, _: &Thresholds) -> Result<Vec<Evidence>, RuleError> {
    let has_hint = doc
        .link_tags
        .iter()
        .any(|tag| RESOURCE_HINTS.iter().any(|hint| tag.has_rel(hint)));
    if has_hint {
        return Ok(Vec::new());
    }
    Ok(vec![evidence(json!({ "checked": RESOURCE_HINTS }))])
}
