//! HTML parser building a `PageDocument`
//!
//! This module handles parsing fetched HTML to extract:
//! - Title, `<html lang>`, charset and meta tags
//! - Heading sequence, images, `<link>` tags and JSON-LD blocks
//! - Followable links, resolved against the page's own URL
//! - Landmark regions and a visible word count
//!
//! Malformed markup is never an error. `ParseError` is reserved for bodies
//! that are not HTML at all.

use crate::crawler::fetcher::RawResponse;
use crate::document::{Heading, Image, Link, LinkTag, PageDocument};
use crate::ParseError;
use scraper::{ElementRef, Html, Selector};
use std::collections::{BTreeMap, BTreeSet};
use url::Url;

/// Number of leading bytes inspected for binary content
const SNIFF_LEN: usize = 1024;

/// Elements whose text is never visible page copy
const HIDDEN_TEXT_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Parses a fetched response into a `PageDocument`
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` anywhere in the document, resolved against the final URL
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs and fragment-only anchors
/// - Anything that does not resolve to http(s)
///
/// **Note:** `rel="nofollow"` links are kept; scope and budget are decided by
/// the frontier.
///
/// # Arguments
///
/// * `raw` - The fetched response
/// * `requested` - The normalized URL that was requested
///
/// # Example
///
/// ```
/// use seo_lantern::crawler::{parse_document, RawResponse};
/// use std::collections::BTreeMap;
/// use url::Url;
///
/// let url = Url::parse("https://example.com/").unwrap();
/// let raw = RawResponse {
///     final_url: url.clone(),
///     status: 200,
///     headers: BTreeMap::new(),
///     body: b"<html><head><title>Test</title></head><body><a href=\"/page\">Link</a></body></html>".to_vec(),
///     truncated: false,
/// };
/// let doc = parse_document(&raw, &url).unwrap();
/// assert_eq!(doc.title.as_deref(), Some("Test"));
/// assert_eq!(doc.links[0].url.as_str(), "https://example.com/page");
/// ```
pub fn parse_document(raw: &RawResponse, requested: &Url) -> Result<PageDocument, ParseError> {
    check_html(raw)?;

    let html = String::from_utf8_lossy(&raw.body);
    let document = Html::parse_document(&html);
    let base = &raw.final_url;

    Ok(PageDocument {
        url: requested.clone(),
        final_url: raw.final_url.clone(),
        status: raw.status,
        headers: raw.headers.clone(),
        title: extract_title(&document),
        html_lang: extract_html_lang(&document),
        charset: extract_charset(&document),
        meta: extract_meta(&document),
        headings: extract_headings(&document),
        images: extract_images(&document),
        links: extract_links(&document, base),
        link_tags: extract_link_tags(&document, base),
        json_ld: extract_json_ld(&document),
        landmarks: extract_landmarks(&document),
        word_count: count_words(&document),
        byte_size: raw.body.len(),
        truncated: raw.truncated,
    })
}

/// Rejects bodies that are clearly not HTML
fn check_html(raw: &RawResponse) -> Result<(), ParseError> {
    if let Some(content_type) = raw.content_type() {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        let textual = mime.is_empty()
            || mime.contains("html")
            || mime.contains("xml")
            || mime.starts_with("text/");
        if !textual {
            return Err(ParseError::NotHtml {
                content_type: content_type.to_string(),
            });
        }
    }

    let sniff = &raw.body[..raw.body.len().min(SNIFF_LEN)];
    if sniff.contains(&0) {
        return Err(ParseError::Binary);
    }

    Ok(())
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn non_empty_attr(element: ElementRef<'_>, name: &str) -> Option<String> {
    element
        .value()
        .attr(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    document
        .select(&selector)
        .next()
        .map(element_text)
        .filter(|s| !s.is_empty())
}

fn extract_html_lang(document: &Html) -> Option<String> {
    let selector = Selector::parse("html").ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|html| non_empty_attr(html, "lang"))
}

/// Charset from `<meta charset>` or `<meta http-equiv=content-type>`
fn extract_charset(document: &Html) -> Option<String> {
    let selector = Selector::parse("meta").ok()?;
    for meta in document.select(&selector) {
        if let Some(charset) = non_empty_attr(meta, "charset") {
            return Some(charset.to_ascii_lowercase());
        }

        let is_content_type = meta
            .value()
            .attr("http-equiv")
            .is_some_and(|v| v.eq_ignore_ascii_case("content-type"));
        if is_content_type {
            if let Some(charset) = meta.value().attr("content").and_then(charset_param) {
                return Some(charset);
            }
        }
    }
    None
}

/// Extracts the `charset=` parameter from a Content-Type value
pub(crate) fn charset_param(content_type: &str) -> Option<String> {
    content_type.split(';').find_map(|part| {
        let (key, value) = part.split_once('=')?;
        if key.trim().eq_ignore_ascii_case("charset") {
            let value = value.trim().trim_matches('"');
            (!value.is_empty()).then(|| value.to_ascii_lowercase())
        } else {
            None
        }
    })
}

/// `<meta name|property content>` pairs, first occurrence wins
fn extract_meta(document: &Html) -> BTreeMap<String, String> {
    let mut meta = BTreeMap::new();
    let Ok(selector) = Selector::parse("meta[content]") else {
        return meta;
    };
    for element in document.select(&selector) {
        let key = element
            .value()
            .attr("name")
            .or_else(|| element.value().attr("property"));
        let (Some(key), Some(content)) = (key, element.value().attr("content")) else {
            continue;
        };
        meta.entry(key.trim().to_ascii_lowercase())
            .or_insert_with(|| content.trim().to_string());
    }
    meta
}

fn extract_headings(document: &Html) -> Vec<Heading> {
    let Ok(selector) = Selector::parse("h1, h2, h3, h4, h5, h6") else {
        return Vec::new();
    };
    document
        .select(&selector)
        .filter_map(|element| {
            let level: u8 = element.value().name().strip_prefix('h')?.parse().ok()?;
            Some(Heading {
                level,
                text: element_text(element),
            })
        })
        .collect()
}

fn extract_images(document: &Html) -> Vec<Image> {
    let Ok(selector) = Selector::parse("img") else {
        return Vec::new();
    };
    document
        .select(&selector)
        .map(|element| {
            let attrs = element.value();
            Image {
                src: non_empty_attr(element, "src"),
                alt: attrs.attr("alt").map(|alt| alt.trim().to_string()),
                loading: non_empty_attr(element, "loading"),
                width: non_empty_attr(element, "width"),
                height: non_empty_attr(element, "height"),
                fetchpriority: non_empty_attr(element, "fetchpriority"),
            }
        })
        .collect()
}

/// Extracts all followable links from the HTML document
fn extract_links(document: &Html, base_url: &Url) -> Vec<Link> {
    let mut links = Vec::new();
    let Ok(selector) = Selector::parse("a[href]") else {
        return links;
    };

    for element in document.select(&selector) {
        // Skip if it has the download attribute
        if element.value().attr("download").is_some() {
            continue;
        }

        let Some(href) = element.value().attr("href") else {
            continue;
        };

        if let Some(url) = resolve_link(href, base_url) {
            links.push(Link {
                href: href.trim().to_string(),
                url,
                text: element_text(element),
                rel: non_empty_attr(element, "rel"),
            });
        }
    }

    links
}

fn extract_link_tags(document: &Html, base_url: &Url) -> Vec<LinkTag> {
    let Ok(selector) = Selector::parse("link[rel]") else {
        return Vec::new();
    };
    document
        .select(&selector)
        .map(|element| {
            let href = non_empty_attr(element, "href");
            LinkTag {
                rel: element
                    .value()
                    .attr("rel")
                    .unwrap_or("")
                    .split_whitespace()
                    .map(str::to_ascii_lowercase)
                    .collect(),
                resolved: href.as_deref().and_then(|h| base_url.join(h).ok()),
                href,
                hreflang: non_empty_attr(element, "hreflang"),
            }
        })
        .collect()
}

fn extract_json_ld(document: &Html) -> Vec<String> {
    let Ok(selector) = Selector::parse("script[type]") else {
        return Vec::new();
    };
    document
        .select(&selector)
        .filter(|element| {
            element
                .value()
                .attr("type")
                .is_some_and(|t| t.trim().eq_ignore_ascii_case("application/ld+json"))
        })
        .map(|element| element.text().collect::<String>().trim().to_string())
        .collect()
}

/// Landmark regions from semantic elements and ARIA roles
fn extract_landmarks(document: &Html) -> BTreeSet<String> {
    let mut landmarks = BTreeSet::new();
    let Ok(selector) = Selector::parse("main, nav, header, footer, [role]") else {
        return landmarks;
    };
    for element in document.select(&selector) {
        let name = element.value().name();
        if matches!(name, "main" | "nav" | "header" | "footer") {
            landmarks.insert(name.to_string());
        }

        let from_role = match element.value().attr("role").map(str::trim) {
            Some(role) if role.eq_ignore_ascii_case("main") => Some("main"),
            Some(role) if role.eq_ignore_ascii_case("navigation") => Some("nav"),
            Some(role) if role.eq_ignore_ascii_case("banner") => Some("header"),
            Some(role) if role.eq_ignore_ascii_case("contentinfo") => Some("footer"),
            _ => None,
        };
        if let Some(landmark) = from_role {
            landmarks.insert(landmark.to_string());
        }
    }
    landmarks
}

/// Counts words of visible body text
fn count_words(document: &Html) -> usize {
    let Ok(selector) = Selector::parse("body") else {
        return 0;
    };
    let Some(body) = document.select(&selector).next() else {
        return 0;
    };

    body.descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let hidden = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|e| HIDDEN_TEXT_ELEMENTS.contains(&e.name()))
            });
            (!hidden).then(|| {
                text.split_whitespace()
                    .filter(|word| word.chars().any(char::is_alphanumeric))
                    .count()
            })
        })
        .sum()
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    // Skip empty hrefs and same-page anchors
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    matches!(absolute_url.scheme(), "http" | "https").then_some(absolute_url)
}
