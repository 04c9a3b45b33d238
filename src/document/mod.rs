//! Parsed page representation
//!
//! A `PageDocument` is built once by the parser and never mutated afterwards.
//! Rules read it through the typed fields below; anything the page did not
//! declare is an explicit `None` or an empty collection.

use crate::url::is_same_site;
use std::collections::{BTreeMap, BTreeSet};
use url::Url;

/// One `<h1>`..`<h6>` element, in document order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub level: u8,
    pub text: String,
}

/// One `<img>` element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Image {
    pub src: Option<String>,
    /// `None` when the attribute is absent, `Some("")` when declared empty
    pub alt: Option<String>,
    pub loading: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
    pub fetchpriority: Option<String>,
}

impl Image {
    /// True if the image carries a non-empty alt text
    pub fn has_alt(&self) -> bool {
        self.alt.as_deref().is_some_and(|alt| !alt.trim().is_empty())
    }

    pub fn has_dimensions(&self) -> bool {
        self.width.is_some() && self.height.is_some()
    }

    pub fn is_high_priority(&self) -> bool {
        self.fetchpriority
            .as_deref()
            .is_some_and(|p| p.eq_ignore_ascii_case("high"))
    }

    pub fn is_lazy(&self) -> bool {
        self.loading
            .as_deref()
            .is_some_and(|l| l.eq_ignore_ascii_case("lazy"))
    }

    /// Lowercased file extension of the image path, if any
    pub fn extension(&self) -> Option<String> {
        let src = self.src.as_deref()?;
        let path = src.split(['?', '#']).next().unwrap_or(src);
        let file = path.rsplit('/').next()?;
        let (_, ext) = file.rsplit_once('.')?;
        if ext.is_empty() {
            None
        } else {
            Some(ext.to_ascii_lowercase())
        }
    }
}

/// One followable `<a href>` link, resolved against the page URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub href: String,
    pub url: Url,
    pub text: String,
    pub rel: Option<String>,
}

/// One `<link>` element from the document head
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkTag {
    /// Lowercased, whitespace-separated rel tokens
    pub rel: Vec<String>,
    pub href: Option<String>,
    pub hreflang: Option<String>,
    /// `href` resolved against the page URL
    pub resolved: Option<Url>,
}

impl LinkTag {
    pub fn has_rel(&self, token: &str) -> bool {
        self.rel.iter().any(|r| r == token)
    }
}

/// Parsed representation of one fetched page
#[derive(Debug, Clone)]
pub struct PageDocument {
    /// The normalized URL that was requested
    pub url: Url,
    /// The URL after redirects
    pub final_url: Url,
    pub status: u16,
    /// Response headers, lowercased names
    pub headers: BTreeMap<String, String>,
    pub title: Option<String>,
    /// `lang` attribute of the `<html>` element
    pub html_lang: Option<String>,
    /// Charset declared in markup (`<meta charset>` or http-equiv)
    pub charset: Option<String>,
    /// `<meta name|property>` content, lowercased keys, first occurrence wins
    pub meta: BTreeMap<String, String>,
    pub headings: Vec<Heading>,
    pub images: Vec<Image>,
    pub links: Vec<Link>,
    pub link_tags: Vec<LinkTag>,
    /// Raw text of each `application/ld+json` script block
    pub json_ld: Vec<String>,
    /// Landmark regions present: main, nav, header, footer
    pub landmarks: BTreeSet<String>,
    pub word_count: usize,
    /// Size of the received body in bytes
    pub byte_size: usize,
    /// Whether the body was cut at the configured size limit
    pub truncated: bool,
}

impl PageDocument {
    /// Looks up a meta tag by name or property (case-insensitive)
    pub fn meta(&self, key: &str) -> Option<&str> {
        self.meta
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    /// Looks up a response header (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn heading_count(&self, level: u8) -> usize {
        self.headings.iter().filter(|h| h.level == level).count()
    }

    pub fn h1_count(&self) -> usize {
        self.heading_count(1)
    }

    pub fn images_without_alt(&self) -> usize {
        self.images.iter().filter(|img| !img.has_alt()).count()
    }

    /// First `<link rel=canonical>`, if any
    pub fn canonical(&self) -> Option<&LinkTag> {
        self.link_tags.iter().find(|tag| tag.has_rel("canonical"))
    }

    /// `<link rel=alternate hreflang=..>` entries, in document order
    pub fn hreflang_alternates(&self) -> impl Iterator<Item = &LinkTag> {
        self.link_tags
            .iter()
            .filter(|tag| tag.has_rel("alternate") && tag.hreflang.is_some())
    }

    /// Links that stay on the same site as this page
    pub fn internal_links(&self) -> impl Iterator<Item = &Link> {
        self.links
            .iter()
            .filter(move |link| is_same_site(&link.url, &self.final_url))
    }

    pub fn is_https(&self) -> bool {
        self.final_url.scheme() == "https"
    }
}
