use crate::{UrlError, UrlResult};
use url::Url;

/// Click-tracking parameters that never change the page served
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid"];

/// Normalizes a URL string into the crawl's dedup key
///
/// Two URLs that serve the same page should map to the same key:
///
/// - only http and https are accepted, and the scheme is kept
/// - the host is lowercased; default ports are already elided by the parser
/// - `.` and `..` segments are resolved and repeated slashes collapsed
/// - a trailing slash is dropped, except for the root path `/`
/// - the fragment is removed
/// - `utm_*`, `fbclid`, `gclid` and `mc_eid` are removed from the query
/// - remaining query pairs are sorted; an empty query is dropped
///
/// # Examples
///
/// ```
/// use seo_lantern::url::normalize_url;
///
/// let url = normalize_url("https://EXAMPLE.COM/page/?b=2&a=1#top").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/page?a=1&b=2");
/// ```
pub fn normalize_url(url_str: &str) -> UrlResult<Url> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
    normalize(&url)
}

/// Normalizes an already-parsed URL
pub fn normalize(url: &Url) -> UrlResult<Url> {
    if !matches!(url.scheme(), "http" | "https") {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    let host = match url.host_str() {
        Some(host) if !host.is_empty() => host.to_lowercase(),
        _ => return Err(UrlError::MissingDomain),
    };

    let mut key = url.clone();
    key.set_host(Some(&host))
        .map_err(|e| UrlError::Malformed(format!("{}: {}", host, e)))?;
    key.set_path(&collapse_path(url.path()));
    key.set_fragment(None);

    if url.query().is_some() {
        let pairs = kept_query_pairs(url);
        if pairs.is_empty() {
            key.set_query(None);
        } else {
            key.query_pairs_mut().clear().extend_pairs(pairs);
        }
    }

    Ok(key)
}

fn collapse_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    format!("/{}", segments.join("/"))
}

/// Query pairs without tracking parameters, sorted by key then value
fn kept_query_pairs(url: &Url) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    pairs.sort();
    pairs
}

fn is_tracking_param(key: &str) -> bool {
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key)
}
