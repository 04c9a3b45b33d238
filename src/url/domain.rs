use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// If the URL has no host (which shouldn't happen for valid HTTP(S) URLs), it returns None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use seo_lantern::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns true if `candidate` belongs to the same site as `seed`
///
/// A site is an exact host plus explicit port. Subdomains count as different
/// sites, and so does the same host on another port. `http` and `https` on
/// their default ports are one site, so a seed upgraded to https by a redirect
/// keeps its links in scope.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use seo_lantern::url::is_same_site;
///
/// let seed = Url::parse("https://example.com/").unwrap();
/// assert!(is_same_site(&Url::parse("https://example.com/about").unwrap(), &seed));
/// assert!(is_same_site(&Url::parse("http://example.com/about").unwrap(), &seed));
/// assert!(!is_same_site(&Url::parse("https://blog.example.com/").unwrap(), &seed));
/// ```
pub fn is_same_site(candidate: &Url, seed: &Url) -> bool {
    match (extract_domain(candidate), extract_domain(seed)) {
        // `port()` is None for a scheme's default port
        (Some(a), Some(b)) => a == b && candidate.port() == seed.port(),
        _ => false,
    }
}

/// Returns the origin (`scheme://host[:port]`) of a URL
///
/// Used as the robots.txt cache key and as the base for sibling files such as
/// `/robots.txt` and `/llms.txt`.
pub fn origin_of(url: &Url) -> String {
    url.origin().ascii_serialization()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_simple_domain() {
        let url = Url::parse("https://example.com/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_extract_with_port() {
        let url = Url::parse("https://example.com:8080/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_extract_mixed_case() {
        let url = Url::parse("https://Example.COM/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_same_site_across_scheme_upgrade() {
        let seed = Url::parse("http://example.com/").unwrap();
        assert!(is_same_site(&Url::parse("https://example.com/a").unwrap(), &seed));
        assert!(is_same_site(&Url::parse("https://example.com:443/x").unwrap(), &seed));
        assert!(is_same_site(&Url::parse("http://example.com:80/x").unwrap(), &seed));

        // An explicit non-default port is still a different site
        assert!(!is_same_site(&Url::parse("https://example.com:8443/").unwrap(), &seed));
        assert!(!is_same_site(&Url::parse("http://example.com:443/").unwrap(), &seed));
    }

    #[test]
    fn test_same_site_rejects_subdomain_and_port() {
        let seed = Url::parse("http://127.0.0.1:8080/").unwrap();
        assert!(is_same_site(
            &Url::parse("http://127.0.0.1:8080/page").unwrap(),
            &seed
        ));
        assert!(!is_same_site(
            &Url::parse("http://127.0.0.1:9090/page").unwrap(),
            &seed
        ));

        let seed = Url::parse("https://example.com/").unwrap();
        assert!(!is_same_site(
            &Url::parse("https://www.example.com/").unwrap(),
            &seed
        ));
    }

    #[test]
    fn test_origin_of() {
        let url = Url::parse("https://example.com/a/b?c=d").unwrap();
        assert_eq!(origin_of(&url), "https://example.com");

        let url = Url::parse("http://127.0.0.1:8080/a").unwrap();
        assert_eq!(origin_of(&url), "http://127.0.0.1:8080");
    }
}
