use crate::error::{Result, ScanError};
use crate::ignore::IgnoreFilter;
use tracing::trace;
use url::Url;

/// Canonicalizes hrefs and decides which URLs belong to the crawl.
///
/// Two hrefs refer to the same page iff `normalize` returns the same string
/// for both; the graph relies on this for node identity.
#[derive(Debug, Clone)]
pub struct UrlNormalizer {
    host: String,
    port: Option<u16>,
    ignore: IgnoreFilter,
}

impl UrlNormalizer {
    /// Build a normalizer scoped to the host of `start_url`, which must be an
    /// absolute URL with a scheme and host.
    pub fn new(start_url: &str) -> Result<Self> {
        let parsed = Url::parse(start_url)
            .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", start_url, e)))?;
        let host = parsed
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| ScanError::InvalidUrl(format!("{}: missing host", start_url)))?
            .to_string();

        Ok(Self {
            host,
            port: parsed.port(),
            ignore: IgnoreFilter::default(),
        })
    }

    pub fn with_ignore(mut self, ignore: IgnoreFilter) -> Self {
        self.ignore = ignore;
        self
    }

    pub fn ignore_filter(&self) -> &IgnoreFilter {
        &self.ignore
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Resolve `href` against `base_url` and return its canonical form, or
    /// `None` if it is malformed, off-domain or ignored.
    pub fn normalize(&self, href: &str, base_url: &str) -> Option<String> {
        let base = Url::parse(base_url).ok()?;
        let mut resolved = base.join(href).ok()?;
        resolved.set_fragment(None);

        if !self.is_same_domain(&resolved) {
            trace!("Rejecting off-domain link {}", resolved);
            return None;
        }
        if self.ignore.matches_path(resolved.path()) {
            trace!("Rejecting ignored link {}", resolved);
            return None;
        }

        Some(canonical_string(resolved))
    }

    /// Canonical form of an absolute URL, subject to the same rules as
    /// `normalize`.
    pub fn canonicalize(&self, url: &str) -> Option<String> {
        self.normalize(url, url)
    }

    /// Host and explicit port must match; the scheme is not compared.
    fn is_same_domain(&self, url: &Url) -> bool {
        url.host_str() == Some(self.host.as_str()) && url.port() == self.port
    }
}

/// Drop trailing slashes from every path except the root.
fn canonical_string(mut url: Url) -> String {
    let path = url.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/').to_string();
        if trimmed.is_empty() {
            url.set_path("/");
        } else {
            url.set_path(&trimmed);
        }
    }
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://x.test/blog/post";

    fn normalizer() -> UrlNormalizer {
        UrlNormalizer::new("https://x.test/").unwrap()
    }

    #[test]
    fn test_rejects_start_url_without_host() {
        assert!(UrlNormalizer::new("not a url").is_err());
        assert!(UrlNormalizer::new("mailto:someone@x.test").is_err());
    }

    #[test]
    fn test_resolves_relative_forms() {
        let n = normalizer();
        assert_eq!(n.normalize("other", BASE).as_deref(), Some("https://x.test/blog/other"));
        assert_eq!(n.normalize("../about", BASE).as_deref(), Some("https://x.test/about"));
        assert_eq!(n.normalize("/tags", BASE).as_deref(), Some("https://x.test/tags"));
        assert_eq!(n.normalize("//x.test/x", BASE).as_deref(), Some("https://x.test/x"));
        assert_eq!(
            n.normalize("?page=2", BASE).as_deref(),
            Some("https://x.test/blog/post?page=2")
        );
        assert_eq!(n.normalize("#comments", BASE).as_deref(), Some("https://x.test/blog/post"));
    }

    #[test]
    fn test_strips_fragment() {
        let n = normalizer();
        assert_eq!(
            n.normalize("https://x.test/a#section", BASE).as_deref(),
            Some("https://x.test/a")
        );
    }

    #[test]
    fn test_rejects_other_hosts_and_schemes() {
        let n = normalizer();
        assert_eq!(n.normalize("https://other.test/a", BASE), None);
        assert_eq!(n.normalize("//cdn.x.test/a", BASE), None);
        assert_eq!(n.normalize("https://x.test:8443/a", BASE), None);
        assert_eq!(n.normalize("mailto:me@x.test", BASE), None);
        assert_eq!(n.normalize("javascript:void(0)", BASE), None);
    }

    #[test]
    fn test_malformed_input_is_rejected() {
        let n = normalizer();
        assert_eq!(n.normalize("http://[::1", BASE), None);
        assert_eq!(n.normalize("/a", "not a base"), None);
    }

    #[test]
    fn test_trailing_slash_invariant() {
        let n = normalizer();
        assert_eq!(
            n.normalize("https://x.test/a/", BASE),
            n.normalize("https://x.test/a", BASE)
        );
        assert_eq!(n.normalize("https://x.test/", BASE).as_deref(), Some("https://x.test/"));
        assert_eq!(n.normalize("https://x.test", BASE).as_deref(), Some("https://x.test/"));
        assert_eq!(n.normalize("https://x.test//", BASE).as_deref(), Some("https://x.test/"));
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let n = normalizer();
        for href in ["/a/b/", "../c?x=1#y", "//x.test/d/", "/", "e/f//", "?q"] {
            let once = n.normalize(href, BASE).unwrap();
            let twice = n.normalize(&once, BASE).unwrap();
            assert_eq!(once, twice, "normalizing {} twice changed it", href);
        }
    }

    #[test]
    fn test_ignore_filter_rejects_paths() {
        let n = normalizer().with_ignore(IgnoreFilter::new(["/private*"]));
        assert_eq!(n.normalize("/private/page", BASE), None);
        assert_eq!(n.normalize("https://x.test/private", BASE), None);
        assert!(n.normalize("/public", BASE).is_some());
    }

    #[test]
    fn test_default_port_is_same_domain() {
        let n = normalizer();
        assert_eq!(
            n.normalize("https://x.test:443/a", BASE).as_deref(),
            Some("https://x.test/a")
        );
    }

    #[test]
    fn test_other_scheme_on_same_host_is_same_domain() {
        let n = normalizer();
        assert_eq!(
            n.normalize("http://x.test/post/", BASE).as_deref(),
            Some("http://x.test/post")
        );

        let plain = UrlNormalizer::new("http://x.test/").unwrap();
        assert!(plain.normalize("https://x.test/secure", "http://x.test/").is_some());
        assert_eq!(plain.normalize("http://x.test:8080/a", "http://x.test/"), None);
    }
}
