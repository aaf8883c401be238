#![forbid(unsafe_code)]

//! Link resolution against the embedding page.
//!
//! A rendered preview document inherits the embedding page's URL, so a
//! browser resolves every `href` relative to it. [`resolve_href`] runs the
//! WHATWG URL parser (`url::Url::join`) and keeps the parts the interception
//! rule looks at: the host (with non-default port, as `location.host`
//! reports it) and the pathname.
//!
//! The parser strips ASCII tab and newline anywhere in the `href` and treats
//! `\` as `/` for special schemes, so `/\n/evil.com/x` and `/\evil.com/x`
//! are both protocol-relative links to `evil.com`.

use std::fmt;

use boardpreview_core::link::LinkTarget;
use url::Url;

/// Absolute URL of the embedding page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageUrl {
    url: Url,
    host: String,
}

impl PageUrl {
    /// Parse an absolute URL that can serve as a base for relative links.
    ///
    /// `about:blank` and other opaque URLs are rejected; hostless hierarchical
    /// URLs such as `file:///index.html` are accepted.
    #[must_use]
    pub fn parse(url: &str) -> Option<Self> {
        let url = Url::parse(url).ok()?;
        if url.cannot_be_a_base() {
            return None;
        }
        let host = location_host(&url);
        Some(Self { url, host })
    }

    #[must_use]
    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    /// Host including a non-default port, as `location.host` reports it.
    /// Empty for hostless pages.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// ASCII serialization of the origin (`null` for opaque origins).
    #[must_use]
    pub fn origin(&self) -> String {
        self.url.origin().ascii_serialization()
    }
}

impl fmt::Display for PageUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.url, f)
    }
}

/// An `href` resolved against a [`PageUrl`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLink {
    /// Absolute URL a default navigation would load.
    pub url: String,
    pub target: LinkTarget,
}

/// Resolve `href` as a browser would for an anchor on `base`.
///
/// An `href` that does not parse keeps its raw text as `url` and exposes an
/// empty host and pathname, like an anchor with an invalid URL.
#[must_use]
pub fn resolve_href(base: &PageUrl, href: &str) -> ResolvedLink {
    match base.url.join(href) {
        Ok(url) => ResolvedLink {
            target: LinkTarget::new(location_host(&url), url.path()),
            url: url.into(),
        },
        Err(err) => {
            tracing::trace!(href, error = %err, "unresolvable href");
            ResolvedLink {
                url: href.to_owned(),
                target: LinkTarget::new("", ""),
            }
        }
    }
}

fn location_host(url: &Url) -> String {
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_owned(),
        (None, _) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boardpreview_core::link::intercepted_path;
    use pretty_assertions::assert_eq;

    fn page() -> PageUrl {
        PageUrl::parse("http://localhost:3000/preview/index.html").unwrap()
    }

    fn target(href: &str) -> LinkTarget {
        resolve_href(&page(), href).target
    }

    fn intercepted(href: &str) -> Option<String> {
        let page = page();
        let link = resolve_href(&page, href);
        intercepted_path(&link.target, page.host()).map(str::to_owned)
    }

    #[test]
    fn page_url_parts() {
        let page = page();
        assert_eq!(page.scheme(), "http");
        assert_eq!(page.host(), "localhost:3000");
        assert_eq!(page.path(), "/preview/index.html");
        assert_eq!(page.origin(), "http://localhost:3000");
        assert_eq!(page.to_string(), "http://localhost:3000/preview/index.html");
    }

    #[test]
    fn page_url_must_be_a_base() {
        assert_eq!(PageUrl::parse("about:blank"), None);
        assert_eq!(PageUrl::parse("/relative"), None);
        assert_eq!(PageUrl::parse("file:///srv/index.html").unwrap().host(), "");
    }

    #[test]
    fn root_relative_keeps_page_host() {
        assert_eq!(target("/sub"), LinkTarget::new("localhost:3000", "/sub"));
        assert_eq!(target("/sub?x=1#top"), LinkTarget::new("localhost:3000", "/sub"));
    }

    #[test]
    fn document_relative_joins_page_directory() {
        assert_eq!(target("cards/1"), LinkTarget::new("localhost:3000", "/preview/cards/1"));
        assert_eq!(target("../up"), LinkTarget::new("localhost:3000", "/up"));
        assert_eq!(target("./"), LinkTarget::new("localhost:3000", "/preview/"));
    }

    #[test]
    fn fragment_only_stays_on_page() {
        assert_eq!(
            target("#section"),
            LinkTarget::new("localhost:3000", "/preview/index.html")
        );
    }

    #[test]
    fn absolute_urls_use_their_own_host() {
        assert_eq!(target("https://other-host/x"), LinkTarget::new("other-host", "/x"));
        assert_eq!(target("HTTP://LOCALHOST:3000"), LinkTarget::new("localhost:3000", "/"));
        assert_eq!(target("https://example.com:443/a"), LinkTarget::new("example.com", "/a"));
    }

    #[test]
    fn protocol_relative_takes_new_host() {
        assert_eq!(target("//other-host/x"), LinkTarget::new("other-host", "/x"));
        assert_eq!(target("/\\evil.com/x"), LinkTarget::new("evil.com", "/x"));
    }

    #[test]
    fn tab_and_newline_are_stripped_before_resolution() {
        assert_eq!(target("/\n/evil.com/x"), LinkTarget::new("evil.com", "/x"));
        assert_eq!(target("/\t/evil.com/x"), LinkTarget::new("evil.com", "/x"));
        assert_eq!(intercepted("/\n/evil.com/x"), None);
        assert_eq!(intercepted("/\t/evil.com/x"), None);
        assert_eq!(intercepted("/s\nub"), Some("/sub".to_owned()));
    }

    #[test]
    fn same_scheme_relative_href_stays_on_page_host() {
        assert_eq!(target("http:sub"), LinkTarget::new("localhost:3000", "/preview/sub"));
        assert_eq!(intercepted("http:sub"), Some("/preview/sub".to_owned()));
    }

    #[test]
    fn pathname_is_percent_encoded_and_dot_segments_collapse() {
        assert_eq!(target("/a b"), LinkTarget::new("localhost:3000", "/a%20b"));
        assert_eq!(target("/a/%2e%2e/x"), LinkTarget::new("localhost:3000", "/x"));
    }

    #[test]
    fn same_host_double_slash_pathname_is_kept() {
        assert_eq!(
            target("http://localhost:3000//evil.com/x"),
            LinkTarget::new("localhost:3000", "//evil.com/x")
        );
        assert_eq!(intercepted("http://localhost:3000//evil.com/x"), None);
    }

    #[test]
    fn opaque_schemes_have_no_host() {
        assert_eq!(target("mailto:team@example.com"), LinkTarget::new("", "team@example.com"));
        assert_eq!(target("javascript:void(0)"), LinkTarget::new("", "void(0)"));
    }

    #[test]
    fn unparseable_href_has_empty_target() {
        let link = resolve_href(&page(), "http://[::1");
        assert_eq!(link.url, "http://[::1");
        assert_eq!(link.target, LinkTarget::new("", ""));
    }

    #[test]
    fn resolved_url_is_absolute() {
        assert_eq!(
            resolve_href(&page(), "/sub").url,
            "http://localhost:3000/sub"
        );
    }

    #[test]
    fn userinfo_is_not_part_of_host() {
        assert_eq!(target("http://user:pw@localhost:3000/x"), LinkTarget::new("localhost:3000", "/x"));
    }
}
