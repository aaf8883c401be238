#![forbid(unsafe_code)]

//! Which in-frame link clicks become client-side navigations.
//!
//! A click is intercepted only when the link points at the embedding page's
//! own host and its path is root-relative with a single leading `/`. A
//! pathname such as `//evil.com/x` is left alone even if the host check
//! passes.
//!
//! Hosts compare as plain strings, exactly as the script compares
//! `link.host === location.host`. On a hostless page (`file://`) a hostless
//! link such as `file:///x` is therefore intercepted, while a hostless link
//! on a page with a host (`mailto:`, `javascript:`) never matches.
//!
//! The injected script in [`crate::preview`] applies the same rule inside a
//! browser; headless hosts call [`intercepted_path`] directly.

/// The parts of a link a browser exposes as `host` and `pathname`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkTarget {
    /// Host with port, empty for hostless URLs such as `mailto:`.
    pub host: String,
    pub pathname: String,
}

impl LinkTarget {
    pub fn new(host: impl Into<String>, pathname: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            pathname: pathname.into(),
        }
    }
}

/// Path to navigate to when a click on `link` should be intercepted.
#[must_use]
pub fn intercepted_path<'a>(link: &'a LinkTarget, page_host: &str) -> Option<&'a str> {
    let path = link.pathname.as_str();
    let single_slash = path.starts_with('/') && !path.starts_with("//");
    if link.host == page_host && single_slash {
        Some(path)
    } else {
        None
    }
}
