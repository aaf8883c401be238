#![forbid(unsafe_code)]

//! Path canonicalization.
//!
//! Two paths name the same page when they are equal after [`normalize`]:
//! the root `/` stays as is, every other path gains a trailing `/` unless it
//! already has one.

use std::borrow::Cow;
use std::fmt;

/// Canonicalize `path` for comparison.
///
/// Total for any input, including the empty string (which becomes `/`).
#[must_use]
pub fn normalize(path: &str) -> Cow<'_, str> {
    if path.ends_with('/') {
        Cow::Borrowed(path)
    } else {
        let mut owned = String::with_capacity(path.len() + 1);
        owned.push_str(path);
        owned.push('/');
        Cow::Owned(owned)
    }
}

/// Compare two paths under [`normalize`].
#[must_use]
pub fn same_path(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

/// A path that has already been through [`normalize`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoutePath(String);

impl RoutePath {
    /// The root path `/`.
    #[must_use]
    pub fn root() -> Self {
        Self("/".to_owned())
    }

    #[must_use]
    pub fn new(path: &str) -> Self {
        Self(normalize(path).into_owned())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }
}

impl Default for RoutePath {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for RoutePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RoutePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RoutePath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}
