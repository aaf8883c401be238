#![forbid(unsafe_code)]

//! In-memory address bar.

use boardpreview_core::AddressBar;

/// Address bar that records every fragment written to it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryAddressBar {
    fragment: String,
    history: Vec<String>,
}

impl MemoryAddressBar {
    /// Start with `fragment` showing, as when a page is opened with a hash.
    #[must_use]
    pub fn new(fragment: impl Into<String>) -> Self {
        Self {
            fragment: fragment.into(),
            history: Vec::new(),
        }
    }

    #[must_use]
    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    /// Fragments written since creation, oldest first.
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.history
    }
}

impl AddressBar for MemoryAddressBar {
    fn read_fragment(&self) -> String {
        self.fragment.clone()
    }

    fn write_fragment(&mut self, fragment: &str) {
        self.fragment = fragment.to_owned();
        self.history.push(fragment.to_owned());
    }
}
