#![forbid(unsafe_code)]

//! Headless preview frame: a [`SyntheticDocument`] plus the click layer.

use std::fmt;

use boardpreview_core::PreviewFrame;
use boardpreview_core::hook::NavigationSender;
use boardpreview_core::link::intercepted_path;

use crate::document::{DocumentError, ElementHandle, SyntheticDocument};
use crate::url::{PageUrl, resolve_href};

/// What a click on an anchor did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Default navigation was prevented and `path` was posted to the hook.
    Intercepted { path: String, delivered: bool },
    /// The browser would have navigated to `url`.
    Followed { url: String },
    /// The element is not a link (no `href`).
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// The frame was torn down.
    Detached,
    Document(DocumentError),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Detached => f.write_str("preview frame is detached"),
            Self::Document(err) => write!(f, "preview document: {err}"),
        }
    }
}

impl std::error::Error for FrameError {}

impl From<DocumentError> for FrameError {
    fn from(err: DocumentError) -> Self {
        Self::Document(err)
    }
}

/// A preview frame embedded in a page at `page`.
#[derive(Debug)]
pub struct HeadlessFrame {
    page: PageUrl,
    document: SyntheticDocument,
    hook: Option<NavigationSender>,
    attached: bool,
    followed: Vec<String>,
}

impl HeadlessFrame {
    #[must_use]
    pub fn new(page: PageUrl) -> Self {
        Self {
            page,
            document: SyntheticDocument::new(),
            hook: None,
            attached: true,
            followed: Vec::new(),
        }
    }

    #[must_use]
    pub fn page(&self) -> &PageUrl {
        &self.page
    }

    #[must_use]
    pub fn document(&self) -> &SyntheticDocument {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut SyntheticDocument {
        &mut self.document
    }

    /// Make `sender` the navigation hook reachable from in-frame script.
    pub fn install_hook(&mut self, sender: NavigationSender) {
        self.hook = Some(sender);
    }

    pub fn remove_hook(&mut self) -> Option<NavigationSender> {
        self.hook.take()
    }

    #[must_use]
    pub fn has_hook(&self) -> bool {
        self.hook.is_some()
    }

    /// Tear the frame down; later writes fail with [`FrameError::Detached`].
    pub fn detach(&mut self) {
        self.attached = false;
        self.hook = None;
    }

    /// URLs of clicks that were left to default navigation.
    #[must_use]
    pub fn followed(&self) -> &[String] {
        &self.followed
    }

    /// Dispatch a click on `anchor`.
    ///
    /// An anchor with the interception listener whose target passes
    /// [`intercepted_path`] posts its path to the hook; everything else
    /// falls through to default navigation, which is recorded but not
    /// performed.
    pub fn click(&mut self, anchor: ElementHandle) -> Result<ClickOutcome, DocumentError> {
        let Some(href) = self.document.attribute(anchor, "href")? else {
            return Ok(ClickOutcome::Ignored);
        };
        let link = resolve_href(&self.page, href);

        if self.document.has_click_listener(anchor)? {
            if let Some(path) = intercepted_path(&link.target, self.page.host()) {
                let delivered = self.hook.as_ref().is_some_and(|hook| hook.post(path));
                tracing::debug!(path, delivered, "intercepted link click");
                return Ok(ClickOutcome::Intercepted {
                    path: path.to_owned(),
                    delivered,
                });
            }
        }

        tracing::debug!(url = %link.url, "link followed");
        self.followed.push(link.url.clone());
        Ok(ClickOutcome::Followed { url: link.url })
    }
}

impl PreviewFrame for HeadlessFrame {
    type Error = FrameError;

    fn open(&mut self) -> Result<(), FrameError> {
        if !self.attached {
            return Err(FrameError::Detached);
        }
        self.document.open();
        Ok(())
    }

    fn write(&mut self, markup: &str) -> Result<(), FrameError> {
        if !self.attached {
            return Err(FrameError::Detached);
        }
        Ok(self.document.write(markup)?)
    }

    fn close(&mut self) -> Result<(), FrameError> {
        if !self.attached {
            return Err(FrameError::Detached);
        }
        Ok(self.document.close()?)
    }
}
