#![forbid(unsafe_code)]

//! Host-driven preview session.
//!
//! [`HeadlessSession`] plays the role of the mounted UI: it owns the
//! coordinator, installs the navigation hook into the frame, and queues board
//! loads until the caller completes them. Nothing happens between calls.
//!
//! # Example
//!
//! ```ignore
//! let mut session = HeadlessSession::mount(config, provider, source, page, "#abc");
//! session.complete_all();
//! session.click_href("/sub")?;
//! assert_eq!(session.address_bar().fragment(), "#abc/sub/");
//! ```

use std::collections::VecDeque;

use boardpreview_core::{
    LoadOutcome, LoadPhase, LoadTicket, NavigationCoordinator, PreviewConfig, RouteProvider,
};

use crate::address_bar::MemoryAddressBar;
use crate::document::{DocumentError, ElementHandle, SyntheticDocument};
use crate::frame::{ClickOutcome, HeadlessFrame};
use crate::source::BoardSource;
use crate::url::PageUrl;

/// A mounted headless preview.
pub struct HeadlessSession<S> {
    coordinator: NavigationCoordinator<HeadlessFrame, MemoryAddressBar>,
    source: S,
    pending: VecDeque<LoadTicket>,
}

impl<S: BoardSource> HeadlessSession<S> {
    /// Mount a preview on `page` whose address bar currently shows
    /// `fragment`. A board named in the fragment starts loading.
    pub fn mount(
        config: PreviewConfig,
        provider: impl RouteProvider + 'static,
        source: S,
        page: PageUrl,
        fragment: &str,
    ) -> Self {
        let frame = HeadlessFrame::new(page);
        let bar = MemoryAddressBar::new(fragment);
        let mut coordinator = NavigationCoordinator::new(config, provider, frame, bar);
        let sender = coordinator.navigation_sender();
        coordinator.frame_mut().install_hook(sender);

        let mut session = Self {
            coordinator,
            source,
            pending: VecDeque::new(),
        };
        if let Some(ticket) = session.coordinator.mount() {
            session.pending.push_back(ticket);
        }
        session
    }

    /// Submit a board identifier as typed by the user.
    pub fn submit_board(&mut self, input: &str) -> Option<LoadTicket> {
        let ticket = self.coordinator.submit_board(input)?;
        self.pending.push_back(ticket.clone());
        Some(ticket)
    }

    /// Loads submitted but not yet completed, oldest first.
    pub fn pending_loads(&self) -> impl Iterator<Item = &LoadTicket> + '_ {
        self.pending.iter()
    }

    /// Complete the oldest outstanding load.
    pub fn complete_next(&mut self) -> Option<LoadOutcome> {
        let ticket = self.pending.pop_front()?;
        Some(self.finish(&ticket))
    }

    /// Complete a specific outstanding load, in any order.
    pub fn complete(&mut self, ticket: &LoadTicket) -> Option<LoadOutcome> {
        let idx = self.pending.iter().position(|t| t == ticket)?;
        let ticket = self.pending.remove(idx)?;
        Some(self.finish(&ticket))
    }

    /// Complete every outstanding load in submission order.
    pub fn complete_all(&mut self) -> Vec<LoadOutcome> {
        let mut outcomes = Vec::with_capacity(self.pending.len());
        while let Some(outcome) = self.complete_next() {
            outcomes.push(outcome);
        }
        outcomes
    }

    fn finish(&mut self, ticket: &LoadTicket) -> LoadOutcome {
        let result = self.source.fetch(ticket);
        self.coordinator.complete_load(ticket, result)
    }

    /// Click `anchor` in the preview and apply any navigation it requested.
    pub fn click(&mut self, anchor: ElementHandle) -> Result<ClickOutcome, DocumentError> {
        let outcome = self.coordinator.frame_mut().click(anchor)?;
        self.coordinator.process_pending();
        Ok(outcome)
    }

    /// Click the first anchor whose `href` is exactly `href`.
    pub fn click_href(&mut self, href: &str) -> Result<ClickOutcome, DocumentError> {
        let anchor = self
            .document()
            .find_anchor(href)
            .ok_or(DocumentError::NoSuchElement)?;
        self.click(anchor)
    }

    pub fn navigate(&mut self, path: &str) {
        self.coordinator.navigate(path);
    }

    #[must_use]
    pub fn coordinator(&self) -> &NavigationCoordinator<HeadlessFrame, MemoryAddressBar> {
        &self.coordinator
    }

    #[must_use]
    pub fn phase(&self) -> LoadPhase {
        self.coordinator.phase()
    }

    #[must_use]
    pub fn document(&self) -> &SyntheticDocument {
        self.coordinator.frame().document()
    }

    #[must_use]
    pub fn address_bar(&self) -> &MemoryAddressBar {
        self.coordinator.address_bar()
    }

    /// Unmount: remove the hook and detach the frame. Outstanding loads are
    /// abandoned, not aborted at the source.
    pub fn unmount(self) -> (HeadlessFrame, MemoryAddressBar) {
        let (mut frame, bar) = self.coordinator.into_parts();
        frame.detach();
        tracing::debug!(abandoned = self.pending.len(), "preview unmounted");
        (frame, bar)
    }
}
