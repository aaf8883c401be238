#![forbid(unsafe_code)]

//! The navigation coordinator.
//!
//! [`NavigationCoordinator`] owns the navigation state (current board, path,
//! routes, last load error) and drives resolve → render → address-bar sync.
//!
//! # Load state machine
//!
//! ```text
//!            submit_board            complete_load(Ok)
//!   Idle ───────────────▶ Loading ─────────────────────▶ Ready
//!                          │  ▲                            │
//!       complete_load(Err) │  └──────── submit_board ──────┘
//!                          ▼
//!                        Error ───── submit_board ─────▶ Loading
//! ```
//!
//! Blank board input never leaves the current phase, and nothing returns to
//! `Idle`.
//!
//! Fetching is the host's job. [`NavigationCoordinator::submit_board`] hands
//! back a [`LoadTicket`]; the host fetches `ticket.url()` and reports the
//! result through [`NavigationCoordinator::complete_load`]. Tickets carry a
//! generation so that, under [`StaleLoadPolicy::Discard`], a slow fetch for
//! an older submission cannot overwrite a newer board.
//!
//! # Invariants
//!
//! 1. Board and routes change together: a successful load replaces both, a
//!    failed one clears both and records the error.
//! 2. While a newer load is in flight the previous board stays current and
//!    navigable.
//! 3. The current path is always normalized.
//! 4. Without routes nothing is rendered and the address bar is untouched.

use crate::board::{BoardData, BoardId, LoadError};
use crate::config::{PreviewConfig, StaleLoadPolicy};
use crate::fragment::{AddressBar, InitialLocation, format_fragment};
use crate::hook::{NavigationChannel, NavigationSender};
use crate::path::RoutePath;
use crate::preview::{PreviewFrame, interception_script, render_preview};
use crate::route::{RenderContext, RouteProvider, RouteTable};

/// Where the coordinator is in the board-load lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadPhase {
    /// No board submitted yet.
    Idle,
    /// A fetch is outstanding.
    Loading,
    /// Routes are available.
    Ready,
    /// The latest load failed.
    Error,
}

/// An outstanding board load the host must complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    board_id: BoardId,
    generation: u64,
    url: String,
}

impl LoadTicket {
    #[must_use]
    pub fn board_id(&self) -> &BoardId {
        &self.board_id
    }

    /// Monotonically increasing per coordinator, starting at 1.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Data source URL to fetch.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Result of [`NavigationCoordinator::complete_load`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The board is current and was rendered at the tracked path.
    Ready { routes: usize },
    /// The fetch or route conversion failed; the error is on the state.
    Failed(LoadError),
    /// A newer submission superseded this ticket; nothing changed.
    Stale,
}

/// Owns navigation state and the preview frame.
pub struct NavigationCoordinator<F, A> {
    config: PreviewConfig,
    provider: Box<dyn RouteProvider>,
    frame: F,
    address_bar: A,
    channel: NavigationChannel,
    script: String,
    phase: LoadPhase,
    board_id: Option<BoardId>,
    path: RoutePath,
    routes: Option<RouteTable>,
    load_error: Option<LoadError>,
    latest_generation: u64,
    render_count: u64,
}

impl<F: PreviewFrame, A: AddressBar> NavigationCoordinator<F, A> {
    pub fn new(
        config: PreviewConfig,
        provider: impl RouteProvider + 'static,
        frame: F,
        address_bar: A,
    ) -> Self {
        let script = interception_script(&config.message_type);
        Self {
            config,
            provider: Box::new(provider),
            frame,
            address_bar,
            channel: NavigationChannel::new(),
            script,
            phase: LoadPhase::Idle,
            board_id: None,
            path: RoutePath::root(),
            routes: None,
            load_error: None,
            latest_generation: 0,
            render_count: 0,
        }
    }

    /// Seed board and path from the address bar and start loading the board
    /// it names, if any.
    pub fn mount(&mut self) -> Option<LoadTicket> {
        let initial = InitialLocation::parse(&self.address_bar.read_fragment());
        self.path = RoutePath::new(&initial.path);
        tracing::debug!(
            board = initial.board_id.as_ref().map(BoardId::as_str),
            path = %self.path,
            "mount"
        );
        let ticket = initial
            .board_id
            .and_then(|board| self.submit_board(board.as_str()));
        let path = self.path.clone();
        self.navigate(path.as_str());
        ticket
    }

    /// Start loading the board named by `input`.
    ///
    /// Blank input is rejected and leaves the state untouched. Resubmitting
    /// the current or a failed board retries.
    pub fn submit_board(&mut self, input: &str) -> Option<LoadTicket> {
        let Some(board_id) = BoardId::parse(input) else {
            tracing::debug!("ignoring blank board id");
            return None;
        };
        self.latest_generation += 1;
        self.phase = LoadPhase::Loading;
        let ticket = LoadTicket {
            url: self.config.board_url(&board_id),
            board_id,
            generation: self.latest_generation,
        };
        tracing::info!(
            board = %ticket.board_id,
            generation = ticket.generation,
            url = %ticket.url,
            "loading board"
        );
        Some(ticket)
    }

    /// Apply the result of the fetch for `ticket`.
    pub fn complete_load(
        &mut self,
        ticket: &LoadTicket,
        result: Result<BoardData, LoadError>,
    ) -> LoadOutcome {
        let superseded = ticket.generation != self.latest_generation;
        if superseded && self.config.stale_load_policy == StaleLoadPolicy::Discard {
            tracing::warn!(
                board = %ticket.board_id,
                generation = ticket.generation,
                latest = self.latest_generation,
                "discarding stale board load"
            );
            return LoadOutcome::Stale;
        }

        let routes = result.and_then(|data| self.provider.routes_for_data(&data));
        match routes {
            Ok(routes) => {
                let table = RouteTable::new(routes);
                let count = table.len();
                tracing::info!(board = %ticket.board_id, routes = count, "board ready");
                self.board_id = Some(ticket.board_id.clone());
                self.routes = Some(table);
                self.load_error = None;
                self.phase = LoadPhase::Ready;
                let path = self.path.clone();
                self.navigate(path.as_str());
                LoadOutcome::Ready { routes: count }
            }
            Err(err) => {
                tracing::warn!(board = %ticket.board_id, error = %err, "board load failed");
                self.board_id = None;
                self.routes = None;
                self.load_error = Some(err.clone());
                self.phase = LoadPhase::Error;
                LoadOutcome::Failed(err)
            }
        }
    }

    /// Show `path`: resolve it, render the route (or an empty document when
    /// nothing matches) and push the new fragment.
    ///
    /// Does nothing but track the path while no routes are loaded.
    pub fn navigate(&mut self, path: &str) {
        let path = RoutePath::new(path);
        self.path = path.clone();

        let (Some(board_id), Some(routes)) = (&self.board_id, &self.routes) else {
            tracing::debug!(path = %path, "no routes loaded, skipping render");
            return;
        };

        let html = match routes.resolve(path.as_str()) {
            Some(route) => route.render(&RenderContext {
                board_id: board_id.clone(),
                path: path.clone(),
            }),
            None => {
                tracing::debug!(path = %path, "no matching route, rendering empty document");
                String::new()
            }
        };

        if let Err(err) = render_preview(&mut self.frame, &html, &self.script) {
            tracing::warn!(path = %path, error = %err, "preview frame write failed");
        }
        self.render_count += 1;
        self.address_bar
            .write_fragment(&format_fragment(board_id, &path));
        tracing::debug!(board = %board_id, path = %path, "navigated");
    }

    /// Apply every navigation queued on the hook. Returns how many ran.
    pub fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Some(request) = self.channel.try_recv() {
            self.navigate(&request.path);
            handled += 1;
        }
        handled
    }

    /// A sender for the navigation hook. It goes inert when the coordinator
    /// is dropped.
    #[must_use]
    pub fn navigation_sender(&self) -> NavigationSender {
        self.channel.sender()
    }

    #[must_use]
    pub const fn phase(&self) -> LoadPhase {
        self.phase
    }

    #[must_use]
    pub fn board_id(&self) -> Option<&BoardId> {
        self.board_id.as_ref()
    }

    #[must_use]
    pub fn current_path(&self) -> &RoutePath {
        &self.path
    }

    #[must_use]
    pub fn routes(&self) -> Option<&RouteTable> {
        self.routes.as_ref()
    }

    #[must_use]
    pub fn load_error(&self) -> Option<&LoadError> {
        self.load_error.as_ref()
    }

    /// Text the outer UI shows for the last load failure.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        self.load_error
            .as_ref()
            .map(|err| format!("Error loading: {err}"))
    }

    /// Number of documents written to the frame so far.
    #[must_use]
    pub const fn render_count(&self) -> u64 {
        self.render_count
    }

    #[must_use]
    pub fn config(&self) -> &PreviewConfig {
        &self.config
    }

    #[must_use]
    pub fn frame(&self) -> &F {
        &self.frame
    }

    /// Hosts use this to dispatch input into the frame; writes must still go
    /// through [`Self::navigate`].
    pub fn frame_mut(&mut self) -> &mut F {
        &mut self.frame
    }

    #[must_use]
    pub fn address_bar(&self) -> &A {
        &self.address_bar
    }

    /// Tear down, handing back the frame and address bar. Outstanding
    /// senders go inert.
    pub fn into_parts(self) -> (F, A) {
        (self.frame, self.address_bar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::LoadErrorKind;
    use crate::route::Route;
    use pretty_assertions::assert_eq;
    use tracing_test::traced_test;

    #[derive(Debug, Default)]
    struct Frame {
        documents: Vec<String>,
        pending: Option<String>,
    }

    impl Frame {
        fn last_html(&self) -> Option<&str> {
            self.documents.last().map(String::as_str)
        }
    }

    impl PreviewFrame for Frame {
        type Error = String;

        fn open(&mut self) -> Result<(), String> {
            self.pending = Some(String::new());
            Ok(())
        }

        fn write(&mut self, markup: &str) -> Result<(), String> {
            match self.pending.as_mut() {
                Some(doc) => {
                    doc.push_str(markup);
                    Ok(())
                }
                None => Err("document not open".to_owned()),
            }
        }

        fn close(&mut self) -> Result<(), String> {
            let doc = self.pending.take().ok_or("document not open")?;
            self.documents.push(doc);
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    struct Bar {
        fragment: String,
        writes: Vec<String>,
    }

    impl AddressBar for Bar {
        fn read_fragment(&self) -> String {
            self.fragment.clone()
        }

        fn write_fragment(&mut self, fragment: &str) {
            self.fragment = fragment.to_owned();
            self.writes.push(fragment.to_owned());
        }
    }

    type Coordinator = NavigationCoordinator<Frame, Bar>;

    fn two_page_provider(data: &BoardData) -> Result<Vec<Route>, LoadError> {
        let title = data["name"].as_str().unwrap_or("untitled").to_owned();
        Ok(vec![
            Route::fixed("/", format!("<h1>{title}</h1><a href='/sub'>go</a>")),
            Route::fixed("/sub", "<h1>Sub</h1>"),
        ])
    }

    fn coordinator_with(fragment: &str, config: PreviewConfig) -> Coordinator {
        let bar = Bar {
            fragment: fragment.to_owned(),
            writes: Vec::new(),
        };
        NavigationCoordinator::new(config, two_page_provider, Frame::default(), bar)
    }

    fn coordinator() -> Coordinator {
        coordinator_with("", PreviewConfig::default())
    }

    fn board(name: &str) -> Result<BoardData, LoadError> {
        Ok(serde_json::json!({ "name": name }))
    }

    #[test]
    fn starts_idle_without_rendering() {
        let mut nav = coordinator();
        assert_eq!(nav.mount(), None);
        assert_eq!(nav.phase(), LoadPhase::Idle);
        assert_eq!(nav.render_count(), 0);
        assert!(nav.address_bar().writes.is_empty());
    }

    #[test]
    fn blank_submission_is_rejected() {
        let mut nav = coordinator();
        assert_eq!(nav.submit_board("   "), None);
        assert_eq!(nav.phase(), LoadPhase::Idle);
    }

    #[test]
    fn successful_load_renders_tracked_path() {
        let mut nav = coordinator();
        let ticket = nav.submit_board(" abc ").unwrap();
        assert_eq!(nav.phase(), LoadPhase::Loading);
        assert_eq!(ticket.board_id().as_str(), "abc");
        assert_eq!(ticket.url(), "https://trello.com/b/abc.json");

        let outcome = nav.complete_load(&ticket, board("Roadmap"));
        assert_eq!(outcome, LoadOutcome::Ready { routes: 2 });
        assert_eq!(nav.phase(), LoadPhase::Ready);
        assert!(nav.frame().last_html().unwrap().starts_with("<h1>Roadmap</h1>"));
        assert_eq!(nav.address_bar().fragment, "#abc/");
    }

    #[test]
    fn rendered_document_ends_with_interception_script() {
        let mut nav = coordinator();
        let ticket = nav.submit_board("abc").unwrap();
        nav.complete_load(&ticket, board("x"));
        let html = nav.frame().last_html().unwrap();
        let script = interception_script(&nav.config().message_type);
        assert!(html.ends_with(&script));
    }

    #[test]
    fn navigate_normalizes_and_syncs_fragment() {
        let mut nav = coordinator();
        let ticket = nav.submit_board("abc").unwrap();
        nav.complete_load(&ticket, board("x"));

        nav.navigate("/sub");
        assert_eq!(nav.current_path().as_str(), "/sub/");
        assert!(nav.frame().last_html().unwrap().starts_with("<h1>Sub</h1>"));
        assert_eq!(nav.address_bar().fragment, "#abc/sub/");
    }

    #[test]
    fn unknown_path_renders_empty_document() {
        let mut nav = coordinator();
        let ticket = nav.submit_board("abc").unwrap();
        nav.complete_load(&ticket, board("x"));

        nav.navigate("/nope");
        let html = nav.frame().last_html().unwrap();
        assert_eq!(html, interception_script(&nav.config().message_type));
        assert_eq!(nav.address_bar().fragment, "#abc/nope/");
        assert_eq!(nav.load_error(), None);
    }

    #[test]
    fn navigate_without_routes_only_tracks_path() {
        let mut nav = coordinator();
        nav.navigate("/sub");
        assert_eq!(nav.current_path().as_str(), "/sub/");
        assert_eq!(nav.render_count(), 0);

        let ticket = nav.submit_board("abc").unwrap();
        nav.complete_load(&ticket, board("x"));
        assert!(nav.frame().last_html().unwrap().starts_with("<h1>Sub</h1>"));
    }

    #[test]
    fn mount_seeds_board_and_path_from_fragment() {
        let mut nav = coordinator_with("#abc/sub", PreviewConfig::default());
        let ticket = nav.mount().unwrap();
        assert_eq!(ticket.board_id().as_str(), "abc");
        assert_eq!(nav.current_path().as_str(), "/sub/");
        assert_eq!(nav.render_count(), 0);

        nav.complete_load(&ticket, board("x"));
        assert!(nav.frame().last_html().unwrap().starts_with("<h1>Sub</h1>"));
        assert_eq!(nav.address_bar().fragment, "#abc/sub/");
    }

    #[test]
    #[traced_test]
    fn failed_load_records_error_and_clears_routes() {
        let mut nav = coordinator();
        let first = nav.submit_board("abc").unwrap();
        nav.complete_load(&first, board("x"));

        let second = nav.submit_board("missing").unwrap();
        let outcome = nav.complete_load(&second, Err(LoadError::status(404)));
        assert!(matches!(outcome, LoadOutcome::Failed(_)));
        assert_eq!(nav.phase(), LoadPhase::Error);
        assert_eq!(nav.routes().map(RouteTable::len), None);
        assert_eq!(nav.board_id(), None);
        assert_eq!(
            nav.error_message().as_deref(),
            Some("Error loading: Request failed with status code 404")
        );
        assert!(logs_contain("board load failed"));

        let renders = nav.render_count();
        nav.navigate("/");
        assert_eq!(nav.render_count(), renders);
    }

    #[test]
    fn retry_after_failure_recovers() {
        let mut nav = coordinator();
        let ticket = nav.submit_board("abc").unwrap();
        nav.complete_load(&ticket, Err(LoadError::network("offline")));

        let retry = nav.submit_board("abc").unwrap();
        assert_eq!(retry.generation(), 2);
        assert_eq!(nav.complete_load(&retry, board("x")), LoadOutcome::Ready { routes: 2 });
        assert_eq!(nav.load_error(), None);
        assert_eq!(nav.error_message(), None);
    }

    #[test]
    fn provider_failure_is_a_load_failure() {
        let bar = Bar::default();
        let failing = |_: &BoardData| -> Result<Vec<Route>, LoadError> {
            Err(LoadError::provider("board has no lists"))
        };
        let mut nav =
            NavigationCoordinator::new(PreviewConfig::default(), failing, Frame::default(), bar);
        let ticket = nav.submit_board("abc").unwrap();
        let outcome = nav.complete_load(&ticket, board("x"));
        assert_eq!(
            outcome,
            LoadOutcome::Failed(LoadError::provider("board has no lists"))
        );
        assert_eq!(nav.load_error().unwrap().kind(), LoadErrorKind::Provider);
    }

    #[test]
    fn previous_board_stays_navigable_while_loading() {
        let mut nav = coordinator();
        let first = nav.submit_board("one").unwrap();
        nav.complete_load(&first, board("One"));
        let _pending = nav.submit_board("two").unwrap();

        assert_eq!(nav.phase(), LoadPhase::Loading);
        nav.navigate("/sub");
        assert_eq!(nav.address_bar().fragment, "#one/sub/");
    }

    #[test]
    #[traced_test]
    fn stale_completion_is_discarded() {
        let mut nav = coordinator();
        let slow = nav.submit_board("old").unwrap();
        let fast = nav.submit_board("new").unwrap();

        assert_eq!(nav.complete_load(&fast, board("New")), LoadOutcome::Ready { routes: 2 });
        assert_eq!(nav.complete_load(&slow, board("Old")), LoadOutcome::Stale);
        assert_eq!(nav.board_id().unwrap().as_str(), "new");
        assert!(nav.frame().last_html().unwrap().starts_with("<h1>New</h1>"));
        assert!(logs_contain("discarding stale board load"));
    }

    #[test]
    fn apply_policy_lets_stale_completion_win() {
        let config = PreviewConfig {
            stale_load_policy: StaleLoadPolicy::Apply,
            ..PreviewConfig::default()
        };
        let mut nav = coordinator_with("", config);
        let slow = nav.submit_board("old").unwrap();
        let fast = nav.submit_board("new").unwrap();

        nav.complete_load(&fast, board("New"));
        assert_eq!(nav.complete_load(&slow, board("Old")), LoadOutcome::Ready { routes: 2 });
        assert_eq!(nav.board_id().unwrap().as_str(), "old");
    }

    #[test]
    fn hook_requests_are_applied_in_order() {
        let mut nav = coordinator();
        let ticket = nav.submit_board("abc").unwrap();
        nav.complete_load(&ticket, board("x"));

        let sender = nav.navigation_sender();
        sender.post("/sub");
        sender.post("/");
        assert_eq!(nav.process_pending(), 2);
        assert_eq!(nav.current_path().as_str(), "/");
        assert_eq!(
            nav.address_bar().writes,
            vec!["#abc/", "#abc/sub/", "#abc/"]
        );
    }

    #[test]
    fn hook_goes_inert_after_teardown() {
        let nav = coordinator();
        let sender = nav.navigation_sender();
        let (_frame, _bar) = nav.into_parts();
        assert!(!sender.post("/sub"));
    }
}
