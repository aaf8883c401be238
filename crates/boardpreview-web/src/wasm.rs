#![forbid(unsafe_code)]

//! Browser host: binds the coordinator to an `<iframe>`, the window
//! location hash, `fetch`, and the window `message` event.
//!
//! ```text
//!  JS ──submitBoardId──▶ BoardPreview ──fetch──▶ board JSON
//!                            │                      │
//!                            │◀──── complete_load ───┘ (spawn_local)
//!                            ▼
//!                  NavigationCoordinator ──open/write/close──▶ iframe
//!                            ▲                                  │
//!                            └── process_pending ◀── message ◀──┘
//! ```
//!
//! # Invariants
//!
//! - At most one coordinator is mounted; remounting or `destroy()` drops the
//!   previous one, which turns its navigation sender inert.
//! - A fetch completion is applied only to the mount that issued it.
//! - The `message` listener is removed on `destroy()`.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use boardpreview_core::{
    AddressBar, BoardData, LoadError, LoadPhase, LoadTicket, NavigationCoordinator,
    NavigationSender, PreviewConfig, PreviewFrame, RenderContext, Route, RouteProvider,
};
use js_sys::{Array, Function, JSON, Object, Reflect};
use tracing::Level;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{Document, HtmlIFrameElement, MessageEvent, Response, Window};

use crate::console_log;
use crate::message::accept_message;

type Coordinator = NavigationCoordinator<IframeFrame, WindowAddressBar>;

struct Mounted {
    epoch: u64,
    coordinator: Coordinator,
}

type SharedState = Rc<RefCell<Option<Mounted>>>;

/// Board preview mounted on an `<iframe>`.
#[wasm_bindgen]
pub struct BoardPreview {
    config: PreviewConfig,
    window: Window,
    state: SharedState,
    epoch: u64,
    listener: Option<Closure<dyn FnMut(MessageEvent)>>,
}

#[wasm_bindgen]
impl BoardPreview {
    /// Create a preview. `options` takes the [`PreviewConfig`] fields in
    /// camelCase; omitted fields keep their defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(options: Option<JsValue>) -> Result<BoardPreview, JsValue> {
        init_console_logging();
        let config = match options.filter(|o| !o.is_undefined() && !o.is_null()) {
            Some(options) => {
                let json = JSON::stringify(&options)?
                    .as_string()
                    .ok_or_else(|| JsValue::from_str("options are not JSON-serializable"))?;
                PreviewConfig::from_json(&json).map_err(|err| JsValue::from_str(&err.to_string()))?
            }
            None => PreviewConfig::default(),
        };
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;
        Ok(Self {
            config,
            window,
            state: Rc::new(RefCell::new(None)),
            epoch: 0,
            listener: None,
        })
    }

    /// Mount onto `iframe`, using `routesForData(data)` to build the routes
    /// of every loaded board. A board named in the location hash starts
    /// loading immediately.
    pub fn mount(
        &mut self,
        iframe: HtmlIFrameElement,
        routes_for_data: Function,
    ) -> Result<(), JsValue> {
        self.destroy();
        self.epoch += 1;

        let provider = JsRouteProvider { routes_for_data };
        let frame = IframeFrame {
            iframe: Some(iframe),
        };
        let bar = WindowAddressBar {
            window: self.window.clone(),
        };
        let mut coordinator = NavigationCoordinator::new(self.config.clone(), provider, frame, bar);
        let sender = coordinator.navigation_sender();
        let ticket = coordinator.mount();
        *self.state.borrow_mut() = Some(Mounted {
            epoch: self.epoch,
            coordinator,
        });

        self.listen(sender)?;
        if let Some(ticket) = ticket {
            self.start_load(ticket);
        }
        Ok(())
    }

    /// Load the board typed by the user. Returns `false` for blank input or
    /// when nothing is mounted.
    #[wasm_bindgen(js_name = submitBoardId)]
    pub fn submit_board_id(&mut self, input: &str) -> bool {
        let ticket = self
            .state
            .borrow_mut()
            .as_mut()
            .and_then(|mounted| mounted.coordinator.submit_board(input));
        match ticket {
            Some(ticket) => {
                self.start_load(ticket);
                true
            }
            None => false,
        }
    }

    /// Show `path` of the current board.
    pub fn navigate(&mut self, path: &str) {
        if let Some(mounted) = self.state.borrow_mut().as_mut() {
            mounted.coordinator.navigate(path);
        }
    }

    /// `Error loading: <message>` after a failed load.
    #[wasm_bindgen(js_name = errorMessage)]
    pub fn error_message(&self) -> Option<String> {
        self.with_coordinator(Coordinator::error_message).flatten()
    }

    #[wasm_bindgen(js_name = boardId)]
    pub fn board_id(&self) -> Option<String> {
        self.with_coordinator(|c| c.board_id().map(|id| id.as_str().to_owned()))
            .flatten()
    }

    #[wasm_bindgen(js_name = currentPath)]
    pub fn current_path(&self) -> String {
        self.with_coordinator(|c| c.current_path().as_str().to_owned())
            .unwrap_or_else(|| "/".to_owned())
    }

    /// `idle`, `loading`, `ready` or `error`.
    pub fn phase(&self) -> String {
        let phase = self
            .with_coordinator(Coordinator::phase)
            .unwrap_or(LoadPhase::Idle);
        match phase {
            LoadPhase::Idle => "idle",
            LoadPhase::Loading => "loading",
            LoadPhase::Ready => "ready",
            LoadPhase::Error => "error",
        }
        .to_owned()
    }

    /// Explicit teardown for JS callers: removes the `message` listener and
    /// drops the coordinator. Outstanding fetches complete into nothing.
    pub fn destroy(&mut self) {
        if let Some(listener) = self.listener.take() {
            if let Err(err) = self
                .window
                .remove_event_listener_with_callback("message", listener.as_ref().unchecked_ref())
            {
                tracing::warn!(error = %js_message(&err), "failed to remove message listener");
            }
        }
        if self.state.borrow_mut().take().is_some() {
            tracing::debug!(epoch = self.epoch, "preview destroyed");
        }
    }
}

impl BoardPreview {
    fn with_coordinator<T>(&self, f: impl FnOnce(&Coordinator) -> T) -> Option<T> {
        self.state
            .borrow()
            .as_ref()
            .map(|mounted| f(&mounted.coordinator))
    }

    fn listen(&mut self, sender: NavigationSender) -> Result<(), JsValue> {
        let state = Rc::downgrade(&self.state);
        let page_origin = self.window.location().origin()?;
        let message_type = self.config.message_type.clone();

        let listener = Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
            let Some(data) = JSON::stringify(&event.data())
                .ok()
                .and_then(|json| json.as_string())
            else {
                return;
            };
            match accept_message(&event.origin(), &page_origin, &data, &message_type) {
                Ok(path) => {
                    if sender.post(path) {
                        drain_navigation(&state);
                    }
                }
                Err(rejection) => tracing::trace!(%rejection, "ignoring message"),
            }
        });
        self.window
            .add_event_listener_with_callback("message", listener.as_ref().unchecked_ref())?;
        self.listener = Some(listener);
        Ok(())
    }

    fn start_load(&self, ticket: LoadTicket) {
        let state = Rc::downgrade(&self.state);
        let window = self.window.clone();
        let epoch = self.epoch;
        spawn_local(async move {
            let result = fetch_board(&window, ticket.url()).await;
            let Some(state) = state.upgrade() else {
                return;
            };
            let Ok(mut guard) = state.try_borrow_mut() else {
                tracing::warn!(board = %ticket.board_id(), "preview busy, dropping load result");
                return;
            };
            match guard.as_mut() {
                Some(mounted) if mounted.epoch == epoch => {
                    mounted.coordinator.complete_load(&ticket, result);
                }
                _ => tracing::debug!(board = %ticket.board_id(), "load finished after unmount"),
            }
        });
    }
}

impl Drop for BoardPreview {
    fn drop(&mut self) {
        self.destroy();
    }
}

fn drain_navigation(state: &Weak<RefCell<Option<Mounted>>>) {
    let Some(state) = state.upgrade() else {
        return;
    };
    let Ok(mut guard) = state.try_borrow_mut() else {
        return;
    };
    if let Some(mounted) = guard.as_mut() {
        mounted.coordinator.process_pending();
    }
}

fn init_console_logging() {
    let level = if cfg!(debug_assertions) {
        Level::DEBUG
    } else {
        Level::INFO
    };
    console_log::init_with_sink(
        |line| web_sys::console::log_1(&JsValue::from_str(line)),
        level,
    );
}

fn js_message(value: &JsValue) -> String {
    if let Some(text) = value.as_string() {
        return text;
    }
    match value.dyn_ref::<js_sys::Error>() {
        Some(err) => String::from(err.message()),
        None => format!("{value:?}"),
    }
}

async fn fetch_board(window: &Window, url: &str) -> Result<BoardData, LoadError> {
    let response = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(|err| LoadError::network(js_message(&err)))?;
    let response: Response = response
        .dyn_into()
        .map_err(|_| LoadError::network("fetch did not resolve to a Response"))?;
    if !response.ok() {
        return Err(LoadError::status(response.status()));
    }
    let body = response
        .text()
        .map_err(|err| LoadError::network(js_message(&err)))?;
    let body = JsFuture::from(body)
        .await
        .map_err(|err| LoadError::network(js_message(&err)))?
        .as_string()
        .ok_or_else(|| LoadError::decode("response body is not text"))?;
    Ok(serde_json::from_str(&body)?)
}

// ── Frame ─────────────────────────────────────────────────────────────

#[derive(Debug)]
enum IframeError {
    Detached,
    Js(String),
}

impl fmt::Display for IframeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Detached => f.write_str("iframe has no content document"),
            Self::Js(message) => f.write_str(message),
        }
    }
}

struct IframeFrame {
    iframe: Option<HtmlIFrameElement>,
}

impl IframeFrame {
    fn document(&self) -> Result<Document, IframeError> {
        self.iframe
            .as_ref()
            .and_then(HtmlIFrameElement::content_document)
            .ok_or(IframeError::Detached)
    }
}

fn js_error(err: JsValue) -> IframeError {
    IframeError::Js(js_message(&err))
}

impl PreviewFrame for IframeFrame {
    type Error = IframeError;

    fn open(&mut self) -> Result<(), IframeError> {
        self.document()?.open().map_err(js_error)?;
        Ok(())
    }

    fn write(&mut self, markup: &str) -> Result<(), IframeError> {
        let text = Array::of1(&JsValue::from_str(markup));
        self.document()?.write(&text).map_err(js_error)
    }

    fn close(&mut self) -> Result<(), IframeError> {
        self.document()?.close().map_err(js_error)
    }
}

// ── Address bar ───────────────────────────────────────────────────────

struct WindowAddressBar {
    window: Window,
}

impl AddressBar for WindowAddressBar {
    fn read_fragment(&self) -> String {
        self.window.location().hash().unwrap_or_default()
    }

    fn write_fragment(&mut self, fragment: &str) {
        if let Err(err) = self.window.location().set_hash(fragment) {
            tracing::warn!(fragment, error = %js_message(&err), "failed to update location hash");
        }
    }
}

// ── Route provider ────────────────────────────────────────────────────

/// Adapts a JS `routesForData(data)` function. Each returned entry carries a
/// `path` and either `render(ctx) -> string` or `handler(ctx, callback)`.
struct JsRouteProvider {
    routes_for_data: Function,
}

impl RouteProvider for JsRouteProvider {
    fn routes_for_data(&self, data: &BoardData) -> Result<Vec<Route>, LoadError> {
        let data = JSON::parse(&serde_json::to_string(data)?)
            .map_err(|err| LoadError::decode(js_message(&err)))?;
        let value = self
            .routes_for_data
            .call1(&JsValue::NULL, &data)
            .map_err(|err| LoadError::provider(js_message(&err)))?;
        if !Array::is_array(&value) {
            return Err(LoadError::provider("routesForData must return an array"));
        }
        Ok(Array::from(&value)
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| js_route(index, &entry))
            .collect())
    }
}

fn js_route(index: usize, entry: &JsValue) -> Option<Route> {
    let Some(path) = Reflect::get(entry, &JsValue::from_str("path"))
        .ok()
        .and_then(|path| path.as_string())
    else {
        tracing::warn!(index, "skipping route without a path");
        return None;
    };
    if let Some(render) = function_property(entry, "render") {
        return Some(Route::new(path, move |ctx: &RenderContext| {
            call_render(&render, ctx)
        }));
    }
    if let Some(handler) = function_property(entry, "handler") {
        return Some(Route::new(path, move |ctx: &RenderContext| {
            call_handler(&handler, ctx)
        }));
    }
    tracing::warn!(index, path = %path, "skipping route without render or handler");
    None
}

fn function_property(entry: &JsValue, name: &str) -> Option<Function> {
    Reflect::get(entry, &JsValue::from_str(name))
        .ok()?
        .dyn_into::<Function>()
        .ok()
}

fn context_object(ctx: &RenderContext) -> JsValue {
    let object = Object::new();
    let fields = [("boardId", ctx.board_id.as_str()), ("path", ctx.path.as_str())];
    for (key, value) in fields {
        if let Err(err) = Reflect::set(&object, &JsValue::from_str(key), &JsValue::from_str(value)) {
            tracing::warn!(key, error = %js_message(&err), "failed to build render context");
        }
    }
    object.into()
}

fn call_render(render: &Function, ctx: &RenderContext) -> String {
    match render.call1(&JsValue::NULL, &context_object(ctx)) {
        Ok(html) => html.as_string().unwrap_or_default(),
        Err(err) => {
            tracing::warn!(path = %ctx.path, error = %js_message(&err), "route render threw");
            String::new()
        }
    }
}

/// The handler must invoke its callback before returning; a later call is
/// ignored and the route renders empty.
fn call_handler(handler: &Function, ctx: &RenderContext) -> String {
    let slot = Rc::new(RefCell::new(None::<String>));
    let sink = Rc::clone(&slot);
    let callback = Closure::<dyn FnMut(JsValue)>::new(move |html: JsValue| {
        *sink.borrow_mut() = html.as_string();
    });
    if let Err(err) = handler.call2(
        &JsValue::NULL,
        &context_object(ctx),
        callback.as_ref().unchecked_ref(),
    ) {
        tracing::warn!(path = %ctx.path, error = %js_message(&err), "route handler threw");
    }
    drop(callback);
    let html = slot.borrow_mut().take();
    html.unwrap_or_default()
}
