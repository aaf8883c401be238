#![forbid(unsafe_code)]

//! WASM frontend for boardpreview.
//!
//! Binds the host-agnostic coordinator to a real browser page:
//! - an `<iframe>` whose document is replaced on every render,
//! - `window.location.hash` as the address bar,
//! - `fetch` for board data,
//! - a window `message` listener carrying in-frame link clicks back to the
//!   coordinator.
//!
//! The message validation and console log plumbing are host-agnostic and
//! compile everywhere; only the `wasm-bindgen` surface is wasm-only.

pub mod console_log;
pub mod message;

#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::BoardPreview;

/// Native builds compile this crate as a stub so `cargo check --workspace` stays
/// green on non-wasm targets.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default)]
pub struct BoardPreview;

#[cfg(not(target_arch = "wasm32"))]
impl BoardPreview {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self
    }
}
