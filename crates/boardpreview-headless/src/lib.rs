#![forbid(unsafe_code)]

//! `boardpreview-headless` hosts the preview engine without a browser.
//!
//! Design goals:
//! - **Host-driven**: the caller decides when board loads complete and when
//!   clicks happen; nothing runs in the background.
//! - **Real parsing**: every render goes through an HTML tokenizer into a
//!   [`document::SyntheticDocument`] whose anchors can be clicked.
//! - **Same interception rule** as the browser script, via
//!   [`boardpreview_core::link::intercepted_path`].
//!
//! [`session::HeadlessSession`] wires everything together.

pub mod address_bar;
pub mod document;
pub mod frame;
pub mod html;
pub mod logging;
pub mod session;
pub mod source;
pub mod url;

pub use address_bar::MemoryAddressBar;
pub use document::{DocumentError, ElementHandle, SyntheticDocument};
pub use frame::{ClickOutcome, FrameError, HeadlessFrame};
pub use logging::init_tracing;
pub use session::HeadlessSession;
pub use source::{BoardSource, DirectoryBoardSource, MemoryBoardSource};
pub use url::{PageUrl, ResolvedLink, resolve_href};
