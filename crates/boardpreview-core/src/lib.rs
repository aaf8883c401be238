#![forbid(unsafe_code)]

//! Core: route resolution, preview rendering, and address-fragment sync for
//! board previews.
//!
//! This crate is host-agnostic. It never touches a real document, network, or
//! address bar; hosts plug those in through [`preview::PreviewFrame`],
//! [`fragment::AddressBar`], and the [`coordinator::LoadTicket`] protocol.

pub mod board;
pub mod config;
pub mod coordinator;
pub mod fragment;
pub mod hook;
pub mod link;
pub mod path;
pub mod preview;
pub mod route;

pub use board::{BoardData, BoardId, LoadError, LoadErrorKind};
pub use config::{ConfigError, PreviewConfig, StaleLoadPolicy};
pub use coordinator::{LoadOutcome, LoadPhase, LoadTicket, NavigationCoordinator};
pub use fragment::{AddressBar, InitialLocation};
pub use hook::{NavigationChannel, NavigationRequest, NavigationSender};
pub use path::{RoutePath, normalize};
pub use preview::{PreviewFrame, render_preview};
pub use route::{RenderContext, Route, RouteProvider, RouteTable, resolve};
