#![forbid(unsafe_code)]

//! Routes and route resolution.
//!
//! A [`Route`] pairs a path with a renderer that produces a complete HTML
//! document. Routes come from a [`RouteProvider`] and belong to exactly one
//! board; the coordinator replaces the whole [`RouteTable`] when a new board
//! loads.
//!
//! # Resolution
//!
//! [`resolve`] normalizes the requested path and scans routes in order,
//! returning the first whose normalized path matches. Boards have few pages,
//! so a linear scan keeps resolution order-stable with duplicate paths (the
//! earliest route wins).

use std::fmt;
use std::rc::Rc;

use crate::board::{BoardData, BoardId, LoadError};
use crate::path::{RoutePath, normalize};

/// Context handed to a route renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderContext {
    pub board_id: BoardId,
    pub path: RoutePath,
}

type Renderer = Rc<dyn Fn(&RenderContext) -> String>;

/// One navigable page of a board.
#[derive(Clone)]
pub struct Route {
    path: String,
    render: Renderer,
}

impl Route {
    pub fn new(path: impl Into<String>, render: impl Fn(&RenderContext) -> String + 'static) -> Self {
        Self {
            path: path.into(),
            render: Rc::new(render),
        }
    }

    /// A route whose renderer always returns the same markup.
    pub fn fixed(path: impl Into<String>, html: impl Into<String>) -> Self {
        let html = html.into();
        Self::new(path, move |_| html.clone())
    }

    /// The path as supplied by the provider (not normalized).
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Produce the HTML document for this route.
    #[must_use]
    pub fn render(&self, ctx: &RenderContext) -> String {
        (self.render)(ctx)
    }

    fn matches(&self, normalized: &str) -> bool {
        normalize(&self.path) == normalized
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Find the first route matching `requested` after normalization.
///
/// `None` is the not-found case; callers render an empty view for it.
#[must_use]
pub fn resolve<'a>(routes: &'a [Route], requested: &str) -> Option<&'a Route> {
    let wanted = normalize(requested);
    let found = routes.iter().find(|route| route.matches(&wanted));
    tracing::trace!(requested, found = found.is_some(), "resolve route");
    found
}

/// The routes of one loaded board.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    #[must_use]
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    #[must_use]
    pub fn resolve(&self, requested: &str) -> Option<&Route> {
        resolve(&self.routes, requested)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> + '_ {
        self.routes.iter().map(Route::path)
    }
}

impl From<Vec<Route>> for RouteTable {
    fn from(routes: Vec<Route>) -> Self {
        Self::new(routes)
    }
}

/// Converts board content into routes.
///
/// Implemented for plain closures so hosts and tests can pass a function.
pub trait RouteProvider {
    fn routes_for_data(&self, data: &BoardData) -> Result<Vec<Route>, LoadError>;
}

impl<F> RouteProvider for F
where
    F: Fn(&BoardData) -> Result<Vec<Route>, LoadError>,
{
    fn routes_for_data(&self, data: &BoardData) -> Result<Vec<Route>, LoadError> {
        self(data)
    }
}
