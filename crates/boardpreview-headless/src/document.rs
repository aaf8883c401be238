#![forbid(unsafe_code)]

//! A synthetic document: the parsed, clickable contents of a headless frame.
//!
//! # Lifecycle
//!
//! ```text
//!   open()            write(markup)*          close()
//!   ──────▶ Open ─────────────────▶ Open ─────────────▶ Loaded
//!   (discards the previous document, bumps the generation)
//! ```
//!
//! `close` tokenizes everything written since `open`, builds the node tree,
//! and then runs scripts in document order. The only script the synthetic
//! host understands is the interception script (identified by
//! [`INTERCEPT_MARKER`]); running it attaches a click listener to every
//! anchor that exists at that moment. Other scripts are inert.
//!
//! # Invariants
//!
//! 1. [`ElementHandle`]s remember the generation they came from; using one
//!    after the next `open` fails with [`DocumentError::StaleHandle`].
//! 2. Anchors added with [`SyntheticDocument::append_anchor`] after `close`
//!    never receive the listener.

use std::collections::HashSet;
use std::fmt;

use boardpreview_core::preview::INTERCEPT_MARKER;

use crate::html::{Attribute, Token, tokenize};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Reference to an element of one specific document generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle {
    generation: u64,
    node: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentError {
    /// `write` or `close` without a preceding `open`.
    NotOpen,
    /// The handle belongs to a document that has since been replaced.
    StaleHandle,
    /// Queries are not answered while a write transaction is in progress.
    Loading,
    /// No element matched a lookup.
    NoSuchElement,
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotOpen => f.write_str("document is not open for writing"),
            Self::StaleHandle => f.write_str("element belongs to a replaced document"),
            Self::Loading => f.write_str("document is still being written"),
            Self::NoSuchElement => f.write_str("no matching element"),
        }
    }
}

impl std::error::Error for DocumentError {}

#[derive(Debug, Clone)]
enum NodeKind {
    Element { tag: String, attrs: Vec<Attribute> },
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    children: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ReadyState {
    Open { buffer: String },
    Loaded,
}

/// Parsed document with click-listener bookkeeping.
#[derive(Debug, Clone)]
pub struct SyntheticDocument {
    generation: u64,
    state: ReadyState,
    source: String,
    nodes: Vec<Node>,
    roots: Vec<usize>,
    listeners: HashSet<usize>,
}

impl Default for SyntheticDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntheticDocument {
    /// An empty, loaded document (like a fresh `about:blank`).
    #[must_use]
    pub fn new() -> Self {
        Self {
            generation: 0,
            state: ReadyState::Loaded,
            source: String::new(),
            nodes: Vec::new(),
            roots: Vec::new(),
            listeners: HashSet::new(),
        }
    }

    /// Discard the current document and start a new write transaction.
    pub fn open(&mut self) {
        self.generation += 1;
        self.state = ReadyState::Open {
            buffer: String::new(),
        };
        self.source.clear();
        self.nodes.clear();
        self.roots.clear();
        self.listeners.clear();
    }

    pub fn write(&mut self, markup: &str) -> Result<(), DocumentError> {
        match &mut self.state {
            ReadyState::Open { buffer } => {
                buffer.push_str(markup);
                Ok(())
            }
            ReadyState::Loaded => Err(DocumentError::NotOpen),
        }
    }

    /// Finish the transaction: parse and run scripts.
    pub fn close(&mut self) -> Result<(), DocumentError> {
        let buffer = match std::mem::replace(&mut self.state, ReadyState::Loaded) {
            ReadyState::Open { buffer } => buffer,
            ReadyState::Loaded => return Err(DocumentError::NotOpen),
        };
        let scripts = self.build(&buffer);
        self.source = buffer;
        for script in scripts {
            self.run_script(script);
        }
        tracing::trace!(
            generation = self.generation,
            nodes = self.nodes.len(),
            listeners = self.listeners.len(),
            "document loaded"
        );
        Ok(())
    }

    /// Monotonic document counter, bumped by every `open`.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.state == ReadyState::Loaded
    }

    /// The markup written during the last completed transaction.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// All elements named `tag`, in document order.
    #[must_use]
    pub fn elements_by_tag(&self, tag: &str) -> Vec<ElementHandle> {
        if !self.is_loaded() {
            return Vec::new();
        }
        let tag = tag.to_ascii_lowercase();
        (0..self.nodes.len())
            .filter(|&idx| self.tag_of(idx) == Some(tag.as_str()))
            .map(|node| self.handle(node))
            .collect()
    }

    /// All `<a>` elements, in document order.
    #[must_use]
    pub fn anchors(&self) -> Vec<ElementHandle> {
        self.elements_by_tag("a")
    }

    /// First anchor whose `href` attribute equals `href`.
    #[must_use]
    pub fn find_anchor(&self, href: &str) -> Option<ElementHandle> {
        self.anchors()
            .into_iter()
            .find(|&anchor| self.attribute(anchor, "href").ok().flatten() == Some(href))
    }

    pub fn tag(&self, element: ElementHandle) -> Result<&str, DocumentError> {
        let node = self.check(element)?;
        self.tag_of(node).ok_or(DocumentError::StaleHandle)
    }

    pub fn attribute(
        &self,
        element: ElementHandle,
        name: &str,
    ) -> Result<Option<&str>, DocumentError> {
        let node = self.check(element)?;
        Ok(match &self.nodes[node].kind {
            NodeKind::Element { attrs, .. } => attrs
                .iter()
                .find(|attr| attr.name.eq_ignore_ascii_case(name))
                .map(|attr| attr.value.as_str()),
            NodeKind::Text(_) => None,
        })
    }

    /// Concatenated text of `element` and its descendants.
    pub fn text_content(&self, element: ElementHandle) -> Result<String, DocumentError> {
        let node = self.check(element)?;
        let mut out = String::new();
        self.collect_text(node, &mut out);
        Ok(out)
    }

    /// Text of the whole document, scripts and styles excluded.
    #[must_use]
    pub fn body_text(&self) -> String {
        let mut out = String::new();
        for &root in &self.roots {
            self.collect_text(root, &mut out);
        }
        out
    }

    /// Whether the interception listener is attached to `element`.
    pub fn has_click_listener(&self, element: ElementHandle) -> Result<bool, DocumentError> {
        let node = self.check(element)?;
        Ok(self.listeners.contains(&node))
    }

    /// Insert an anchor after load, as page script would. It gets no
    /// listener.
    pub fn append_anchor(&mut self, href: &str, text: &str) -> Result<ElementHandle, DocumentError> {
        if !self.is_loaded() {
            return Err(DocumentError::Loading);
        }
        let text_node = self.push(NodeKind::Text(text.to_owned()));
        let anchor = self.push(NodeKind::Element {
            tag: "a".to_owned(),
            attrs: vec![Attribute {
                name: "href".to_owned(),
                value: href.to_owned(),
            }],
        });
        self.nodes[anchor].children.push(text_node);
        self.roots.push(anchor);
        Ok(self.handle(anchor))
    }

    fn handle(&self, node: usize) -> ElementHandle {
        ElementHandle {
            generation: self.generation,
            node,
        }
    }

    fn check(&self, element: ElementHandle) -> Result<usize, DocumentError> {
        if element.generation != self.generation || element.node >= self.nodes.len() {
            return Err(DocumentError::StaleHandle);
        }
        if !self.is_loaded() {
            return Err(DocumentError::Loading);
        }
        Ok(element.node)
    }

    fn tag_of(&self, node: usize) -> Option<&str> {
        match &self.nodes[node].kind {
            NodeKind::Element { tag, .. } => Some(tag),
            NodeKind::Text(_) => None,
        }
    }

    fn push(&mut self, kind: NodeKind) -> usize {
        self.nodes.push(Node {
            kind,
            children: Vec::new(),
        });
        self.nodes.len() - 1
    }

    fn attach(&mut self, parent: Option<usize>, child: usize) {
        match parent {
            Some(parent) => self.nodes[parent].children.push(child),
            None => self.roots.push(child),
        }
    }

    /// Build the node tree from `markup`; returns script element ids in
    /// document order.
    fn build(&mut self, markup: &str) -> Vec<usize> {
        let mut open: Vec<usize> = Vec::new();
        let mut scripts = Vec::new();
        for token in tokenize(markup) {
            match token {
                Token::StartTag {
                    name,
                    attrs,
                    self_closing,
                } => {
                    let is_void = self_closing || VOID_ELEMENTS.contains(&name.as_str());
                    let is_script = name == "script";
                    let node = self.push(NodeKind::Element { tag: name, attrs });
                    self.attach(open.last().copied(), node);
                    if is_script {
                        scripts.push(node);
                    }
                    if !is_void {
                        open.push(node);
                    }
                }
                Token::EndTag { name } => {
                    if let Some(depth) = open
                        .iter()
                        .rposition(|&node| self.tag_of(node) == Some(name.as_str()))
                    {
                        open.truncate(depth);
                    }
                }
                Token::Text(text) => {
                    let node = self.push(NodeKind::Text(text));
                    self.attach(open.last().copied(), node);
                }
                Token::Comment(_) | Token::Declaration(_) => {}
            }
        }
        scripts
    }

    fn run_script(&mut self, script: usize) {
        let is_interception = matches!(
            &self.nodes[script].kind,
            NodeKind::Element { attrs, .. }
                if attrs.iter().any(|attr| attr.name == INTERCEPT_MARKER)
        );
        if !is_interception {
            return;
        }
        // Elements are numbered in parse order, so anchors before the script
        // are exactly the ones that existed when it ran.
        let present: Vec<usize> = (0..script)
            .filter(|&node| self.tag_of(node) == Some("a"))
            .collect();
        self.listeners.extend(present);
    }

    fn collect_text(&self, node: usize, out: &mut String) {
        match &self.nodes[node].kind {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Element { tag, .. } if tag == "script" || tag == "style" => {}
            NodeKind::Element { .. } => {
                for &child in &self.nodes[node].children {
                    self.collect_text(child, out);
                }
            }
        }
    }
}
