// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Capture Tree
//!
//! Parser-neutral view of a parsed capture. Markup is parsed with `scraper`
//! (html5ever) and flattened into an arena of typed nodes that keeps
//! parent/child links, document order and per-element attributes. Each
//! node's `data` holds what the location rules match against:
//! - element: tag name
//! - doctype: doctype name
//! - text / comment: content
//! - document root: empty
//!
//! Conversion walks the parser's tree iteratively, so adversarially deep
//! markup cannot exhaust the stack.

use scraper::{Html, Node};
use std::collections::HashMap;
use tracing::debug;

use crate::config::ClassifierConfig;
use crate::errors::ParseError;

pub type NodeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    Doctype,
    Element,
    Text,
    Comment,
    /// Processing instructions and anything else the parser emits
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomNode {
    pub kind: NodeKind,
    pub data: String,
    pub attrs: Vec<(String, String)>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureTree {
    nodes: Vec<DomNode>,
}

impl CaptureTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// First node pushed is the root
    pub fn root(&self) -> Option<NodeId> {
        if self.nodes.is_empty() {
            None
        } else {
            Some(0)
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&DomNode> {
        self.nodes.get(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Append a node as the last child of `parent`. Returns `None`, leaving
    /// the tree untouched, if `parent` does not name an existing node.
    pub fn push(
        &mut self,
        parent: Option<NodeId>,
        kind: NodeKind,
        data: impl Into<String>,
        attrs: Vec<(String, String)>,
    ) -> Option<NodeId> {
        if parent.is_some_and(|p| p >= self.nodes.len()) {
            return None;
        }

        let id = self.nodes.len();
        self.nodes.push(DomNode {
            kind,
            data: data.into(),
            attrs,
            parent,
            children: Vec::new(),
        });
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(p)) {
            parent.children.push(id);
        }
        Some(id)
    }

    /// Name of the node's parent. A root behaves as if its parent had an empty name.
    pub fn parent_name(&self, id: NodeId) -> &str {
        self.nodes
            .get(id)
            .and_then(|node| node.parent)
            .and_then(|p| self.nodes.get(p))
            .map(|parent| parent.data.as_str())
            .unwrap_or("")
    }
}

/// Resource limits applied before and during conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseLimits {
    pub max_capture_bytes: usize,
    pub max_nodes: usize,
}

impl From<&ClassifierConfig> for ParseLimits {
    fn from(config: &ClassifierConfig) -> Self {
        Self {
            max_capture_bytes: config.max_capture_bytes,
            max_nodes: config.max_nodes,
        }
    }
}

impl Default for ParseLimits {
    fn default() -> Self {
        Self::from(&ClassifierConfig::default())
    }
}

/// Parse a markup capture into a `CaptureTree`
pub fn parse_markup(text: &str, limits: &ParseLimits) -> Result<CaptureTree, ParseError> {
    if text.len() > limits.max_capture_bytes {
        return Err(ParseError::CaptureTooLarge {
            size: text.len(),
            max_size: limits.max_capture_bytes,
        });
    }

    let html = Html::parse_document(text);
    let mut tree = CaptureTree::new();
    let mut index = HashMap::new();

    // descendants() is pre-order, so a parent is always indexed before its children
    for node in html.tree.root().descendants() {
        if tree.len() >= limits.max_nodes {
            return Err(ParseError::TooManyNodes {
                max_nodes: limits.max_nodes,
            });
        }

        let parent = node.parent().and_then(|p| index.get(&p.id()).copied());
        let (kind, data, attrs) = match node.value() {
            Node::Document | Node::Fragment => (NodeKind::Document, String::new(), Vec::new()),
            Node::Doctype(doctype) => (NodeKind::Doctype, doctype.name().to_string(), Vec::new()),
            Node::Element(element) => (
                NodeKind::Element,
                element.name().to_string(),
                element
                    .attrs()
                    .map(|(key, value)| (key.to_string(), value.to_string()))
                    .collect(),
            ),
            Node::Text(text) => (NodeKind::Text, text.text.to_string(), Vec::new()),
            Node::Comment(comment) => (NodeKind::Comment, comment.comment.to_string(), Vec::new()),
            Node::ProcessingInstruction(pi) => (NodeKind::Other, pi.data.to_string(), Vec::new()),
        };

        // parents come from the index, so push cannot refuse them
        if let Some(id) = tree.push(parent, kind, data, attrs) {
            index.insert(node.id(), id);
        }
    }

    debug!("[Classifier] Parsed capture into {} nodes", tree.len());
    Ok(tree)
}
