//! Read-only document model.
//!
//! Nodes live in an arena and are addressed by `NodeId`; `NodeRef` is the
//! borrowed view the validator walks. Parent links are ids, so the tree has
//! no ownership cycles and a `Document` is freely shareable across threads.

mod load;
pub mod selector;

use serde::Serialize;
use thiserror::Error;

pub use load::{DomNode, ElementNode};
pub use selector::{SelectorError, SelectorList};

/// Compact node identifier (index into the document arena).
///
/// Ids are assigned in document (pre-)order, so sorting by id sorts by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// The synthetic document node every tree hangs from.
    pub const ROOT: NodeId = NodeId(0);

    fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Source position of an element start tag, when the producer supplied one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourcePosition {
    pub line: usize,
    pub col: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element,
    Text,
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    /// Lower-cased tag name for elements, `#text` / `#document` otherwise.
    name: String,
    text: String,
    attrs: Vec<(String, String)>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    position: Option<SourcePosition>,
}

/// Errors from building a document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("YAML parse error: {0}")]
    Yaml(String),
    #[error("Document exceeds the maximum of {max} nodes")]
    TooManyNodes { max: u32 },
}

/// An immutable element/text tree.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
}

impl Document {
    fn empty() -> Self {
        Self {
            nodes: vec![NodeData {
                kind: NodeKind::Document,
                name: "#document".to_owned(),
                text: String::new(),
                attrs: Vec::new(),
                parent: None,
                children: Vec::new(),
                position: None,
            }],
        }
    }

    fn push(&mut self, parent: NodeId, mut data: NodeData) -> Result<NodeId, DocumentError> {
        let id = u32::try_from(self.nodes.len())
            .map(NodeId)
            .map_err(|_| DocumentError::TooManyNodes { max: u32::MAX })?;
        data.parent = Some(parent);
        self.nodes.push(data);
        self.nodes[parent.index()].children.push(id);
        Ok(id)
    }

    /// The document node.
    #[must_use]
    pub fn root(&self) -> NodeRef<'_> {
        NodeRef {
            doc: self,
            id: NodeId::ROOT,
        }
    }

    /// Look up a node by id.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_>> {
        (id.index() < self.nodes.len()).then_some(NodeRef { doc: self, id })
    }

    /// All element nodes in document order.
    pub fn elements(&self) -> impl Iterator<Item = NodeRef<'_>> {
        self.root()
            .descendants()
            .filter(|n| n.kind() == NodeKind::Element)
    }

    /// Number of nodes, including the document node.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the document holds no nodes besides the document node.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }
}

/// Borrowed view of one node.
#[derive(Clone, Copy)]
pub struct NodeRef<'d> {
    doc: &'d Document,
    id: NodeId,
}

impl std::fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("name", &self.node_name())
            .finish_non_exhaustive()
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.doc, other.doc) && self.id == other.id
    }
}

impl Eq for NodeRef<'_> {}

impl<'d> NodeRef<'d> {
    #[must_use]
    pub fn id(self) -> NodeId {
        self.id
    }

    #[must_use]
    pub fn document(self) -> &'d Document {
        self.doc
    }

    #[must_use]
    pub fn kind(self) -> NodeKind {
        self.doc.data(self.id).kind
    }

    #[must_use]
    pub fn is_element(self) -> bool {
        self.kind() == NodeKind::Element
    }

    /// Lower-cased tag name for elements; `#text` for text, `#document` for the root.
    #[must_use]
    pub fn node_name(self) -> &'d str {
        &self.doc.data(self.id).name
    }

    /// Character data of a text node (empty for other kinds).
    #[must_use]
    pub fn text(self) -> &'d str {
        &self.doc.data(self.id).text
    }

    #[must_use]
    pub fn position(self) -> Option<SourcePosition> {
        self.doc.data(self.id).position
    }

    #[must_use]
    pub fn parent(self) -> Option<NodeRef<'d>> {
        self.doc.data(self.id).parent.map(|id| NodeRef { doc: self.doc, id })
    }

    /// The parent, if it is an element (not the document node).
    #[must_use]
    pub fn parent_element(self) -> Option<NodeRef<'d>> {
        self.parent().filter(|p| p.is_element())
    }

    /// Element ancestors, nearest first.
    pub fn ancestors(self) -> impl Iterator<Item = NodeRef<'d>> {
        std::iter::successors(self.parent_element(), |n| n.parent_element())
    }

    pub fn children(self) -> impl Iterator<Item = NodeRef<'d>> {
        let doc = self.doc;
        doc.data(self.id)
            .children
            .iter()
            .map(move |&id| NodeRef { doc, id })
    }

    /// All descendants in pre-order, excluding `self`.
    pub fn descendants(self) -> impl Iterator<Item = NodeRef<'d>> {
        let doc = self.doc;
        let mut stack: Vec<NodeId> = doc.data(self.id).children.iter().rev().copied().collect();
        std::iter::from_fn(move || {
            let id = stack.pop()?;
            stack.extend(doc.data(id).children.iter().rev().copied());
            Some(NodeRef { doc, id })
        })
    }

    /// Attribute presence; names compare ASCII case-insensitively.
    #[must_use]
    pub fn has_attribute(self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    #[must_use]
    pub fn attribute(self, name: &str) -> Option<&'d str> {
        self.doc
            .data(self.id)
            .attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn matches(self, selector: &SelectorList) -> bool {
        selector.matches(self)
    }
}
