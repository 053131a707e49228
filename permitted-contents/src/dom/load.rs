//! Building a `Document` from its serialized tree form.
//!
//! A text node is a bare string; an element is an object with `name` and
//! optional `attrs`, `children`, `line` and `col`. The top level is either one
//! node or an array of nodes.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use super::{Document, DocumentError, NodeData, NodeId, NodeKind, SourcePosition};

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DomNode {
    Text(String),
    Element(ElementNode),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ElementNode {
    pub name: String,
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
    #[serde(default)]
    pub children: Vec<DomNode>,
    #[serde(default)]
    pub line: Option<usize>,
    #[serde(default)]
    pub col: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DomInput {
    Fragment(Vec<DomNode>),
    Single(DomNode),
}

impl DomInput {
    fn into_nodes(self) -> Vec<DomNode> {
        match self {
            DomInput::Fragment(nodes) => nodes,
            DomInput::Single(node) => vec![node],
        }
    }
}

impl Document {
    /// Build a document whose top-level nodes are `nodes`.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::TooManyNodes` if the tree does not fit the id space.
    pub fn from_nodes(nodes: &[DomNode]) -> Result<Self, DocumentError> {
        let mut doc = Document::empty();
        for node in nodes {
            doc.insert(NodeId::ROOT, node)?;
        }
        Ok(doc)
    }

    /// # Errors
    ///
    /// Returns an error if `value` is not a valid document tree.
    pub fn from_value(value: Value) -> Result<Self, DocumentError> {
        let input: DomInput = serde_json::from_value(value)?;
        Self::from_nodes(&input.into_nodes())
    }

    /// # Errors
    ///
    /// Returns an error if `content` is not valid JSON or not a document tree.
    pub fn from_json_str(content: &str) -> Result<Self, DocumentError> {
        let input: DomInput = serde_json::from_str(content)?;
        Self::from_nodes(&input.into_nodes())
    }

    /// # Errors
    ///
    /// Returns an error if `content` is not valid YAML or not a document tree.
    pub fn from_yaml_str(content: &str) -> Result<Self, DocumentError> {
        let input: DomInput =
            serde_saphyr::from_str(content).map_err(|e| DocumentError::Yaml(e.to_string()))?;
        Self::from_nodes(&input.into_nodes())
    }

    fn insert(&mut self, parent: NodeId, node: &DomNode) -> Result<(), DocumentError> {
        match node {
            DomNode::Text(text) => {
                self.push(
                    parent,
                    NodeData {
                        kind: NodeKind::Text,
                        name: "#text".to_owned(),
                        text: text.clone(),
                        attrs: Vec::new(),
                        parent: None,
                        children: Vec::new(),
                        position: None,
                    },
                )?;
            }
            DomNode::Element(element) => {
                let position = element
                    .line
                    .map(|line| SourcePosition {
                        line,
                        col: element.col.unwrap_or(1),
                    });
                let id = self.push(
                    parent,
                    NodeData {
                        kind: NodeKind::Element,
                        name: element.name.to_ascii_lowercase(),
                        text: String::new(),
                        attrs: element
                            .attrs
                            .iter()
                            .map(|(k, v)| (k.to_ascii_lowercase(), v.clone()))
                            .collect(),
                        parent: None,
                        children: Vec::new(),
                        position,
                    },
                )?;
                for child in &element.children {
                    self.insert(id, child)?;
                }
            }
        }
        Ok(())
    }
}
