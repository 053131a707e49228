//! Child-sequence normalization.
//!
//! Reduces an element's children to the token stream content models are
//! matched against: elements and non-whitespace text, in order.

use crate::dom::{NodeKind, NodeRef};
use crate::grammar::Token;

/// HTML inter-element whitespace: space, tab, LF, FF, CR.
fn is_html_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\x0C' | '\r')
}

/// Whether `node` takes part in its parent's content model.
#[must_use]
pub fn is_relevant(node: NodeRef<'_>) -> bool {
    match node.kind() {
        NodeKind::Element => true,
        NodeKind::Text => !node.text().chars().all(is_html_whitespace),
        NodeKind::Document => false,
    }
}

/// Children of `node` that take part in its content model.
#[must_use]
pub fn relevant_children(node: NodeRef<'_>) -> Vec<NodeRef<'_>> {
    node.children().filter(|child| is_relevant(*child)).collect()
}

/// One token per node: the tag name for elements, the text marker otherwise.
///
/// Whitespace-only text is dropped, so normalizing already relevant children
/// is the identity on their token stream.
#[must_use]
pub fn normalize(nodes: &[NodeRef<'_>]) -> Vec<Token> {
    nodes
        .iter()
        .filter(|node| is_relevant(**node))
        .map(|node| match node.kind() {
            NodeKind::Element => Token::Element(node.node_name().to_owned()),
            _ => Token::Text,
        })
        .collect()
}
