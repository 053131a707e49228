//! Forbidden-descendant interpretation of a successful match.
//!
//! The matcher only says which children each labeled region covered. This
//! module turns that into findings: for every constraint, the children whose
//! names fell inside its region are checked, together with everything below
//! them, against the constraint's forbidden targets.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::dom::{NodeKind, NodeRef};
use crate::grammar::{Constraint, Forbidden, LabeledSpan, SpanLabel, Token};

/// A child that violates a forbidden-descendant constraint.
#[derive(Debug, Clone)]
pub struct Offense<'d> {
    pub constraint: Arc<Constraint>,
    /// The direct child that is, or contains, the forbidden node.
    pub node: NodeRef<'d>,
    /// The node that matched a forbidden target (`node` itself or a descendant).
    pub culprit: NodeRef<'d>,
}

/// Check every constraint label of a match; at most one offense per constraint.
///
/// `tokens` and `children` are parallel: `tokens[i]` is the token of `children[i]`.
#[must_use]
pub fn find_offenses<'d>(
    spans: &[LabeledSpan],
    tokens: &[Token],
    children: &[NodeRef<'d>],
) -> Vec<Offense<'d>> {
    let transparent_names = span_names(
        spans
            .iter()
            .filter(|s| matches!(s.label, SpanLabel::Transparent)),
        tokens,
    );

    let mut seen: Vec<&Arc<Constraint>> = Vec::new();
    let mut offenses = Vec::new();
    for span in spans {
        let SpanLabel::Constraint(constraint) = &span.label else {
            continue;
        };
        if seen.iter().any(|c| Arc::ptr_eq(c, constraint)) {
            continue;
        }
        seen.push(constraint);

        let mut candidates = span_names(
            spans.iter().filter(|s| s.label.same_as(&span.label)),
            tokens,
        );
        let Constraint::ForbiddenDescendant {
            forbidden,
            in_transparent,
            ..
        } = constraint.as_ref();
        if *in_transparent {
            candidates.retain(|name| transparent_names.contains(name));
        }
        if candidates.is_empty() {
            continue;
        }

        let offense = children
            .iter()
            .filter(|child| candidates.contains(child.node_name()))
            .find_map(|child| offending_node(*child, forbidden).map(|culprit| (*child, culprit)));
        if let Some((node, culprit)) = offense {
            offenses.push(Offense {
                constraint: Arc::clone(constraint),
                node,
                culprit,
            });
        }
    }
    offenses
}

/// Distinct token names covered by `spans`.
fn span_names<'s>(
    spans: impl Iterator<Item = &'s LabeledSpan>,
    tokens: &[Token],
) -> BTreeSet<String> {
    spans
        .flat_map(|s| tokens.get(s.span.clone()).unwrap_or_default())
        .map(|t| t.name().to_owned())
        .collect()
}

/// The first node, `child` itself or a descendant, matching a forbidden target.
fn offending_node<'d>(child: NodeRef<'d>, forbidden: &[Forbidden]) -> Option<NodeRef<'d>> {
    match child.kind() {
        NodeKind::Text => forbidden
            .iter()
            .any(|f| matches!(f, Forbidden::Text))
            .then_some(child),
        NodeKind::Element => std::iter::once(child)
            .chain(child.descendants().filter(|n| n.is_element()))
            .find(|n| forbidden.iter().any(|f| element_matches(*n, f))),
        NodeKind::Document => None,
    }
}

fn element_matches(node: NodeRef<'_>, target: &Forbidden) -> bool {
    match target {
        Forbidden::Text => false,
        Forbidden::Tag(tag) => node.node_name() == tag,
        Forbidden::Selector(selector) => node.matches(selector),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Document, SelectorList};
    use crate::normalize::{normalize, relevant_children};

    fn constraint(forbidden: Vec<Forbidden>, in_transparent: bool) -> Arc<Constraint> {
        Arc::new(Constraint::ForbiddenDescendant {
            scope: vec!["#flow".to_owned()],
            forbidden,
            in_transparent,
        })
    }

    fn span(label: SpanLabel, range: std::ops::Range<usize>) -> LabeledSpan {
        LabeledSpan { label, span: range }
    }

    fn children(doc: &Document) -> (Vec<NodeRef<'_>>, Vec<Token>) {
        let parent = doc.elements().next().unwrap();
        let children = relevant_children(parent);
        let tokens = normalize(&children);
        (children, tokens)
    }

    #[test]
    fn test_deep_descendant_reported_on_child() {
        let doc = Document::from_value(serde_json::json!({
            "name": "button",
            "children": [{"name": "span", "children": [{"name": "span", "children": [{"name": "a"}]}]}]
        }))
        .unwrap();
        let (kids, tokens) = children(&doc);
        let c = constraint(vec![Forbidden::Tag("a".to_owned())], false);
        let offenses = find_offenses(&[span(SpanLabel::Constraint(c), 0..1)], &tokens, &kids);
        assert_eq!(offenses.len(), 1);
        assert_eq!(offenses[0].node.node_name(), "span");
        assert_eq!(offenses[0].culprit.node_name(), "a");
    }

    #[test]
    fn test_child_outside_candidates_ignored() {
        let doc = Document::from_value(serde_json::json!({
            "name": "div",
            "children": [{"name": "p"}, {"name": "a"}]
        }))
        .unwrap();
        let (kids, tokens) = children(&doc);
        let c = constraint(vec![Forbidden::Tag("a".to_owned())], false);
        // Region covers only the <p>.
        let offenses = find_offenses(&[span(SpanLabel::Constraint(c), 0..1)], &tokens, &kids);
        assert!(offenses.is_empty());
    }

    #[test]
    fn test_transparent_restriction() {
        let doc = Document::from_value(serde_json::json!({
            "name": "a",
            "children": [{"name": "div", "children": [{"name": "button"}]}]
        }))
        .unwrap();
        let (kids, tokens) = children(&doc);
        let forbidden = vec![Forbidden::Selector(SelectorList::parse("button").unwrap())];

        let c = constraint(forbidden.clone(), true);
        let without = find_offenses(&[span(SpanLabel::Constraint(c), 0..1)], &tokens, &kids);
        assert!(without.is_empty(), "no transparent span: vacuous pass");

        let c = constraint(forbidden, true);
        let with = find_offenses(
            &[
                span(SpanLabel::Transparent, 0..1),
                span(SpanLabel::Constraint(c), 0..1),
            ],
            &tokens,
            &kids,
        );
        assert_eq!(with.len(), 1);
        assert_eq!(with[0].culprit.node_name(), "button");
    }

    #[test]
    fn test_text_only_offends_when_forbidden() {
        let doc = Document::from_value(serde_json::json!({"name": "p", "children": ["words"]})).unwrap();
        let (kids, tokens) = children(&doc);

        let tags = constraint(vec![Forbidden::Tag("a".to_owned())], false);
        assert!(find_offenses(&[span(SpanLabel::Constraint(tags), 0..1)], &tokens, &kids).is_empty());

        let text = constraint(vec![Forbidden::Text], false);
        let offenses = find_offenses(&[span(SpanLabel::Constraint(text), 0..1)], &tokens, &kids);
        assert_eq!(offenses.len(), 1);
        assert_eq!(offenses[0].node.node_name(), "#text");
    }

    #[test]
    fn test_one_offense_per_constraint() {
        let doc = Document::from_value(serde_json::json!({
            "name": "div",
            "children": [{"name": "a"}, {"name": "a"}, {"name": "main"}]
        }))
        .unwrap();
        let (kids, tokens) = children(&doc);
        let no_links = constraint(vec![Forbidden::Tag("a".to_owned())], false);
        let no_main = constraint(vec![Forbidden::Tag("main".to_owned())], false);
        let spans = vec![
            span(SpanLabel::Constraint(Arc::clone(&no_links)), 0..1),
            span(SpanLabel::Constraint(no_links), 1..2),
            span(SpanLabel::Constraint(no_main), 0..3),
        ];
        let offenses = find_offenses(&spans, &tokens, &kids);
        assert_eq!(offenses.len(), 2);
        assert_eq!(offenses[0].node.id(), kids[0].id());
        assert_eq!(offenses[1].node.node_name(), "main");
    }
}
