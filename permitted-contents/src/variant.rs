//! Selection of the content model that applies to an element.

use crate::config::UserContentRule;
use crate::dom::NodeRef;
use crate::model::ContentModel;
use crate::repository::TagSpec;

/// The spec-derived content model chosen for an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveModel<'s> {
    /// The conditional variant at `index` in declaration order.
    Conditional {
        index: usize,
        contents: &'s ContentModel,
    },
    Default(&'s ContentModel),
}

impl<'s> ActiveModel<'s> {
    #[must_use]
    pub fn contents(self) -> &'s ContentModel {
        match self {
            ActiveModel::Conditional { contents, .. } | ActiveModel::Default(contents) => contents,
        }
    }
}

/// The first conditional whose condition holds, else the default contents.
#[must_use]
pub fn select_content_model<'s>(node: NodeRef<'_>, spec: &'s TagSpec) -> ActiveModel<'s> {
    spec.conditionals
        .iter()
        .enumerate()
        .find(|(_, variant)| variant.condition.holds(node))
        .map_or(ActiveModel::Default(&spec.contents), |(index, variant)| {
            ActiveModel::Conditional {
                index,
                contents: &variant.contents,
            }
        })
}

/// User rules for `node`'s tag, with their indices.
pub fn matching_user_rules<'r>(
    node: NodeRef<'_>,
    rules: &'r [UserContentRule],
) -> impl Iterator<Item = (usize, &'r UserContentRule)> {
    let tag = node.node_name();
    rules
        .iter()
        .enumerate()
        .filter(move |(_, rule)| rule.applies_to(tag))
}
