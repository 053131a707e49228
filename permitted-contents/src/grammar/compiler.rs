//! Content model compiler.
//!
//! Translates a [`ContentModel`] into a [`Pattern`] over child tokens. Shape
//! and forbidden-descendant constraints end up in one pattern: constraints
//! become labeled regions, so a single match yields both answers.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::trace;

use super::pattern::{CompiledPattern, Constraint, Forbidden, Pattern, SpanLabel, TokenClass};
use crate::category::ResolvedCategories;
use crate::error::ContentModelError;
use crate::model::{ContentModel, ForbiddenTarget, TEXT};

#[derive(Debug, Clone, Copy)]
pub struct Compiler<'r> {
    categories: &'r ResolvedCategories,
}

impl<'r> Compiler<'r> {
    #[must_use]
    pub fn new(categories: &'r ResolvedCategories) -> Self {
        Self { categories }
    }

    /// Compile `model`, using `inherited` wherever it is transparent.
    ///
    /// # Errors
    ///
    /// - `ContentModelError::MissingInheritance` if the model is transparent
    ///   and `inherited` is `None`.
    /// - `ContentModelError::UnknownCategory` if a category is not in the table.
    /// - `ContentModelError::EmptyChoice` for a choice without alternatives.
    pub fn compile(
        &self,
        model: &ContentModel,
        inherited: Option<&CompiledPattern>,
    ) -> Result<CompiledPattern, ContentModelError> {
        let pattern = CompiledPattern::new(self.compile_node(model, inherited)?);
        trace!(pattern = %pattern, "compiled content model");
        Ok(pattern)
    }

    fn compile_node(
        &self,
        model: &ContentModel,
        inherited: Option<&CompiledPattern>,
    ) -> Result<Pattern, ContentModelError> {
        let pattern = match model {
            ContentModel::Any => Pattern::Repeat {
                item: Box::new(Pattern::Token(TokenClass::Any)),
                min: 0,
                max: None,
            },
            ContentModel::Tag(name) => single(name.to_ascii_lowercase()),
            ContentModel::Text => single(TEXT.to_owned()),
            ContentModel::Category(name) => {
                Pattern::Token(TokenClass::OneOf(self.categories.members(name)?.clone()))
            }
            ContentModel::Sequence(items) => Pattern::Sequence(
                items
                    .iter()
                    .map(|item| self.compile_node(item, inherited))
                    .collect::<Result<_, _>>()?,
            ),
            ContentModel::Choice(alternatives) => {
                if alternatives.is_empty() {
                    return Err(ContentModelError::EmptyChoice);
                }
                Pattern::Choice(
                    alternatives
                        .iter()
                        .map(|alt| self.compile_node(alt, inherited))
                        .collect::<Result<_, _>>()?,
                )
            }
            ContentModel::Optional(item) => Pattern::Repeat {
                item: Box::new(self.compile_node(item, inherited)?),
                min: 0,
                max: Some(1),
            },
            ContentModel::Repeated { item, min, max } => Pattern::Repeat {
                item: Box::new(self.compile_node(item, inherited)?),
                min: *min,
                max: *max,
            },
            ContentModel::Transparent => {
                let parent = inherited.ok_or(ContentModelError::MissingInheritance)?;
                Pattern::Labeled {
                    label: SpanLabel::Transparent,
                    inner: parent.shared_root(),
                }
            }
            ContentModel::ForbiddenDescendant { scope, forbidden } => {
                let constraint = Constraint::ForbiddenDescendant {
                    scope: scope.scope_names(),
                    forbidden: self.unfold_forbidden(forbidden)?,
                    in_transparent: scope.contains_transparent(),
                };
                Pattern::Labeled {
                    label: SpanLabel::Constraint(Arc::new(constraint)),
                    inner: Arc::new(self.compile_node(scope, inherited)?),
                }
            }
        };
        Ok(pattern)
    }

    fn unfold_forbidden(
        &self,
        targets: &[ForbiddenTarget],
    ) -> Result<Vec<Forbidden>, ContentModelError> {
        let mut out = Vec::new();
        for target in targets {
            match target {
                ForbiddenTarget::Text => out.push(Forbidden::Text),
                ForbiddenTarget::Category(name) => {
                    for member in self.categories.members(name)? {
                        if member == TEXT {
                            out.push(Forbidden::Text);
                        } else {
                            out.push(Forbidden::Tag(member.clone()));
                        }
                    }
                }
                ForbiddenTarget::Selector(selector) => out.push(Forbidden::Selector(selector.clone())),
            }
        }
        if out.is_empty() {
            // Every target was an empty category.
            return Err(ContentModelError::EmptyForbiddenSet);
        }
        Ok(out)
    }
}

fn single(name: String) -> Pattern {
    Pattern::Token(TokenClass::OneOf(BTreeSet::from([name])))
}
