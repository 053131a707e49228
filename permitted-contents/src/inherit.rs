//! Per-run resolution of transparent content models.
//!
//! A transparent model takes on the content model of the nearest ancestor,
//! which may itself be transparent. `ResolutionContext` compiles those chains
//! top-down and memoizes each element's pattern for the rest of the run.

use std::collections::HashMap;

use tracing::trace;

use crate::dom::{NodeId, NodeRef};
use crate::error::ContentModelError;
use crate::grammar::{CompiledPattern, Compiler};
use crate::model::ContentModel;
use crate::repository::{SpecRepository, TagSpec};
use crate::variant::select_content_model;

static ANY: ContentModel = ContentModel::Any;

/// Mutable state of one validation run. Not shared between threads: each
/// worker owns its own context.
#[derive(Debug)]
pub struct ResolutionContext<'a> {
    repo: &'a SpecRepository,
    compiler: Compiler<'a>,
    memo: HashMap<NodeId, CompiledPattern>,
}

impl<'a> ResolutionContext<'a> {
    #[must_use]
    pub fn new(repo: &'a SpecRepository) -> Self {
        Self {
            repo,
            compiler: Compiler::new(repo.categories()),
            memo: HashMap::new(),
        }
    }

    #[must_use]
    pub fn spec_for(&self, node: NodeRef<'_>) -> Option<&'a TagSpec> {
        self.repo.tag_spec(node.node_name())
    }

    /// The spec model active for `node`; elements without a spec accept anything.
    #[must_use]
    pub fn spec_model(&self, node: NodeRef<'_>) -> &'a ContentModel {
        self.spec_for(node)
            .map_or(&ANY, |spec| select_content_model(node, spec).contents())
    }

    /// Compiled pattern of `node`'s active spec model.
    ///
    /// # Errors
    ///
    /// Returns `ContentModelError::MissingInheritance` if the model, or the
    /// model of an ancestor it inherits from, is transparent with no element
    /// above it.
    pub fn pattern_for(&mut self, node: NodeRef<'_>) -> Result<CompiledPattern, ContentModelError> {
        if let Some(pattern) = self.memo.get(&node.id()) {
            return Ok(pattern.clone());
        }

        // Walk up while models are transparent, then compile back down.
        let mut chain: Vec<(NodeId, &'a ContentModel)> = Vec::new();
        let mut inherited: Option<CompiledPattern> = None;
        let mut current = Some(node);
        while let Some(n) = current {
            if let Some(pattern) = self.memo.get(&n.id()) {
                inherited = Some(pattern.clone());
                break;
            }
            let model = self.spec_model(n);
            chain.push((n.id(), model));
            if !model.contains_transparent() {
                break;
            }
            current = n.parent_element();
        }

        for (id, model) in chain.into_iter().rev() {
            let pattern = self.compiler.compile(model, inherited.as_ref())?;
            trace!(node = %id, pattern = %pattern, "resolved element pattern");
            self.memo.insert(id, pattern.clone());
            inherited = Some(pattern);
        }
        inherited.ok_or(ContentModelError::MissingInheritance)
    }

    /// Compile `model` as if it applied to `node`, inheriting from `node`'s parent.
    ///
    /// # Errors
    ///
    /// See [`ResolutionContext::pattern_for`].
    pub fn compile_for(
        &mut self,
        node: NodeRef<'_>,
        model: &ContentModel,
    ) -> Result<CompiledPattern, ContentModelError> {
        let inherited = if model.contains_transparent()
            && let Some(parent) = node.parent_element()
        {
            Some(self.pattern_for(parent)?)
        } else {
            None
        };
        self.compiler.compile(model, inherited.as_ref())
    }

    /// Patterns memoized so far.
    #[must_use]
    pub fn memoized(&self) -> usize {
        self.memo.len()
    }
}
