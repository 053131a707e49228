//! Structural specification: per-tag content models and content categories.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use tracing::debug;

use crate::category::{CategoryResolver, ResolvedCategories};
use crate::config::UserContentRule;
use crate::dom::{NodeRef, SelectorList};
use crate::error::ContentModelError;
use crate::model::ContentModel;
use crate::schema::{ConditionDocument, RepositoryDocument, RulesDocument};

/// Gate of a conditional content model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// The element carries the attribute (any value).
    AttributePresent(String),
    /// The element's parent is an element matching the selector.
    ParentMatches(SelectorList),
}

impl Condition {
    #[must_use]
    pub fn holds(&self, node: NodeRef<'_>) -> bool {
        match self {
            Condition::AttributePresent(name) => node.has_attribute(name),
            Condition::ParentMatches(selector) => node
                .parent_element()
                .is_some_and(|parent| parent.matches(selector)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionalVariant {
    pub condition: Condition,
    pub contents: ContentModel,
}

/// Content models of one tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSpec {
    pub contents: ContentModel,
    /// Evaluated in order; the first whose condition holds replaces `contents`.
    pub conditionals: Vec<ConditionalVariant>,
}

impl TagSpec {
    #[must_use]
    pub fn new(contents: ContentModel) -> Self {
        Self {
            contents,
            conditionals: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_conditional(mut self, condition: Condition, contents: ContentModel) -> Self {
        self.conditionals.push(ConditionalVariant {
            condition,
            contents,
        });
        self
    }

    fn models(&self) -> impl Iterator<Item = &ContentModel> {
        std::iter::once(&self.contents).chain(self.conditionals.iter().map(|c| &c.contents))
    }
}

/// Immutable lookup of tag specs and resolved categories.
///
/// Built once; every category reference has been checked, so compiling a
/// model from the repository can only fail on missing inheritance.
#[derive(Debug, Clone, Default)]
pub struct SpecRepository {
    specs: BTreeMap<String, TagSpec>,
    categories: ResolvedCategories,
}

impl SpecRepository {
    /// Build a repository, resolving `categories` and checking every model.
    ///
    /// # Errors
    ///
    /// Returns `ContentModelError::UnknownCategory` if a category, or a model,
    /// references a category missing from the table.
    pub fn new(
        specs: BTreeMap<String, TagSpec>,
        categories: &BTreeMap<String, Vec<String>>,
    ) -> Result<Self, ContentModelError> {
        let categories = CategoryResolver::new(categories).resolve_all()?;
        let specs: BTreeMap<String, TagSpec> = specs
            .into_iter()
            .map(|(tag, spec)| (tag.to_ascii_lowercase(), spec))
            .collect();
        let repo = Self { specs, categories };
        for spec in repo.specs.values() {
            for model in spec.models() {
                repo.check_model(model)?;
            }
        }
        debug!(
            specs = repo.specs.len(),
            categories = repo.categories.names().count(),
            "loaded spec repository"
        );
        Ok(repo)
    }

    /// # Errors
    ///
    /// Returns an error if a model is malformed or references an unknown category.
    pub fn from_document(document: &RepositoryDocument) -> Result<Self, ContentModelError> {
        let mut specs = BTreeMap::new();
        for entry in &document.specs {
            let mut spec = TagSpec::new(entry.contents.to_model()?);
            for conditional in &entry.conditional {
                let condition = match &conditional.condition {
                    ConditionDocument::HasAttr(name) => {
                        Condition::AttributePresent(name.to_ascii_lowercase())
                    }
                    ConditionDocument::Parent(selector) => {
                        Condition::ParentMatches(SelectorList::parse(selector)?)
                    }
                };
                spec = spec.with_conditional(condition, conditional.contents.to_model()?);
            }
            specs.insert(entry.tag.clone(), spec);
        }
        Self::new(specs, &document.categories)
    }

    /// # Errors
    ///
    /// Returns an error if `content` is not a valid repository document.
    pub fn from_json_str(content: &str) -> anyhow::Result<Self> {
        let document: RepositoryDocument =
            serde_json::from_str(content).context("Invalid spec repository JSON")?;
        Ok(Self::from_document(&document)?)
    }

    /// # Errors
    ///
    /// Returns an error if `value` is not a valid repository document.
    pub fn from_value(value: serde_json::Value) -> anyhow::Result<Self> {
        let document: RepositoryDocument =
            serde_json::from_value(value).context("Invalid spec repository")?;
        Ok(Self::from_document(&document)?)
    }

    #[must_use]
    pub fn tag_spec(&self, tag: &str) -> Option<&TagSpec> {
        self.specs.get(tag)
    }

    #[must_use]
    pub fn categories(&self) -> &ResolvedCategories {
        &self.categories
    }

    /// Verify every category `model` references is known.
    ///
    /// # Errors
    ///
    /// Returns `ContentModelError::UnknownCategory` for the first unknown name.
    pub fn check_model(&self, model: &ContentModel) -> Result<(), ContentModelError> {
        for name in model.referenced_categories() {
            self.categories.members(name)?;
        }
        Ok(())
    }
}

/// Load a spec repository from a JSON or YAML file (by extension).
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid repository.
pub fn load_spec_file(path: &Path) -> anyhow::Result<SpecRepository> {
    let document: RepositoryDocument = read_document(path)?;
    SpecRepository::from_document(&document)
        .with_context(|| format!("Invalid spec repository {}", path.display()))
}

/// Load user content rules from a JSON or YAML file (by extension).
///
/// # Errors
///
/// Returns an error if the file cannot be read or a rule is malformed.
pub fn load_rules_file(path: &Path) -> anyhow::Result<Vec<UserContentRule>> {
    let document: RulesDocument = read_document(path)?;
    document
        .rules
        .iter()
        .enumerate()
        .map(|(idx, rule)| {
            UserContentRule::from_document(rule)
                .with_context(|| format!("Invalid rule #{idx} in {}", path.display()))
        })
        .collect()
}

fn read_document<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml" | "yml") => serde_saphyr::from_str(&content)
            .map_err(|e| anyhow::anyhow!("{}: YAML parse error: {e}", path.display())),
        _ => serde_json::from_str(&content)
            .with_context(|| format!("{}: JSON parse error", path.display())),
    }
}
