//! Content models: the grammar of permitted child sequences.

use std::collections::BTreeSet;

use crate::dom::SelectorList;
use crate::error::ContentModelError;

/// Marker name for non-whitespace text in grammars and token streams.
pub const TEXT: &str = "#text";
/// Marker name for the transparent content model in author syntax.
pub const TRANSPARENT: &str = "#transparent";

/// A permitted-content grammar node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentModel {
    /// No constraint; any child sequence.
    Any,
    Tag(String),
    Category(String),
    Text,
    /// Items in order. Empty means no children are permitted.
    Sequence(Vec<ContentModel>),
    Choice(Vec<ContentModel>),
    Optional(Box<ContentModel>),
    Repeated {
        item: Box<ContentModel>,
        min: usize,
        max: Option<usize>,
    },
    /// The content of the nearest ancestor's resolved model.
    Transparent,
    /// Matches `scope`; no matched child nor any of its descendants may match
    /// a forbidden target. Build with [`ContentModel::forbidden_descendant`].
    ForbiddenDescendant {
        scope: Box<ContentModel>,
        forbidden: Vec<ForbiddenTarget>,
    },
}

/// What a forbidden-descendant constraint rejects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForbiddenTarget {
    Text,
    /// Unfolded to its member tags when compiled.
    Category(String),
    Selector(SelectorList),
}

impl ForbiddenTarget {
    /// Parse one author-syntax target: `#text`, `#category` or a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns `ContentModelError::Selector` if the selector is malformed.
    pub fn parse(raw: &str) -> Result<Self, ContentModelError> {
        let raw = raw.trim();
        if raw == TEXT {
            Ok(ForbiddenTarget::Text)
        } else if is_category_name(raw) {
            Ok(ForbiddenTarget::Category(raw.to_owned()))
        } else {
            Ok(ForbiddenTarget::Selector(SelectorList::parse(raw)?))
        }
    }
}

/// Category references are `#`-prefixed names other than the reserved markers.
#[must_use]
pub fn is_category_name(name: &str) -> bool {
    let Some(rest) = name.strip_prefix('#') else {
        return false;
    };
    !rest.is_empty()
        && rest.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        && name != TEXT
        && name != TRANSPARENT
}

impl ContentModel {
    /// Build a forbidden-descendant constraint.
    ///
    /// # Errors
    ///
    /// Returns `ContentModelError::EmptyForbiddenSet` if `forbidden` is empty.
    pub fn forbidden_descendant(
        scope: ContentModel,
        forbidden: Vec<ForbiddenTarget>,
    ) -> Result<Self, ContentModelError> {
        if forbidden.is_empty() {
            return Err(ContentModelError::EmptyForbiddenSet);
        }
        Ok(ContentModel::ForbiddenDescendant {
            scope: Box::new(scope),
            forbidden,
        })
    }

    /// Build a bounded or unbounded repetition.
    ///
    /// # Errors
    ///
    /// Returns `ContentModelError::InvalidRepetition` if `min > max`.
    pub fn repeated(
        item: ContentModel,
        min: usize,
        max: Option<usize>,
    ) -> Result<Self, ContentModelError> {
        if let Some(max) = max
            && min > max
        {
            return Err(ContentModelError::InvalidRepetition { min, max });
        }
        Ok(ContentModel::Repeated {
            item: Box::new(item),
            min,
            max,
        })
    }

    /// Whether resolving this model needs the parent's pattern.
    #[must_use]
    pub fn contains_transparent(&self) -> bool {
        match self {
            ContentModel::Transparent => true,
            ContentModel::Sequence(items) | ContentModel::Choice(items) => {
                items.iter().any(ContentModel::contains_transparent)
            }
            ContentModel::Optional(item) | ContentModel::Repeated { item, .. } => {
                item.contains_transparent()
            }
            ContentModel::ForbiddenDescendant { scope, .. } => scope.contains_transparent(),
            ContentModel::Any
            | ContentModel::Tag(_)
            | ContentModel::Category(_)
            | ContentModel::Text => false,
        }
    }

    /// Every category this model references, including forbidden targets.
    #[must_use]
    pub fn referenced_categories(&self) -> BTreeSet<&str> {
        let mut out = BTreeSet::new();
        self.collect_categories(&mut out);
        out
    }

    fn collect_categories<'a>(&'a self, out: &mut BTreeSet<&'a str>) {
        match self {
            ContentModel::Category(name) => {
                out.insert(name.as_str());
            }
            ContentModel::Sequence(items) | ContentModel::Choice(items) => {
                for item in items {
                    item.collect_categories(out);
                }
            }
            ContentModel::Optional(item) | ContentModel::Repeated { item, .. } => {
                item.collect_categories(out);
            }
            ContentModel::ForbiddenDescendant { scope, forbidden } => {
                scope.collect_categories(out);
                for target in forbidden {
                    if let ForbiddenTarget::Category(name) = target {
                        out.insert(name.as_str());
                    }
                }
            }
            ContentModel::Any
            | ContentModel::Tag(_)
            | ContentModel::Text
            | ContentModel::Transparent => {}
        }
    }

    /// Leaf names the model can start from, used to describe constraint scopes.
    #[must_use]
    pub fn scope_names(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_names(&mut out);
        let mut seen = BTreeSet::new();
        out.retain(|name| seen.insert(name.clone()));
        out
    }

    fn collect_names(&self, out: &mut Vec<String>) {
        match self {
            ContentModel::Any => out.push("*".to_owned()),
            ContentModel::Tag(name) | ContentModel::Category(name) => out.push(name.clone()),
            ContentModel::Text => out.push(TEXT.to_owned()),
            ContentModel::Transparent => out.push(TRANSPARENT.to_owned()),
            ContentModel::Sequence(items) | ContentModel::Choice(items) => {
                for item in items {
                    item.collect_names(out);
                }
            }
            ContentModel::Optional(item)
            | ContentModel::Repeated { item, .. }
            | ContentModel::ForbiddenDescendant { scope: item, .. } => item.collect_names(out),
        }
    }
}
