//! Author syntax for content models, spec repositories and user rules.
//!
//! ```json
//! {
//!   "categories": { "#phrasing": ["span", "em", "#text"] },
//!   "specs": [
//!     { "tag": "p", "contents": [{ "zeroOrMore": "#phrasing" }] },
//!     {
//!       "tag": "a",
//!       "contents": [{ "zeroOrMore": "#phrasing" }],
//!       "conditional": [
//!         { "condition": { "hasAttr": "href" }, "contents": [{ "zeroOrMore": "#transparent" }] }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! `contents: true` accepts anything, `contents: false` accepts no children.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::ContentModelError;
use crate::model::{ContentModel, ForbiddenTarget, TEXT, TRANSPARENT, is_category_name};

/// A content model as written: `true`, `false` or a list of items.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Contents {
    Any(bool),
    Items(Vec<PermittedContent>),
}

/// One name or a list of alternative names.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Target {
    One(String),
    Many(Vec<String>),
}

/// What a repetition repeats: names, or a nested item sequence.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RepeatTarget {
    Target(Target),
    Items(Vec<PermittedContent>),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PermittedContent {
    Require(Require),
    Optional(Optional),
    OneOrMore(OneOrMore),
    ZeroOrMore(ZeroOrMore),
    Choice(Choice),
}

/// Exactly `min` (default 1) up to `max` (default `min`) occurrences.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Require {
    pub require: Target,
    pub min: Option<usize>,
    pub max: Option<usize>,
    pub ignore: Option<Target>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Optional {
    pub optional: Target,
    pub ignore: Option<Target>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OneOrMore {
    #[serde(rename = "oneOrMore")]
    pub one_or_more: RepeatTarget,
    pub max: Option<usize>,
    pub ignore: Option<Target>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ZeroOrMore {
    #[serde(rename = "zeroOrMore")]
    pub zero_or_more: RepeatTarget,
    pub max: Option<usize>,
    pub ignore: Option<Target>,
}

/// Exactly one of several item sequences.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Choice {
    pub choice: Vec<Vec<PermittedContent>>,
}

/// Spec repository file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepositoryDocument {
    #[serde(default)]
    pub categories: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub specs: Vec<TagSpecDocument>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TagSpecDocument {
    pub tag: String,
    pub contents: Contents,
    #[serde(default)]
    pub conditional: Vec<ConditionalDocument>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConditionalDocument {
    pub condition: ConditionDocument,
    pub contents: Contents,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConditionDocument {
    HasAttr(String),
    /// CSS selector the parent element must match.
    Parent(String),
}

/// User rules file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RulesDocument {
    #[serde(default)]
    pub rules: Vec<RuleDocument>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleDocument {
    pub tag: String,
    pub contents: Contents,
}

impl Contents {
    /// # Errors
    ///
    /// Returns an error for malformed selectors, empty choices or
    /// inverted repetition bounds.
    pub fn to_model(&self) -> Result<ContentModel, ContentModelError> {
        match self {
            Contents::Any(true) => Ok(ContentModel::Any),
            Contents::Any(false) => Ok(ContentModel::Sequence(Vec::new())),
            Contents::Items(items) => items_model(items),
        }
    }
}

fn items_model(items: &[PermittedContent]) -> Result<ContentModel, ContentModelError> {
    let mut models = items
        .iter()
        .map(PermittedContent::to_model)
        .collect::<Result<Vec<_>, _>>()?;
    if models.len() == 1 {
        return Ok(models.remove(0));
    }
    Ok(ContentModel::Sequence(models))
}

impl PermittedContent {
    /// # Errors
    ///
    /// See [`Contents::to_model`].
    pub fn to_model(&self) -> Result<ContentModel, ContentModelError> {
        let (model, ignore) = match self {
            PermittedContent::Require(item) => {
                let min = item.min.unwrap_or(1);
                let max = item.max.unwrap_or(min);
                let target = item.require.to_model()?;
                let model = if (min, max) == (1, 1) {
                    target
                } else {
                    ContentModel::repeated(target, min, Some(max))?
                };
                (model, &item.ignore)
            }
            PermittedContent::Optional(item) => (
                ContentModel::Optional(Box::new(item.optional.to_model()?)),
                &item.ignore,
            ),
            PermittedContent::OneOrMore(item) => (
                ContentModel::repeated(item.one_or_more.to_model()?, 1, item.max)?,
                &item.ignore,
            ),
            PermittedContent::ZeroOrMore(item) => (
                ContentModel::repeated(item.zero_or_more.to_model()?, 0, item.max)?,
                &item.ignore,
            ),
            PermittedContent::Choice(item) => {
                if item.choice.is_empty() {
                    return Err(ContentModelError::EmptyChoice);
                }
                let alternatives = item
                    .choice
                    .iter()
                    .map(|alt| items_model(alt))
                    .collect::<Result<_, _>>()?;
                return Ok(ContentModel::Choice(alternatives));
            }
        };
        match ignore {
            None => Ok(model),
            Some(targets) => {
                let forbidden = targets
                    .names()
                    .iter()
                    .map(|raw| ForbiddenTarget::parse(raw))
                    .collect::<Result<Vec<_>, _>>()?;
                ContentModel::forbidden_descendant(model, forbidden)
            }
        }
    }
}

impl Target {
    #[must_use]
    pub fn names(&self) -> &[String] {
        match self {
            Target::One(name) => std::slice::from_ref(name),
            Target::Many(names) => names,
        }
    }

    /// A single name, or a choice between the listed names.
    ///
    /// # Errors
    ///
    /// Returns `ContentModelError::EmptyChoice` for an empty list.
    pub fn to_model(&self) -> Result<ContentModel, ContentModelError> {
        match self.names() {
            [] => Err(ContentModelError::EmptyChoice),
            [name] => Ok(name_model(name)),
            names => Ok(ContentModel::Choice(
                names.iter().map(|n| name_model(n)).collect(),
            )),
        }
    }
}

impl RepeatTarget {
    /// # Errors
    ///
    /// See [`Contents::to_model`].
    pub fn to_model(&self) -> Result<ContentModel, ContentModelError> {
        match self {
            RepeatTarget::Target(target) => target.to_model(),
            RepeatTarget::Items(items) => items_model(items),
        }
    }
}

fn name_model(name: &str) -> ContentModel {
    let name = name.trim();
    if name == TEXT {
        ContentModel::Text
    } else if name == TRANSPARENT {
        ContentModel::Transparent
    } else if is_category_name(name) {
        ContentModel::Category(name.to_owned())
    } else {
        ContentModel::Tag(name.to_ascii_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn model(value: serde_json::Value) -> Result<ContentModel, ContentModelError> {
        let contents: Contents = serde_json::from_value(value).unwrap();
        contents.to_model()
    }

    #[test]
    fn test_boolean_contents() {
        assert_eq!(model(json!(true)).unwrap(), ContentModel::Any);
        assert_eq!(model(json!(false)).unwrap(), ContentModel::Sequence(vec![]));
    }

    #[test]
    fn test_names() {
        let m = model(json!([{ "zeroOrMore": ["#phrasing", "#text", "BR"] }])).unwrap();
        assert_eq!(
            m,
            ContentModel::Repeated {
                item: Box::new(ContentModel::Choice(vec![
                    ContentModel::Category("#phrasing".to_owned()),
                    ContentModel::Text,
                    ContentModel::Tag("br".to_owned()),
                ])),
                min: 0,
                max: None,
            }
        );
    }

    #[test]
    fn test_require_and_optional_sequence() {
        let m = model(json!([
            { "optional": "caption" },
            { "require": "thead" },
            { "require": "tr", "min": 2, "max": 4 }
        ]))
        .unwrap();
        let ContentModel::Sequence(items) = m else {
            panic!("expected a sequence");
        };
        assert_eq!(items.len(), 3);
        assert_eq!(
            items[0],
            ContentModel::Optional(Box::new(ContentModel::Tag("caption".to_owned())))
        );
        assert_eq!(items[1], ContentModel::Tag("thead".to_owned()));
        assert!(matches!(
            items[2],
            ContentModel::Repeated { min: 2, max: Some(4), .. }
        ));
    }

    #[test]
    fn test_nested_repetition_and_choice() {
        let m = model(json!([{
            "oneOrMore": [
                { "require": "dt" },
                { "choice": [[{ "require": "dd" }], [{ "require": "div" }]] }
            ]
        }]))
        .unwrap();
        let ContentModel::Repeated { item, min: 1, max: None } = m else {
            panic!("expected one-or-more");
        };
        let ContentModel::Sequence(items) = *item else {
            panic!("expected a nested sequence");
        };
        assert!(matches!(&items[1], ContentModel::Choice(alts) if alts.len() == 2));
    }

    #[test]
    fn test_ignore_wraps_forbidden_descendant() {
        let m = model(json!([{ "zeroOrMore": "#transparent", "ignore": ["#interactive", "[tabindex]"] }]))
            .unwrap();
        let ContentModel::ForbiddenDescendant { scope, forbidden } = m else {
            panic!("expected forbidden-descendant");
        };
        assert!(scope.contains_transparent());
        assert_eq!(forbidden[0], ForbiddenTarget::Category("#interactive".to_owned()));
        assert!(matches!(forbidden[1], ForbiddenTarget::Selector(_)));
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(serde_json::from_value::<Contents>(json!([{ "bogus": "p" }])).is_err());
        assert!(serde_json::from_value::<Contents>(json!([{ "require": "p", "extra": 1 }])).is_err());
        assert_eq!(
            model(json!([{ "choice": [] }])).unwrap_err(),
            ContentModelError::EmptyChoice
        );
        assert!(matches!(
            model(json!([{ "require": "li", "min": 3, "max": 1 }])),
            Err(ContentModelError::InvalidRepetition { min: 3, max: 1 })
        ));
        assert!(matches!(
            model(json!([{ "require": "p", "ignore": "div >" }])),
            Err(ContentModelError::Selector(_))
        ));
    }

    #[test]
    fn test_repository_document() {
        let doc: RepositoryDocument = serde_json::from_value(json!({
            "categories": { "#phrasing": ["span"] },
            "specs": [{
                "tag": "a",
                "contents": true,
                "conditional": [
                    { "condition": { "hasAttr": "href" }, "contents": false },
                    { "condition": { "parent": "nav > ul" }, "contents": true }
                ]
            }]
        }))
        .unwrap();
        assert_eq!(doc.specs[0].conditional.len(), 2);
        assert!(matches!(
            &doc.specs[0].conditional[0].condition,
            ConditionDocument::HasAttr(attr) if attr == "href"
        ));
        assert!(matches!(
            &doc.specs[0].conditional[1].condition,
            ConditionDocument::Parent(sel) if sel == "nav > ul"
        ));
    }
}
