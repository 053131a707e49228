//! Compiled pattern representation.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use super::matcher::Program;
use crate::dom::SelectorList;
use crate::model::TEXT;

/// One symbol of a normalized child sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Token {
    Element(String),
    Text,
}

impl Token {
    /// Tag name, or `#text` for text.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Token::Element(name) => name,
            Token::Text => TEXT,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.name())
    }
}

/// The set of tokens accepted at one position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenClass {
    Any,
    OneOf(BTreeSet<String>),
}

impl TokenClass {
    #[must_use]
    pub fn accepts(&self, token: &Token) -> bool {
        match self {
            TokenClass::Any => true,
            TokenClass::OneOf(names) => names.contains(token.name()),
        }
    }
}

/// A target a forbidden-descendant constraint rejects, categories already unfolded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Forbidden {
    Text,
    Tag(String),
    Selector(SelectorList),
}

impl fmt::Display for Forbidden {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Forbidden::Text => f.write_str(TEXT),
            Forbidden::Tag(tag) => f.write_str(tag),
            Forbidden::Selector(selector) => write!(f, "{selector}"),
        }
    }
}

/// Constraint carried by a labeled region, resolved at compile time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    ForbiddenDescendant {
        /// Names the scope was written with (diagnostics only).
        scope: Vec<String>,
        forbidden: Vec<Forbidden>,
        /// Candidates are limited to tokens that matched a transparent region.
        in_transparent: bool,
    },
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Constraint::ForbiddenDescendant {
            scope, forbidden, ..
        } = self;
        let targets: Vec<String> = forbidden.iter().map(ToString::to_string).collect();
        write!(f, "{} excluding {}", scope.join("|"), targets.join(", "))
    }
}

/// Label attached to a pattern region; the matcher reports the span each
/// labeled region consumed.
#[derive(Debug, Clone)]
pub enum SpanLabel {
    /// Region matched by an inherited (transparent) content model.
    Transparent,
    Constraint(Arc<Constraint>),
}

impl SpanLabel {
    /// Label identity: constraints compare by allocation, not by value, so two
    /// identical constraints written twice stay distinct.
    #[must_use]
    pub fn same_as(&self, other: &SpanLabel) -> bool {
        match (self, other) {
            (SpanLabel::Transparent, SpanLabel::Transparent) => true,
            (SpanLabel::Constraint(a), SpanLabel::Constraint(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Pattern {
    Empty,
    Token(TokenClass),
    Sequence(Vec<Pattern>),
    Choice(Vec<Pattern>),
    Repeat {
        item: Box<Pattern>,
        min: usize,
        max: Option<usize>,
    },
    Labeled {
        label: SpanLabel,
        inner: Arc<Pattern>,
    },
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Empty => Ok(()),
            Pattern::Token(TokenClass::Any) => f.write_str("<*>"),
            Pattern::Token(TokenClass::OneOf(names)) => {
                let alts: Vec<String> = names.iter().map(|n| format!("<{n}>")).collect();
                if alts.len() == 1 {
                    f.write_str(&alts[0])
                } else {
                    write!(f, "(?:{})", alts.join("|"))
                }
            }
            Pattern::Sequence(items) => items.iter().try_for_each(|item| write!(f, "{item}")),
            Pattern::Choice(alts) => {
                f.write_str("(?:")?;
                for (idx, alt) in alts.iter().enumerate() {
                    if idx > 0 {
                        f.write_str("|")?;
                    }
                    write!(f, "{alt}")?;
                }
                f.write_str(")")
            }
            Pattern::Repeat { item, min, max } => match (min, max) {
                (0, None) => write!(f, "(?:{item})*"),
                (1, None) => write!(f, "(?:{item})+"),
                (0, Some(1)) => write!(f, "(?:{item})?"),
                (min, None) => write!(f, "(?:{item}){{{min},}}"),
                (min, Some(max)) => write!(f, "(?:{item}){{{min},{max}}}"),
            },
            Pattern::Labeled {
                label: SpanLabel::Transparent,
                inner,
            } => write!(f, "(?<TRANSPARENT>{inner})"),
            Pattern::Labeled {
                label: SpanLabel::Constraint(_),
                inner,
            } => write!(f, "(?<NAD>{inner})"),
        }
    }
}

/// A pattern ready for the matcher, together with its instruction form.
/// Cheap to clone; safe to share between elements that resolve to the same
/// content model.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    root: Arc<Pattern>,
    program: Arc<Program>,
}

impl CompiledPattern {
    #[must_use]
    pub fn new(root: Pattern) -> Self {
        let program = Program::compile(&root);
        Self {
            root: Arc::new(root),
            program: Arc::new(program),
        }
    }

    /// Pattern accepting any child sequence.
    #[must_use]
    pub fn any() -> Self {
        Self::new(Pattern::Repeat {
            item: Box::new(Pattern::Token(TokenClass::Any)),
            min: 0,
            max: None,
        })
    }

    #[must_use]
    pub fn root(&self) -> &Pattern {
        &self.root
    }

    pub(super) fn program(&self) -> &Program {
        &self.program
    }

    pub(super) fn shared_root(&self) -> Arc<Pattern> {
        Arc::clone(&self.root)
    }
}

impl fmt::Display for CompiledPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "^{}$", self.root)
    }
}
