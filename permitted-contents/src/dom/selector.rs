//! CSS selector subset used by conditional variants and forbidden-descendant targets.
//!
//! Supported: selector lists, descendant and child combinators, and compounds
//! of type, universal, id, class, attribute presence/equality and `:not(...)`.
//! Selectors are parsed once at load time and matched right-to-left.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use super::{NodeKind, NodeRef};

/// One simple selector at the start of the remaining input.
static SIMPLE_SELECTOR: LazyLock<Regex> = LazyLock::new(|| {
    match Regex::new(concat!(
        r"^(?:",
        r"(?P<type>[A-Za-z][A-Za-z0-9-]*|\*)",
        r"|#(?P<id>[A-Za-z0-9_-]+)",
        r"|\.(?P<class>[A-Za-z0-9_-]+)",
        r"|\[\s*(?P<attr>[A-Za-z_:][A-Za-z0-9_:.-]*)\s*",
        r#"(?:=\s*(?:"(?P<dq>[^"]*)"|'(?P<sq>[^']*)'|(?P<bare>[A-Za-z0-9_-]+))\s*)?\]"#,
        r")",
    )) {
        Ok(regex) => regex,
        Err(err) => panic!("Invalid simple selector regex: {err}"),
    }
});

/// Selector parse failure. Selectors are trusted configuration, so these
/// surface when the spec or rules are loaded.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SelectorError {
    #[error("Empty selector in '{selector}'")]
    Empty { selector: String },
    #[error("Unexpected '{found}' in selector '{selector}'")]
    Unexpected { selector: String, found: String },
    #[error("Unclosed ':not(' in selector '{selector}'")]
    Unclosed { selector: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrTest {
    name: String,
    value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    ids: Vec<String>,
    classes: Vec<String>,
    attrs: Vec<AttrTest>,
    negations: Vec<Compound>,
}

impl Compound {
    fn matches(&self, node: NodeRef<'_>) -> bool {
        if node.kind() != NodeKind::Element {
            return false;
        }
        if let Some(tag) = &self.tag
            && !node.node_name().eq_ignore_ascii_case(tag)
        {
            return false;
        }
        if !self
            .ids
            .iter()
            .all(|id| node.attribute("id") == Some(id.as_str()))
        {
            return false;
        }
        let class_attr = node.attribute("class").unwrap_or("");
        if !self
            .classes
            .iter()
            .all(|class| class_attr.split_ascii_whitespace().any(|c| c == class))
        {
            return false;
        }
        let attrs_ok = self.attrs.iter().all(|test| match &test.value {
            None => node.has_attribute(&test.name),
            Some(expected) => node.attribute(&test.name) == Some(expected.as_str()),
        });
        attrs_ok && !self.negations.iter().any(|neg| neg.matches(node))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    /// Relation to the step on the left; ignored for the first step.
    combinator: Combinator,
    compound: Compound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ComplexSelector {
    steps: Vec<Step>,
}

impl ComplexSelector {
    fn matches(&self, node: NodeRef<'_>) -> bool {
        matches_steps(&self.steps, node)
    }
}

fn matches_steps(steps: &[Step], node: NodeRef<'_>) -> bool {
    let Some((last, rest)) = steps.split_last() else {
        return true;
    };
    if !last.compound.matches(node) {
        return false;
    }
    if rest.is_empty() {
        return true;
    }
    match last.combinator {
        Combinator::Child => node
            .parent_element()
            .is_some_and(|parent| matches_steps(rest, parent)),
        Combinator::Descendant => node.ancestors().any(|anc| matches_steps(rest, anc)),
    }
}

/// A parsed, comma-separated selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    source: String,
    selectors: Vec<ComplexSelector>,
}

impl SelectorList {
    /// Parse a selector list.
    ///
    /// # Errors
    ///
    /// Returns a `SelectorError` if any selector in the list is empty or malformed.
    pub fn parse(source: &str) -> Result<Self, SelectorError> {
        let selectors = split_top_level(source)
            .into_iter()
            .map(|part| parse_complex(part, source))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            source: source.trim().to_owned(),
            selectors,
        })
    }

    /// Whether `node` itself matches any selector in the list.
    #[must_use]
    pub fn matches(&self, node: NodeRef<'_>) -> bool {
        self.selectors.iter().any(|sel| sel.matches(node))
    }

    /// The selector text as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for SelectorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl FromStr for SelectorList {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Split on commas that are not nested in parentheses, brackets or quotes.
fn split_top_level(source: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (idx, ch) in source.char_indices() {
        if let Some(q) = quote {
            if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => quote = Some(ch),
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&source[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&source[start..]);
    parts
}

fn parse_complex(part: &str, source: &str) -> Result<ComplexSelector, SelectorError> {
    let mut steps = Vec::new();
    let mut rest = part.trim();
    let mut combinator = Combinator::Descendant;

    while !rest.is_empty() {
        let (compound, remaining) = parse_compound(rest, source)?;
        steps.push(Step {
            combinator,
            compound,
        });

        let trimmed = remaining.trim_start();
        if let Some(after) = trimmed.strip_prefix('>') {
            combinator = Combinator::Child;
            rest = after.trim_start();
            if rest.is_empty() {
                return Err(SelectorError::Unexpected {
                    selector: source.to_owned(),
                    found: ">".to_owned(),
                });
            }
        } else if trimmed.is_empty() || trimmed.len() < remaining.len() {
            combinator = Combinator::Descendant;
            rest = trimmed;
        } else {
            return Err(unexpected(source, trimmed));
        }
    }

    if steps.is_empty() {
        return Err(SelectorError::Empty {
            selector: source.to_owned(),
        });
    }
    Ok(ComplexSelector { steps })
}

fn parse_compound<'a>(input: &'a str, source: &str) -> Result<(Compound, &'a str), SelectorError> {
    let mut compound = Compound::default();
    let mut rest = input;
    let mut parsed_any = false;

    loop {
        if let Some(inner) = rest.strip_prefix(":not(") {
            let close = find_closing_paren(inner).ok_or_else(|| SelectorError::Unclosed {
                selector: source.to_owned(),
            })?;
            let (negated, leftover) = parse_compound(inner[..close].trim(), source)?;
            if !leftover.trim().is_empty() {
                return Err(unexpected(source, leftover));
            }
            compound.negations.push(negated);
            rest = &inner[close + 1..];
            parsed_any = true;
            continue;
        }

        let Some(caps) = SIMPLE_SELECTOR.captures(rest) else {
            break;
        };
        let consumed = caps.get(0).map_or(0, |m| m.end());

        if let Some(tag) = caps.name("type") {
            if parsed_any {
                return Err(unexpected(source, rest));
            }
            if tag.as_str() != "*" {
                compound.tag = Some(tag.as_str().to_ascii_lowercase());
            }
        } else if let Some(id) = caps.name("id") {
            compound.ids.push(id.as_str().to_owned());
        } else if let Some(class) = caps.name("class") {
            compound.classes.push(class.as_str().to_owned());
        } else if let Some(attr) = caps.name("attr") {
            let value = caps
                .name("dq")
                .or_else(|| caps.name("sq"))
                .or_else(|| caps.name("bare"))
                .map(|v| v.as_str().to_owned());
            compound.attrs.push(AttrTest {
                name: attr.as_str().to_ascii_lowercase(),
                value,
            });
        }

        rest = &rest[consumed..];
        parsed_any = true;
    }

    if !parsed_any {
        return Err(unexpected(source, rest));
    }
    Ok((compound, rest))
}

fn find_closing_paren(input: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, ch) in input.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' if depth == 0 => return Some(idx),
            ')' => depth -= 1,
            _ => {}
        }
    }
    None
}

fn unexpected(source: &str, rest: &str) -> SelectorError {
    let found = rest.chars().next().map_or_else(String::new, String::from);
    if found.is_empty() {
        SelectorError::Empty {
            selector: source.to_owned(),
        }
    } else {
        SelectorError::Unexpected {
            selector: source.to_owned(),
            found,
        }
    }
}
