//! Per-element validation.

use tracing::{debug, warn};

use crate::config::ValidationConfig;
use crate::dom::NodeRef;
use crate::error::{ContentModelError, RuleSource, ToolingWarning, Violation, ViolationReason};
use crate::grammar::{CompiledPattern, MatchOutcome, Token, run};
use crate::inherit::ResolutionContext;
use crate::interpret::find_offenses;
use crate::normalize::{normalize, relevant_children};
use crate::variant::{ActiveModel, matching_user_rules, select_content_model};

/// Message key of a spec-derived shape mismatch.
pub const INVALID_CONTENT_SPEC: &str = "invalid-content-spec";
/// Message key of a user-rule shape mismatch.
pub const INVALID_CONTENT_RULE: &str = "invalid-content-rule";
/// Message key of a forbidden descendant, whichever model found it.
pub const FORBIDDEN_DESCENDANT: &str = "forbidden-descendant";

/// Findings for one element.
#[derive(Debug, Clone, Default)]
pub struct ElementOutcome {
    pub violations: Vec<Violation>,
    pub warnings: Vec<ToolingWarning>,
}

/// Validate `node`'s children against its spec model, then against every
/// user rule for its tag. Each failing model yields its own findings.
#[must_use]
pub fn validate_element(
    ctx: &mut ResolutionContext<'_>,
    node: NodeRef<'_>,
    config: &ValidationConfig,
) -> ElementOutcome {
    let children = relevant_children(node);
    let tokens = normalize(&children);
    let check = ElementCheck {
        node,
        children: &children,
        tokens: &tokens,
    };
    let mut outcome = ElementOutcome::default();

    if let Some(spec) = ctx.spec_for(node) {
        if let ActiveModel::Conditional { index, .. } = select_content_model(node, spec) {
            debug!(tag = node.node_name(), node = %node.id(), index, "conditional content model active");
        }
        match ctx.pattern_for(node) {
            Ok(pattern) => check.apply(&pattern, RuleSource::Spec, &mut outcome),
            Err(err) => check.record_warning(&err, &mut outcome),
        }
    }

    for (index, rule) in matching_user_rules(node, &config.rules) {
        match ctx.compile_for(node, &rule.contents) {
            Ok(pattern) => check.apply(&pattern, RuleSource::UserRule(index), &mut outcome),
            Err(err) => check.record_warning(&err, &mut outcome),
        }
    }
    outcome
}

struct ElementCheck<'c, 'd> {
    node: NodeRef<'d>,
    children: &'c [NodeRef<'d>],
    tokens: &'c [Token],
}

impl ElementCheck<'_, '_> {
    fn apply(&self, pattern: &CompiledPattern, source: RuleSource, outcome: &mut ElementOutcome) {
        let tag = self.node.node_name();
        let origin = match source {
            RuleSource::Spec => "on the HTML spec",
            RuleSource::UserRule(_) => "on rule settings",
        };
        match run(pattern, self.tokens) {
            MatchOutcome::NoMatch => {
                debug!(tag, pattern = %pattern, "child sequence does not match");
                outcome.violations.push(Violation {
                    element: self.node.id(),
                    tag: tag.to_owned(),
                    reason: ViolationReason::ShapeMismatch,
                    source,
                    message_key: match source {
                        RuleSource::Spec => INVALID_CONTENT_SPEC,
                        RuleSource::UserRule(_) => INVALID_CONTENT_RULE,
                    },
                    message: format!("Invalid content in \"{tag}\" element {origin}"),
                    offending: None,
                    offending_tag: None,
                    constraint: None,
                    position: self.node.position(),
                });
            }
            MatchOutcome::Matched(spans) => {
                for offense in find_offenses(&spans, self.tokens, self.children) {
                    let culprit = offense.culprit.node_name();
                    debug!(tag, constraint = %offense.constraint, culprit, "forbidden descendant");
                    outcome.violations.push(Violation {
                        element: self.node.id(),
                        tag: tag.to_owned(),
                        reason: ViolationReason::ForbiddenDescendant,
                        source,
                        message_key: FORBIDDEN_DESCENDANT,
                        message: format!(
                            "Invalid content in \"{tag}\" element {origin}: \"{culprit}\" is not allowed in \"{}\"",
                            offense.node.node_name()
                        ),
                        offending: Some(offense.node.id()),
                        offending_tag: Some(offense.node.node_name().to_owned()),
                        constraint: Some(offense.constraint.to_string()),
                        position: self.node.position(),
                    });
                }
            }
        }
    }

    fn record_warning(&self, err: &ContentModelError, outcome: &mut ElementOutcome) {
        let tag = self.node.node_name();
        warn!(tag, node = %self.node.id(), error = %err, "content model unusable for element");
        outcome.warnings.push(ToolingWarning {
            element: self.node.id(),
            tag: tag.to_owned(),
            message: format!("Cannot check \"{tag}\" element: {err}"),
            position: self.node.position(),
        });
    }
}
