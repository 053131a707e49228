//! Error and violation types for permitted-content validation.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::dom::{NodeId, SelectorError, SourcePosition};

/// Configuration or compilation failure of a content model.
///
/// Content models are trusted static configuration: everything except
/// `MissingInheritance` is raised while loading, never per element.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ContentModelError {
    #[error("Unknown content category '{name}'")]
    UnknownCategory { name: String },
    #[error("Transparent content model has no ancestor to inherit from")]
    MissingInheritance,
    #[error("Forbidden-descendant constraint must name at least one target")]
    EmptyForbiddenSet,
    #[error("Invalid repetition bounds: min {min} exceeds max {max}")]
    InvalidRepetition { min: usize, max: usize },
    #[error("Choice must offer at least one alternative")]
    EmptyChoice,
    #[error(transparent)]
    Selector(#[from] SelectorError),
}

/// The kind of scan-level failure that prevented a document file from being validated.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScanErrorKind {
    /// An I/O error occurred while reading the file.
    IoError,
    /// The file exceeded the configured maximum size limit.
    FileTooLarge,
    /// The file content could not be parsed as a JSON document tree.
    JsonParseError,
    /// The file content could not be parsed as a YAML document tree.
    YamlParseError,
    /// The file content is not valid UTF-8.
    InvalidEncoding,
    /// The resolved path is outside the scanned root (symlink escape).
    OutsideRepository,
    /// `max_files` or `max_total_bytes` was reached, truncating the scan.
    LimitExceeded,
    /// A directory traversal error (permission denied, loop detected, etc.).
    WalkError,
    /// An exclude glob pattern could not be parsed.
    InvalidExcludePattern,
}

/// A document file that could not be validated at all.
///
/// Distinct from `Violation`: a scan error means the file was never checked,
/// so callers must treat it as a failure.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[non_exhaustive]
pub struct ScanError {
    pub file: PathBuf,
    pub kind: ScanErrorKind,
    /// Human-readable description of the failure.
    pub message: String,
}

impl ScanError {
    #[must_use]
    pub fn format_human_readable(&self) -> String {
        format!("{}: [scan error] {}", self.file.display(), self.message)
    }
}

/// Why an element's children were rejected.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ViolationReason {
    /// The child sequence does not match the content model.
    ShapeMismatch,
    /// The shape matched but a child, or something below it, is forbidden.
    ForbiddenDescendant,
}

/// Which content model produced a violation.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "index", rename_all = "kebab-case")]
pub enum RuleSource {
    /// The structural specification (default or conditional variant).
    Spec,
    /// A user content rule, by position in `ValidationConfig::rules`.
    UserRule(usize),
}

/// One invalid-content finding for an element.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[non_exhaustive]
pub struct Violation {
    pub element: NodeId,
    pub tag: String,
    pub reason: ViolationReason,
    pub source: RuleSource,
    /// Stable key hosts can map to their own message catalog.
    pub message_key: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offending: Option<NodeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offending_tag: Option<String>,
    /// The forbidden-descendant constraint that fired, as `scope excluding targets`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<SourcePosition>,
}

impl Violation {
    /// `{line}:{col}: {message}` when the element has a position, else the message.
    #[must_use]
    pub fn format_human_readable(&self) -> String {
        match self.position {
            Some(pos) => format!("{}:{}: {}", pos.line, pos.col, self.message),
            None => format!("<{}> #{}: {}", self.tag, self.element, self.message),
        }
    }
}

/// A validation that could not run because the content model itself is
/// unusable for this element. Not a fault of the author's markup.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[non_exhaustive]
pub struct ToolingWarning {
    pub element: NodeId,
    pub tag: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<SourcePosition>,
}
