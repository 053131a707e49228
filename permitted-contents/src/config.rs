//! Configuration types for permitted-content validation.
//!
//! Split into core validation config (universal) and source-specific config
//! (how documents are discovered). This keeps filesystem concerns out of the
//! core API.

use std::path::PathBuf;

use crate::error::ContentModelError;
use crate::model::ContentModel;
use crate::schema::{Contents, RuleDocument};

/// An extra content model enforced on every element of one tag, in addition
/// to whatever the structural specification allows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserContentRule {
    /// Compared to element names ASCII case-insensitively.
    pub tag: String,
    pub contents: ContentModel,
}

impl UserContentRule {
    #[must_use]
    pub fn new(tag: impl Into<String>, contents: ContentModel) -> Self {
        Self {
            tag: tag.into(),
            contents,
        }
    }

    /// Build a rule from author syntax.
    ///
    /// # Errors
    ///
    /// Returns an error if `contents` is malformed.
    pub fn parse(tag: impl Into<String>, contents: &Contents) -> Result<Self, ContentModelError> {
        Ok(Self::new(tag, contents.to_model()?))
    }

    /// # Errors
    ///
    /// Returns an error if the rule's contents are malformed.
    pub fn from_document(rule: &RuleDocument) -> Result<Self, ContentModelError> {
        Self::parse(rule.tag.clone(), &rule.contents)
    }

    #[must_use]
    pub fn applies_to(&self, tag: &str) -> bool {
        self.tag.eq_ignore_ascii_case(tag)
    }
}

/// Core validation config; applies regardless of input source.
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct ValidationConfig {
    /// User content rules, checked after the spec for each matching element.
    /// Violations refer to a rule by its index in this list.
    pub rules: Vec<UserContentRule>,
    /// Validate elements on the rayon thread pool (default: off).
    /// The report is identical either way.
    pub parallel: bool,
}

impl ValidationConfig {
    #[must_use]
    pub fn with_rules(mut self, rules: Vec<UserContentRule>) -> Self {
        self.rules = rules;
        self
    }

    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Filesystem-specific source options.
///
/// NOTE: `paths` is required and must be non-empty. Default scan roots are a
/// CLI concern, not baked into the library.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct FsSourceConfig {
    /// Paths to scan (files or directories). Required, must be non-empty.
    pub paths: Vec<PathBuf>,
    /// Exclude patterns (glob format).
    pub exclude: Vec<String>,
    /// Maximum file size in bytes (default: 10 MB).
    pub max_file_size: u64,
    /// Whether to follow symbolic links.
    ///
    /// **Defaults to `false`**: following symlinks allows escaping the scanned
    /// root. Only enable if you trust every symlink under the given paths.
    pub follow_links: bool,
    /// Maximum directory traversal depth (default: 64).
    pub max_depth: usize,
    /// Maximum total number of files to scan (default: `100_000`).
    pub max_files: usize,
    /// Maximum total bytes to read across all files (default: 512 MB).
    pub max_total_bytes: u64,
}

impl Default for FsSourceConfig {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            exclude: Vec::new(),
            max_file_size: 10_485_760,
            follow_links: false,
            max_depth: 64,
            max_files: 100_000,
            max_total_bytes: 536_870_912,
        }
    }
}

impl FsSourceConfig {
    #[must_use]
    pub fn with_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.paths = paths;
        self
    }

    #[must_use]
    pub fn with_exclude(mut self, exclude: Vec<String>) -> Self {
        self.exclude = exclude;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rule_tag_case_insensitive() {
        let rule = UserContentRule::new("Section", ContentModel::Any);
        assert!(rule.applies_to("section"));
        assert!(rule.applies_to("SECTION"));
        assert!(!rule.applies_to("article"));
    }

    #[test]
    fn test_rule_from_author_syntax() {
        let contents: Contents = serde_json::from_value(json!([{ "require": "h1" }])).unwrap();
        let rule = UserContentRule::parse("section", &contents).unwrap();
        assert_eq!(rule.contents, ContentModel::Tag("h1".to_owned()));
    }

    #[test]
    fn test_defaults() {
        let config = ValidationConfig::default();
        assert!(config.rules.is_empty());
        assert!(!config.parallel);

        let fs = FsSourceConfig::default();
        assert!(!fs.follow_links);
        assert_eq!(fs.max_depth, 64);
        assert_eq!(fs.max_files, 100_000);
    }
}
