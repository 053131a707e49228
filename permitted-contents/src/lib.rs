//! # permitted-contents
//!
//! Validates that the children of every HTML element conform to the
//! element's permitted-content grammar.
//!
//! Grammars come from a [`SpecRepository`] (per-tag content models,
//! conditional variants, content categories) plus user [`UserContentRule`]s.
//! Each model is compiled to a pattern over the element's child tokens and
//! matched in one pass; forbidden-descendant constraints are carried as
//! labeled regions of the pattern and checked against the matched children.
//!
//! The crate keeps the **core validation engine** (input-agnostic,
//! [`validate_document`]) apart from **input strategies** (filesystem
//! scanning, [`validate_fs`]).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::{Path, PathBuf};
//! use permitted_contents::{load_spec_file, validate_fs, FsSourceConfig, ValidationConfig};
//!
//! let repo = load_spec_file(Path::new("html-spec.json")).unwrap();
//! let fs_config = FsSourceConfig::default().with_paths(vec![PathBuf::from("pages")]);
//!
//! let report = validate_fs(&fs_config, &repo, &ValidationConfig::default()).unwrap();
//! println!("Files scanned: {}", report.scanned_files);
//! println!("Violations: {}", report.violations_count());
//! println!("OK: {}", report.ok);
//! ```

pub mod category;
mod config;
pub mod dom;
mod error;
mod format;
pub mod grammar;
pub mod inherit;
pub mod interpret;
pub mod model;
pub mod normalize;
pub mod output;
mod report;
pub mod repository;
pub mod schema;
mod strategy;
pub mod validator;
pub mod variant;

pub use config::{FsSourceConfig, UserContentRule, ValidationConfig};
pub use dom::{Document, DocumentError, NodeId, NodeRef, SelectorError, SelectorList};
pub use error::{
    ContentModelError, RuleSource, ScanError, ScanErrorKind, ToolingWarning, Violation,
    ViolationReason,
};
pub use model::{ContentModel, ForbiddenTarget};
pub use report::{FileReport, FsValidationReport, ValidationReport};
pub use repository::{
    Condition, ConditionalVariant, SpecRepository, TagSpec, load_rules_file, load_spec_file,
};

use rayon::prelude::*;
use tracing::{debug, info};

use inherit::ResolutionContext;
use strategy::fs::{content_format_for, find_files, read_file_bounded};
use validator::{ElementOutcome, validate_element};

/// Validate every element of `document`.
///
/// Findings are in document order, whether or not `config.parallel` is set.
///
/// # Errors
///
/// Returns `ContentModelError::UnknownCategory` if a user rule references a
/// category the repository does not define. Nothing found while walking the
/// document is an error: invalid content becomes a violation, an unusable
/// content model a tooling warning.
pub fn validate_document(
    document: &Document,
    repo: &SpecRepository,
    config: &ValidationConfig,
) -> Result<ValidationReport, ContentModelError> {
    check_rules(repo, config)?;
    Ok(walk(document, repo, config))
}

fn check_rules(repo: &SpecRepository, config: &ValidationConfig) -> Result<(), ContentModelError> {
    for rule in &config.rules {
        repo.check_model(&rule.contents)?;
    }
    Ok(())
}

fn walk(document: &Document, repo: &SpecRepository, config: &ValidationConfig) -> ValidationReport {
    let elements: Vec<NodeRef<'_>> = document.elements().collect();
    let outcomes: Vec<ElementOutcome> = if config.parallel {
        elements
            .par_iter()
            .map_init(
                || ResolutionContext::new(repo),
                |ctx, node| validate_element(ctx, *node, config),
            )
            .collect()
    } else {
        let mut ctx = ResolutionContext::new(repo);
        elements
            .iter()
            .map(|node| validate_element(&mut ctx, *node, config))
            .collect()
    };

    let mut violations = Vec::new();
    let mut warnings = Vec::new();
    for outcome in outcomes {
        violations.extend(outcome.violations);
        warnings.extend(outcome.warnings);
    }
    // Stable: findings of one element keep spec-then-rules order.
    violations.sort_by_key(|v| v.element);
    warnings.sort_by_key(|w| w.element);

    debug!(
        elements = elements.len(),
        violations = violations.len(),
        warnings = warnings.len(),
        "validated document"
    );
    ValidationReport::new(elements.len(), violations, warnings)
}

/// Validate document files on disk.
///
/// # Errors
///
/// Returns an error if `fs_config.paths` is empty, if a path does not exist,
/// or if a user rule references an unknown category. Per-file failures
/// (unreadable files, parse errors, limits) are reported in
/// `report.scan_errors` and never silently discarded.
pub fn validate_fs(
    fs_config: &FsSourceConfig,
    repo: &SpecRepository,
    config: &ValidationConfig,
) -> anyhow::Result<FsValidationReport> {
    if fs_config.paths.is_empty() {
        anyhow::bail!("No paths provided for validation");
    }
    for path in &fs_config.paths {
        if !path.exists() {
            anyhow::bail!("Path does not exist: {}", path.display());
        }
    }
    check_rules(repo, config)?;

    let (files, mut scan_errors) = find_files(fs_config);
    // Discovery failures count as failed files up front.
    let mut failed_files = scan_errors.len();
    let mut reports = Vec::new();
    let mut total_bytes: u64 = 0;

    for file_path in &files {
        if reports.len() + failed_files >= fs_config.max_files {
            scan_errors.push(ScanError {
                file: file_path.clone(),
                kind: ScanErrorKind::LimitExceeded,
                message: format!(
                    "Scan aborted: max_files limit ({}) reached; remaining files not scanned",
                    fs_config.max_files
                ),
            });
            failed_files += 1;
            break;
        }

        let content = match read_file_bounded(file_path, fs_config.max_file_size) {
            Ok(c) => c,
            Err(e) => {
                scan_errors.push(e);
                failed_files += 1;
                continue;
            }
        };

        let file_bytes = content.len() as u64;
        if total_bytes.saturating_add(file_bytes) > fs_config.max_total_bytes {
            scan_errors.push(ScanError {
                file: file_path.clone(),
                kind: ScanErrorKind::LimitExceeded,
                message: format!(
                    "Scan aborted: max_total_bytes limit ({}) reached; remaining files not scanned",
                    fs_config.max_total_bytes
                ),
            });
            failed_files += 1;
            break;
        }
        total_bytes = total_bytes.saturating_add(file_bytes);

        // Explicitly named files without a document suffix are read as JSON.
        let content_format = content_format_for(file_path).unwrap_or(strategy::ContentFormat::Json);
        let document = match format::parse_document(&content, file_path, content_format) {
            Ok(doc) => doc,
            Err(e) => {
                scan_errors.push(e);
                failed_files += 1;
                continue;
            }
        };

        let report = walk(&document, repo, config);
        debug!(file = %file_path.display(), ok = report.ok, "validated file");
        reports.push(FileReport {
            file: file_path.clone(),
            report,
        });
    }

    let report = FsValidationReport::new(reports, scan_errors, failed_files);
    info!(
        scanned = report.scanned_files,
        failed = report.failed_files,
        violations = report.violations_count(),
        "validation finished"
    );
    Ok(report)
}
