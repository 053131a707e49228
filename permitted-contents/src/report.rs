//! Validation report types.

use std::path::PathBuf;

use serde::Serialize;

use crate::error::{ScanError, ToolingWarning, Violation};

/// Result of validating one document.
///
/// `warnings` are elements whose content model could not be compiled; they
/// were not checked, but they do not make the report fail.
#[derive(Debug, Clone, Default, Serialize)]
#[non_exhaustive]
pub struct ValidationReport {
    /// Number of element nodes visited.
    pub elements_checked: usize,
    /// Whether no violation was found.
    pub ok: bool,
    /// Violations in document order.
    pub violations: Vec<Violation>,
    /// Tooling warnings in document order.
    pub warnings: Vec<ToolingWarning>,
}

impl ValidationReport {
    pub(crate) fn new(
        elements_checked: usize,
        violations: Vec<Violation>,
        warnings: Vec<ToolingWarning>,
    ) -> Self {
        Self {
            elements_checked,
            ok: violations.is_empty(),
            violations,
            warnings,
        }
    }

    #[must_use]
    pub fn violations_count(&self) -> usize {
        self.violations.len()
    }
}

/// Report of one document file.
#[derive(Debug, Clone, Serialize)]
#[non_exhaustive]
pub struct FileReport {
    pub file: PathBuf,
    #[serde(flatten)]
    pub report: ValidationReport,
}

/// Result of a filesystem validation run.
///
/// CI pipelines must check both `files` and `scan_errors`. A non-empty
/// `scan_errors` means some documents were never validated; treat it as a
/// failure regardless of the violations found.
#[derive(Debug, Clone, Serialize)]
#[non_exhaustive]
pub struct FsValidationReport {
    /// Number of files successfully read, parsed and validated.
    pub scanned_files: usize,
    /// Number of files that could not be validated (read/parse failures).
    pub failed_files: usize,
    /// Whether every scanned file passed AND no scan errors occurred.
    pub ok: bool,
    /// Per-file reports, in path order.
    pub files: Vec<FileReport>,
    /// Scan-level errors: files that could not be read or parsed.
    pub scan_errors: Vec<ScanError>,
}

impl FsValidationReport {
    pub(crate) fn new(files: Vec<FileReport>, scan_errors: Vec<ScanError>, failed_files: usize) -> Self {
        let ok = scan_errors.is_empty() && files.iter().all(|f| f.report.ok);
        Self {
            scanned_files: files.len(),
            failed_files,
            ok,
            files,
            scan_errors,
        }
    }

    /// Total number of files attempted (scanned + failed).
    #[must_use]
    pub fn files_attempted(&self) -> usize {
        self.scanned_files + self.failed_files
    }

    /// Number of violations across all files.
    #[must_use]
    pub fn violations_count(&self) -> usize {
        self.files.iter().map(|f| f.report.violations_count()).sum()
    }

    /// Number of tooling warnings across all files.
    #[must_use]
    pub fn warnings_count(&self) -> usize {
        self.files.iter().map(|f| f.report.warnings.len()).sum()
    }
}
