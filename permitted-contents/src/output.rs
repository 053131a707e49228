//! Shared output formatting for validation reports.
//!
//! JSON and plain-text writers for `ValidationReport` and
//! `FsValidationReport`. Color/terminal formatting belongs to the CLI layer.

use std::io::Write;

use serde::Serialize;

use crate::report::{FsValidationReport, ValidationReport};

const RULE_WIDTH: usize = 80;

/// Write any report as pretty JSON.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_json<R: Serialize>(report: &R, writer: &mut dyn Write) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    writeln!(writer, "{json}")?;
    Ok(())
}

fn write_findings(report: &ValidationReport, prefix: &str, writer: &mut dyn Write) -> anyhow::Result<()> {
    for violation in &report.violations {
        writeln!(writer, "{prefix}{}", violation.format_human_readable())?;
    }
    for warning in &report.warnings {
        let location = warning
            .position
            .map_or_else(|| format!("<{}> #{}", warning.tag, warning.element), |p| format!("{}:{}", p.line, p.col));
        writeln!(writer, "{prefix}{location}: [warning] {}", warning.message)?;
    }
    Ok(())
}

/// Write a single-document report as plain text.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_human(report: &ValidationReport, writer: &mut dyn Write) -> anyhow::Result<()> {
    write_findings(report, "", writer)?;
    if report.ok {
        writeln!(
            writer,
            "\u{2713} {} elements checked, no invalid content",
            report.elements_checked
        )?;
    } else {
        writeln!(
            writer,
            "\u{2717} {} invalid content finding(s) in {} elements",
            report.violations_count(),
            report.elements_checked
        )?;
    }
    Ok(())
}

/// Write a filesystem report as plain text.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_human_fs(report: &FsValidationReport, writer: &mut dyn Write) -> anyhow::Result<()> {
    writeln!(writer)?;
    writeln!(writer, "{}", "=".repeat(RULE_WIDTH))?;
    writeln!(writer, "  PERMITTED CONTENTS VALIDATOR")?;
    writeln!(writer, "{}", "=".repeat(RULE_WIDTH))?;
    writeln!(writer)?;
    writeln!(writer, "  Files scanned:  {}", report.scanned_files)?;
    writeln!(writer, "  Files failed:   {}", report.failed_files)?;
    writeln!(writer, "  Violations:     {}", report.violations_count())?;
    writeln!(writer, "  Warnings:       {}", report.warnings_count())?;
    writeln!(writer)?;

    if !report.scan_errors.is_empty() {
        writeln!(writer, "{}", "-".repeat(RULE_WIDTH))?;
        writeln!(writer, "  SCAN ERRORS (files that could not be validated)")?;
        writeln!(writer, "{}", "-".repeat(RULE_WIDTH))?;
        for scan_err in &report.scan_errors {
            writeln!(writer, "{}", scan_err.format_human_readable())?;
        }
        writeln!(writer)?;
    }

    let with_findings: Vec<_> = report
        .files
        .iter()
        .filter(|f| !f.report.violations.is_empty() || !f.report.warnings.is_empty())
        .collect();
    if !with_findings.is_empty() {
        writeln!(writer, "{}", "-".repeat(RULE_WIDTH))?;
        writeln!(writer, "  INVALID CONTENT")?;
        writeln!(writer, "{}", "-".repeat(RULE_WIDTH))?;
        for file in with_findings {
            let prefix = format!("{}:", file.file.display());
            write_findings(&file.report, &prefix, writer)?;
        }
        writeln!(writer)?;
    }

    writeln!(writer, "{}", "=".repeat(RULE_WIDTH))?;
    if report.ok {
        writeln!(
            writer,
            "\u{2713} All {} files passed validation",
            report.scanned_files
        )?;
    } else {
        if !report.scan_errors.is_empty() {
            writeln!(
                writer,
                "\u{2717} {} file(s) could not be scanned; CI must treat this as a failure",
                report.failed_files
            )?;
        }
        if report.violations_count() > 0 {
            writeln!(
                writer,
                "\u{2717} {} invalid content finding(s)",
                report.violations_count()
            )?;
        }
    }
    writeln!(writer, "{}", "=".repeat(RULE_WIDTH))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{NodeId, SourcePosition};
    use crate::error::{RuleSource, ToolingWarning, Violation, ViolationReason};

    fn report() -> ValidationReport {
        ValidationReport::new(
            3,
            vec![Violation {
                element: NodeId::ROOT,
                tag: "p".to_owned(),
                reason: ViolationReason::ShapeMismatch,
                source: RuleSource::Spec,
                message_key: "invalid-content-spec",
                message: "Invalid content in \"p\" element on the HTML spec".to_owned(),
                offending: None,
                offending_tag: None,
                constraint: None,
                position: Some(SourcePosition { line: 2, col: 1 }),
            }],
            vec![ToolingWarning {
                element: NodeId::ROOT,
                tag: "a".to_owned(),
                message: "Cannot check \"a\" element".to_owned(),
                position: None,
            }],
        )
    }

    #[test]
    fn test_write_human() {
        let mut out = Vec::new();
        write_human(&report(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("2:1: Invalid content in \"p\" element on the HTML spec"));
        assert!(text.contains("<a> #0: [warning] Cannot check"));
        assert!(text.contains("1 invalid content finding(s) in 3 elements"));
    }

    #[test]
    fn test_write_json() {
        let mut out = Vec::new();
        write_json(&report(), &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["ok"], false);
        assert_eq!(value["elements_checked"], 3);
        assert_eq!(value["violations"][0]["message_key"], "invalid-content-spec");
    }
}
