//! Filesystem document source.
//!
//! Discovers document files (`*.dom.json`, `*.dom.yaml`, `*.dom.yml`) and
//! reads them for the validation pipeline:
//! - Symlinks are not followed by default (`follow_links: false`)
//! - Resolved paths must stay within the scanned root
//! - Devices, pipes and sockets are skipped
//! - Directory depth is bounded
//! - Reads are bounded by `max_file_size`

use std::io::Read;
use std::path::{Path, PathBuf};

use glob::Pattern;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::config::FsSourceConfig;
use crate::error::{ScanError, ScanErrorKind};
use crate::strategy::ContentFormat;

/// Directories never descended into.
pub const SKIP_DIRS: &[&str] = &["target", "node_modules", ".git"];

/// Recognized document file suffixes (compared ASCII case-insensitively).
const DOCUMENT_SUFFIXES: &[(&str, ContentFormat)] = &[
    (".dom.json", ContentFormat::Json),
    (".dom.yaml", ContentFormat::Yaml),
    (".dom.yml", ContentFormat::Yaml),
];

/// Determine the document format from a file name.
#[must_use]
pub fn content_format_for(path: &Path) -> Option<ContentFormat> {
    let name = path.file_name()?.to_str()?.to_ascii_lowercase();
    DOCUMENT_SUFFIXES
        .iter()
        .find(|(suffix, _)| name.len() > suffix.len() && name.ends_with(suffix))
        .map(|(_, format)| *format)
}

fn matches_exclude(path: &Path, exclude: &[Pattern]) -> bool {
    let path_str = path.to_string_lossy();
    exclude.iter().any(|pattern| {
        pattern.matches(&path_str)
            || path
                .file_name()
                .is_some_and(|name| pattern.matches(&name.to_string_lossy()))
    })
}

/// `true` if the entry should be walked (it is not a skipped directory).
fn is_not_skip_dir(entry: &DirEntry) -> bool {
    if entry.file_type().is_dir()
        && let Some(name) = entry.file_name().to_str()
    {
        return !SKIP_DIRS.contains(&name);
    }
    true
}

#[cfg(unix)]
fn is_special_file(entry: &DirEntry) -> bool {
    use std::os::unix::fs::FileTypeExt;
    entry.metadata().is_ok_and(|m| {
        let ft = m.file_type();
        ft.is_block_device() || ft.is_char_device() || ft.is_fifo() || ft.is_socket()
    })
}

#[cfg(not(unix))]
fn is_special_file(_entry: &DirEntry) -> bool {
    false
}

fn compile_excludes(patterns: &[String], scan_errors: &mut Vec<ScanError>) -> Vec<Pattern> {
    patterns
        .iter()
        .filter_map(|raw| match Pattern::new(raw) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                scan_errors.push(ScanError {
                    file: PathBuf::from(raw),
                    kind: ScanErrorKind::InvalidExcludePattern,
                    message: format!("Invalid exclude glob pattern '{raw}': {e}"),
                });
                None
            }
        })
        .collect()
}

/// Reject paths that resolve outside `root` (symlink escapes).
fn check_within_root(path: &Path, root: &Path) -> Result<(), ScanError> {
    let resolved = path.canonicalize().map_err(|e| ScanError {
        file: path.to_path_buf(),
        kind: ScanErrorKind::IoError,
        message: format!("Failed to canonicalize path: {e}"),
    })?;
    if resolved.starts_with(root) {
        Ok(())
    } else {
        Err(ScanError {
            file: path.to_path_buf(),
            kind: ScanErrorKind::OutsideRepository,
            message: format!(
                "Path resolves outside the scanned root: {} -> {}",
                path.display(),
                resolved.display()
            ),
        })
    }
}

/// Find all document files under the configured paths.
///
/// Returns `(files, scan_errors)`; files are sorted and deduplicated. Walk
/// errors and boundary violations are returned, never discarded.
#[must_use]
pub fn find_files(config: &FsSourceConfig) -> (Vec<PathBuf>, Vec<ScanError>) {
    let mut files = Vec::new();
    let mut scan_errors = Vec::new();
    let exclude = compile_excludes(&config.exclude, &mut scan_errors);

    for root in &config.paths {
        let canonical_root = match root.canonicalize() {
            Ok(r) => r,
            Err(e) => {
                scan_errors.push(ScanError {
                    file: root.clone(),
                    kind: ScanErrorKind::IoError,
                    message: format!("Failed to canonicalize root path: {e}"),
                });
                continue;
            }
        };

        // An explicitly named file is taken as-is, whatever its name.
        if root.is_file() {
            if !matches_exclude(root, &exclude) {
                files.push(root.clone());
            }
            continue;
        }

        for entry in WalkDir::new(root)
            .follow_links(config.follow_links)
            .max_depth(config.max_depth)
            .into_iter()
            .filter_entry(is_not_skip_dir)
        {
            let entry = match entry {
                Ok(e) => e,
                Err(walk_err) => {
                    let path = walk_err
                        .path()
                        .map_or_else(|| root.clone(), Path::to_path_buf);
                    scan_errors.push(ScanError {
                        file: path,
                        kind: ScanErrorKind::WalkError,
                        message: format!("Directory traversal error: {walk_err}"),
                    });
                    continue;
                }
            };

            let path = entry.path();
            if !path.is_file()
                || is_special_file(&entry)
                || content_format_for(path).is_none()
                || matches_exclude(path, &exclude)
            {
                continue;
            }
            if let Err(e) = check_within_root(path, &canonical_root) {
                scan_errors.push(e);
                continue;
            }
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    files.dedup();
    debug!(files = files.len(), errors = scan_errors.len(), "discovered document files");
    (files, scan_errors)
}

/// Read a file with a bounded read, enforcing `max_file_size`.
///
/// The size check and the read are the same operation, so the file cannot
/// grow between them.
///
/// # Errors
///
/// Returns a `ScanError` if the file cannot be read, exceeds
/// `max_file_size`, or is not valid UTF-8.
pub fn read_file_bounded(path: &Path, max_file_size: u64) -> Result<String, ScanError> {
    let io_error = |what: &str, e: std::io::Error| ScanError {
        file: path.to_owned(),
        kind: ScanErrorKind::IoError,
        message: format!("Failed to {what} file: {e}"),
    };

    let file = std::fs::File::open(path).map_err(|e| io_error("open", e))?;
    // One byte past the limit tells an oversized file from one exactly at it.
    let mut buffer = Vec::new();
    file.take(max_file_size.saturating_add(1))
        .read_to_end(&mut buffer)
        .map_err(|e| io_error("read", e))?;

    if buffer.len() as u64 > max_file_size {
        return Err(ScanError {
            file: path.to_owned(),
            kind: ScanErrorKind::FileTooLarge,
            message: format!("File exceeds maximum size of {max_file_size} bytes"),
        });
    }

    String::from_utf8(buffer).map_err(|_| ScanError {
        file: path.to_owned(),
        kind: ScanErrorKind::InvalidEncoding,
        message: "File is not valid UTF-8".to_owned(),
    })
}
