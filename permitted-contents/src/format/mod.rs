//! Document file parsers.
//!
//! Each sub-module turns one serialized tree format into a [`Document`]:
//! - `json`: `*.dom.json`
//! - `yaml`: `*.dom.yaml` / `*.dom.yml`
//!
//! Parse failures become `ScanError`s; a file that cannot be parsed is never
//! validated.

pub mod json;
pub mod yaml;

use std::path::Path;

use crate::dom::{Document, DocumentError};
use crate::error::{ScanError, ScanErrorKind};
use crate::strategy::ContentFormat;

/// Parse `content` according to `format`.
///
/// # Errors
///
/// Returns a `ScanError` if the content is not a valid document tree.
pub fn parse_document(
    content: &str,
    path: &Path,
    format: ContentFormat,
) -> Result<Document, ScanError> {
    match format {
        ContentFormat::Json => json::parse_json_document(content, path),
        ContentFormat::Yaml => yaml::parse_yaml_document(content, path),
    }
}

fn scan_error(path: &Path, err: &DocumentError) -> ScanError {
    let kind = match err {
        DocumentError::Json(_) => ScanErrorKind::JsonParseError,
        DocumentError::Yaml(_) => ScanErrorKind::YamlParseError,
        DocumentError::TooManyNodes { .. } => ScanErrorKind::LimitExceeded,
    };
    ScanError {
        file: path.to_owned(),
        kind,
        message: err.to_string(),
    }
}
