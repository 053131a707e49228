//! JSON document trees.

use std::path::Path;

use crate::dom::Document;
use crate::error::ScanError;

/// Parse a JSON document tree.
///
/// # Errors
///
/// Returns a `ScanError` if the content is not valid JSON or not a document
/// tree. Invalid JSON must be reported as a scan failure, never ignored.
pub fn parse_json_document(content: &str, path: &Path) -> Result<Document, ScanError> {
    Document::from_json_str(content).map_err(|e| super::scan_error(path, &e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScanErrorKind;

    #[test]
    fn test_parse_fragment() {
        let doc = parse_json_document(
            r#"[{"name": "p", "children": ["x"]}, {"name": "hr"}]"#,
            Path::new("a.dom.json"),
        )
        .unwrap();
        assert_eq!(doc.elements().count(), 2);
    }

    #[test]
    fn test_invalid_json_is_scan_error() {
        let err = parse_json_document("{ \"name\": ", Path::new("bad.dom.json")).unwrap_err();
        assert_eq!(err.kind, ScanErrorKind::JsonParseError);
        assert!(err.message.starts_with("JSON parse error"));
        assert_eq!(err.file, Path::new("bad.dom.json"));
    }

    #[test]
    fn test_wrong_shape_is_scan_error() {
        let err = parse_json_document(r#"{"tag": "p"}"#, Path::new("x.dom.json")).unwrap_err();
        assert_eq!(err.kind, ScanErrorKind::JsonParseError);
    }
}
