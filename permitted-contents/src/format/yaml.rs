//! YAML document trees.

use std::path::Path;

use crate::dom::Document;
use crate::error::ScanError;

/// Parse a YAML document tree (a single YAML document).
///
/// # Errors
///
/// Returns a `ScanError` if the content is not valid YAML or not a document tree.
pub fn parse_yaml_document(content: &str, path: &Path) -> Result<Document, ScanError> {
    Document::from_yaml_str(content).map_err(|e| super::scan_error(path, &e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScanErrorKind;

    #[test]
    fn test_parse_yaml_tree() {
        let content = "name: ul\nchildren:\n  - name: li\n    children: [\"one\"]\n  - \"\\n\"\n";
        let doc = parse_yaml_document(content, Path::new("list.dom.yaml")).unwrap();
        let names: Vec<&str> = doc.elements().map(crate::dom::NodeRef::node_name).collect();
        assert_eq!(names, vec!["ul", "li"]);
    }

    #[test]
    fn test_invalid_yaml_is_scan_error() {
        let err = parse_yaml_document("name: [unclosed", Path::new("bad.dom.yml")).unwrap_err();
        assert_eq!(err.kind, ScanErrorKind::YamlParseError);
    }
}
