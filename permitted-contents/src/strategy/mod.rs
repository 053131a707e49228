//! Document sources.
//!
//! Only the filesystem source exists (`fs`), exposed through `validate_fs()`.
//! In-memory callers use `validate_document()` directly.

pub mod fs;

/// Serialized tree format of a document file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentFormat {
    Json,
    Yaml,
}
