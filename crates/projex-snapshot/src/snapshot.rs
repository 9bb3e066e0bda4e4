//! Snapshot data structures.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Placeholder content for files detected as binary.
pub const BINARY_SENTINEL: &str = "<binary file omitted>";

/// Captured content of one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FileContent {
    /// Decoded text, with invalid UTF-8 replaced by U+FFFD.
    Text(String),
    /// The file looked binary and was not read past the probe.
    Binary,
    /// The file could not be opened or read; carries the error description.
    Unreadable(String),
}

impl FileContent {
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }
}

impl fmt::Display for FileContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Binary => f.write_str(BINARY_SENTINEL),
            Self::Unreadable(error) => write!(f, "<unable to read file: {error}>"),
        }
    }
}

/// One file captured by a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Root-relative path with `/` separators.
    pub relative_path: String,

    /// Size in bytes at capture time.
    pub size_bytes: u64,

    /// Last modification time, when the platform reports one.
    pub modified_at: Option<DateTime<Utc>>,

    pub content: FileContent,
}

impl FileRecord {
    /// Record for a file whose metadata could not be read.
    pub fn unreadable(relative_path: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            relative_path: relative_path.into(),
            size_bytes: 0,
            modified_at: None,
            content: FileContent::Unreadable(error.into()),
        }
    }

    /// Modification time rendered for display.
    pub fn modified_display(&self) -> String {
        self.modified_at
            .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// A complete snapshot of a directory: its rendered tree and every file record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Canonical root the snapshot was taken from.
    pub root: PathBuf,

    /// Indented tree rendering of the root.
    pub tree: String,

    /// File records sorted by relative path.
    pub records: Vec<FileRecord>,
}

impl Snapshot {
    /// Number of captured files.
    pub fn file_count(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_content_display() {
        assert_eq!(FileContent::Text("hello".into()).to_string(), "hello");
        assert_eq!(FileContent::Binary.to_string(), BINARY_SENTINEL);
        assert_eq!(
            FileContent::Unreadable("Permission denied (os error 13)".into()).to_string(),
            "<unable to read file: Permission denied (os error 13)>"
        );
    }

    #[test]
    fn test_content_serialization() {
        let json = serde_json::to_value(FileContent::Binary).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "binary" }));

        let json = serde_json::to_value(FileContent::Text("x".into())).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "text", "value": "x" }));
    }

    #[test]
    fn test_modified_display() {
        let mut record = FileRecord::unreadable("a.txt", "gone");
        assert_eq!(record.modified_display(), "unknown");

        record.modified_at = Some(Utc.with_ymd_and_hms(2026, 1, 28, 20, 10, 39).unwrap());
        assert_eq!(record.modified_display(), "2026-01-28T20:10:39Z");
    }
}
