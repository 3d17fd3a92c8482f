//! Document identity and declared format

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static DISALLOWED_NAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9\s\-\(\)\[\]]").expect("valid regex"));

static WHITESPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

const FALLBACK_NAME: &str = "document";

/// Declared format of a document, as understood by the inference service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Xlsx,
    Xls,
    Csv,
    Doc,
    Docx,
    Html,
    Txt,
    Md,
    /// Any other extension, stored lowercase without the leading dot
    Other(String),
}

impl DocumentFormat {
    /// Map a file extension (with or without leading dot, any case) to a format
    pub fn from_extension(extension: &str) -> Self {
        let ext = extension.trim_start_matches('.').to_ascii_lowercase();

        match ext.as_str() {
            "pdf" => Self::Pdf,
            "xlsx" => Self::Xlsx,
            "xls" => Self::Xls,
            "csv" => Self::Csv,
            "doc" => Self::Doc,
            "docx" => Self::Docx,
            "html" | "htm" => Self::Html,
            "txt" | "text" => Self::Txt,
            "md" | "markdown" => Self::Md,
            _ => Self::Other(ext),
        }
    }

    /// Detect the format from a path's extension
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or_else(|| Self::Other(String::new()))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Pdf => "pdf",
            Self::Xlsx => "xlsx",
            Self::Xls => "xls",
            Self::Csv => "csv",
            Self::Doc => "doc",
            Self::Docx => "docx",
            Self::Html => "html",
            Self::Txt => "txt",
            Self::Md => "md",
            Self::Other(ext) => ext,
        }
    }

    /// Plain-text formats that can be cut at arbitrary line boundaries
    pub fn is_line_oriented(&self) -> bool {
        matches!(self, Self::Txt | Self::Md | Self::Csv | Self::Html)
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file to process. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFile {
    path: PathBuf,
    name: String,
    format: DocumentFormat,
}

impl DocumentFile {
    /// Create a document with an explicit display name; the format comes from the path
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        let path = path.into();
        let format = DocumentFormat::from_path(&path);

        Self {
            path,
            name: name.into(),
            format,
        }
    }

    /// Create a document named after the path's file name
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self::new(path, name)
    }

    /// Override the detected format
    pub fn with_format(mut self, format: DocumentFormat) -> Self {
        self.format = format;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn format(&self) -> &DocumentFormat {
        &self.format
    }

    /// Display name restricted to the characters the inference service accepts
    pub fn sanitized_name(&self) -> String {
        sanitize_name(&self.name)
    }
}

/// Normalise a display name: `_` and `.` become spaces, anything outside
/// alphanumerics, whitespace, `-`, `()` and `[]` is dropped, runs of
/// whitespace collapse to one space.
pub fn sanitize_name(name: &str) -> String {
    let spaced = name.replace(['_', '.'], " ");
    let stripped = DISALLOWED_NAME_CHARS.replace_all(&spaced, "");
    let collapsed = WHITESPACE_RUNS.replace_all(&stripped, " ");
    let trimmed = collapsed.trim();

    if trimmed.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// The caller's question. Cheap to clone; never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question(Arc<str>);

impl Question {
    pub fn new(text: impl AsRef<str>) -> Self {
        Self(Arc::from(text.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Question {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Question {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
