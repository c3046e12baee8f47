// ShelfScan - core/model.rs
//
// Core data model types. Pure data definitions with no I/O.
//
// These types are the shared vocabulary across all layers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// =============================================================================
// Book format
// =============================================================================

/// The closed set of formats ShelfScan can ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookFormat {
    PlainText,
    Html,
    Epub,
    Pdf,
}

impl BookFormat {
    /// Returns all variants in parser trial order.
    pub fn all() -> &'static [BookFormat] {
        &[
            BookFormat::PlainText,
            BookFormat::Html,
            BookFormat::Epub,
            BookFormat::Pdf,
        ]
    }

    /// Lower-case extensions (no dot) belonging to this format.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            BookFormat::PlainText => &["txt"],
            BookFormat::Html => &["html", "htm"],
            BookFormat::Epub => &["epub"],
            BookFormat::Pdf => &["pdf"],
        }
    }

    /// Human-readable label for display and error messages.
    pub fn label(&self) -> &'static str {
        match self {
            BookFormat::PlainText => "TXT",
            BookFormat::Html => "HTML",
            BookFormat::Epub => "EPUB",
            BookFormat::Pdf => "PDF",
        }
    }

    /// Map an extension (with or without a leading dot) case-insensitively.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|format| format.extensions().contains(&ext.as_str()))
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// True when `path` carries one of this format's extensions.
    pub fn matches_path(&self, path: &Path) -> bool {
        Self::from_path(path) == Some(*self)
    }
}

impl std::fmt::Display for BookFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Book
// =============================================================================

/// Who wrote a book: free text from the file's metadata, or the localized
/// "unknown author" placeholder that the presentation layer resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Author {
    Text(String),
    #[default]
    Unknown,
}

impl Author {
    /// Build from optional metadata; blank values become `Unknown`.
    pub fn from_metadata(value: Option<String>) -> Self {
        match value.map(|v| v.trim().to_string()) {
            Some(v) if !v.is_empty() => Author::Text(v),
            _ => Author::Unknown,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Author::Text(s) => Some(s),
            Author::Unknown => None,
        }
    }
}

impl std::fmt::Display for Author {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Author::Text(s) => f.write_str(s),
            Author::Unknown => f.write_str("Unknown author"),
        }
    }
}

/// Library bucket. Ordinal 0 is where freshly ingested books land.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[default]
    Uncategorized,
    Reading,
    AlreadyRead,
    Planning,
    Dropped,
}

impl Category {
    pub fn all() -> &'static [Category] {
        &[
            Category::Uncategorized,
            Category::Reading,
            Category::AlreadyRead,
            Category::Planning,
            Category::Dropped,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Uncategorized => "Uncategorized",
            Category::Reading => "Reading",
            Category::AlreadyRead => "Already read",
            Category::Planning => "Planning",
            Category::Dropped => "Dropped",
        }
    }
}

/// Image container format of an extracted cover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverFormat {
    Png,
    Jpeg,
    Gif,
    Webp,
    Bmp,
    /// Anything else, tagged with the MIME type the source declared.
    Other(String),
}

impl CoverFormat {
    /// File extension used when the cover is written to disk.
    pub fn extension(&self) -> &str {
        match self {
            CoverFormat::Png => "png",
            CoverFormat::Jpeg => "jpg",
            CoverFormat::Gif => "gif",
            CoverFormat::Webp => "webp",
            CoverFormat::Bmp => "bmp",
            CoverFormat::Other(_) => "bin",
        }
    }
}

/// Cover image bytes extracted from a book file.
#[derive(Clone, PartialEq, Eq)]
pub struct CoverImage {
    pub format: CoverFormat,
    pub data: Vec<u8>,
}

impl std::fmt::Debug for CoverImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoverImage")
            .field("format", &self.format)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// A book normalised from any supported format.
///
/// `file_path` is the natural key: two books with the same path describe the
/// same source file.
#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    pub title: String,
    pub author: Author,
    pub description: Option<String>,

    /// Handle to the resolved body content. Empty until a reader resolves it.
    pub text_path: String,

    pub scroll_index: i64,
    pub scroll_offset: i64,

    /// Reading progress in `[0, 1]`. Transported, never computed here.
    pub progress: f32,

    pub file_path: PathBuf,
    pub last_opened: Option<DateTime<Utc>>,
    pub category: Category,
    pub cover_image: Option<CoverImage>,
}

impl Book {
    /// A never-opened book as produced by a file parser.
    pub fn unread(
        title: String,
        author: Author,
        description: Option<String>,
        file_path: PathBuf,
    ) -> Self {
        Self {
            title,
            author,
            description,
            text_path: String::new(),
            scroll_index: 0,
            scroll_offset: 0,
            progress: 0.0,
            file_path,
            last_opened: None,
            category: Category::default(),
            cover_image: None,
        }
    }
}

/// Title fallback: the file name without extension, trimmed.
pub fn title_from_file_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().trim().to_string())
        .unwrap_or_default()
}

// =============================================================================
// Text chunks
// =============================================================================

/// One body chunk with an id that is stable across re-parses of the same
/// unmodified file. Ids run 0..n-1 in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringWithId {
    pub id: u64,
    pub text: String,
}

/// Number blocks in document order.
pub fn number_chunks(blocks: Vec<String>) -> Vec<StringWithId> {
    blocks
        .into_iter()
        .enumerate()
        .map(|(id, text)| StringWithId {
            id: id as u64,
            text,
        })
        .collect()
}

// =============================================================================
// Candidate file (output of discovery)
// =============================================================================

/// A file found in the scan root that has a supported extension but has not
/// been parsed yet.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateFile {
    /// Full path to the file.
    pub path: PathBuf,

    /// File name including extension.
    pub name: String,

    /// Format implied by the extension.
    pub format: BookFormat,

    /// File size in bytes.
    pub size: u64,

    /// Last modification timestamp.
    pub modified: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension_is_case_insensitive() {
        assert_eq!(BookFormat::from_extension("TXT"), Some(BookFormat::PlainText));
        assert_eq!(BookFormat::from_extension(".Htm"), Some(BookFormat::Html));
        assert_eq!(BookFormat::from_extension("ePub"), Some(BookFormat::Epub));
        assert_eq!(BookFormat::from_extension("pdf"), Some(BookFormat::Pdf));
        assert_eq!(BookFormat::from_extension("xyz"), None);
        assert_eq!(BookFormat::from_path(Path::new("/tmp/noext")), None);
    }

    #[test]
    fn test_unread_book_defaults() {
        let book = Book::unread(
            "Dune".to_string(),
            Author::Unknown,
            None,
            PathBuf::from("/books/dune.txt"),
        );
        assert_eq!(book.scroll_index, 0);
        assert_eq!(book.scroll_offset, 0);
        assert_eq!(book.progress, 0.0);
        assert!(book.last_opened.is_none());
        assert!(book.text_path.is_empty());
        assert_eq!(book.category, Category::Uncategorized);
        assert_eq!(book.category, Category::all()[0]);
    }

    #[test]
    fn test_title_from_file_name_trims() {
        assert_eq!(
            title_from_file_name(Path::new("/d/  War and Peace .txt")),
            "War and Peace"
        );
    }

    #[test]
    fn test_author_from_blank_metadata_is_unknown() {
        assert_eq!(Author::from_metadata(Some("   ".into())), Author::Unknown);
        assert_eq!(Author::from_metadata(None), Author::Unknown);
        assert_eq!(
            Author::from_metadata(Some(" Ursula K. Le Guin ".into())),
            Author::Text("Ursula K. Le Guin".into())
        );
    }

    #[test]
    fn test_number_chunks_contiguous_from_zero() {
        let chunks = number_chunks(vec!["a".into(), "b".into(), "c".into()]);
        let ids: Vec<u64> = chunks.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }
}
