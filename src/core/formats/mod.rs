// ShelfScan - core/formats/mod.rs
//
// Format handlers. A closed set of parsers is tried in a fixed order; each
// one either claims a file or answers "not mine".
//
// Failure policy at this boundary:
//   - Extension mismatch, missing or unreadable file: `None`, silently.
//   - Recognised but malformed content: logged, then `None`.
//   - A panic inside a third-party decoder is caught here and treated as
//     malformed content, so one bad file never takes a batch down.

pub mod epub;
pub mod html;
pub mod pdf;
pub mod plain_text;

use crate::core::model::{number_chunks, Book, BookFormat, CoverFormat, CoverImage, StringWithId};
use crate::core::resource::Resource;
use crate::platform::fs;
use crate::util::constants;
use crate::util::error::ParseError;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

/// A parsed book together with the cover extracted for it.
pub type ParsedBook = (Book, Option<CoverImage>);

// =============================================================================
// TextParser
// =============================================================================

/// Converts a file already known to be of one format into body chunks.
pub trait TextParser: Send + Sync {
    /// The format this parser reads.
    fn format(&self) -> BookFormat;

    /// Ordered block texts of the document. Empty documents yield an empty vec.
    fn extract_blocks(&self, path: &Path) -> Result<Vec<String>, ParseError>;

    /// Parse into id-stamped chunks. Never panics; every failure becomes
    /// `Resource::Error`.
    fn parse(&self, path: &Path) -> Resource<Vec<StringWithId>> {
        match guarded(path, || self.extract_blocks(path)) {
            Ok(blocks) => {
                tracing::debug!(
                    file = %path.display(),
                    format = %self.format(),
                    chunks = blocks.len(),
                    first = %preview(blocks.first().map(String::as_str).unwrap_or("")),
                    "Text extracted"
                );
                Resource::Success(number_chunks(blocks))
            }
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "Text extraction failed");
                Resource::Error(e.to_string())
            }
        }
    }
}

fn preview(text: &str) -> String {
    text.chars().take(constants::DEBUG_MAX_TEXT_PREVIEW).collect()
}

/// Look up the text parser for a file by its extension.
pub fn text_parser_for(path: &Path) -> Option<&'static dyn TextParser> {
    BookFormat::from_path(path).map(|format| FileParser::for_format(format).text_parser())
}

// =============================================================================
// FileParser
// =============================================================================

/// One variant per supported format, tried in `FileParser::ORDER`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileParser {
    PlainText,
    Html,
    Epub,
    Pdf,
}

impl FileParser {
    /// Trial order used by ingestion. Formats are disjoint by extension, so at
    /// most one variant claims a file; first match wins regardless.
    pub const ORDER: [FileParser; 4] = [
        FileParser::PlainText,
        FileParser::Html,
        FileParser::Epub,
        FileParser::Pdf,
    ];

    pub fn for_format(format: BookFormat) -> Self {
        match format {
            BookFormat::PlainText => FileParser::PlainText,
            BookFormat::Html => FileParser::Html,
            BookFormat::Epub => FileParser::Epub,
            BookFormat::Pdf => FileParser::Pdf,
        }
    }

    pub fn format(&self) -> BookFormat {
        match self {
            FileParser::PlainText => BookFormat::PlainText,
            FileParser::Html => BookFormat::Html,
            FileParser::Epub => BookFormat::Epub,
            FileParser::Pdf => BookFormat::Pdf,
        }
    }

    pub fn text_parser(&self) -> &'static dyn TextParser {
        match self {
            FileParser::PlainText => &plain_text::PlainTextParser,
            FileParser::Html => &html::HtmlParser,
            FileParser::Epub => &epub::EpubParser,
            FileParser::Pdf => &pdf::PdfParser,
        }
    }

    /// Parse `path` into a book, or `None` when the file is not this
    /// variant's, is unreadable, or is malformed.
    pub fn parse(&self, path: &Path) -> Option<ParsedBook> {
        if !self.format().matches_path(path) {
            return None;
        }
        if !fs::is_readable_file(path) {
            tracing::debug!(file = %path.display(), "Missing or unreadable, skipped");
            return None;
        }

        let result = guarded(path, || match self {
            FileParser::PlainText => plain_text::read_book(path),
            FileParser::Html => html::read_book(path),
            FileParser::Epub => epub::read_book(path),
            FileParser::Pdf => pdf::read_book(path),
        });

        match result {
            Ok(parsed) => {
                tracing::debug!(
                    file = %path.display(),
                    format = %self.format(),
                    title = %parsed.0.title,
                    has_cover = parsed.1.is_some(),
                    "Book parsed"
                );
                Some(parsed)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Malformed book file skipped");
                None
            }
        }
    }
}

/// Try every parser in order; the first that claims the file wins.
pub fn parse_book(path: &Path) -> Option<ParsedBook> {
    FileParser::ORDER.iter().find_map(|parser| parser.parse(path))
}

// =============================================================================
// Shared helpers
// =============================================================================

/// Run `f`, converting a panic into `ParseError::Panicked`.
pub(crate) fn guarded<T, F>(path: &Path, f: F) -> Result<T, ParseError>
where
    F: FnOnce() -> Result<T, ParseError>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(ParseError::Panicked {
                file: path.to_path_buf(),
                message,
            })
        }
    }
}

/// Tag raw cover bytes with the format sniffed from their magic number.
///
/// Falls back to the MIME type the container declared when the bytes are not
/// a format `image` recognises; returns `None` for empty or non-image data.
pub(crate) fn sniff_cover(data: Vec<u8>, declared_mime: &str) -> Option<CoverImage> {
    if data.is_empty() {
        return None;
    }
    let format = match image::guess_format(&data) {
        Ok(image::ImageFormat::Png) => CoverFormat::Png,
        Ok(image::ImageFormat::Jpeg) => CoverFormat::Jpeg,
        Ok(image::ImageFormat::Gif) => CoverFormat::Gif,
        Ok(image::ImageFormat::WebP) => CoverFormat::Webp,
        Ok(image::ImageFormat::Bmp) => CoverFormat::Bmp,
        Ok(other) => CoverFormat::Other(other.to_mime_type().to_string()),
        Err(_) if declared_mime.starts_with("image/") => {
            CoverFormat::Other(declared_mime.to_string())
        }
        Err(_) => return None,
    };
    Some(CoverImage { format, data })
}

fn whitespace_regex() -> &'static regex::Regex {
    static RE: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r"\s+").expect("static regex"))
}

/// Collapse runs of whitespace to single spaces and trim.
pub(crate) fn collapse_whitespace(text: &str) -> String {
    whitespace_regex().replace_all(text.trim(), " ").into_owned()
}
