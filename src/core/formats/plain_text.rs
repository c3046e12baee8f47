// ShelfScan - core/formats/plain_text.rs
//
// Plain `.txt` books. There is no metadata to read, so the title is the file
// name and the author is unknown. Body text is split into paragraphs on blank
// lines; files with no blank lines fall back to one chunk per line.

use super::{collapse_whitespace, ParsedBook, TextParser};
use crate::core::model::{title_from_file_name, Author, Book, BookFormat};
use crate::platform::fs;
use crate::util::error::ParseError;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

fn blank_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n[ \t]*\n").expect("static regex"))
}

pub(super) fn read_book(path: &Path) -> Result<ParsedBook, ParseError> {
    let book = Book::unread(
        title_from_file_name(path),
        Author::Unknown,
        None,
        path.to_path_buf(),
    );
    Ok((book, None))
}

/// Split decoded text into paragraph blocks.
pub(crate) fn split_paragraphs(text: &str) -> Vec<String> {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");

    if blank_line_regex().is_match(&text) {
        blank_line_regex()
            .split(&text)
            .map(collapse_whitespace)
            .filter(|p| !p.is_empty())
            .collect()
    } else {
        text.lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect()
    }
}

pub struct PlainTextParser;

impl TextParser for PlainTextParser {
    fn format(&self) -> BookFormat {
        BookFormat::PlainText
    }

    fn extract_blocks(&self, path: &Path) -> Result<Vec<String>, ParseError> {
        let text = fs::read_text(path).map_err(|source| ParseError::Io {
            file: path.to_path_buf(),
            source,
        })?;
        Ok(split_paragraphs(&text))
    }
}
