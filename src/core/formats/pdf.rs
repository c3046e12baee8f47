// ShelfScan - core/formats/pdf.rs
//
// `.pdf` books. `lopdf` validates the file and reads the document Info
// dictionary; `pdf-extract` produces the body text. No cover is produced:
// nothing in the stack renders PDF pages.

use super::{ParsedBook, TextParser};
use crate::core::model::{title_from_file_name, Author, Book, BookFormat};
use crate::platform::fs;
use crate::util::error::ParseError;
use lopdf::{Document, Object};
use std::path::Path;

const FORMAT: &str = "PDF";

fn malformed(path: &Path, reason: impl Into<String>) -> ParseError {
    ParseError::Malformed {
        file: path.to_path_buf(),
        format: FORMAT,
        reason: reason.into(),
    }
}

fn read(path: &Path) -> Result<Vec<u8>, ParseError> {
    fs::read_bytes(path).map_err(|source| ParseError::Io {
        file: path.to_path_buf(),
        source,
    })
}

pub(super) fn read_book(path: &Path) -> Result<ParsedBook, ParseError> {
    let bytes = read(path)?;
    let doc = Document::load_mem(&bytes).map_err(|e| malformed(path, e.to_string()))?;
    if doc.get_pages().is_empty() {
        return Err(malformed(path, "document has no pages"));
    }

    let info = info_string(&doc, b"Title");
    let title = info
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| title_from_file_name(path));
    let author = Author::from_metadata(info_string(&doc, b"Author"));
    let description = info_string(&doc, b"Subject").filter(|s| !s.is_empty());

    Ok((
        Book::unread(title, author, description, path.to_path_buf()),
        None,
    ))
}

/// A trimmed text entry from the trailer's Info dictionary.
fn info_string(doc: &Document, key: &[u8]) -> Option<String> {
    let info = match doc.trailer.get(b"Info").ok()? {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        direct => direct,
    };
    let Object::Dictionary(dict) = info else {
        return None;
    };
    match dict.get(key).ok()? {
        Object::String(bytes, _) => Some(decode_pdf_string(bytes).trim().to_string()),
        _ => None,
    }
}

/// PDF text strings are UTF-16BE when they carry a BOM, PDFDocEncoding
/// (close enough to Latin-1) otherwise.
fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let (text, _) = encoding_rs::UTF_16BE.decode_without_bom_handling(rest);
        return text.into_owned();
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Split extracted text into paragraphs: pages on form feeds, then
/// paragraphs on blank lines, with hard line breaks joined.
pub(crate) fn split_extracted_text(text: &str) -> Vec<String> {
    text.split('\x0C')
        .flat_map(|page| page.split("\n\n"))
        .map(|para| {
            para.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|p| !p.is_empty())
        .collect()
}

pub struct PdfParser;

impl TextParser for PdfParser {
    fn format(&self) -> BookFormat {
        BookFormat::Pdf
    }

    fn extract_blocks(&self, path: &Path) -> Result<Vec<String>, ParseError> {
        let bytes = read(path)?;
        let text =
            pdf_extract::extract_text_from_mem(&bytes).map_err(|e| malformed(path, e.to_string()))?;
        Ok(split_extracted_text(&text))
    }
}
