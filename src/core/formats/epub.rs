// ShelfScan - core/formats/epub.rs
//
// `.epub` books via the `epub` crate. Title, author and description come
// from the package metadata; the cover is the manifest item the package
// declares as its cover. Body chunks are the block elements of each spine
// chapter, in spine order.

use super::{collapse_whitespace, html, sniff_cover, ParsedBook, TextParser};
use crate::core::model::{title_from_file_name, Author, Book, BookFormat};
use crate::util::error::ParseError;
use epub::doc::EpubDoc;
use scraper::Html;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

const FORMAT: &str = "EPUB";

fn open(path: &Path) -> Result<EpubDoc<BufReader<File>>, ParseError> {
    EpubDoc::new(path).map_err(|e| ParseError::Malformed {
        file: path.to_path_buf(),
        format: FORMAT,
        reason: e.to_string(),
    })
}

pub(super) fn read_book(path: &Path) -> Result<ParsedBook, ParseError> {
    let mut doc = open(path)?;

    let title = doc
        .mdata("title")
        .map(|m| collapse_whitespace(&m.value))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| title_from_file_name(path));
    let author = Author::from_metadata(doc.mdata("creator").map(|m| m.value.clone()));

    // Descriptions are frequently escaped XHTML.
    let description = doc
        .mdata("description")
        .map(|m| {
            let fragment = Html::parse_fragment(&m.value);
            collapse_whitespace(&fragment.root_element().text().collect::<String>())
        })
        .filter(|d| !d.is_empty());

    let cover = doc
        .get_cover()
        .and_then(|(data, mime)| sniff_cover(data, &mime));

    Ok((
        Book::unread(title, author, description, path.to_path_buf()),
        cover,
    ))
}

pub struct EpubParser;

impl TextParser for EpubParser {
    fn format(&self) -> BookFormat {
        BookFormat::Epub
    }

    fn extract_blocks(&self, path: &Path) -> Result<Vec<String>, ParseError> {
        let mut doc = open(path)?;
        let mut blocks = Vec::new();

        for chapter in 0..doc.get_num_chapters() {
            doc.set_current_chapter(chapter);
            let Some((content, _mime)) = doc.get_current_str() else {
                tracing::debug!(file = %path.display(), chapter, "Spine item unreadable, skipped");
                continue;
            };
            if content.trim().is_empty() {
                continue;
            }
            blocks.extend(html::document_blocks(&Html::parse_document(&content)));
        }

        Ok(blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::formats::FileParser;

    #[test]
    fn test_not_a_zip_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.epub");
        std::fs::write(&path, b"This is not an EPUB").unwrap();

        assert!(FileParser::Epub.parse(&path).is_none());
        assert!(EpubParser.parse(&path).error_message().is_some());
    }

    #[test]
    fn test_extension_mismatch_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();
        assert!(FileParser::Epub.parse(&path).is_none());
    }
}
