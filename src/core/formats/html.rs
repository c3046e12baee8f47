// ShelfScan - core/formats/html.rs
//
// `.html` / `.htm` books. Metadata comes from `<title>` and the `author` and
// `description` meta tags. The body is split into block elements, with loose
// text between them kept as chunks of its own.

use super::{collapse_whitespace, ParsedBook, TextParser};
use crate::core::model::{title_from_file_name, Author, Book, BookFormat};
use crate::platform::fs;
use crate::util::error::ParseError;
use scraper::{ElementRef, Html, Node, Selector};
use std::path::Path;

const BLOCK_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6", "p", "li", "blockquote", "pre"];

/// Phrasing elements whose text joins the surrounding run.
const INLINE_TAGS: &[&str] = &[
    "a", "abbr", "b", "bdi", "bdo", "cite", "code", "data", "del", "dfn", "em", "font", "i",
    "ins", "kbd", "mark", "q", "s", "samp", "small", "span", "strong", "sub", "sup", "time",
    "u", "var", "wbr",
];

const SKIPPED_TAGS: &[&str] = &["head", "script", "style", "noscript", "template", "title"];

fn selector(css: &str) -> Selector {
    // Only called with the literal selectors below.
    Selector::parse(css).expect("static selector")
}

pub(super) fn read_book(path: &Path) -> Result<ParsedBook, ParseError> {
    let source = fs::read_text(path).map_err(|source| ParseError::Io {
        file: path.to_path_buf(),
        source,
    })?;
    let document = Html::parse_document(&source);

    let title = document
        .select(&selector("title"))
        .next()
        .map(|t| collapse_whitespace(&t.text().collect::<String>()))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| title_from_file_name(path));

    let author = Author::from_metadata(meta_content(&document, "author"));
    let description = meta_content(&document, "description").filter(|d| !d.trim().is_empty());

    Ok((
        Book::unread(title, author, description, path.to_path_buf()),
        None,
    ))
}

fn meta_content(document: &Html, name: &str) -> Option<String> {
    document
        .select(&selector("meta[name][content]"))
        .find(|m| {
            m.value()
                .attr("name")
                .is_some_and(|n| n.eq_ignore_ascii_case(name))
        })
        .and_then(|m| m.value().attr("content"))
        .map(|c| c.trim().to_string())
}

/// Ordered body texts of a parsed document.
///
/// Each block element becomes one chunk; nested blocks (a `<p>` inside a
/// `<blockquote>`) are emitted once, as part of the outermost block. Text
/// outside any block is gathered into runs, split wherever a container such
/// as `<div>` or `<td>` opens or closes, so no body text is dropped.
pub(crate) fn document_blocks(document: &Html) -> Vec<String> {
    let root = document
        .select(&selector("body"))
        .next()
        .unwrap_or_else(|| document.root_element());

    let mut collector = BlockCollector::default();
    collector.visit(root);
    collector.flush();
    collector.blocks
}

#[derive(Default)]
struct BlockCollector {
    blocks: Vec<String>,
    /// Loose text since the last boundary.
    pending: String,
}

impl BlockCollector {
    fn flush(&mut self) {
        let text = collapse_whitespace(&self.pending);
        self.pending.clear();
        if !text.is_empty() {
            self.blocks.push(text);
        }
    }

    fn visit(&mut self, element: ElementRef<'_>) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => self.pending.push_str(text),
                Node::Element(el) => {
                    let name = el.name();
                    let Some(child) = ElementRef::wrap(child) else {
                        continue;
                    };
                    if SKIPPED_TAGS.contains(&name) {
                        continue;
                    }
                    if name == "br" {
                        self.pending.push(' ');
                    } else if BLOCK_TAGS.contains(&name) {
                        self.flush();
                        self.pending.extend(child.text());
                        self.flush();
                    } else if INLINE_TAGS.contains(&name) {
                        self.visit(child);
                    } else {
                        self.flush();
                        self.visit(child);
                        self.flush();
                    }
                }
                _ => {}
            }
        }
    }
}

pub struct HtmlParser;

impl TextParser for HtmlParser {
    fn format(&self) -> BookFormat {
        BookFormat::Html
    }

    fn extract_blocks(&self, path: &Path) -> Result<Vec<String>, ParseError> {
        let source = fs::read_text(path).map_err(|source| ParseError::Io {
            file: path.to_path_buf(),
            source,
        })?;
        Ok(document_blocks(&Html::parse_document(&source)))
    }
}
