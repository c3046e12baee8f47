// ShelfScan - tests/e2e_discovery.rs
//
// End-to-end tests for candidate discovery and format parsing.
//
// These run against the real filesystem with real EPUB/PDF/HTML/TXT files;
// no mocks, no stubs. They cover the path from a file in the downloads
// folder to a `Book` with its metadata and text chunks.

mod common;

use common::{copy_fixture, write_corrupt, write_epub, write_pdf, COVER_PNG};
use shelfscan::core::discovery::{discover_candidates, DiscoveryConfig, ScanRoots};
use shelfscan::core::formats::{parse_book, text_parser_for, FileParser};
use shelfscan::core::model::{Author, BookFormat, Category, CoverFormat};
use shelfscan::core::resource::Resource;
use std::path::PathBuf;
use tempfile::TempDir;

/// A downloads folder holding one well-formed book of every format.
fn downloads() -> (TempDir, Vec<PathBuf>) {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    let txt = copy_fixture("sample.txt", root, "voyage.txt");
    let html = copy_fixture("sample.html", root, "garden-party.html");
    let epub = root.join("moby-dick.epub");
    write_epub(&epub);
    let pdf = root.join("Moby Dick Print.PDF");
    write_pdf(&pdf, "Moby-Dick; or, The Whale", "Herman Melville");
    std::fs::write(root.join("invoice.docx"), b"not a book").unwrap();
    (dir, vec![txt, html, epub, pdf])
}

// =============================================================================
// Discovery E2E
// =============================================================================

#[test]
fn e2e_empty_query_finds_every_supported_file() {
    let (dir, _) = downloads();
    let files = discover_candidates(
        &ScanRoots::single(dir.path()),
        "",
        &DiscoveryConfig::default(),
    )
    .unwrap();

    let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "garden-party.html",
            "Moby Dick Print.PDF",
            "moby-dick.epub",
            "voyage.txt"
        ]
    );
}

#[test]
fn e2e_query_returns_exactly_the_substring_matches() {
    let (dir, _) = downloads();
    let roots = ScanRoots::single(dir.path());
    let config = DiscoveryConfig::default();

    let files = discover_candidates(&roots, "mOBy", &config).unwrap();
    let formats: Vec<_> = files.iter().map(|f| f.format).collect();
    assert_eq!(formats, vec![BookFormat::Pdf, BookFormat::Epub]);

    assert!(discover_candidates(&roots, "docx", &config).unwrap().is_empty());
}

// =============================================================================
// FileParser E2E
// =============================================================================

#[test]
fn e2e_every_format_yields_a_default_book() {
    let (_dir, paths) = downloads();
    for path in &paths {
        let (book, _) = parse_book(path).unwrap_or_else(|| panic!("{} not parsed", path.display()));
        assert_eq!(&book.file_path, path);
        assert_eq!(book.category, Category::Uncategorized);
        assert_eq!(book.progress, 0.0);
        assert!(book.last_opened.is_none());
        assert!(book.text_path.is_empty());
    }
}

#[test]
fn e2e_epub_metadata_and_cover() {
    let (_dir, paths) = downloads();
    let (book, cover) = FileParser::Epub.parse(&paths[2]).expect("epub parsed");

    assert_eq!(book.title, "Moby Dick");
    assert_eq!(book.author, Author::Text("Herman Melville".into()));
    assert_eq!(book.description.as_deref(), Some("A whale of a tale."));

    let cover = cover.expect("cover extracted");
    assert_eq!(cover.format, CoverFormat::Png);
    assert_eq!(cover.data, COVER_PNG);
}

#[test]
fn e2e_pdf_info_metadata() {
    let (_dir, paths) = downloads();
    let (book, cover) = FileParser::Pdf.parse(&paths[3]).expect("pdf parsed");
    assert_eq!(book.title, "Moby-Dick; or, The Whale");
    assert_eq!(book.author, Author::Text("Herman Melville".into()));
    assert!(cover.is_none());
}

#[test]
fn e2e_html_and_txt_metadata() {
    let (_dir, paths) = downloads();

    let (txt, _) = FileParser::PlainText.parse(&paths[0]).unwrap();
    assert_eq!(txt.title, "voyage");
    assert_eq!(txt.author, Author::Unknown);

    let (html, _) = FileParser::Html.parse(&paths[1]).unwrap();
    assert_eq!(html.title, "The Garden Party");
    assert_eq!(html.author, Author::Text("Katherine Mansfield".into()));
}

#[test]
fn e2e_every_variant_rejects_other_formats() {
    let (_dir, paths) = downloads();
    for parser in FileParser::ORDER {
        for path in &paths {
            let own = parser.format().matches_path(path);
            assert_eq!(
                parser.parse(path).is_some(),
                own,
                "{parser:?} on {}",
                path.display()
            );
        }
    }
}

#[test]
fn e2e_corrupt_files_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    for (parser, name) in [(FileParser::Epub, "broken.epub"), (FileParser::Pdf, "broken.pdf")] {
        let path = dir.path().join(name);
        write_corrupt(&path);
        assert!(parser.parse(&path).is_none(), "{name} should be rejected");
        assert!(parse_book(&path).is_none());
    }
}

#[test]
fn e2e_missing_file_is_not_mine() {
    for parser in FileParser::ORDER {
        let ext = parser.format().extensions()[0];
        let path = PathBuf::from(format!("/nonexistent/shelfscan/book.{ext}"));
        assert!(parser.parse(&path).is_none());
    }
}

// =============================================================================
// TextParser E2E
// =============================================================================

#[test]
fn e2e_text_chunks_are_stable_and_contiguous() {
    let (_dir, paths) = downloads();
    for path in &paths[..3] {
        let parser = text_parser_for(path).expect("parser");
        let first = parser.parse(path);
        let second = parser.parse(path);
        assert_eq!(first, second, "{}", path.display());

        let chunks = first.into_data().expect("success");
        assert!(!chunks.is_empty());
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.id, i as u64);
            assert!(!chunk.text.trim().is_empty());
        }
    }
}

#[test]
fn e2e_epub_text_spans_chapters_in_spine_order() {
    let (_dir, paths) = downloads();
    let chunks = text_parser_for(&paths[2])
        .unwrap()
        .parse(&paths[2])
        .into_data()
        .unwrap();
    let texts: Vec<_> = chunks.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts[0], "Loomings");
    assert_eq!(texts[1], "Call me Ishmael.");
    assert_eq!(texts[3], "The Carpet-Bag");
    assert_eq!(texts.len(), 5);
}

#[test]
fn e2e_txt_paragraphs() {
    let (_dir, paths) = downloads();
    let chunks = text_parser_for(&paths[0])
        .unwrap()
        .parse(&paths[0])
        .into_data()
        .unwrap();
    let texts: Vec<_> = chunks.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(
        texts,
        vec![
            "The Voyage Out",
            "It was a bright cold morning when the ship left harbour, and the gulls followed it far beyond the breakwater.",
            "Nobody on deck spoke of the weather.",
            "The end.",
        ]
    );
}

#[test]
fn e2e_pdf_text_is_extracted() {
    let (_dir, paths) = downloads();
    let result = text_parser_for(&paths[3]).unwrap().parse(&paths[3]);
    let chunks = result.into_data().expect("pdf text");
    let joined: String = chunks.iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join(" ");
    assert!(joined.contains("Ishmael"), "got {joined:?}");
}

#[test]
fn e2e_corrupt_text_parse_is_error_not_panic() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.epub");
    write_corrupt(&path);
    let result = text_parser_for(&path).unwrap().parse(&path);
    assert!(matches!(result, Resource::Error(_)));
}
