// ShelfScan - tests/common/mod.rs
//
// Fixture helpers shared by the end-to-end tests. Binary formats are built
// on the fly so the fixtures always match what the parsers expect.

#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Absolute path to an on-disk fixture file.
pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Copy a checked-in fixture into `dir` under `name`.
pub fn copy_fixture(fixture_name: &str, dir: &Path, name: &str) -> PathBuf {
    let dest = dir.join(name);
    std::fs::copy(fixture(fixture_name), &dest).expect("copy fixture");
    dest
}

/// 1x1 PNG.
pub const COVER_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

const CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

const CONTENT_OPF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="2.0" unique-identifier="bookid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:opf="http://www.idpf.org/2007/opf">
    <dc:title>Moby Dick</dc:title>
    <dc:creator opf:role="aut">Herman Melville</dc:creator>
    <dc:description>&lt;p&gt;A whale of a tale.&lt;/p&gt;</dc:description>
    <dc:identifier id="bookid">urn:uuid:0f6b7c2e-1a7e-4a55-9d7e-3c1e5b0f9a11</dc:identifier>
    <dc:language>en</dc:language>
    <meta name="cover" content="cover-img"/>
  </metadata>
  <manifest>
    <item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>
    <item id="ch1" href="ch1.xhtml" media-type="application/xhtml+xml"/>
    <item id="ch2" href="ch2.xhtml" media-type="application/xhtml+xml"/>
    <item id="cover-img" href="cover.png" media-type="image/png"/>
  </manifest>
  <spine toc="ncx">
    <itemref idref="ch1"/>
    <itemref idref="ch2"/>
  </spine>
</package>"#;

const TOC_NCX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head><meta name="dtb:uid" content="urn:uuid:0f6b7c2e-1a7e-4a55-9d7e-3c1e5b0f9a11"/></head>
  <docTitle><text>Moby Dick</text></docTitle>
  <navMap>
    <navPoint id="np1" playOrder="1"><navLabel><text>Loomings</text></navLabel><content src="ch1.xhtml"/></navPoint>
    <navPoint id="np2" playOrder="2"><navLabel><text>The Carpet-Bag</text></navLabel><content src="ch2.xhtml"/></navPoint>
  </navMap>
</ncx>"#;

const CHAPTER_1: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml"><head><title>Loomings</title></head>
<body>
  <h1>Loomings</h1>
  <p>Call me Ishmael.</p>
  <p>Some years ago, never mind how long precisely, I thought I would sail about a little.</p>
</body></html>"#;

const CHAPTER_2: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml"><head><title>The Carpet-Bag</title></head>
<body>
  <h1>The Carpet-Bag</h1>
  <p>I stuffed a shirt or two into my old carpet-bag.</p>
</body></html>"#;

/// Write a small EPUB 2 book with two chapters and a PNG cover.
pub fn write_epub(path: &Path) {
    let file = std::fs::File::create(path).expect("create epub");
    let mut zip = zip::ZipWriter::new(file);
    let stored = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Stored);
    let deflated = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    // `mimetype` must be first and uncompressed.
    zip.start_file("mimetype", stored).unwrap();
    zip.write_all(b"application/epub+zip").unwrap();

    let entries: [(&str, &[u8]); 6] = [
        ("META-INF/container.xml", CONTAINER_XML.as_bytes()),
        ("OEBPS/content.opf", CONTENT_OPF.as_bytes()),
        ("OEBPS/toc.ncx", TOC_NCX.as_bytes()),
        ("OEBPS/ch1.xhtml", CHAPTER_1.as_bytes()),
        ("OEBPS/ch2.xhtml", CHAPTER_2.as_bytes()),
        ("OEBPS/cover.png", COVER_PNG),
    ];
    for (name, data) in entries {
        zip.start_file(name, deflated).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap();
}

/// Write a one-page PDF with an Info dictionary.
pub fn write_pdf(path: &Path, title: &str, author: &str) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 24.into()]),
            Operation::new("Td", vec![72.into(), 720.into()]),
            Operation::new("Tj", vec![Object::string_literal("Call me Ishmael.")]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(title),
        "Author" => Object::string_literal(author),
    });
    doc.trailer.set("Info", info_id);
    doc.save(path).expect("save pdf");
}

/// Write bytes that carry the format's extension but are not a valid file
/// of that format.
pub fn write_corrupt(path: &Path) {
    let bytes: &[u8] = match path.extension().and_then(|e| e.to_str()) {
        Some("epub") => b"PK\x03\x04 truncated zip header",
        Some("pdf") => b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog",
        _ => b"\xff\xfe\x00garbage",
    };
    std::fs::write(path, bytes).expect("write corrupt fixture");
}
