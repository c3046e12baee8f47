// ShelfScan - app/text.rs
//
// Streams a book's body chunks from a background thread.

use crate::core::formats;
use crate::core::model::StringWithId;
use crate::core::resource::Resource;
use crate::util::error::ParseError;
use std::path::PathBuf;
use std::sync::mpsc;

/// Parse `path` into text chunks off the caller's thread.
///
/// Sends `Loading(true)`, then `Success(chunks)` or `Error(cause)`. A file
/// with an unsupported extension resolves to `Error` without spawning.
pub fn stream_text(path: PathBuf) -> mpsc::Receiver<Resource<Vec<StringWithId>>> {
    let (tx, rx) = mpsc::channel();
    let _ = tx.send(Resource::Loading(true));

    let Some(parser) = formats::text_parser_for(&path) else {
        let _ = tx.send(Resource::Error(
            ParseError::UnsupportedFormat { file: path }.to_string(),
        ));
        return rx;
    };

    std::thread::spawn(move || {
        let _ = tx.send(parser.parse(&path));
    });
    rx
}
