// ShelfScan - platform/fs.rs
//
// File reading helpers shared by the format parsers.
//
//   - Small files are read in one call, retrying transient I/O errors with
//     capped backoff.
//   - Files above LARGE_FILE_THRESHOLD are memory-mapped and copied once.
//   - Text is decoded by BOM first, then by charset detection, so legacy
//     single-byte and CJK encodings load instead of failing.

use crate::util::constants::{LARGE_FILE_THRESHOLD, MAX_READ_RETRIES, READ_RETRY_DELAYS_MS};
use chardetng::EncodingDetector;
use std::io;
use std::path::Path;
use std::time::Duration;

/// Read the whole file as bytes.
pub fn read_bytes(path: &Path) -> io::Result<Vec<u8>> {
    let len = std::fs::metadata(path)?.len();
    if len >= LARGE_FILE_THRESHOLD {
        read_large_file(path)
    } else {
        read_small_file_with_retry(path)
    }
}

/// Returns true when `path` exists and can be opened for reading.
pub fn is_readable_file(path: &Path) -> bool {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => std::fs::File::open(path).is_ok(),
        _ => false,
    }
}

/// Read using `memmap2` so the kernel pages the file in instead of a
/// growing heap buffer.
fn read_large_file(path: &Path) -> io::Result<Vec<u8>> {
    let file = std::fs::File::open(path)?;
    // SAFETY: the map is read-only and dropped before returning. A concurrent
    // truncation of the file by another process is the documented risk.
    let mmap = unsafe { memmap2::Mmap::map(&file)? };
    Ok(mmap.to_vec())
}

fn read_small_file_with_retry(path: &Path) -> io::Result<Vec<u8>> {
    let mut last_err: Option<io::Error> = None;

    for attempt in 0..MAX_READ_RETRIES {
        match std::fs::read(path) {
            Ok(content) => return Ok(content),
            Err(e) if is_transient_error(&e) => {
                tracing::debug!(
                    file = %path.display(),
                    attempt = attempt + 1,
                    error = %e,
                    "Transient I/O error, retrying"
                );
                std::thread::sleep(Duration::from_millis(
                    READ_RETRY_DELAYS_MS[attempt as usize],
                ));
                last_err = Some(e);
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_err.unwrap_or_else(|| io::Error::other("Unknown read error")))
}

fn is_transient_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted | io::ErrorKind::TimedOut
    )
}

/// Decode text bytes of unknown encoding.
///
/// Returns the decoded text and the name of the encoding used.
pub fn decode_text(bytes: &[u8]) -> (String, &'static str) {
    if let Some((encoding, bom_len)) = encoding_rs::Encoding::for_bom(bytes) {
        let (text, had_errors) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        if had_errors {
            tracing::debug!(encoding = encoding.name(), "Replacement characters after BOM decode");
        }
        return (text.into_owned(), encoding.name());
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        return (text.to_string(), encoding_rs::UTF_8.name());
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding = detector.guess(None, true);
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::debug!(encoding = encoding.name(), "Replacement characters after detected decode");
    }
    (text.into_owned(), encoding.name())
}

/// Read a file and decode it as text.
pub fn read_text(path: &Path) -> io::Result<String> {
    let bytes = read_bytes(path)?;
    let (text, encoding) = decode_text(&bytes);
    tracing::trace!(file = %path.display(), encoding, "Decoded text file");
    Ok(text)
}
