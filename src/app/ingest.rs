// ShelfScan - app/ingest.rs
//
// Book ingestion: fan the selected files out over a bounded rayon pool, run
// each through the parser chain, and join before emitting the batch.
//
//   - Files no parser accepts are dropped from the batch (logged at debug).
//   - The only operation-level failure is a worker pool that cannot start.
//   - Output order follows input order; duplicate paths are parsed once.

use crate::core::formats;
use crate::core::model::Book;
use crate::core::resource::Resource;
use crate::util::constants::{DEFAULT_WORKER_THREADS, MAX_WORKER_THREADS};
use crate::util::error::IngestError;
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Worker threads for per-file parsing. 0 = one per logical CPU.
    pub worker_threads: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            worker_threads: DEFAULT_WORKER_THREADS,
        }
    }
}

/// Start ingesting `files` on a background thread.
///
/// The receiver sees `Loading(true)` followed by one terminal value. An empty
/// input resolves to `Success([])` without spawning anything.
pub fn ingest(files: Vec<PathBuf>, config: &IngestConfig) -> mpsc::Receiver<Resource<Vec<Book>>> {
    let (tx, rx) = mpsc::channel();

    if files.is_empty() {
        let _ = tx.send(Resource::Success(Vec::new()));
        return rx;
    }

    let _ = tx.send(Resource::Loading(true));
    let config = config.clone();
    std::thread::spawn(move || {
        let _ = tx.send(ingest_blocking(files, &config).into());
    });
    rx
}

/// Parse `files` on the calling thread's behalf and return the accepted books.
pub fn ingest_blocking(files: Vec<PathBuf>, config: &IngestConfig) -> Result<Vec<Book>, IngestError> {
    let started = Instant::now();
    let requested = files.len();

    let mut seen = HashSet::new();
    let files: Vec<PathBuf> = files.into_iter().filter(|p| seen.insert(p.clone())).collect();
    if files.is_empty() {
        return Ok(Vec::new());
    }

    let threads = config.worker_threads.min(MAX_WORKER_THREADS);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("shelfscan-ingest-{i}"))
        .build()
        .map_err(|source| IngestError::WorkerPool { threads, source })?;

    let books: Vec<Book> = pool.install(|| {
        files
            .par_iter()
            .filter_map(|path| match formats::parse_book(path) {
                Some((mut book, cover)) => {
                    book.cover_image = cover;
                    Some(book)
                }
                None => {
                    tracing::debug!(file = %path.display(), "No parser accepted file");
                    None
                }
            })
            .collect()
    });

    tracing::info!(
        requested,
        unique = files.len(),
        accepted = books.len(),
        skipped = files.len() - books.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Ingestion complete"
    );
    Ok(books)
}
