// ShelfScan - app/library.rs
//
// Persistence collaborator reached through a narrow insert/query contract.
//
// `JsonFileStore` keeps the library in `library.json` under the data
// directory and cover bytes as separate files under `covers/`.
//   - Saves are atomic (write temp, rename), so a crash mid-save never
//     corrupts the previous library.
//   - Unlike a UI session, a library that fails to load is an error, never
//     silently replaced by an empty one.
//   - `file_path` is the natural key; inserting a known path is a no-op.

use crate::core::model::{Author, Book, Category, CoverFormat, CoverImage};
use crate::util::constants::{COVERS_DIR_NAME, LIBRARY_FILE_NAME};
use crate::util::error::StoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Version stamp of `library.json`.
pub const LIBRARY_VERSION: u32 = 1;

// =============================================================================
// Contract
// =============================================================================

/// Query parameters. Empty text and no category match every book.
#[derive(Debug, Clone, Default)]
pub struct BookFilter {
    /// Case-insensitive substring of the title or author.
    pub text: String,
    pub category: Option<Category>,
}

impl BookFilter {
    pub fn matches(&self, book: &Book) -> bool {
        if self.category.is_some_and(|c| c != book.category) {
            return false;
        }
        let needle = self.text.trim().to_lowercase();
        needle.is_empty()
            || book.title.to_lowercase().contains(&needle)
            || book
                .author
                .as_text()
                .is_some_and(|a| a.to_lowercase().contains(&needle))
    }
}

pub trait BookStore {
    /// Persist `books`, skipping any whose `file_path` is already stored.
    /// Returns how many were added.
    fn insert(&mut self, books: &[Book]) -> Result<usize, StoreError>;

    fn query(&self, filter: &BookFilter) -> Result<Vec<Book>, StoreError>;
}

// =============================================================================
// In-memory store
// =============================================================================

#[derive(Debug, Default)]
pub struct MemoryStore {
    books: Vec<Book>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

impl BookStore for MemoryStore {
    fn insert(&mut self, books: &[Book]) -> Result<usize, StoreError> {
        let mut known: HashSet<PathBuf> = self.books.iter().map(|b| b.file_path.clone()).collect();
        let before = self.books.len();
        for book in books {
            if known.insert(book.file_path.clone()) {
                self.books.push(book.clone());
            }
        }
        Ok(self.books.len() - before)
    }

    fn query(&self, filter: &BookFilter) -> Result<Vec<Book>, StoreError> {
        Ok(self
            .books
            .iter()
            .filter(|b| filter.matches(b))
            .cloned()
            .collect())
    }
}

// =============================================================================
// JSON file store
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LibraryFile {
    version: u32,
    #[serde(default)]
    next_id: u64,
    #[serde(default)]
    books: Vec<StoredBook>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredBook {
    id: u64,
    title: String,
    #[serde(default)]
    author: Author,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    text_path: String,
    #[serde(default)]
    scroll_index: i64,
    #[serde(default)]
    scroll_offset: i64,
    #[serde(default)]
    progress: f32,
    file_path: PathBuf,
    #[serde(default)]
    last_opened: Option<DateTime<Utc>>,
    #[serde(default)]
    category: Category,
    /// Cover format and file name relative to the covers directory.
    #[serde(default)]
    cover: Option<(CoverFormat, String)>,
}

pub struct JsonFileStore {
    path: PathBuf,
    covers_dir: PathBuf,
    data: LibraryFile,
}

impl JsonFileStore {
    /// Open the library stored in `data_dir`, or an empty one when the
    /// library file does not exist yet.
    pub fn open(data_dir: &Path) -> Result<Self, StoreError> {
        let path = data_dir.join(LIBRARY_FILE_NAME);
        let covers_dir = data_dir.join(COVERS_DIR_NAME);

        let data = match std::fs::read_to_string(&path) {
            Ok(content) => {
                let data: LibraryFile =
                    serde_json::from_str(&content).map_err(|source| StoreError::Json {
                        path: path.clone(),
                        source,
                    })?;
                if data.version != LIBRARY_VERSION {
                    return Err(StoreError::VersionMismatch {
                        path,
                        found: data.version,
                        expected: LIBRARY_VERSION,
                    });
                }
                tracing::debug!(path = %path.display(), books = data.books.len(), "Library loaded");
                data
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => LibraryFile {
                version: LIBRARY_VERSION,
                next_id: 0,
                books: Vec::new(),
            },
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        Ok(Self {
            path,
            covers_dir,
            data,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.data.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.books.is_empty()
    }

    fn write_cover(&self, id: u64, cover: &CoverImage) -> Result<String, StoreError> {
        std::fs::create_dir_all(&self.covers_dir).map_err(|source| StoreError::Io {
            path: self.covers_dir.clone(),
            source,
        })?;
        let name = format!("{id}.{}", cover.format.extension());
        let path = self.covers_dir.join(&name);
        std::fs::write(&path, &cover.data).map_err(|source| StoreError::Io { path, source })?;
        Ok(name)
    }

    fn read_cover(&self, stored: &StoredBook) -> Option<CoverImage> {
        let (format, name) = stored.cover.as_ref()?;
        match std::fs::read(self.covers_dir.join(name)) {
            Ok(data) => Some(CoverImage {
                format: format.clone(),
                data,
            }),
            Err(e) => {
                tracing::debug!(cover = %name, error = %e, "Cover file unreadable, using placeholder");
                None
            }
        }
    }

    fn remove_covers(&self, names: &[String]) {
        for name in names {
            let _ = std::fs::remove_file(self.covers_dir.join(name));
        }
    }

    fn save(&self, data: &LibraryFile) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let json = serde_json::to_string_pretty(data).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json.as_bytes()).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|source| {
            let _ = std::fs::remove_file(&tmp);
            StoreError::Io {
                path: self.path.clone(),
                source,
            }
        })?;

        tracing::debug!(path = %self.path.display(), books = data.books.len(), "Library saved");
        Ok(())
    }
}

impl BookStore for JsonFileStore {
    /// All-or-nothing: on error neither memory nor disk holds any of `books`.
    fn insert(&mut self, books: &[Book]) -> Result<usize, StoreError> {
        let mut known: HashSet<PathBuf> =
            self.data.books.iter().map(|b| b.file_path.clone()).collect();
        let mut next = self.data.clone();
        let mut written_covers = Vec::new();

        for book in books {
            if !known.insert(book.file_path.clone()) {
                tracing::debug!(file = %book.file_path.display(), "Already in library, skipped");
                continue;
            }
            let id = next.next_id;
            next.next_id += 1;

            let cover = match &book.cover_image {
                Some(image) => match self.write_cover(id, image) {
                    Ok(name) => {
                        written_covers.push(name.clone());
                        Some((image.format.clone(), name))
                    }
                    Err(e) => {
                        self.remove_covers(&written_covers);
                        return Err(e);
                    }
                },
                None => None,
            };

            next.books.push(StoredBook {
                id,
                title: book.title.clone(),
                author: book.author.clone(),
                description: book.description.clone(),
                text_path: book.text_path.clone(),
                scroll_index: book.scroll_index,
                scroll_offset: book.scroll_offset,
                progress: book.progress,
                file_path: book.file_path.clone(),
                last_opened: book.last_opened,
                category: book.category,
                cover,
            });
        }

        let added = next.books.len() - self.data.books.len();
        if added > 0 {
            if let Err(e) = self.save(&next) {
                self.remove_covers(&written_covers);
                return Err(e);
            }
            self.data = next;
        }
        tracing::info!(added, skipped = books.len() - added, "Books inserted into library");
        Ok(added)
    }

    fn query(&self, filter: &BookFilter) -> Result<Vec<Book>, StoreError> {
        Ok(self
            .data
            .books
            .iter()
            .map(|stored| Book {
                title: stored.title.clone(),
                author: stored.author.clone(),
                description: stored.description.clone(),
                text_path: stored.text_path.clone(),
                scroll_index: stored.scroll_index,
                scroll_offset: stored.scroll_offset,
                progress: stored.progress,
                file_path: stored.file_path.clone(),
                last_opened: stored.last_opened,
                category: stored.category,
                cover_image: self.read_cover(stored),
            })
            .filter(|b| filter.matches(b))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn book(title: &str, author: Author) -> Book {
        Book::unread(
            title.to_string(),
            author,
            None,
            PathBuf::from(format!("/books/{title}.epub")),
        )
    }

    #[test]
    fn test_memory_store_skips_known_paths() {
        let mut store = MemoryStore::new();
        let dune = book("Dune", Author::Text("Frank Herbert".into()));
        assert_eq!(store.insert(&[dune.clone(), dune.clone()]).unwrap(), 1);
        assert_eq!(store.insert(&[dune]).unwrap(), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_filter_matches_title_author_and_category() {
        let mut store = MemoryStore::new();
        let mut reading = book("Emma", Author::Text("Jane Austen".into()));
        reading.category = Category::Reading;
        store
            .insert(&[book("Dune", Author::Text("Frank Herbert".into())), reading])
            .unwrap();

        let by_author = BookFilter {
            text: "AUSTEN".into(),
            ..BookFilter::default()
        };
        assert_eq!(store.query(&by_author).unwrap()[0].title, "Emma");

        let by_category = BookFilter {
            category: Some(Category::Uncategorized),
            ..BookFilter::default()
        };
        let titles: Vec<_> = store
            .query(&by_category)
            .unwrap()
            .into_iter()
            .map(|b| b.title)
            .collect();
        assert_eq!(titles, vec!["Dune"]);
        assert_eq!(store.query(&BookFilter::default()).unwrap().len(), 2);
    }

    #[test]
    fn test_json_store_persists_books_and_covers() {
        let dir = TempDir::new().unwrap();
        let mut with_cover = book("Dune", Author::Text("Frank Herbert".into()));
        with_cover.cover_image = Some(CoverImage {
            format: CoverFormat::Png,
            data: vec![1, 2, 3],
        });

        {
            let mut store = JsonFileStore::open(dir.path()).unwrap();
            assert!(store.is_empty());
            assert_eq!(store.insert(&[with_cover.clone(), book("Emma", Author::Unknown)]).unwrap(), 2);
        }

        let mut reopened = JsonFileStore::open(dir.path()).unwrap();
        assert_eq!(reopened.len(), 2);
        let books = reopened.query(&BookFilter::default()).unwrap();
        assert_eq!(books[0], with_cover);
        assert_eq!(books[1].author, Author::Unknown);
        assert!(dir.path().join(COVERS_DIR_NAME).join("0.png").exists());

        assert_eq!(reopened.insert(&[with_cover]).unwrap(), 0);
        assert_eq!(reopened.len(), 2);
    }

    #[test]
    fn test_json_store_rejects_malformed_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(LIBRARY_FILE_NAME), b"not valid json {{{{").unwrap();
        assert!(matches!(
            JsonFileStore::open(dir.path()),
            Err(StoreError::Json { .. })
        ));
    }

    #[test]
    fn test_json_store_rejects_wrong_version() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(LIBRARY_FILE_NAME),
            br#"{"version": 99, "books": []}"#,
        )
        .unwrap();
        assert!(matches!(
            JsonFileStore::open(dir.path()),
            Err(StoreError::VersionMismatch { found: 99, .. })
        ));
    }

    #[test]
    fn test_failed_save_leaves_store_unchanged() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonFileStore::open(dir.path()).unwrap();
        let mut dune = book("Dune", Author::Unknown);
        dune.cover_image = Some(CoverImage {
            format: CoverFormat::Png,
            data: vec![1, 2, 3],
        });

        // A directory where the temp file should go makes the write fail.
        let tmp = store.path().with_extension("json.tmp");
        std::fs::create_dir(&tmp).unwrap();
        assert!(matches!(
            store.insert(&[dune.clone()]),
            Err(StoreError::Io { .. })
        ));
        assert!(store.is_empty());
        assert!(!store.path().exists());
        assert!(!dir.path().join(COVERS_DIR_NAME).join("0.png").exists());

        std::fs::remove_dir(&tmp).unwrap();
        assert_eq!(store.insert(&[dune]).unwrap(), 1);
        assert_eq!(JsonFileStore::open(dir.path()).unwrap().len(), 1);
    }

    #[test]
    fn test_leftover_temp_file_does_not_block_save() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonFileStore::open(dir.path()).unwrap();
        std::fs::write(store.path().with_extension("json.tmp"), b"garbage").unwrap();
        store.insert(&[book("Dune", Author::Unknown)]).unwrap();
        assert_eq!(JsonFileStore::open(dir.path()).unwrap().len(), 1);
    }
}
