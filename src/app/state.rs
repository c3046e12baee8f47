// ShelfScan - app/state.rs
//
// Browse-and-import state: candidate list, selection, search query, and the
// ingested book batch awaiting confirmation. Plain data; every mutation goes
// through a method that recomputes the derived fields from scratch.
// Owned by `app::browse::BrowseSession`.

use crate::core::model::{Book, CandidateFile};

#[derive(Debug, Default)]
pub struct BrowseState {
    /// Candidates from the latest discovery, each with its checked flag.
    pub selectable_files: Vec<(CandidateFile, bool)>,

    /// Derived: number of checked candidates.
    pub selected_count: usize,

    /// Derived: `selected_count > 0`.
    pub has_selected: bool,

    /// Search text as typed. Updated synchronously on every keystroke.
    pub search_query: String,

    /// Discovery in flight.
    pub is_loading: bool,

    /// Books from the latest ingestion, each with its checked flag.
    pub selected_books: Vec<(Book, bool)>,

    /// Ingestion in flight.
    pub is_books_loading: bool,

    /// The caller should ask the user for storage access.
    pub request_permission_dialog: bool,

    /// Access was requested but not granted within the retry budget.
    pub show_permission_error: bool,

    /// Cause of the last failed operation, cleared when a new one starts.
    pub last_error: Option<String>,
}

impl BrowseState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the candidate list; every candidate starts unchecked.
    pub fn set_files(&mut self, files: Vec<CandidateFile>) {
        self.selectable_files = files.into_iter().map(|f| (f, false)).collect();
        self.recompute();
    }

    /// Flip candidate `index`. Returns false when out of range.
    pub fn toggle_file(&mut self, index: usize) -> bool {
        let Some(entry) = self.selectable_files.get_mut(index) else {
            return false;
        };
        entry.1 = !entry.1;
        self.recompute();
        true
    }

    pub fn clear_selected_files(&mut self) {
        for entry in &mut self.selectable_files {
            entry.1 = false;
        }
        self.recompute();
    }

    /// Paths of checked candidates, in list order.
    pub fn selected_paths(&self) -> Vec<std::path::PathBuf> {
        self.selectable_files
            .iter()
            .filter(|(_, checked)| *checked)
            .map(|(f, _)| f.path.clone())
            .collect()
    }

    /// Replace the book batch; every book starts checked.
    pub fn set_books(&mut self, books: Vec<Book>) {
        self.selected_books = books.into_iter().map(|b| (b, true)).collect();
    }

    /// Flip book `index`, refusing to uncheck the last checked book.
    /// Returns whether the flag changed.
    pub fn toggle_book(&mut self, index: usize) -> bool {
        let checked = self.selected_books.iter().filter(|(_, c)| *c).count();
        let Some(entry) = self.selected_books.get_mut(index) else {
            return false;
        };
        if entry.1 && checked <= 1 {
            return false;
        }
        entry.1 = !entry.1;
        true
    }

    /// Checked books, cloned for hand-off to a store.
    pub fn books_to_insert(&self) -> Vec<Book> {
        self.selected_books
            .iter()
            .filter(|(_, checked)| *checked)
            .map(|(b, _)| b.clone())
            .collect()
    }

    pub fn clear_books(&mut self) {
        self.selected_books.clear();
    }

    fn recompute(&mut self) {
        self.selected_count = self.selectable_files.iter().filter(|(_, c)| *c).count();
        self.has_selected = self.selected_count > 0;
    }
}
