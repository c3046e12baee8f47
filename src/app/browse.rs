// ShelfScan - app/browse.rs
//
// Browse session: the single owner of `BrowseState`.
//
// Architecture:
//   - Discovery, ingestion and permission waits run on background threads
//     and report over mpsc channels; `poll()` drains them into the state on
//     the owner's thread, so state is only ever mutated in one place.
//   - Every discovery request takes a new generation number when it is
//     requested (not when it starts). Results carrying an older generation
//     are stale and dropped.
//   - Query changes are debounced; refresh bypasses the debounce.

use crate::app::debounce::Debouncer;
use crate::app::ingest::{self, IngestConfig};
use crate::app::library::BookStore;
use crate::app::state::BrowseState;
use crate::core::discovery::{self, DiscoveryConfig, ScanRoots};
use crate::core::model::{Book, CandidateFile};
use crate::core::resource::Resource;
use crate::platform::permission::{self, PermissionPolicy, PermissionProbe, PermissionStatus};
use crate::util::error::{DiscoveryError, StoreError};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

// =============================================================================
// Candidate sources
// =============================================================================

/// Something that can list candidate files for a query.
pub trait CandidateSource: Send + Sync {
    fn discover(&self, query: &str) -> Result<Vec<CandidateFile>, DiscoveryError>;
}

/// Scans the downloads directory (or its fallback) on every call.
#[derive(Debug, Clone)]
pub struct DownloadsScanner {
    pub roots: ScanRoots,
    pub config: DiscoveryConfig,
}

impl CandidateSource for DownloadsScanner {
    fn discover(&self, query: &str) -> Result<Vec<CandidateFile>, DiscoveryError> {
        discovery::discover_candidates(&self.roots, query, &self.config)
    }
}

/// Run one discovery off the caller's thread.
///
/// The receiver sees `Loading(true)` immediately, then one terminal value.
pub fn discover(
    source: Arc<dyn CandidateSource>,
    query: String,
) -> mpsc::Receiver<Resource<Vec<CandidateFile>>> {
    let (tx, rx) = mpsc::channel();
    let _ = tx.send(Resource::Loading(true));
    std::thread::spawn(move || {
        let _ = tx.send(source.discover(&query).into());
    });
    rx
}

type DiscoveryMessage = (u64, Resource<Vec<CandidateFile>>);

fn run_discovery(
    source: &dyn CandidateSource,
    query: &str,
    generation: u64,
    tx: &mpsc::Sender<DiscoveryMessage>,
) {
    if tx.send((generation, Resource::Loading(true))).is_err() {
        return; // Session dropped.
    }
    let result = source.discover(query);
    if let Err(ref e) = result {
        tracing::warn!(generation, error = %e, "Discovery failed");
    }
    let _ = tx.send((generation, result.into()));
}

// =============================================================================
// BrowseSession
// =============================================================================

pub struct BrowseSession {
    pub state: BrowseState,

    source: Arc<dyn CandidateSource>,
    ingest_config: IngestConfig,
    debouncer: Debouncer,

    /// Latest requested discovery generation.
    generation: Arc<AtomicU64>,
    /// Generation whose terminal result was last applied.
    settled_generation: u64,
    discovery_tx: mpsc::Sender<DiscoveryMessage>,
    discovery_rx: mpsc::Receiver<DiscoveryMessage>,

    ingest_rxs: Vec<mpsc::Receiver<Resource<Vec<Book>>>>,

    permission_rx: Option<mpsc::Receiver<PermissionStatus>>,
    permission_cancel: Option<Arc<AtomicBool>>,
}

impl BrowseSession {
    pub fn new(
        source: Arc<dyn CandidateSource>,
        search_debounce: Duration,
        ingest_config: IngestConfig,
    ) -> Self {
        let (discovery_tx, discovery_rx) = mpsc::channel();
        Self {
            state: BrowseState::new(),
            source,
            ingest_config,
            debouncer: Debouncer::new(search_debounce),
            generation: Arc::new(AtomicU64::new(0)),
            settled_generation: 0,
            discovery_tx,
            discovery_rx,
            ingest_rxs: Vec::new(),
            permission_rx: None,
            permission_cancel: None,
        }
    }

    // -------------------------------------------------------------------------
    // Discovery
    // -------------------------------------------------------------------------

    /// Clear selection and search, and re-run discovery immediately.
    pub fn refresh(&mut self) {
        self.debouncer.cancel();
        self.state.search_query.clear();
        self.state.clear_selected_files();

        let generation = self.next_generation();
        let source = Arc::clone(&self.source);
        let tx = self.discovery_tx.clone();
        std::thread::spawn(move || run_discovery(source.as_ref(), "", generation, &tx));
        tracing::debug!(generation, "Refresh requested");
    }

    /// Store `query` and schedule a discovery for it after the quiet period,
    /// replacing any discovery still waiting on the timer.
    pub fn on_query_change(&mut self, query: &str) {
        self.state.search_query = query.to_string();

        let generation = self.next_generation();
        let source = Arc::clone(&self.source);
        let tx = self.discovery_tx.clone();
        let query = query.to_string();
        self.debouncer.schedule(move || {
            tracing::debug!(generation, query = %query, "Debounced discovery starting");
            run_discovery(source.as_ref(), &query, generation, &tx);
        });
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    // -------------------------------------------------------------------------
    // Selection
    // -------------------------------------------------------------------------

    pub fn toggle_file(&mut self, index: usize) -> bool {
        self.state.toggle_file(index)
    }

    pub fn clear_selected_files(&mut self) {
        self.state.clear_selected_files();
    }

    pub fn toggle_book(&mut self, index: usize) -> bool {
        self.state.toggle_book(index)
    }

    // -------------------------------------------------------------------------
    // Ingestion
    // -------------------------------------------------------------------------

    /// Ingest the checked candidates. The resulting batch replaces
    /// `state.selected_books` when it arrives.
    pub fn load_books_from_selected(&mut self) {
        let paths = self.state.selected_paths();
        tracing::info!(files = paths.len(), "Loading books from selected files");
        self.state.last_error = None;
        self.ingest_rxs.push(ingest::ingest(paths, &self.ingest_config));
    }

    /// Persist the checked books, then clear the batch and file selection.
    pub fn add_selected_books(&mut self, store: &mut dyn BookStore) -> Result<usize, StoreError> {
        let books = self.state.books_to_insert();
        if books.is_empty() {
            return Ok(0);
        }
        match store.insert(&books) {
            Ok(added) => {
                self.state.clear_books();
                self.state.clear_selected_files();
                Ok(added)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Adding books failed");
                self.state.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    // -------------------------------------------------------------------------
    // Permission
    // -------------------------------------------------------------------------

    /// Returns whether access is already granted; if not, flags that the
    /// caller should ask the user for it.
    pub fn check_permission(&mut self, probe: &dyn PermissionProbe) -> bool {
        let granted = probe.is_granted();
        self.state.request_permission_dialog = !granted;
        granted
    }

    /// Wait in the background for access to be granted. On success the
    /// candidate list is refreshed; on timeout `show_permission_error` is set.
    pub fn request_permission(&mut self, probe: Arc<dyn PermissionProbe>, policy: PermissionPolicy) {
        self.cancel_permission_wait();
        self.state.show_permission_error = false;

        let (tx, rx) = mpsc::channel();
        let cancel = Arc::new(AtomicBool::new(false));
        self.permission_rx = Some(rx);
        self.permission_cancel = Some(Arc::clone(&cancel));

        std::thread::spawn(move || {
            let _ = tx.send(permission::wait_for_grant(probe.as_ref(), policy, &cancel));
        });
    }

    pub fn cancel_permission_wait(&mut self) {
        if let Some(flag) = self.permission_cancel.take() {
            flag.store(true, Ordering::SeqCst);
        }
        self.permission_rx = None;
    }

    // -------------------------------------------------------------------------
    // Polling
    // -------------------------------------------------------------------------

    /// Apply every pending background message to the state. Non-blocking.
    pub fn poll(&mut self) {
        self.poll_discovery();
        self.poll_ingest();
        self.poll_permission();
    }

    /// True while any discovery, ingestion or permission wait is outstanding.
    pub fn is_busy(&self) -> bool {
        self.generation.load(Ordering::SeqCst) != self.settled_generation
            || !self.ingest_rxs.is_empty()
            || self.permission_rx.is_some()
    }

    fn poll_discovery(&mut self) {
        while let Ok((generation, resource)) = self.discovery_rx.try_recv() {
            let current = self.generation.load(Ordering::SeqCst);
            if generation != current {
                tracing::trace!(generation, current, "Stale discovery result dropped");
                continue;
            }
            match resource {
                Resource::Loading(flag) => {
                    self.state.is_loading = flag;
                    self.state.last_error = None;
                }
                Resource::Success(files) => {
                    tracing::debug!(generation, files = files.len(), "Candidates updated");
                    self.state.set_files(files);
                    self.state.is_loading = false;
                    self.settled_generation = generation;
                }
                Resource::Error(message) => {
                    self.state.set_files(Vec::new());
                    self.state.is_loading = false;
                    self.state.last_error = Some(message);
                    self.settled_generation = generation;
                }
            }
        }
    }

    fn poll_ingest(&mut self) {
        let mut loading = false;
        let mut outcomes = Vec::new();

        self.ingest_rxs.retain(|rx| loop {
            match rx.try_recv() {
                Ok(Resource::Loading(flag)) => loading |= flag,
                Ok(terminal) => {
                    outcomes.push(terminal);
                    return false;
                }
                Err(mpsc::TryRecvError::Empty) => {
                    loading = true;
                    return true;
                }
                Err(mpsc::TryRecvError::Disconnected) => {
                    outcomes.push(Resource::Error(
                        "ingestion ended without producing a result".to_string(),
                    ));
                    return false;
                }
            }
        });

        for outcome in outcomes {
            match outcome {
                Resource::Success(books) => self.state.set_books(books),
                Resource::Error(message) => self.state.last_error = Some(message),
                Resource::Loading(_) => {}
            }
        }
        self.state.is_books_loading = loading;
    }

    fn poll_permission(&mut self) {
        let status = match self.permission_rx.as_ref().map(|rx| rx.try_recv()) {
            Some(Ok(status)) => status,
            Some(Err(mpsc::TryRecvError::Disconnected)) => PermissionStatus::NotGranted,
            Some(Err(mpsc::TryRecvError::Empty)) | None => return,
        };
        self.permission_rx = None;
        self.permission_cancel = None;

        match status {
            PermissionStatus::Granted => {
                self.state.request_permission_dialog = false;
                self.state.show_permission_error = false;
                self.refresh();
            }
            PermissionStatus::NotGranted => {
                self.state.show_permission_error = true;
            }
        }
    }
}

impl Drop for BrowseSession {
    fn drop(&mut self) {
        self.debouncer.cancel();
        self.cancel_permission_wait();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::BookFormat;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use std::time::Instant;

    /// Returns one candidate named after the query and records every call.
    #[derive(Default)]
    struct RecordingSource {
        calls: Mutex<Vec<String>>,
    }

    impl CandidateSource for RecordingSource {
        fn discover(&self, query: &str) -> Result<Vec<CandidateFile>, DiscoveryError> {
            self.calls.lock().unwrap().push(query.to_string());
            Ok(vec![CandidateFile {
                path: PathBuf::from(format!("/dl/{query}.txt")),
                name: format!("{query}.txt"),
                format: BookFormat::PlainText,
                size: 0,
                modified: None,
            }])
        }
    }

    fn settle(session: &mut BrowseSession) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while session.is_busy() && Instant::now() < deadline {
            session.poll();
            std::thread::sleep(Duration::from_millis(5));
        }
        session.poll();
    }

    #[test]
    fn test_refresh_runs_discovery_immediately() {
        let source = Arc::new(RecordingSource::default());
        let mut session =
            BrowseSession::new(source.clone(), Duration::from_secs(60), IngestConfig::default());
        session.refresh();
        settle(&mut session);

        assert_eq!(*source.calls.lock().unwrap(), vec![String::new()]);
        assert_eq!(session.state.selectable_files.len(), 1);
        assert!(!session.state.is_loading);
    }

    #[test]
    fn test_query_changes_coalesce() {
        let source = Arc::new(RecordingSource::default());
        let mut session =
            BrowseSession::new(source.clone(), Duration::from_millis(80), IngestConfig::default());
        for q in ["a", "ab", "abc"] {
            session.on_query_change(q);
            assert_eq!(session.state.search_query, q);
        }
        settle(&mut session);

        assert_eq!(*source.calls.lock().unwrap(), vec!["abc".to_string()]);
        assert_eq!(session.state.selectable_files[0].0.name, "abc.txt");
    }

    #[test]
    fn test_failed_discovery_sets_error() {
        struct Failing;
        impl CandidateSource for Failing {
            fn discover(&self, _query: &str) -> Result<Vec<CandidateFile>, DiscoveryError> {
                Err(DiscoveryError::RootNotFound {
                    path: PathBuf::from("/nowhere"),
                })
            }
        }

        let mut session =
            BrowseSession::new(Arc::new(Failing), Duration::from_millis(10), IngestConfig::default());
        session.refresh();
        settle(&mut session);
        assert!(session.state.last_error.as_deref().unwrap_or("").contains("/nowhere"));
        assert!(session.state.selectable_files.is_empty());
    }

    #[test]
    fn test_permission_denied_after_budget() {
        struct Never;
        impl PermissionProbe for Never {
            fn mode(&self) -> permission::PermissionMode {
                permission::PermissionMode::Legacy
            }
            fn is_granted(&self) -> bool {
                false
            }
        }

        let mut session = BrowseSession::new(
            Arc::new(RecordingSource::default()),
            Duration::from_millis(10),
            IngestConfig::default(),
        );
        assert!(!session.check_permission(&Never));
        assert!(session.state.request_permission_dialog);

        session.request_permission(
            Arc::new(Never),
            PermissionPolicy {
                retries: 2,
                interval: Duration::from_millis(5),
            },
        );
        settle(&mut session);
        assert!(session.state.show_permission_error);
    }
}
