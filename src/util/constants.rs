// ShelfScan - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "ShelfScan";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "ShelfScan";

/// Current application version (updated by release script).
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Discovery
// =============================================================================

/// Default exclude glob patterns, matched case-insensitively against file names.
///
/// Browsers leave partial downloads next to finished ones; those must never be
/// offered for import.
pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &["*.crdownload", "*.part", "*.partial"];

/// Maximum number of candidate files returned by a single discovery call.
pub const DEFAULT_MAX_FILES: usize = 2_000;

/// Minimum sensible value for the max-files limit.
pub const MIN_MAX_FILES: usize = 1;

/// Hard upper bound on max files (prevents configuration mistakes).
pub const ABSOLUTE_MAX_FILES: usize = 20_000;

/// Name of the app-owned fallback scan directory under the data directory.
pub const FALLBACK_ROOT_DIR_NAME: &str = "imports";

// =============================================================================
// Search debounce
// =============================================================================

/// Quiet period after the last query edit before discovery runs (ms).
pub const SEARCH_DEBOUNCE_MS: u64 = 500;

/// Minimum user-configurable debounce (ms).
pub const MIN_SEARCH_DEBOUNCE_MS: u64 = 50;

/// Maximum user-configurable debounce (ms).
pub const MAX_SEARCH_DEBOUNCE_MS: u64 = 5_000;

/// How often a pending timer checks its cancel flag while sleeping (ms).
pub const DEBOUNCE_CANCEL_CHECK_INTERVAL_MS: u64 = 10;

// =============================================================================
// Permission wait loop
// =============================================================================

/// Poll attempts while waiting for broad ("all files") access to be granted.
pub const PERMISSION_RETRIES: u32 = 20;

/// Interval between broad-access polls (ms).
pub const PERMISSION_POLL_INTERVAL_MS: u64 = 1_000;

/// Poll attempts while waiting for a legacy per-directory grant.
pub const LEGACY_PERMISSION_RETRIES: u32 = 100;

/// Interval between legacy-grant polls (ms).
pub const LEGACY_PERMISSION_POLL_INTERVAL_MS: u64 = 100;

/// Upper bound on configurable permission retries.
pub const MAX_PERMISSION_RETRIES: u32 = 1_000;

/// Upper bound on a configurable poll interval (ms).
pub const MAX_PERMISSION_POLL_INTERVAL_MS: u64 = 10_000;

/// How often the permission loop checks its cancel flag while sleeping (ms).
pub const PERMISSION_CANCEL_CHECK_INTERVAL_MS: u64 = 50;

// =============================================================================
// Parsing and ingestion
// =============================================================================

/// File size threshold in bytes above which reads go through a memory map.
pub const LARGE_FILE_THRESHOLD: u64 = 16 * 1024 * 1024; // 16 MB

/// Default number of ingestion worker threads. 0 means one per CPU core.
pub const DEFAULT_WORKER_THREADS: usize = 0;

/// Hard upper bound on ingestion worker threads.
pub const MAX_WORKER_THREADS: usize = 64;

/// Retry limits for transient I/O errors while reading book files.
pub const MAX_READ_RETRIES: u32 = 3;
pub const READ_RETRY_DELAYS_MS: [u64; 3] = [50, 100, 200];

/// Maximum characters of a chunk included in debug output.
pub const DEBUG_MAX_TEXT_PREVIEW: usize = 80;

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// =============================================================================
// Configuration and persistence
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Library file name (stored in the platform data directory).
pub const LIBRARY_FILE_NAME: &str = "library.json";

/// Subdirectory of the data directory holding extracted cover images.
pub const COVERS_DIR_NAME: &str = "covers";
