// ShelfScan - core/discovery.rs
//
// Candidate discovery in the scan root.
//
// Reads directory entries and file metadata only, never contents; parsing is
// the ingestion pipeline's job. Only the top level of the root is listed.
//
//   - Per-entry I/O errors are logged and skipped.
//   - If the primary root cannot be listed, the fallback root is tried.
//   - max_files is clamped to ABSOLUTE_MAX_FILES; when exceeded, the most
//     recently modified files are kept.

use crate::core::model::{BookFormat, CandidateFile};
use crate::util::constants;
use crate::util::error::DiscoveryError;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

// =============================================================================
// Configuration
// =============================================================================

/// Where to look. The fallback is used only when the primary root cannot be
/// listed (missing, or access not granted).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRoots {
    pub primary: PathBuf,
    pub fallback: Option<PathBuf>,
}

impl ScanRoots {
    pub fn single(primary: impl Into<PathBuf>) -> Self {
        Self {
            primary: primary.into(),
            fallback: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Maximum number of candidates returned.
    pub max_files: usize,

    /// Glob patterns matched case-insensitively against file names.
    pub exclude_patterns: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_files: constants::DEFAULT_MAX_FILES,
            exclude_patterns: constants::DEFAULT_EXCLUDE_PATTERNS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }
}

// =============================================================================
// Discovery
// =============================================================================

/// List supported files in the scan root whose names contain `query`
/// (case-insensitive). The query is matched as typed; only an empty query
/// matches everything.
///
/// Returns `Err` only when neither root can be listed. Zero matches is
/// `Ok(vec![])`.
pub fn discover_candidates(
    roots: &ScanRoots,
    query: &str,
    config: &DiscoveryConfig,
) -> Result<Vec<CandidateFile>, DiscoveryError> {
    let root = select_root(roots)?;
    let max_files = config.max_files.clamp(constants::MIN_MAX_FILES, constants::ABSOLUTE_MAX_FILES);
    let needle = query.to_lowercase();
    let exclude_pats = compile_patterns(&config.exclude_patterns);

    tracing::debug!(
        root = %root.display(),
        query = %needle,
        max_files,
        exclude = ?config.exclude_patterns,
        "Discovery starting"
    );

    let mut files: Vec<CandidateFile> = Vec::new();

    let walker = walkdir::WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true);

    for entry_result in walker {
        let entry = match entry_result {
            Ok(e) => e,
            Err(e) => {
                tracing::debug!(error = %e, "Cannot access entry, skipped");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let Some(format) = BookFormat::from_path(path) else {
            continue;
        };
        let name = entry.file_name().to_string_lossy().into_owned();

        if is_excluded(&name, &exclude_pats) {
            tracing::trace!(file = %name, "Excluded by pattern");
            continue;
        }
        if !needle.is_empty() && !name.to_lowercase().contains(&needle) {
            continue;
        }

        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(e) => {
                tracing::debug!(file = %path.display(), error = %e, "Cannot read metadata, skipped");
                continue;
            }
        };

        files.push(CandidateFile {
            path: path.to_path_buf(),
            name,
            format,
            size: metadata.len(),
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
        });
    }

    let total_found = files.len();
    if total_found > max_files {
        // Newest first; files without an mtime count as oldest.
        files.sort_unstable_by(|a, b| b.modified.cmp(&a.modified));
        files.truncate(max_files);
        tracing::info!(
            total_found,
            limit = max_files,
            "Candidate list truncated to most recently modified files"
        );
    }

    files.sort_by_cached_key(|f| (f.name.to_lowercase(), f.name.clone()));

    tracing::debug!(total_found, returned = files.len(), "Discovery complete");
    Ok(files)
}

/// Pick the first root that can be listed.
fn select_root(roots: &ScanRoots) -> Result<&Path, DiscoveryError> {
    match check_listable(&roots.primary) {
        Ok(()) => Ok(&roots.primary),
        Err(primary_err) => match &roots.fallback {
            Some(fallback) => {
                tracing::info!(
                    primary = %roots.primary.display(),
                    fallback = %fallback.display(),
                    reason = %primary_err,
                    "Primary scan root unavailable, using fallback"
                );
                check_listable(fallback)?;
                Ok(fallback)
            }
            None => Err(primary_err),
        },
    }
}

/// `fs::metadata` separates PermissionDenied from NotFound, which
/// `Path::is_dir` would collapse into `false`. `read_dir` then confirms the
/// directory can actually be listed.
fn check_listable(root: &Path) -> Result<(), DiscoveryError> {
    use std::io::ErrorKind;

    let classify = |e: std::io::Error| match e.kind() {
        ErrorKind::NotFound => DiscoveryError::RootNotFound {
            path: root.to_path_buf(),
        },
        ErrorKind::PermissionDenied => DiscoveryError::PermissionDenied {
            path: root.to_path_buf(),
            source: e,
        },
        _ => DiscoveryError::Io {
            path: root.to_path_buf(),
            source: e,
        },
    };

    let meta = std::fs::metadata(root).map_err(classify)?;
    if !meta.is_dir() {
        return Err(DiscoveryError::NotADirectory {
            path: root.to_path_buf(),
        });
    }
    std::fs::read_dir(root).map_err(classify)?;
    Ok(())
}

// =============================================================================
// Glob helpers
// =============================================================================

/// Compile glob patterns; invalid ones are logged and skipped.
fn compile_patterns(patterns: &[String]) -> Vec<glob::Pattern> {
    patterns
        .iter()
        .filter_map(|p| match glob::Pattern::new(p) {
            Ok(compiled) => Some(compiled),
            Err(e) => {
                tracing::warn!(pattern = %p, error = %e, "Invalid exclude pattern, skipping");
                None
            }
        })
        .collect()
}

fn is_excluded(file_name: &str, exclude_pats: &[glob::Pattern]) -> bool {
    let options = glob::MatchOptions {
        case_sensitive: false,
        require_literal_separator: false,
        require_literal_leading_dot: false,
    };
    exclude_pats
        .iter()
        .any(|p| p.matches_with(file_name, options))
}

// =============================================================================
// Tests
// =============================================================================
