// ShelfScan - platform/config.rs
//
// Platform directory resolution and config.toml loading with startup
// validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows), and
// Library (macOS) locations, and `UserDirs` for the downloads directory that
// serves as the default scan root.

use crate::platform::permission::{PermissionMode, PermissionPolicy};
use crate::util::constants;
use crate::util::error::ConfigError;
use directories::{ProjectDirs, UserDirs};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Resolved platform paths.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/shelfscan/).
    pub config_dir: PathBuf,

    /// Data directory holding the library and covers.
    pub data_dir: PathBuf,

    /// The user's downloads directory, when the platform defines one.
    pub downloads_dir: Option<PathBuf>,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths, falling back to the current
    /// directory if they cannot be determined.
    pub fn resolve() -> Self {
        let downloads_dir = UserDirs::new().and_then(|u| u.download_dir().map(Path::to_path_buf));

        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            let config_dir = proj_dirs.config_dir().to_path_buf();
            let data_dir = proj_dirs.data_dir().to_path_buf();

            tracing::debug!(
                config = %config_dir.display(),
                data = %data_dir.display(),
                downloads = ?downloads_dir,
                "Platform paths resolved"
            );

            Self {
                config_dir,
                data_dir,
                downloads_dir,
            }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            let fallback = PathBuf::from(".");
            Self {
                config_dir: fallback.clone(),
                data_dir: fallback,
                downloads_dir,
            }
        }
    }

    /// Default fallback scan root: `<data_dir>/imports`.
    pub fn default_fallback_root(&self) -> PathBuf {
        self.data_dir.join(constants::FALLBACK_ROOT_DIR_NAME)
    }
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are ignored so a newer config file works with an older
/// binary.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    pub discovery: DiscoverySection,
    pub ingest: IngestSection,
    pub permission: PermissionSection,
    pub logging: LoggingSection,
}

/// `[discovery]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct DiscoverySection {
    /// Primary scan root. Defaults to the downloads directory.
    pub root: Option<String>,
    /// Root used when the primary cannot be listed.
    pub fallback_root: Option<String>,
    pub max_files: Option<usize>,
    pub exclude_patterns: Option<Vec<String>>,
    pub search_debounce_ms: Option<u64>,
}

/// `[ingest]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct IngestSection {
    /// Number of worker threads (0 = auto).
    pub worker_threads: Option<usize>,
}

/// `[permission]` config section. Overrides both access modes' budgets.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct PermissionSection {
    pub retries: Option<u32>,
    pub poll_interval_ms: Option<u64>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
    /// Log file path (empty = stderr only).
    pub file: Option<String>,
}

/// Validated application configuration.
///
/// Invalid values produce actionable warnings and fall back to defaults.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // -- Discovery --
    pub scan_root: Option<PathBuf>,
    pub fallback_root: Option<PathBuf>,
    pub max_files: usize,
    pub exclude_patterns: Vec<String>,
    pub search_debounce: Duration,

    // -- Ingest --
    pub worker_threads: usize,

    // -- Permission --
    pub permission_retries: Option<u32>,
    pub permission_poll_interval: Option<Duration>,

    // -- Logging --
    pub log_level: Option<String>,
    pub log_file: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scan_root: None,
            fallback_root: None,
            max_files: constants::DEFAULT_MAX_FILES,
            exclude_patterns: constants::DEFAULT_EXCLUDE_PATTERNS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            search_debounce: Duration::from_millis(constants::SEARCH_DEBOUNCE_MS),
            worker_threads: constants::DEFAULT_WORKER_THREADS,
            permission_retries: None,
            permission_poll_interval: None,
            log_level: None,
            log_file: None,
        }
    }
}

impl AppConfig {
    /// Permission budget for `mode`, with any configured overrides applied.
    pub fn permission_policy(&self, mode: PermissionMode) -> PermissionPolicy {
        let mut policy = PermissionPolicy::for_mode(mode);
        if let Some(retries) = self.permission_retries {
            policy.retries = retries;
        }
        if let Some(interval) = self.permission_poll_interval {
            policy.interval = interval;
        }
        policy
    }
}

/// Load and validate `config.toml` from `config_dir`.
///
/// Returns the validated config and the non-fatal warnings produced. A
/// missing file yields defaults with no warnings; an unreadable or
/// unparseable one yields defaults with a warning.
pub fn load_config(config_dir: &Path) -> (AppConfig, Vec<String>) {
    let config_path = config_dir.join(constants::CONFIG_FILE_NAME);
    let mut warnings: Vec<String> = Vec::new();

    let content = match std::fs::read_to_string(&config_path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %config_path.display(), "No config.toml found; using defaults");
            return (AppConfig::default(), warnings);
        }
        Err(source) => {
            let err = ConfigError::Io {
                path: config_path.clone(),
                source,
            };
            let msg = format!("{err}. Using defaults.");
            tracing::warn!("{}", msg);
            warnings.push(msg);
            return (AppConfig::default(), warnings);
        }
    };

    let raw: RawConfig = match toml::from_str(&content) {
        Ok(r) => r,
        Err(source) => {
            let err = ConfigError::TomlParse {
                path: config_path.clone(),
                source,
            };
            let msg = format!("{err}. Using defaults.");
            tracing::warn!("{}", msg);
            warnings.push(msg);
            return (AppConfig::default(), warnings);
        }
    };

    tracing::info!(path = %config_path.display(), "Loaded config.toml");
    let config = validate(raw, &mut warnings);

    if !warnings.is_empty() {
        tracing::warn!(count = warnings.len(), "Config validation produced warnings");
    }
    (config, warnings)
}

fn non_empty_path(value: Option<String>) -> Option<PathBuf> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}

fn out_of_range(field: &str, value: impl std::fmt::Display, expected: String) -> String {
    ConfigError::ValueOutOfRange {
        field: field.to_string(),
        value: value.to_string(),
        expected,
    }
    .to_string()
}

/// Check each field against its named bounds, accumulating all problems.
fn validate(raw: RawConfig, warnings: &mut Vec<String>) -> AppConfig {
    let mut config = AppConfig {
        scan_root: non_empty_path(raw.discovery.root),
        fallback_root: non_empty_path(raw.discovery.fallback_root),
        ..AppConfig::default()
    };

    if let Some(files) = raw.discovery.max_files {
        if (constants::MIN_MAX_FILES..=constants::ABSOLUTE_MAX_FILES).contains(&files) {
            config.max_files = files;
        } else {
            warnings.push(out_of_range(
                "discovery.max_files",
                files,
                format!(
                    "{}-{}; using default ({})",
                    constants::MIN_MAX_FILES,
                    constants::ABSOLUTE_MAX_FILES,
                    constants::DEFAULT_MAX_FILES,
                ),
            ));
        }
    }

    if let Some(patterns) = raw.discovery.exclude_patterns {
        let (valid, invalid): (Vec<String>, Vec<String>) = patterns
            .into_iter()
            .partition(|p| glob::Pattern::new(p).is_ok());
        for p in &invalid {
            warnings.push(format!(
                "[discovery] exclude pattern \"{p}\" is not a valid glob and will be ignored."
            ));
        }
        config.exclude_patterns = valid;
    }

    if let Some(ms) = raw.discovery.search_debounce_ms {
        if (constants::MIN_SEARCH_DEBOUNCE_MS..=constants::MAX_SEARCH_DEBOUNCE_MS).contains(&ms) {
            config.search_debounce = Duration::from_millis(ms);
        } else {
            warnings.push(out_of_range(
                "discovery.search_debounce_ms",
                ms,
                format!(
                    "{}-{}; using default ({})",
                    constants::MIN_SEARCH_DEBOUNCE_MS,
                    constants::MAX_SEARCH_DEBOUNCE_MS,
                    constants::SEARCH_DEBOUNCE_MS,
                ),
            ));
        }
    }

    if let Some(threads) = raw.ingest.worker_threads {
        if threads <= constants::MAX_WORKER_THREADS {
            config.worker_threads = threads;
        } else {
            warnings.push(out_of_range(
                "ingest.worker_threads",
                threads,
                format!("0-{}; using default (auto)", constants::MAX_WORKER_THREADS),
            ));
        }
    }

    if let Some(retries) = raw.permission.retries {
        if (1..=constants::MAX_PERMISSION_RETRIES).contains(&retries) {
            config.permission_retries = Some(retries);
        } else {
            warnings.push(out_of_range(
                "permission.retries",
                retries,
                format!("1-{}; using the mode default", constants::MAX_PERMISSION_RETRIES),
            ));
        }
    }

    if let Some(ms) = raw.permission.poll_interval_ms {
        if (constants::PERMISSION_CANCEL_CHECK_INTERVAL_MS..=constants::MAX_PERMISSION_POLL_INTERVAL_MS)
            .contains(&ms)
        {
            config.permission_poll_interval = Some(Duration::from_millis(ms));
        } else {
            warnings.push(out_of_range(
                "permission.poll_interval_ms",
                ms,
                format!(
                    "{}-{}; using the mode default",
                    constants::PERMISSION_CANCEL_CHECK_INTERVAL_MS,
                    constants::MAX_PERMISSION_POLL_INTERVAL_MS,
                ),
            ));
        }
    }

    if let Some(ref level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.to_lowercase());
        } else {
            warnings.push(format!(
                "[logging] level = \"{level}\" is not recognised. \
                 Valid values: error, warn, info, debug, trace. Using default ({}).",
                constants::DEFAULT_LOG_LEVEL,
            ));
        }
    }

    if let Some(file) = raw.logging.file {
        if !file.is_empty() {
            config.log_file = Some(file);
        }
    }

    config
}
