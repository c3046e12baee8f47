// ShelfScan - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// Errors are only flattened to strings at the `Resource::Error` boundary.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all ShelfScan operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum ShelfScanError {
    /// Candidate discovery failed.
    Discovery(DiscoveryError),

    /// A book file could not be parsed.
    Parse(ParseError),

    /// An ingestion run could not start.
    Ingest(IngestError),

    /// The persistence collaborator failed.
    Store(StoreError),

    /// Configuration loading or validation failed.
    Config(ConfigError),

    /// An asynchronous operation resolved to `Resource::Error`.
    Operation(String),
}

impl fmt::Display for ShelfScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Discovery(e) => write!(f, "Discovery error: {e}"),
            Self::Parse(e) => write!(f, "Parse error: {e}"),
            Self::Ingest(e) => write!(f, "Ingest error: {e}"),
            Self::Store(e) => write!(f, "Library error: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            Self::Operation(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for ShelfScanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Discovery(e) => Some(e),
            Self::Parse(e) => Some(e),
            Self::Ingest(e) => Some(e),
            Self::Store(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Operation(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Discovery errors
// ---------------------------------------------------------------------------

/// Operation-level discovery failures. Per-entry problems never surface here.
#[derive(Debug)]
pub enum DiscoveryError {
    /// The scan root does not exist.
    RootNotFound { path: PathBuf },

    /// The scan root is not a directory.
    NotADirectory { path: PathBuf },

    /// Neither the primary nor the fallback root could be listed.
    PermissionDenied { path: PathBuf, source: io::Error },

    /// The root could not be listed for another reason.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RootNotFound { path } => {
                write!(f, "Scan path '{}' does not exist", path.display())
            }
            Self::NotADirectory { path } => {
                write!(f, "Scan path '{}' is not a directory", path.display())
            }
            Self::PermissionDenied { path, source } => {
                write!(
                    f,
                    "Permission denied listing '{}': {source}",
                    path.display()
                )
            }
            Self::Io { path, source } => {
                write!(f, "Cannot list '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for DiscoveryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::PermissionDenied { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<DiscoveryError> for ShelfScanError {
    fn from(e: DiscoveryError) -> Self {
        Self::Discovery(e)
    }
}

// ---------------------------------------------------------------------------
// Parse errors
// ---------------------------------------------------------------------------

/// Errors raised while parsing a single book file.
///
/// These are absorbed at the parser boundary during ingestion and only reach
/// a caller through the text-chunk stream.
#[derive(Debug)]
pub enum ParseError {
    /// The file has no parser for its extension.
    UnsupportedFormat { file: PathBuf },

    /// The file could not be read.
    Io { file: PathBuf, source: io::Error },

    /// The file is of a recognised format but its contents are unusable.
    Malformed {
        file: PathBuf,
        format: &'static str,
        reason: String,
    },

    /// A decoder panicked while processing the file.
    Panicked { file: PathBuf, message: String },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedFormat { file } => {
                write!(f, "'{}': unsupported file format", file.display())
            }
            Self::Io { file, source } => {
                write!(f, "'{}': I/O error: {source}", file.display())
            }
            Self::Malformed {
                file,
                format,
                reason,
            } => write!(f, "'{}': malformed {format} file: {reason}", file.display()),
            Self::Panicked { file, message } => {
                write!(f, "'{}': decoder crashed: {message}", file.display())
            }
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ParseError> for ShelfScanError {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

// ---------------------------------------------------------------------------
// Ingest errors
// ---------------------------------------------------------------------------

/// Catastrophic ingestion failures. Individual unparseable files are never
/// reported this way.
#[derive(Debug)]
pub enum IngestError {
    /// The worker pool could not be created.
    WorkerPool {
        threads: usize,
        source: rayon::ThreadPoolBuildError,
    },
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WorkerPool { threads, source } => {
                write!(f, "Cannot start {threads} ingestion workers: {source}")
            }
        }
    }
}

impl std::error::Error for IngestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::WorkerPool { source, .. } => Some(source),
        }
    }
}

impl From<IngestError> for ShelfScanError {
    fn from(e: IngestError) -> Self {
        Self::Ingest(e)
    }
}

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

/// Errors raised by the persistence collaborator.
#[derive(Debug)]
pub enum StoreError {
    /// I/O error reading or writing the library.
    Io { path: PathBuf, source: io::Error },

    /// JSON (de)serialisation error.
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// The library file was written by an incompatible version.
    VersionMismatch {
        path: PathBuf,
        found: u32,
        expected: u32,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "Library I/O error '{}': {source}", path.display())
            }
            Self::Json { path, source } => {
                write!(f, "Library file '{}' is malformed: {source}", path.display())
            }
            Self::VersionMismatch {
                path,
                found,
                expected,
            } => write!(
                f,
                "Library file '{}' has version {found}, expected {expected}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<StoreError> for ShelfScanError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A config value is out of the allowed range.
    ValueOutOfRange {
        field: String,
        value: String,
        expected: String,
    },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::ValueOutOfRange {
                field,
                value,
                expected,
            } => write!(
                f,
                "Config '{field}' = '{value}' is out of range. Expected: {expected}"
            ),
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for ShelfScanError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Convenience type alias for ShelfScan results.
pub type Result<T> = std::result::Result<T, ShelfScanError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_parse_error_chain_preserves_io_source() {
        let err: ShelfScanError = ParseError::Io {
            file: PathBuf::from("book.txt"),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        }
        .into();

        assert!(err.to_string().starts_with("Parse error: 'book.txt'"));
        let parse = err.source().expect("parse layer");
        let io = parse.source().expect("io layer");
        assert_eq!(io.to_string(), "gone");
    }

    #[test]
    fn test_malformed_message_names_format() {
        let err = ParseError::Malformed {
            file: PathBuf::from("broken.epub"),
            format: "EPUB",
            reason: "missing container.xml".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "'broken.epub': malformed EPUB file: missing container.xml"
        );
    }
}
