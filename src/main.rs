// ShelfScan - main.rs
//
// Command-line entry point. Handles:
// 1. CLI argument parsing
// 2. Config loading and logging initialisation (debug mode support)
// 3. Dispatch to scan / import / text / library subcommands

use shelfscan::app;
use shelfscan::core;
use shelfscan::platform;
use shelfscan::util;

use app::browse::{BrowseSession, CandidateSource, DownloadsScanner};
use app::ingest::IngestConfig;
use app::library::{BookFilter, BookStore, JsonFileStore};
use clap::{Parser, Subcommand};
use core::discovery::{DiscoveryConfig, ScanRoots};
use core::resource::{wait_terminal, Resource};
use platform::config::{AppConfig, PlatformPaths};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// ShelfScan - find e-books in your downloads and import them into a library.
///
/// Plain text, HTML, EPUB and PDF files are recognised.
#[derive(Parser, Debug)]
#[command(name = "shelfscan", version, about)]
struct Cli {
    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug", global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List candidate book files in the scan root.
    Scan {
        /// Only list files whose name contains this text (case-insensitive).
        #[arg(short, long, default_value = "")]
        query: String,

        /// Directory to scan instead of the configured root.
        #[arg(short, long)]
        root: Option<PathBuf>,
    },

    /// Parse book files and add them to the library.
    ///
    /// With no FILES, every candidate matching --query in the scan root is
    /// imported.
    Import {
        #[arg(short, long, default_value = "")]
        query: String,

        #[arg(short, long)]
        root: Option<PathBuf>,

        files: Vec<PathBuf>,
    },

    /// Print a book's text chunks as `id<TAB>text`.
    Text { file: PathBuf },

    /// List books in the library.
    Library {
        /// Filter by title or author (case-insensitive).
        #[arg(short, long, default_value = "")]
        query: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let paths = PlatformPaths::resolve();
    let (config, config_warnings) = platform::config::load_config(&paths.config_dir);

    util::logging::init(
        cli.debug,
        config.log_level.as_deref(),
        config.log_file.as_deref(),
    );
    for warning in &config_warnings {
        tracing::warn!(warning = %warning, "Configuration warning");
    }

    tracing::info!(
        version = util::constants::APP_VERSION,
        debug = cli.debug,
        "ShelfScan starting"
    );

    let result = match cli.command {
        Command::Scan { query, root } => run_scan(&config, &paths, root, &query),
        Command::Import { query, root, files } => run_import(&config, &paths, root, &query, files),
        Command::Text { file } => run_text(file),
        Command::Library { query } => run_library(&paths, &query),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "Command failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Roots for discovery: CLI override > config > platform downloads, with the
/// configured (or default) fallback.
fn scan_roots(config: &AppConfig, paths: &PlatformPaths, root: Option<PathBuf>) -> ScanRoots {
    if let Some(root) = root {
        return ScanRoots::single(root);
    }
    let fallback = config
        .fallback_root
        .clone()
        .unwrap_or_else(|| paths.default_fallback_root());
    let primary = config
        .scan_root
        .clone()
        .or_else(|| paths.downloads_dir.clone())
        .unwrap_or_else(|| fallback.clone());
    ScanRoots {
        primary,
        fallback: Some(fallback),
    }
}

fn scanner(config: &AppConfig, paths: &PlatformPaths, root: Option<PathBuf>) -> DownloadsScanner {
    DownloadsScanner {
        roots: scan_roots(config, paths, root),
        config: DiscoveryConfig {
            max_files: config.max_files,
            exclude_patterns: config.exclude_patterns.clone(),
        },
    }
}

fn run_scan(
    config: &AppConfig,
    paths: &PlatformPaths,
    root: Option<PathBuf>,
    query: &str,
) -> util::error::Result<()> {
    let source: Arc<dyn CandidateSource> = Arc::new(scanner(config, paths, root));
    match wait_terminal(&app::browse::discover(source, query.to_string())) {
        Resource::Success(files) => {
            for file in &files {
                println!("{:<5} {:>10}  {}", file.format.label(), file.size, file.name);
            }
            println!("{} candidate(s)", files.len());
            Ok(())
        }
        Resource::Error(message) => Err(operation_failed(message)),
        Resource::Loading(_) => Ok(()),
    }
}

fn run_import(
    config: &AppConfig,
    paths: &PlatformPaths,
    root: Option<PathBuf>,
    query: &str,
    files: Vec<PathBuf>,
) -> util::error::Result<()> {
    let mut store = JsonFileStore::open(&paths.data_dir)?;
    let ingest_config = IngestConfig {
        worker_threads: config.worker_threads,
    };

    if !files.is_empty() {
        let books = match wait_terminal(&app::ingest::ingest(files, &ingest_config)) {
            Resource::Success(books) => books,
            Resource::Error(message) => return Err(operation_failed(message)),
            Resource::Loading(_) => Vec::new(),
        };
        let added = store.insert(&books)?;
        println!("Parsed {} book(s), added {added}", books.len());
        return Ok(());
    }

    // Same flow as the interactive picker: discover, select all, load, add.
    let mut session = BrowseSession::new(
        Arc::new(scanner(config, paths, root)),
        Duration::ZERO,
        ingest_config,
    );
    if query.is_empty() {
        session.refresh();
    } else {
        session.on_query_change(query);
    }
    settle(&mut session);
    if let Some(message) = session.state.last_error.take() {
        return Err(operation_failed(message));
    }

    for index in 0..session.state.selectable_files.len() {
        session.toggle_file(index);
    }
    if !session.state.has_selected {
        println!("No candidate files found");
        return Ok(());
    }

    session.load_books_from_selected();
    settle(&mut session);
    if let Some(message) = session.state.last_error.take() {
        return Err(operation_failed(message));
    }

    let parsed = session.state.selected_books.len();
    let added = session.add_selected_books(&mut store)?;
    println!(
        "Scanned {} file(s), parsed {parsed} book(s), added {added}",
        session.state.selectable_files.len()
    );
    Ok(())
}

fn run_text(file: PathBuf) -> util::error::Result<()> {
    match wait_terminal(&app::text::stream_text(file)) {
        Resource::Success(chunks) => {
            for chunk in chunks {
                println!("{}\t{}", chunk.id, chunk.text);
            }
            Ok(())
        }
        Resource::Error(message) => Err(operation_failed(message)),
        Resource::Loading(_) => Ok(()),
    }
}

fn run_library(paths: &PlatformPaths, query: &str) -> util::error::Result<()> {
    let store = JsonFileStore::open(&paths.data_dir)?;
    let filter = BookFilter {
        text: query.to_string(),
        category: None,
    };
    let books = store.query(&filter)?;
    for book in &books {
        println!(
            "{} by {} [{}]  {}",
            book.title,
            book.author,
            book.category.label(),
            book.file_path.display()
        );
    }
    println!("{} book(s)", books.len());
    Ok(())
}

/// Drive the session until its background work has been applied.
fn settle(session: &mut BrowseSession) {
    loop {
        session.poll();
        if !session.is_busy() {
            break;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
}

fn operation_failed(message: String) -> util::error::ShelfScanError {
    util::error::ShelfScanError::Operation(message)
}
