// ShelfScan - app/mod.rs
//
// Application layer: background orchestration, browse state, ingestion,
// and the persistence collaborator.
// Dependencies: core, platform.

pub mod browse;
pub mod debounce;
pub mod ingest;
pub mod library;
pub mod state;
pub mod text;
