// ShelfScan - core/mod.rs
//
// Core business logic layer: data model, result envelope, discovery, and
// format parsers.
// Must NOT depend on: app.

pub mod discovery;
pub mod formats;
pub mod model;
pub mod resource;
