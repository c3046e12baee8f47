// ShelfScan - platform/mod.rs
//
// Platform abstraction layer: directories, config.toml, file reading, and
// storage access.
// Must NOT depend on: core, app.

pub mod config;
pub mod fs;
pub mod permission;
