// ShelfScan - lib.rs
//
// Library entry point. The `shelfscan` binary and the integration tests
// drive the crate through these modules.

pub mod app;
pub mod core;
pub mod platform;
pub mod util;
