// ShelfScan - core/resource.rs
//
// Tri-state result envelope used by every asynchronous operation.
//
// A stream for one logical operation is `Loading(true)` followed by exactly
// one terminal value (`Success` or `Error`). Producers send the loading marker
// before handing work to another thread, so a consumer can never observe the
// terminal value first.

use std::sync::mpsc;

/// Progress or outcome of one asynchronous operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Resource<T> {
    /// Work is (or is no longer) in flight.
    Loading(bool),

    /// The operation finished with a value.
    Success(T),

    /// The operation failed as a whole. Carries a human-readable cause.
    Error(String),
}

impl<T> Resource<T> {
    /// True for `Success` and `Error`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Resource::Loading(_))
    }

    pub fn into_data(self) -> Option<T> {
        match self {
            Resource::Success(data) => Some(data),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Resource::Error(message) => Some(message),
            _ => None,
        }
    }
}

impl<T, E: std::fmt::Display> From<Result<T, E>> for Resource<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Resource::Success(data),
            Err(e) => Resource::Error(e.to_string()),
        }
    }
}

/// Block until `rx` yields a terminal value.
///
/// Loading updates are skipped. A producer that hangs up without a terminal
/// value (e.g. its thread panicked) is reported as `Error`.
pub fn wait_terminal<T>(rx: &mpsc::Receiver<Resource<T>>) -> Resource<T> {
    loop {
        match rx.recv() {
            Ok(resource) if resource.is_terminal() => return resource,
            Ok(_) => continue,
            Err(_) => {
                return Resource::Error("operation ended without producing a result".to_string())
            }
        }
    }
}
