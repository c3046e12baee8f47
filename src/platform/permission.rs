// ShelfScan - platform/permission.rs
//
// Bounded wait for filesystem access to be granted.
//
// Whether access exists is asked through `PermissionProbe`; how it gets
// granted (a system dialog, a settings page) is outside this crate. The wait
// loop polls the probe on a fixed budget and ends in an explicit
// `NotGranted` state instead of waiting indefinitely.

use crate::util::constants;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// How storage access is obtained on this platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionMode {
    /// One broad grant covering all user files; the user leaves the app to
    /// grant it, so polling is slow and patient.
    Broad,
    /// A per-directory grant answered in place; polled quickly.
    Legacy,
}

/// Retry budget for one wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionPolicy {
    pub retries: u32,
    pub interval: Duration,
}

impl PermissionPolicy {
    pub fn for_mode(mode: PermissionMode) -> Self {
        match mode {
            PermissionMode::Broad => Self {
                retries: constants::PERMISSION_RETRIES,
                interval: Duration::from_millis(constants::PERMISSION_POLL_INTERVAL_MS),
            },
            PermissionMode::Legacy => Self {
                retries: constants::LEGACY_PERMISSION_RETRIES,
                interval: Duration::from_millis(constants::LEGACY_PERMISSION_POLL_INTERVAL_MS),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    NotGranted,
}

pub trait PermissionProbe: Send + Sync {
    fn mode(&self) -> PermissionMode;
    fn is_granted(&self) -> bool;
}

/// Access is "granted" when the directory can be listed.
#[derive(Debug, Clone)]
pub struct DirectoryAccessProbe {
    pub root: PathBuf,
    pub mode: PermissionMode,
}

impl PermissionProbe for DirectoryAccessProbe {
    fn mode(&self) -> PermissionMode {
        self.mode
    }

    fn is_granted(&self) -> bool {
        std::fs::read_dir(&self.root).is_ok()
    }
}

/// Poll `probe` up to `policy.retries` times, `policy.interval` apart.
///
/// Returns `NotGranted` when the budget runs out or `cancel` is set. The
/// sleep between polls is sliced so a cancel is noticed within
/// PERMISSION_CANCEL_CHECK_INTERVAL_MS.
pub fn wait_for_grant(
    probe: &dyn PermissionProbe,
    policy: PermissionPolicy,
    cancel: &AtomicBool,
) -> PermissionStatus {
    let tick = Duration::from_millis(constants::PERMISSION_CANCEL_CHECK_INTERVAL_MS);

    for attempt in 0..policy.retries {
        if cancel.load(Ordering::SeqCst) {
            tracing::debug!(attempt, "Permission wait cancelled");
            return PermissionStatus::NotGranted;
        }
        if probe.is_granted() {
            tracing::info!(attempt, mode = ?probe.mode(), "Storage access granted");
            return PermissionStatus::Granted;
        }

        let deadline = Instant::now() + policy.interval;
        while !cancel.load(Ordering::SeqCst) {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            std::thread::sleep(tick.min(deadline - now));
        }
    }

    tracing::warn!(
        retries = policy.retries,
        interval_ms = policy.interval.as_millis() as u64,
        mode = ?probe.mode(),
        "Storage access not granted within retry budget"
    );
    PermissionStatus::NotGranted
}
