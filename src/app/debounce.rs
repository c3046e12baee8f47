// ShelfScan - app/debounce.rs
//
// Trailing-edge debounce timer.
//
// Each `schedule` replaces the outstanding job. Replacement and firing are
// arbitrated by a generation counter held under one mutex: a timer thread
// runs its job only if no newer job was scheduled (and nothing cancelled)
// by the time its quiet period ends.

use crate::util::constants::DEBOUNCE_CANCEL_CHECK_INTERVAL_MS;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

#[derive(Default)]
struct Slot {
    generation: u64,
    cancel: Option<Arc<AtomicBool>>,
}

pub struct Debouncer {
    quiet: Duration,
    slot: Arc<Mutex<Slot>>,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            slot: Arc::new(Mutex::new(Slot::default())),
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet
    }

    /// Run `job` on a timer thread after the quiet period, unless another
    /// `schedule` or a `cancel` happens first.
    pub fn schedule<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let cancel = Arc::new(AtomicBool::new(false));
        let generation = {
            let mut slot = lock(&self.slot);
            if let Some(previous) = slot.cancel.take() {
                previous.store(true, Ordering::SeqCst);
            }
            slot.generation = slot.generation.wrapping_add(1);
            slot.cancel = Some(Arc::clone(&cancel));
            slot.generation
        };

        let slot = Arc::clone(&self.slot);
        let quiet = self.quiet;
        std::thread::spawn(move || {
            let deadline = Instant::now() + quiet;
            let tick = Duration::from_millis(DEBOUNCE_CANCEL_CHECK_INTERVAL_MS);
            loop {
                if cancel.load(Ordering::SeqCst) {
                    return;
                }
                let now = Instant::now();
                if now >= deadline {
                    break;
                }
                std::thread::sleep(tick.min(deadline - now));
            }

            {
                let mut slot = lock(&slot);
                if slot.generation != generation || cancel.load(Ordering::SeqCst) {
                    return;
                }
                slot.cancel = None;
            }
            tracing::trace!(generation, "Debounced job firing");
            job();
        });
    }

    /// Drop the outstanding job, if any.
    pub fn cancel(&self) {
        let mut slot = lock(&self.slot);
        if let Some(previous) = slot.cancel.take() {
            previous.store(true, Ordering::SeqCst);
        }
    }

    /// True while a scheduled job has neither fired nor been cancelled.
    pub fn is_pending(&self) -> bool {
        lock(&self.slot).cancel.is_some()
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn lock(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(|e| e.into_inner())
}
