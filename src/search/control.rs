//! Cross-thread search control flags.
//!
//! The session thread owns `stop`, `terminate` and `timeout`; the search
//! worker owns `searching`. Each flag has a single writer, so relaxed
//! acquire/release ordering is enough.

use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct SearchControl {
    stop: AtomicBool,
    terminate: AtomicBool,
    timeout: AtomicBool,
    searching: AtomicBool,
}

impl SearchControl {
    pub fn new() -> SearchControl {
        SearchControl::default()
    }

    /// Clears the per-search flags. Called by the worker before it starts
    /// descending.
    pub fn begin_search(&self) {
        self.stop.store(false, Ordering::Release);
        self.timeout.store(false, Ordering::Release);
        self.searching.store(true, Ordering::Release);
    }

    pub fn end_search(&self) {
        self.searching.store(false, Ordering::Release);
    }

    pub fn is_searching(&self) -> bool {
        self.searching.load(Ordering::Acquire)
    }

    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    pub fn should_stop(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    pub fn request_terminate(&self) {
        self.terminate.store(true, Ordering::Release);
    }

    pub fn terminated(&self) -> bool {
        self.terminate.load(Ordering::Acquire)
    }

    pub fn set_timeout(&self) {
        self.timeout.store(true, Ordering::Release);
    }

    pub fn timed_out(&self) -> bool {
        self.timeout.load(Ordering::Acquire)
    }

    /// True when the search should unwind for any reason.
    pub fn abort_requested(&self) -> bool {
        self.should_stop() || self.terminated() || self.timed_out()
    }
}
