//! Request/response transport for the session.
//!
//! The host and the engine share one slot: whoever has something to say
//! overwrites it, and the reader clears it by overwriting in turn. The file
//! implementation matches the GUI's polling protocol; the in-memory one
//! exists for tests.

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;

pub trait Channel: Send + Sync {
    /// Current contents of the slot, split into lines. Empty when there is
    /// nothing pending.
    fn read_lines(&self) -> Vec<String>;

    /// Overwrites the slot with a response payload.
    fn post(&self, payload: &str);

    /// Blocks until the other side has consumed (emptied) the slot.
    fn wait_until_consumed(&self);
}

/// The production transport: a single shared text file.
pub struct FileChannel {
    path: PathBuf,
}

impl FileChannel {
    pub fn new(path: impl Into<PathBuf>) -> FileChannel {
        FileChannel { path: path.into() }
    }
}

impl Channel for FileChannel {
    fn read_lines(&self) -> Vec<String> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => contents.lines().map(str::to_string).collect(),
            Err(_) => Vec::new(),
        }
    }

    fn post(&self, payload: &str) {
        // A failed write leaves the previous contents for the next poll.
        let _ = fs::write(&self.path, payload);
    }

    fn wait_until_consumed(&self) {
        loop {
            match fs::read_to_string(&self.path) {
                Ok(contents) if contents.is_empty() => return,
                Err(_) => return,
                _ => thread::yield_now(),
            }
        }
    }
}

/// Test transport backed by a shared string.
#[derive(Default)]
pub struct MemoryChannel {
    slot: Mutex<String>,
}

impl MemoryChannel {
    pub fn new() -> Arc<MemoryChannel> {
        Arc::new(MemoryChannel::default())
    }

    /// Host side: place a request in the slot.
    pub fn send(&self, request: &str) {
        *self.slot.lock().unwrap() = request.to_string();
    }

    /// Host side: take whatever is in the slot, leaving it empty.
    pub fn take(&self) -> String {
        std::mem::take(&mut *self.slot.lock().unwrap())
    }

    /// Host side: block until the engine posts something other than
    /// `previous`, then take it.
    pub fn take_response(&self, previous: &str) -> String {
        loop {
            {
                let slot = self.slot.lock().unwrap();
                if !slot.is_empty() && slot.as_str() != previous {
                    drop(slot);
                    return self.take();
                }
            }
            thread::yield_now();
        }
    }
}

impl Channel for MemoryChannel {
    fn read_lines(&self) -> Vec<String> {
        self.slot
            .lock()
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn post(&self, payload: &str) {
        *self.slot.lock().unwrap() = payload.to_string();
    }

    fn wait_until_consumed(&self) {
        loop {
            if self.slot.lock().unwrap().is_empty() {
                return;
            }
            thread::yield_now();
        }
    }
}
