//! Process-wide monitor context, replacing what would otherwise be a set of
//! mutable globals. Each flag has a single writer and only requires ordered
//! atomic access, no mutual exclusion.

use core::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct MonitorState {
    termination: AtomicBool,
    connected: AtomicBool,
}

impl MonitorState {
    pub const fn new() -> Self {
        MonitorState {
            termination: AtomicBool::new(false),
            connected: AtomicBool::new(false),
        }
    }

    /// Requests cooperative shutdown. A single atomic store, safe to call
    /// from an asynchronous signal context; no other side effects are
    /// permitted there.
    pub fn request_termination(&self) {
        self.termination.store(true, Ordering::Release);
    }

    pub fn termination_requested(&self) -> bool {
        self.termination.load(Ordering::Acquire)
    }

    /// Connectivity notification from the telemetry client, last write wins.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Release);
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}
