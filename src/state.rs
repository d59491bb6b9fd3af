//! Shared focus state: the last-known foreign window plus the bookkeeping
//! the sampler needs for debouncing and mouse-edge detection

use std::time::SystemTime;

/// One observed window at a point in time. Immutable once captured; a new
/// sample always produces a new snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSnapshot {
    /// OS-assigned process id (reused over time, never trusted stale)
    pub pid: u32,
    /// Display title at capture time, may be empty
    pub title: String,
    /// Capture timestamp
    pub captured_at: SystemTime,
}

impl WindowSnapshot {
    /// Capture a snapshot timestamped now
    pub fn now(pid: u32, title: impl Into<String>) -> Self {
        Self {
            pid,
            title: title.into(),
            captured_at: SystemTime::now(),
        }
    }
}

/// Mutable core state. Every read and write goes through the monitor's
/// reader/writer lock; consumers only ever receive snapshot clones.
#[derive(Debug)]
pub struct FocusState {
    /// Our own process id, fixed at construction
    pub(crate) self_pid: u32,
    /// Most recent eligible foreign window, if any
    pub(crate) last_foreign: Option<WindowSnapshot>,
    /// Last-known cursor containment, used only to detect enter/leave edges
    pub(crate) mouse_inside_self: bool,
    /// Last sampled active pid, suppresses redundant filtering between ticks
    pub(crate) last_sampled_pid: u32,
}

impl FocusState {
    pub(crate) fn new(self_pid: u32) -> Self {
        Self {
            self_pid,
            last_foreign: None,
            mouse_inside_self: false,
            last_sampled_pid: 0,
        }
    }

    /// Record a foreign window. Refuses our own pid and pid 0 so the
    /// recorded reference can never point back at ourselves.
    pub(crate) fn record_foreign(&mut self, snapshot: WindowSnapshot) {
        if snapshot.pid == 0 || snapshot.pid == self.self_pid {
            return;
        }
        self.last_foreign = Some(snapshot);
    }

    /// Drop the recorded foreign window, returning what was cleared
    pub(crate) fn clear_foreign(&mut self) -> Option<WindowSnapshot> {
        self.last_foreign.take()
    }
}
