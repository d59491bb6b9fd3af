//! Switch operations: activate the last foreign window or our own window,
//! each with a liveness pre-check, a settle delay and a diagnostic
//! verification read-back. Stale references recover automatically.

use std::thread;

use tracing::{debug, info, warn};

use crate::monitor::MonitorCore;
use crate::state::WindowSnapshot;

impl MonitorCore {
    /// Activate the most recently recorded foreign window. Fails (false)
    /// when nothing is recorded, when the target process has exited (after
    /// running recovery) or when the OS refuses the activation.
    pub(crate) fn switch_to_last_foreign_window(&self) -> bool {
        // Quick snapshot read; the lock is released before any OS call
        let Some(target) = self.state_read().last_foreign.clone() else {
            debug!("switch requested but no foreign window recorded");
            return false;
        };

        if !self.adapter.process_exists(target.pid) {
            warn!(pid = target.pid, title = %target.title, "target process gone, recovering");
            self.recover_stale_reference(target.pid);
            return false;
        }

        self.activate_and_verify(target.pid, &target.title)
    }

    /// Raise our own window. No liveness pre-check: self cannot have exited.
    pub(crate) fn switch_to_self(&self) -> bool {
        self.activate_and_verify(self.filter.self_pid(), "self")
    }

    /// Manual capture of the current foreground window, bypassing the
    /// sampler's debounce. Consumers pin the target this way right before
    /// an automation sequence.
    pub(crate) fn record_current_as_last_foreign(&self) -> bool {
        let Some(active) = self.adapter.active_window() else {
            debug!("record requested but no active window");
            return false;
        };
        if !self.filter.is_eligible(active.pid, &active.title) {
            debug!(pid = active.pid, title = %active.title, "record requested but window is ineligible");
            return false;
        }

        {
            let mut state = self.state_write();
            state.last_sampled_pid = active.pid;
            state.record_foreign(WindowSnapshot::now(active.pid, active.title.clone()));
        }
        self.persist_last(active.pid);
        info!(pid = active.pid, title = %active.title, "foreign window pinned");
        true
    }

    /// Activation, settle, then a verification read-back. Verification is
    /// diagnostic only: window managers may legitimately deny or defer
    /// focus changes, so the return value reflects the activation call.
    fn activate_and_verify(&self, pid: u32, label: &str) -> bool {
        if !self.adapter.activate(pid) {
            warn!(pid, target = label, "activation refused");
            return false;
        }

        thread::sleep(self.config.settle_delay);

        match self.adapter.active_window() {
            Some(active) if active.pid == pid => {
                debug!(pid, target = label, "switch verified");
            }
            Some(active) => {
                warn!(
                    expected = pid,
                    actual = active.pid,
                    actual_title = %active.title,
                    "switch verification mismatch"
                );
                // A system surface holding focus after the settle means the
                // recorded target is unusable right now; treat it as stale
                if pid != self.filter.self_pid()
                    && active.pid != self.filter.self_pid()
                    && !self.filter.is_eligible(active.pid, &active.title)
                {
                    self.recover_stale_reference(pid);
                }
            }
            None => warn!(pid, target = label, "no active window after switch"),
        }

        true
    }

    /// Clear a dangling reference and re-seed it from the current sample,
    /// so a closed application never leaves the tracker permanently stuck
    pub(crate) fn recover_stale_reference(&self, dead_pid: u32) {
        {
            let mut state = self.state_write();
            match &state.last_foreign {
                Some(snap) if snap.pid == dead_pid => {
                    state.clear_foreign();
                    info!(pid = dead_pid, "cleared stale foreign window");
                }
                // Superseded by a newer record in the meantime; nothing to do
                _ => return,
            }
        }
        self.clear_persisted();

        match self.adapter.active_window() {
            Some(active) if self.filter.is_eligible(active.pid, &active.title) => {
                {
                    let mut state = self.state_write();
                    state.last_sampled_pid = active.pid;
                    state.record_foreign(WindowSnapshot::now(active.pid, active.title.clone()));
                }
                self.persist_last(active.pid);
                info!(pid = active.pid, title = %active.title, "reseeded foreign window");
            }
            _ => debug!("no eligible window to reseed from"),
        }
    }
}
