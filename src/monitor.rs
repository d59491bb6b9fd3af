//! Focus monitor: a fixed-interval background sampler that tracks the
//! OS-active window, keeps the last eligible foreign window, and drives the
//! hover policy (raise self when the cursor enters our window, hand focus
//! back when it leaves)

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::error::MonitorError;
use crate::filter::TargetFilter;
use crate::persist;
use crate::platform::PlatformAdapter;
use crate::state::{FocusState, WindowSnapshot};

/// Monitor configuration
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Sampler tick interval
    pub poll_interval: Duration,
    /// Pause between an activation request and the verification read-back
    pub settle_delay: Duration,
    /// Advisory last-pid file; `None` disables persistence
    pub persist_path: Option<PathBuf>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            settle_delay: Duration::from_millis(150),
            persist_path: None,
        }
    }
}

/// Cursor transition relative to the self window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MouseEdge {
    Entered,
    Left,
}

/// Edge detection against the previous containment flag (pure)
pub(crate) fn mouse_edge(was_inside: bool, now_inside: bool) -> Option<MouseEdge> {
    match (was_inside, now_inside) {
        (false, true) => Some(MouseEdge::Entered),
        (true, false) => Some(MouseEdge::Left),
        _ => None,
    }
}

/// Shared core, reachable from the sampler thread, switch callers and the
/// leave-edge worker. The `FocusState` lock is the only synchronization
/// point; adapter calls always happen outside it.
pub(crate) struct MonitorCore {
    pub(crate) adapter: Arc<dyn PlatformAdapter>,
    pub(crate) filter: TargetFilter,
    pub(crate) state: RwLock<FocusState>,
    pub(crate) config: MonitorConfig,
    pub(crate) running: AtomicBool,
}

impl MonitorCore {
    pub(crate) fn state_read(&self) -> RwLockReadGuard<'_, FocusState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn state_write(&self) -> RwLockWriteGuard<'_, FocusState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn persist_last(&self, pid: u32) {
        if let Some(path) = &self.config.persist_path
            && let Err(e) = persist::save_last_pid(path, pid)
        {
            warn!(pid, error = %e, "pid file save failed");
        }
    }

    pub(crate) fn clear_persisted(&self) {
        if let Some(path) = &self.config.persist_path {
            persist::clear_last_pid(path);
        }
    }

    /// One sampler iteration: window-change sampling, then the mouse policy
    pub(crate) fn tick(self: &Arc<Self>) {
        self.sample_active_window();
        self.check_mouse_interaction();
    }

    /// Sample the foreground window, debounced on pid: the filter re-runs
    /// only when the OS reports a different active process than last tick
    fn sample_active_window(&self) {
        let Some(active) = self.adapter.active_window() else {
            return; // no usable signal this tick
        };

        let mut state = self.state_write();
        if active.pid == state.last_sampled_pid {
            return;
        }
        state.last_sampled_pid = active.pid;

        if active.pid == state.self_pid {
            // Self became active; the mouse policy owns that transition
            return;
        }
        if !self.filter.is_eligible(active.pid, &active.title) {
            debug!(pid = active.pid, title = %active.title, "ignoring ineligible window");
            return;
        }

        state.record_foreign(WindowSnapshot::now(active.pid, active.title.clone()));
        drop(state);

        self.persist_last(active.pid);
        debug!(pid = active.pid, title = %active.title, "foreign window recorded");
    }

    /// Containment is re-evaluated every tick (cheap); only the enter/leave
    /// edges act
    fn check_mouse_interaction(self: &Arc<Self>) {
        let inside = self.cursor_inside_self();

        let edge = {
            let mut state = self.state_write();
            let edge = mouse_edge(state.mouse_inside_self, inside);
            state.mouse_inside_self = inside;
            edge
        };

        match edge {
            Some(MouseEdge::Entered) => self.on_mouse_entered(),
            Some(MouseEdge::Left) => self.on_mouse_left(),
            None => {}
        }
    }

    fn cursor_inside_self(&self) -> bool {
        let Some(rect) = self.adapter.window_rect(self.filter.self_pid()) else {
            return false;
        };
        let Some(cursor) = self.adapter.cursor_position() else {
            return false;
        };
        rect.contains(cursor)
    }

    /// Enter edge: capture the pre-click window before raising self. The
    /// user is about to click into our window, and the debounce may not
    /// have seen the window they were just working in.
    fn on_mouse_entered(&self) {
        match self.adapter.active_window() {
            Some(active) if active.pid != self.filter.self_pid() => {
                if self.filter.is_eligible(active.pid, &active.title) {
                    {
                        let mut state = self.state_write();
                        state.last_sampled_pid = active.pid;
                        state.record_foreign(WindowSnapshot::now(active.pid, active.title.clone()));
                    }
                    self.persist_last(active.pid);
                    debug!(pid = active.pid, title = %active.title, "captured pre-hover window");
                }
                debug!("cursor entered self window, raising");
                self.switch_to_self();
            }
            Some(_) => debug!("cursor entered self window, already active"),
            None => {
                debug!("cursor entered self window, raising");
                self.switch_to_self();
            }
        }
    }

    /// Leave edge: hand focus back on a worker thread so the settle delay
    /// inside the switch never stalls the next tick
    fn on_mouse_left(self: &Arc<Self>) {
        if self.state_read().last_foreign.is_none() {
            debug!("cursor left self window, nothing to return focus to");
            return;
        }

        debug!("cursor left self window, returning focus");
        let core = Arc::clone(self);
        let spawned = thread::Builder::new()
            .name("focus-return".into())
            .spawn(move || {
                core.switch_to_last_foreign_window();
            });
        if let Err(e) = spawned {
            warn!(error = %e, "focus-return spawn failed, switching inline");
            self.switch_to_last_foreign_window();
        }
    }
}

fn run_sampler(core: Arc<MonitorCore>) {
    let interval = core.config.poll_interval;
    debug!(interval_ms = interval.as_millis() as u64, "sampler running");

    while core.running.load(Ordering::SeqCst) {
        let started = Instant::now();
        core.tick();

        let elapsed = started.elapsed();
        if elapsed > interval {
            // The adapter contract is prompt return; a slow tick starves
            // window sampling and edge detection alike
            warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                "sampler tick overran its interval"
            );
        }
        thread::sleep(interval.saturating_sub(elapsed));
    }

    debug!("sampler exited");
}

/// The focus tracking service. Construct once with the platform adapter and
/// an eligibility filter, `start` the sampler, then call the switch
/// operations from automation flows; they are safe to invoke concurrently
/// with the sampler and with each other.
pub struct FocusMonitor {
    core: Arc<MonitorCore>,
    sampler: Mutex<Option<JoinHandle<()>>>,
}

impl FocusMonitor {
    pub fn new(adapter: Arc<dyn PlatformAdapter>, filter: TargetFilter, config: MonitorConfig) -> Self {
        let self_pid = filter.self_pid();
        let mut state = FocusState::new(self_pid);

        // Advisory restore: only trust a persisted pid that still maps to a
        // live process other than ourselves
        if let Some(path) = &config.persist_path
            && let Some(pid) = persist::load_last_pid(path)
        {
            if pid != self_pid && adapter.process_exists(pid) {
                info!(pid, "restored last foreign window from pid file");
                state.record_foreign(WindowSnapshot::now(pid, String::new()));
            } else {
                debug!(pid, "persisted pid is stale, clearing");
                persist::clear_last_pid(path);
            }
        }

        Self {
            core: Arc::new(MonitorCore {
                adapter,
                filter,
                state: RwLock::new(state),
                config,
                running: AtomicBool::new(false),
            }),
            sampler: Mutex::new(None),
        }
    }

    /// Start the background sampler
    pub fn start(&self) -> Result<(), MonitorError> {
        if self.core.running.swap(true, Ordering::SeqCst) {
            return Err(MonitorError::AlreadyRunning);
        }

        let core = Arc::clone(&self.core);
        let handle = thread::Builder::new()
            .name("focus-sampler".into())
            .spawn(move || run_sampler(core))
            .inspect_err(|_| self.core.running.store(false, Ordering::SeqCst))?;

        *self
            .sampler
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(handle);
        info!(self_pid = self.core.filter.self_pid(), "focus monitor started");
        Ok(())
    }

    /// Signal the sampler to exit after its current tick and wait for it
    pub fn stop(&self) -> Result<(), MonitorError> {
        if !self.core.running.swap(false, Ordering::SeqCst) {
            return Err(MonitorError::NotRunning);
        }

        if let Some(handle) = self
            .sampler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            let _ = handle.join();
        }
        info!("focus monitor stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.core.running.load(Ordering::SeqCst)
    }

    /// Our own process id
    pub fn self_pid(&self) -> u32 {
        self.core.filter.self_pid()
    }

    /// Clone of the most recently recorded foreign window, if any
    pub fn last_foreign_window(&self) -> Option<WindowSnapshot> {
        self.core.state_read().last_foreign.clone()
    }

    /// Activate the recorded foreign window (see [`Self::last_foreign_window`]).
    /// Returns `false` when nothing is recorded, the target has exited, or
    /// the OS refused the activation.
    pub fn switch_to_last_foreign_window(&self) -> bool {
        self.core.switch_to_last_foreign_window()
    }

    /// Raise our own window
    pub fn switch_to_self(&self) -> bool {
        self.core.switch_to_self()
    }

    /// Pin the current foreground window as the foreign target, bypassing
    /// the sampler's debounce. Used right before starting an automation
    /// sequence.
    pub fn record_current_as_last_foreign(&self) -> bool {
        self.core.record_current_as_last_foreign()
    }
}

impl Drop for FocusMonitor {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::WindowBounds;
    use crate::platform::fake::FakeAdapter;

    const SELF_PID: u32 = 7;
    const SELF_NAME: &str = "Refocus";

    fn self_bounds() -> WindowBounds {
        WindowBounds {
            x: 0,
            y: 0,
            width: 400,
            height: 300,
        }
    }

    fn make_fake() -> Arc<FakeAdapter> {
        let fake = Arc::new(FakeAdapter::new());
        fake.add_window_with_bounds(SELF_PID, SELF_NAME, self_bounds());
        fake.set_cursor(1000, 1000); // outside self window
        fake
    }

    fn make_core(fake: &Arc<FakeAdapter>) -> Arc<MonitorCore> {
        let adapter: Arc<dyn PlatformAdapter> = fake.clone();
        Arc::new(MonitorCore {
            adapter,
            filter: TargetFilter::new(SELF_PID, SELF_NAME),
            state: RwLock::new(FocusState::new(SELF_PID)),
            config: MonitorConfig {
                settle_delay: Duration::ZERO,
                ..MonitorConfig::default()
            },
            running: AtomicBool::new(false),
        })
    }

    fn make_monitor(fake: &Arc<FakeAdapter>, config: MonitorConfig) -> FocusMonitor {
        let adapter: Arc<dyn PlatformAdapter> = fake.clone();
        FocusMonitor::new(adapter, TargetFilter::new(SELF_PID, SELF_NAME), config)
    }

    fn wait_for(mut cond: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(2);
        while !cond() {
            assert!(Instant::now() < deadline, "condition not met in time");
            thread::sleep(Duration::from_millis(5));
        }
    }

    // ========== Edge Detection ==========

    #[test]
    fn test_mouse_edge_transitions() {
        assert_eq!(mouse_edge(false, true), Some(MouseEdge::Entered));
        assert_eq!(mouse_edge(true, false), Some(MouseEdge::Left));
        assert_eq!(mouse_edge(false, false), None);
        assert_eq!(mouse_edge(true, true), None);
    }

    // ========== Sampling ==========

    #[test]
    fn test_sampler_records_foreign_window() {
        let fake = make_fake();
        fake.add_window(42, "Editor");
        fake.focus(42);

        let core = make_core(&fake);
        core.tick();

        let snap = core.state_read().last_foreign.clone().expect("recorded");
        assert_eq!(snap.pid, 42);
        assert_eq!(snap.title, "Editor");
    }

    #[test]
    fn test_sampler_skips_tick_without_signal() {
        let fake = make_fake();
        let core = make_core(&fake);

        core.tick();
        assert!(core.state_read().last_foreign.is_none());
        assert_eq!(core.state_read().last_sampled_pid, 0);
    }

    #[test]
    fn test_debounce_identical_samples_update_once() {
        let fake = make_fake();
        fake.add_window(42, "Editor");
        fake.focus(42);

        let core = make_core(&fake);
        core.tick();
        let first = core.state_read().last_foreign.clone().expect("recorded");

        thread::sleep(Duration::from_millis(5));
        core.tick();
        core.tick();

        let after = core.state_read().last_foreign.clone().expect("recorded");
        assert_eq!(after.captured_at, first.captured_at, "snapshot re-recorded");
    }

    #[test]
    fn test_debounce_is_keyed_on_pid_not_title() {
        let fake = make_fake();
        fake.add_window(42, "Editor");
        fake.focus(42);

        let core = make_core(&fake);
        core.tick();

        // Same pid, new document title: no re-record until the pid changes
        fake.add_window(42, "report.txt - Editor");
        fake.focus(42);
        core.tick();

        let snap = core.state_read().last_foreign.clone().expect("recorded");
        assert_eq!(snap.title, "Editor");
    }

    #[test]
    fn test_sampler_tracks_window_switches() {
        let fake = make_fake();
        fake.add_window(42, "Editor");
        fake.add_window(55, "Browser");
        fake.focus(42);

        let core = make_core(&fake);
        core.tick();
        fake.focus(55);
        core.tick();

        let snap = core.state_read().last_foreign.clone().expect("recorded");
        assert_eq!(snap.pid, 55);
    }

    #[test]
    fn test_sampler_ignores_self_window() {
        let fake = make_fake();
        fake.focus(SELF_PID);

        let core = make_core(&fake);
        core.tick();

        let state = core.state_read();
        assert!(state.last_foreign.is_none());
        assert_eq!(state.last_sampled_pid, SELF_PID);
    }

    #[test]
    fn test_sampler_keeps_foreign_window_across_self_focus() {
        let fake = make_fake();
        fake.add_window(42, "Editor");
        fake.focus(42);

        let core = make_core(&fake);
        core.tick();
        fake.focus(SELF_PID);
        core.tick();

        let snap = core.state_read().last_foreign.clone().expect("kept");
        assert_eq!(snap.pid, 42);
    }

    #[test]
    fn test_sampler_ignores_denylisted_window() {
        let fake = make_fake();
        fake.add_window(42, "Editor");
        fake.add_window(99, "Lock Screen");
        fake.focus(42);

        let core = make_core(&fake);
        core.tick();
        fake.focus(99);
        core.tick();

        let snap = core.state_read().last_foreign.clone().expect("kept");
        assert_eq!(snap.pid, 42, "denylisted window must not replace target");
    }

    // ========== Mouse Policy ==========

    #[test]
    fn test_mouse_edge_sequence_switches_once_each_way() {
        let fake = make_fake();
        fake.add_window(42, "Editor");
        fake.focus(42);

        let core = make_core(&fake);

        // Containment sequence: outside, outside, inside, inside, outside
        core.tick();
        core.tick();
        fake.set_cursor(100, 100);
        core.tick(); // enter edge: raise self
        core.tick();
        fake.set_cursor(1000, 1000);
        core.tick(); // leave edge: return focus (async)

        wait_for(|| fake.activations().len() == 2);
        assert_eq!(fake.activations(), vec![SELF_PID, 42]);
    }

    #[test]
    fn test_enter_edge_captures_pre_hover_window() {
        let fake = make_fake();
        fake.add_window(42, "Editor");
        fake.focus(42);

        let core = make_core(&fake);
        // Cursor is already over our window on the very first tick, so the
        // sampler's debounce never saw pid 42; the enter edge must catch it
        fake.set_cursor(50, 50);
        core.tick();

        let snap = core.state_read().last_foreign.clone().expect("captured");
        assert_eq!(snap.pid, 42);
        assert_eq!(fake.activations(), vec![SELF_PID]);
    }

    #[test]
    fn test_enter_edge_does_not_capture_system_surface() {
        let fake = make_fake();
        fake.add_window(99, "Lock Screen");
        fake.focus(99);

        let core = make_core(&fake);
        fake.set_cursor(50, 50);
        core.tick();

        assert!(core.state_read().last_foreign.is_none());
        // Self is still raised; only the capture is skipped
        assert_eq!(fake.activations(), vec![SELF_PID]);
    }

    #[test]
    fn test_enter_edge_noop_when_self_already_active() {
        let fake = make_fake();
        fake.focus(SELF_PID);

        let core = make_core(&fake);
        fake.set_cursor(50, 50);
        core.tick();

        assert!(fake.activations().is_empty());
    }

    #[test]
    fn test_leave_edge_without_target_does_nothing() {
        let fake = make_fake();
        fake.focus(SELF_PID);

        let core = make_core(&fake);
        fake.set_cursor(50, 50);
        core.tick();
        fake.set_cursor(1000, 1000);
        core.tick();

        thread::sleep(Duration::from_millis(20));
        assert!(fake.activations().is_empty());
    }

    // ========== Lifecycle ==========

    #[test]
    fn test_start_stop_lifecycle() {
        let fake = make_fake();
        fake.add_window(42, "Editor");
        fake.focus(42);

        let monitor = make_monitor(
            &fake,
            MonitorConfig {
                poll_interval: Duration::from_millis(5),
                settle_delay: Duration::ZERO,
                persist_path: None,
            },
        );

        assert!(!monitor.is_running());
        monitor.start().expect("start failed");
        assert!(monitor.is_running());
        assert!(matches!(
            monitor.start(),
            Err(MonitorError::AlreadyRunning)
        ));

        wait_for(|| monitor.last_foreign_window().is_some_and(|w| w.pid == 42));

        monitor.stop().expect("stop failed");
        assert!(!monitor.is_running());
        assert!(matches!(monitor.stop(), Err(MonitorError::NotRunning)));
    }

    // ========== Persistence ==========

    #[test]
    fn test_restores_live_pid_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("last_pid.txt");
        persist::save_last_pid(&path, 42).expect("seed failed");

        let fake = make_fake();
        fake.add_window(42, "Editor");

        let monitor = make_monitor(
            &fake,
            MonitorConfig {
                persist_path: Some(path),
                ..MonitorConfig::default()
            },
        );
        assert_eq!(monitor.last_foreign_window().map(|w| w.pid), Some(42));
    }

    #[test]
    fn test_discards_stale_persisted_pid() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("last_pid.txt");
        persist::save_last_pid(&path, 42).expect("seed failed");

        let fake = make_fake(); // pid 42 never existed for this adapter
        let monitor = make_monitor(
            &fake,
            MonitorConfig {
                persist_path: Some(path.clone()),
                ..MonitorConfig::default()
            },
        );

        assert!(monitor.last_foreign_window().is_none());
        assert!(!path.exists(), "stale pid file must be removed");
    }

    #[test]
    fn test_persists_recorded_pid() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("last_pid.txt");

        let fake = make_fake();
        fake.add_window(42, "Editor");
        fake.focus(42);

        let adapter: Arc<dyn PlatformAdapter> = fake.clone();
        let core = Arc::new(MonitorCore {
            adapter,
            filter: TargetFilter::new(SELF_PID, SELF_NAME),
            state: RwLock::new(FocusState::new(SELF_PID)),
            config: MonitorConfig {
                settle_delay: Duration::ZERO,
                persist_path: Some(path.clone()),
                ..MonitorConfig::default()
            },
            running: AtomicBool::new(false),
        });
        core.tick();

        assert_eq!(persist::load_last_pid(&path), Some(42));
    }
}
