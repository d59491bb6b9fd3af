//! Scriptable in-memory adapter for state-machine tests

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use super::{ActiveWindow, CursorPos, PlatformAdapter, WindowBounds};

struct FakeWindow {
    title: String,
    bounds: Option<WindowBounds>,
    alive: bool,
}

struct Inner {
    windows: HashMap<u32, FakeWindow>,
    active: u32, // 0 = no determinable active window
    cursor: CursorPos,
    button_down: bool,
    refuse_activation: bool,
    honor_activation: bool,
    activations: Vec<u32>,
}

/// Fake OS: a handful of windows, one of them "active", a cursor, and a
/// record of every activation request the core issues
pub struct FakeAdapter {
    inner: Mutex<Inner>,
}

impl FakeAdapter {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                windows: HashMap::new(),
                active: 0,
                cursor: CursorPos { x: 0, y: 0 },
                button_down: false,
                refuse_activation: false,
                honor_activation: true,
                activations: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_window(&self, pid: u32, title: &str) {
        self.lock().windows.insert(
            pid,
            FakeWindow {
                title: title.to_string(),
                bounds: None,
                alive: true,
            },
        );
    }

    pub fn add_window_with_bounds(&self, pid: u32, title: &str, bounds: WindowBounds) {
        self.lock().windows.insert(
            pid,
            FakeWindow {
                title: title.to_string(),
                bounds: Some(bounds),
                alive: true,
            },
        );
    }

    /// Make this pid the foreground window
    pub fn focus(&self, pid: u32) {
        self.lock().active = pid;
    }

    /// Report no determinable active window
    pub fn blur(&self) {
        self.lock().active = 0;
    }

    /// Terminate a process: liveness checks fail, its window disappears
    pub fn kill(&self, pid: u32) {
        let mut inner = self.lock();
        if let Some(window) = inner.windows.get_mut(&pid) {
            window.alive = false;
        }
        if inner.active == pid {
            inner.active = 0;
        }
    }

    pub fn set_cursor(&self, x: i32, y: i32) {
        self.lock().cursor = CursorPos { x, y };
    }

    pub fn set_button_down(&self, down: bool) {
        self.lock().button_down = down;
    }

    /// All activation requests fail (focus-stealing prevention)
    pub fn refuse_activation(&self) {
        self.lock().refuse_activation = true;
    }

    /// Activation requests succeed but never move focus (deferred by the
    /// window manager), producing verification mismatches
    pub fn ignore_activation(&self) {
        self.lock().honor_activation = false;
    }

    /// Every pid the core asked to activate, in order
    pub fn activations(&self) -> Vec<u32> {
        self.lock().activations.clone()
    }
}

impl Default for FakeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformAdapter for FakeAdapter {
    fn active_window(&self) -> Option<ActiveWindow> {
        let inner = self.lock();
        let window = inner.windows.get(&inner.active)?;
        if !window.alive {
            return None;
        }
        Some(ActiveWindow {
            pid: inner.active,
            title: window.title.clone(),
        })
    }

    fn process_exists(&self, pid: u32) -> bool {
        self.lock().windows.get(&pid).is_some_and(|w| w.alive)
    }

    fn activate(&self, pid: u32) -> bool {
        let mut inner = self.lock();
        inner.activations.push(pid);
        if inner.refuse_activation {
            return false;
        }
        if !inner.windows.get(&pid).is_some_and(|w| w.alive) {
            return false;
        }
        if inner.honor_activation {
            inner.active = pid;
        }
        true
    }

    fn window_rect(&self, pid: u32) -> Option<WindowBounds> {
        let inner = self.lock();
        inner.windows.get(&pid).filter(|w| w.alive)?.bounds
    }

    fn cursor_position(&self) -> Option<CursorPos> {
        Some(self.lock().cursor)
    }

    fn mouse_button_down(&self) -> bool {
        self.lock().button_down
    }
}
