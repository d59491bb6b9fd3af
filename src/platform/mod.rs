//! Platform adapter: the primitive OS queries and actions the core needs,
//! behind one trait so the state machine is written once and unit-tested
//! against a scriptable fake

use std::sync::Arc;

#[cfg(windows)]
pub mod win32;

#[cfg(target_os = "linux")]
pub mod x11;

#[cfg(test)]
pub mod fake;

/// Foreground window sample: pid + title
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveWindow {
    pub pid: u32,
    pub title: String,
}

/// Cursor position in screen coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorPos {
    pub x: i32,
    pub y: i32,
}

/// Window bounds (position + size)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowBounds {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl WindowBounds {
    /// Check if cursor inside bounds (right/bottom exclusive)
    pub fn contains(&self, cursor: CursorPos) -> bool {
        cursor.x >= self.x
            && cursor.x < self.x + self.width
            && cursor.y >= self.y
            && cursor.y < self.y + self.height
    }
}

/// Primitive OS bindings consumed by the monitor. Implementations hold no
/// business logic, are safe to call from multiple threads, and must return
/// promptly: the sampler assumes every call completes well within one tick.
pub trait PlatformAdapter: Send + Sync {
    /// Current foreground window; `None` when the OS reports no
    /// determinable active window
    fn active_window(&self) -> Option<ActiveWindow>;

    /// Whether a process with this pid is still running
    fn process_exists(&self, pid: u32) -> bool;

    /// Best-effort request to raise the window owned by `pid`.
    /// `false` means the OS refused or the window could not be located.
    fn activate(&self, pid: u32) -> bool;

    /// Bounding rectangle of the pid's main window, if it has one on screen
    fn window_rect(&self, pid: u32) -> Option<WindowBounds>;

    /// Current cursor position, if the OS can report one
    fn cursor_position(&self) -> Option<CursorPos>;

    /// Whether the primary mouse button is currently held down
    fn mouse_button_down(&self) -> bool;
}

/// Build the adapter for the compile-target OS
#[cfg(windows)]
pub fn native_adapter() -> Arc<dyn PlatformAdapter> {
    Arc::new(win32::Win32Adapter::new())
}

/// Build the adapter for the compile-target OS
#[cfg(target_os = "linux")]
pub fn native_adapter() -> Arc<dyn PlatformAdapter> {
    Arc::new(x11::X11Adapter::new())
}

/// Inert adapter for platforms without a shim: reports no signal so the
/// core still builds and runs (development stub)
#[cfg(not(any(windows, target_os = "linux")))]
pub struct NullAdapter;

#[cfg(not(any(windows, target_os = "linux")))]
impl PlatformAdapter for NullAdapter {
    fn active_window(&self) -> Option<ActiveWindow> {
        None
    }

    fn process_exists(&self, _pid: u32) -> bool {
        false
    }

    fn activate(&self, _pid: u32) -> bool {
        false
    }

    fn window_rect(&self, _pid: u32) -> Option<WindowBounds> {
        None
    }

    fn cursor_position(&self) -> Option<CursorPos> {
        None
    }

    fn mouse_button_down(&self) -> bool {
        false
    }
}

/// Build the adapter for the compile-target OS
#[cfg(not(any(windows, target_os = "linux")))]
pub fn native_adapter() -> Arc<dyn PlatformAdapter> {
    Arc::new(NullAdapter)
}
