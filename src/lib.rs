//! Focus tracking and window hand-off for autofill flows.
//!
//! A credential manager that types credentials into other applications has
//! a bootstrap problem: the moment the user interacts with the manager, the
//! window the credentials were meant for is no longer active. This crate
//! runs a background sampler that continuously remembers the most recent
//! *foreign* window (any eligible window not belonging to our own process),
//! raises our window when the cursor hovers over it, and hands focus back
//! to the remembered window when the cursor leaves, or on demand right
//! before an automation flow starts injecting text.
//!
//! The OS bindings live behind [`PlatformAdapter`]; the state machine is
//! platform-independent and fully testable with a fake adapter.
//!
//! ```no_run
//! use refocus::{FocusMonitor, MonitorConfig, TargetFilter, native_adapter};
//!
//! let filter = TargetFilter::new(std::process::id(), "My Manager");
//! let monitor = FocusMonitor::new(native_adapter(), filter, MonitorConfig::default());
//! monitor.start()?;
//!
//! // ... later, from an autofill flow:
//! if monitor.switch_to_last_foreign_window() {
//!     // inject credentials into the now-active window
//! }
//! # Ok::<(), refocus::MonitorError>(())
//! ```

pub mod error;
pub mod filter;
pub mod monitor;
pub mod persist;
pub mod platform;
pub mod state;

mod switcher;

pub use error::{MonitorError, PersistError};
pub use filter::TargetFilter;
pub use monitor::{FocusMonitor, MonitorConfig};
pub use platform::{ActiveWindow, CursorPos, PlatformAdapter, WindowBounds, native_adapter};
pub use state::WindowSnapshot;
