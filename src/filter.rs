//! Target filter: decides which sampled windows may become the recorded
//! foreign window. Pure per-call, so eligibility is exhaustively testable.

/// Transient OS surfaces that must never become an autofill target.
/// Exact titles, matched case-insensitively. Seed list: window titles for
/// lock/login screens and shell surfaces vary per OS release and locale,
/// so callers can extend it via [`TargetFilter::deny_title`].
const DENY_TITLES: &[&str] = &[
    // macOS
    "Login Window",
    "Lock Screen",
    "Screen Saver",
    "ScreenSaverEngine",
    "User Switcher",
    "Dock",
    "Finder",
    "Desktop",
    "Mission Control",
    "Spotlight",
    "Notification Center",
    "Control Center",
    "Siri",
    "SystemUIServer",
    "WindowServer",
    // Windows
    "Program Manager",
    "Task Switching",
    "Task View",
    "Windows Default Lock Screen",
    "Search",
    "Start",
    "Action center",
    // Linux shells / compositors
    "gnome-shell",
    "plasmashell",
    "mutter",
    "kwin",
    "kwin_x11",
    "xfdesktop",
];

/// Title prefixes for system processes, matched case-insensitively
const DENY_PREFIXES: &[&str] = &[
    "com.apple.",
    "loginwindow",
    "screensaver",
    "windows shell experience",
    "microsoft text input",
];

/// Eligibility rules for the tracked foreign window
#[derive(Debug, Clone)]
pub struct TargetFilter {
    self_pid: u32,
    own_names: Vec<String>,
    deny_titles: Vec<String>,
    deny_prefixes: Vec<String>,
}

impl TargetFilter {
    /// Build a filter for the given self process, seeded with the default
    /// denylist. `own_name` is the application's own display name, which is
    /// excluded alongside the self pid.
    pub fn new(self_pid: u32, own_name: impl Into<String>) -> Self {
        Self {
            self_pid,
            own_names: vec![own_name.into().to_lowercase()],
            deny_titles: DENY_TITLES.iter().map(|t| t.to_lowercase()).collect(),
            deny_prefixes: DENY_PREFIXES.iter().map(|p| p.to_lowercase()).collect(),
        }
    }

    /// Our own process id
    pub fn self_pid(&self) -> u32 {
        self.self_pid
    }

    /// Register an additional display name owned by this application
    pub fn own_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.own_names.push(name.into().to_lowercase());
        self
    }

    /// Extend the denylist with an exact title
    pub fn deny_title(&mut self, title: impl Into<String>) -> &mut Self {
        self.deny_titles.push(title.into().to_lowercase());
        self
    }

    /// Extend the denylist with a title prefix
    pub fn deny_prefix(&mut self, prefix: impl Into<String>) -> &mut Self {
        self.deny_prefixes.push(prefix.into().to_lowercase());
        self
    }

    /// Check whether a sampled (pid, title) may be recorded as the foreign
    /// window. Deterministic and side-effect free.
    pub fn is_eligible(&self, pid: u32, title: &str) -> bool {
        if pid == 0 || pid == self.self_pid {
            return false;
        }
        if title.is_empty() {
            return false;
        }

        let title = title.to_lowercase();
        if self.own_names.iter().any(|n| *n == title) {
            return false;
        }
        if self.deny_titles.iter().any(|t| *t == title) {
            return false;
        }
        if self.deny_prefixes.iter().any(|p| title.starts_with(p)) {
            return false;
        }

        true
    }
}
