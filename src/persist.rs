//! Advisory last-pid file: lets a restarted process pick up the previously
//! recorded foreign window. Never ground truth; callers must re-check
//! liveness before trusting a loaded pid.

use std::fs;
use std::path::Path;

use tracing::warn;

use crate::error::PersistError;

/// Write the pid, creating parent directories as needed
pub fn save_last_pid(path: &Path, pid: u32) -> Result<(), PersistError> {
    if let Some(dir) = path.parent()
        && !dir.as_os_str().is_empty()
    {
        fs::create_dir_all(dir)?;
    }
    fs::write(path, pid.to_string())?;
    Ok(())
}

/// Load a previously saved pid. Missing files are silent; malformed
/// content is logged and ignored.
pub fn load_last_pid(path: &Path) -> Option<u32> {
    let data = fs::read_to_string(path).ok()?;
    match data.trim().parse::<u32>() {
        Ok(pid) if pid > 0 => Some(pid),
        _ => {
            warn!(path = %path.display(), "ignoring malformed pid file");
            None
        }
    }
}

/// Remove the pid file if present (best effort)
pub fn clear_last_pid(path: &Path) {
    if path.exists()
        && let Err(e) = fs::remove_file(path)
    {
        warn!(path = %path.display(), error = %e, "pid file removal failed");
    }
}
