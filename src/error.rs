//! Error types for refocus

use thiserror::Error;

/// Monitor lifecycle errors
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("monitor already running")]
    AlreadyRunning,

    #[error("monitor not running")]
    NotRunning,

    #[error("sampler thread spawn failed: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Advisory pid-file persistence errors
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("pid file I/O failed: {0}")]
    Io(#[from] std::io::Error),
}
