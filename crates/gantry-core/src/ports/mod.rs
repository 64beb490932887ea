//! Port definitions implemented by the runtime adapters.

mod health_probe;
mod process_runner;

pub use health_probe::HealthProbe;
pub use process_runner::{LastProbe, ProcessHandle, ProcessRunner, ServiceStatus};

use thiserror::Error;

/// Errors from process lifecycle operations.
#[derive(Debug, Clone, Error)]
pub enum ProcessError {
    /// The application is not running.
    #[error("Not running: {0}")]
    NotRunning(String),

    /// The application could not be started.
    #[error("Start failed: {0}")]
    StartFailed(String),

    /// The application could not be stopped cleanly.
    #[error("Stop failed: {0}")]
    StopFailed(String),

    /// The launch configuration is invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}
