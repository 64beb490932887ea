//! Shared types for process management.

use serde::Serialize;
use tokio::process::Child;

/// Information about the running application process.
#[derive(Debug, Clone, Serialize)]
pub struct AppProcessInfo {
    /// Service name from the launch spec.
    pub name: String,
    /// Process ID.
    pub pid: u32,
    /// Port the application is listening on.
    pub port: u16,
    /// Unix timestamp when the process was started.
    pub started_at: u64,
}

impl AppProcessInfo {
    /// Create a new `AppProcessInfo`.
    pub fn new(name: String, pid: u32, port: u16, started_at: u64) -> Self {
        Self {
            name,
            pid,
            port,
            started_at,
        }
    }
}

/// Running process with metadata.
#[derive(Debug)]
pub struct RunningApp {
    pub info: AppProcessInfo,
    pub child: Child,
}

impl RunningApp {
    pub fn new(info: AppProcessInfo, child: Child) -> Self {
        Self { info, child }
    }
}
