//! Process runner trait definition.
//!
//! This port defines the interface for managing the supervised application
//! process. Implementations handle all lifecycle details internally.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::ProcessError;
use crate::domain::{AppSpec, HealthState};

/// Handle to the running application process.
///
/// Opaque enough for adapters: identifies the process and where it listens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessHandle {
    /// Service name from the launch spec.
    pub name: String,
    /// Process ID (if running on the local system).
    pub pid: Option<u32>,
    /// Port the application is listening on.
    pub port: u16,
    /// Unix timestamp (seconds) when the application was launched.
    pub started_at: u64,
}

impl ProcessHandle {
    /// Create a new process handle.
    #[must_use]
    pub const fn new(name: String, pid: Option<u32>, port: u16, started_at: u64) -> Self {
        Self {
            name,
            pid,
            port,
            started_at,
        }
    }
}

/// Most recent probe attempt, as reported in status output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastProbe {
    /// Unix timestamp (seconds) of the attempt.
    pub at: u64,
    /// Whether the probe succeeded.
    pub success: bool,
    /// Failure detail, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Snapshot of the supervised service for status reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    /// Service name from the launch spec.
    pub name: String,
    /// Tracked health state.
    pub state: HealthState,
    /// Whether the supervisor currently owns a child process.
    pub running: bool,
    /// Process ID of the child, if running.
    pub pid: Option<u32>,
    /// Port the application listens on (last known, if any).
    pub port: Option<u16>,
    /// Unix timestamp (seconds) of the launch, if running.
    pub started_at: Option<u64>,
    /// Consecutive probe failures counted against the retry budget.
    pub consecutive_failures: u32,
    /// Most recent probe attempt.
    pub last_probe: Option<LastProbe>,
    /// Account the supervisor (and therefore the child) runs as.
    pub user: Option<String>,
}

impl ServiceStatus {
    /// Status for a service that is not running.
    #[must_use]
    pub const fn stopped(name: String) -> Self {
        Self {
            name,
            state: HealthState::Unhealthy,
            running: false,
            pid: None,
            port: None,
            started_at: None,
            consecutive_failures: 0,
            last_probe: None,
            user: None,
        }
    }
}

/// Process runner for the supervised application.
///
/// This trait abstracts process management for testability and potential
/// alternative backends (local, remote, containerized).
///
/// # Design Rules
///
/// - Express **intent**, not implementation detail
/// - No CLI/HTTP concerns in signatures
/// - Must support: mock runner, remote runner
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Launch the application described by `spec`.
    ///
    /// Returns a handle once the process has been spawned; health
    /// convergence is tracked asynchronously by the monitor.
    async fn start(&self, spec: AppSpec) -> Result<ProcessHandle, ProcessError>;

    /// Stop the running application gracefully.
    ///
    /// Returns `Err(ProcessError::NotRunning)` if nothing is running.
    async fn stop(&self) -> Result<(), ProcessError>;

    /// Check whether a child process is currently owned.
    async fn is_running(&self) -> bool;

    /// Snapshot the supervised service for status reporting.
    async fn status(&self) -> ServiceStatus;
}
