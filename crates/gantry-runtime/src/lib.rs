//! Process runtime and OS-level concerns for gantry.
//!
//! This crate implements the ports defined in `gantry-core` against the
//! local operating system: spawning the application process, forwarding its
//! output into structured logs, probing its health endpoint over HTTP,
//! tracking PID files, enforcing unprivileged execution, and shutting the
//! process down gracefully.

pub mod monitor;
pub mod pidfile;
pub mod probe;
pub mod process;
pub mod supervisor;
pub mod user;

// Re-export the main ProcessRunner implementation
pub use supervisor::Supervisor;

// Re-export health utilities for direct use if needed
pub use probe::{HttpHealthProbe, check_http_health, wait_for_http_health};

// Re-export health monitoring primitives
pub use monitor::{HealthMonitor, HealthObservation};

// Re-export the tracing-backed event observer
pub use supervisor::TracingSupervisorEvents;

// Re-export user enforcement helpers
pub use user::{UserError, current_user, ensure_unprivileged};
