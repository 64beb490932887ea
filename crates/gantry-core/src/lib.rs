//! Core domain types and port definitions for gantry.
//!
//! Gantry supervises a single web application process the way a container
//! runtime would: launch it unprivileged, probe its health endpoint on a
//! fixed cadence, and report an explicit health state. This crate holds the
//! pure pieces of that contract — the launch specification, the health
//! policy and its state machine, the port traits implemented by the runtime
//! adapters, path resolution, and settings.
//!
//! No async runtime or network code lives here; adapters are in
//! `gantry-runtime` (OS/process/HTTP) and `gantry-axum` (status API).

pub mod domain;
pub mod events;
pub mod paths;
pub mod ports;
pub mod settings;

// Re-export commonly used types for convenience
pub use domain::{
    AppSpec, DEFAULT_BIND_ADDRESS, HealthPolicy, HealthState, HealthTracker, HealthTransition,
    ProbeOutcome,
};
pub use events::{AppEvent, NoopSupervisorEvents, SupervisorEvents};
pub use paths::{PathError, data_root, pids_dir};
pub use ports::{
    HealthProbe, LastProbe, ProcessError, ProcessHandle, ProcessRunner, ServiceStatus,
};
pub use settings::{
    DEFAULT_ADMIN_PORT, DEFAULT_APP_PORT, DEFAULT_HEALTH_PATH, DEFAULT_PROBE_INTERVAL_SECS,
    DEFAULT_PROBE_RETRIES, DEFAULT_PROBE_TIMEOUT_SECS, DEFAULT_START_PERIOD_SECS, Settings,
    SettingsError, validate_settings,
};
