//! Canonical event union for supervisor lifecycle events.
//!
//! Events flow from the supervisor to every attached adapter (SSE stream,
//! structured logs, tests). They are serialized with a `type` tag:
//!
//! ```json
//! { "type": "health_changed", "name": "app", "from": "healthy", "to": "unhealthy" }
//! ```

use serde::{Deserialize, Serialize};

use crate::domain::HealthState;

/// Supervisor lifecycle events.
///
/// Each variant carries enough context to be self-describing on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppEvent {
    /// The application process was launched.
    AppStarted {
        /// Service name from the launch spec.
        name: String,
        /// Process ID of the child.
        pid: u32,
        /// Port the application binds.
        port: u16,
    },

    /// The tracked health state changed.
    HealthChanged {
        /// Service name from the launch spec.
        name: String,
        /// State before the probe.
        from: HealthState,
        /// State after the probe.
        to: HealthState,
        /// Reason attached to the change, if any.
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    /// The application was stopped cleanly.
    AppStopped {
        /// Service name from the launch spec.
        name: String,
    },

    /// The supervisor hit an error while managing the application.
    AppError {
        /// Service name from the launch spec.
        name: String,
        /// Error description.
        error: String,
    },
}

impl AppEvent {
    /// Create an app started event.
    pub fn app_started(name: impl Into<String>, pid: u32, port: u16) -> Self {
        Self::AppStarted {
            name: name.into(),
            pid,
            port,
        }
    }

    /// Create a health changed event.
    pub fn health_changed(
        name: impl Into<String>,
        from: HealthState,
        to: HealthState,
        reason: Option<String>,
    ) -> Self {
        Self::HealthChanged {
            name: name.into(),
            from,
            to,
            reason,
        }
    }

    /// Create an app stopped event.
    pub fn app_stopped(name: impl Into<String>) -> Self {
        Self::AppStopped { name: name.into() }
    }

    /// Create an app error event.
    pub fn app_error(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self::AppError {
            name: name.into(),
            error: error.into(),
        }
    }
}

/// Port for observing supervisor lifecycle events.
///
/// Decouples the supervisor from transport-specific emission (SSE, logs).
/// Methods are fire-and-forget — implementations handle their own errors.
pub trait SupervisorEvents: Send + Sync {
    /// Called when the application process has been launched.
    fn started(&self, event: &AppEvent);

    /// Called on every health state transition.
    fn health_changed(&self, event: &AppEvent);

    /// Called after the application has stopped.
    fn stopped(&self, event: &AppEvent);

    /// Called when the supervisor hits an error.
    fn error(&self, event: &AppEvent);
}

/// No-op implementation for tests and non-observing contexts.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSupervisorEvents;

impl SupervisorEvents for NoopSupervisorEvents {
    fn started(&self, _event: &AppEvent) {}
    fn health_changed(&self, _event: &AppEvent) {}
    fn stopped(&self, _event: &AppEvent) {}
    fn error(&self, _event: &AppEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let event = AppEvent::health_changed("app", HealthState::Healthy, HealthState::Unhealthy, None);
        let json = serde_json::to_string(&event).expect("serialize");
        assert!(json.contains("\"type\":\"health_changed\""));
        assert!(json.contains("\"from\":\"healthy\""));
        assert!(json.contains("\"to\":\"unhealthy\""));
        assert!(!json.contains("reason"));
    }

    #[test]
    fn started_event_carries_pid_and_port() {
        let event = AppEvent::app_started("app", 4242, 8501);
        let json = serde_json::to_string(&event).expect("serialize");
        assert!(json.contains("\"pid\":4242"));
        assert!(json.contains("\"port\":8501"));
    }
}
