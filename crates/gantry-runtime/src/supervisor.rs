//! The application supervisor.
//!
//! The supervisor owns the whole lifecycle internally: unprivileged-user
//! enforcement, port check, spawn, PID file, the monitor task, and graceful
//! shutdown. Adapters (HTTP, CLI) call methods on it without holding any
//! process state themselves.
//!
//! Key design decisions:
//! - **Check-then-spawn**: the listen port is verified free before the
//!   child is launched
//! - **Internal state ownership**: no distributed state across adapters
//! - **Cancellation-token shutdown**: stopping cancels the monitor before
//!   signaling the child
//! - **No restart policy**: an unhealthy application stays up and marked;
//!   fault signaling is the contract, recovery is the operator's call

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::process::Child;
use tokio::sync::{RwLock, broadcast};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use gantry_core::domain::{AppSpec, HealthPolicy, HealthState, ProbeOutcome};
use gantry_core::events::{AppEvent, NoopSupervisorEvents, SupervisorEvents};
use gantry_core::ports::{LastProbe, ProcessError, ProcessHandle, ProcessRunner, ServiceStatus};
use gantry_core::settings::DEFAULT_APP_NAME;

use crate::monitor::HealthMonitor;
use crate::pidfile::{delete_pidfile, write_pidfile};
use crate::probe::HttpHealthProbe;
use crate::process::{is_port_available, shutdown_child, spawn_app};
use crate::user::{current_user, ensure_unprivileged};

/// Capacity of the lifecycle event channel; slow subscribers lose events
/// rather than stalling the monitor.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Mutable supervised-service state behind the supervisor lock.
struct SupervisedState {
    spec: Option<AppSpec>,
    child: Option<Child>,
    handle: Option<ProcessHandle>,
    health: HealthState,
    consecutive_failures: u32,
    last_probe: Option<LastProbe>,
    cancel: Option<CancellationToken>,
}

impl Default for SupervisedState {
    fn default() -> Self {
        Self {
            spec: None,
            child: None,
            handle: None,
            health: HealthState::Unhealthy,
            consecutive_failures: 0,
            last_probe: None,
            cancel: None,
        }
    }
}

/// Supervisor for a single application process.
pub struct Supervisor {
    policy: HealthPolicy,
    health_path: String,
    allow_root: bool,
    state: Arc<RwLock<SupervisedState>>,
    events_tx: broadcast::Sender<AppEvent>,
    observer: Arc<dyn SupervisorEvents>,
}

impl Supervisor {
    /// Create a supervisor with the given probe policy and endpoint path.
    pub fn new(policy: HealthPolicy, health_path: impl Into<String>) -> Self {
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            policy,
            health_path: health_path.into(),
            allow_root: false,
            state: Arc::new(RwLock::new(SupervisedState::default())),
            events_tx,
            observer: Arc::new(NoopSupervisorEvents),
        }
    }

    /// Permit running as root (off by default).
    #[must_use]
    pub fn with_allow_root(mut self, allow_root: bool) -> Self {
        self.allow_root = allow_root;
        self
    }

    /// Attach a lifecycle observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn SupervisorEvents>) -> Self {
        self.observer = observer;
        self
    }

    /// Subscribe to lifecycle events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.events_tx.subscribe()
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Consume the monitor stream in a background task, keeping shared state
/// fresh and emitting events on transitions.
fn drive_monitor(
    monitor: HealthMonitor,
    name: String,
    shared: Arc<RwLock<SupervisedState>>,
    events_tx: broadcast::Sender<AppEvent>,
    observer: Arc<dyn SupervisorEvents>,
) {
    tokio::spawn(async move {
        let mut stream = Box::pin(monitor.monitor());
        while let Some(obs) = stream.next().await {
            let process_down = matches!(obs.outcome, ProbeOutcome::ProcessDown);
            {
                let mut state = shared.write().await;
                state.health = obs.state;
                state.consecutive_failures = obs.consecutive_failures;
                state.last_probe = Some(LastProbe {
                    at: unix_now(),
                    success: obs.outcome.is_success(),
                    detail: match &obs.outcome {
                        ProbeOutcome::Success => None,
                        ProbeOutcome::Failure { reason } => Some(reason.clone()),
                        ProbeOutcome::ProcessDown => Some("process exited".to_string()),
                    },
                });

                // Reap a naturally exited child so it does not linger as a
                // zombie until stop() is called.
                if process_down {
                    if let Some(child) = state.child.as_mut() {
                        let _ = child.try_wait();
                    }
                }
            }

            if let Some(transition) = obs.transition {
                match transition.to {
                    HealthState::Unhealthy => warn!(
                        service = %name,
                        from = %transition.from,
                        reason = transition.reason.as_deref().unwrap_or("unknown"),
                        "Service is unhealthy"
                    ),
                    _ => info!(
                        service = %name,
                        from = %transition.from,
                        to = %transition.to,
                        "Service health changed"
                    ),
                }

                let event = AppEvent::health_changed(
                    name.clone(),
                    transition.from,
                    transition.to,
                    transition.reason,
                );
                observer.health_changed(&event);
                let _ = events_tx.send(event);

                if process_down {
                    let event = AppEvent::app_error(name.clone(), "application process exited");
                    observer.error(&event);
                    let _ = events_tx.send(event);
                }
            }
        }
    });
}

#[async_trait]
impl ProcessRunner for Supervisor {
    async fn start(&self, spec: AppSpec) -> Result<ProcessHandle, ProcessError> {
        ensure_unprivileged(self.allow_root)
            .map_err(|e| ProcessError::Configuration(e.to_string()))?;

        if spec.port < 1024 {
            return Err(ProcessError::Configuration(format!(
                "port {} is privileged; use a port >= 1024",
                spec.port
            )));
        }

        // Build the probe before spawning so a bad configuration cannot
        // leave an unmonitored child behind.
        let probe = HttpHealthProbe::new(spec.port, &self.health_path, self.policy.timeout)
            .map_err(|e| ProcessError::Internal(e.to_string()))?;

        let mut state = self.state.write().await;
        if state.child.is_some() {
            return Err(ProcessError::StartFailed(
                "application is already running".to_string(),
            ));
        }

        if !is_port_available(spec.port) {
            return Err(ProcessError::StartFailed(format!(
                "port {} is already in use",
                spec.port
            )));
        }

        let running = spawn_app(&spec)?;
        let pid = running.info.pid;

        if let Err(e) = write_pidfile(&spec.name, pid, spec.port) {
            debug!("Failed to write PID file: {}", e);
        }

        let handle = ProcessHandle::new(
            spec.name.clone(),
            Some(pid),
            spec.port,
            running.info.started_at,
        );

        let cancel = CancellationToken::new();
        let monitor = HealthMonitor::new(Arc::new(probe), self.policy, Some(pid), cancel.clone());
        drive_monitor(
            monitor,
            spec.name.clone(),
            Arc::clone(&self.state),
            self.events_tx.clone(),
            Arc::clone(&self.observer),
        );

        state.child = Some(running.child);
        state.handle = Some(handle.clone());
        state.spec = Some(spec.clone());
        state.health = HealthState::Starting;
        state.consecutive_failures = 0;
        state.last_probe = None;
        state.cancel = Some(cancel);
        drop(state);

        info!(service = %spec.name, pid, port = spec.port, "Application started");
        let event = AppEvent::app_started(spec.name, pid, spec.port);
        self.observer.started(&event);
        let _ = self.events_tx.send(event);

        Ok(handle)
    }

    async fn stop(&self) -> Result<(), ProcessError> {
        let (child, name, cancel) = {
            let mut state = self.state.write().await;
            let child = state
                .child
                .take()
                .ok_or_else(|| ProcessError::NotRunning("no application is running".to_string()))?;
            let name = state
                .handle
                .take()
                .map_or_else(|| DEFAULT_APP_NAME.to_string(), |h| h.name);
            (child, name, state.cancel.take())
        };

        if let Some(cancel) = cancel {
            cancel.cancel();
        }

        debug!(service = %name, "Stopping application");
        shutdown_child(child)
            .await
            .map_err(|e| ProcessError::StopFailed(e.to_string()))?;

        if let Err(e) = delete_pidfile(&name) {
            debug!("Failed to delete PID file: {}", e);
        }

        info!(service = %name, "Application stopped");
        let event = AppEvent::app_stopped(name);
        self.observer.stopped(&event);
        let _ = self.events_tx.send(event);

        Ok(())
    }

    async fn is_running(&self) -> bool {
        self.state.read().await.child.is_some()
    }

    async fn status(&self) -> ServiceStatus {
        let state = self.state.read().await;
        let name = state
            .spec
            .as_ref()
            .map_or_else(|| DEFAULT_APP_NAME.to_string(), |s| s.name.clone());

        ServiceStatus {
            name,
            state: state.health,
            running: state.child.is_some(),
            pid: state.handle.as_ref().and_then(|h| h.pid),
            port: state.spec.as_ref().map(|s| s.port),
            started_at: state.handle.as_ref().map(|h| h.started_at),
            consecutive_failures: state.consecutive_failures,
            last_probe: state.last_probe.clone(),
            user: current_user(),
        }
    }
}

/// Lifecycle observer that writes transitions to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSupervisorEvents;

impl SupervisorEvents for TracingSupervisorEvents {
    fn started(&self, event: &AppEvent) {
        if let AppEvent::AppStarted { name, pid, port } = event {
            info!(service = %name, pid, port, "supervisor: application started");
        }
    }

    fn health_changed(&self, event: &AppEvent) {
        if let AppEvent::HealthChanged {
            name,
            from,
            to,
            reason,
        } = event
        {
            info!(
                service = %name,
                from = %from,
                to = %to,
                reason = reason.as_deref().unwrap_or(""),
                "supervisor: health changed"
            );
        }
    }

    fn stopped(&self, event: &AppEvent) {
        if let AppEvent::AppStopped { name } = event {
            info!(service = %name, "supervisor: application stopped");
        }
    }

    fn error(&self, event: &AppEvent) {
        if let AppEvent::AppError { name, error } = event {
            error!(service = %name, error = %error, "supervisor: application error");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn supervisor() -> Supervisor {
        // allow_root so the lifecycle tests also pass in root-y CI containers;
        // the refusal branch itself is covered in user::tests.
        Supervisor::new(HealthPolicy::default(), "/_stcore/health").with_allow_root(true)
    }

    /// Spec that runs a harmless long-lived process with no binding flags.
    #[cfg(unix)]
    fn sleep_spec(port: u16) -> AppSpec {
        AppSpec::new("test-app", "sleep", port)
            .with_args(vec!["30".to_string()])
            .with_binding_flags(None, None)
    }

    #[tokio::test]
    async fn stop_without_start_is_not_running() {
        let sup = supervisor();
        assert!(matches!(
            sup.stop().await,
            Err(ProcessError::NotRunning(_))
        ));
    }

    #[tokio::test]
    async fn fresh_supervisor_reports_stopped() {
        let sup = supervisor();
        assert!(!sup.is_running().await);

        let status = sup.status().await;
        assert!(!status.running);
        assert!(status.pid.is_none());
        assert!(status.port.is_none());
    }

    #[tokio::test]
    async fn start_rejects_privileged_port() {
        let sup = supervisor();
        let spec = AppSpec::new("test-app", "sleep", 80);
        assert!(matches!(
            sup.start(spec).await,
            Err(ProcessError::Configuration(_))
        ));
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn start_and_stop_lifecycle() {
        let sup = supervisor();
        let handle = sup.start(sleep_spec(42611)).await.expect("start");
        assert!(handle.pid.is_some());
        assert!(sup.is_running().await);

        let status = sup.status().await;
        assert!(status.running);
        assert_eq!(status.port, Some(42611));
        assert_eq!(status.name, "test-app");

        sup.stop().await.expect("stop");
        assert!(!sup.is_running().await);
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn double_start_is_rejected() {
        let sup = supervisor();
        sup.start(sleep_spec(42613)).await.expect("first start");

        let err = sup.start(sleep_spec(42614)).await.expect_err("second start");
        assert!(matches!(err, ProcessError::StartFailed(_)));

        sup.stop().await.expect("stop");
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn start_emits_app_started_event() {
        let sup = supervisor();
        let mut events = sup.subscribe();

        sup.start(sleep_spec(42615)).await.expect("start");
        let event = tokio::time::timeout(std::time::Duration::from_secs(1), events.recv())
            .await
            .expect("event in time")
            .expect("event");
        assert!(matches!(event, AppEvent::AppStarted { port: 42615, .. }));

        sup.stop().await.expect("stop");
    }

    #[tokio::test]
    async fn start_rejects_busy_port() {
        let listener = std::net::TcpListener::bind(("127.0.0.1", 0)).expect("bind");
        let port = listener.local_addr().expect("addr").port();

        let sup = supervisor();
        let spec = AppSpec::new("test-app", "sleep", port)
            .with_args(vec!["30".to_string()])
            .with_binding_flags(None, None);
        let err = sup.start(spec).await.expect_err("busy port");
        assert!(matches!(err, ProcessError::StartFailed(_)));
        drop(listener);
    }
}
