//! Continuous health monitoring for the supervised application.
//!
//! The monitor polls on the policy interval with a combined check: process
//! liveness first (cheap), then the HTTP probe. Outcomes feed the pure
//! [`HealthTracker`]; every completed probe is yielded so the supervisor
//! can keep status fresh, with `transition` set only on state changes.

use std::sync::Arc;

use async_stream::stream;
use futures_util::Stream;
use tokio::time::{Instant, MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use gantry_core::domain::{HealthPolicy, HealthState, HealthTracker, HealthTransition, ProbeOutcome};
use gantry_core::ports::HealthProbe;

/// One completed monitor cycle.
#[derive(Debug, Clone)]
pub struct HealthObservation {
    /// Raw probe outcome.
    pub outcome: ProbeOutcome,
    /// Tracker state after applying the outcome.
    pub state: HealthState,
    /// Consecutive failures counted against the retry budget.
    pub consecutive_failures: u32,
    /// Edge-triggered transition, if the state changed.
    pub transition: Option<HealthTransition>,
}

/// Continuous health monitor for one supervised process.
///
/// The first probe fires immediately after launch; the start period in the
/// policy forgives early failures while the application boots. Missed ticks
/// are skipped, never bursted — a supervisory probe must not pile up.
pub struct HealthMonitor {
    probe: Arc<dyn HealthProbe>,
    tracker: HealthTracker,
    pid: Option<u32>,
    cancel_token: CancellationToken,
}

impl HealthMonitor {
    /// Create a new health monitor.
    ///
    /// # Arguments
    ///
    /// * `probe` - Probe against the application health endpoint
    /// * `policy` - Cadence and thresholds to apply
    /// * `pid` - Child PID for the liveness pre-check (if known)
    /// * `cancel_token` - Token to signal monitor shutdown
    pub fn new(
        probe: Arc<dyn HealthProbe>,
        policy: HealthPolicy,
        pid: Option<u32>,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            probe,
            tracker: HealthTracker::new(policy),
            pid,
            cancel_token,
        }
    }

    /// Start monitoring and return a stream of observations.
    ///
    /// Completes when the cancellation token is triggered.
    pub fn monitor(self) -> impl Stream<Item = HealthObservation> {
        let probe = self.probe;
        let mut tracker = self.tracker;
        let pid = self.pid;
        let cancel_token = self.cancel_token;
        let check_interval = tracker.policy().interval;

        stream! {
            let started = Instant::now();
            let mut ticker = interval(check_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            debug!(?pid, "Starting health monitor");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let outcome = if pid.is_some_and(|p| !is_process_alive(p)) {
                            ProbeOutcome::ProcessDown
                        } else {
                            probe.probe().await
                        };

                        let transition = tracker.observe(&outcome, started.elapsed());
                        if let Some(ref t) = transition {
                            debug!(from = %t.from, to = %t.to, "Health status changed");
                        }

                        yield HealthObservation {
                            outcome,
                            state: tracker.state(),
                            consecutive_failures: tracker.consecutive_failures(),
                            transition,
                        };
                    }
                    _ = cancel_token.cancelled() => {
                        debug!(?pid, "Health monitor cancelled");
                        break;
                    }
                }
            }
        }
    }
}

/// Check if a process is alive by PID.
#[cfg(unix)]
fn is_process_alive(pid: u32) -> bool {
    // /proc/<pid> exists on Linux; fall back to a sysinfo lookup elsewhere
    std::path::Path::new(&format!("/proc/{}", pid)).exists()
        || crate::pidfile::pid_exists(pid)
}

#[cfg(not(unix))]
fn is_process_alive(pid: u32) -> bool {
    crate::pidfile::pid_exists(pid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use futures_util::StreamExt;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Probe that replays a fixed sequence of outcomes.
    struct ScriptedProbe {
        outcomes: Mutex<VecDeque<ProbeOutcome>>,
    }

    impl ScriptedProbe {
        fn new(outcomes: Vec<ProbeOutcome>) -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(outcomes.into()),
            })
        }
    }

    #[async_trait]
    impl HealthProbe for ScriptedProbe {
        async fn probe(&self) -> ProbeOutcome {
            self.outcomes
                .lock()
                .expect("probe lock")
                .pop_front()
                .unwrap_or(ProbeOutcome::Success)
        }
    }

    fn fast_policy() -> HealthPolicy {
        HealthPolicy {
            interval: Duration::from_millis(10),
            timeout: Duration::from_millis(50),
            start_period: Duration::ZERO,
            retries: 3,
        }
    }

    #[tokio::test]
    async fn monitor_reports_unhealthy_after_three_failures() {
        let probe = ScriptedProbe::new(vec![
            ProbeOutcome::failure("timeout"),
            ProbeOutcome::failure("timeout"),
            ProbeOutcome::failure("timeout"),
        ]);
        let cancel = CancellationToken::new();
        let monitor = HealthMonitor::new(probe, fast_policy(), None, cancel.clone());
        let mut stream = Box::pin(monitor.monitor());

        let mut transitions = Vec::new();
        for _ in 0..3 {
            let obs = tokio::time::timeout(Duration::from_secs(1), stream.next())
                .await
                .expect("observation")
                .expect("stream alive");
            if let Some(t) = obs.transition {
                transitions.push(t);
            }
        }
        cancel.cancel();

        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions[0].to, HealthState::Unhealthy);
    }

    #[tokio::test]
    async fn monitor_recovers_on_success() {
        let probe = ScriptedProbe::new(vec![
            ProbeOutcome::failure("503"),
            ProbeOutcome::failure("503"),
            ProbeOutcome::failure("503"),
            ProbeOutcome::Success,
        ]);
        let cancel = CancellationToken::new();
        let monitor = HealthMonitor::new(probe, fast_policy(), None, cancel.clone());
        let mut stream = Box::pin(monitor.monitor());

        let mut last = None;
        for _ in 0..4 {
            let obs = tokio::time::timeout(Duration::from_secs(1), stream.next())
                .await
                .expect("observation")
                .expect("stream alive");
            last = Some(obs);
        }
        cancel.cancel();

        let last = last.expect("four observations");
        assert_eq!(last.state, HealthState::Healthy);
        assert_eq!(last.consecutive_failures, 0);
        assert_eq!(
            last.transition.expect("recovery transition").from,
            HealthState::Unhealthy
        );
    }

    #[tokio::test]
    async fn monitor_reports_process_down() {
        // PID 999999 should not exist.
        let probe = ScriptedProbe::new(vec![]);
        let cancel = CancellationToken::new();
        let monitor = HealthMonitor::new(probe, fast_policy(), Some(999_999), cancel.clone());
        let mut stream = Box::pin(monitor.monitor());

        let obs = tokio::time::timeout(Duration::from_secs(1), stream.next())
            .await
            .expect("observation")
            .expect("stream alive");
        cancel.cancel();

        assert_eq!(obs.outcome, ProbeOutcome::ProcessDown);
        assert_eq!(obs.state, HealthState::Unhealthy);
    }

    #[tokio::test]
    async fn monitor_stops_on_cancellation() {
        let probe = ScriptedProbe::new(vec![]);
        let cancel = CancellationToken::new();
        let monitor = HealthMonitor::new(probe, fast_policy(), None, cancel.clone());
        let mut stream = Box::pin(monitor.monitor());

        cancel.cancel();

        // Stream may yield at most one in-flight observation, then end.
        let result = tokio::time::timeout(Duration::from_millis(200), stream.next()).await;
        match result {
            Ok(Some(_)) => {
                let next = tokio::time::timeout(Duration::from_millis(200), stream.next()).await;
                assert!(next.is_err() || next.unwrap().is_none());
            }
            Ok(None) => {} // Stream completed, good
            Err(_) => {}   // Timeout, stream is done, good
        }
    }
}
