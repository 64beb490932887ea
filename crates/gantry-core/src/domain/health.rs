//! Health policy and the probe state machine.
//!
//! Encodes the supervisory health-check contract: a probe every `interval`,
//! each attempt bounded by `timeout`, failures during the initial
//! `start_period` forgiven, and `retries` consecutive failures after that
//! marking the service unhealthy. A single success always returns the
//! service to healthy.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Probe cadence and failure thresholds for a supervised service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthPolicy {
    /// Time between consecutive probes.
    pub interval: Duration,
    /// Maximum time a single probe may take before counting as a failure.
    pub timeout: Duration,
    /// Grace window after launch during which failures do not count.
    pub start_period: Duration,
    /// Consecutive failures required to mark the service unhealthy.
    pub retries: u32,
}

impl Default for HealthPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(crate::settings::DEFAULT_PROBE_INTERVAL_SECS),
            timeout: Duration::from_secs(crate::settings::DEFAULT_PROBE_TIMEOUT_SECS),
            start_period: Duration::from_secs(crate::settings::DEFAULT_START_PERIOD_SECS),
            retries: crate::settings::DEFAULT_PROBE_RETRIES,
        }
    }
}

/// Health state of a supervised service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    /// Launched, inside or just past the start period, no verdict yet.
    Starting,
    /// The last probe succeeded.
    Healthy,
    /// The failure threshold was reached, or the process died.
    Unhealthy,
}

impl HealthState {
    /// Check if the state represents a healthy service.
    #[must_use]
    pub const fn is_healthy(self) -> bool {
        matches!(self, Self::Healthy)
    }

    /// Check if the state represents a failed service.
    #[must_use]
    pub const fn is_failed(self) -> bool {
        matches!(self, Self::Unhealthy)
    }
}

impl std::fmt::Display for HealthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Starting => write!(f, "starting"),
            Self::Healthy => write!(f, "healthy"),
            Self::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Result of a single health probe attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The endpoint answered with a success status within the timeout.
    Success,
    /// The endpoint answered with a non-success status, timed out, or was
    /// unreachable.
    Failure {
        /// Human-readable reason from the probe attempt.
        reason: String,
    },
    /// The supervised process no longer exists.
    ProcessDown,
}

impl ProbeOutcome {
    /// Create a failure outcome.
    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure {
            reason: reason.into(),
        }
    }

    /// Check if this outcome is a success.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// An edge-triggered state change produced by [`HealthTracker::observe`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthTransition {
    /// State before the observation.
    pub from: HealthState,
    /// State after the observation.
    pub to: HealthState,
    /// Reason attached to the observation, if any.
    pub reason: Option<String>,
}

/// Pure state machine applying a [`HealthPolicy`] to a stream of probe
/// outcomes.
///
/// The tracker is policy-free about time: the caller supplies the elapsed
/// time since launch with each observation, which keeps the machine
/// deterministic and testable without clocks.
#[derive(Debug, Clone)]
pub struct HealthTracker {
    policy: HealthPolicy,
    state: HealthState,
    consecutive_failures: u32,
}

impl HealthTracker {
    /// Create a tracker for a freshly launched service.
    #[must_use]
    pub const fn new(policy: HealthPolicy) -> Self {
        Self {
            policy,
            state: HealthState::Starting,
            consecutive_failures: 0,
        }
    }

    /// Current health state.
    #[must_use]
    pub const fn state(&self) -> HealthState {
        self.state
    }

    /// Consecutive failures counted against the retry budget.
    #[must_use]
    pub const fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// The policy this tracker applies.
    #[must_use]
    pub const fn policy(&self) -> &HealthPolicy {
        &self.policy
    }

    /// Feed one probe outcome into the machine.
    ///
    /// `elapsed` is the time since the service was launched. Returns a
    /// transition only when the state actually changes.
    pub fn observe(
        &mut self,
        outcome: &ProbeOutcome,
        elapsed: Duration,
    ) -> Option<HealthTransition> {
        match outcome {
            ProbeOutcome::Success => {
                self.consecutive_failures = 0;
                self.transition_to(HealthState::Healthy, None)
            }
            ProbeOutcome::ProcessDown => {
                // A dead process cannot recover by waiting out the retry
                // budget; report immediately.
                self.consecutive_failures = self.policy.retries;
                self.transition_to(
                    HealthState::Unhealthy,
                    Some("process exited".to_string()),
                )
            }
            ProbeOutcome::Failure { reason } => {
                // Failures inside the start period are forgiven, but only
                // while the service has never been healthy.
                if self.state == HealthState::Starting && elapsed < self.policy.start_period {
                    return None;
                }

                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                if self.consecutive_failures >= self.policy.retries {
                    self.transition_to(HealthState::Unhealthy, Some(reason.clone()))
                } else {
                    None
                }
            }
        }
    }

    fn transition_to(
        &mut self,
        to: HealthState,
        reason: Option<String>,
    ) -> Option<HealthTransition> {
        if self.state == to {
            return None;
        }
        let from = self.state;
        self.state = to;
        Some(HealthTransition { from, to, reason })
    }
}
