//! Health probe trait definition.
//!
//! A probe performs one bounded attempt against the application's health
//! endpoint. Keeping it behind a port lets the monitor run against scripted
//! probes in tests.

use async_trait::async_trait;

use crate::domain::ProbeOutcome;

/// Single-shot health probe against the supervised application.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Perform one probe attempt.
    ///
    /// Implementations bound the attempt with the policy timeout and map
    /// every failure mode (non-success status, timeout, connect error) to
    /// [`ProbeOutcome::Failure`]; they never return transport errors.
    async fn probe(&self) -> ProbeOutcome;
}
