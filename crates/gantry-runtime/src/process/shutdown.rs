//! Graceful process shutdown with SIGTERM → SIGKILL escalation.
//!
//! Two strategies:
//! - [`shutdown_child`]: for the owned process with a `Child` handle
//!   (includes reaping)
//! - [`kill_pid`]: for orphaned processes recovered from PID files
//!   (no reaping, PID-only, verified before signaling)

use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;
use tokio::time::sleep;

#[cfg(unix)]
use tokio::time::timeout;

#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;

use gantry_core::ports::ProcessError;

use crate::pidfile::pid_exists;

/// Grace period between SIGTERM and SIGKILL.
const TERM_GRACE: Duration = Duration::from_secs(5);

/// Gracefully shut down a child process, escalating to SIGKILL if needed.
///
/// # Strategy
/// 1. Send SIGTERM and wait up to 5 seconds for graceful exit
/// 2. If still running, send SIGKILL
/// 3. Wait for process reaping (required to avoid zombies)
///
/// # Platform behavior
/// - Unix: SIGTERM via nix, then SIGKILL via `.kill()`
/// - Windows: immediately calls `.kill()` (no graceful shutdown available)
pub async fn shutdown_child(mut child: Child) -> io::Result<ExitStatus> {
    #[cfg(unix)]
    {
        shutdown_unix(&mut child).await
    }

    #[cfg(not(unix))]
    {
        shutdown_windows(&mut child).await
    }
}

#[cfg(unix)]
async fn shutdown_unix(child: &mut Child) -> io::Result<ExitStatus> {
    let pid = child
        .id()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "child has no PID"))?;

    // Phase 1: SIGTERM with grace period
    if let Err(e) = signal::kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
        // Process may have already exited
        if e == nix::errno::Errno::ESRCH {
            return child.wait().await;
        }
        return Err(io::Error::other(e));
    }

    match timeout(TERM_GRACE, child.wait()).await {
        Ok(result) => return result,
        Err(_) => {
            // Timeout - escalate to SIGKILL
        }
    }

    // Phase 2: SIGKILL (via Child::kill which uses SIGKILL on Unix)
    child.kill().await?;

    // Phase 3: Wait for reaping (should be fast after SIGKILL)
    child.wait().await
}

#[cfg(not(unix))]
async fn shutdown_windows(child: &mut Child) -> io::Result<ExitStatus> {
    child.kill().await?;
    child.wait().await
}

/// Terminate an orphaned process by PID.
///
/// Used by `stop` when the supervisor that spawned the process is gone and
/// only the PID file remains. The PID is verified to exist before any
/// signal is sent; if it does not, the orphan is already gone and the call
/// succeeds.
#[cfg(unix)]
pub async fn kill_pid(pid: u32) -> Result<(), ProcessError> {
    if !pid_exists(pid) {
        return Ok(());
    }

    let target = Pid::from_raw(pid as i32);
    match signal::kill(target, Signal::SIGTERM) {
        Ok(()) => {}
        Err(nix::errno::Errno::ESRCH) => return Ok(()),
        Err(e) => {
            return Err(ProcessError::StopFailed(format!(
                "failed to signal pid {}: {}",
                pid, e
            )));
        }
    }

    // Poll for exit during the grace window
    let deadline = tokio::time::Instant::now() + TERM_GRACE;
    while tokio::time::Instant::now() < deadline {
        if !pid_exists(pid) {
            return Ok(());
        }
        sleep(Duration::from_millis(100)).await;
    }

    match signal::kill(target, Signal::SIGKILL) {
        Ok(()) | Err(nix::errno::Errno::ESRCH) => Ok(()),
        Err(e) => Err(ProcessError::StopFailed(format!(
            "failed to kill pid {}: {}",
            pid, e
        ))),
    }
}

#[cfg(not(unix))]
pub async fn kill_pid(pid: u32) -> Result<(), ProcessError> {
    if !pid_exists(pid) {
        return Ok(());
    }
    Err(ProcessError::StopFailed(
        "PID-only termination is not supported on this platform".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::process::Command;

    #[tokio::test]
    #[cfg(unix)]
    async fn shutdown_responds_to_sigterm() {
        // Spawn sleep process that should respond to SIGTERM
        let child = Command::new("sleep")
            .arg("30")
            .spawn()
            .expect("failed to spawn sleep");

        let result = shutdown_child(child).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn shutdown_handles_already_exited() {
        // Spawn process that exits immediately
        let child = Command::new("echo")
            .arg("test")
            .spawn()
            .expect("failed to spawn echo");

        // Give it time to exit
        sleep(Duration::from_millis(100)).await;

        let result = shutdown_child(child).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn kill_pid_of_gone_process_is_ok() {
        assert!(kill_pid(999_999).await.is_ok());
    }
}
