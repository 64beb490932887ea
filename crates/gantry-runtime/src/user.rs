//! Unprivileged-execution enforcement.
//!
//! The deployment contract requires the application to run under a
//! restricted account, never as root. The supervisor checks its own
//! effective UID before spawning anything, since the child inherits it.

use thiserror::Error;

/// Errors from the execution-account check.
#[derive(Debug, Clone, Error)]
pub enum UserError {
    /// The supervisor is running with root privileges.
    #[error("refusing to run as root; re-run as an unprivileged user or pass --allow-root")]
    RunningAsRoot,
}

/// Refuse to proceed when running as root, unless explicitly overridden.
#[cfg(unix)]
pub fn ensure_unprivileged(allow_root: bool) -> Result<(), UserError> {
    if nix::unistd::Uid::effective().is_root() && !allow_root {
        return Err(UserError::RunningAsRoot);
    }
    Ok(())
}

#[cfg(not(unix))]
pub fn ensure_unprivileged(_allow_root: bool) -> Result<(), UserError> {
    // No UID model to enforce here; platform account controls apply.
    Ok(())
}

/// Name of the account the supervisor runs as, for status reporting.
#[cfg(unix)]
pub fn current_user() -> Option<String> {
    nix::unistd::User::from_uid(nix::unistd::Uid::effective())
        .ok()
        .flatten()
        .map(|user| user.name)
}

#[cfg(not(unix))]
pub fn current_user() -> Option<String> {
    std::env::var("USERNAME").ok()
}
