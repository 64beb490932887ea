//! Check command handler.
//!
//! One-shot probe of the application health endpoint — the command a
//! container health check would invoke. Exit status is the verdict: zero
//! when healthy, non-zero otherwise.

use std::time::Duration;

use anyhow::Result;

use crate::bootstrap::CliContext;
use gantry_runtime::{check_http_health, wait_for_http_health};

/// Flag overrides for the check command.
#[derive(Debug, Clone, Default)]
pub struct CheckArgs {
    /// Port to probe.
    pub port: Option<u16>,
    /// Health endpoint path.
    pub path: Option<String>,
    /// Probe timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Keep polling up to this many seconds until healthy.
    pub wait: Option<u64>,
}

/// Execute the check command.
pub async fn execute(ctx: &CliContext, args: CheckArgs) -> Result<()> {
    let settings = &ctx.settings;
    let port = args.port.unwrap_or_else(|| settings.effective_app_port());
    let path = args
        .path
        .unwrap_or_else(|| settings.effective_health_path().to_string());
    let timeout = args
        .timeout_secs
        .map_or(settings.health_policy().timeout, Duration::from_secs);

    if let Some(wait_secs) = args.wait {
        wait_for_http_health(port, &path, wait_secs).await?;
        println!("healthy: http://127.0.0.1:{}{}", port, path);
        return Ok(());
    }

    if check_http_health(port, &path, timeout).await? {
        println!("healthy: http://127.0.0.1:{}{}", port, path);
        Ok(())
    } else {
        anyhow::bail!(
            "unhealthy: no success response from http://127.0.0.1:{}{} within {}s",
            port,
            path,
            timeout.as_secs()
        )
    }
}
