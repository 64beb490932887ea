//! Stop command handler.
//!
//! Recovers the application PID from disk and terminates it gracefully.

use std::io;

use anyhow::Result;

use crate::bootstrap::CliContext;
use gantry_runtime::pidfile::{delete_pidfile, read_pidfile};
use gantry_runtime::process::kill_pid;

/// Execute the stop command.
pub async fn execute(ctx: &CliContext) -> Result<()> {
    let name = ctx.settings.effective_name();

    match read_pidfile(name) {
        Ok(data) => {
            println!("Stopping {} (pid {})", name, data.pid);
            kill_pid(data.pid).await?;
            delete_pidfile(name)?;
            println!("Stopped");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            println!("{} is not running (no PID file)", name);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
