//! Status command handler.
//!
//! Reads the PID file, verifies the process is alive, and probes the
//! health endpoint once.

use std::io;

use anyhow::Result;
use serde_json::json;

use crate::bootstrap::CliContext;
use gantry_runtime::check_http_health;
use gantry_runtime::pidfile::{PidFileData, read_pidfile};

/// Execute the status command.
pub async fn execute(ctx: &CliContext, json_output: bool) -> Result<()> {
    let name = ctx.settings.effective_name();

    let data = match read_pidfile(name) {
        Ok(data) => data,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            if json_output {
                println!("{}", json!({ "name": name, "running": false }));
            } else {
                println!("{} is not running (no PID file)", name);
            }
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let alive = gantry_runtime::pidfile::pid_exists(data.pid);
    let healthy = if alive {
        check_http_health(
            data.port,
            ctx.settings.effective_health_path(),
            ctx.settings.health_policy().timeout,
        )
        .await?
    } else {
        false
    };

    if json_output {
        print_json(name, &data, alive, healthy);
    } else {
        print_human(name, &data, alive, healthy);
    }

    Ok(())
}

fn print_json(name: &str, data: &PidFileData, alive: bool, healthy: bool) {
    let report = json!({
        "name": name,
        "running": alive,
        "pid": data.pid,
        "port": data.port,
        "healthy": healthy,
    });
    println!("{}", report);
}

fn print_human(name: &str, data: &PidFileData, alive: bool, healthy: bool) {
    println!("Service:  {}", name);
    println!(
        "Process:  {} ({})",
        data.pid,
        if alive { "alive" } else { "dead" }
    );
    println!("Port:     {}", data.port);
    println!(
        "Health:   {}",
        if healthy { "healthy" } else { "unhealthy" }
    );
}
