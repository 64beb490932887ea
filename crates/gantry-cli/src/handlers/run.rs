//! Run command handler.
//!
//! Launches the configured application, serves the admin API, and
//! supervises until interrupted.

use anyhow::Result;

use crate::bootstrap::CliContext;
use gantry_axum::{AdminConfig, start_server};
use gantry_core::ports::ProcessRunner;
use gantry_core::settings::validate_settings;

/// Flag overrides for the run command.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunArgs {
    /// Override the application listen port.
    pub port: Option<u16>,
    /// Override the admin API port.
    pub admin_port: Option<u16>,
    /// Do not serve the admin API.
    pub no_admin: bool,
    /// Permit running as root.
    pub allow_root: bool,
}

/// Execute the run command.
///
/// Blocks until Ctrl+C, then stops the application gracefully.
pub async fn execute(ctx: &CliContext, args: RunArgs) -> Result<()> {
    let mut settings = ctx.settings.clone();
    if let Some(port) = args.port {
        settings.app.port = Some(port);
    }
    if let Some(port) = args.admin_port {
        settings.admin.port = Some(port);
    }
    if args.no_admin {
        settings.admin.enabled = Some(false);
    }
    if args.allow_root {
        settings.app.allow_root = Some(true);
    }
    validate_settings(&settings)?;

    let (supervisor, admin_ctx) = gantry_axum::bootstrap(&settings)?;
    let spec = settings.app_spec()?;

    println!("Launching {} ({})", spec.name, spec.program.display());
    println!(
        "Application will listen on http://{}:{}",
        spec.address, spec.port
    );

    supervisor.start(spec).await?;

    if settings.admin_enabled() {
        let admin_config = AdminConfig::from_settings(&settings);
        println!(
            "Admin API: http://localhost:{}/api/status",
            admin_config.port
        );
        tokio::spawn(async move {
            if let Err(e) = start_server(admin_config, admin_ctx).await {
                tracing::error!(error = %e, "Admin server exited");
            }
        });
    }

    println!("Press Ctrl+C to stop");
    tokio::signal::ctrl_c().await?;

    println!("Shutting down...");
    supervisor.stop().await?;
    println!("Stopped");

    Ok(())
}
