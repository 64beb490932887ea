//! CLI entry point - the composition root.
//!
//! This is the ONLY place where infrastructure is wired together via
//! bootstrap. Command dispatch routes to handlers which delegate to the
//! supervisor and runtime helpers.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use gantry_cli::handlers::{check, paths, run, status, stop};
use gantry_cli::{Cli, CliConfig, Commands, bootstrap};

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    init_tracing(cli.verbose);

    // Bootstrap the CLI context (composition root)
    let config = CliConfig::new(cli.config.clone());
    let ctx = bootstrap(config)?;

    // Dispatch to appropriate handler
    let Some(command) = cli.command else {
        // No command provided - show help
        use clap::CommandFactory;
        gantry_cli::Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Run {
            port,
            admin_port,
            no_admin,
            allow_root,
        } => {
            let args = run::RunArgs {
                port,
                admin_port,
                no_admin,
                allow_root,
            };
            run::execute(&ctx, args).await?;
        }
        Commands::Check {
            port,
            path,
            timeout_secs,
            wait,
        } => {
            let args = check::CheckArgs {
                port,
                path,
                timeout_secs,
                wait,
            };
            check::execute(&ctx, args).await?;
        }
        Commands::Status { json } => {
            status::execute(&ctx, json).await?;
        }
        Commands::Stop => {
            stop::execute(&ctx).await?;
        }
        Commands::Paths => {
            paths::execute()?;
        }
    }

    Ok(())
}
