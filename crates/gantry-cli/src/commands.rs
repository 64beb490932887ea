//! Subcommand definitions.

use clap::Subcommand;

/// Top-level gantry subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Launch the application and supervise it until Ctrl+C
    Run {
        /// Override the application listen port
        #[arg(long)]
        port: Option<u16>,

        /// Override the admin API port
        #[arg(long = "admin-port")]
        admin_port: Option<u16>,

        /// Do not serve the admin API
        #[arg(long = "no-admin")]
        no_admin: bool,

        /// Permit running as root (discouraged)
        #[arg(long = "allow-root", env = "GANTRY_ALLOW_ROOT")]
        allow_root: bool,
    },

    /// Probe the application health endpoint once; exit non-zero on failure
    Check {
        /// Port to probe (defaults to the configured application port)
        #[arg(long)]
        port: Option<u16>,

        /// Health endpoint path (defaults to the configured path)
        #[arg(long)]
        path: Option<String>,

        /// Probe timeout in seconds (defaults to the configured timeout)
        #[arg(long = "timeout-secs")]
        timeout_secs: Option<u64>,

        /// Keep polling up to this many seconds until healthy
        #[arg(long)]
        wait: Option<u64>,
    },

    /// Show the supervised application status from the PID file
    Status {
        /// Emit machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Stop the application recorded in the PID file
    Stop,

    /// Print resolved gantry paths
    Paths,
}
