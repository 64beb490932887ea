//! Paths command handler.
//!
//! Prints the resolved gantry directories for diagnostics.

use anyhow::Result;

use gantry_core::paths::{data_root, pids_dir};

/// Execute the paths command.
pub fn execute() -> Result<()> {
    println!("Data root: {}", data_root()?.display());
    println!("PID files: {}", pids_dir()?.display());
    Ok(())
}
