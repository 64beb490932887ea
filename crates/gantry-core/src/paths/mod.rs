//! Path utilities for gantry data directories.
//!
//! Canonical path resolution for everything gantry writes to disk:
//! the data root and the PID-file directory under it.
//!
//! # Design
//!
//! - Returns `PathBuf` and `PathError` for clear error handling
//! - No interactive/terminal I/O - adapters handle user prompts separately
//! - OS-specific logic is kept private in `platform`

mod error;
mod pids;
mod platform;

pub use error::PathError;
pub use pids::pids_dir;
pub use platform::data_root;
