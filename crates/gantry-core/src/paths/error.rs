//! Path resolution error type.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from path resolution and directory creation.
#[derive(Debug, Clone, Error)]
pub enum PathError {
    /// No platform data directory could be determined.
    #[error("Could not determine a data directory for this platform")]
    NoDataDir,

    /// A directory could not be created.
    #[error("Failed to create directory {path}: {reason}")]
    CreateFailed {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error text.
        reason: String,
    },
}
