//! Platform-specific data root resolution.

use std::env;
use std::fs;
use std::path::PathBuf;

use super::error::PathError;

/// Environment variable overriding the data root.
pub(super) const DATA_DIR_ENV: &str = "GANTRY_DATA_DIR";

/// Get the root directory for gantry data (PID files, state).
///
/// Resolution order:
/// 1. `GANTRY_DATA_DIR` environment variable (highest priority)
/// 2. System data directory (e.g., `~/.local/share/gantry`)
///
/// The directory is created on demand.
pub fn data_root() -> Result<PathBuf, PathError> {
    // 1. Runtime override (highest priority)
    if let Ok(path) = env::var(DATA_DIR_ENV) {
        return Ok(PathBuf::from(path));
    }

    // 2. Default to system data directory
    let data_dir = dirs::data_local_dir().ok_or(PathError::NoDataDir)?;
    let root = data_dir.join("gantry");

    if !root.exists() {
        fs::create_dir_all(&root).map_err(|e| PathError::CreateFailed {
            path: root.clone(),
            reason: e.to_string(),
        })?;
    }

    Ok(root)
}
