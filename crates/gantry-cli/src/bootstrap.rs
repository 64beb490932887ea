//! CLI bootstrap - settings resolution.
//!
//! The composition root for the CLI: resolves the settings manifest, layers
//! environment overrides on top, and validates the result. Handlers receive
//! a [`CliContext`] and never touch the filesystem or environment for
//! configuration themselves.

use std::path::PathBuf;

use anyhow::Result;

use gantry_core::settings::{Settings, validate_settings};

/// Configuration for the CLI bootstrap.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Path to the settings manifest.
    pub manifest_path: PathBuf,
}

impl CliConfig {
    /// Resolve the manifest path, defaulting to `./gantry.toml`.
    #[must_use]
    pub fn new(manifest_path: Option<PathBuf>) -> Self {
        Self {
            manifest_path: manifest_path.unwrap_or_else(|| PathBuf::from("gantry.toml")),
        }
    }
}

/// Shared context for all CLI handlers.
pub struct CliContext {
    /// Effective settings after manifest + environment layering.
    pub settings: Settings,
}

/// Bootstrap the CLI context.
pub fn bootstrap(config: CliConfig) -> Result<CliContext> {
    let mut settings = Settings::load_or_default(&config.manifest_path)?;
    settings.apply_env_overrides()?;
    validate_settings(&settings)?;

    Ok(CliContext { settings })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn bootstrap_without_manifest_uses_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = CliConfig::new(Some(dir.path().join("gantry.toml")));

        let ctx = bootstrap(config).expect("bootstrap");
        assert_eq!(ctx.settings.effective_app_port(), 8501);
    }

    #[test]
    fn bootstrap_reads_manifest() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("gantry.toml");
        fs::write(
            &path,
            "[app]\ncommand = \"streamlit\"\nargs = [\"run\", \"app.py\"]\n",
        )
        .expect("write manifest");

        let ctx = bootstrap(CliConfig::new(Some(path))).expect("bootstrap");
        let spec = ctx.settings.app_spec().expect("app spec");
        assert_eq!(spec.args, vec!["run", "app.py"]);
    }

    #[test]
    fn bootstrap_rejects_invalid_manifest_values() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("gantry.toml");
        fs::write(&path, "[health]\nretries = 0\n").expect("write manifest");

        assert!(bootstrap(CliConfig::new(Some(path))).is_err());
    }
}
