//! Settings domain types, loading, and validation.
//!
//! Settings mirror the declarative deployment contract: every field is
//! optional in serialized form and falls back to the contract's defaults
//! (port 8501, `/_stcore/health`, 30 s interval, 10 s timeout, 5 s start
//! period, 3 retries). Sources are layered: TOML manifest, then `GANTRY_*`
//! environment overrides.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{AppSpec, DEFAULT_BIND_ADDRESS, HealthPolicy};

/// Default port the supervised application listens on.
pub const DEFAULT_APP_PORT: u16 = 8501;

/// Default port for the supervisor admin API.
pub const DEFAULT_ADMIN_PORT: u16 = 9600;

/// Default health endpoint path on the application port.
pub const DEFAULT_HEALTH_PATH: &str = "/_stcore/health";

/// Default seconds between health probes.
pub const DEFAULT_PROBE_INTERVAL_SECS: u64 = 30;

/// Default seconds before a single probe counts as failed.
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 10;

/// Default grace seconds after launch during which failures are forgiven.
pub const DEFAULT_START_PERIOD_SECS: u64 = 5;

/// Default consecutive failures before the service is marked unhealthy.
pub const DEFAULT_PROBE_RETRIES: u32 = 3;

/// Default service name used for PID files and events.
pub const DEFAULT_APP_NAME: &str = "app";

/// Application launch settings (`[app]` in the manifest).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppSettings {
    /// Short service name.
    pub name: Option<String>,
    /// Program to execute.
    pub command: Option<String>,
    /// Arguments passed before the binding flags.
    pub args: Vec<String>,
    /// Working directory for the child.
    pub workdir: Option<PathBuf>,
    /// Extra environment variables for the child.
    pub env: BTreeMap<String, String>,
    /// Bind address (defaults to all interfaces).
    pub address: Option<String>,
    /// Listen port.
    pub port: Option<u16>,
    /// Flag used to pass the bind address.
    pub address_flag: Option<String>,
    /// Flag used to pass the listen port.
    pub port_flag: Option<String>,
    /// Whether to append the binding flags at all.
    pub append_bind_flags: Option<bool>,
    /// Allow running the supervisor as root (off by default).
    pub allow_root: Option<bool>,
}

/// Health probe settings (`[health]` in the manifest).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HealthSettings {
    /// Health endpoint path on the application port.
    pub path: Option<String>,
    /// Seconds between probes.
    pub interval_secs: Option<u64>,
    /// Seconds before a single probe counts as failed.
    pub timeout_secs: Option<u64>,
    /// Grace seconds after launch during which failures are forgiven.
    pub start_period_secs: Option<u64>,
    /// Consecutive failures before the service is marked unhealthy.
    pub retries: Option<u32>,
}

/// Admin API settings (`[admin]` in the manifest).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AdminSettings {
    /// Port for the supervisor admin API.
    pub port: Option<u16>,
    /// Whether to serve the admin API at all.
    pub enabled: Option<bool>,
}

/// Complete gantry settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Application launch settings.
    pub app: AppSettings,
    /// Health probe settings.
    pub health: HealthSettings,
    /// Admin API settings.
    pub admin: AdminSettings,
}

impl Settings {
    /// Load settings from a TOML manifest.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let raw = fs::read_to_string(path).map_err(|e| SettingsError::Io {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        toml::from_str(&raw).map_err(|e| SettingsError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Load settings from a manifest if it exists, otherwise defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, SettingsError> {
        if path.exists() {
            debug!(path = %path.display(), "Loading settings manifest");
            Self::load(path)
        } else {
            debug!(path = %path.display(), "No settings manifest, using defaults");
            Ok(Self::default())
        }
    }

    /// Apply `GANTRY_*` environment overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), SettingsError> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply `GANTRY_*` overrides from an arbitrary lookup.
    ///
    /// Separated from [`Self::apply_env_overrides`] so tests can inject
    /// values without mutating the process environment.
    pub fn apply_env_from(
        &mut self,
        get: impl Fn(&str) -> Option<String>,
    ) -> Result<(), SettingsError> {
        if let Some(command) = get("GANTRY_APP_COMMAND") {
            self.app.command = Some(command);
        }
        if let Some(value) = get("GANTRY_APP_PORT") {
            self.app.port = Some(parse_env("GANTRY_APP_PORT", &value)?);
        }
        if let Some(value) = get("GANTRY_ADMIN_PORT") {
            self.admin.port = Some(parse_env("GANTRY_ADMIN_PORT", &value)?);
        }
        if let Some(path) = get("GANTRY_HEALTH_PATH") {
            self.health.path = Some(path);
        }
        if let Some(value) = get("GANTRY_PROBE_INTERVAL_SECS") {
            self.health.interval_secs = Some(parse_env("GANTRY_PROBE_INTERVAL_SECS", &value)?);
        }
        if let Some(value) = get("GANTRY_PROBE_TIMEOUT_SECS") {
            self.health.timeout_secs = Some(parse_env("GANTRY_PROBE_TIMEOUT_SECS", &value)?);
        }
        if let Some(value) = get("GANTRY_START_PERIOD_SECS") {
            self.health.start_period_secs = Some(parse_env("GANTRY_START_PERIOD_SECS", &value)?);
        }
        if let Some(value) = get("GANTRY_PROBE_RETRIES") {
            self.health.retries = Some(parse_env("GANTRY_PROBE_RETRIES", &value)?);
        }
        if let Some(value) = get("GANTRY_ALLOW_ROOT") {
            self.app.allow_root = Some(parse_env("GANTRY_ALLOW_ROOT", &value)?);
        }
        Ok(())
    }

    /// Get the effective service name (with default fallback).
    #[must_use]
    pub fn effective_name(&self) -> &str {
        self.app.name.as_deref().unwrap_or(DEFAULT_APP_NAME)
    }

    /// Get the effective application port (with default fallback).
    #[must_use]
    pub fn effective_app_port(&self) -> u16 {
        self.app.port.unwrap_or(DEFAULT_APP_PORT)
    }

    /// Get the effective admin port (with default fallback).
    #[must_use]
    pub fn effective_admin_port(&self) -> u16 {
        self.admin.port.unwrap_or(DEFAULT_ADMIN_PORT)
    }

    /// Get the effective health endpoint path (with default fallback).
    #[must_use]
    pub fn effective_health_path(&self) -> &str {
        self.health.path.as_deref().unwrap_or(DEFAULT_HEALTH_PATH)
    }

    /// Whether the admin API should be served.
    #[must_use]
    pub fn admin_enabled(&self) -> bool {
        self.admin.enabled.unwrap_or(true)
    }

    /// Whether running as root is permitted.
    #[must_use]
    pub fn allow_root(&self) -> bool {
        self.app.allow_root.unwrap_or(false)
    }

    /// Build the effective [`HealthPolicy`].
    #[must_use]
    pub fn health_policy(&self) -> HealthPolicy {
        HealthPolicy {
            interval: Duration::from_secs(
                self.health.interval_secs.unwrap_or(DEFAULT_PROBE_INTERVAL_SECS),
            ),
            timeout: Duration::from_secs(
                self.health.timeout_secs.unwrap_or(DEFAULT_PROBE_TIMEOUT_SECS),
            ),
            start_period: Duration::from_secs(
                self.health.start_period_secs.unwrap_or(DEFAULT_START_PERIOD_SECS),
            ),
            retries: self.health.retries.unwrap_or(DEFAULT_PROBE_RETRIES),
        }
    }

    /// Build the effective [`AppSpec`].
    ///
    /// Fails when no command is configured; everything else has defaults.
    pub fn app_spec(&self) -> Result<AppSpec, SettingsError> {
        let command = self
            .app
            .command
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .ok_or(SettingsError::MissingCommand)?;

        let mut spec = AppSpec::new(
            self.effective_name(),
            command,
            self.effective_app_port(),
        )
        .with_args(self.app.args.clone())
        .with_address(
            self.app
                .address
                .as_deref()
                .unwrap_or(DEFAULT_BIND_ADDRESS),
        );

        if let Some(ref dir) = self.app.workdir {
            spec = spec.with_workdir(dir.clone());
        }
        for (key, value) in &self.app.env {
            spec = spec.with_env(key.clone(), value.clone());
        }

        if self.app.append_bind_flags.unwrap_or(true) {
            if let Some(ref flag) = self.app.address_flag {
                spec.address_flag = Some(flag.clone());
            }
            if let Some(ref flag) = self.app.port_flag {
                spec.port_flag = Some(flag.clone());
            }
        } else {
            spec = spec.with_binding_flags(None, None);
        }

        Ok(spec)
    }
}

fn parse_env<T: std::str::FromStr>(var: &str, value: &str) -> Result<T, SettingsError> {
    value.parse().map_err(|_| SettingsError::InvalidEnv {
        var: var.to_string(),
        value: value.to_string(),
    })
}

/// Validate settings against the contract's invariants.
pub fn validate_settings(settings: &Settings) -> Result<(), SettingsError> {
    let app_port = settings.effective_app_port();
    if app_port < 1024 {
        return Err(SettingsError::PrivilegedPort(app_port));
    }
    let admin_port = settings.effective_admin_port();
    if admin_port < 1024 {
        return Err(SettingsError::PrivilegedPort(admin_port));
    }
    if app_port == admin_port {
        return Err(SettingsError::PortCollision(app_port));
    }

    let policy = settings.health_policy();
    if policy.interval.is_zero() {
        return Err(SettingsError::ZeroDuration("health interval"));
    }
    if policy.timeout.is_zero() {
        return Err(SettingsError::ZeroDuration("health timeout"));
    }
    if policy.retries == 0 {
        return Err(SettingsError::ZeroRetries);
    }

    if !settings.effective_health_path().starts_with('/') {
        return Err(SettingsError::InvalidHealthPath(
            settings.effective_health_path().to_string(),
        ));
    }

    Ok(())
}

/// Settings loading and validation error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to read settings file {path}: {reason}")]
    Io { path: PathBuf, reason: String },

    #[error("Failed to parse settings file {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error(
        "No application command configured (set [app] command in the manifest or GANTRY_APP_COMMAND)"
    )]
    MissingCommand,

    #[error("Port {0} is privileged; use a port >= 1024")]
    PrivilegedPort(u16),

    #[error("Application and admin API cannot share port {0}")]
    PortCollision(u16),

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("Health retries must be at least 1")]
    ZeroRetries,

    #[error("Health path must start with '/', got {0:?}")]
    InvalidHealthPath(String),

    #[error("Invalid value for {var}: {value:?}")]
    InvalidEnv { var: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_deployment_contract() {
        let settings = Settings::default();
        assert_eq!(settings.effective_app_port(), 8501);
        assert_eq!(settings.effective_health_path(), "/_stcore/health");

        let policy = settings.health_policy();
        assert_eq!(policy.interval, Duration::from_secs(30));
        assert_eq!(policy.timeout, Duration::from_secs(10));
        assert_eq!(policy.start_period, Duration::from_secs(5));
        assert_eq!(policy.retries, 3);

        assert!(settings.admin_enabled());
        assert!(!settings.allow_root());
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn manifest_round_trips() {
        let raw = r#"
            [app]
            name = "nba-agent"
            command = "streamlit"
            args = ["run", "app.py"]
            workdir = "/srv/app"
            port = 8501

            [app.env]
            PYTHONUNBUFFERED = "1"

            [health]
            interval_secs = 15
            retries = 5

            [admin]
            port = 9700
        "#;
        let settings: Settings = toml::from_str(raw).expect("parse manifest");

        assert_eq!(settings.effective_name(), "nba-agent");
        assert_eq!(settings.effective_admin_port(), 9700);
        assert_eq!(settings.health_policy().retries, 5);
        assert_eq!(
            settings.health_policy().interval,
            Duration::from_secs(15)
        );

        let spec = settings.app_spec().expect("app spec");
        assert_eq!(spec.program, PathBuf::from("streamlit"));
        assert_eq!(spec.args, vec!["run", "app.py"]);
        assert_eq!(spec.env.get("PYTHONUNBUFFERED").map(String::as_str), Some("1"));
    }

    #[test]
    fn load_or_default_without_manifest() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings =
            Settings::load_or_default(&dir.path().join("gantry.toml")).expect("load");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn load_reports_parse_errors_with_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("gantry.toml");
        fs::write(&path, "[app\ncommand = ").expect("write");

        let err = Settings::load(&path).expect_err("should fail");
        assert!(matches!(err, SettingsError::Parse { .. }));
        assert!(err.to_string().contains("gantry.toml"));
    }

    #[test]
    fn env_overrides_take_precedence() {
        let mut settings = Settings::default();
        settings.app.port = Some(8501);

        settings
            .apply_env_from(|key| match key {
                "GANTRY_APP_COMMAND" => Some("streamlit".to_string()),
                "GANTRY_APP_PORT" => Some("8600".to_string()),
                "GANTRY_PROBE_RETRIES" => Some("4".to_string()),
                "GANTRY_ALLOW_ROOT" => Some("true".to_string()),
                _ => None,
            })
            .expect("overrides apply");

        assert_eq!(settings.effective_app_port(), 8600);
        assert_eq!(settings.health_policy().retries, 4);
        assert!(settings.allow_root());
        assert!(settings.app_spec().is_ok());
    }

    #[test]
    fn invalid_env_value_is_rejected() {
        let mut settings = Settings::default();
        let err = settings
            .apply_env_from(|key| {
                (key == "GANTRY_APP_PORT").then(|| "not-a-port".to_string())
            })
            .expect_err("should fail");
        assert!(matches!(err, SettingsError::InvalidEnv { .. }));
    }

    #[test]
    fn app_spec_requires_a_command() {
        let settings = Settings::default();
        assert!(matches!(
            settings.app_spec(),
            Err(SettingsError::MissingCommand)
        ));
    }

    #[test]
    fn validation_rejects_privileged_ports() {
        let mut settings = Settings::default();
        settings.app.port = Some(80);
        assert!(matches!(
            validate_settings(&settings),
            Err(SettingsError::PrivilegedPort(80))
        ));
    }

    #[test]
    fn validation_rejects_port_collision() {
        let mut settings = Settings::default();
        settings.app.port = Some(9000);
        settings.admin.port = Some(9000);
        assert!(matches!(
            validate_settings(&settings),
            Err(SettingsError::PortCollision(9000))
        ));
    }

    #[test]
    fn validation_rejects_zero_retries_and_durations() {
        let mut settings = Settings::default();
        settings.health.retries = Some(0);
        assert!(matches!(
            validate_settings(&settings),
            Err(SettingsError::ZeroRetries)
        ));

        let mut settings = Settings::default();
        settings.health.interval_secs = Some(0);
        assert!(matches!(
            validate_settings(&settings),
            Err(SettingsError::ZeroDuration(_))
        ));
    }

    #[test]
    fn validation_rejects_relative_health_path() {
        let mut settings = Settings::default();
        settings.health.path = Some("health".to_string());
        assert!(matches!(
            validate_settings(&settings),
            Err(SettingsError::InvalidHealthPath(_))
        ));
    }

    #[test]
    fn bind_flags_can_be_suppressed() {
        let mut settings = Settings::default();
        settings.app.command = Some("uvicorn".to_string());
        settings.app.append_bind_flags = Some(false);

        let spec = settings.app_spec().expect("app spec");
        assert!(spec.address_flag.is_none());
        assert!(spec.port_flag.is_none());
    }
}
