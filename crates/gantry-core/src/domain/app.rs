//! Application launch specification.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default bind address for the supervised application.
///
/// The application is expected to accept connections on all interfaces,
/// the same way a containerized service would.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";

/// Configuration for launching the supervised application.
///
/// This is an intent-based configuration — it expresses what the caller
/// wants, not how the process is spawned. The runtime appends the binding
/// flags (`address_flag`/`port_flag`) so the application ends up listening
/// on `address:port` regardless of its own defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSpec {
    /// Short service name, used for PID files and event payloads.
    pub name: String,
    /// Program to execute.
    pub program: PathBuf,
    /// Arguments passed before the binding flags.
    pub args: Vec<String>,
    /// Working directory for the child (if None, inherit).
    pub workdir: Option<PathBuf>,
    /// Extra environment variables for the child.
    pub env: BTreeMap<String, String>,
    /// Address the application must bind to.
    pub address: String,
    /// Port the application must listen on.
    pub port: u16,
    /// Flag used to pass the bind address (if None, no flag is appended).
    pub address_flag: Option<String>,
    /// Flag used to pass the listen port (if None, no flag is appended).
    pub port_flag: Option<String>,
}

impl AppSpec {
    /// Create a spec with required fields and default binding behavior.
    pub fn new(name: impl Into<String>, program: impl Into<PathBuf>, port: u16) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args: Vec::new(),
            workdir: None,
            env: BTreeMap::new(),
            address: DEFAULT_BIND_ADDRESS.to_string(),
            port,
            address_flag: Some("--server.address".to_string()),
            port_flag: Some("--server.port".to_string()),
        }
    }

    /// Set the arguments passed before the binding flags.
    #[must_use]
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Set the working directory for the child.
    #[must_use]
    pub fn with_workdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(dir.into());
        self
    }

    /// Add an environment variable for the child.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Override the bind address.
    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    /// Override the binding flag names (e.g. `--host` / `--port`).
    ///
    /// Pass `None` to suppress a flag entirely for applications that take
    /// their binding from the environment instead.
    #[must_use]
    pub fn with_binding_flags(
        mut self,
        address_flag: Option<String>,
        port_flag: Option<String>,
    ) -> Self {
        self.address_flag = address_flag;
        self.port_flag = port_flag;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_defaults_bind_all_interfaces() {
        let spec = AppSpec::new("app", "streamlit", 8501);
        assert_eq!(spec.address, DEFAULT_BIND_ADDRESS);
        assert_eq!(spec.port, 8501);
        assert_eq!(spec.address_flag.as_deref(), Some("--server.address"));
        assert_eq!(spec.port_flag.as_deref(), Some("--server.port"));
    }

    #[test]
    fn builder_methods_compose() {
        let spec = AppSpec::new("app", "streamlit", 8501)
            .with_args(vec!["run".into(), "app.py".into()])
            .with_workdir("/srv/app")
            .with_env("PYTHONUNBUFFERED", "1")
            .with_binding_flags(Some("--host".into()), Some("--port".into()));

        assert_eq!(spec.args, vec!["run", "app.py"]);
        assert_eq!(spec.workdir.as_deref(), Some(std::path::Path::new("/srv/app")));
        assert_eq!(spec.env.get("PYTHONUNBUFFERED").map(String::as_str), Some("1"));
        assert_eq!(spec.port_flag.as_deref(), Some("--port"));
    }
}
