//! Application process spawning and log forwarding.

use std::process::Stdio;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use gantry_core::domain::AppSpec;
use gantry_core::ports::ProcessError;

use super::types::{AppProcessInfo, RunningApp};

/// Build the launch command for an application spec.
///
/// The binding flags are appended after the configured arguments so the
/// application ends up listening on `address:port` regardless of its own
/// defaults — the fixed-invocation contract of the deployment.
fn build_command(spec: &AppSpec) -> Command {
    let mut cmd = Command::new(&spec.program);
    cmd.args(&spec.args);

    if let Some(ref flag) = spec.address_flag {
        cmd.arg(flag).arg(&spec.address);
    }
    if let Some(ref flag) = spec.port_flag {
        cmd.arg(flag).arg(spec.port.to_string());
    }

    if let Some(ref dir) = spec.workdir {
        cmd.current_dir(dir);
    }
    for (key, value) in &spec.env {
        cmd.env(key, value);
    }

    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    cmd
}

/// Spawn the application described by `spec`.
///
/// Pipes stdout/stderr into structured logging and returns the running
/// process with its metadata.
pub fn spawn_app(spec: &AppSpec) -> Result<RunningApp, ProcessError> {
    let mut cmd = build_command(spec);
    debug!(program = %spec.program.display(), "Spawning application: {:?}", cmd);

    let mut child = cmd
        .spawn()
        .map_err(|e| ProcessError::StartFailed(format!("{}: {}", spec.program.display(), e)))?;

    let pid = child
        .id()
        .ok_or_else(|| ProcessError::StartFailed("failed to get child PID".to_string()))?;

    spawn_log_readers(&mut child, &spec.name);

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    let info = AppProcessInfo::new(spec.name.clone(), pid, spec.port, now);
    Ok(RunningApp::new(info, child))
}

fn spawn_log_readers(child: &mut Child, name: &str) {
    if let Some(stdout) = child.stdout.take() {
        let service = name.to_string();
        tokio::spawn(async move {
            let reader = BufReader::new(stdout);
            let mut lines = reader.lines();
            while let Ok(Some(text)) = lines.next_line().await {
                info!(target: "gantry.app", service = %service, "{}", text);
            }
            debug!(service = %service, "stdout reader task exiting");
        });
    }

    if let Some(stderr) = child.stderr.take() {
        let service = name.to_string();
        tokio::spawn(async move {
            let reader = BufReader::new(stderr);
            let mut lines = reader.lines();
            while let Ok(Some(text)) = lines.next_line().await {
                warn!(target: "gantry.app", service = %service, "{}", text);
            }
            debug!(service = %service, "stderr reader task exiting");
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program_and_args(cmd: &Command) -> (String, Vec<String>) {
        let std_cmd = cmd.as_std();
        let program = std_cmd.get_program().to_string_lossy().to_string();
        let args = std_cmd
            .get_args()
            .map(|a| a.to_string_lossy().to_string())
            .collect();
        (program, args)
    }

    #[test]
    fn command_appends_binding_flags() {
        let spec = AppSpec::new("app", "streamlit", 8501)
            .with_args(vec!["run".into(), "app.py".into()]);
        let cmd = build_command(&spec);

        let (program, args) = program_and_args(&cmd);
        assert_eq!(program, "streamlit");
        assert_eq!(
            args,
            vec![
                "run",
                "app.py",
                "--server.address",
                "0.0.0.0",
                "--server.port",
                "8501"
            ]
        );
    }

    #[test]
    fn command_honors_suppressed_flags() {
        let spec = AppSpec::new("app", "myapp", 8501).with_binding_flags(None, None);
        let cmd = build_command(&spec);

        let (_, args) = program_and_args(&cmd);
        assert!(args.is_empty());
    }

    #[tokio::test]
    async fn spawn_missing_program_is_start_failed() {
        let spec = AppSpec::new("app", "/nonexistent/program", 8501);
        let err = spawn_app(&spec).expect_err("should fail");
        assert!(matches!(err, ProcessError::StartFailed(_)));
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn spawn_real_process_reports_pid() {
        let spec = AppSpec::new("app", "sleep", 8502)
            .with_args(vec!["5".into()])
            .with_binding_flags(None, None);
        let mut running = spawn_app(&spec).expect("spawn");
        assert!(running.info.pid > 0);

        running.child.kill().await.expect("kill");
        running.child.wait().await.expect("reap");
    }
}
