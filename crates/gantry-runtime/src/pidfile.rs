//! PID file management for the supervised application.
//!
//! Format: two-line text file
//! ```text
//! <pid>
//! <port>
//! ```
//!
//! # Safety guarantees
//! - Atomic writes via temp file + rename
//! - Process verification before killing (prevents PID reuse issues)
//! - Idempotent deletes

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use sysinfo::{Pid, ProcessStatus, ProcessesToUpdate, System};

use gantry_core::paths::pids_dir;

/// PID file content parsed from disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PidFileData {
    pub pid: u32,
    pub port: u16,
}

/// Write the PID file for `name` atomically using temp file + rename.
pub fn write_pidfile(name: &str, pid: u32, port: u16) -> io::Result<PathBuf> {
    let dir = pids_dir().map_err(io::Error::other)?;
    write_pidfile_in(&dir, name, pid, port)
}

/// Read the PID file for `name`.
pub fn read_pidfile(name: &str) -> io::Result<PidFileData> {
    let dir = pids_dir().map_err(io::Error::other)?;
    read_pidfile_in(&dir, name)
}

/// Delete the PID file for `name` (idempotent - no error if missing).
pub fn delete_pidfile(name: &str) -> io::Result<()> {
    let dir = pids_dir().map_err(io::Error::other)?;
    delete_pidfile_in(&dir, name)
}

/// Directory-parameterized write, used directly by tests.
pub fn write_pidfile_in(dir: &Path, name: &str, pid: u32, port: u16) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;

    let filename = format!("{}.pid", name);
    let final_path = dir.join(&filename);
    let temp_path = dir.join(format!("{}.tmp", filename));

    let content = format!("{}\n{}\n", pid, port);
    fs::write(&temp_path, content)?;

    // Atomic rename
    fs::rename(&temp_path, &final_path)?;

    Ok(final_path)
}

/// Directory-parameterized read.
pub fn read_pidfile_in(dir: &Path, name: &str) -> io::Result<PidFileData> {
    let path = dir.join(format!("{}.pid", name));
    let content = fs::read_to_string(&path)?;
    parse_pidfile_content(&content)
}

/// Directory-parameterized delete.
pub fn delete_pidfile_in(dir: &Path, name: &str) -> io::Result<()> {
    let path = dir.join(format!("{}.pid", name));
    match fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Check whether a PID refers to a live (not zombie) process.
pub fn pid_exists(pid: u32) -> bool {
    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]), false);

    system.process(Pid::from_u32(pid)).is_some_and(|process| {
        matches!(
            process.status(),
            ProcessStatus::Run | ProcessStatus::Sleep | ProcessStatus::Idle
        )
    })
}

fn parse_pidfile_content(content: &str) -> io::Result<PidFileData> {
    let mut lines = content.lines();

    let pid = lines
        .next()
        .and_then(|s| s.trim().parse::<u32>().ok())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "missing or invalid PID"))?;

    let port = lines
        .next()
        .and_then(|s| s.trim().parse::<u16>().ok())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "missing or invalid port"))?;

    Ok(PidFileData { pid, port })
}
