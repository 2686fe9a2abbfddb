//! Cleanup routine run as a child process
//!
//! The routine is interactive; the selection is fed on stdin so it runs
//! unattended. Its output goes straight to the operator's terminal.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use log::{info, warn};

use super::traits::CleanupRoutine;
use crate::domain::CleanupStatus;
use crate::error::{Result, SupervisorError};

/// Cleanup routine executed with `sh -c`
#[derive(Debug, Clone)]
pub struct CommandCleanup {
    /// The command to execute
    pub command: String,
    /// Menu choice written to stdin
    pub selection: String,
    /// Directory to run in
    pub work_dir: PathBuf,
}

impl CommandCleanup {
    pub fn new(command: impl Into<String>, selection: impl Into<String>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            selection: selection.into(),
            work_dir: work_dir.into(),
        }
    }
}

impl CleanupRoutine for CommandCleanup {
    fn run(&self) -> Result<CleanupStatus> {
        info!("Running cleanup routine: {}", self.command);
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .current_dir(&self.work_dir)
            .stdin(Stdio::piped())
            .spawn()
            .map_err(|e| SupervisorError::CleanupInvocationFailed(format!("{}: {}", self.command, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            // The routine may exit before reading; a broken pipe is not our failure
            if let Err(e) = writeln!(stdin, "{}", self.selection) {
                warn!("Could not send selection to cleanup routine: {}", e);
            }
        }

        let status = child
            .wait()
            .map_err(|e| SupervisorError::CleanupInvocationFailed(e.to_string()))?;

        if status.success() {
            info!("Cleanup routine succeeded");
            Ok(CleanupStatus::Succeeded)
        } else {
            warn!("Cleanup routine exited with {:?}", status.code());
            Ok(CleanupStatus::Failed { code: status.code() })
        }
    }
}
