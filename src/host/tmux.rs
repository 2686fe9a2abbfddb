//! tmux as the detached execution host
//!
//! The worker is started with `exec` so the pane process *is* the worker and
//! signals sent to the pane pid reach it directly.

use std::process::{Command, Output};

use log::{debug, info};

use super::traits::{SessionHost, SessionSpec};
use crate::error::{Result, SupervisorError};

/// Session host driving the `tmux` binary
#[derive(Debug, Clone)]
pub struct TmuxHost {
    program: String,
}

impl Default for TmuxHost {
    fn default() -> Self {
        Self::new("tmux")
    }
}

impl TmuxHost {
    /// Create a host using the given tmux binary
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        debug!("{} {}", self.program, args.join(" "));
        Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|e| SupervisorError::SessionCommand {
                command: format!("{} {}", self.program, args.first().copied().unwrap_or_default()),
                reason: e.to_string(),
            })
    }
}

/// Quote a string for `sh`
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// Shell command run inside the session: the worker with its console appended to `console_file`
pub fn session_command(spec: &SessionSpec) -> String {
    format!(
        "exec {} >> {} 2>&1",
        spec.command,
        shell_quote(&spec.console_file.to_string_lossy())
    )
}

/// First pid listed by `list-panes`
pub fn parse_pane_pid(stdout: &str) -> Option<u32> {
    stdout.lines().find_map(|line| line.trim().parse().ok())
}

fn exact(name: &str) -> String {
    format!("={}", name)
}

impl SessionHost for TmuxHost {
    fn create(&self, spec: &SessionSpec) -> Result<()> {
        let work_dir = spec.work_dir.to_string_lossy();
        let command = session_command(spec);
        let output = self.run(&["new-session", "-d", "-s", &spec.name, "-c", &work_dir, &command])?;
        if !output.status.success() {
            return Err(SupervisorError::SessionCommand {
                command: "tmux new-session".to_string(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        info!("Created tmux session '{}' in {}", spec.name, work_dir);
        Ok(())
    }

    fn pane_pid(&self, name: &str) -> Result<Option<u32>> {
        let output = self.run(&["list-panes", "-s", "-t", &exact(name), "-F", "#{pane_pid}"])?;
        if !output.status.success() {
            return Ok(None);
        }
        Ok(parse_pane_pid(&String::from_utf8_lossy(&output.stdout)))
    }

    fn exists(&self, name: &str) -> bool {
        self.run(&["has-session", "-t", &exact(name)])
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn kill(&self, name: &str) -> Result<()> {
        if !self.exists(name) {
            debug!("tmux session '{}' already gone", name);
            return Ok(());
        }
        let output = self.run(&["kill-session", "-t", &exact(name)])?;
        // Lost a race with the session exiting on its own
        if !output.status.success() && self.exists(name) {
            return Err(SupervisorError::SessionCommand {
                command: "tmux kill-session".to_string(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        info!("Killed tmux session '{}'", name);
        Ok(())
    }
}
