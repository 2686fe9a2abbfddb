//! Launcher - starts the worker in a detached session and records it.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Local};
use log::{info, warn};

use crate::domain::ProcessRecord;
use crate::error::{Result, SupervisorError};
use crate::host::{Clock, SessionHost, SessionSpec};
use crate::registry::Registry;

/// Wait after creating the session before asking the host for its pid
pub const LAUNCH_SETTLE: Duration = Duration::from_secs(3);

/// What to launch and where its output goes
#[derive(Debug, Clone)]
pub struct LaunchConfig {
    /// Session name, fixed per deployment
    pub session_name: String,
    /// Worker command line
    pub command: String,
    /// Directory the worker runs in
    pub work_dir: PathBuf,
    /// Directory holding the worker's own log files and the console captures
    pub log_dir: PathBuf,
    /// Prefix of the log files the worker writes itself
    pub log_prefix: String,
    /// Prefix of the captured console output, followed by the start timestamp.
    /// Must not start with `log_prefix` or status would read the capture too.
    pub console_prefix: String,
}

/// Result of a successful start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartReport {
    pub record: ProcessRecord,
    /// Where the worker's stdout and stderr are appended
    pub console_file: PathBuf,
}

/// `<log_dir>/<prefix><YYYYmmdd_HHMMSS>.log`
pub fn log_file_name(log_dir: &Path, prefix: &str, started: DateTime<Local>) -> PathBuf {
    log_dir.join(format!("{}{}.log", prefix, started.format("%Y%m%d_%H%M%S")))
}

/// Starts the worker. One launch per instance of the deployment's session name.
pub struct Launcher<'a, R, S, C> {
    config: &'a LaunchConfig,
    registry: &'a R,
    sessions: &'a S,
    clock: &'a C,
}

impl<'a, R, S, C> Launcher<'a, R, S, C>
where
    R: Registry,
    S: SessionHost,
    C: Clock,
{
    pub fn new(config: &'a LaunchConfig, registry: &'a R, sessions: &'a S, clock: &'a C) -> Self {
        Self {
            config,
            registry,
            sessions,
            clock,
        }
    }

    /// Start the worker unless one is already recorded.
    pub fn start(&self) -> Result<StartReport> {
        if let Some(existing) = self.registry.read()? {
            warn!("Refusing to start, worker already running: {}", existing);
            return Err(SupervisorError::AlreadyRunning { pid: existing.pid });
        }

        let name = &self.config.session_name;
        if self.sessions.exists(name) {
            warn!("Removing leftover session '{}' with no live worker record", name);
            self.sessions.kill(name)?;
        }

        if self.config.console_prefix.starts_with(&self.config.log_prefix) {
            warn!(
                "Console prefix '{}' overlaps worker log prefix '{}'; status will count console lines",
                self.config.console_prefix, self.config.log_prefix
            );
        }

        fs::create_dir_all(&self.config.log_dir)?;
        let console_file = log_file_name(&self.config.log_dir, &self.config.console_prefix, Local::now());
        let spec = SessionSpec {
            name: name.clone(),
            command: self.config.command.clone(),
            work_dir: self.config.work_dir.clone(),
            console_file: console_file.clone(),
        };
        self.sessions.create(&spec)?;
        info!(
            "Started '{}' in session '{}', console to {}",
            spec.command,
            name,
            console_file.display()
        );

        self.clock.sleep(LAUNCH_SETTLE);

        let Some(pid) = self.sessions.pane_pid(name)? else {
            warn!("Session '{}' did not register, tearing it down", name);
            if let Err(e) = self.sessions.kill(name) {
                warn!("Could not remove session '{}': {}", name, e);
            }
            return Err(SupervisorError::SessionNotFound { session: name.clone() });
        };

        let record = ProcessRecord::new(pid, name.clone());
        self.registry.write(&record)?;
        Ok(StartReport { record, console_file })
    }
}
