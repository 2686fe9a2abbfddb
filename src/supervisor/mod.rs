//! Supervisor facade
//!
//! Composes the registry, launcher, shutdown orchestrator and log extractor
//! behind the four commands the CLI exposes: `start`, `stop`, `status` and
//! `monitor`. Each command maps to exactly one exit code via [`exit_code`].

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use log::info;

use crate::config::Config;
use crate::domain::{ShutdownRequest, StatusSnapshot, StopOutcome};
use crate::error::Result;
use crate::host::{
    CleanupRoutine, Clock, CommandCleanup, ProcessControl, SessionHost, SystemClock, SystemProcess, TmuxHost,
};
use crate::launcher::{LaunchConfig, Launcher, StartReport};
use crate::logs::{LogExtractor, LogTail, TailOptions};
use crate::registry::{PidFileRegistry, Registry};
use crate::shutdown::ShutdownOrchestrator;

/// Supervisor wired to the real host
pub type SystemSupervisor = Supervisor<PidFileRegistry<SystemProcess>, SystemProcess, TmuxHost, SystemClock, CommandCleanup>;

/// `0` for success or an intentional no-op, `1` for any failure
pub fn exit_code<T>(result: &Result<T>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(_) => 1,
    }
}

pub struct Supervisor<R, P, S, C, K> {
    launch: LaunchConfig,
    registry: R,
    processes: P,
    sessions: S,
    clock: C,
    cleanup: K,
    extractor: LogExtractor,
    tail_options: TailOptions,
}

impl SystemSupervisor {
    /// Build a supervisor for the deployment described by `config`
    pub fn from_config(config: &Config) -> Self {
        let registry = PidFileRegistry::new(config.pid_file(), config.worker.session_name.clone(), SystemProcess);
        let cleanup = CommandCleanup::new(
            config.cleanup.command.clone(),
            config.cleanup.selection.clone(),
            config.work_dir.clone(),
        );
        let extractor = LogExtractor::new(config.log_dir(), config.paths.log_prefix.clone())
            .with_recent_lines(config.status.recent_lines);

        Supervisor::new(
            config.launch_config(),
            registry,
            SystemProcess,
            TmuxHost::default(),
            SystemClock,
            cleanup,
        )
        .with_extractor(extractor)
        .with_tail_options(config.tail_options())
    }
}

impl<R, P, S, C, K> Supervisor<R, P, S, C, K>
where
    R: Registry,
    P: ProcessControl,
    S: SessionHost,
    C: Clock,
    K: CleanupRoutine,
{
    pub fn new(launch: LaunchConfig, registry: R, processes: P, sessions: S, clock: C, cleanup: K) -> Self {
        let extractor = LogExtractor::new(launch.log_dir.clone(), launch.log_prefix.clone());
        Self {
            launch,
            registry,
            processes,
            sessions,
            clock,
            cleanup,
            extractor,
            tail_options: TailOptions::default(),
        }
    }

    pub fn with_extractor(mut self, extractor: LogExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_tail_options(mut self, options: TailOptions) -> Self {
        self.tail_options = options;
        self
    }

    pub fn launch_config(&self) -> &LaunchConfig {
        &self.launch
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn extractor(&self) -> &LogExtractor {
        &self.extractor
    }

    /// Start the worker in a detached session
    pub fn start(&self) -> Result<StartReport> {
        Launcher::new(&self.launch, &self.registry, &self.sessions, &self.clock).start()
    }

    /// Stop the worker, escalating as needed
    pub fn stop(&self, request: ShutdownRequest) -> Result<StopOutcome> {
        ShutdownOrchestrator::new(
            &self.registry,
            &self.processes,
            &self.sessions,
            &self.clock,
            &self.cleanup,
        )
        .stop(request)
    }

    /// Liveness plus everything the newest log says
    pub fn status(&self) -> Result<StatusSnapshot> {
        let record = self.registry.read()?;
        let process_alive = record.as_ref().is_some_and(|r| self.processes.is_alive(r.pid));
        let session = record
            .as_ref()
            .map_or(self.launch.session_name.as_str(), |r| r.session.as_str());
        let session_alive = self.sessions.exists(session);
        info!(
            "Status: process_alive={} session '{}' alive={}",
            process_alive, session, session_alive
        );
        self.extractor
            .snapshot(process_alive, session_alive, record.as_ref().map(|r| r.pid))
    }

    /// Follow the newest log until `cancel` is raised. `None` when no log exists yet.
    pub fn monitor(&self, cancel: Arc<AtomicBool>) -> Result<Option<LogTail<&C>>> {
        self.extractor.tail(self.tail_options, &self.clock, cancel)
    }
}
