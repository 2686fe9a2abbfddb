//! Drives the escalation machine against the host.

use log::{debug, error, info, warn};

use super::machine::{ShutdownAction, ShutdownState};
use crate::domain::{CleanupStatus, ShutdownRequest, StopOutcome, StopStatus, TerminationSignal};
use crate::error::{Result, SupervisorError};
use crate::host::{CleanupRoutine, Clock, ProcessControl, SessionHost};
use crate::registry::Registry;

/// Stops the recorded worker and runs the cleanup routine.
pub struct ShutdownOrchestrator<'a, R, P, S, C, K> {
    registry: &'a R,
    processes: &'a P,
    sessions: &'a S,
    clock: &'a C,
    cleanup: &'a K,
}

impl<'a, R, P, S, C, K> ShutdownOrchestrator<'a, R, P, S, C, K>
where
    R: Registry,
    P: ProcessControl,
    S: SessionHost,
    C: Clock,
    K: CleanupRoutine,
{
    pub fn new(registry: &'a R, processes: &'a P, sessions: &'a S, clock: &'a C, cleanup: &'a K) -> Self {
        Self {
            registry,
            processes,
            sessions,
            clock,
            cleanup,
        }
    }

    /// Stop the worker.
    ///
    /// `NotRunning` is a success. A worker that survives the forced signal is
    /// `ForceKillFailed` and its record is kept. Cleanup failures are reported
    /// on the outcome and never turn a stop into an error, and neither does
    /// a record that cannot be removed once the worker is gone.
    pub fn stop(&self, request: ShutdownRequest) -> Result<StopOutcome> {
        let Some(record) = self.registry.read()? else {
            info!("No worker recorded, nothing to stop");
            let mut outcome = StopOutcome::not_running();
            if request.cleanup_when_idle() {
                outcome.cleanup = Some(self.run_cleanup());
            }
            return Ok(outcome);
        };

        info!("Stopping worker {} ({:?})", record, request.mode);
        let mut state = ShutdownState::start(request.mode);
        let mut observed = None;
        let mut graceful_signals = 0;
        let mut force_signals = 0;

        loop {
            let (next, action) = state.step(observed);
            if next != state {
                debug!("shutdown {:?} -> {:?}", state, next);
            }
            if matches!(state, ShutdownState::Waiting { .. }) && matches!(next, ShutdownState::ForceSignalSent { .. }) {
                warn!("Worker {} ignored SIGTERM, escalating to SIGKILL", record.pid);
            }
            state = next;

            observed = match action {
                ShutdownAction::Signal(kind) => {
                    self.processes.signal(record.pid, kind)?;
                    info!("Sent {} to pid {}", kind, record.pid);
                    match kind {
                        TerminationSignal::Graceful => graceful_signals += 1,
                        TerminationSignal::Force => force_signals += 1,
                    }
                    None
                }
                ShutdownAction::Wait(duration) => {
                    self.clock.sleep(duration);
                    None
                }
                ShutdownAction::CheckAlive => Some(self.processes.is_alive(record.pid)),
                ShutdownAction::Finish => break,
            };
        }

        if state != ShutdownState::Stopped {
            error!("Worker {} survived SIGKILL, keeping its record", record.pid);
            return Err(SupervisorError::ForceKillFailed { pid: record.pid });
        }

        info!("Worker {} stopped", record.pid);
        if let Err(e) = self.sessions.kill(&record.session) {
            warn!("Could not terminate session '{}': {}", record.session, e);
        }
        // The worker is gone; a leftover record is purged as stale by the next read
        if let Err(e) = self.registry.clear() {
            warn!("Could not clear process record: {}", e);
        }

        let cleanup = request.invoke_cleanup.then(|| self.run_cleanup());
        Ok(StopOutcome {
            status: StopStatus::Stopped {
                pid: record.pid,
                forced: force_signals > 0,
            },
            graceful_signals,
            force_signals,
            cleanup,
        })
    }

    fn run_cleanup(&self) -> CleanupStatus {
        match self.cleanup.run() {
            Ok(status) => status,
            Err(e) => {
                warn!("{}", e);
                CleanupStatus::InvocationFailed(e.to_string())
            }
        }
    }
}
