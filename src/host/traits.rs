//! Host trait definitions.

use std::path::PathBuf;
use std::time::Duration;

use crate::domain::{CleanupStatus, TerminationSignal};
use crate::error::Result;

/// Liveness probing and signal delivery by process id.
pub trait ProcessControl {
    /// Check whether a process with this id exists.
    fn is_alive(&self, pid: u32) -> bool;

    /// Deliver a termination signal. A process that is already gone is not an error.
    fn signal(&self, pid: u32, signal: TerminationSignal) -> Result<()>;
}

/// What to run inside a new detached session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSpec {
    /// Session name, unique on the host
    pub name: String,
    /// Worker command line
    pub command: String,
    /// Directory the worker starts in
    pub work_dir: PathBuf,
    /// File receiving the worker's stdout and stderr
    pub console_file: PathBuf,
}

/// Detached execution host that keeps the worker alive after the terminal goes away.
pub trait SessionHost {
    /// Create a new detached session running the worker.
    fn create(&self, spec: &SessionSpec) -> Result<()>;

    /// Process id of the session's worker, `None` if the session is not listed.
    fn pane_pid(&self, name: &str) -> Result<Option<u32>>;

    /// Check whether a session of this name exists.
    fn exists(&self, name: &str) -> bool;

    /// Terminate a session. No-op if it does not exist.
    fn kill(&self, name: &str) -> Result<()>;
}

/// Blocking waits, injectable so tests never sleep.
pub trait Clock {
    fn sleep(&self, duration: Duration);
}

impl<C: Clock + ?Sized> Clock for &C {
    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration);
    }
}

/// The external routine that cancels open orders and closes positions.
pub trait CleanupRoutine {
    /// Run to completion and classify the exit status.
    ///
    /// Returns `CleanupInvocationFailed` only when the routine could not be started.
    fn run(&self) -> Result<CleanupStatus>;
}
