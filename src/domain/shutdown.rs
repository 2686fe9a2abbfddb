//! Stop request and outcome types

use std::fmt;

/// How the worker should be stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownMode {
    /// SIGTERM, wait, escalate to SIGKILL if needed
    Graceful,
    /// SIGKILL straight away
    Force,
}

/// One `stop` invocation, built from CLI flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownRequest {
    pub mode: ShutdownMode,
    pub invoke_cleanup: bool,
}

impl ShutdownRequest {
    pub fn new(mode: ShutdownMode, invoke_cleanup: bool) -> Self {
        Self { mode, invoke_cleanup }
    }

    /// Build from the `--force` / `--no-cleanup` flags
    pub fn from_flags(force: bool, no_cleanup: bool) -> Self {
        let mode = if force { ShutdownMode::Force } else { ShutdownMode::Graceful };
        Self::new(mode, !no_cleanup)
    }

    /// Whether cleanup runs when no worker was recorded.
    ///
    /// Only an explicit `--force` stop cleans up the account without a live worker.
    pub fn cleanup_when_idle(&self) -> bool {
        self.invoke_cleanup && self.mode == ShutdownMode::Force
    }
}

impl Default for ShutdownRequest {
    fn default() -> Self {
        Self::new(ShutdownMode::Graceful, true)
    }
}

/// The two signal kinds the supervisor ever sends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationSignal {
    Graceful,
    Force,
}

impl fmt::Display for TerminationSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationSignal::Graceful => f.write_str("SIGTERM"),
            TerminationSignal::Force => f.write_str("SIGKILL"),
        }
    }
}

/// Exit classification of the cleanup routine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupStatus {
    /// Exit status zero
    Succeeded,
    /// Non-zero exit, partial or failed cleanup
    Failed { code: Option<i32> },
    /// The routine could not be started
    InvocationFailed(String),
}

impl CleanupStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, CleanupStatus::Succeeded)
    }
}

/// Terminal result of a successful stop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopStatus {
    /// No valid record existed; nothing was signalled
    NotRunning,
    /// The worker is gone and its record cleared
    Stopped { pid: u32, forced: bool },
}

/// Everything a stop did, for reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopOutcome {
    pub status: StopStatus,
    /// Graceful signals sent (0 or 1)
    pub graceful_signals: u32,
    /// Forced signals sent (0 or 1)
    pub force_signals: u32,
    /// Set when the cleanup routine was invoked
    pub cleanup: Option<CleanupStatus>,
}

impl StopOutcome {
    pub fn not_running() -> Self {
        Self {
            status: StopStatus::NotRunning,
            graceful_signals: 0,
            force_signals: 0,
            cleanup: None,
        }
    }

    /// Cleanup ran but did not succeed; reported as an advisory only
    pub fn cleanup_warning(&self) -> bool {
        self.cleanup.as_ref().is_some_and(|c| !c.is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_from_flags() {
        let req = ShutdownRequest::from_flags(false, false);
        assert_eq!(req.mode, ShutdownMode::Graceful);
        assert!(req.invoke_cleanup);

        let req = ShutdownRequest::from_flags(true, true);
        assert_eq!(req.mode, ShutdownMode::Force);
        assert!(!req.invoke_cleanup);
    }

    #[test]
    fn test_cleanup_when_idle_requires_force() {
        assert!(!ShutdownRequest::from_flags(false, false).cleanup_when_idle());
        assert!(ShutdownRequest::from_flags(true, false).cleanup_when_idle());
        assert!(!ShutdownRequest::from_flags(true, true).cleanup_when_idle());
    }

    #[test]
    fn test_signal_display() {
        assert_eq!(TerminationSignal::Graceful.to_string(), "SIGTERM");
        assert_eq!(TerminationSignal::Force.to_string(), "SIGKILL");
    }

    #[test]
    fn test_cleanup_warning() {
        let mut outcome = StopOutcome::not_running();
        assert!(!outcome.cleanup_warning());
        outcome.cleanup = Some(CleanupStatus::Succeeded);
        assert!(!outcome.cleanup_warning());
        outcome.cleanup = Some(CleanupStatus::Failed { code: Some(2) });
        assert!(outcome.cleanup_warning());
    }
}
