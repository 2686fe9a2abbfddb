//! Error types for gridctl
//!
//! Centralized error handling using thiserror. Only terminal failures live
//! here; a stale process record and a graceful-shutdown timeout are handled
//! inside the registry and the shutdown machine and never reach the caller.

use std::path::PathBuf;

use thiserror::Error;

/// All error types that can occur while supervising the worker
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// A live worker is already recorded in the registry
    #[error("Worker already running (pid {pid})")]
    AlreadyRunning { pid: u32 },

    /// The detached session did not show up in the execution host
    #[error("Session not found: {session}")]
    SessionNotFound { session: String },

    /// The execution host command could not be run or reported failure
    #[error("Session command '{command}' failed: {reason}")]
    SessionCommand { command: String, reason: String },

    /// A termination signal could not be delivered
    #[error("Failed to deliver {signal} to pid {pid}: {reason}")]
    SignalDeliveryFailed {
        pid: u32,
        signal: String,
        reason: String,
    },

    /// The worker survived the forced signal
    #[error("Worker (pid {pid}) still alive after forced termination")]
    ForceKillFailed { pid: u32 },

    /// The process record could not be persisted
    #[error("Cannot write process record {}: {source}", path.display())]
    RegistryWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The process record exists but could not be read or removed
    #[error("Cannot access process record {}: {source}", path.display())]
    RegistryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The cleanup routine could not be started at all
    #[error("Cleanup invocation failed: {0}")]
    CleanupInvocationFailed(String),

    /// A worker log file could not be read
    #[error("Cannot read log {}: {source}", path.display())]
    LogRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for supervisor operations
pub type Result<T> = std::result::Result<T, SupervisorError>;
