//! Shutdown orchestration
//!
//! - machine: the pure escalation state machine
//! - orchestrator: runs the machine against the host and owns registry/session/cleanup side effects

pub mod machine;
pub mod orchestrator;

pub use machine::{FORCE_SETTLE, GRACEFUL_POLLS, POLL_INTERVAL, ShutdownAction, ShutdownState};
pub use orchestrator::ShutdownOrchestrator;
