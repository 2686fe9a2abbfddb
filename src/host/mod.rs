//! Host layer - everything the supervisor does to the operating system
//!
//! This module provides:
//! - Traits for process signalling, the detached session host, waiting and cleanup
//! - System implementations (nix signals, tmux, thread sleep, `sh -c`)
//! - In-memory mocks for tests

pub mod cleanup;
pub mod clock;
pub mod mock;
pub mod process;
pub mod tmux;
pub mod traits;

pub use cleanup::CommandCleanup;
pub use clock::SystemClock;
pub use process::SystemProcess;
pub use tmux::TmuxHost;
pub use traits::{CleanupRoutine, Clock, ProcessControl, SessionHost, SessionSpec};
