//! gridctl - supervisor for a long-running grid trading bot
//!
//! Starts the worker detached in a tmux session, tracks it through a pid
//! file, stops it with a SIGTERM-then-SIGKILL escalation followed by an
//! external cleanup routine, and derives status from the worker's logs.

pub mod config;
pub mod domain;
pub mod error;
pub mod host;
pub mod launcher;
pub mod logs;
pub mod registry;
pub mod render;
pub mod shutdown;
pub mod supervisor;

pub use error::{Result, SupervisorError};
pub use supervisor::{Supervisor, SystemSupervisor, exit_code};
