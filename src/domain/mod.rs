//! Domain types for gridctl
//!
//! This module contains the core domain types:
//! - ProcessRecord: persisted identity of the supervised worker
//! - LogEvent / LineClass: a classified worker log line
//! - StatusSnapshot: log-derived operational summary
//! - ShutdownRequest / StopOutcome: inputs and results of a stop

pub mod event;
pub mod record;
pub mod shutdown;
pub mod snapshot;

pub use event::{Category, LineClass, LogEvent, OrderSide};
pub use record::ProcessRecord;
pub use shutdown::{CleanupStatus, ShutdownMode, ShutdownRequest, StopOutcome, StopStatus, TerminationSignal};
pub use snapshot::StatusSnapshot;
