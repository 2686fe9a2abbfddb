//! Identity registry - the single persisted record of the active worker.
//!
//! Every read validates the record against the process table and purges it
//! when the process is gone, so callers never observe a stale record.
//! There is no locking: supervisor commands are assumed to run one at a time.

mod pid_file;
mod traits;

pub use pid_file::PidFileRegistry;
pub use traits::Registry;
