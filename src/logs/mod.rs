//! Log status extraction
//!
//! Status is derived purely from the worker's append-only log files:
//! - classify: marker table turning a line into a `LineClass`
//! - locate: newest log file in the log directory
//! - snapshot: one pass over that file producing counters and last lines
//! - tail: follow the file as it grows

pub mod classify;
pub mod locate;
pub mod snapshot;
pub mod tail;

pub use classify::{Classifier, DEFAULT_MARKERS, order_side};
pub use locate::latest_log;
pub use snapshot::LogExtractor;
pub use tail::{LogTail, TailOptions};
