//! Status snapshot - recomputed on every status request, never persisted

use std::path::PathBuf;

/// Point-in-time summary of the worker derived from the registry, the
/// execution host and the newest log file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusSnapshot {
    //=== Liveness ===
    /// A valid process record exists and its process is alive
    pub process_alive: bool,
    /// The execution host still lists the worker's session
    pub session_alive: bool,
    /// Process id from the registry, if any
    pub pid: Option<u32>,

    //=== Log source ===
    /// The log file the rest of the fields were derived from
    pub log_file: Option<PathBuf>,
    /// Tail of the log file for display
    pub recent_lines: Vec<String>,

    //=== Last occurrences ===
    pub last_account_line: Option<String>,
    pub last_position_line: Option<String>,
    pub last_order_sync_line: Option<String>,

    //=== Counters over the whole file ===
    pub buy_order_count: usize,
    pub sell_order_count: usize,
    pub cancelled_order_count: usize,
    pub error_count: usize,
    pub warning_count: usize,
}

impl StatusSnapshot {
    /// Snapshot with liveness only, used when no log file exists yet
    pub fn liveness_only(process_alive: bool, session_alive: bool, pid: Option<u32>) -> Self {
        Self {
            process_alive,
            session_alive,
            pid,
            ..Default::default()
        }
    }

    /// Total placed orders, buy and sell
    pub fn placed_order_count(&self) -> usize {
        self.buy_order_count + self.sell_order_count
    }
}
