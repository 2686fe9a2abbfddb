//! In-memory host fakes
//!
//! Each fake is a cheap handle around shared state: clone one into the
//! supervisor and keep another to script behavior and inspect what happened.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::traits::{CleanupRoutine, Clock, ProcessControl, SessionHost, SessionSpec};
use crate::domain::{CleanupStatus, TerminationSignal};
use crate::error::{Result, SupervisorError};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panicking test thread poisons the lock; the data is still usable
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// How a fake process reacts to a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalResponse {
    /// Stays alive for this many liveness checks, then is gone
    DiesAfterChecks(u32),
    /// Keeps running
    Ignores,
}

#[derive(Debug, Clone)]
struct FakeProcess {
    alive: bool,
    on_graceful: SignalResponse,
    on_force: SignalResponse,
    countdown: Option<u32>,
}

#[derive(Debug, Default)]
struct ProcessTableState {
    processes: HashMap<u32, FakeProcess>,
    signals: Vec<(u32, TerminationSignal)>,
    refuse_signals: bool,
    next_pid: u32,
}

/// Fake process table
#[derive(Debug, Clone, Default)]
pub struct MockProcessTable {
    inner: Arc<Mutex<ProcessTableState>>,
}

impl MockProcessTable {
    pub fn new() -> Self {
        let table = Self::default();
        lock(&table.inner).next_pid = 1000;
        table
    }

    /// Add a live process that dies promptly on either signal
    pub fn spawn(&self, pid: u32) {
        self.spawn_with(pid, SignalResponse::DiesAfterChecks(0), SignalResponse::DiesAfterChecks(0));
    }

    /// Add a live process with scripted reactions
    pub fn spawn_with(&self, pid: u32, on_graceful: SignalResponse, on_force: SignalResponse) {
        lock(&self.inner).processes.insert(
            pid,
            FakeProcess {
                alive: true,
                on_graceful,
                on_force,
                countdown: None,
            },
        );
    }

    /// Add a live process under the next free pid
    pub fn spawn_next(&self) -> u32 {
        let pid = {
            let mut state = lock(&self.inner);
            state.next_pid += 1;
            state.next_pid
        };
        self.spawn(pid);
        pid
    }

    /// Make a process disappear without any signal
    pub fn exit(&self, pid: u32) {
        if let Some(p) = lock(&self.inner).processes.get_mut(&pid) {
            p.alive = false;
        }
    }

    /// Make every signal delivery fail
    pub fn refuse_signals(&self) {
        lock(&self.inner).refuse_signals = true;
    }

    /// All delivered signals, in order
    pub fn signals(&self) -> Vec<(u32, TerminationSignal)> {
        lock(&self.inner).signals.clone()
    }

    /// Number of delivered signals of one kind
    pub fn signal_count(&self, kind: TerminationSignal) -> usize {
        lock(&self.inner).signals.iter().filter(|(_, s)| *s == kind).count()
    }

    /// Liveness without consuming a check
    pub fn peek_alive(&self, pid: u32) -> bool {
        lock(&self.inner).processes.get(&pid).is_some_and(|p| p.alive)
    }
}

impl ProcessControl for MockProcessTable {
    fn is_alive(&self, pid: u32) -> bool {
        let mut state = lock(&self.inner);
        let Some(process) = state.processes.get_mut(&pid) else {
            return false;
        };
        match process.countdown {
            Some(0) => {
                process.alive = false;
                process.countdown = None;
            }
            Some(n) => process.countdown = Some(n - 1),
            None => {}
        }
        process.alive
    }

    fn signal(&self, pid: u32, signal: TerminationSignal) -> Result<()> {
        let mut state = lock(&self.inner);
        if state.refuse_signals {
            return Err(SupervisorError::SignalDeliveryFailed {
                pid,
                signal: signal.to_string(),
                reason: "EPERM".to_string(),
            });
        }
        state.signals.push((pid, signal));
        if let Some(process) = state.processes.get_mut(&pid) {
            if !process.alive {
                return Ok(());
            }
            let response = match signal {
                TerminationSignal::Graceful => process.on_graceful,
                TerminationSignal::Force => process.on_force,
            };
            if let SignalResponse::DiesAfterChecks(n) = response {
                // A later signal never extends an earlier deadline
                let n = process.countdown.map_or(n, |c| c.min(n));
                process.countdown = Some(n);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct SessionState {
    sessions: HashMap<String, u32>,
    created: Vec<SessionSpec>,
    killed: Vec<String>,
    hidden: HashSet<String>,
    fail_create: bool,
}

/// Fake session host that spawns fake processes
#[derive(Debug, Clone)]
pub struct MockSessionHost {
    processes: MockProcessTable,
    inner: Arc<Mutex<SessionState>>,
}

impl MockSessionHost {
    pub fn new(processes: MockProcessTable) -> Self {
        Self {
            processes,
            inner: Arc::new(Mutex::new(SessionState::default())),
        }
    }

    /// Register an already running session
    pub fn insert(&self, name: &str, pid: u32) {
        lock(&self.inner).sessions.insert(name.to_string(), pid);
    }

    /// Sessions with this name are created but never listed
    pub fn hide(&self, name: &str) {
        lock(&self.inner).hidden.insert(name.to_string());
    }

    /// Make `create` fail
    pub fn fail_create(&self) {
        lock(&self.inner).fail_create = true;
    }

    /// Every spec passed to `create`
    pub fn created(&self) -> Vec<SessionSpec> {
        lock(&self.inner).created.clone()
    }

    /// Names passed to `kill` for sessions that existed
    pub fn killed(&self) -> Vec<String> {
        lock(&self.inner).killed.clone()
    }

    /// Pid of the worker in a session
    pub fn pid_of(&self, name: &str) -> Option<u32> {
        lock(&self.inner).sessions.get(name).copied()
    }
}

impl SessionHost for MockSessionHost {
    fn create(&self, spec: &SessionSpec) -> Result<()> {
        let mut state = lock(&self.inner);
        if state.fail_create {
            return Err(SupervisorError::SessionCommand {
                command: "mock new-session".to_string(),
                reason: "refused".to_string(),
            });
        }
        if state.sessions.contains_key(&spec.name) {
            return Err(SupervisorError::SessionCommand {
                command: "mock new-session".to_string(),
                reason: format!("duplicate session: {}", spec.name),
            });
        }
        let pid = self.processes.spawn_next();
        state.sessions.insert(spec.name.clone(), pid);
        state.created.push(spec.clone());
        Ok(())
    }

    fn pane_pid(&self, name: &str) -> Result<Option<u32>> {
        let state = lock(&self.inner);
        if state.hidden.contains(name) {
            return Ok(None);
        }
        Ok(state.sessions.get(name).copied())
    }

    fn exists(&self, name: &str) -> bool {
        lock(&self.inner).sessions.contains_key(name)
    }

    fn kill(&self, name: &str) -> Result<()> {
        let mut state = lock(&self.inner);
        if let Some(pid) = state.sessions.remove(name) {
            self.processes.exit(pid);
            state.killed.push(name.to_string());
        }
        Ok(())
    }
}

/// Clock that records waits instead of sleeping
#[derive(Debug, Clone, Default)]
pub struct MockClock {
    sleeps: Arc<Mutex<Vec<Duration>>>,
}

impl MockClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every requested wait, in order
    pub fn sleeps(&self) -> Vec<Duration> {
        lock(&self.sleeps).clone()
    }

    /// Sum of all requested waits
    pub fn total(&self) -> Duration {
        lock(&self.sleeps).iter().sum()
    }
}

impl Clock for MockClock {
    fn sleep(&self, duration: Duration) {
        lock(&self.sleeps).push(duration);
    }
}

/// Cleanup routine with a scripted result
#[derive(Debug, Clone)]
pub struct MockCleanup {
    result: Arc<Mutex<std::result::Result<CleanupStatus, String>>>,
    invocations: Arc<Mutex<u32>>,
}

impl Default for MockCleanup {
    fn default() -> Self {
        Self::new(CleanupStatus::Succeeded)
    }
}

impl MockCleanup {
    pub fn new(status: CleanupStatus) -> Self {
        Self {
            result: Arc::new(Mutex::new(Ok(status))),
            invocations: Arc::new(Mutex::new(0)),
        }
    }

    /// Cleanup that cannot be started
    pub fn unstartable(reason: &str) -> Self {
        let cleanup = Self::default();
        *lock(&cleanup.result) = Err(reason.to_string());
        cleanup
    }

    pub fn invocations(&self) -> u32 {
        *lock(&self.invocations)
    }
}

impl CleanupRoutine for MockCleanup {
    fn run(&self) -> Result<CleanupStatus> {
        *lock(&self.invocations) += 1;
        lock(&self.result)
            .clone()
            .map_err(SupervisorError::CleanupInvocationFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_dies_after_scripted_checks() {
        let table = MockProcessTable::new();
        table.spawn_with(10, SignalResponse::DiesAfterChecks(2), SignalResponse::Ignores);

        assert!(table.is_alive(10));
        table.signal(10, TerminationSignal::Graceful).unwrap();
        assert!(table.is_alive(10));
        assert!(table.is_alive(10));
        assert!(!table.is_alive(10));
        assert_eq!(table.signal_count(TerminationSignal::Graceful), 1);
    }

    #[test]
    fn test_ignoring_process_stays_alive() {
        let table = MockProcessTable::new();
        table.spawn_with(11, SignalResponse::Ignores, SignalResponse::Ignores);
        table.signal(11, TerminationSignal::Force).unwrap();
        for _ in 0..10 {
            assert!(table.is_alive(11));
        }
    }

    #[test]
    fn test_unknown_pid_is_dead() {
        assert!(!MockProcessTable::new().is_alive(99));
    }

    #[test]
    fn test_session_host_spawns_and_kills() {
        let table = MockProcessTable::new();
        let host = MockSessionHost::new(table.clone());
        let spec = SessionSpec {
            name: "grid_bot".to_string(),
            command: "worker".to_string(),
            work_dir: ".".into(),
            console_file: "log/console_x.log".into(),
        };
        host.create(&spec).unwrap();
        let pid = host.pane_pid("grid_bot").unwrap().unwrap();
        assert!(table.peek_alive(pid));
        assert!(host.create(&spec).is_err());

        host.kill("grid_bot").unwrap();
        host.kill("grid_bot").unwrap();
        assert!(!host.exists("grid_bot"));
        assert!(!table.peek_alive(pid));
        assert_eq!(host.killed(), vec!["grid_bot".to_string()]);
    }

    #[test]
    fn test_clock_records_sleeps() {
        let clock = MockClock::new();
        clock.sleep(Duration::from_secs(1));
        clock.sleep(Duration::from_secs(2));
        assert_eq!(clock.sleeps().len(), 2);
        assert_eq!(clock.total(), Duration::from_secs(3));
    }

    #[test]
    fn test_cleanup_counts_invocations() {
        let cleanup = MockCleanup::new(CleanupStatus::Failed { code: Some(1) });
        assert_eq!(cleanup.run().unwrap(), CleanupStatus::Failed { code: Some(1) });
        assert_eq!(cleanup.invocations(), 1);

        let broken = MockCleanup::unstartable("no python");
        assert!(broken.run().is_err());
    }
}
