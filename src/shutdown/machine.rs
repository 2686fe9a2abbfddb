//! Graceful-then-forced escalation as pure transitions
//!
//! ```text
//! Idle -> SignalSent -> Waiting{n} -> Stopped
//!                            |
//!                            v (n == GRACEFUL_POLLS, still alive)
//!                     ForceSignalSent -> Stopped | Failed
//! ```
//!
//! `step` takes the current state and the liveness observed by the last
//! `CheckAlive` (or `None` after any other action) and returns the next state and
//! the action to perform. The driver feeds observations back until `Finish`.

use std::time::Duration;

use crate::domain::{ShutdownMode, TerminationSignal};

/// Interval between liveness polls after the graceful signal
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Liveness polls before escalating to the forced signal
pub const GRACEFUL_POLLS: u32 = 30;

/// Wait between the forced signal and the final liveness check
pub const FORCE_SETTLE: Duration = Duration::from_secs(2);

/// Escalation state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownState {
    Idle(ShutdownMode),
    SignalSent,
    /// `polls` liveness checks done so far
    Waiting { polls: u32 },
    /// `settled` once the post-signal wait has been requested
    ForceSignalSent { settled: bool },
    Stopped,
    Failed,
}

/// Side effect requested by a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownAction {
    Signal(TerminationSignal),
    Wait(Duration),
    CheckAlive,
    Finish,
}

impl ShutdownState {
    pub fn start(mode: ShutdownMode) -> Self {
        ShutdownState::Idle(mode)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ShutdownState::Stopped | ShutdownState::Failed)
    }

    /// One transition. `alive` is `Some` only right after a `CheckAlive`.
    pub fn step(self, alive: Option<bool>) -> (ShutdownState, ShutdownAction) {
        use ShutdownAction::*;
        use ShutdownState::*;

        match (self, alive) {
            (Idle(ShutdownMode::Graceful), _) => (SignalSent, Signal(TerminationSignal::Graceful)),
            (Idle(ShutdownMode::Force), _) => (ForceSignalSent { settled: false }, Signal(TerminationSignal::Force)),

            (SignalSent, _) => (Waiting { polls: 0 }, Wait(POLL_INTERVAL)),

            (Waiting { polls }, None) => (Waiting { polls }, CheckAlive),
            (Waiting { .. }, Some(false)) => (Stopped, Finish),
            (Waiting { polls }, Some(true)) => {
                let polls = polls + 1;
                if polls >= GRACEFUL_POLLS {
                    (ForceSignalSent { settled: false }, Signal(TerminationSignal::Force))
                } else {
                    (Waiting { polls }, Wait(POLL_INTERVAL))
                }
            }

            (ForceSignalSent { settled: false }, _) => (ForceSignalSent { settled: true }, Wait(FORCE_SETTLE)),
            (ForceSignalSent { settled: true }, None) => (ForceSignalSent { settled: true }, CheckAlive),
            (ForceSignalSent { settled: true }, Some(false)) => (Stopped, Finish),
            (ForceSignalSent { settled: true }, Some(true)) => (Failed, Finish),

            (Stopped, _) => (Stopped, Finish),
            (Failed, _) => (Failed, Finish),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Drive the machine with a liveness script: the process is alive for
    /// `alive_checks` checks, then dead. Returns (final state, actions).
    fn drive(mode: ShutdownMode, alive_checks: usize) -> (ShutdownState, Vec<ShutdownAction>) {
        let mut state = ShutdownState::start(mode);
        let mut observed = None;
        let mut checks = 0;
        let mut actions = Vec::new();
        loop {
            let (next, action) = state.step(observed);
            state = next;
            actions.push(action);
            observed = match action {
                ShutdownAction::CheckAlive => {
                    checks += 1;
                    Some(checks <= alive_checks)
                }
                ShutdownAction::Finish => break,
                _ => None,
            };
        }
        (state, actions)
    }

    fn count_signals(actions: &[ShutdownAction], kind: TerminationSignal) -> usize {
        actions.iter().filter(|a| **a == ShutdownAction::Signal(kind)).count()
    }

    #[test]
    fn test_graceful_exit_on_first_poll() {
        let (state, actions) = drive(ShutdownMode::Graceful, 0);
        assert_eq!(state, ShutdownState::Stopped);
        assert_eq!(
            actions,
            vec![
                ShutdownAction::Signal(TerminationSignal::Graceful),
                ShutdownAction::Wait(POLL_INTERVAL),
                ShutdownAction::CheckAlive,
                ShutdownAction::Finish,
            ]
        );
    }

    #[test]
    fn test_graceful_exit_after_five_intervals() {
        let (state, actions) = drive(ShutdownMode::Graceful, 4);
        assert_eq!(state, ShutdownState::Stopped);
        assert_eq!(count_signals(&actions, TerminationSignal::Graceful), 1);
        assert_eq!(count_signals(&actions, TerminationSignal::Force), 0);
        let waits = actions.iter().filter(|a| matches!(a, ShutdownAction::Wait(_))).count();
        assert_eq!(waits, 5);
    }

    #[test]
    fn test_exit_on_last_poll_does_not_escalate() {
        let (state, actions) = drive(ShutdownMode::Graceful, GRACEFUL_POLLS as usize - 1);
        assert_eq!(state, ShutdownState::Stopped);
        assert_eq!(count_signals(&actions, TerminationSignal::Force), 0);
        let checks = actions.iter().filter(|a| **a == ShutdownAction::CheckAlive).count();
        assert_eq!(checks, GRACEFUL_POLLS as usize);
    }

    #[test]
    fn test_escalates_after_thirty_polls_then_stops() {
        let (state, actions) = drive(ShutdownMode::Graceful, GRACEFUL_POLLS as usize);
        assert_eq!(state, ShutdownState::Stopped);
        assert_eq!(count_signals(&actions, TerminationSignal::Graceful), 1);
        assert_eq!(count_signals(&actions, TerminationSignal::Force), 1);

        let graceful_at = actions
            .iter()
            .position(|a| *a == ShutdownAction::Signal(TerminationSignal::Graceful))
            .unwrap();
        let force_at = actions
            .iter()
            .position(|a| *a == ShutdownAction::Signal(TerminationSignal::Force))
            .unwrap();
        assert!(graceful_at < force_at);
        assert_eq!(actions[force_at + 1], ShutdownAction::Wait(FORCE_SETTLE));
    }

    #[test]
    fn test_survives_force_fails() {
        let (state, actions) = drive(ShutdownMode::Graceful, usize::MAX);
        assert_eq!(state, ShutdownState::Failed);
        assert_eq!(count_signals(&actions, TerminationSignal::Graceful), 1);
        assert_eq!(count_signals(&actions, TerminationSignal::Force), 1);
        let checks = actions.iter().filter(|a| **a == ShutdownAction::CheckAlive).count();
        assert_eq!(checks, GRACEFUL_POLLS as usize + 1);
    }

    #[test]
    fn test_force_mode_skips_graceful() {
        let (state, actions) = drive(ShutdownMode::Force, 0);
        assert_eq!(state, ShutdownState::Stopped);
        assert_eq!(
            actions,
            vec![
                ShutdownAction::Signal(TerminationSignal::Force),
                ShutdownAction::Wait(FORCE_SETTLE),
                ShutdownAction::CheckAlive,
                ShutdownAction::Finish,
            ]
        );
    }

    #[test]
    fn test_force_mode_failure() {
        let (state, _) = drive(ShutdownMode::Force, 1);
        assert_eq!(state, ShutdownState::Failed);
    }

    #[test]
    fn test_terminal_states_only_finish() {
        assert_eq!(
            ShutdownState::Stopped.step(Some(true)),
            (ShutdownState::Stopped, ShutdownAction::Finish)
        );
        assert_eq!(ShutdownState::Failed.step(None), (ShutdownState::Failed, ShutdownAction::Finish));
        assert!(ShutdownState::Stopped.is_terminal());
        assert!(!ShutdownState::Waiting { polls: 3 }.is_terminal());
    }
}
