//! Process liveness and signalling with nix

use log::debug;
use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;

use super::traits::ProcessControl;
use crate::domain::TerminationSignal;
use crate::error::{Result, SupervisorError};

/// Signals real processes on this host
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcess;

fn to_pid(pid: u32) -> Option<Pid> {
    // 0 and negative values address process groups
    i32::try_from(pid).ok().filter(|p| *p > 0).map(Pid::from_raw)
}

impl ProcessControl for SystemProcess {
    fn is_alive(&self, pid: u32) -> bool {
        let Some(target) = to_pid(pid) else {
            return false;
        };
        match kill(target, None) {
            Ok(()) => true,
            // Exists but owned by someone else
            Err(Errno::EPERM) => true,
            Err(_) => false,
        }
    }

    fn signal(&self, pid: u32, signal: TerminationSignal) -> Result<()> {
        let target = to_pid(pid).ok_or_else(|| SupervisorError::SignalDeliveryFailed {
            pid,
            signal: signal.to_string(),
            reason: "invalid pid".to_string(),
        })?;
        let sig = match signal {
            TerminationSignal::Graceful => Signal::SIGTERM,
            TerminationSignal::Force => Signal::SIGKILL,
        };
        match kill(target, sig) {
            Ok(()) => Ok(()),
            Err(Errno::ESRCH) => {
                debug!("pid {} already gone when sending {}", pid, signal);
                Ok(())
            }
            Err(e) => Err(SupervisorError::SignalDeliveryFailed {
                pid,
                signal: signal.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}
