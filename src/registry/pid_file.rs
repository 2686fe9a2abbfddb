//! Pid-file backed registry.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use super::traits::Registry;
use crate::domain::ProcessRecord;
use crate::error::{Result, SupervisorError};
use crate::host::ProcessControl;

/// Registry stored as a small text file at a fixed path.
pub struct PidFileRegistry<P> {
    path: PathBuf,
    default_session: String,
    processes: P,
}

impl<P: ProcessControl> PidFileRegistry<P> {
    /// Create a registry at `path`. `default_session` names the session for bare pid files.
    pub fn new(path: impl AsRef<Path>, default_session: impl Into<String>, processes: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            default_session: default_session.into(),
            processes,
        }
    }

    /// Location of the pid file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_raw(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(SupervisorError::RegistryRead {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn remove(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(SupervisorError::RegistryRead {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

impl<P: ProcessControl> Registry for PidFileRegistry<P> {
    fn read(&self) -> Result<Option<ProcessRecord>> {
        let Some(text) = self.load_raw()? else {
            return Ok(None);
        };

        let Some(record) = ProcessRecord::parse(&text, &self.default_session) else {
            warn!("Unreadable process record at {}, purging", self.path.display());
            self.remove()?;
            return Ok(None);
        };

        if !self.processes.is_alive(record.pid) {
            warn!("Stale process record ({}), purging", record);
            self.remove()?;
            return Ok(None);
        }

        debug!("Valid process record: {}", record);
        Ok(Some(record))
    }

    fn write(&self, record: &ProcessRecord) -> Result<()> {
        fs::write(&self.path, record.to_text()).map_err(|source| SupervisorError::RegistryWrite {
            path: self.path.clone(),
            source,
        })?;
        info!("Recorded worker {} in {}", record, self.path.display());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.remove()?;
        debug!("Cleared process record {}", self.path.display());
        Ok(())
    }
}
