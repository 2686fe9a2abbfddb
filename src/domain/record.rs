//! Process record - the persisted identity of the supervised worker

use std::fmt;

/// Identity of the active worker: its process id and the session hosting it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRecord {
    /// OS process id of the worker (the session's pane process)
    pub pid: u32,
    /// Name of the detached session the worker runs in
    pub session: String,
}

impl ProcessRecord {
    /// Create a new process record
    pub fn new(pid: u32, session: impl Into<String>) -> Self {
        Self {
            pid,
            session: session.into(),
        }
    }

    /// Serialize into the on-disk text form: pid on the first line, session on the second
    pub fn to_text(&self) -> String {
        format!("{}\n{}\n", self.pid, self.session)
    }

    /// Parse the on-disk text form.
    ///
    /// A bare pid file (no session line) is accepted and takes `default_session`.
    /// Returns `None` when the first line is not a positive integer.
    pub fn parse(text: &str, default_session: &str) -> Option<Self> {
        let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
        let pid: u32 = lines.next()?.parse().ok()?;
        if pid == 0 {
            return None;
        }
        let session = lines.next().unwrap_or(default_session);
        Some(Self::new(pid, session))
    }
}

impl fmt::Display for ProcessRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pid {} in session '{}'", self.pid, self.session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_record() {
        let record = ProcessRecord::parse("1234\ngrid_bot\n", "other").unwrap();
        assert_eq!(record, ProcessRecord::new(1234, "grid_bot"));
    }

    #[test]
    fn test_parse_bare_pid_uses_default_session() {
        let record = ProcessRecord::parse("  5678  \n", "grid_bot").unwrap();
        assert_eq!(record.pid, 5678);
        assert_eq!(record.session, "grid_bot");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(ProcessRecord::parse("", "grid_bot").is_none());
        assert!(ProcessRecord::parse("not-a-pid\n", "grid_bot").is_none());
        assert!(ProcessRecord::parse("-3\n", "grid_bot").is_none());
        assert!(ProcessRecord::parse("0\n", "grid_bot").is_none());
    }

    #[test]
    fn test_text_form_parses_back() {
        let record = ProcessRecord::new(42, "bot_session");
        assert_eq!(ProcessRecord::parse(&record.to_text(), "ignored"), Some(record));
    }

    #[test]
    fn test_display() {
        let record = ProcessRecord::new(42, "grid_bot");
        assert_eq!(record.to_string(), "pid 42 in session 'grid_bot'");
    }
}
