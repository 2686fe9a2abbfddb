//! Live tail of one log file
//!
//! `LogTail` is an iterator that blocks (through the injected clock) until new
//! lines are appended. It ends only when the cancel flag is raised. It never
//! re-selects the file: when the worker rotates to a new log, the caller has
//! to open a new tail.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use log::{debug, warn};

use super::classify::Classifier;
use crate::domain::LogEvent;
use crate::error::{Result, SupervisorError};
use crate::host::Clock;

/// Tail behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TailOptions {
    /// Wait between checks for new data
    pub poll_interval: Duration,
    /// Existing lines replayed before following
    pub backlog_lines: usize,
}

impl Default for TailOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            backlog_lines: 10,
        }
    }
}

/// Follows a log file and yields classified lines
pub struct LogTail<C> {
    path: PathBuf,
    reader: BufReader<File>,
    position: u64,
    pending: Vec<u8>,
    backlog: VecDeque<String>,
    classifier: Classifier,
    options: TailOptions,
    clock: C,
    cancel: Arc<AtomicBool>,
}

fn strip_newline(mut bytes: Vec<u8>) -> String {
    if bytes.last() == Some(&b'\n') {
        bytes.pop();
    }
    if bytes.last() == Some(&b'\r') {
        bytes.pop();
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

impl<C: Clock> LogTail<C> {
    /// Open `path`, queue the last `backlog_lines` complete lines and position at the end.
    pub fn open(
        path: impl AsRef<Path>,
        classifier: Classifier,
        options: TailOptions,
        clock: C,
        cancel: Arc<AtomicBool>,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let read_err = |source: std::io::Error| SupervisorError::LogRead {
            path: path.clone(),
            source,
        };

        let mut file = File::open(&path).map_err(read_err)?;
        let mut existing = Vec::new();
        file.read_to_end(&mut existing).map_err(read_err)?;
        let position = existing.len() as u64;

        // An unterminated last line is still being written; keep it pending
        let split = existing.iter().rposition(|b| *b == b'\n').map_or(0, |i| i + 1);
        let pending = existing.split_off(split);
        let complete = String::from_utf8_lossy(&existing);
        let lines: Vec<&str> = complete.lines().collect();
        let skip = lines.len().saturating_sub(options.backlog_lines);
        let backlog = lines[skip..].iter().map(|l| l.to_string()).collect();

        debug!("Tailing {} from byte {}", path.display(), position);
        Ok(Self {
            path,
            reader: BufReader::new(file),
            position,
            pending,
            backlog,
            classifier,
            options,
            clock,
            cancel,
        })
    }

    /// The file being followed
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_err(&self, source: std::io::Error) -> SupervisorError {
        SupervisorError::LogRead {
            path: self.path.clone(),
            source,
        }
    }

    /// Next complete line if one is available without waiting
    fn read_line(&mut self) -> Result<Option<String>> {
        let n = self
            .reader
            .read_until(b'\n', &mut self.pending)
            .map_err(|e| self.read_err(e))?;
        self.position += n as u64;
        if self.pending.last() == Some(&b'\n') {
            return Ok(Some(strip_newline(std::mem::take(&mut self.pending))));
        }
        Ok(None)
    }

    /// Rewind when the file was truncated underneath us. Returns true if it was.
    fn rewind_if_truncated(&mut self) -> Result<bool> {
        let len = self.path.metadata().map_err(|e| self.read_err(e))?.len();
        if len >= self.position {
            return Ok(false);
        }
        warn!("{} was truncated, reading from the start", self.path.display());
        self.reader.seek(SeekFrom::Start(0)).map_err(|e| self.read_err(e))?;
        self.position = 0;
        self.pending.clear();
        Ok(true)
    }

    fn event(&self, line: String) -> LogEvent {
        let class = self.classifier.classify(&line);
        LogEvent::new(line, class)
    }
}

impl<C: Clock> Iterator for LogTail<C> {
    type Item = Result<LogEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.cancel.load(Ordering::Relaxed) {
                return None;
            }
            if let Some(line) = self.backlog.pop_front() {
                return Some(Ok(self.event(line)));
            }
            match self.read_line() {
                Ok(Some(line)) => return Some(Ok(self.event(line))),
                Ok(None) => {}
                Err(e) => return Some(Err(e)),
            }
            match self.rewind_if_truncated() {
                Ok(true) => continue,
                Ok(false) => {}
                Err(e) => return Some(Err(e)),
            }
            self.clock.sleep(self.options.poll_interval);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, LineClass};
    use std::fs::{self, OpenOptions};
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Clock that runs a scripted file mutation on each sleep and cancels when the script is done
    struct ScriptedClock {
        steps: Mutex<VecDeque<Step>>,
        cancel: Arc<AtomicBool>,
        sleeps: Mutex<u32>,
    }

    type Step = Box<dyn FnOnce() + Send>;

    fn step(f: impl FnOnce() + Send + 'static) -> Step {
        Box::new(f)
    }

    impl ScriptedClock {
        fn new(cancel: Arc<AtomicBool>, steps: Vec<Step>) -> Self {
            Self {
                steps: Mutex::new(steps.into()),
                cancel,
                sleeps: Mutex::new(0),
            }
        }
    }

    impl Clock for ScriptedClock {
        fn sleep(&self, _duration: Duration) {
            *self.sleeps.lock().unwrap() += 1;
            match self.steps.lock().unwrap().pop_front() {
                Some(step) => step(),
                None => self.cancel.store(true, Ordering::Relaxed),
            }
        }
    }

    fn append(path: &Path, text: &str) {
        let mut f = OpenOptions::new().append(true).open(path).unwrap();
        f.write_all(text.as_bytes()).unwrap();
    }

    fn options(backlog: usize) -> TailOptions {
        TailOptions {
            poll_interval: Duration::from_millis(1),
            backlog_lines: backlog,
        }
    }

    fn collect<C: Clock>(tail: LogTail<C>) -> Vec<LogEvent> {
        tail.map(|e| e.unwrap()).collect()
    }

    #[test]
    fn test_backlog_then_appended_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("grid_bot_1.log");
        fs::write(&path, "a\nb\nc\n").unwrap();

        let cancel = Arc::new(AtomicBool::new(false));
        let p = path.clone();
        let clock = ScriptedClock::new(
            cancel.clone(),
            vec![step(move || append(&p, "x - ERROR - boom\nx - INFO - 同步 orders: {}\n"))],
        );
        let tail = LogTail::open(&path, Classifier::default(), options(2), &clock, cancel.clone()).unwrap();

        let events = collect(tail);
        let lines: Vec<&str> = events.iter().map(|e| e.line.as_str()).collect();
        assert_eq!(lines, vec!["b", "c", "x - ERROR - boom", "x - INFO - 同步 orders: {}"]);
        assert_eq!(events[2].class, LineClass::Error);
        assert_eq!(events[3].class, LineClass::Content(Category::OrderSync));
        assert_eq!(events[0].class, LineClass::Unclassified);
    }

    #[test]
    fn test_partial_line_waits_for_newline() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("grid_bot_1.log");
        fs::write(&path, "done\nhalf").unwrap();

        let cancel = Arc::new(AtomicBool::new(false));
        let p1 = path.clone();
        let p2 = path.clone();
        let clock = ScriptedClock::new(
            cancel.clone(),
            vec![
                step(move || append(&p1, " more")),
                step(move || append(&p2, " end\r\n")),
            ],
        );
        let tail = LogTail::open(&path, Classifier::default(), options(10), &clock, cancel.clone()).unwrap();

        let lines: Vec<String> = collect(tail).into_iter().map(|e| e.line).collect();
        assert_eq!(lines, vec!["done".to_string(), "half more end".to_string()]);
    }

    #[test]
    fn test_truncation_restarts_from_top() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("grid_bot_1.log");
        fs::write(&path, "old line one\nold line two\n").unwrap();

        let cancel = Arc::new(AtomicBool::new(false));
        let p = path.clone();
        let clock = ScriptedClock::new(cancel.clone(), vec![step(move || fs::write(&p, "new\n").unwrap())]);
        let tail = LogTail::open(&path, Classifier::default(), options(0), &clock, cancel.clone()).unwrap();

        let lines: Vec<String> = collect(tail).into_iter().map(|e| e.line).collect();
        assert_eq!(lines, vec!["new".to_string()]);
    }

    #[test]
    fn test_cancel_before_start_yields_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("grid_bot_1.log");
        fs::write(&path, "a\n").unwrap();

        let cancel = Arc::new(AtomicBool::new(true));
        let clock = ScriptedClock::new(cancel.clone(), vec![]);
        let mut tail = LogTail::open(&path, Classifier::default(), options(5), &clock, cancel.clone()).unwrap();
        assert!(tail.next().is_none());
        assert_eq!(*clock.sleeps.lock().unwrap(), 0);
    }

    #[test]
    fn test_open_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let cancel = Arc::new(AtomicBool::new(false));
        let clock = ScriptedClock::new(cancel.clone(), vec![]);
        let result = LogTail::open(dir.path().join("nope.log"), Classifier::default(), options(0), &clock, cancel);
        assert!(matches!(result, Err(SupervisorError::LogRead { .. })));
    }
}
