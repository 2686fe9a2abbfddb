//! Snapshot extraction over the newest log file

use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use log::debug;

use super::classify::{Classifier, order_side};
use super::locate::latest_log;
use super::tail::{LogTail, TailOptions};
use crate::domain::{Category, LineClass, OrderSide, StatusSnapshot};
use crate::error::{Result, SupervisorError};
use crate::host::Clock;

/// Default number of trailing lines kept for display
pub const DEFAULT_RECENT_LINES: usize = 50;

/// Reads status out of the worker's log directory
#[derive(Debug, Clone)]
pub struct LogExtractor {
    log_dir: PathBuf,
    prefix: String,
    classifier: Classifier,
    recent_lines: usize,
}

impl LogExtractor {
    pub fn new(log_dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            log_dir: log_dir.into(),
            prefix: prefix.into(),
            classifier: Classifier::default(),
            recent_lines: DEFAULT_RECENT_LINES,
        }
    }

    /// Use a different marker table
    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Keep this many trailing lines in snapshots
    pub fn with_recent_lines(mut self, n: usize) -> Self {
        self.recent_lines = n;
        self
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Newest matching log file
    pub fn latest_file(&self) -> Result<Option<PathBuf>> {
        latest_log(&self.log_dir, &self.prefix)
    }

    /// Build a snapshot. Liveness comes from the caller; everything else from the log.
    pub fn snapshot(&self, process_alive: bool, session_alive: bool, pid: Option<u32>) -> Result<StatusSnapshot> {
        let mut snapshot = StatusSnapshot::liveness_only(process_alive, session_alive, pid);
        let Some(path) = self.latest_file()? else {
            debug!("No log files in {}", self.log_dir.display());
            return Ok(snapshot);
        };

        let read_err = |source: io::Error| SupervisorError::LogRead {
            path: path.clone(),
            source,
        };
        let file = File::open(&path).map_err(read_err)?;
        let mut failure = None;
        let lines = BufReader::new(file).split(b'\n').map_while(|chunk| match chunk {
            Ok(bytes) => Some(lossy_line(&bytes)),
            Err(e) => {
                failure = Some(e);
                None
            }
        });
        self.accumulate(&mut snapshot, lines);
        if let Some(e) = failure {
            return Err(read_err(e));
        }
        snapshot.log_file = Some(path);
        Ok(snapshot)
    }

    /// Fold lines into the snapshot's counters and last-line fields
    pub fn accumulate<S>(&self, snapshot: &mut StatusSnapshot, lines: impl IntoIterator<Item = S>)
    where
        S: AsRef<str> + Into<String>,
    {
        let mut recent: VecDeque<String> = VecDeque::with_capacity(self.recent_lines);

        for item in lines {
            let line = item.as_ref();
            match self.classifier.classify(line) {
                LineClass::Error => snapshot.error_count += 1,
                LineClass::Warning => snapshot.warning_count += 1,
                LineClass::Content(Category::AccountUpdate) => {
                    snapshot.last_account_line = Some(line.to_string());
                }
                LineClass::Content(Category::PositionUpdate) => {
                    snapshot.last_position_line = Some(line.to_string());
                }
                LineClass::Content(Category::OrderSync) => {
                    snapshot.last_order_sync_line = Some(line.to_string());
                }
                LineClass::Content(Category::OrderCancelled) => snapshot.cancelled_order_count += 1,
                LineClass::Content(Category::OrderPlaced) => match order_side(line) {
                    Some(OrderSide::Buy) => snapshot.buy_order_count += 1,
                    Some(OrderSide::Sell) => snapshot.sell_order_count += 1,
                    None => {}
                },
                LineClass::Unclassified => {}
            }

            if self.recent_lines > 0 {
                if recent.len() == self.recent_lines {
                    recent.pop_front();
                }
                recent.push_back(item.into());
            }
        }

        snapshot.recent_lines = recent.into();
    }

    /// Follow the newest log file. `None` when there is no log file yet.
    ///
    /// The file is chosen once; a rotation needs a fresh call.
    pub fn tail<C: Clock>(&self, options: TailOptions, clock: C, cancel: Arc<AtomicBool>) -> Result<Option<LogTail<C>>> {
        let Some(path) = self.latest_file()? else {
            return Ok(None);
        };
        LogTail::open(path, self.classifier.clone(), options, clock, cancel).map(Some)
    }
}

/// One log line with invalid UTF-8 replaced and any trailing `\r` dropped
fn lossy_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    const SAMPLE: &str = "\
2025-06-01 10:00:00,001 - __main__ - INFO - 网格交易机器人初始化完成
2025-06-01 10:00:01,000 - risk_manager - INFO - 💰 账户数据更新 - 总权益: 1000.00 USDC
2025-06-01 10:00:02,000 - exchange_client - INFO - 下单成功: buy 0.01 @ 2500.0, 订单ID: a1
2025-06-01 10:00:03,000 - exchange_client - INFO - 下单成功: sell 0.01 @ 2510.0, 订单ID: a2
2025-06-01 10:00:04,000 - exchange_client - INFO - 下单成功: buy 0.01 @ 2490.0, 订单ID: a3
2025-06-01 10:00:05,000 - exchange_client - INFO - 撤销挂单成功, 订单ID: a1
2025-06-01 10:00:06,000 - risk_manager - INFO - 📊 持仓数据更新 - ETHUSDC, 总未实现盈亏: 0.50 USDC
2025-06-01 10:00:07,000 - websocket_handler - INFO - 同步 orders: {'long': 1} @ ticker
2025-06-01 10:00:08,000 - exchange_client - WARNING - 网络错误，稍后重试: timeout
2025-06-01 10:00:09,000 - exchange_client - ERROR - 撤单失败: unknown order
2025-06-01 10:00:10,000 - risk_manager - INFO - 💰 账户数据更新 - 总权益: 1001.00 USDC
2025-06-01 10:00:11,000 - exchange_client - ERROR - 下单成功 but later rejected
";

    fn write_log(dir: &Path, name: &str, content: &str, age_secs: u64) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        let mtime = SystemTime::now() - Duration::from_secs(age_secs);
        File::options().write(true).open(&path).unwrap().set_modified(mtime).unwrap();
        path
    }

    #[test]
    fn test_snapshot_without_logs() {
        let dir = TempDir::new().unwrap();
        let extractor = LogExtractor::new(dir.path(), "grid_bot_");
        let snapshot = extractor.snapshot(true, true, Some(12)).unwrap();
        assert_eq!(snapshot, StatusSnapshot::liveness_only(true, true, Some(12)));
    }

    #[test]
    fn test_snapshot_counts_and_last_lines() {
        let dir = TempDir::new().unwrap();
        let path = write_log(dir.path(), "grid_bot_20250601_100000.log", SAMPLE, 0);
        let extractor = LogExtractor::new(dir.path(), "grid_bot_");

        let s = extractor.snapshot(false, false, None).unwrap();
        assert_eq!(s.log_file, Some(path));
        assert_eq!(s.buy_order_count, 2);
        assert_eq!(s.sell_order_count, 1);
        assert_eq!(s.cancelled_order_count, 1);
        assert_eq!(s.warning_count, 1);
        assert_eq!(s.error_count, 2);
        assert!(s.last_account_line.as_deref().unwrap().contains("1001.00"));
        assert!(s.last_position_line.as_deref().unwrap().contains("持仓数据更新"));
        assert!(s.last_order_sync_line.as_deref().unwrap().contains("同步 orders"));
        assert_eq!(s.recent_lines.len(), 12);
    }

    #[test]
    fn test_recent_lines_window() {
        let dir = TempDir::new().unwrap();
        let content: String = (0..120).map(|i| format!("line {}\n", i)).collect();
        write_log(dir.path(), "grid_bot_1.log", &content, 0);

        let s = LogExtractor::new(dir.path(), "grid_bot_").snapshot(false, false, None).unwrap();
        assert_eq!(s.recent_lines.len(), DEFAULT_RECENT_LINES);
        assert_eq!(s.recent_lines.first().unwrap(), "line 70");
        assert_eq!(s.recent_lines.last().unwrap(), "line 119");

        let s = LogExtractor::new(dir.path(), "grid_bot_")
            .with_recent_lines(0)
            .snapshot(false, false, None)
            .unwrap();
        assert!(s.recent_lines.is_empty());
    }

    #[test]
    fn test_snapshot_uses_newest_file_only() {
        let dir = TempDir::new().unwrap();
        write_log(dir.path(), "grid_bot_old.log", SAMPLE, 3600);
        let newest = write_log(
            dir.path(),
            "grid_bot_new.log",
            "2025-06-02 00:00:00,000 - exchange_client - INFO - 下单成功: sell 1 @ 1\n",
            5,
        );

        let s = LogExtractor::new(dir.path(), "grid_bot_").snapshot(true, true, Some(1)).unwrap();
        assert_eq!(s.log_file, Some(newest));
        assert_eq!(s.sell_order_count, 1);
        assert_eq!(s.buy_order_count, 0);
        assert_eq!(s.error_count, 0);
        assert!(s.last_account_line.is_none());
    }

    #[test]
    fn test_snapshot_tolerates_invalid_utf8() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("grid_bot_bin.log");
        let mut bytes = b"2025 - x - ERROR - bad \xff\xfe bytes\n".to_vec();
        bytes.extend_from_slice("2025 - x - INFO - 撤销订单成功: 1\n".as_bytes());
        fs::write(&path, bytes).unwrap();

        let s = LogExtractor::new(dir.path(), "grid_bot_").snapshot(false, false, None).unwrap();
        assert_eq!(s.error_count, 1);
        assert_eq!(s.cancelled_order_count, 1);
    }

    #[test]
    fn test_snapshot_streams_crlf_and_unterminated_tail() {
        let dir = TempDir::new().unwrap();
        let mut content: String = (0..5000)
            .map(|i| format!("2025 - x - INFO - 下单成功: buy 1 @ {}\r\n", i))
            .collect();
        content.push_str("2025 - x - ERROR - last line without newline");
        write_log(dir.path(), "grid_bot_big.log", &content, 0);

        let s = LogExtractor::new(dir.path(), "grid_bot_")
            .with_recent_lines(2)
            .snapshot(false, false, None)
            .unwrap();
        assert_eq!(s.buy_order_count, 5000);
        assert_eq!(s.error_count, 1);
        assert_eq!(
            s.recent_lines,
            vec![
                "2025 - x - INFO - 下单成功: buy 1 @ 4999".to_string(),
                "2025 - x - ERROR - last line without newline".to_string(),
            ]
        );
    }
}
