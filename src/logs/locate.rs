//! Newest-log selection

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use glob::{Pattern, glob};
use log::{debug, warn};

use crate::error::{Result, SupervisorError};

/// Glob matching the worker's log files: `<dir>/<prefix>*.log`
pub fn log_pattern(log_dir: &Path, prefix: &str) -> String {
    let dir = Pattern::escape(&log_dir.to_string_lossy());
    format!("{}/{}*.log", dir, Pattern::escape(prefix))
}

/// Most recently modified log file, `None` when there is none.
///
/// Equal modification times fall back to the file name, whose embedded
/// timestamp sorts chronologically.
pub fn latest_log(log_dir: &Path, prefix: &str) -> Result<Option<PathBuf>> {
    let pattern = log_pattern(log_dir, prefix);
    let entries = glob(&pattern).map_err(|e| {
        SupervisorError::Io(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))
    })?;

    let mut newest: Option<(SystemTime, PathBuf)> = None;
    for entry in entries {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                warn!("Skipping unreadable log entry: {}", e);
                continue;
            }
        };
        let Ok(meta) = path.metadata() else {
            continue;
        };
        if !meta.is_file() {
            continue;
        }
        let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        let newer = match &newest {
            None => true,
            Some((t, p)) => (modified, &path) > (*t, p),
        };
        if newer {
            newest = Some((modified, path));
        }
    }

    if let Some((_, path)) = &newest {
        debug!("Selected log file {}", path.display());
    }
    Ok(newest.map(|(_, path)| path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::time::Duration;
    use tempfile::TempDir;

    fn touch(path: &Path, age_secs: u64) {
        fs::write(path, "x\n").unwrap();
        let mtime = SystemTime::now() - Duration::from_secs(age_secs);
        File::options().write(true).open(path).unwrap().set_modified(mtime).unwrap();
    }

    #[test]
    fn test_no_logs() {
        let dir = TempDir::new().unwrap();
        assert_eq!(latest_log(dir.path(), "grid_bot_").unwrap(), None);
    }

    #[test]
    fn test_missing_directory_has_no_logs() {
        let dir = TempDir::new().unwrap();
        assert_eq!(latest_log(&dir.path().join("log"), "grid_bot_").unwrap(), None);
    }

    #[test]
    fn test_newest_by_mtime_not_name() {
        let dir = TempDir::new().unwrap();
        let newer_name = dir.path().join("grid_bot_20250102_000000.log");
        let older_name = dir.path().join("grid_bot_20250101_000000.log");
        touch(&newer_name, 600);
        touch(&older_name, 10);

        assert_eq!(latest_log(dir.path(), "grid_bot_").unwrap(), Some(older_name));
    }

    #[test]
    fn test_older_file_never_selected() {
        let dir = TempDir::new().unwrap();
        let old = dir.path().join("grid_bot_a.log");
        let new = dir.path().join("grid_bot_b.log");
        touch(&old, 3600);
        touch(&new, 1);

        assert_eq!(latest_log(dir.path(), "grid_bot_").unwrap(), Some(new));
    }

    #[test]
    fn test_ignores_non_matching_files() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("other.log"), 0);
        touch(&dir.path().join("grid_bot_1.txt"), 0);
        let wanted = dir.path().join("grid_bot_1.log");
        touch(&wanted, 100);
        fs::create_dir(dir.path().join("grid_bot_dir.log")).unwrap();

        assert_eq!(latest_log(dir.path(), "grid_bot_").unwrap(), Some(wanted));
    }

    #[test]
    fn test_pattern_escapes_directory() {
        let pattern = log_pattern(Path::new("/srv/[bot]"), "grid_bot_");
        assert_eq!(pattern, "/srv/[[]bot[]]/grid_bot_*.log");
    }
}
