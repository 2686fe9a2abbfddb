use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::launcher::LaunchConfig;
use crate::logs::TailOptions;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    /// Directory the worker runs in; relative paths below resolve against it
    pub work_dir: PathBuf,
    pub worker: WorkerConfig,
    pub paths: PathsConfig,
    pub cleanup: CleanupConfig,
    pub monitor: MonitorConfig,
    pub status: StatusConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub command: String,
    pub session_name: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            command: "python3 start_grid_bot.py".to_string(),
            session_name: "grid_bot".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub pid_file: PathBuf,
    pub log_dir: PathBuf,
    /// Prefix of the worker's own log files
    pub log_prefix: String,
    /// Prefix of the captured console output; kept outside `log_prefix*`
    pub console_prefix: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            pid_file: PathBuf::from("grid_bot.pid"),
            log_dir: PathBuf::from("log"),
            log_prefix: "grid_bot_".to_string(),
            console_prefix: "console_".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    pub command: String,
    /// Menu choice fed to the routine's stdin ("1" = full cleanup)
    pub selection: String,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            command: "python3 test_cleanup.py".to_string(),
            selection: "1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub poll_interval_ms: u64,
    pub backlog_lines: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            backlog_lines: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    pub recent_lines: usize,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self { recent_lines: 50 }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            work_dir: PathBuf::from("."),
            worker: WorkerConfig::default(),
            paths: PathsConfig::default(),
            cleanup: CleanupConfig::default(),
            monitor: MonitorConfig::default(),
            status: StatusConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try primary location: ~/.config/<project>/<project>.yml
        if let Some(config_dir) = dirs::config_dir() {
            let project_name = env!("CARGO_PKG_NAME");
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let project_name = env!("CARGO_PKG_NAME");
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        // No config file found, use defaults
        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Resolve a configured path against `work_dir`
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.work_dir.join(path)
        }
    }

    pub fn pid_file(&self) -> PathBuf {
        self.resolve(&self.paths.pid_file)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.resolve(&self.paths.log_dir)
    }

    pub fn launch_config(&self) -> LaunchConfig {
        LaunchConfig {
            session_name: self.worker.session_name.clone(),
            command: self.worker.command.clone(),
            work_dir: self.work_dir.clone(),
            log_dir: self.log_dir(),
            log_prefix: self.paths.log_prefix.clone(),
            console_prefix: self.paths.console_prefix.clone(),
        }
    }

    pub fn tail_options(&self) -> TailOptions {
        TailOptions {
            poll_interval: Duration::from_millis(self.monitor.poll_interval_ms.max(1)),
            backlog_lines: self.monitor.backlog_lines,
        }
    }
}
