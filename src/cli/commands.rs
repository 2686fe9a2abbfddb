//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - start: launch the worker in its detached session
//! - stop: graceful-then-forced shutdown with cleanup
//! - status: liveness, recent log lines and trading stats
//! - monitor: follow the live log

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use gridctl::domain::ShutdownRequest;

/// gridctl - supervisor for the grid trading bot
#[derive(Parser, Debug)]
#[command(name = "gridctl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the worker in a detached tmux session
    Start,

    /// Stop the worker (SIGTERM, then SIGKILL after 30s)
    Stop {
        /// Skip the graceful signal and kill immediately
        #[arg(short, long)]
        force: bool,

        /// Do not run the cleanup routine afterwards
        #[arg(long)]
        no_cleanup: bool,
    },

    /// Show worker status derived from its logs
    Status {
        #[command(flatten)]
        view: ViewArgs,
    },

    /// Follow the live log (same as `status --monitor`)
    Monitor,
}

impl Commands {
    /// Stop flags as a shutdown request
    pub fn shutdown_request(force: bool, no_cleanup: bool) -> ShutdownRequest {
        ShutdownRequest::from_flags(force, no_cleanup)
    }
}

/// Which part of the status to show; at most one may be given
#[derive(Args, Debug, Clone, Copy, Default)]
#[group(multiple = false)]
pub struct ViewArgs {
    /// Process and session liveness only
    #[arg(long)]
    pub status_only: bool,

    /// Recent log lines only
    #[arg(long)]
    pub logs_only: bool,

    /// Trading statistics only
    #[arg(long)]
    pub stats_only: bool,

    /// Follow the live log until Ctrl-C
    #[arg(long)]
    pub monitor: bool,

    /// Everything except the live log (default)
    #[arg(long)]
    pub all: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusView {
    Status,
    Logs,
    Stats,
    Monitor,
    All,
}

impl ViewArgs {
    pub fn view(&self) -> StatusView {
        if self.status_only {
            StatusView::Status
        } else if self.logs_only {
            StatusView::Logs
        } else if self.stats_only {
            StatusView::Stats
        } else if self.monitor {
            StatusView::Monitor
        } else {
            StatusView::All
        }
    }
}
