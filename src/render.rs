//! Terminal rendering of supervisor results with `colored`

use std::fmt::Write;

use colored::*;

use crate::domain::{Category, CleanupStatus, LineClass, LogEvent, StatusSnapshot, StopOutcome, StopStatus};
use crate::launcher::StartReport;
use crate::logs::Classifier;

/// Color one log line by its class
pub fn paint_line(line: &str, class: LineClass) -> ColoredString {
    match class {
        LineClass::Error => line.red(),
        LineClass::Warning => line.yellow(),
        LineClass::Content(Category::AccountUpdate) => line.cyan(),
        LineClass::Content(Category::PositionUpdate) => line.blue(),
        LineClass::Content(Category::OrderPlaced) => line.green(),
        LineClass::Content(Category::OrderCancelled) => line.magenta(),
        LineClass::Content(Category::OrderSync) => line.bright_black(),
        LineClass::Unclassified => line.normal(),
    }
}

pub fn event(event: &LogEvent) -> String {
    paint_line(&event.line, event.class).to_string()
}

fn flag(alive: bool) -> ColoredString {
    if alive { "running".green() } else { "stopped".red() }
}

/// Process / session / pid block
pub fn liveness(snapshot: &StatusSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "=== Worker ===".bold());
    let _ = writeln!(out, "  Process: {}", flag(snapshot.process_alive));
    let _ = writeln!(out, "  Session: {}", flag(snapshot.session_alive));
    match snapshot.pid {
        Some(pid) => {
            let _ = writeln!(out, "  PID:     {}", pid);
        }
        None => {
            let _ = writeln!(out, "  PID:     {}", "none".dimmed());
        }
    }
    if snapshot.process_alive != snapshot.session_alive {
        let _ = writeln!(out, "  {}", "Process and session disagree".yellow());
    }
    out
}

/// Recent log lines, colored by class
pub fn logs(snapshot: &StatusSnapshot, classifier: &Classifier) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "=== Recent log ===".bold());
    let Some(path) = &snapshot.log_file else {
        let _ = writeln!(out, "  {}", "No log file found".dimmed());
        return out;
    };
    let _ = writeln!(out, "  {}", path.display().to_string().dimmed());
    for line in &snapshot.recent_lines {
        let _ = writeln!(out, "{}", paint_line(line, classifier.classify(line)));
    }
    out
}

/// Last account / position / sync lines plus counters
pub fn stats(snapshot: &StatusSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "=== Trading ===".bold());
    let last = |label: &str, line: &Option<String>, out: &mut String| {
        let text = line.as_deref().map_or_else(|| "-".dimmed(), |l| l.normal());
        let _ = writeln!(out, "  {:<9} {}", label, text);
    };
    last("Account:", &snapshot.last_account_line, &mut out);
    last("Position:", &snapshot.last_position_line, &mut out);
    last("Orders:", &snapshot.last_order_sync_line, &mut out);

    let _ = writeln!(
        out,
        "  Placed:    {} ({} buy / {} sell)",
        snapshot.placed_order_count(),
        snapshot.buy_order_count.to_string().green(),
        snapshot.sell_order_count.to_string().red()
    );
    let _ = writeln!(out, "  Cancelled: {}", snapshot.cancelled_order_count);
    let errors = snapshot.error_count.to_string();
    let warnings = snapshot.warning_count.to_string();
    let _ = writeln!(
        out,
        "  Errors:    {}  Warnings: {}",
        if snapshot.error_count > 0 { errors.red() } else { errors.normal() },
        if snapshot.warning_count > 0 { warnings.yellow() } else { warnings.normal() }
    );
    out
}

pub fn start_report(report: &StartReport) -> String {
    format!(
        "{} worker pid {} in session '{}'\n  console: {}\n",
        "Started".green(),
        report.record.pid,
        report.record.session,
        report.console_file.display()
    )
}

fn cleanup_line(status: &CleanupStatus) -> String {
    match status {
        CleanupStatus::Succeeded => format!("{} cleanup completed", "✓".green()),
        CleanupStatus::Failed { code: Some(code) } => {
            format!("{} cleanup exited with status {}", "!".yellow(), code)
        }
        CleanupStatus::Failed { code: None } => format!("{} cleanup was killed by a signal", "!".yellow()),
        CleanupStatus::InvocationFailed(reason) => format!("{} cleanup could not run: {}", "!".yellow(), reason),
    }
}

pub fn stop_outcome(outcome: &StopOutcome) -> String {
    let mut out = match outcome.status {
        StopStatus::NotRunning => format!("{}\n", "Worker is not running".yellow()),
        StopStatus::Stopped { pid, forced: false } => format!("{} worker pid {}\n", "Stopped".green(), pid),
        StopStatus::Stopped { pid, forced: true } => {
            format!("{} worker pid {} (SIGKILL)\n", "Killed".yellow(), pid)
        }
    };
    if let Some(cleanup) = &outcome.cleanup {
        out.push_str(&cleanup_line(cleanup));
        out.push('\n');
    }
    out
}
