use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::{error, info};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::signal::unix::{SignalKind, signal};

mod cli;

use cli::Cli;
use cli::commands::{Commands, StatusView};
use gridctl::config::Config;
use gridctl::{SystemSupervisor, exit_code, render};

fn setup_logging(default_level: &str) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("gridctl")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("gridctl.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

/// Flag raised by Ctrl-C. SIGINT is hooked before this returns; a helper thread waits on it.
fn interrupt_flag() -> Result<Arc<AtomicBool>> {
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = cancel.clone();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build signal runtime")?;
    let mut interrupt = {
        let _guard = runtime.enter();
        signal(SignalKind::interrupt()).context("Failed to listen for Ctrl-C")?
    };

    std::thread::spawn(move || {
        runtime.block_on(async move {
            if interrupt.recv().await.is_some() {
                info!("Interrupt received, stopping monitor");
                flag.store(true, Ordering::Relaxed);
            }
        });
    });
    Ok(cancel)
}

fn report_error(e: &gridctl::SupervisorError) {
    error!("{}", e);
    eprintln!("{} {}", "Error:".red(), e);
}

fn handle_start(supervisor: &SystemSupervisor) -> u8 {
    println!("{}", "Starting grid bot...".cyan());
    let result = supervisor.start();
    match &result {
        Ok(report) => print!("{}", render::start_report(report)),
        Err(e) => report_error(e),
    }
    exit_code(&result)
}

fn handle_stop(supervisor: &SystemSupervisor, force: bool, no_cleanup: bool) -> u8 {
    let request = Commands::shutdown_request(force, no_cleanup);
    if force {
        println!("{}", "Force stopping grid bot...".yellow());
    } else {
        println!("{}", "Stopping grid bot (up to 30s)...".cyan());
    }
    let result = supervisor.stop(request);
    match &result {
        Ok(outcome) => print!("{}", render::stop_outcome(outcome)),
        Err(e) => report_error(e),
    }
    exit_code(&result)
}

fn handle_status(supervisor: &SystemSupervisor, view: StatusView) -> u8 {
    if view == StatusView::Monitor {
        return handle_monitor(supervisor);
    }

    let result = supervisor.status();
    match &result {
        Ok(snapshot) => {
            let classifier = supervisor.extractor().classifier();
            let blocks = match view {
                StatusView::Status => vec![render::liveness(snapshot)],
                StatusView::Logs => vec![render::logs(snapshot, classifier)],
                StatusView::Stats => vec![render::stats(snapshot)],
                _ => vec![
                    render::liveness(snapshot),
                    render::stats(snapshot),
                    render::logs(snapshot, classifier),
                ],
            };
            println!("{}", blocks.join("\n"));
        }
        Err(e) => report_error(e),
    }
    exit_code(&result)
}

fn handle_monitor(supervisor: &SystemSupervisor) -> u8 {
    let cancel = match interrupt_flag() {
        Ok(cancel) => cancel,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red(), e);
            return 1;
        }
    };

    let tail = match supervisor.monitor(cancel) {
        Ok(Some(tail)) => tail,
        Ok(None) => {
            eprintln!("{}", "No log file to follow".yellow());
            return 1;
        }
        Err(e) => {
            report_error(&e);
            return 1;
        }
    };

    println!(
        "{} {} {}",
        "Following".cyan(),
        tail.path().display(),
        "(Ctrl-C to stop)".dimmed()
    );
    for event in tail {
        match event {
            Ok(event) => println!("{}", render::event(&event)),
            Err(e) => {
                report_error(&e);
                return 1;
            }
        }
    }
    println!("{}", "Monitor stopped".dimmed());
    0
}

fn run_application(cli: &Cli, config: &Config) -> u8 {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
        println!("  work dir: {}", config.work_dir.display());
        println!("  pid file: {}", config.pid_file().display());
        println!("  log dir:  {}", config.log_dir().display());
    }

    let supervisor = SystemSupervisor::from_config(config);
    match &cli.command {
        Commands::Start => handle_start(&supervisor),
        Commands::Stop { force, no_cleanup } => handle_stop(&supervisor, *force, *no_cleanup),
        Commands::Status { view } => handle_status(&supervisor, view.view()),
        Commands::Monitor => handle_monitor(&supervisor),
    }
}

fn setup(cli: &Cli) -> Result<Config> {
    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    let level = if cli.is_verbose() {
        "debug"
    } else {
        config.log_level.as_deref().unwrap_or("info")
    };
    setup_logging(level).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);
    Ok(config)
}

fn main() -> ExitCode {
    // Parse CLI arguments
    let cli = Cli::parse();

    let config = match setup(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red(), e);
            return ExitCode::from(1);
        }
    };

    // Run the main application logic
    let code = run_application(&cli, &config);
    ExitCode::from(code)
}
