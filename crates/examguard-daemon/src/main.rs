//! examguard - exam integrity monitor
//!
//! Runs one monitored exam session against simulated capabilities. Face
//! counts and fullscreen exits are scripted on the command line, so a full
//! session (timeout, user submit, or termination) can be reproduced without a
//! camera or a browser host.
//!
//! Notifications are written to stderr as they are emitted. When the session
//! is submitted, a JSON report is written to stdout.
//!
//! # Example
//!
//! ```text
//! examguard --duration-secs 30 --faces 1,0,1,2,0 --exit-fullscreen-at 3,7
//! ```
//!
//! Ctrl-C submits the session as a user submission.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use examguard_core::{MonitorConfig, Notification, SessionSnapshot, SessionStatus};
use examguard_daemon::MonitorBuilder;
use examguard_daemon::sim::{ScriptedDetector, SimulatedFullscreen, StaticFrameSource};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// examguard - exam integrity monitor
#[derive(Parser, Debug)]
#[command(name = "examguard")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to a TOML monitor configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the exam duration in seconds
    #[arg(long)]
    duration_secs: Option<u64>,

    /// Override the number of warnings that terminates the session
    #[arg(long)]
    max_warnings: Option<u32>,

    /// Face counts returned by successive detector polls
    ///
    /// Once the list is exhausted every poll sees exactly one face.
    #[arg(long, value_delimiter = ',')]
    faces: Vec<usize>,

    /// Seconds after start at which the candidate leaves fullscreen
    #[arg(long, value_delimiter = ',')]
    exit_fullscreen_at: Vec<u64>,

    /// Make the host refuse every fullscreen request
    #[arg(long)]
    refuse_fullscreen: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log to file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

/// Final output of a run.
#[derive(Debug, Serialize)]
struct RunReport {
    snapshot: SessionSnapshot,
    status: SessionStatus,
}

fn init_logging(args: &Args) -> Result<()> {
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    if let Some(log_file) = &args.log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)
            .context("failed to open log file")?;

        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(file)
                    .with_ansi(false),
            )
            .init();
    } else {
        // stdout carries the report
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
    Ok(())
}

fn load_config(args: &Args) -> Result<MonitorConfig> {
    let mut config = match &args.config {
        Some(path) => MonitorConfig::from_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => MonitorConfig::default(),
    };
    if let Some(duration) = args.duration_secs {
        config.exam_duration_secs = duration;
    }
    if let Some(max_warnings) = args.max_warnings {
        config.max_warnings = max_warnings;
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

async fn print_notifications(mut notifications: broadcast::Receiver<Notification>) {
    loop {
        match notifications.recv().await {
            Ok(notification) => eprintln!("{notification}"),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "notification printer lagged");
            },
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

async fn run_fullscreen_script(
    host: Arc<SimulatedFullscreen>,
    mut exits: Vec<u64>,
    cancel: CancellationToken,
) {
    exits.sort_unstable();
    let start = tokio::time::Instant::now();
    for at in exits {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            () = tokio::time::sleep_until(start + Duration::from_secs(at)) => {},
        }
        info!(at_secs = at, "scripted fullscreen exit");
        host.exit();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args)?;

    let config = load_config(&args)?;
    if args.print_config {
        print!("{}", config.to_toml().context("failed to render configuration")?);
        return Ok(());
    }

    let frames = Arc::new(StaticFrameSource::new(true));
    let detector = Arc::new(ScriptedDetector::new(args.faces.clone(), 1));
    let host = Arc::new(SimulatedFullscreen::new(true));
    host.set_refuse(args.refuse_fullscreen);

    let (handle, actor) = MonitorBuilder::new(config)
        .with_presence(frames, detector)
        .with_fullscreen(host.clone())
        .spawn()
        .context("failed to start exam monitor")?;

    let printer = tokio::spawn(print_notifications(handle.subscribe_notifications()));
    let script_cancel = CancellationToken::new();
    let script = tokio::spawn(run_fullscreen_script(
        host,
        args.exit_fullscreen_at.clone(),
        script_cancel.clone(),
    ));

    let snapshot = tokio::select! {
        snapshot = handle.wait_submitted() => snapshot.context("session actor stopped before submission")?,
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for ctrl-c")?;
            info!("interrupt received; submitting exam");
            handle
                .confirm_and_submit()
                .await
                .context("failed to submit exam")?
        },
    };
    let status = handle.status().await.context("failed to read final status")?;

    script_cancel.cancel();
    handle.shutdown().await.context("failed to stop session actor")?;
    actor.await.context("session actor panicked")?;
    drop(handle);
    if let Err(e) = script.await {
        warn!(error = %e, "fullscreen script task failed");
    }
    if let Err(e) = printer.await {
        warn!(error = %e, "notification printer failed");
    }

    let report = RunReport { snapshot, status };
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("failed to encode report")?
    );
    Ok(())
}
