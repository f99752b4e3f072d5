//! # Tagdrive Control
//!
//! Runs the drive controller against the simulated robot. The configured
//! trigger action is held (or released) for the whole run; feedback is
//! logged as JSON every `feedback_interval` cycles.

use clap::Parser;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tagdrive_common::config::{ConfigLoader, LogLevel};
use tagdrive_common::consts::DEFAULT_CONFIG_PATH;
use tagdrive_common::drive::config::DriveConfig;
use tagdrive_control::cycle::CycleRunner;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Tagdrive: AprilTag-guided differential drive controller
#[derive(Parser, Debug)]
#[command(name = "tagdrive")]
#[command(version)]
#[command(about = "Closed-loop heading and standoff control from AprilTag detections")]
struct Args {
    /// Path to the drive configuration TOML.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Number of cycles to run (0 = until Ctrl-C).
    #[arg(long, default_value_t = 0)]
    cycles: u64,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    // Loaded before tracing so `shared.log_level` can set the default filter.
    let config = DriveConfig::load(&args.config);
    let level = config
        .as_ref()
        .map_or(LogLevel::Info, |c| c.shared.log_level);
    setup_tracing(&args, level);

    info!("Tagdrive v{} starting...", env!("CARGO_PKG_VERSION"));

    let result = config
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error>)
        .and_then(|config| run(&args, &config));
    if let Err(e) = result {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("Tagdrive shutdown complete");
}

fn run(args: &Args, config: &DriveConfig) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;
    info!(
        "Config OK: cycle_time={}ms, controller={:?}, trigger_action={:?}",
        config.control.cycle_time_ms,
        config.drivetrain.controller_type,
        config.control.trigger_action,
    );

    let mut runner = CycleRunner::new(config)?;

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    })?;

    let max_cycles = (args.cycles > 0).then_some(args.cycles);
    runner.run(max_cycles, &running)?;
    runner.disable();

    Ok(())
}

fn setup_tracing(args: &Args, level: LogLevel) {
    let default_level = if args.verbose {
        LogLevel::Debug.as_directive()
    } else {
        level.as_directive()
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if args.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .compact()
            .init();
    }
}
