//! # Actuator Cycle Binary
//!
//! Cycles a linear actuator between its HOME and EXTEND end stops until
//! interrupted, logging every transition to a rotating event log.
//!
//! # Usage
//!
//! ```bash
//! # Default rig wiring (BCM 5 6 13 19), 2 s between cycles
//! actuator_cycle
//!
//! # Explicit wiring and wait time, as positional arguments
//! actuator_cycle 5 6 13 19 2.5
//!
//! # Single sensor + single drive output
//! actuator_cycle --single-channel 17 27
//!
//! # No hardware: simulated actuator, 10 iterations, verbose
//! actuator_cycle -s --iterations 10 -v
//!
//! # Config file, JSON diagnostics
//! actuator_cycle --config rig.toml --json
//! ```

#![deny(warnings)]

use actuator_common::config::{ActuatorConfig, LogLevel, WiringConfig};
use actuator_common::consts::*;
use actuator_cycle::{CycleController, EventLog, EventSink, RotatingFileWriter};
use actuator_hal::{Clock, DriverContext, DriverRegistry, IoDriver, PositionSensors, SystemClock};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*, reload};

/// Actuator cycle tester - reciprocating HOME/EXTEND endurance loop
#[derive(Parser, Debug)]
#[command(name = "actuator_cycle")]
#[command(version)]
#[command(about = "Cycle a two-position linear actuator and log every transition")]
#[command(long_about = None)]
struct Args {
    /// HOME position sensor input (BCM)
    home_input: Option<u8>,

    /// HOME drive output (BCM)
    home_output: Option<u8>,

    /// EXTEND position sensor input (BCM)
    extend_input: Option<u8>,

    /// EXTEND drive output (BCM)
    extend_output: Option<u8>,

    /// Seconds to wait between cycles
    wait_time: Option<f64>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Use one shared sensor and one drive output instead of two pairs
    #[arg(long, num_args = 2, value_names = ["SENSE", "DRIVE"])]
    single_channel: Option<Vec<u8>>,

    /// Force the simulation driver
    #[arg(short = 's', long)]
    simulate: bool,

    /// GPIO driver name (overrides config)
    #[arg(short, long)]
    driver: Option<String>,

    /// Event log path (overrides config)
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Stop after this many iterations
    #[arg(short = 'n', long)]
    iterations: Option<u64>,

    /// Abort when a sensor does not activate within this many seconds
    #[arg(long, value_name = "SECONDS")]
    fault_timeout: Option<f64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = run() {
        error!("Actuator cycle failed: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter = setup_tracing(&args);

    let mut config = match args.config {
        Some(ref path) => ActuatorConfig::load_validated(path)
            .map_err(|e| format!("{}: {}", path.display(), e))?,
        None => ActuatorConfig::default(),
    };
    apply_overrides(&args, &mut config);
    config.validate()?;
    filter.reload(env_filter(&args, config.shared.log_level))?;

    info!(
        "{} v{} starting...",
        config.shared.service_name,
        env!("CARGO_PKG_VERSION")
    );
    info!("Wiring: {:?}", config.wiring);

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let ctx = DriverContext {
        config: &config.driver,
        wiring: config.wiring,
        clock: Arc::clone(&clock),
    };
    let registry = DriverRegistry::with_builtin_drivers();
    let driver = registry.create_driver(&config.driver.name, &ctx)?;
    info!("Driver '{}' initialized", driver.name());

    let writer = RotatingFileWriter::open(
        &config.event_log.path,
        config.event_log.max_bytes,
        config.event_log.backup_count,
    )?;
    info!("Event log: {}", writer.path().display());
    let mut events = EventLog::new(writer);
    events.note(clock.wall(), &describe_args(&config));

    let sensors = PositionSensors::new(
        driver,
        config.wiring,
        Arc::clone(&clock),
        config.timing.poll_interval(),
    );
    let mut controller = CycleController::new(sensors, events, config.timing.clone());
    if let Some(limit) = args.iterations {
        controller = controller.with_iteration_limit(limit);
    }

    let shutdown = controller.shutdown_flag();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        shutdown.store(true, Ordering::SeqCst);
    })?;

    let result = controller.run();

    let (sensors, events) = controller.into_parts();
    if events.write_failures() > 0 {
        warn!("{} event log writes failed", events.write_failures());
    }
    let mut driver = sensors.into_driver();
    if let Err(e) = driver.shutdown() {
        error!("Driver shutdown failed: {}", e);
    }

    let summary = result?;
    info!(
        "Actuator cycle shutdown complete: {} iterations, {} faults{}",
        summary.iterations,
        summary.stats.faults,
        if summary.interrupted { " (interrupted)" } else { "" }
    );
    Ok(())
}

/// Fold CLI arguments over the loaded configuration.
fn apply_overrides(args: &Args, config: &mut ActuatorConfig) {
    if let Some(ref pins) = args.single_channel {
        if let [sense, drive] = pins[..] {
            config.wiring = WiringConfig::SingleChannel { sense, drive };
        }
    } else if args.home_input.is_some()
        || args.home_output.is_some()
        || args.extend_input.is_some()
        || args.extend_output.is_some()
    {
        let (home_sense, home_drive, extend_sense, extend_drive) = match config.wiring {
            WiringConfig::TwoChannel {
                home_sense,
                home_drive,
                extend_sense,
                extend_drive,
            } => (home_sense, home_drive, extend_sense, extend_drive),
            WiringConfig::SingleChannel { .. } => (
                DEFAULT_HOME_SENSE,
                DEFAULT_HOME_DRIVE,
                DEFAULT_EXTEND_SENSE,
                DEFAULT_EXTEND_DRIVE,
            ),
        };
        config.wiring = WiringConfig::TwoChannel {
            home_sense: args.home_input.unwrap_or(home_sense),
            home_drive: args.home_output.unwrap_or(home_drive),
            extend_sense: args.extend_input.unwrap_or(extend_sense),
            extend_drive: args.extend_output.unwrap_or(extend_drive),
        };
    }

    if let Some(wait) = args.wait_time {
        config.timing.inter_cycle_wait = wait;
    }
    if let Some(timeout) = args.fault_timeout {
        config.timing.fault_timeout = Some(timeout);
    }
    if args.simulate {
        config.driver.name = "simulation".to_string();
    } else if let Some(ref name) = args.driver {
        config.driver.name = name.clone();
    }
    if let Some(ref path) = args.log_file {
        config.event_log.path = path.clone();
    }
}

/// Startup line recorded at the top of each run in the event log.
fn describe_args(config: &ActuatorConfig) -> String {
    let wait = config.timing.inter_cycle_wait;
    match config.wiring {
        WiringConfig::TwoChannel {
            home_sense,
            home_drive,
            extend_sense,
            extend_drive,
        } => format!(
            "Args: home_input={home_sense}, home_output={home_drive}, \
             extend_input={extend_sense}, extend_output={extend_drive}, wait_time={wait}"
        ),
        WiringConfig::SingleChannel { sense, drive } => {
            format!("Args: sense={sense}, drive={drive}, wait_time={wait}")
        }
    }
}

/// Setup tracing subscriber based on CLI arguments.
///
/// Installed before the configuration is read so load errors are reported.
/// The returned handle swaps in the configured level once it is known.
fn setup_tracing(args: &Args) -> reload::Handle<EnvFilter, Registry> {
    let (filter, handle) = reload::Layer::new(env_filter(args, LogLevel::default()));
    let output = if args.json {
        fmt::layer().with_writer(std::io::stderr).json().boxed()
    } else {
        fmt::layer().with_writer(std::io::stderr).boxed()
    };
    tracing_subscriber::registry().with(filter).with(output).init();
    handle
}

/// `RUST_LOG` wins, then `--verbose`, then the configured level.
fn env_filter(args: &Args, level: LogLevel) -> EnvFilter {
    let level = if args.verbose {
        "debug"
    } else {
        level.as_directive()
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}
