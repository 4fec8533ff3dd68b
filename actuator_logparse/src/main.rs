//! # Actuator Log Parser Binary
//!
//! Reads an `actuator_cycle` event log and prints per-iteration latency.
//!
//! # Usage
//!
//! ```bash
//! # Table of every row plus a trend summary
//! actuator_logparse actuator.log
//!
//! # HOME strokes only, plotted
//! actuator_logparse actuator.log --direction home --plot
//!
//! # Export for a spreadsheet
//! actuator_logparse actuator.log --format csv > latency.csv
//!
//! # Tolerate interrupted iterations when pairing lines
//! actuator_logparse actuator.log --pairing sequential --format json
//! ```

#![deny(warnings)]

use actuator_logparse::{
    LatencyRow, Pairing, TrendSummary, filter_direction, parse_file, render_plot, render_table,
    to_csv, to_json,
};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DirectionArg {
    Home,
    Extend,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Table,
    Csv,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PairingArg {
    Positional,
    Sequential,
}

impl From<PairingArg> for Pairing {
    fn from(arg: PairingArg) -> Self {
        match arg {
            PairingArg::Positional => Pairing::Positional,
            PairingArg::Sequential => Pairing::Sequential,
        }
    }
}

/// Actuator log parser - transition latency per iteration
#[derive(Parser, Debug)]
#[command(name = "actuator_logparse")]
#[command(version)]
#[command(about = "Extract and plot transition latency from an actuator cycle log")]
#[command(long_about = None)]
struct Args {
    /// Event log written by actuator_cycle
    file: PathBuf,

    /// Rows to keep (substring match on the direction label)
    #[arg(short, long, value_enum, default_value_t = DirectionArg::All)]
    direction: DirectionArg,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = FormatArg::Table)]
    format: FormatArg,

    /// Draw elapsed vs iteration (one plot per direction)
    #[arg(short, long)]
    plot: bool,

    /// Plot width in columns
    #[arg(long, default_value_t = 72)]
    width: usize,

    /// How Iteration lines are matched with Elapsed lines
    #[arg(long, value_enum, default_value_t = PairingArg::Positional)]
    pairing: PairingArg,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = run() {
        error!("Log parse failed: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    setup_tracing(&args);

    let rows = parse_file(&args.file, args.pairing.into())?;
    info!("{} rows from {}", rows.len(), args.file.display());
    if rows.is_empty() {
        warn!("No Iteration/Elapsed pairs found in {}", args.file.display());
    }

    let rows = match args.direction {
        DirectionArg::Home => filter_direction(&rows, "Home"),
        DirectionArg::Extend => filter_direction(&rows, "Extend"),
        DirectionArg::All => rows,
    };

    match args.format {
        FormatArg::Table => {
            print!("{}", render_table(&rows));
            for (label, series) in series(&rows, args.direction) {
                if let Some(summary) = TrendSummary::from_rows(&series) {
                    println!("{label}: {summary}");
                }
            }
        }
        FormatArg::Csv => print!("{}", to_csv(&rows)),
        FormatArg::Json => println!("{}", to_json(&rows)?),
    }

    if args.plot {
        for (label, series) in series(&rows, args.direction) {
            println!("\n{label} elapsed (s) vs iteration");
            print!("{}", render_plot(&series, args.width));
        }
    }
    Ok(())
}

/// Split rows into the series that get their own summary and plot.
fn series(rows: &[LatencyRow], direction: DirectionArg) -> Vec<(&'static str, Vec<LatencyRow>)> {
    match direction {
        DirectionArg::Home => vec![("Home", rows.to_vec())],
        DirectionArg::Extend => vec![("Extend", rows.to_vec())],
        DirectionArg::All => vec![
            ("Home", filter_direction(rows, "Home")),
            ("Extend", filter_direction(rows, "Extend")),
        ],
    }
}

/// Setup tracing subscriber based on CLI arguments.
fn setup_tracing(args: &Args) {
    let level = if args.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
