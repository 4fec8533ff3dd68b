//! Latency row extraction.
//!
//! Two independent scans pull the `Iteration N -> Dir` lines and the
//! `Elapsed S` lines out of the text. Lines of any other shape (startup
//! notes, fault lines, truncated writes) match neither pattern and are
//! ignored. The scans are then paired:
//!
//! - [`Pairing::Positional`] zips the k-th Iteration with the k-th Elapsed,
//!   giving `min(N, M)` rows. An interrupted iteration (Iteration line with
//!   no Elapsed) shifts every later pair by one.
//! - [`Pairing::Sequential`] pairs each Elapsed line with the nearest
//!   preceding unpaired Iteration line and drops orphans, so a single
//!   interrupted iteration costs one row instead of skewing the rest.

use crate::error::ParseError;
use actuator_common::consts::LOG_TIMESTAMP_FORMAT;
use chrono::NaiveDateTime;
use regex::Regex;
use serde::Serialize;
use std::path::Path;
use std::sync::OnceLock;
use tracing::debug;

static ITERATION_RE: OnceLock<Regex> = OnceLock::new();
static ELAPSED_RE: OnceLock<Regex> = OnceLock::new();

fn iteration_re() -> &'static Regex {
    ITERATION_RE.get_or_init(|| {
        Regex::new(r"(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2},\d{3}) Iteration (\d+) -> (\w+)")
            .expect("iteration pattern is valid")
    })
}

fn elapsed_re() -> &'static Regex {
    ELAPSED_RE.get_or_init(|| {
        Regex::new(r"(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2},\d{3}) Elapsed (\d+\.\d+)")
            .expect("elapsed pattern is valid")
    })
}

/// One iteration's latency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatencyRow {
    /// Timestamp of the Iteration line.
    pub start: NaiveDateTime,
    /// Timestamp of the Elapsed line.
    pub end: NaiveDateTime,
    /// Iteration number as logged.
    pub iteration: u64,
    /// Direction label as logged (`Home`, `Extend`, `RecoverHome`).
    pub direction: String,
    /// Transition time in seconds.
    pub elapsed: f64,
}

/// How Iteration lines are matched with Elapsed lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pairing {
    /// k-th Iteration with k-th Elapsed.
    #[default]
    Positional,
    /// Each Elapsed with the nearest preceding unpaired Iteration.
    Sequential,
}

#[derive(Debug)]
struct IterationMark {
    offset: usize,
    start: NaiveDateTime,
    iteration: u64,
    direction: String,
}

#[derive(Debug)]
struct ElapsedMark {
    offset: usize,
    end: NaiveDateTime,
    elapsed: f64,
}

fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, LOG_TIMESTAMP_FORMAT).ok()
}

fn iteration_marks(text: &str) -> Vec<IterationMark> {
    iteration_re()
        .captures_iter(text)
        .filter_map(|caps| {
            Some(IterationMark {
                offset: caps.get(0)?.start(),
                start: parse_timestamp(&caps[1])?,
                iteration: caps[2].parse().ok()?,
                direction: caps[3].to_string(),
            })
        })
        .collect()
}

fn elapsed_marks(text: &str) -> Vec<ElapsedMark> {
    elapsed_re()
        .captures_iter(text)
        .filter_map(|caps| {
            Some(ElapsedMark {
                offset: caps.get(0)?.start(),
                end: parse_timestamp(&caps[1])?,
                elapsed: caps[2].parse().ok()?,
            })
        })
        .collect()
}

fn row(mark: IterationMark, elapsed: ElapsedMark) -> LatencyRow {
    LatencyRow {
        start: mark.start,
        end: elapsed.end,
        iteration: mark.iteration,
        direction: mark.direction,
        elapsed: elapsed.elapsed,
    }
}

/// Parse with positional pairing.
pub fn parse_log(text: &str) -> Vec<LatencyRow> {
    parse_log_with(text, Pairing::Positional)
}

/// Parse with the given pairing strategy.
pub fn parse_log_with(text: &str, pairing: Pairing) -> Vec<LatencyRow> {
    let iterations = iteration_marks(text);
    let elapsed = elapsed_marks(text);
    if iterations.len() != elapsed.len() {
        debug!(
            "{} Iteration lines vs {} Elapsed lines",
            iterations.len(),
            elapsed.len()
        );
    }

    match pairing {
        Pairing::Positional => iterations
            .into_iter()
            .zip(elapsed)
            .map(|(mark, elapsed)| row(mark, elapsed))
            .collect(),
        Pairing::Sequential => pair_sequential(iterations, elapsed),
    }
}

fn pair_sequential(iterations: Vec<IterationMark>, elapsed: Vec<ElapsedMark>) -> Vec<LatencyRow> {
    let mut iterations = iterations.into_iter().peekable();
    let mut elapsed = elapsed.into_iter().peekable();
    let mut pending: Option<IterationMark> = None;
    let mut rows = Vec::new();

    loop {
        let iteration_first = match (iterations.peek(), elapsed.peek()) {
            (Some(i), Some(e)) => i.offset < e.offset,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };
        if iteration_first {
            // An unpaired predecessor is an orphan and is dropped here.
            pending = iterations.next();
        } else if let Some(mark) = elapsed.next() {
            if let Some(open) = pending.take() {
                rows.push(row(open, mark));
            }
        }
    }
    rows
}

/// Read and parse a log file with the given pairing.
pub fn parse_file(path: &Path, pairing: Pairing) -> Result<Vec<LatencyRow>, ParseError> {
    let text = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let rows = parse_log_with(&text, pairing);
    debug!("Parsed {} rows from {}", rows.len(), path.display());
    Ok(rows)
}
