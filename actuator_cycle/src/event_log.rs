//! Line-oriented event log.
//!
//! Each completed iteration produces:
//!
//! ```text
//! 2024-01-01 00:00:00,000 Iteration 3 -> Extend
//! 2024-01-01 00:00:02,500 Elapsed 2.500000
//! ```
//!
//! with an extra `Fault <tag>: <detail>` line between the two for fault
//! recoveries. The iteration line carries the start timestamp and the
//! elapsed line the end timestamp; the offline parser relies on both
//! shapes. Writes are best-effort: a failure is reported through tracing
//! and counted, never returned to the controller.

use actuator_common::consts::LOG_TIMESTAMP_FORMAT;
use actuator_common::types::CycleEvent;
use chrono::{DateTime, Local};
use std::io::Write;
use tracing::warn;

/// Destination for cycle events and free-form notes.
pub trait EventSink {
    /// Append one iteration record.
    fn record(&mut self, event: &CycleEvent);

    /// Append a free-form line stamped with `at`.
    fn note(&mut self, at: DateTime<Local>, message: &str);
}

/// Format a wall-clock timestamp as `YYYY-MM-DD HH:MM:SS,mmm`.
pub fn format_timestamp(at: &DateTime<Local>) -> String {
    at.format(LOG_TIMESTAMP_FORMAT).to_string()
}

/// Render the log lines for one event, newline-terminated.
pub fn format_event(event: &CycleEvent) -> String {
    let start = format_timestamp(&event.start());
    let end = format_timestamp(&event.end());

    let mut out = format!(
        "{start} Iteration {} -> {}\n",
        event.iteration(),
        event.direction()
    );
    if let Some(fault) = event.fault() {
        out.push_str(&format!("{end} Fault {}: {}\n", fault.name(), fault.detail()));
    }
    out.push_str(&format!(
        "{end} Elapsed {:.6}\n",
        event.elapsed().as_secs_f64()
    ));
    out
}

/// Event sink writing to any `Write` implementation.
#[derive(Debug)]
pub struct EventLog<W: Write> {
    writer: W,
    write_failures: u64,
}

impl<W: Write> EventLog<W> {
    /// Wrap a writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            write_failures: 0,
        }
    }

    /// Borrow the underlying writer.
    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Unwrap the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Number of records or notes that could not be written.
    pub fn write_failures(&self) -> u64 {
        self.write_failures
    }

    fn append(&mut self, text: &str) {
        let result = self
            .writer
            .write_all(text.as_bytes())
            .and_then(|_| self.writer.flush());
        if let Err(e) = result {
            self.write_failures += 1;
            warn!(
                "Event log write failed ({} total): {}",
                self.write_failures, e
            );
        }
    }
}

impl<W: Write> EventSink for EventLog<W> {
    fn record(&mut self, event: &CycleEvent) {
        let text = format_event(event);
        self.append(&text);
    }

    fn note(&mut self, at: DateTime<Local>, message: &str) {
        let text = format!("{} {}\n", format_timestamp(&at), message);
        self.append(&text);
    }
}
