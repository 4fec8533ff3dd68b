//! Row rendering: aligned table, CSV and JSON.

use crate::error::ParseError;
use crate::parser::LatencyRow;
use actuator_common::consts::LOG_TIMESTAMP_FORMAT;

const CSV_HEADER: &str = "start,end,iteration,direction,elapsed";

/// Fixed-width table for terminal output.
pub fn render_table(rows: &[LatencyRow]) -> String {
    let mut out = format!(
        "{:>9}  {:<12}  {:>11}  {:<23}  {:<23}\n",
        "iteration", "direction", "elapsed_s", "start", "end"
    );
    for row in rows {
        out.push_str(&format!(
            "{:>9}  {:<12}  {:>11.6}  {:<23}  {:<23}\n",
            row.iteration,
            row.direction,
            row.elapsed,
            row.start.format(LOG_TIMESTAMP_FORMAT),
            row.end.format(LOG_TIMESTAMP_FORMAT)
        ));
    }
    out
}

/// CSV with a header line; timestamps in the event log format.
pub fn to_csv(rows: &[LatencyRow]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for row in rows {
        out.push_str(&format!(
            "{},{},{},{},{:.6}\n",
            row.start.format(LOG_TIMESTAMP_FORMAT),
            row.end.format(LOG_TIMESTAMP_FORMAT),
            row.iteration,
            row.direction,
            row.elapsed
        ));
    }
    out
}

/// Pretty-printed JSON array of rows.
pub fn to_json(rows: &[LatencyRow]) -> Result<String, ParseError> {
    Ok(serde_json::to_string_pretty(rows)?)
}
