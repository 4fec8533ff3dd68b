//! # Actuator Log Parser
//!
//! Offline analysis of the event log written by `actuator_cycle`: extracts
//! one latency row per iteration, filters by direction, summarizes the
//! trend and renders it as a terminal plot or CSV/JSON.
//!
//! # Module Structure
//!
//! - [`parser`] - Regex extraction and Iteration/Elapsed pairing
//! - [`analysis`] - Direction filter and trend summary
//! - [`plot`] - ASCII line plot of elapsed vs iteration
//! - [`export`] - Table, CSV and JSON rendering
//! - [`error`] - `ParseError`
//!
//! # Example
//!
//! ```
//! use actuator_logparse::{filter_direction, parse_log};
//!
//! let text = "2024-01-01 00:00:00,000 Iteration 3 -> Extend\n\
//!             2024-01-01 00:00:02,500 Elapsed 2.5\n";
//! let rows = parse_log(text);
//! assert_eq!(rows[0].iteration, 3);
//! assert_eq!(filter_direction(&rows, "Extend").len(), 1);
//! ```

pub mod analysis;
pub mod error;
pub mod export;
pub mod parser;
pub mod plot;

pub use crate::analysis::{TrendSummary, filter_direction};
pub use crate::error::ParseError;
pub use crate::export::{render_table, to_csv, to_json};
pub use crate::parser::{LatencyRow, Pairing, parse_file, parse_log, parse_log_with};
pub use crate::plot::render_plot;
