//! # Actuator Cycle Library
//!
//! Runs a linear actuator back and forth between its HOME and EXTEND end
//! positions, timing every transition and appending one record per
//! iteration to a line-oriented event log.
//!
//! # Module Structure
//!
//! - [`controller`] - `CycleController` state machine
//! - [`event_log`] - `EventSink` trait and the line-oriented `EventLog`
//! - [`rotation`] - Size-based rotating log file writer
//! - [`stats`] - Per-direction latency statistics
//! - [`error`] - `CycleError`

pub mod controller;
pub mod error;
pub mod event_log;
pub mod rotation;
pub mod stats;

pub use crate::controller::{CycleController, RunSummary, StepOutcome};
pub use crate::error::CycleError;
pub use crate::event_log::{EventLog, EventSink, format_event};
pub use crate::rotation::RotatingFileWriter;
pub use crate::stats::CycleStats;
