//! Prelude module for common re-exports.
//!
//! ```rust
//! use actuator_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{
    ActuatorConfig, ConfigError, ConfigLoader, DriverConfig, EventLogConfig, LogLevel,
    SharedConfig, TimingConfig, WiringConfig,
};

// ─── Data model ─────────────────────────────────────────────────────
pub use crate::types::{CycleEvent, Direction, DriveCommand, FaultTag, Position};

// ─── Constants ──────────────────────────────────────────────────────
pub use crate::consts::LOG_TIMESTAMP_FORMAT;
