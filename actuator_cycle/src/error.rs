//! Error types for the cycle controller.
//!
//! Sensor anomalies are not errors: they are logged and recovered inside
//! the loop. Only the conditions below end a run.

use actuator_hal::{HalError, SenseChannel};
use std::time::Duration;
use thiserror::Error;

/// Fatal cycle errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CycleError {
    /// A sensor did not activate within the configured fault timeout.
    #[error("iteration {iteration}: {channel} sensor did not activate within {waited:?}")]
    SensorTimeout {
        /// Iteration that timed out
        iteration: u64,
        /// Sensor that was awaited
        channel: SenseChannel,
        /// Time spent waiting
        waited: Duration,
    },

    /// The I/O driver failed.
    #[error("I/O driver failure: {0}")]
    Hal(#[from] HalError),
}
