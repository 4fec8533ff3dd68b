//! Digital I/O driver trait and error types.
//!
//! This module defines:
//! - `IoDriver` trait - Interface for pluggable GPIO backends
//! - `HalError` enum - Error types for HAL operations
//! - `DriverContext` - Everything a driver factory needs
//! - `DriverFactory` type alias - Factory function type

use crate::clock::Clock;
use actuator_common::config::{DriverConfig, WiringConfig};
use std::sync::Arc;
use thiserror::Error;

/// Error types for HAL operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HalError {
    /// Driver initialization failed
    #[error("Initialization failed: {0}")]
    InitFailed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Hardware communication error
    #[error("Hardware communication error on channel {channel}: {reason}")]
    CommunicationError {
        /// GPIO channel involved
        channel: u8,
        /// Underlying failure
        reason: String,
    },

    /// Channel not part of the configured wiring
    #[error("Channel {0} is not configured for this operation")]
    UnknownChannel(u8),

    /// Operation not available for the configured wiring mode
    #[error("Operation requires {0} wiring")]
    WiringMismatch(&'static str),

    /// Driver not found
    #[error("Driver not found: {0}")]
    DriverNotFound(String),

    /// Driver registered twice
    #[error("Driver '{0}' is already registered")]
    DuplicateDriver(&'static str),
}

/// Inputs handed to a driver factory.
pub struct DriverContext<'a> {
    /// Backend settings from `[driver]`.
    pub config: &'a DriverConfig,
    /// Channels the driver must manage.
    pub wiring: WiringConfig,
    /// Clock shared with the controller.
    pub clock: Arc<dyn Clock>,
}

/// Factory function type for creating driver instances.
pub type DriverFactory = fn(&DriverContext<'_>) -> Result<Box<dyn IoDriver>, HalError>;

/// Trait defining the interface for digital I/O drivers.
///
/// # Lifecycle
///
/// 1. `init()` - Claim and configure every channel of the wiring
/// 2. `read_input()` / `write_output()` - Called from the cycle loop
/// 3. `shutdown()` - De-energize outputs and release channels
///
/// Inputs are reported as *active*, with any electrical inversion
/// (pull-up switches) already applied by the driver.
pub trait IoDriver: Send {
    /// Returns the driver's unique identifier (e.g., "cdev", "simulation").
    fn name(&self) -> &'static str;

    /// Configure the channels. Outputs start de-energized.
    fn init(&mut self) -> Result<(), HalError>;

    /// Read whether an input channel is active.
    fn read_input(&mut self, channel: u8) -> Result<bool, HalError>;

    /// Energize (`true`) or de-energize (`false`) an output channel.
    fn write_output(&mut self, channel: u8, on: bool) -> Result<(), HalError>;

    /// Read back the commanded state of an output channel.
    fn output_state(&mut self, channel: u8) -> Result<bool, HalError>;

    /// De-energize every output and release resources.
    fn shutdown(&mut self) -> Result<(), HalError>;
}

impl<D: IoDriver + ?Sized> IoDriver for Box<D> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn init(&mut self) -> Result<(), HalError> {
        (**self).init()
    }

    fn read_input(&mut self, channel: u8) -> Result<bool, HalError> {
        (**self).read_input(channel)
    }

    fn write_output(&mut self, channel: u8, on: bool) -> Result<(), HalError> {
        (**self).write_output(channel, on)
    }

    fn output_state(&mut self, channel: u8) -> Result<bool, HalError> {
        (**self).output_state(channel)
    }

    fn shutdown(&mut self) -> Result<(), HalError> {
        (**self).shutdown()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hal_error_display() {
        let err = HalError::InitFailed("test error".to_string());
        assert!(err.to_string().contains("test error"));

        let err = HalError::CommunicationError {
            channel: 13,
            reason: "permission denied".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("13"));
        assert!(text.contains("permission denied"));

        let err = HalError::DriverNotFound("ethercat".to_string());
        assert!(err.to_string().contains("ethercat"));
    }
}
