//! Default values for the cycle tester.
//!
//! Channel numbers are BCM GPIO numbers as wired on the reference test rig.

/// Home sense input.
pub const DEFAULT_HOME_SENSE: u8 = 5;
/// Drive-to-home output.
pub const DEFAULT_HOME_DRIVE: u8 = 6;
/// Extend sense input.
pub const DEFAULT_EXTEND_SENSE: u8 = 13;
/// Drive-to-extend output.
pub const DEFAULT_EXTEND_DRIVE: u8 = 19;

/// Seconds to wait between iterations.
pub const DEFAULT_INTER_CYCLE_WAIT_S: f64 = 2.0;
/// Settle delay after an invalid (both sensors active) reading.
pub const DEFAULT_INVALID_SETTLE_S: f64 = 5.0;
/// Settle delay after toggling the single shared drive output.
pub const DEFAULT_TOGGLE_SETTLE_S: f64 = 0.5;
/// Sensor polling period while blocked in a wait.
pub const DEFAULT_POLL_INTERVAL_S: f64 = 0.005;

/// Event log file name.
pub const DEFAULT_EVENT_LOG_PATH: &str = "actuator.log";
/// Rotate the event log once it reaches this size.
pub const DEFAULT_EVENT_LOG_MAX_BYTES: u64 = 20_000_000;
/// Number of rotated event log files kept.
pub const DEFAULT_EVENT_LOG_BACKUPS: u32 = 10;

/// Default service name.
pub const DEFAULT_SERVICE_NAME: &str = "actuator-cycle";

/// Simulated end-to-end travel time.
pub const DEFAULT_SIM_TRAVEL_TIME_S: f64 = 1.5;

/// GPIO character device carrying the header pins (BCM numbers are line offsets).
pub const DEFAULT_GPIO_CHIP: &str = "/dev/gpiochip0";

/// Timestamp layout used in event log lines (`2024-01-01 00:00:00,000`).
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";
