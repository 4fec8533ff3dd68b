//! Cycle data model.
//!
//! Everything here is derived or produced fresh each iteration; nothing is
//! persisted across process restarts.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Actuator position inferred from the end-position sensors.
///
/// `Unknown` is never produced by the two-sensor truth table. It is the
/// value before the first read and the explicit fallback arm of the
/// controller's dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Position {
    /// Home sensor active, extend sensor inactive.
    Home,
    /// Extend sensor active, home sensor inactive.
    Extend,
    /// Neither sensor active (between end stops).
    Transitioning,
    /// Both sensors active at once (wiring or mechanical fault).
    Invalid,
    /// Not determined.
    #[default]
    Unknown,
}

impl Position {
    /// Short upper-case label used in log notes.
    pub const fn label(&self) -> &'static str {
        match self {
            Position::Home => "HOME",
            Position::Extend => "EXTEND",
            Position::Transitioning => "TRANS",
            Position::Invalid => "INVALID",
            Position::Unknown => "UNKNOWN",
        }
    }

    /// True for the two mechanical end positions.
    pub const fn is_end_position(&self) -> bool {
        matches!(self, Position::Home | Position::Extend)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Command applied to the drive outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DriveCommand {
    /// Energize motion toward HOME.
    DriveHome,
    /// Energize motion toward EXTEND.
    DriveExtend,
    /// De-energize every drive output.
    Stop,
}

/// Outcome label of one iteration, as written to the event log.
///
/// Every label contains `Home` or `Extend` so the offline filter can
/// classify the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Moved to HOME.
    Home,
    /// Moved to EXTEND.
    Extend,
    /// Re-homed after an anomalous reading.
    RecoverHome,
}

impl Direction {
    /// Label written after `->` in the iteration line.
    pub const fn label(&self) -> &'static str {
        match self {
            Direction::Home => "Home",
            Direction::Extend => "Extend",
            Direction::RecoverHome => "RecoverHome",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Fault classification attached to a cycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultTag {
    /// Home and extend sensors reported active together.
    InvalidPosition,
    /// Position could not be classified.
    UnknownPosition,
    /// Single shared sensor was inactive at loop entry.
    SensorDropout,
    /// A sensor did not activate within the configured fault timeout.
    Timeout,
}

impl FaultTag {
    /// Stable name used in log lines.
    pub const fn name(&self) -> &'static str {
        match self {
            FaultTag::InvalidPosition => "invalid_position",
            FaultTag::UnknownPosition => "unknown_position",
            FaultTag::SensorDropout => "sensor_dropout",
            FaultTag::Timeout => "timeout",
        }
    }

    /// Human readable description.
    pub const fn detail(&self) -> &'static str {
        match self {
            FaultTag::InvalidPosition => {
                "both home and extend detected, returned to HOME after settle delay"
            }
            FaultTag::UnknownPosition => "unresolved position, returned to HOME",
            FaultTag::SensorDropout => "sensor inactive at loop entry, output forced off",
            FaultTag::Timeout => "sensor did not activate within fault timeout, drives stopped",
        }
    }

    /// Faults that stop the cycle instead of triggering a re-home.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, FaultTag::Timeout)
    }
}

impl fmt::Display for FaultTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Record of one completed iteration.
///
/// Built once by the cycle controller and handed to the event logger.
/// Fields are only reachable through accessors.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleEvent {
    iteration: u64,
    start: DateTime<Local>,
    end: DateTime<Local>,
    elapsed: Duration,
    position: Position,
    direction: Direction,
    fault: Option<FaultTag>,
}

impl CycleEvent {
    /// Create a new event.
    ///
    /// `elapsed` comes from the monotonic clock; `start`/`end` are the
    /// wall-clock values written to the log.
    pub fn new(
        iteration: u64,
        start: DateTime<Local>,
        end: DateTime<Local>,
        elapsed: Duration,
        position: Position,
        direction: Direction,
        fault: Option<FaultTag>,
    ) -> Self {
        Self {
            iteration,
            start,
            end,
            elapsed,
            position,
            direction,
            fault,
        }
    }

    /// Iteration index, starting at 0.
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Wall-clock start of the iteration.
    pub fn start(&self) -> DateTime<Local> {
        self.start
    }

    /// Wall-clock end of the iteration.
    pub fn end(&self) -> DateTime<Local> {
        self.end
    }

    /// Monotonic elapsed time.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Position observed at loop entry.
    pub fn position(&self) -> Position {
        self.position
    }

    /// Outcome label.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Fault tag, if the iteration was a fault recovery.
    pub fn fault(&self) -> Option<FaultTag> {
        self.fault
    }

    /// True if this iteration carried a fault tag.
    pub fn is_fault(&self) -> bool {
        self.fault.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_position_default_is_unknown() {
        assert_eq!(Position::default(), Position::Unknown);
    }

    #[test]
    fn test_position_labels() {
        assert_eq!(Position::Home.to_string(), "HOME");
        assert_eq!(Position::Transitioning.to_string(), "TRANS");
        assert_eq!(Position::Invalid.to_string(), "INVALID");
        assert!(Position::Extend.is_end_position());
        assert!(!Position::Invalid.is_end_position());
    }

    #[test]
    fn test_direction_labels_classify_as_home_or_extend() {
        for direction in [Direction::Home, Direction::Extend, Direction::RecoverHome] {
            let label = direction.label();
            assert!(label.contains("Home") || label.contains("Extend"), "{label}");
            assert!(label.chars().all(|c| c.is_ascii_alphanumeric()), "{label}");
        }
    }

    #[test]
    fn test_fault_tag_fatality() {
        assert!(FaultTag::Timeout.is_fatal());
        assert!(!FaultTag::InvalidPosition.is_fatal());
        assert!(!FaultTag::UnknownPosition.is_fatal());
        assert!(!FaultTag::SensorDropout.is_fatal());
        assert_eq!(FaultTag::SensorDropout.to_string(), "sensor_dropout");
    }

    #[test]
    fn test_cycle_event_accessors() {
        let start = Local.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = start + chrono::Duration::milliseconds(2500);
        let event = CycleEvent::new(
            3,
            start,
            end,
            Duration::from_millis(2500),
            Position::Home,
            Direction::Extend,
            None,
        );
        assert_eq!(event.iteration(), 3);
        assert_eq!(event.end() - event.start(), chrono::Duration::milliseconds(2500));
        assert_eq!(event.elapsed(), Duration::from_millis(2500));
        assert_eq!(event.direction(), Direction::Extend);
        assert!(!event.is_fault());
    }
}
