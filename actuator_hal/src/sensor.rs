//! Position sensor interface.
//!
//! `PositionSensors` owns the I/O driver for the lifetime of the cycle and
//! is the only path through which sensor inputs are read and drive outputs
//! are written. Reads are purely observational; the only side effects are
//! the driver's hardware I/O.

use crate::clock::Clock;
use crate::driver::{HalError, IoDriver};
use actuator_common::config::WiringConfig;
use actuator_common::types::{DriveCommand, Position};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, trace};

/// Two-channel sensor snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorReading {
    /// Home end-position sensor active.
    pub home_active: bool,
    /// Extend end-position sensor active.
    pub extend_active: bool,
}

impl SensorReading {
    /// Position implied by this reading.
    pub fn position(&self) -> Position {
        infer_position(self.home_active, self.extend_active)
    }
}

/// Infer the actuator position from the two end-position sensors.
///
/// | home | extend | position |
/// |------|--------|----------|
/// | 1 | 1 | `Invalid` |
/// | 1 | 0 | `Home` |
/// | 0 | 1 | `Extend` |
/// | 0 | 0 | `Transitioning` |
pub fn infer_position(home_active: bool, extend_active: bool) -> Position {
    match (home_active, extend_active) {
        (true, true) => Position::Invalid,
        (true, false) => Position::Home,
        (false, true) => Position::Extend,
        (false, false) => Position::Transitioning,
    }
}

/// Sense input to wait on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SenseChannel {
    /// Home sensor (two-channel wiring).
    Home,
    /// Extend sensor (two-channel wiring).
    Extend,
    /// The shared sensor (single-channel wiring).
    Shared,
}

impl fmt::Display for SenseChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SenseChannel::Home => "home",
            SenseChannel::Extend => "extend",
            SenseChannel::Shared => "shared",
        })
    }
}

/// Upper bound for a blocking sensor wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitLimit {
    /// Block until the sensor activates or shutdown is requested.
    Indefinite,
    /// Give up after the duration.
    Within(Duration),
}

impl From<Option<Duration>> for WaitLimit {
    fn from(timeout: Option<Duration>) -> Self {
        match timeout {
            Some(limit) => WaitLimit::Within(limit),
            None => WaitLimit::Indefinite,
        }
    }
}

/// Why a sensor wait returned without the sensor activating.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WaitError {
    /// The wait limit elapsed.
    #[error("{channel} sensor did not activate within {waited:?}")]
    TimedOut {
        /// Channel waited on
        channel: SenseChannel,
        /// Time spent waiting
        waited: Duration,
    },

    /// Shutdown was requested while waiting.
    #[error("wait on {0} sensor interrupted by shutdown")]
    Interrupted(SenseChannel),

    /// The driver failed while polling.
    #[error(transparent)]
    Hal(#[from] HalError),
}

/// Commanded state of the drive outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputState {
    /// Two-channel wiring.
    TwoChannel {
        /// Drive-to-home energized.
        home: bool,
        /// Drive-to-extend energized.
        extend: bool,
    },
    /// Single-channel wiring (on = toward EXTEND).
    SingleChannel {
        /// Shared drive energized.
        drive: bool,
    },
}

impl OutputState {
    /// True if any drive output is energized.
    pub fn any_energized(&self) -> bool {
        match *self {
            OutputState::TwoChannel { home, extend } => home || extend,
            OutputState::SingleChannel { drive } => drive,
        }
    }
}

/// Position sensor interface over an owned I/O driver.
pub struct PositionSensors<D> {
    driver: D,
    wiring: WiringConfig,
    clock: Arc<dyn Clock>,
    poll_interval: Duration,
}

impl<D: IoDriver> PositionSensors<D> {
    /// Wrap an initialized driver.
    pub fn new(
        driver: D,
        wiring: WiringConfig,
        clock: Arc<dyn Clock>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            driver,
            wiring,
            clock,
            poll_interval,
        }
    }

    /// Wiring the sensors were built for.
    pub fn wiring(&self) -> &WiringConfig {
        &self.wiring
    }

    /// Clock used for waits.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Borrow the driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Mutably borrow the driver.
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Release the driver.
    pub fn into_driver(self) -> D {
        self.driver
    }

    /// Read both sensors (two-channel wiring).
    pub fn read(&mut self) -> Result<SensorReading, HalError> {
        let WiringConfig::TwoChannel {
            home_sense,
            extend_sense,
            ..
        } = self.wiring
        else {
            return Err(HalError::WiringMismatch("two-channel"));
        };
        Ok(SensorReading {
            home_active: self.driver.read_input(home_sense)?,
            extend_active: self.driver.read_input(extend_sense)?,
        })
    }

    /// Current position (two-channel wiring).
    pub fn position(&mut self) -> Result<Position, HalError> {
        Ok(self.read()?.position())
    }

    /// Read the shared sensor (single-channel wiring).
    pub fn read_single(&mut self) -> Result<bool, HalError> {
        let WiringConfig::SingleChannel { sense, .. } = self.wiring else {
            return Err(HalError::WiringMismatch("single-channel"));
        };
        self.driver.read_input(sense)
    }

    /// Whether one sense channel is currently active.
    pub fn is_active(&mut self, channel: SenseChannel) -> Result<bool, HalError> {
        let input = self.sense_input(channel)?;
        self.driver.read_input(input)
    }

    /// Block until `channel` reports active.
    ///
    /// The shutdown flag and the limit are checked once per poll interval.
    /// Returns the time spent waiting.
    pub fn wait_for_active(
        &mut self,
        channel: SenseChannel,
        limit: WaitLimit,
        shutdown: &AtomicBool,
    ) -> Result<Duration, WaitError> {
        let input = self.sense_input(channel)?;
        let started = self.clock.now();
        debug!("Waiting for {} sensor (channel {}, {:?})", channel, input, limit);

        loop {
            if self.driver.read_input(input)? {
                let waited = self.clock.now() - started;
                trace!("{} sensor active after {:?}", channel, waited);
                return Ok(waited);
            }
            if shutdown.load(Ordering::SeqCst) {
                return Err(WaitError::Interrupted(channel));
            }

            let waited = self.clock.now() - started;
            let nap = match limit {
                WaitLimit::Indefinite => self.poll_interval,
                WaitLimit::Within(max) => {
                    if waited >= max {
                        return Err(WaitError::TimedOut { channel, waited });
                    }
                    self.poll_interval.min(max - waited)
                }
            };
            self.clock.sleep(nap);
        }
    }

    /// Apply a drive command.
    ///
    /// Outputs are always de-energized before the opposite one is
    /// energized, so both drives are never on together.
    pub fn apply(&mut self, command: DriveCommand) -> Result<(), HalError> {
        debug!("Drive command: {:?}", command);
        match self.wiring {
            WiringConfig::TwoChannel {
                home_drive,
                extend_drive,
                ..
            } => match command {
                DriveCommand::DriveHome => {
                    self.driver.write_output(extend_drive, false)?;
                    self.driver.write_output(home_drive, true)
                }
                DriveCommand::DriveExtend => {
                    self.driver.write_output(home_drive, false)?;
                    self.driver.write_output(extend_drive, true)
                }
                DriveCommand::Stop => {
                    let home = self.driver.write_output(home_drive, false);
                    let extend = self.driver.write_output(extend_drive, false);
                    home.and(extend)
                }
            },
            WiringConfig::SingleChannel { drive, .. } => {
                let on = matches!(command, DriveCommand::DriveExtend);
                self.driver.write_output(drive, on)
            }
        }
    }

    /// Read back the drive outputs.
    pub fn outputs(&mut self) -> Result<OutputState, HalError> {
        match self.wiring {
            WiringConfig::TwoChannel {
                home_drive,
                extend_drive,
                ..
            } => Ok(OutputState::TwoChannel {
                home: self.driver.output_state(home_drive)?,
                extend: self.driver.output_state(extend_drive)?,
            }),
            WiringConfig::SingleChannel { drive, .. } => Ok(OutputState::SingleChannel {
                drive: self.driver.output_state(drive)?,
            }),
        }
    }

    fn sense_input(&self, channel: SenseChannel) -> Result<u8, HalError> {
        match (self.wiring, channel) {
            (WiringConfig::TwoChannel { home_sense, .. }, SenseChannel::Home) => Ok(home_sense),
            (WiringConfig::TwoChannel { extend_sense, .. }, SenseChannel::Extend) => {
                Ok(extend_sense)
            }
            (WiringConfig::SingleChannel { sense, .. }, SenseChannel::Shared) => Ok(sense),
            (WiringConfig::TwoChannel { .. }, SenseChannel::Shared) => {
                Err(HalError::WiringMismatch("single-channel"))
            }
            (WiringConfig::SingleChannel { .. }, _) => {
                Err(HalError::WiringMismatch("two-channel"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::drivers::simulation::SimulationDriver;

    fn two_channel() -> WiringConfig {
        WiringConfig::default()
    }

    fn sensors(
        wiring: WiringConfig,
        travel: Duration,
    ) -> (PositionSensors<SimulationDriver>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let driver = SimulationDriver::new(wiring, travel, clock.clone());
        let sensors = PositionSensors::new(driver, wiring, clock.clone(), Duration::from_millis(10));
        (sensors, clock)
    }

    #[test]
    fn test_position_truth_table() {
        assert_eq!(infer_position(true, true), Position::Invalid);
        assert_eq!(infer_position(true, false), Position::Home);
        assert_eq!(infer_position(false, true), Position::Extend);
        assert_eq!(infer_position(false, false), Position::Transitioning);
    }

    #[test]
    fn test_reading_position_follows_forced_inputs() {
        let (mut sensors, _clock) = sensors(two_channel(), Duration::from_secs(1));
        for (home, extend) in [(true, true), (true, false), (false, true), (false, false)] {
            sensors.driver_mut().force_input(5, Some(home));
            sensors.driver_mut().force_input(13, Some(extend));
            assert_eq!(sensors.position().unwrap(), infer_position(home, extend));
        }
    }

    #[test]
    fn test_wait_for_active_returns_after_travel() {
        let (mut sensors, clock) = sensors(two_channel(), Duration::from_secs(1));
        let shutdown = AtomicBool::new(false);

        sensors.apply(DriveCommand::DriveExtend).unwrap();
        let waited = sensors
            .wait_for_active(SenseChannel::Extend, WaitLimit::Indefinite, &shutdown)
            .unwrap();

        assert!(waited >= Duration::from_secs(1));
        assert!(waited < Duration::from_millis(1100));
        assert_eq!(clock.elapsed(), waited);
        assert_eq!(sensors.position().unwrap(), Position::Extend);
    }

    #[test]
    fn test_wait_for_active_times_out() {
        let (mut sensors, _clock) = sensors(two_channel(), Duration::from_secs(10));
        let shutdown = AtomicBool::new(false);

        sensors.apply(DriveCommand::DriveExtend).unwrap();
        let err = sensors
            .wait_for_active(
                SenseChannel::Extend,
                WaitLimit::Within(Duration::from_secs(2)),
                &shutdown,
            )
            .unwrap_err();

        assert_eq!(
            err,
            WaitError::TimedOut {
                channel: SenseChannel::Extend,
                waited: Duration::from_secs(2),
            }
        );
    }

    #[test]
    fn test_wait_for_active_interrupted_by_shutdown() {
        let (mut sensors, _clock) = sensors(two_channel(), Duration::from_secs(10));
        let shutdown = AtomicBool::new(true);

        sensors.apply(DriveCommand::DriveExtend).unwrap();
        let err = sensors
            .wait_for_active(SenseChannel::Extend, WaitLimit::Indefinite, &shutdown)
            .unwrap_err();
        assert_eq!(err, WaitError::Interrupted(SenseChannel::Extend));
    }

    #[test]
    fn test_wait_returns_immediately_when_already_active() {
        let (mut sensors, clock) = sensors(two_channel(), Duration::from_secs(1));
        let shutdown = AtomicBool::new(true);
        let waited = sensors
            .wait_for_active(SenseChannel::Home, WaitLimit::Indefinite, &shutdown)
            .unwrap();
        assert_eq!(waited, Duration::ZERO);
        assert!(clock.sleeps().is_empty());
    }

    #[test]
    fn test_apply_never_energizes_both_outputs() {
        let (mut sensors, _clock) = sensors(two_channel(), Duration::from_secs(1));

        sensors.apply(DriveCommand::DriveExtend).unwrap();
        assert_eq!(
            sensors.outputs().unwrap(),
            OutputState::TwoChannel {
                home: false,
                extend: true
            }
        );

        sensors.apply(DriveCommand::DriveHome).unwrap();
        assert_eq!(
            sensors.outputs().unwrap(),
            OutputState::TwoChannel {
                home: true,
                extend: false
            }
        );

        sensors.apply(DriveCommand::Stop).unwrap();
        assert!(!sensors.outputs().unwrap().any_energized());
    }

    #[test]
    fn test_wiring_mismatch_is_reported() {
        let single = WiringConfig::SingleChannel { sense: 17, drive: 27 };
        let (mut sensors, _clock) = sensors(single, Duration::from_secs(1));
        assert_eq!(
            sensors.read().unwrap_err(),
            HalError::WiringMismatch("two-channel")
        );
        assert!(sensors.read_single().unwrap());

        let shutdown = AtomicBool::new(false);
        let err = sensors
            .wait_for_active(SenseChannel::Home, WaitLimit::Indefinite, &shutdown)
            .unwrap_err();
        assert_eq!(err, WaitError::Hal(HalError::WiringMismatch("two-channel")));
    }

    #[test]
    fn test_wait_limit_from_option() {
        assert_eq!(WaitLimit::from(None), WaitLimit::Indefinite);
        assert_eq!(
            WaitLimit::from(Some(Duration::from_secs(3))),
            WaitLimit::Within(Duration::from_secs(3))
        );
    }
}
