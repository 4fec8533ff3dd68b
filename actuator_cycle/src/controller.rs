//! Reciprocating cycle controller.
//!
//! One iteration:
//!
//! 1. Infer the position (two-channel) or sample the shared sensor
//!    (single-channel).
//! 2. Pick a [`Transition`]: the drive command, an optional settle delay,
//!    the sensor to wait on and the outcome label.
//! 3. Drive, settle, block until the sensor activates.
//! 4. Emit one [`CycleEvent`] and sleep the inter-cycle wait.
//!
//! Sensor anomalies (both end sensors active, the shared sensor dropping
//! out) are recovered by driving HOME; the loop keeps running. Only a
//! configured fault timeout or a driver failure ends a run with an error.
//! Shutdown is cooperative: the flag is checked at iteration boundaries and
//! on every poll of a wait, and all drive outputs are released before
//! returning.
//!
//! Two-channel transition table:
//!
//! | Position | Command | Settle | Wait on | Label | Fault |
//! |---|---|---|---|---|---|
//! | `Home` | DriveExtend | - | extend | `Extend` | - |
//! | `Extend` | DriveHome | - | home | `Home` | - |
//! | `Invalid` | DriveHome | `invalid_settle` | home | `RecoverHome` | `InvalidPosition` |
//! | `Transitioning` | DriveHome | - | home | `RecoverHome` | - |
//! | `Unknown` | DriveHome | - | home | `RecoverHome` | `UnknownPosition` |

use crate::error::CycleError;
use crate::event_log::EventSink;
use crate::stats::CycleStats;
use actuator_common::config::TimingConfig;
use actuator_common::types::{CycleEvent, Direction, DriveCommand, FaultTag, Position};
use actuator_hal::{Clock, HalError, IoDriver, PositionSensors, SenseChannel, WaitError, WaitLimit};
use chrono::{DateTime, Local};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Log a statistics summary every this many iterations.
const STATS_LOG_INTERVAL: u64 = 100;

/// What one iteration commands and waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Transition {
    command: DriveCommand,
    settle: Option<Duration>,
    await_channel: SenseChannel,
    direction: Direction,
    fault: Option<FaultTag>,
    /// New value of the single-channel extended flag on success.
    extended_after: Option<bool>,
}

/// Result of a single iteration.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// The transition finished and its event was recorded.
    Completed(CycleEvent),
    /// Shutdown was requested; outputs have been released.
    Interrupted,
}

/// Totals returned by [`CycleController::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Iterations completed.
    pub iterations: u64,
    /// Run ended by the shutdown flag rather than the iteration limit.
    pub interrupted: bool,
    /// Latency statistics.
    pub stats: CycleStats,
}

/// Cycle controller owning the sensor interface and the event sink.
pub struct CycleController<D, L> {
    sensors: PositionSensors<D>,
    events: L,
    clock: Arc<dyn Clock>,
    timing: TimingConfig,
    shutdown: Arc<AtomicBool>,
    iteration: u64,
    /// Single-channel: last commanded direction was EXTEND.
    extended: bool,
    iteration_limit: Option<u64>,
    stats: CycleStats,
}

impl<D: IoDriver, L: EventSink> CycleController<D, L> {
    /// Create a controller. The iteration index starts at 0.
    pub fn new(sensors: PositionSensors<D>, events: L, timing: TimingConfig) -> Self {
        let clock = Arc::clone(sensors.clock());
        Self {
            sensors,
            events,
            clock,
            timing,
            shutdown: Arc::new(AtomicBool::new(false)),
            iteration: 0,
            extended: false,
            iteration_limit: None,
            stats: CycleStats::default(),
        }
    }

    /// Stop after `limit` iterations instead of running until shutdown.
    pub fn with_iteration_limit(mut self, limit: u64) -> Self {
        self.iteration_limit = Some(limit);
        self
    }

    /// Flag that requests a cooperative shutdown when set.
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Index of the next iteration.
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Single-channel extended flag.
    pub fn is_extended(&self) -> bool {
        self.extended
    }

    /// Statistics so far.
    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    /// Borrow the sensor interface.
    pub fn sensors(&self) -> &PositionSensors<D> {
        &self.sensors
    }

    /// Mutably borrow the sensor interface.
    pub fn sensors_mut(&mut self) -> &mut PositionSensors<D> {
        &mut self.sensors
    }

    /// Borrow the event sink.
    pub fn events(&self) -> &L {
        &self.events
    }

    /// Release the sensor interface and the event sink.
    pub fn into_parts(self) -> (PositionSensors<D>, L) {
        (self.sensors, self.events)
    }

    /// Run iterations until shutdown, the iteration limit, or a fatal error.
    pub fn run(&mut self) -> Result<RunSummary, CycleError> {
        self.note_initial_state()?;
        info!(
            "Starting cycle: wiring={:?}, wait={:?}, fault_timeout={:?}",
            self.sensors.wiring(),
            self.timing.inter_cycle_wait(),
            self.timing.fault_timeout()
        );

        let mut interrupted = false;
        while !self.limit_reached() {
            if let StepOutcome::Interrupted = self.step()? {
                interrupted = true;
                break;
            }
            if self.limit_reached() {
                break;
            }
            if !self.pause(self.timing.inter_cycle_wait()) {
                interrupted = true;
                break;
            }
        }
        self.halt();

        info!(
            "Cycle stopped after {} iterations ({} faults)",
            self.iteration, self.stats.faults
        );
        self.log_stats();
        Ok(RunSummary {
            iterations: self.iteration,
            interrupted,
            stats: self.stats.clone(),
        })
    }

    /// Run one iteration (steps 1-5) without the inter-cycle wait.
    pub fn step(&mut self) -> Result<StepOutcome, CycleError> {
        if self.shutdown.load(Ordering::SeqCst) {
            self.halt();
            return Ok(StepOutcome::Interrupted);
        }

        let (observed, transition) = if self.sensors.wiring().is_single_channel() {
            let active = self.sensors.read_single().map_err(|e| self.fail(e))?;
            let observed = match (active, self.extended) {
                (false, _) => Position::Transitioning,
                (true, true) => Position::Extend,
                (true, false) => Position::Home,
            };
            (observed, self.plan_single_channel(active))
        } else {
            let position = self.sensors.position().map_err(|e| self.fail(e))?;
            (position, self.plan_two_channel(position))
        };

        self.execute(observed, transition)
    }

    fn plan_two_channel(&self, position: Position) -> Transition {
        let home = |direction, settle, fault| Transition {
            command: DriveCommand::DriveHome,
            settle,
            await_channel: SenseChannel::Home,
            direction,
            fault,
            extended_after: None,
        };
        match position {
            Position::Home => Transition {
                command: DriveCommand::DriveExtend,
                settle: None,
                await_channel: SenseChannel::Extend,
                direction: Direction::Extend,
                fault: None,
                extended_after: None,
            },
            Position::Extend => home(Direction::Home, None, None),
            Position::Invalid => home(
                Direction::RecoverHome,
                Some(self.timing.invalid_settle()),
                Some(FaultTag::InvalidPosition),
            ),
            Position::Transitioning => home(Direction::RecoverHome, None, None),
            // The truth table never yields Unknown; kept as the explicit
            // catch-all recovery.
            Position::Unknown => home(
                Direction::RecoverHome,
                None,
                Some(FaultTag::UnknownPosition),
            ),
        }
    }

    fn plan_single_channel(&self, sensor_active: bool) -> Transition {
        let settle = Some(self.timing.toggle_settle());
        if !sensor_active {
            return Transition {
                command: DriveCommand::DriveHome,
                settle,
                await_channel: SenseChannel::Shared,
                direction: Direction::RecoverHome,
                fault: Some(FaultTag::SensorDropout),
                extended_after: Some(false),
            };
        }
        let extend = !self.extended;
        Transition {
            command: if extend {
                DriveCommand::DriveExtend
            } else {
                DriveCommand::DriveHome
            },
            settle,
            await_channel: SenseChannel::Shared,
            direction: if extend {
                Direction::Extend
            } else {
                Direction::Home
            },
            fault: None,
            extended_after: Some(extend),
        }
    }

    fn execute(
        &mut self,
        observed: Position,
        transition: Transition,
    ) -> Result<StepOutcome, CycleError> {
        let start = self.clock.now();
        let start_wall = self.clock.wall();
        self.events.note(
            start_wall,
            &format!(
                "Iteration {} starts at position {}.",
                self.iteration, observed
            ),
        );

        match transition.fault {
            Some(FaultTag::SensorDropout) => error!(
                "Iteration {}: sensor inactive at loop entry, forcing output off",
                self.iteration
            ),
            Some(fault) => warn!(
                "Iteration {}: {} at position {}, returning to HOME",
                self.iteration, fault, observed
            ),
            None => debug!(
                "Iteration {}: {} -> {:?}",
                self.iteration, observed, transition.command
            ),
        }

        match self.drive_and_wait(&transition) {
            Ok(_) => {}
            Err(WaitError::Interrupted(channel)) => {
                info!(
                    "Iteration {} interrupted while waiting for {} sensor",
                    self.iteration, channel
                );
                self.halt();
                return Ok(StepOutcome::Interrupted);
            }
            Err(WaitError::TimedOut { channel, waited }) => {
                self.halt();
                let event = self.finish(
                    start,
                    start_wall,
                    observed,
                    transition.direction,
                    Some(FaultTag::Timeout),
                );
                error!(
                    "Iteration {}: {} sensor did not activate within {:?}, drives stopped",
                    event.iteration(),
                    channel,
                    waited
                );
                return Err(CycleError::SensorTimeout {
                    iteration: event.iteration(),
                    channel,
                    waited,
                });
            }
            Err(WaitError::Hal(e)) => return Err(self.fail(e)),
        }

        if let Some(extended) = transition.extended_after {
            self.extended = extended;
        }
        let event = self.finish(
            start,
            start_wall,
            observed,
            transition.direction,
            transition.fault,
        );
        Ok(StepOutcome::Completed(event))
    }

    fn drive_and_wait(&mut self, transition: &Transition) -> Result<Duration, WaitError> {
        self.sensors.apply(transition.command)?;
        if let Some(settle) = transition.settle {
            self.clock.sleep(settle);
        }
        let limit = WaitLimit::from(self.timing.fault_timeout());
        self.sensors
            .wait_for_active(transition.await_channel, limit, &self.shutdown)
    }

    /// Build, record and count the event for the current iteration.
    fn finish(
        &mut self,
        start: Instant,
        start_wall: DateTime<Local>,
        observed: Position,
        direction: Direction,
        fault: Option<FaultTag>,
    ) -> CycleEvent {
        let end = self.clock.now();
        let end_wall = self.clock.wall();
        let event = CycleEvent::new(
            self.iteration,
            start_wall,
            end_wall,
            end.saturating_duration_since(start),
            observed,
            direction,
            fault,
        );

        self.events.record(&event);
        self.stats.record(&event);
        info!(
            "Iteration {} -> {} in {:.3}s",
            event.iteration(),
            event.direction(),
            event.elapsed().as_secs_f64()
        );
        if self.stats.iterations % STATS_LOG_INTERVAL == 0 {
            self.log_stats();
        }

        self.iteration += 1;
        event
    }

    fn note_initial_state(&mut self) -> Result<(), CycleError> {
        let message = if self.sensors.wiring().is_single_channel() {
            let active = self.sensors.read_single().map_err(|e| self.fail(e))?;
            format!(
                "Initial sensor state: {}",
                if active { "active" } else { "inactive" }
            )
        } else {
            let position = self.sensors.position().map_err(|e| self.fail(e))?;
            format!("Initial position: {position}")
        };
        info!("{}", message);
        self.events.note(self.clock.wall(), &message);
        Ok(())
    }

    /// Sleep in poll-sized slices; false if shutdown was requested.
    fn pause(&self, duration: Duration) -> bool {
        let deadline = self.clock.now() + duration;
        let poll = self.timing.poll_interval();
        loop {
            if self.shutdown.load(Ordering::SeqCst) {
                return false;
            }
            let now = self.clock.now();
            if now >= deadline {
                return true;
            }
            self.clock.sleep((deadline - now).min(poll));
        }
    }

    fn limit_reached(&self) -> bool {
        self.iteration_limit
            .is_some_and(|limit| self.iteration >= limit)
    }

    /// De-energize every drive output; failures are logged only.
    fn halt(&mut self) {
        if let Err(e) = self.sensors.apply(DriveCommand::Stop) {
            error!("Failed to de-energize drive outputs: {}", e);
        }
    }

    fn fail(&mut self, e: HalError) -> CycleError {
        error!("I/O driver failure: {}", e);
        self.halt();
        CycleError::Hal(e)
    }

    fn log_stats(&self) {
        info!(
            "Stats after {} iterations: extend [{}] home [{}] recover [{}] faults={}",
            self.stats.iterations,
            self.stats.extend,
            self.stats.home,
            self.stats.recover,
            self.stats.faults
        );
    }
}
