//! Simulation driver.
//!
//! Emulates a linear actuator between two end stops so the cycle can run
//! without hardware. The carriage position is a fraction of the stroke
//! (0.0 = HOME, 1.0 = EXTEND) that moves at `1 / travel_time` per second
//! while exactly one drive direction is energized. End-position inputs are
//! derived from that position on every read; tests can override any input
//! with [`SimulationDriver::force_input`] to inject sensor faults.

use crate::clock::Clock;
use crate::driver::{DriverContext, HalError, IoDriver};
use actuator_common::config::WiringConfig;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// Stroke fraction treated as "at the end stop".
const END_TOLERANCE: f64 = 1e-9;

/// Simulation driver implementing the `IoDriver` trait.
pub struct SimulationDriver {
    wiring: WiringConfig,
    clock: Arc<dyn Clock>,
    /// Seconds for a full stroke; zero moves instantly.
    travel_time: Duration,
    /// Carriage position, 0.0 (home) ..= 1.0 (extend).
    position: f64,
    /// Last time `position` was integrated.
    last_update: Instant,
    /// Commanded output states by channel.
    outputs: HashMap<u8, bool>,
    /// Input overrides by channel.
    forced_inputs: HashMap<u8, bool>,
    /// Carriage ignores drive commands.
    stalled: bool,
    initialized: bool,
}

impl SimulationDriver {
    /// Create a simulated actuator resting at HOME with outputs off.
    pub fn new(wiring: WiringConfig, travel_time: Duration, clock: Arc<dyn Clock>) -> Self {
        let outputs = wiring.outputs().into_iter().map(|ch| (ch, false)).collect();
        let last_update = clock.now();
        Self {
            wiring,
            clock,
            travel_time,
            position: 0.0,
            last_update,
            outputs,
            forced_inputs: HashMap::new(),
            stalled: false,
            initialized: false,
        }
    }

    /// Start from another stroke fraction (clamped to 0.0..=1.0).
    pub fn with_position(mut self, position: f64) -> Self {
        self.position = position.clamp(0.0, 1.0);
        self
    }

    /// Override an input (`Some`) or return it to the simulated value (`None`).
    pub fn force_input(&mut self, channel: u8, state: Option<bool>) {
        match state {
            Some(value) => {
                debug!("SIM DI[{}] forced {}", channel, on_off(value));
                self.forced_inputs.insert(channel, value);
            }
            None => {
                self.forced_inputs.remove(&channel);
            }
        }
    }

    /// Block (`true`) or release (`false`) carriage motion.
    pub fn set_stalled(&mut self, stalled: bool) {
        self.integrate();
        self.stalled = stalled;
    }

    /// Current stroke fraction.
    pub fn carriage_position(&mut self) -> f64 {
        self.integrate();
        self.position
    }

    /// Direction the carriage is being driven: -1 home, +1 extend, 0 none.
    fn drive_direction(&self) -> f64 {
        if self.stalled {
            return 0.0;
        }
        match self.wiring {
            WiringConfig::TwoChannel {
                home_drive,
                extend_drive,
                ..
            } => {
                let home = self.output(home_drive);
                let extend = self.output(extend_drive);
                match (home, extend) {
                    (true, false) => -1.0,
                    (false, true) => 1.0,
                    _ => 0.0,
                }
            }
            // Shared drive: energized moves toward EXTEND, released returns HOME.
            WiringConfig::SingleChannel { drive, .. } => {
                if self.output(drive) {
                    1.0
                } else {
                    -1.0
                }
            }
        }
    }

    fn output(&self, channel: u8) -> bool {
        self.outputs.get(&channel).copied().unwrap_or(false)
    }

    /// Advance the carriage to the clock's current time.
    fn integrate(&mut self) {
        let now = self.clock.now();
        let dt = now.saturating_duration_since(self.last_update);
        self.last_update = now;

        let direction = self.drive_direction();
        if direction == 0.0 || dt.is_zero() {
            return;
        }

        let step = if self.travel_time.is_zero() {
            1.0
        } else {
            dt.as_secs_f64() / self.travel_time.as_secs_f64()
        };
        let before = self.position;
        self.position = (self.position + direction * step).clamp(0.0, 1.0);
        trace!("SIM carriage {:.4} -> {:.4}", before, self.position);
    }

    fn at_home(&self) -> bool {
        self.position <= END_TOLERANCE
    }

    fn at_extend(&self) -> bool {
        self.position >= 1.0 - END_TOLERANCE
    }

    fn simulated_input(&self, channel: u8) -> Result<bool, HalError> {
        match self.wiring {
            WiringConfig::TwoChannel {
                home_sense,
                extend_sense,
                ..
            } => {
                if channel == home_sense {
                    Ok(self.at_home())
                } else if channel == extend_sense {
                    Ok(self.at_extend())
                } else {
                    Err(HalError::UnknownChannel(channel))
                }
            }
            WiringConfig::SingleChannel { sense, .. } if channel == sense => {
                Ok(self.at_home() || self.at_extend())
            }
            WiringConfig::SingleChannel { .. } => Err(HalError::UnknownChannel(channel)),
        }
    }
}

impl IoDriver for SimulationDriver {
    fn name(&self) -> &'static str {
        "simulation"
    }

    fn init(&mut self) -> Result<(), HalError> {
        self.integrate();
        for state in self.outputs.values_mut() {
            *state = false;
        }
        self.initialized = true;
        debug!(
            "Simulation driver initialized: {} DI, {} DO, travel={:?}",
            self.wiring.inputs().len(),
            self.outputs.len(),
            self.travel_time
        );
        Ok(())
    }

    fn read_input(&mut self, channel: u8) -> Result<bool, HalError> {
        self.integrate();
        let simulated = self.simulated_input(channel)?;
        Ok(self.forced_inputs.get(&channel).copied().unwrap_or(simulated))
    }

    fn write_output(&mut self, channel: u8, on: bool) -> Result<(), HalError> {
        // Settle motion under the previous command before switching.
        self.integrate();
        let Some(state) = self.outputs.get_mut(&channel) else {
            return Err(HalError::UnknownChannel(channel));
        };
        if *state != on {
            debug!("SIM DO[{}] {} -> {}", channel, on_off(*state), on_off(on));
            *state = on;
        }
        if let WiringConfig::TwoChannel {
            home_drive,
            extend_drive,
            ..
        } = self.wiring
        {
            if self.output(home_drive) && self.output(extend_drive) {
                warn!("SIM both drive outputs energized, carriage stalled");
            }
        }
        Ok(())
    }

    fn output_state(&mut self, channel: u8) -> Result<bool, HalError> {
        self.outputs
            .get(&channel)
            .copied()
            .ok_or(HalError::UnknownChannel(channel))
    }

    fn shutdown(&mut self) -> Result<(), HalError> {
        self.integrate();
        for state in self.outputs.values_mut() {
            *state = false;
        }
        if self.initialized {
            debug!("Simulation driver shut down at stroke {:.3}", self.position);
        }
        self.initialized = false;
        Ok(())
    }
}

fn on_off(state: bool) -> &'static str {
    if state { "ON" } else { "OFF" }
}

/// Factory registered as `"simulation"`.
pub fn create_driver(ctx: &DriverContext<'_>) -> Result<Box<dyn IoDriver>, HalError> {
    let travel = ctx.config.sim_travel_time;
    let travel = Duration::try_from_secs_f64(travel).map_err(|e| {
        HalError::ConfigError(format!(
            "sim_travel_time must be a non-negative number of seconds (got {travel}: {e})"
        ))
    })?;
    Ok(Box::new(SimulationDriver::new(
        ctx.wiring,
        travel,
        Arc::clone(&ctx.clock),
    )))
}
