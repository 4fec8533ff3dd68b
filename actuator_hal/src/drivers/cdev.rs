//! Linux GPIO character-device driver.
//!
//! Requests each wired channel as a line offset on one gpiochip
//! (`/dev/gpiochipN`). Channel numbers are chip offsets, which on a
//! Raspberry Pi header chip equal the BCM numbers regardless of the
//! kernel's global GPIO base. Inputs are requested with `ACTIVE_LOW` when
//! the switches pull up, so the kernel reports logical activity directly.
//! Outputs are requested low so they come up de-energized. Lines are
//! released when the handles are dropped.

use crate::driver::{DriverContext, HalError, IoDriver};
use actuator_common::config::WiringConfig;
use gpio_cdev::{Chip, LineHandle, LineRequestFlags};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Consumer label shown by `gpioinfo` for claimed lines.
const CONSUMER: &str = "actuator-cycle";

/// Flags used to request a sense input.
pub fn input_flags(active_low: bool) -> LineRequestFlags {
    if active_low {
        LineRequestFlags::INPUT | LineRequestFlags::ACTIVE_LOW
    } else {
        LineRequestFlags::INPUT
    }
}

struct OutputLine {
    handle: LineHandle,
    on: bool,
}

/// Character-device GPIO driver implementing the `IoDriver` trait.
pub struct CdevGpioDriver {
    chip_path: PathBuf,
    wiring: WiringConfig,
    active_low_inputs: bool,
    inputs: HashMap<u8, LineHandle>,
    outputs: HashMap<u8, OutputLine>,
}

impl CdevGpioDriver {
    /// Create a driver for the chip at `chip_path` (e.g. `/dev/gpiochip0`).
    pub fn new(chip_path: impl Into<PathBuf>, wiring: WiringConfig, active_low_inputs: bool) -> Self {
        Self {
            chip_path: chip_path.into(),
            wiring,
            active_low_inputs,
            inputs: HashMap::new(),
            outputs: HashMap::new(),
        }
    }

    /// Whether `init` has claimed the lines.
    pub fn is_claimed(&self) -> bool {
        !self.inputs.is_empty() || !self.outputs.is_empty()
    }

    fn check_channel(&self, channel: u8, output: bool) -> Result<(), HalError> {
        let known = if output {
            self.wiring.outputs()
        } else {
            self.wiring.inputs()
        };
        if known.contains(&channel) {
            Ok(())
        } else {
            Err(HalError::UnknownChannel(channel))
        }
    }

    fn request(
        &self,
        chip: &mut Chip,
        channel: u8,
        flags: LineRequestFlags,
    ) -> Result<LineHandle, HalError> {
        let line = chip
            .get_line(u32::from(channel))
            .map_err(|e| comm_error(channel, e))?;
        line.request(flags, 0, CONSUMER)
            .map_err(|e| comm_error(channel, e))
    }
}

impl IoDriver for CdevGpioDriver {
    fn name(&self) -> &'static str {
        "cdev"
    }

    fn init(&mut self) -> Result<(), HalError> {
        let mut chip = Chip::new(&self.chip_path).map_err(|e| {
            HalError::InitFailed(format!("{}: {}", self.chip_path.display(), e))
        })?;
        debug!(
            "Opened {} ({}, {} lines)",
            self.chip_path.display(),
            chip.label(),
            chip.num_lines()
        );

        let flags = input_flags(self.active_low_inputs);
        let mut inputs = HashMap::new();
        for channel in self.wiring.inputs() {
            inputs.insert(channel, self.request(&mut chip, channel, flags.clone())?);
        }
        let mut outputs = HashMap::new();
        for channel in self.wiring.outputs() {
            let handle = self.request(&mut chip, channel, LineRequestFlags::OUTPUT)?;
            outputs.insert(channel, OutputLine { handle, on: false });
        }
        self.inputs = inputs;
        self.outputs = outputs;

        info!(
            "GPIO lines claimed on {}: inputs={:?} outputs={:?} active_low_inputs={}",
            self.chip_path.display(),
            self.wiring.inputs(),
            self.wiring.outputs(),
            self.active_low_inputs
        );
        Ok(())
    }

    fn read_input(&mut self, channel: u8) -> Result<bool, HalError> {
        self.check_channel(channel, false)?;
        let handle = self.inputs.get(&channel).ok_or_else(|| not_claimed(channel))?;
        let value = handle.get_value().map_err(|e| comm_error(channel, e))?;
        Ok(value != 0)
    }

    fn write_output(&mut self, channel: u8, on: bool) -> Result<(), HalError> {
        self.check_channel(channel, true)?;
        let line = self
            .outputs
            .get_mut(&channel)
            .ok_or_else(|| not_claimed(channel))?;
        line.handle
            .set_value(u8::from(on))
            .map_err(|e| comm_error(channel, e))?;
        line.on = on;
        Ok(())
    }

    fn output_state(&mut self, channel: u8) -> Result<bool, HalError> {
        self.check_channel(channel, true)?;
        self.outputs
            .get(&channel)
            .map(|line| line.on)
            .ok_or_else(|| not_claimed(channel))
    }

    fn shutdown(&mut self) -> Result<(), HalError> {
        let mut result = Ok(());
        for (channel, line) in self.outputs.iter_mut() {
            if let Err(e) = line.handle.set_value(0) {
                warn!("Failed to release output {}: {}", channel, e);
                result = Err(comm_error(*channel, e));
            } else {
                line.on = false;
            }
        }
        self.outputs.clear();
        self.inputs.clear();
        result
    }
}

fn comm_error(channel: u8, e: gpio_cdev::Error) -> HalError {
    HalError::CommunicationError {
        channel,
        reason: e.to_string(),
    }
}

fn not_claimed(channel: u8) -> HalError {
    HalError::CommunicationError {
        channel,
        reason: "line not requested (driver not initialized)".to_string(),
    }
}

/// Factory registered as `"cdev"`.
pub fn create_driver(ctx: &DriverContext<'_>) -> Result<Box<dyn IoDriver>, HalError> {
    Ok(Box::new(CdevGpioDriver::new(
        ctx.config.gpio_chip.clone(),
        ctx.wiring,
        ctx.config.active_low_inputs,
    )))
}
