//! # Actuator HAL Library
//!
//! Hardware abstraction for the actuator cycle tester: digital I/O drivers,
//! the clock used for every suspension point, and the position sensor
//! interface the cycle controller talks to.
//!
//! # Module Structure
//!
//! - [`driver`] - `IoDriver` trait and `HalError`
//! - [`clock`] - Monotonic + wall clock abstraction (system and manual)
//! - [`sensor`] - Position sensor interface (`PositionSensors`)
//! - [`driver_registry`] - Driver factory registration
//! - [`drivers`] - Driver implementations (`simulation`, `cdev`)
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │                    actuator_hal                       │
//! │  ┌───────────────┐    ┌──────────────────────────┐    │
//! │  │ PositionSensors│──►│ IoDriver (trait object)  │    │
//! │  │  read / wait   │    │  cdev | simulation      │    │
//! │  └──────┬────────┘    └──────────────────────────┘    │
//! │         │                         ▲                   │
//! │         ▼                         │                   │
//! │     ┌────────┐           ┌────────────────┐           │
//! │     │ Clock  │           │ DriverRegistry │           │
//! │     └────────┘           └────────────────┘           │
//! └───────────────────────────────────────────────────────┘
//! ```

#![deny(missing_docs)]

pub mod clock;
pub mod driver;
pub mod driver_registry;
pub mod drivers;
pub mod sensor;

pub use crate::clock::{Clock, ManualClock, SystemClock};
pub use crate::driver::{DriverContext, HalError, IoDriver};
pub use crate::driver_registry::DriverRegistry;
pub use crate::sensor::{
    OutputState, PositionSensors, SenseChannel, SensorReading, WaitError, WaitLimit,
    infer_position,
};
