//! I/O driver implementations.
//!
//! - [`simulation`] - Virtual actuator for development and testing
//! - [`cdev`] - Linux GPIO character device (`/dev/gpiochipN`) backend
//!
//! # Adding New Drivers
//!
//! 1. Create a new submodule under `drivers/`
//! 2. Implement the `IoDriver` trait from `crate::driver`
//! 3. Add its factory to `DriverRegistry::with_builtin_drivers()`

pub mod cdev;
pub mod simulation;
