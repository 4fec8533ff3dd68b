//! Actuator Common Library
//!
//! Shared data model and configuration loading for the actuator cycle
//! tester workspace.
//!
//! # Module Structure
//!
//! - [`types`] - Position, drive commands, outcome labels and cycle events
//! - [`config`] - Configuration types and TOML loading
//! - [`consts`] - Default values shared by config and binaries
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use actuator_common::prelude::*;
//!
//! assert_eq!(Position::default(), Position::Unknown);
//! ```

pub mod config;
pub mod consts;
pub mod prelude;
pub mod types;
