//! Driver registry for I/O drivers.
//!
//! Provides a `DriverRegistry` struct for registering and instantiating
//! driver factories by name. Constructed at startup and passed by value; no
//! global state.

use crate::driver::{DriverContext, DriverFactory, HalError, IoDriver};
use crate::drivers::{cdev, simulation};
use std::collections::HashMap;
use tracing::info;

/// Registry of available I/O drivers.
pub struct DriverRegistry {
    factories: HashMap<&'static str, DriverFactory>,
}

impl DriverRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry pre-populated with `cdev` and `simulation`.
    ///
    /// `sysfs` stays registered as an alias for `cdev` so existing
    /// configuration files keep selecting the hardware backend.
    pub fn with_builtin_drivers() -> Self {
        let mut registry = Self::new();
        registry.factories.insert("cdev", cdev::create_driver);
        registry.factories.insert("simulation", simulation::create_driver);
        registry.factories.insert("sysfs", cdev::create_driver);
        registry
    }

    /// Register a driver factory.
    ///
    /// # Errors
    /// Returns `HalError::DuplicateDriver` if the name is already taken.
    pub fn register(&mut self, name: &'static str, factory: DriverFactory) -> Result<(), HalError> {
        if self.factories.contains_key(name) {
            return Err(HalError::DuplicateDriver(name));
        }
        self.factories.insert(name, factory);
        Ok(())
    }

    /// Get a driver factory by name.
    pub fn get_factory(&self, name: &str) -> Option<DriverFactory> {
        self.factories.get(name).copied()
    }

    /// Create and initialize a driver instance by name.
    ///
    /// # Errors
    /// Returns `HalError::DriverNotFound` if no driver with the given name is
    /// registered, or the driver's own error if `init()` fails.
    pub fn create_driver(
        &self,
        name: &str,
        ctx: &DriverContext<'_>,
    ) -> Result<Box<dyn IoDriver>, HalError> {
        let factory = self
            .get_factory(name)
            .ok_or_else(|| HalError::DriverNotFound(name.to_string()))?;
        let mut driver = factory(ctx)?;
        driver.init()?;
        info!("Created driver: {}", driver.name());
        Ok(driver)
    }

    /// List all registered driver names, sorted.
    pub fn list_drivers(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::with_builtin_drivers()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use actuator_common::config::{DriverConfig, WiringConfig};
    use std::sync::Arc;

    fn ctx(config: &DriverConfig) -> DriverContext<'_> {
        DriverContext {
            config,
            wiring: WiringConfig::default(),
            clock: Arc::new(ManualClock::new()),
        }
    }

    #[test]
    fn test_builtin_drivers_listed() {
        let registry = DriverRegistry::default();
        assert_eq!(registry.list_drivers(), vec!["cdev", "simulation", "sysfs"]);
    }

    #[test]
    fn test_create_simulation_driver() {
        let registry = DriverRegistry::with_builtin_drivers();
        let config = DriverConfig::default();
        let mut driver = registry.create_driver("simulation", &ctx(&config)).unwrap();
        assert_eq!(driver.name(), "simulation");
        assert!(driver.read_input(5).unwrap());
    }

    #[test]
    fn test_unknown_driver() {
        let registry = DriverRegistry::with_builtin_drivers();
        let config = DriverConfig::default();
        let result = registry.create_driver("ethercat", &ctx(&config));
        assert!(matches!(result, Err(HalError::DriverNotFound(name)) if name == "ethercat"));
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = DriverRegistry::with_builtin_drivers();
        let result = registry.register("simulation", simulation::create_driver);
        assert_eq!(result, Err(HalError::DuplicateDriver("simulation")));
    }

    #[test]
    fn test_cdev_driver_init_failure_propagates() {
        let registry = DriverRegistry::with_builtin_drivers();
        let config = DriverConfig {
            gpio_chip: "/nonexistent/gpiochip0".into(),
            ..DriverConfig::default()
        };
        for name in ["cdev", "sysfs"] {
            let result = registry.create_driver(name, &ctx(&config));
            assert!(matches!(result, Err(HalError::InitFailed(_))), "{name}");
        }
    }

    #[test]
    fn test_legacy_name_selects_cdev_backend() {
        let registry = DriverRegistry::with_builtin_drivers();
        let config = DriverConfig::default();
        let driver = registry.get_factory("sysfs").unwrap()(&ctx(&config)).unwrap();
        assert_eq!(driver.name(), "cdev");
    }
}
