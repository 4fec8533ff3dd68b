//! Configuration loading traits and types.
//!
//! The cycle tester reads a single TOML file at startup. Every section and
//! field has a default, so an empty file (or no file) yields the wiring of
//! the reference test rig.
//!
//! # TOML Example
//!
//! ```toml
//! [shared]
//! log_level = "debug"
//! service_name = "bench-rig-2"
//!
//! [wiring]
//! mode = "two_channel"
//! home_sense = 5
//! home_drive = 6
//! extend_sense = 13
//! extend_drive = 19
//!
//! [timing]
//! inter_cycle_wait = 2.0
//! fault_timeout = 30.0
//!
//! [event_log]
//! path = "actuator.log"
//!
//! [driver]
//! name = "cdev"
//! gpio_chip = "/dev/gpiochip0"
//! ```

use crate::consts::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub const fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Common fields shared by the workspace binaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Instance identifier, shown in startup logs.
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            service_name: default_service_name(),
        }
    }
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_service_name() -> String {
    DEFAULT_SERVICE_NAME.to_string()
}

/// How the actuator's sensors and drives are wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum WiringConfig {
    /// Independent sense and drive channels for each end position.
    TwoChannel {
        /// Home sense input.
        home_sense: u8,
        /// Drive-to-home output.
        home_drive: u8,
        /// Extend sense input.
        extend_sense: u8,
        /// Drive-to-extend output.
        extend_drive: u8,
    },
    /// One shared sense input and one drive output (on = extend).
    SingleChannel {
        /// Shared end-position sense input.
        sense: u8,
        /// Drive output.
        drive: u8,
    },
}

impl Default for WiringConfig {
    fn default() -> Self {
        WiringConfig::TwoChannel {
            home_sense: DEFAULT_HOME_SENSE,
            home_drive: DEFAULT_HOME_DRIVE,
            extend_sense: DEFAULT_EXTEND_SENSE,
            extend_drive: DEFAULT_EXTEND_DRIVE,
        }
    }
}

impl WiringConfig {
    /// Input channels in declaration order.
    pub fn inputs(&self) -> Vec<u8> {
        match *self {
            WiringConfig::TwoChannel {
                home_sense,
                extend_sense,
                ..
            } => vec![home_sense, extend_sense],
            WiringConfig::SingleChannel { sense, .. } => vec![sense],
        }
    }

    /// Output channels in declaration order.
    pub fn outputs(&self) -> Vec<u8> {
        match *self {
            WiringConfig::TwoChannel {
                home_drive,
                extend_drive,
                ..
            } => vec![home_drive, extend_drive],
            WiringConfig::SingleChannel { drive, .. } => vec![drive],
        }
    }

    /// True for the single shared-channel wiring.
    pub fn is_single_channel(&self) -> bool {
        matches!(self, WiringConfig::SingleChannel { .. })
    }

    /// Validate the wiring.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if any channel is used twice.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = Vec::new();
        for channel in self.inputs().into_iter().chain(self.outputs()) {
            if seen.contains(&channel) {
                return Err(ConfigError::ValidationError(format!(
                    "GPIO channel {channel} is assigned more than once"
                )));
            }
            seen.push(channel);
        }
        Ok(())
    }
}

/// Cycle timing, all values in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimingConfig {
    /// Pause between iterations.
    #[serde(default = "default_inter_cycle_wait")]
    pub inter_cycle_wait: f64,

    /// Pause after commanding HOME from an invalid reading.
    #[serde(default = "default_invalid_settle")]
    pub invalid_settle: f64,

    /// Pause after toggling the single drive output.
    #[serde(default = "default_toggle_settle")]
    pub toggle_settle: f64,

    /// Give up on a sensor wait after this long. Absent = wait forever.
    #[serde(default)]
    pub fault_timeout: Option<f64>,

    /// Sensor polling period inside waits.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            inter_cycle_wait: DEFAULT_INTER_CYCLE_WAIT_S,
            invalid_settle: DEFAULT_INVALID_SETTLE_S,
            toggle_settle: DEFAULT_TOGGLE_SETTLE_S,
            fault_timeout: None,
            poll_interval: DEFAULT_POLL_INTERVAL_S,
        }
    }
}

fn default_inter_cycle_wait() -> f64 {
    DEFAULT_INTER_CYCLE_WAIT_S
}

fn default_invalid_settle() -> f64 {
    DEFAULT_INVALID_SETTLE_S
}

fn default_toggle_settle() -> f64 {
    DEFAULT_TOGGLE_SETTLE_S
}

fn default_poll_interval() -> f64 {
    DEFAULT_POLL_INTERVAL_S
}

impl TimingConfig {
    /// Inter-cycle wait as a `Duration`.
    pub fn inter_cycle_wait(&self) -> Duration {
        saturating(self.inter_cycle_wait)
    }

    /// Invalid-position settle delay as a `Duration`.
    pub fn invalid_settle(&self) -> Duration {
        saturating(self.invalid_settle)
    }

    /// Single-channel toggle settle delay as a `Duration`.
    pub fn toggle_settle(&self) -> Duration {
        saturating(self.toggle_settle)
    }

    /// Fault timeout, if configured.
    pub fn fault_timeout(&self) -> Option<Duration> {
        self.fault_timeout.map(saturating)
    }

    /// Polling period as a `Duration`.
    pub fn poll_interval(&self) -> Duration {
        saturating(self.poll_interval)
    }

    /// Validate the timing values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if a delay is negative, not
    /// finite or too large for a `Duration`, or if `poll_interval` /
    /// `fault_timeout` are not positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("inter_cycle_wait", self.inter_cycle_wait),
            ("invalid_settle", self.invalid_settle),
            ("toggle_settle", self.toggle_settle),
        ] {
            seconds(&format!("timing.{name}"), value)?;
        }
        if seconds("timing.poll_interval", self.poll_interval)?.is_zero() {
            return Err(ConfigError::ValidationError(format!(
                "timing.poll_interval must be positive (got {})",
                self.poll_interval
            )));
        }
        if let Some(timeout) = self.fault_timeout {
            if seconds("timing.fault_timeout", timeout)?.is_zero() {
                return Err(ConfigError::ValidationError(format!(
                    "timing.fault_timeout must be positive (got {timeout})"
                )));
            }
        }
        Ok(())
    }
}

/// Convert a configured number of seconds, rejecting values `Duration`
/// cannot hold (negative, NaN, infinite, overflowing).
fn seconds(key: &str, value: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(value).map_err(|e| {
        ConfigError::ValidationError(format!(
            "{key} must be a non-negative number of seconds (got {value}: {e})"
        ))
    })
}

/// Accessor conversion for values that skipped `validate`.
fn saturating(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(if value > 0.0 {
        Duration::MAX
    } else {
        Duration::ZERO
    })
}

/// Event log sink and rotation policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventLogConfig {
    /// Log file path.
    #[serde(default = "default_event_log_path")]
    pub path: PathBuf,

    /// Rotate once the file reaches this many bytes.
    #[serde(default = "default_event_log_max_bytes")]
    pub max_bytes: u64,

    /// Rotated files to keep (`path.1` .. `path.N`).
    #[serde(default = "default_event_log_backups")]
    pub backup_count: u32,
}

impl Default for EventLogConfig {
    fn default() -> Self {
        Self {
            path: default_event_log_path(),
            max_bytes: DEFAULT_EVENT_LOG_MAX_BYTES,
            backup_count: DEFAULT_EVENT_LOG_BACKUPS,
        }
    }
}

fn default_event_log_path() -> PathBuf {
    PathBuf::from(DEFAULT_EVENT_LOG_PATH)
}

fn default_event_log_max_bytes() -> u64 {
    DEFAULT_EVENT_LOG_MAX_BYTES
}

fn default_event_log_backups() -> u32 {
    DEFAULT_EVENT_LOG_BACKUPS
}

impl EventLogConfig {
    /// Validate the sink settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` for an empty path or a zero
    /// rotation size.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.path.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "event_log.path cannot be empty".to_string(),
            ));
        }
        if self.max_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "event_log.max_bytes must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// GPIO backend selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DriverConfig {
    /// Registered driver name (`cdev` or `simulation`).
    #[serde(default = "default_driver_name")]
    pub name: String,

    /// Inputs read low when active (pull-up switches).
    #[serde(default = "default_active_low")]
    pub active_low_inputs: bool,

    /// GPIO character device; wiring channels are line offsets on it.
    #[serde(default = "default_gpio_chip")]
    pub gpio_chip: PathBuf,

    /// End-to-end travel time of the simulated actuator, seconds.
    #[serde(default = "default_sim_travel_time")]
    pub sim_travel_time: f64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            name: default_driver_name(),
            active_low_inputs: default_active_low(),
            gpio_chip: default_gpio_chip(),
            sim_travel_time: DEFAULT_SIM_TRAVEL_TIME_S,
        }
    }
}

fn default_driver_name() -> String {
    "cdev".to_string()
}

fn default_active_low() -> bool {
    true
}

fn default_gpio_chip() -> PathBuf {
    PathBuf::from(DEFAULT_GPIO_CHIP)
}

fn default_sim_travel_time() -> f64 {
    DEFAULT_SIM_TRAVEL_TIME_S
}

/// Complete configuration of the cycle tester.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActuatorConfig {
    /// Shared service settings.
    #[serde(default)]
    pub shared: SharedConfig,

    /// Sensor and drive wiring.
    #[serde(default)]
    pub wiring: WiringConfig,

    /// Cycle timing.
    #[serde(default)]
    pub timing: TimingConfig,

    /// Event log sink.
    #[serde(default)]
    pub event_log: EventLogConfig,

    /// GPIO backend.
    #[serde(default)]
    pub driver: DriverConfig,
}

impl ActuatorConfig {
    /// Parse from TOML text and validate.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file and validate.
    pub fn load_validated(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.wiring.validate()?;
        self.timing.validate()?;
        self.event_log.validate()?;
        seconds("driver.sim_travel_time", self.driver.sim_travel_time)?;
        Ok(())
    }
}

/// Trait for loading configuration from TOML files.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_log_level_default() {
        assert_eq!(LogLevel::default(), LogLevel::Info);
        assert_eq!(LogLevel::Warn.as_directive(), "warn");
    }

    #[test]
    fn test_log_level_deserialization() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct TestWrapper {
            level: LogLevel,
        }

        assert_eq!(
            toml::from_str::<TestWrapper>("level = \"trace\"")
                .unwrap()
                .level,
            LogLevel::Trace
        );
        assert_eq!(
            toml::from_str::<TestWrapper>("level = \"error\"")
                .unwrap()
                .level,
            LogLevel::Error
        );
    }

    #[test]
    fn test_empty_config_uses_rig_defaults() {
        let config = ActuatorConfig::from_toml("").unwrap();
        assert_eq!(
            config.wiring,
            WiringConfig::TwoChannel {
                home_sense: 5,
                home_drive: 6,
                extend_sense: 13,
                extend_drive: 19,
            }
        );
        assert_eq!(config.timing.inter_cycle_wait(), Duration::from_secs(2));
        assert_eq!(config.timing.invalid_settle(), Duration::from_secs(5));
        assert_eq!(config.timing.toggle_settle(), Duration::from_millis(500));
        assert!(config.timing.fault_timeout().is_none());
        assert_eq!(config.event_log.max_bytes, 20_000_000);
        assert_eq!(config.event_log.backup_count, 10);
        assert_eq!(config.driver.name, "cdev");
        assert_eq!(config.driver.gpio_chip, PathBuf::from("/dev/gpiochip0"));
        assert!(config.driver.active_low_inputs);
    }

    #[test]
    fn test_single_channel_wiring() {
        let config = ActuatorConfig::from_toml(
            r#"
[wiring]
mode = "single_channel"
sense = 17
drive = 27
"#,
        )
        .unwrap();
        assert!(config.wiring.is_single_channel());
        assert_eq!(config.wiring.inputs(), vec![17]);
        assert_eq!(config.wiring.outputs(), vec![27]);
    }

    #[test]
    fn test_duplicate_channel_rejected() {
        let result = ActuatorConfig::from_toml(
            r#"
[wiring]
mode = "two_channel"
home_sense = 5
home_drive = 5
extend_sense = 13
extend_drive = 19
"#,
        );
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_negative_delay_rejected() {
        let result = ActuatorConfig::from_toml("[timing]\ninvalid_settle = -1.0\n");
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_zero_fault_timeout_rejected() {
        let result = ActuatorConfig::from_toml("[timing]\nfault_timeout = 0.0\n");
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));

        let config = ActuatorConfig::from_toml("[timing]\nfault_timeout = 12.5\n").unwrap();
        assert_eq!(
            config.timing.fault_timeout(),
            Some(Duration::from_millis(12_500))
        );
    }

    #[test]
    fn test_oversized_delays_rejected() {
        for toml in [
            "[timing]\ninter_cycle_wait = 1e20\n",
            "[timing]\nfault_timeout = 1e20\n",
            "[timing]\npoll_interval = 1e20\n",
            "[timing]\ntoggle_settle = nan\n",
            "[driver]\nsim_travel_time = 1e20\n",
        ] {
            let result = ActuatorConfig::from_toml(toml);
            assert!(
                matches!(result, Err(ConfigError::ValidationError(_))),
                "{toml:?} -> {result:?}"
            );
        }

        // Accessors never panic, even on values that skipped validation.
        let timing = TimingConfig {
            inter_cycle_wait: 1e20,
            invalid_settle: -1.0,
            ..TimingConfig::default()
        };
        assert_eq!(timing.inter_cycle_wait(), Duration::MAX);
        assert_eq!(timing.invalid_settle(), Duration::ZERO);

        // Large but representable values still load and convert.
        let config = ActuatorConfig::from_toml("[timing]\nfault_timeout = 1e9\n").unwrap();
        assert_eq!(
            config.timing.fault_timeout(),
            Some(Duration::from_secs(1_000_000_000))
        );
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = ActuatorConfig::from_toml("[timing]\nwait_time = 3\n");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_empty_service_name_rejected() {
        let result = ActuatorConfig::from_toml("[shared]\nservice_name = \"\"\n");
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_config_loader_file_not_found() {
        let result = ActuatorConfig::load(Path::new("/nonexistent/path/actuator.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound)));
    }

    #[test]
    fn test_config_loader_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "invalid toml {{{{").unwrap();

        let result = ActuatorConfig::load(file.path());
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_config_loader_success() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[shared]
log_level = "debug"
service_name = "bench-rig"

[timing]
inter_cycle_wait = 0.25

[event_log]
path = "/tmp/rig.log"
backup_count = 3

[driver]
name = "simulation"
sim_travel_time = 0.1
"#
        )
        .unwrap();
        file.flush().unwrap();

        let config = ActuatorConfig::load_validated(file.path()).unwrap();
        assert_eq!(config.shared.log_level, LogLevel::Debug);
        assert_eq!(config.shared.service_name, "bench-rig");
        assert_eq!(config.timing.inter_cycle_wait(), Duration::from_millis(250));
        assert_eq!(config.event_log.path, PathBuf::from("/tmp/rig.log"));
        assert_eq!(config.event_log.backup_count, 3);
        assert_eq!(config.driver.name, "simulation");
    }
}
