//! Position sensor integration tests.
//!
//! Drives the sensor interface through a registry-created (boxed) driver
//! the same way the cycle binary does, in virtual time.

use actuator_common::config::{DriverConfig, WiringConfig};
use actuator_common::types::{DriveCommand, Position};
use actuator_hal::{
    Clock, DriverContext, DriverRegistry, ManualClock, PositionSensors, SenseChannel, WaitLimit,
};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

fn boxed_sensors(
    wiring: WiringConfig,
    travel_s: f64,
) -> (PositionSensors<Box<dyn actuator_hal::IoDriver>>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    let config = DriverConfig {
        name: "simulation".to_string(),
        sim_travel_time: travel_s,
        ..DriverConfig::default()
    };
    let ctx = DriverContext {
        config: &config,
        wiring,
        clock: clock.clone(),
    };
    let driver = DriverRegistry::with_builtin_drivers()
        .create_driver(&config.name, &ctx)
        .expect("create simulation driver");
    let sensors = PositionSensors::new(driver, wiring, clock.clone(), Duration::from_millis(5));
    (sensors, clock)
}

#[test]
fn test_full_stroke_round_trip() {
    let (mut sensors, clock) = boxed_sensors(WiringConfig::default(), 0.8);
    let shutdown = AtomicBool::new(false);

    assert_eq!(sensors.position().unwrap(), Position::Home);

    sensors.apply(DriveCommand::DriveExtend).unwrap();
    let out = sensors
        .wait_for_active(SenseChannel::Extend, WaitLimit::Indefinite, &shutdown)
        .unwrap();
    assert_eq!(sensors.position().unwrap(), Position::Extend);

    sensors.apply(DriveCommand::DriveHome).unwrap();
    let back = sensors
        .wait_for_active(SenseChannel::Home, WaitLimit::Indefinite, &shutdown)
        .unwrap();
    assert_eq!(sensors.position().unwrap(), Position::Home);

    let stroke = Duration::from_millis(800);
    for leg in [out, back] {
        assert!(leg >= stroke, "{leg:?}");
        assert!(leg < stroke + Duration::from_millis(10), "{leg:?}");
    }
    assert_eq!(clock.elapsed(), out + back);
}

#[test]
fn test_mid_stroke_reads_transitioning() {
    let (mut sensors, clock) = boxed_sensors(WiringConfig::default(), 1.0);
    sensors.apply(DriveCommand::DriveExtend).unwrap();
    clock.sleep(Duration::from_millis(400));
    assert_eq!(sensors.position().unwrap(), Position::Transitioning);

    sensors.apply(DriveCommand::Stop).unwrap();
    clock.sleep(Duration::from_secs(5));
    assert_eq!(sensors.position().unwrap(), Position::Transitioning);
    assert!(!sensors.outputs().unwrap().any_energized());
}

#[test]
fn test_single_channel_wait_on_shared_sensor() {
    let wiring = WiringConfig::SingleChannel { sense: 17, drive: 27 };
    let (mut sensors, clock) = boxed_sensors(wiring, 0.3);
    let shutdown = AtomicBool::new(false);

    assert!(sensors.read_single().unwrap());
    sensors.apply(DriveCommand::DriveExtend).unwrap();
    clock.sleep(Duration::from_millis(100));
    assert!(!sensors.read_single().unwrap());

    sensors
        .wait_for_active(SenseChannel::Shared, WaitLimit::Indefinite, &shutdown)
        .unwrap();
    assert!(sensors.read_single().unwrap());
}
