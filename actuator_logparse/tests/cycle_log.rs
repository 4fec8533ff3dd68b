//! Parse logs produced by the cycle controller itself.

use actuator_common::config::{TimingConfig, WiringConfig};
use actuator_common::types::CycleEvent;
use actuator_cycle::{CycleController, EventLog, EventSink, RotatingFileWriter, StepOutcome};
use actuator_hal::drivers::simulation::SimulationDriver;
use actuator_hal::{IoDriver, ManualClock, PositionSensors};
use actuator_logparse::{Pairing, TrendSummary, filter_direction, parse_file};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn step<D: IoDriver, L: EventSink>(ctl: &mut CycleController<D, L>) -> CycleEvent {
    match ctl.step().unwrap() {
        StepOutcome::Completed(event) => event,
        StepOutcome::Interrupted => panic!("interrupted"),
    }
}

#[test]
fn test_parses_controller_output_with_fault_recovery() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("actuator.log");

    let clock = Arc::new(ManualClock::new());
    let wiring = WiringConfig::default();
    let timing = TimingConfig::default();
    let driver = SimulationDriver::new(wiring, Duration::from_millis(500), clock.clone());
    let sensors = PositionSensors::new(driver, wiring, clock.clone(), timing.poll_interval());
    let writer = RotatingFileWriter::open(&path, 1_000_000, 1).unwrap();
    let mut ctl = CycleController::new(sensors, EventLog::new(writer), timing);

    let mut events = vec![step(&mut ctl)];
    ctl.sensors_mut().driver_mut().force_input(5, Some(true));
    ctl.sensors_mut().driver_mut().force_input(13, Some(true));
    events.push(step(&mut ctl));
    ctl.sensors_mut().driver_mut().force_input(5, None);
    ctl.sensors_mut().driver_mut().force_input(13, None);
    events.push(step(&mut ctl));
    events.push(step(&mut ctl));
    drop(ctl);

    let rows = parse_file(&path, Pairing::Positional).unwrap();
    assert_eq!(rows.len(), events.len());
    for (row, event) in rows.iter().zip(&events) {
        assert_eq!(row.iteration, event.iteration());
        assert_eq!(row.direction, event.direction().label());
        assert!((row.elapsed - event.elapsed().as_secs_f64()).abs() < 1e-6);
        assert_eq!(
            row.start.format("%H:%M:%S%.3f").to_string(),
            event.start().format("%H:%M:%S%.3f").to_string()
        );
    }
    assert_eq!(rows[1].direction, "RecoverHome");

    // Both pairings agree on a log with no interrupted iterations.
    assert_eq!(parse_file(&path, Pairing::Sequential).unwrap(), rows);

    // Recovery counts towards the HOME series.
    let home = filter_direction(&rows, "Home");
    assert_eq!(home.len(), 2);
    let summary = TrendSummary::from_rows(&home).unwrap();
    assert!(summary.max >= 5.0);
}
