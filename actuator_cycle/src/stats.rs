//! Running latency statistics.

use actuator_common::types::{CycleEvent, Direction};
use std::fmt;
use std::time::Duration;

/// Min / max / mean of transition latency for one direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LatencyStats {
    /// Samples recorded.
    pub count: u64,
    /// Shortest transition.
    pub min: Duration,
    /// Longest transition.
    pub max: Duration,
    /// Sum of all transitions.
    pub total: Duration,
}

impl LatencyStats {
    /// Add one sample.
    pub fn record(&mut self, elapsed: Duration) {
        if self.count == 0 || elapsed < self.min {
            self.min = elapsed;
        }
        if elapsed > self.max {
            self.max = elapsed;
        }
        self.total += elapsed;
        self.count += 1;
    }

    /// Mean latency, zero when empty.
    pub fn mean(&self) -> Duration {
        if self.count == 0 {
            return Duration::ZERO;
        }
        let nanos = self.total.as_nanos() / u128::from(self.count);
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }
}

impl fmt::Display for LatencyStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "n={} min={:.3}s mean={:.3}s max={:.3}s",
            self.count,
            self.min.as_secs_f64(),
            self.mean().as_secs_f64(),
            self.max.as_secs_f64()
        )
    }
}

/// Statistics over every recorded iteration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleStats {
    /// Iterations recorded.
    pub iterations: u64,
    /// Iterations carrying a fault tag.
    pub faults: u64,
    /// Successful moves to HOME.
    pub home: LatencyStats,
    /// Successful moves to EXTEND.
    pub extend: LatencyStats,
    /// Re-homing after an anomalous reading.
    pub recover: LatencyStats,
}

impl CycleStats {
    /// Fold one event into the statistics.
    pub fn record(&mut self, event: &CycleEvent) {
        self.iterations += 1;
        if event.is_fault() {
            self.faults += 1;
        }
        let bucket = match event.direction() {
            Direction::Home => &mut self.home,
            Direction::Extend => &mut self.extend,
            Direction::RecoverHome => &mut self.recover,
        };
        bucket.record(event.elapsed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actuator_common::types::{FaultTag, Position};
    use chrono::Local;

    fn event(direction: Direction, millis: u64, fault: Option<FaultTag>) -> CycleEvent {
        let now = Local::now();
        CycleEvent::new(
            0,
            now,
            now,
            Duration::from_millis(millis),
            Position::Home,
            direction,
            fault,
        )
    }

    #[test]
    fn test_latency_stats() {
        let mut stats = LatencyStats::default();
        assert_eq!(stats.mean(), Duration::ZERO);
        for ms in [300, 100, 200] {
            stats.record(Duration::from_millis(ms));
        }
        assert_eq!(stats.count, 3);
        assert_eq!(stats.min, Duration::from_millis(100));
        assert_eq!(stats.max, Duration::from_millis(300));
        assert_eq!(stats.mean(), Duration::from_millis(200));
    }

    #[test]
    fn test_mean_past_u32_sample_count() {
        let count = u64::from(u32::MAX) + 10;
        let stats = LatencyStats {
            count,
            min: Duration::from_millis(2),
            max: Duration::from_millis(2),
            total: Duration::from_millis(count * 2),
        };
        assert_eq!(stats.mean(), Duration::from_millis(2));
    }

    #[test]
    fn test_cycle_stats_buckets_by_direction() {
        let mut stats = CycleStats::default();
        stats.record(&event(Direction::Extend, 1500, None));
        stats.record(&event(Direction::Home, 1400, None));
        stats.record(&event(Direction::Extend, 1600, None));
        stats.record(&event(Direction::RecoverHome, 6000, Some(FaultTag::InvalidPosition)));

        assert_eq!(stats.iterations, 4);
        assert_eq!(stats.faults, 1);
        assert_eq!(stats.extend.count, 2);
        assert_eq!(stats.extend.mean(), Duration::from_millis(1550));
        assert_eq!(stats.home.count, 1);
        assert_eq!(stats.recover.max, Duration::from_secs(6));
    }
}
