//! Clock abstraction for every suspension point of the cycle.
//!
//! Elapsed time is measured on the monotonic clock (`Instant`); logged
//! timestamps come from the wall clock. Sleeps go through the same trait so
//! tests can run the cycle in virtual time with [`ManualClock`].

use chrono::{DateTime, Local};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Source of time and sleeps.
pub trait Clock: Send + Sync {
    /// Monotonic now.
    fn now(&self) -> Instant;

    /// Wall-clock now.
    fn wall(&self) -> DateTime<Local>;

    /// Suspend the calling thread.
    fn sleep(&self, duration: Duration);
}

/// Operating-system clocks and `std::thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall(&self) -> DateTime<Local> {
        Local::now()
    }

    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

/// Virtual clock: `sleep` advances time instantly and is recorded.
///
/// Monotonic and wall time advance together, so an elapsed duration always
/// equals the difference of the wall timestamps taken at the same points.
#[derive(Debug)]
pub struct ManualClock {
    base_instant: Instant,
    base_wall: DateTime<Local>,
    offset_nanos: AtomicU64,
    sleeps: Mutex<Vec<Duration>>,
}

impl ManualClock {
    /// Clock starting at the current wall time.
    pub fn new() -> Self {
        Self::starting_at(Local::now())
    }

    /// Clock starting at the given wall time.
    pub fn starting_at(wall: DateTime<Local>) -> Self {
        Self {
            base_instant: Instant::now(),
            base_wall: wall,
            offset_nanos: AtomicU64::new(0),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    /// Move time forward without recording a sleep.
    pub fn advance(&self, duration: Duration) {
        let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        self.offset_nanos.fetch_add(nanos, Ordering::SeqCst);
    }

    /// Virtual time elapsed since construction.
    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.offset_nanos.load(Ordering::SeqCst))
    }

    /// Every sleep requested so far, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base_instant + self.elapsed()
    }

    fn wall(&self) -> DateTime<Local> {
        // Nanosecond offsets always fit in chrono's range for test runs.
        self.base_wall
            + chrono::Duration::from_std(self.elapsed()).unwrap_or(chrono::Duration::zero())
    }

    fn sleep(&self, duration: Duration) {
        if let Ok(mut sleeps) = self.sleeps.lock() {
            sleeps.push(duration);
        }
        self.advance(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_manual_clock_sleep_advances_both_clocks() {
        let start_wall = Local.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let clock = ManualClock::starting_at(start_wall);
        let t0 = clock.now();

        clock.sleep(Duration::from_millis(2500));

        assert_eq!(clock.now() - t0, Duration::from_millis(2500));
        assert_eq!(
            clock.wall() - start_wall,
            chrono::Duration::milliseconds(2500)
        );
        assert_eq!(clock.sleeps(), vec![Duration::from_millis(2500)]);
    }

    #[test]
    fn test_manual_clock_advance_is_not_a_sleep() {
        let clock = ManualClock::new();
        clock.advance(Duration::from_secs(1));
        assert_eq!(clock.elapsed(), Duration::from_secs(1));
        assert!(clock.sleeps().is_empty());
    }

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock;
        let a = clock.now();
        clock.sleep(Duration::from_millis(1));
        assert!(clock.now() >= a);
    }
}
