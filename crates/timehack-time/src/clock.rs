//! Local time bases
//!
//! A time base pairs the two local clocks ClockSync needs: a monotonic
//! counter for measuring elapsed time and the host wall clock used as the
//! degraded fallback.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

use timehack_core::{MonotonicMs, UtcInstant};

/// Source of local time readings
pub trait TimeBase: Send + Sync {
    /// Monotonic milliseconds since this base was created
    /// INVARIANT: never decreases between calls
    fn monotonic(&self) -> MonotonicMs;

    /// Host wall clock (may jump when the host adjusts it)
    fn wall_clock(&self) -> UtcInstant;
}

/// Time base backed by the OS clocks
pub struct SystemTimeBase {
    /// Reference for the monotonic reading
    reference: Instant,
}

impl SystemTimeBase {
    pub fn new() -> Self {
        SystemTimeBase {
            reference: Instant::now(),
        }
    }
}

impl Default for SystemTimeBase {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeBase for SystemTimeBase {
    fn monotonic(&self) -> MonotonicMs {
        MonotonicMs::from_duration(self.reference.elapsed())
    }

    fn wall_clock(&self) -> UtcInstant {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(since) => UtcInstant::from_millis(since.as_millis() as i64),
            Err(before) => UtcInstant::from_millis(-(before.duration().as_millis() as i64)),
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct ManualReadings {
    monotonic: MonotonicMs,
    /// Fractional so sub-millisecond advances accumulate
    wall_ms: f64,
}

/// Hand-driven time base for tests and simulation
///
/// Both clocks stand still until advanced. `advance` moves them together;
/// the split variants model a host wall clock that drifts or jumps relative
/// to the monotonic counter.
pub struct ManualTimeBase {
    readings: Mutex<ManualReadings>,
}

impl ManualTimeBase {
    /// Start with the monotonic counter at zero and the wall clock at `wall`
    pub fn new(wall: UtcInstant) -> Self {
        ManualTimeBase {
            readings: Mutex::new(ManualReadings {
                monotonic: MonotonicMs::ZERO,
                wall_ms: wall.as_millis() as f64,
            }),
        }
    }

    /// Advance both clocks by the same amount
    pub fn advance(&self, dt: Duration) {
        let mut r = self.readings.lock();
        r.monotonic = r.monotonic + dt;
        r.wall_ms += dt.as_secs_f64() * 1000.0;
    }

    /// Advance only the monotonic counter
    pub fn advance_monotonic(&self, dt: Duration) {
        let mut r = self.readings.lock();
        r.monotonic = r.monotonic + dt;
    }

    /// Step the wall clock without touching the monotonic counter
    pub fn step_wall(&self, millis: i64) {
        let mut r = self.readings.lock();
        r.wall_ms += millis as f64;
    }

    /// Set the wall clock to an absolute value
    pub fn set_wall(&self, wall: UtcInstant) {
        self.readings.lock().wall_ms = wall.as_millis() as f64;
    }
}

impl TimeBase for ManualTimeBase {
    fn monotonic(&self) -> MonotonicMs {
        self.readings.lock().monotonic
    }

    fn wall_clock(&self) -> UtcInstant {
        UtcInstant::from_millis(self.readings.lock().wall_ms.floor() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_monotonic_advances() {
        let base = SystemTimeBase::new();

        let t1 = base.monotonic();
        std::thread::sleep(Duration::from_millis(10));
        let t2 = base.monotonic();

        assert!(t2 > t1);
        assert!(t2.elapsed_since(t1) >= 9.0);
    }

    #[test]
    fn test_system_wall_clock_is_recent() {
        // 2020-01-01T00:00:00Z
        let floor = UtcInstant::from_secs(1_577_836_800);
        assert!(SystemTimeBase::new().wall_clock() > floor);
    }

    #[test]
    fn test_manual_base_split_advance() {
        let base = ManualTimeBase::new(UtcInstant::from_secs(1_000));

        base.advance(Duration::from_millis(500));
        assert_eq!(base.monotonic().as_millis(), 500.0);
        assert_eq!(base.wall_clock(), UtcInstant::from_millis(1_000_500));

        base.advance_monotonic(Duration::from_millis(100));
        base.step_wall(-2_000);
        assert_eq!(base.monotonic().as_millis(), 600.0);
        assert_eq!(base.wall_clock(), UtcInstant::from_millis(998_500));
    }
}
