//! Time primitives for TIMEHACK
//!
//! Two clocks are in play:
//! - UtcInstant: absolute wall time, milliseconds since the Unix epoch
//! - MonotonicMs: local monotonic progression, milliseconds since an arbitrary origin

use std::ops::{Add, Sub};
use std::time::Duration;

/// Absolute UTC instant, milliseconds since 1970-01-01T00:00:00Z
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct UtcInstant(pub i64);

impl UtcInstant {
    pub const EPOCH: UtcInstant = UtcInstant(0);

    #[inline]
    pub fn from_millis(millis: i64) -> Self {
        UtcInstant(millis)
    }

    /// Saturates at the ends of the i64 range
    #[inline]
    pub fn from_secs(secs: i64) -> Self {
        UtcInstant(secs.saturating_mul(1000))
    }

    #[inline]
    pub fn from_secs_f64(secs: f64) -> Self {
        UtcInstant((secs * 1000.0).floor() as i64)
    }

    /// `None` when `secs` does not fit in milliseconds
    #[inline]
    pub fn checked_from_secs(secs: i64) -> Option<Self> {
        secs.checked_mul(1000).map(UtcInstant)
    }

    /// `None` for non-finite input or when the result does not fit
    pub fn checked_from_secs_f64(secs: f64) -> Option<Self> {
        let ms = (secs * 1000.0).floor();
        if !ms.is_finite() || ms < i64::MIN as f64 || ms >= i64::MAX as f64 {
            return None;
        }
        Some(UtcInstant(ms as i64))
    }

    #[inline]
    pub fn as_millis(self) -> i64 {
        self.0
    }

    #[inline]
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / 1000.0
    }

    /// Whole seconds since the epoch, rounded toward negative infinity
    #[inline]
    pub fn as_secs(self) -> i64 {
        self.0.div_euclid(1000)
    }

    /// Millisecond offset inside the current second (0..1000)
    #[inline]
    pub fn subsec_millis(self) -> u32 {
        self.0.rem_euclid(1000) as u32
    }

    /// Signed offset in milliseconds (self - earlier)
    #[inline]
    pub fn millis_since(self, earlier: UtcInstant) -> i64 {
        self.0 - earlier.0
    }

    #[inline]
    pub fn add_millis(self, millis: i64) -> Self {
        UtcInstant(self.0.saturating_add(millis))
    }

    #[inline]
    pub fn saturating_add(self, duration: Duration) -> Self {
        UtcInstant(self.0.saturating_add(duration.as_millis() as i64))
    }

    #[inline]
    pub fn saturating_sub(self, duration: Duration) -> Self {
        UtcInstant(self.0.saturating_sub(duration.as_millis() as i64))
    }
}

impl Add<Duration> for UtcInstant {
    type Output = UtcInstant;

    #[inline]
    fn add(self, rhs: Duration) -> Self::Output {
        UtcInstant(self.0 + rhs.as_millis() as i64)
    }
}

impl Sub<Duration> for UtcInstant {
    type Output = UtcInstant;

    #[inline]
    fn sub(self, rhs: Duration) -> Self::Output {
        UtcInstant(self.0 - rhs.as_millis() as i64)
    }
}

impl std::fmt::Debug for UtcInstant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "utc({}ms)", self.0)
    }
}

/// Local monotonic reading in (fractional) milliseconds since the time base origin
#[derive(Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct MonotonicMs(pub f64);

impl MonotonicMs {
    pub const ZERO: MonotonicMs = MonotonicMs(0.0);

    #[inline]
    pub fn from_millis(millis: f64) -> Self {
        MonotonicMs(millis)
    }

    #[inline]
    pub fn from_duration(d: Duration) -> Self {
        MonotonicMs(d.as_secs_f64() * 1000.0)
    }

    #[inline]
    pub fn as_millis(self) -> f64 {
        self.0
    }

    /// Elapsed milliseconds since `earlier`, never negative
    #[inline]
    pub fn elapsed_since(self, earlier: MonotonicMs) -> f64 {
        (self.0 - earlier.0).max(0.0)
    }
}

impl Add<Duration> for MonotonicMs {
    type Output = MonotonicMs;

    #[inline]
    fn add(self, rhs: Duration) -> Self::Output {
        MonotonicMs(self.0 + rhs.as_secs_f64() * 1000.0)
    }
}

impl Sub<MonotonicMs> for MonotonicMs {
    type Output = f64;

    #[inline]
    fn sub(self, rhs: MonotonicMs) -> Self::Output {
        self.0 - rhs.0
    }
}

impl std::fmt::Debug for MonotonicMs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "mono({:.3}ms)", self.0)
    }
}
