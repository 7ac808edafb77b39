//! Flash pulses and their sequencing

use timehack_core::{HackConfig, MonotonicMs};

/// A train of equally spaced flash pulses
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlashPulse {
    /// Number of pulses
    pub count: u32,
    /// Start-to-start spacing in milliseconds
    pub spacing_ms: u32,
    /// Lit time of each pulse in milliseconds
    pub on_ms: u32,
}

impl FlashPulse {
    pub fn new(count: u32, spacing_ms: u32, on_ms: u32) -> Self {
        debug_assert!(count > 0 && on_ms <= spacing_ms);
        FlashPulse {
            count,
            spacing_ms,
            on_ms,
        }
    }

    /// One pulse, as emitted on each countdown second
    pub fn single(config: &HackConfig) -> Self {
        Self::new(1, config.flash_pulse_spacing_ms, config.flash_pulse_on_ms)
    }

    /// Boundary pulse train at :00 and :30
    pub fn boundary(config: &HackConfig) -> Self {
        Self::new(
            config.boundary_flash_pulses,
            config.flash_pulse_spacing_ms,
            config.flash_pulse_on_ms,
        )
    }

    /// Time from the first pulse start to the last pulse end
    pub fn duration_ms(&self) -> u32 {
        self.count.saturating_sub(1) * self.spacing_ms + self.on_ms
    }

    /// Whether the train is lit `elapsed_ms` after it started
    pub fn lit_at(&self, elapsed_ms: f64) -> bool {
        if elapsed_ms < 0.0 || elapsed_ms >= self.duration_ms() as f64 {
            return false;
        }
        (elapsed_ms % self.spacing_ms.max(1) as f64) < self.on_ms as f64
    }
}

/// Turns triggered pulse trains into a lit/unlit level over monotonic time
///
/// A new trigger replaces whatever train is still running.
#[derive(Clone, Debug, Default)]
pub struct FlashSequencer {
    active: Option<(FlashPulse, MonotonicMs)>,
}

impl FlashSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&mut self, pulse: FlashPulse, at: MonotonicMs) {
        self.active = Some((pulse, at));
    }

    /// Sample the level at `now`, retiring a finished train
    pub fn is_lit(&mut self, now: MonotonicMs) -> bool {
        let Some((pulse, started)) = self.active else {
            return false;
        };

        let elapsed = now - started;
        if elapsed >= pulse.duration_ms() as f64 {
            self.active = None;
            return false;
        }
        pulse.lit_at(elapsed)
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }
}
