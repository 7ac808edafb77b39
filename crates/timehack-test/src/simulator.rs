//! Simulated host on virtual time
//!
//! Simulates:
//! - A ground-truth authority that can be unavailable on a schedule
//! - A local clock running fast or slow against the truth
//! - The full frame pipeline reading the drifting clock

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use timehack_core::{HackConfig, HackError, HackResult, UtcInstant};
use timehack_cue::CueConfig;
use timehack_runtime::{FrameProjection, HackDisplay};
use timehack_time::{
    AuthorityReading, AuthorityTimeSource, ClockSync, ManualTimeBase, SyncPolicy, Zone,
};

/// When the simulated authority answers
#[derive(Clone, Debug)]
pub enum Availability {
    Always,
    Never,
    /// Fail the first `n` fetches, then answer
    FailFirst(u32),
    /// Answer with the given probability
    Flaky { success_rate: f64 },
}

/// Authority whose time is the simulation's ground truth
pub struct SimulatedAuthority {
    truth: Mutex<UtcInstant>,
    availability: Availability,
    calls: Mutex<u32>,
    rng: Mutex<StdRng>,
}

impl SimulatedAuthority {
    pub fn new(start: UtcInstant, availability: Availability, seed: u64) -> Self {
        SimulatedAuthority {
            truth: Mutex::new(start),
            availability,
            calls: Mutex::new(0),
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn truth(&self) -> UtcInstant {
        *self.truth.lock()
    }

    pub fn advance(&self, dt: Duration) {
        let mut truth = self.truth.lock();
        *truth = *truth + dt;
    }

    /// Fetches attempted so far
    pub fn calls(&self) -> u32 {
        *self.calls.lock()
    }

    fn answers(&self, call: u32) -> bool {
        match self.availability {
            Availability::Always => true,
            Availability::Never => false,
            Availability::FailFirst(n) => call > n,
            Availability::Flaky { success_rate } => self.rng.lock().gen_bool(success_rate.clamp(0.0, 1.0)),
        }
    }
}

#[async_trait]
impl AuthorityTimeSource for SimulatedAuthority {
    async fn fetch(&self) -> HackResult<AuthorityReading> {
        let call = {
            let mut calls = self.calls.lock();
            *calls += 1;
            *calls
        };

        if self.answers(call) {
            Ok(AuthorityReading::from_endpoint(self.truth(), "sim://authority"))
        } else {
            Err(HackError::SourceUnavailable)
        }
    }
}

/// Local clock rate against the truth
#[derive(Clone, Debug)]
pub struct ClockDriftModel {
    /// Rate (1.0 = perfect, >1.0 = fast, <1.0 = slow)
    pub drift_rate: f64,
    /// Accumulated local-minus-true microseconds
    accumulated_us: i64,
}

impl ClockDriftModel {
    pub fn new(drift_rate: f64) -> Self {
        ClockDriftModel {
            drift_rate,
            accumulated_us: 0,
        }
    }

    pub fn perfect() -> Self {
        Self::new(1.0)
    }

    /// 100 ppm fast
    pub fn fast() -> Self {
        Self::new(1.0001)
    }

    /// 100 ppm slow
    pub fn slow() -> Self {
        Self::new(0.9999)
    }

    /// Local elapsed time for `dt` of true time
    pub fn apply(&mut self, dt: Duration) -> Duration {
        let true_us = dt.as_micros() as i64;
        let local_us = (true_us as f64 * self.drift_rate).round().max(0.0) as i64;
        self.accumulated_us += local_us - true_us;
        Duration::from_micros(local_us as u64)
    }

    /// Accumulated drift in milliseconds (positive = local ahead)
    pub fn accumulated_ms(&self) -> f64 {
        self.accumulated_us as f64 / 1000.0
    }
}

/// A host running the full pipeline on virtual time
pub struct SimulatedHost {
    pub base: Arc<ManualTimeBase>,
    pub authority: Arc<SimulatedAuthority>,
    pub clock: Arc<ClockSync>,
    pub display: HackDisplay,
    drift: ClockDriftModel,
}

impl SimulatedHost {
    /// Host whose local wall clock starts `wall_offset_ms` away from the truth
    pub fn new(
        start: UtcInstant,
        wall_offset_ms: i64,
        drift: ClockDriftModel,
        availability: Availability,
        seed: u64,
    ) -> Self {
        Self::build(
            start,
            wall_offset_ms,
            drift,
            availability,
            seed,
            &HackConfig::offline(),
            Zone::UTC,
        )
    }

    /// Host driven by `config`; an unset display zone means UTC
    pub fn with_config(
        start: UtcInstant,
        wall_offset_ms: i64,
        drift: ClockDriftModel,
        availability: Availability,
        seed: u64,
        config: &HackConfig,
    ) -> HackResult<Self> {
        config.validate()?;
        let zone = match config.display_zone.as_deref() {
            Some(name) => Zone::parse(name)?,
            None => Zone::UTC,
        };
        Ok(Self::build(start, wall_offset_ms, drift, availability, seed, config, zone))
    }

    fn build(
        start: UtcInstant,
        wall_offset_ms: i64,
        drift: ClockDriftModel,
        availability: Availability,
        seed: u64,
        config: &HackConfig,
        zone: Zone,
    ) -> Self {
        let base = Arc::new(ManualTimeBase::new(start.add_millis(wall_offset_ms)));
        let authority = Arc::new(SimulatedAuthority::new(start, availability, seed));

        // Retries happen instantly in virtual time
        let policy = SyncPolicy {
            retry_delay: Duration::ZERO,
            ..SyncPolicy::from_config(config)
        };
        let clock = Arc::new(ClockSync::new(authority.clone(), base.clone(), policy));
        let display = HackDisplay::new(clock.clone(), zone, CueConfig::from_config(config));

        SimulatedHost {
            base,
            authority,
            clock,
            display,
            drift,
        }
    }

    /// Advance true time by `dt`; local clocks advance by the drifted amount
    pub fn advance(&mut self, dt: Duration) {
        let local = self.drift.apply(dt);
        self.authority.advance(dt);
        self.base.advance(local);
    }

    pub async fn sync(&self) -> bool {
        self.clock.sync().await
    }

    pub fn frame(&mut self) -> FrameProjection {
        self.display.frame()
    }

    /// Estimate minus truth, in milliseconds
    pub fn error_ms(&self) -> i64 {
        self.clock.now().millis_since(self.authority.truth())
    }

    pub fn drift(&self) -> &ClockDriftModel {
        &self.drift
    }
}
