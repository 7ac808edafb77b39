//! End-to-end scenarios on simulated hosts
//!
//! Each scenario drives a SimulatedHost through virtual time and returns a
//! report; the assertions live in this module's tests.

use std::time::Duration;

use timehack_core::UtcInstant;
use timehack_runtime::FrameProjection;
use timehack_time::SyncState;

use crate::{Availability, ClockDriftModel, SimulatedHost};

/// 2024-03-10T14:05:00Z
pub const SCENARIO_MINUTE: i64 = 1_710_079_500_000;

/// Render frames every `frame_interval` for `duration` of true time
pub fn run_frames(
    host: &mut SimulatedHost,
    duration: Duration,
    frame_interval: Duration,
) -> Vec<FrameProjection> {
    let frames = (duration.as_millis() / frame_interval.as_millis().max(1)) as usize;
    let mut out = Vec::with_capacity(frames);
    for _ in 0..frames {
        out.push(host.frame());
        host.advance(frame_interval);
    }
    out
}

/// Announcement lines in order, consecutive repeats collapsed
pub fn announcement_lines(frames: &[FrameProjection]) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for frame in frames {
        if lines.last() != Some(&frame.announcement_text) {
            lines.push(frame.announcement_text.clone());
        }
    }
    lines
}

/// Countdown across a minute boundary at 10 Hz, starting at 14:05:`start_second`
pub fn countdown_trace(start_second: i64, seconds: u64) -> Vec<FrameProjection> {
    let mut host = SimulatedHost::new(
        UtcInstant::from_millis(SCENARIO_MINUTE + start_second * 1000),
        0,
        ClockDriftModel::perfect(),
        Availability::Always,
        0,
    );
    run_frames(&mut host, Duration::from_secs(seconds), Duration::from_millis(100))
}

/// Outcome of a drift run
#[derive(Clone, Debug, PartialEq)]
pub struct DriftReport {
    /// Largest |estimate - truth| seen at any frame
    pub max_abs_error_ms: i64,
    /// Error right after the last sync cycle
    pub final_error_ms: i64,
    pub syncs_ok: u32,
    pub syncs_failed: u32,
    /// Drift the local clock accumulated against the truth
    pub local_drift_ms: f64,
}

/// Run `minutes` resync periods of one minute each, checking error every second
pub async fn drift_scenario(
    drift: ClockDriftModel,
    availability: Availability,
    minutes: u32,
    seed: u64,
) -> DriftReport {
    let mut host = SimulatedHost::new(
        UtcInstant::from_millis(SCENARIO_MINUTE),
        0,
        drift,
        availability,
        seed,
    );

    let mut report = DriftReport {
        max_abs_error_ms: 0,
        final_error_ms: 0,
        syncs_ok: 0,
        syncs_failed: 0,
        local_drift_ms: 0.0,
    };

    for _ in 0..minutes {
        if host.sync().await {
            report.syncs_ok += 1;
        } else {
            report.syncs_failed += 1;
        }
        report.final_error_ms = host.error_ms();

        for _ in 0..60 {
            host.advance(Duration::from_secs(1));
            report.max_abs_error_ms = report.max_abs_error_ms.max(host.error_ms().abs());
        }
    }

    report.local_drift_ms = host.drift().accumulated_ms();
    report
}

/// Outcome of running with no reachable authority
#[derive(Clone, Debug, PartialEq)]
pub struct OutageReport {
    pub state: SyncState,
    pub degraded: bool,
    /// Clock advance over the run
    pub clock_elapsed_ms: i64,
    /// Local clock advance over the run
    pub local_elapsed_ms: f64,
    /// Every consecutive pair of readings was non-decreasing
    pub monotonic: bool,
    pub frames: usize,
}

/// Authority never answers; sync every minute and render at 10 Hz
pub async fn outage_scenario(minutes: u32) -> OutageReport {
    let mut host = SimulatedHost::new(
        UtcInstant::from_millis(SCENARIO_MINUTE),
        0,
        ClockDriftModel::perfect(),
        Availability::Never,
        0,
    );

    let first = host.clock.now();
    let first_mono = host.clock.monotonic();
    let mut previous = first;
    let mut monotonic = true;
    let mut frames = 0;

    for _ in 0..minutes {
        host.sync().await;
        for frame in run_frames(&mut host, Duration::from_secs(60), Duration::from_millis(100)) {
            monotonic &= frame.instant >= previous;
            previous = frame.instant;
            frames += 1;
        }
    }

    let status = host.clock.status();
    OutageReport {
        state: status.state,
        degraded: status.degraded,
        clock_elapsed_ms: host.clock.now().millis_since(first),
        local_elapsed_ms: host.clock.monotonic().elapsed_since(first_mono),
        monotonic,
        frames,
    }
}

/// Outcome of an outage followed by recovery
#[derive(Clone, Debug, PartialEq)]
pub struct RecoveryReport {
    pub first_cycle: bool,
    pub second_cycle: bool,
    pub fetches: u32,
    pub state: SyncState,
    pub error_after_recovery_ms: i64,
}

/// Authority fails `failures` fetches, the host clock is `wall_offset_ms` off
pub async fn recovery_scenario(failures: u32, wall_offset_ms: i64) -> RecoveryReport {
    let mut host = SimulatedHost::new(
        UtcInstant::from_millis(SCENARIO_MINUTE),
        wall_offset_ms,
        ClockDriftModel::perfect(),
        Availability::FailFirst(failures),
        0,
    );

    let first_cycle = host.sync().await;
    host.advance(Duration::from_secs(60));
    let second_cycle = host.sync().await;

    RecoveryReport {
        first_cycle,
        second_cycle,
        fetches: host.authority.calls(),
        state: host.clock.state(),
        error_after_recovery_ms: host.error_ms(),
    }
}
