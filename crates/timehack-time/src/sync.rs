//! ClockSync - drift-corrected estimate of authoritative UTC
//!
//! The estimate is an anchor (authority instant + the monotonic reading at
//! which it was taken) advanced by local monotonic elapsed time. Each
//! successful sync replaces the anchor, which is the only correction for
//! local clock rate error.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use timehack_core::{HackConfig, MonotonicMs, UtcInstant};

use crate::{AuthorityReading, AuthorityTimeSource, Provenance, TimeBase};

/// Authority-to-monotonic mapping
/// INVARIANT: both anchor fields are always written together
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeSnapshot {
    /// Authoritative instant at the anchor
    pub authority_instant: UtcInstant,
    /// Local monotonic reading at the anchor
    pub local_monotonic_at_sync: MonotonicMs,
    /// Additive correction in milliseconds
    pub drift_ms: f64,
}

impl TimeSnapshot {
    pub fn anchored(authority_instant: UtcInstant, local_monotonic_at_sync: MonotonicMs) -> Self {
        TimeSnapshot {
            authority_instant,
            local_monotonic_at_sync,
            drift_ms: 0.0,
        }
    }

    /// Project the anchor forward to a monotonic reading
    #[inline]
    pub fn project(&self, monotonic: MonotonicMs) -> UtcInstant {
        let elapsed = monotonic - self.local_monotonic_at_sync;
        let ms = self.authority_instant.as_millis() as f64 + elapsed + self.drift_ms;
        UtcInstant::from_millis(ms.floor() as i64)
    }
}

/// Whether an authority has ever answered
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncState {
    Unsynced,
    Synced,
}

/// Retry and resync timing
#[derive(Clone, Debug)]
pub struct SyncPolicy {
    /// Attempts per cycle
    pub retry_budget: u32,
    /// Delay between attempts
    pub retry_delay: Duration,
    /// Background resync period
    pub resync_period: Duration,
    /// Anchor age at which the sync is reported degraded
    pub degraded_after: Duration,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self::from_config(&HackConfig::default())
    }
}

impl SyncPolicy {
    pub fn from_config(config: &HackConfig) -> Self {
        SyncPolicy {
            retry_budget: config.sync_retry_budget,
            retry_delay: config.sync_retry_delay(),
            resync_period: config.resync_period(),
            degraded_after: config.degraded_after(),
        }
    }
}

/// Host-observable sync health
#[derive(Clone, Debug, PartialEq)]
pub struct SyncStatus {
    pub state: SyncState,
    /// Monotonic reading of the last successful sync
    pub last_success: Option<MonotonicMs>,
    /// Authority minus local estimate at the last successful sync
    pub last_correction_ms: Option<f64>,
    /// Failed cycles since the last success
    pub consecutive_failures: u32,
    /// Provenance of the current anchor
    pub anchor: Provenance,
    /// Operating off a stale anchor (or no authority at all)
    pub degraded: bool,
}

struct SyncInner {
    snapshot: TimeSnapshot,
    state: SyncState,
    anchor: Provenance,
    last_success: Option<MonotonicMs>,
    last_correction_ms: Option<f64>,
    consecutive_failures: u32,
}

/// Drift-corrected clock synchronised to an authority
pub struct ClockSync {
    source: Arc<dyn AuthorityTimeSource>,
    base: Arc<dyn TimeBase>,
    policy: SyncPolicy,
    inner: RwLock<SyncInner>,
}

impl ClockSync {
    /// Create an unsynced clock anchored to the host wall clock
    pub fn new(
        source: Arc<dyn AuthorityTimeSource>,
        base: Arc<dyn TimeBase>,
        policy: SyncPolicy,
    ) -> Self {
        let snapshot = TimeSnapshot::anchored(base.wall_clock(), base.monotonic());
        ClockSync {
            source,
            base,
            policy,
            inner: RwLock::new(SyncInner {
                snapshot,
                state: SyncState::Unsynced,
                anchor: Provenance::LocalFallback,
                last_success: None,
                last_correction_ms: None,
                consecutive_failures: 0,
            }),
        }
    }

    /// Current drift-corrected UTC instant
    pub fn now(&self) -> UtcInstant {
        let snapshot = self.inner.read().snapshot;
        snapshot.project(self.base.monotonic())
    }

    /// Current monotonic reading of the underlying time base
    pub fn monotonic(&self) -> MonotonicMs {
        self.base.monotonic()
    }

    pub fn snapshot(&self) -> TimeSnapshot {
        self.inner.read().snapshot
    }

    pub fn state(&self) -> SyncState {
        self.inner.read().state
    }

    pub fn policy(&self) -> &SyncPolicy {
        &self.policy
    }

    /// Run one sync cycle
    ///
    /// Tries the source up to `retry_budget` times, sleeping `retry_delay`
    /// between attempts. An attempt that degrades to the local wall clock
    /// counts as failed. Returns whether the anchor was replaced by an
    /// authority reading.
    pub async fn sync(&self) -> bool {
        let budget = self.policy.retry_budget.max(1);
        let mut fallback = None;

        for attempt in 1..=budget {
            let reading = self.source.fetch_or_fallback(&*self.base).await;
            if !reading.is_degraded() {
                self.apply(reading);
                return true;
            }

            tracing::debug!(attempt, budget, "sync attempt fell back to local clock");
            fallback = Some((reading.instant, self.base.monotonic()));

            if attempt < budget {
                tokio::time::sleep(self.policy.retry_delay).await;
            }
        }

        self.record_failed_cycle(fallback);
        false
    }

    /// Replace the anchor with an authority reading
    fn apply(&self, reading: AuthorityReading) {
        let monotonic = self.base.monotonic();
        let mut inner = self.inner.write();

        let estimate = inner.snapshot.project(monotonic);
        let correction_ms = reading.instant.millis_since(estimate) as f64;

        inner.snapshot = TimeSnapshot::anchored(reading.instant, monotonic);
        inner.state = SyncState::Synced;
        inner.anchor = reading.provenance;
        inner.last_success = Some(monotonic);
        inner.last_correction_ms = Some(correction_ms);
        inner.consecutive_failures = 0;

        tracing::info!(
            source = %inner.anchor,
            correction_ms,
            instant = ?reading.instant,
            "clock synchronised"
        );
    }

    /// Keep the last authority anchor; while unsynced, follow the host clock
    fn record_failed_cycle(&self, fallback: Option<(UtcInstant, MonotonicMs)>) {
        let mut inner = self.inner.write();
        inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);

        if let (SyncState::Unsynced, Some((wall, at))) = (inner.state, fallback) {
            inner.snapshot = TimeSnapshot::anchored(wall, at);
        }

        tracing::warn!(
            failures = inner.consecutive_failures,
            state = ?inner.state,
            "sync cycle failed, keeping previous anchor"
        );
    }

    /// Current health, evaluated at the present monotonic reading
    pub fn status(&self) -> SyncStatus {
        let monotonic = self.base.monotonic();
        let inner = self.inner.read();

        let degraded = match (inner.state, inner.last_success) {
            (SyncState::Synced, Some(at)) => {
                monotonic.elapsed_since(at) > self.policy.degraded_after.as_secs_f64() * 1000.0
            }
            _ => inner.consecutive_failures > 0,
        };

        SyncStatus {
            state: inner.state,
            last_success: inner.last_success,
            last_correction_ms: inner.last_correction_ms,
            consecutive_failures: inner.consecutive_failures,
            anchor: inner.anchor.clone(),
            degraded,
        }
    }
}
