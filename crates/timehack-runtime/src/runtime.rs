//! TIMEHACK runtime - wires config, clock, resync and frame loop together

use std::future::Future;
use std::sync::Arc;

use tokio::time::{interval, MissedTickBehavior};

use timehack_core::{HackConfig, HackResult};
use timehack_cue::CueConfig;
use timehack_time::{
    AuthorityTimeSource, ClockSync, HttpAuthoritySource, OfflineSource, SyncPolicy,
    SystemTimeBase, TimeBase, Zone,
};

use crate::{spawn_resync, FrameProjection, HackDisplay};

/// Statistics of one run
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    pub frames: u64,
    pub stage_changes: u64,
    pub flashes: u64,
}

/// A configured clock display, ready to run
pub struct HackRuntime {
    config: HackConfig,
    clock: Arc<ClockSync>,
    display: HackDisplay,
}

impl HackRuntime {
    /// Build from configuration with the OS clocks and HTTP endpoints
    pub fn from_config(config: HackConfig) -> HackResult<Self> {
        let source: Arc<dyn AuthorityTimeSource> = if config.endpoints.is_empty() {
            tracing::warn!("no authority endpoints configured, running on local time");
            Arc::new(OfflineSource)
        } else {
            Arc::new(HttpAuthoritySource::from_config(&config)?)
        };
        Self::with_parts(config, source, Arc::new(SystemTimeBase::new()))
    }

    /// Build from explicit parts
    pub fn with_parts(
        config: HackConfig,
        source: Arc<dyn AuthorityTimeSource>,
        base: Arc<dyn TimeBase>,
    ) -> HackResult<Self> {
        config.validate()?;
        let zone = Zone::resolve(config.display_zone.as_deref())?;

        let clock = Arc::new(ClockSync::new(source, base, SyncPolicy::from_config(&config)));
        let display = HackDisplay::new(clock.clone(), zone, CueConfig::from_config(&config));

        tracing::info!(
            zone = %zone,
            endpoints = config.endpoints.len(),
            resync_period_ms = config.resync_period_ms,
            "runtime configured"
        );

        Ok(HackRuntime {
            config,
            clock,
            display,
        })
    }

    pub fn config(&self) -> &HackConfig {
        &self.config
    }

    pub fn clock(&self) -> &Arc<ClockSync> {
        &self.clock
    }

    pub fn display_mut(&mut self) -> &mut HackDisplay {
        &mut self.display
    }

    /// Run the frame loop until `shutdown` resolves
    ///
    /// Spawns the background resync, then evaluates one frame per
    /// `frame_interval` and hands it to `render`. The resync task is torn
    /// down before returning.
    pub async fn run<R, S>(mut self, mut render: R, shutdown: S) -> RunStats
    where
        R: FnMut(&FrameProjection),
        S: Future<Output = ()>,
    {
        let resync = spawn_resync(self.clock.clone());

        let mut frames = interval(self.config.frame_interval());
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut stats = RunStats::default();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = frames.tick() => {
                    let frame = self.display.frame();
                    stats.frames += 1;
                    stats.stage_changes += frame.stage_changed as u64;
                    stats.flashes += frame.flash_pulse.is_some() as u64;
                    render(&frame);
                }
            }
        }

        resync.shutdown().await;
        tracing::info!(frames = stats.frames, "frame loop stopped");
        stats
    }
}
