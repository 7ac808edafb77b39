//! Background resynchronisation task

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use timehack_time::ClockSync;

/// Handle to the running resync task
///
/// Dropping the handle aborts the task.
pub struct ResyncHandle {
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl ResyncHandle {
    /// Stop the task and wait for it to finish its current cycle
    pub async fn shutdown(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    tracing::warn!(error = %e, "resync task ended abnormally");
                }
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |t| t.is_finished())
    }
}

impl Drop for ResyncHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Sync immediately, then every `resync_period` until shut down
pub fn spawn_resync(clock: Arc<ClockSync>) -> ResyncHandle {
    let (tx, mut rx) = watch::channel(false);
    let period = clock.policy().resync_period;

    let task = tokio::spawn(async move {
        let mut ticker = interval(period);
        // A slow cycle (retries) must not cause a burst of catch-up syncs
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let synced = tokio::select! {
                        ok = clock.sync() => ok,
                        _ = rx.changed() => break,
                    };
                    tracing::debug!(synced, "resync cycle complete");
                }
                _ = rx.changed() => break,
            }
        }

        tracing::debug!("resync task stopped");
    });

    ResyncHandle {
        shutdown: tx,
        task: Some(task),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use timehack_core::{HackResult, UtcInstant};
    use timehack_time::{
        AuthorityReading, AuthorityTimeSource, ManualTimeBase, SyncPolicy, SyncState,
    };

    struct CountingSource {
        calls: Mutex<u32>,
    }

    #[async_trait]
    impl AuthorityTimeSource for CountingSource {
        async fn fetch(&self) -> HackResult<AuthorityReading> {
            let mut calls = self.calls.lock();
            *calls += 1;
            Ok(AuthorityReading::from_endpoint(
                UtcInstant::from_secs(5_000 + *calls as i64),
                "counting",
            ))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_resync_runs_on_period() {
        let source = Arc::new(CountingSource { calls: Mutex::new(0) });
        let base = Arc::new(ManualTimeBase::new(UtcInstant::from_secs(1)));
        let clock = Arc::new(ClockSync::new(source.clone(), base, SyncPolicy::default()));

        let handle = spawn_resync(clock.clone());
        tokio::time::sleep(Duration::from_secs(125)).await;

        assert_eq!(*source.calls.lock(), 3);
        assert_eq!(clock.state(), SyncState::Synced);
        assert_eq!(clock.now(), UtcInstant::from_secs(5_003));

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_task() {
        let source = Arc::new(CountingSource { calls: Mutex::new(0) });
        let base = Arc::new(ManualTimeBase::new(UtcInstant::from_secs(1)));
        let clock = Arc::new(ClockSync::new(source.clone(), base, SyncPolicy::default()));

        let handle = spawn_resync(clock);
        tokio::time::sleep(Duration::from_secs(1)).await;
        handle.shutdown().await;

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(*source.calls.lock(), 1);
    }
}
