use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::api::{ApiError, MonitorApi};

use super::store::{ApplyOutcome, MonitorStore, PollSnapshot};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

/// Ticks allowed in flight at once; further ticks are skipped until one ends.
const MAX_IN_FLIGHT_TICKS: usize = 2;

/// Fetches the four read endpoints concurrently and applies them as one tick.
///
/// The sequence number is reserved before any request goes out, so a tick
/// that resolves after a newer tick or command response is dropped whole. On
/// any failure the store is left untouched.
pub async fn poll_once(api: &dyn MonitorApi, store: &MonitorStore) -> Result<ApplyOutcome, ApiError> {
    let seq = store.issue_sequence().await;

    let (settings, history, recordings, status) = tokio::try_join!(
        api.get_settings(),
        api.get_history(),
        api.list_recordings(),
        api.get_recording_status(),
    )?;

    let outcome = store
        .apply_snapshot(
            seq,
            PollSnapshot {
                settings,
                history,
                recordings,
                status,
            },
        )
        .await;
    if outcome == ApplyOutcome::Applied {
        log_debug!("poll tick {seq} applied");
    }
    Ok(outcome)
}

async fn poll_loop(
    api: Arc<dyn MonitorApi>,
    store: MonitorStore,
    every: Duration,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // Ticks may overlap when the device is slow; each runs as its own task.
    let mut ticks: JoinSet<()> = JoinSet::new();

    loop {
        tokio::select! {
            biased;

            _ = cancel_token.cancelled() => {
                // Aborts in-flight ticks and waits for them, so nothing writes
                // to the store once this returns.
                ticks.shutdown().await;
                log_info!("poll loop shutting down");
                break;
            }
            Some(joined) = ticks.join_next(), if !ticks.is_empty() => {
                if let Err(err) = joined {
                    log_error!("poll tick task failed: {err}");
                }
            }
            _ = ticker.tick() => {
                if ticks.len() >= MAX_IN_FLIGHT_TICKS {
                    log_debug!("device slow, skipping poll tick ({} in flight)", ticks.len());
                    continue;
                }
                let api = Arc::clone(&api);
                let store = store.clone();
                ticks.spawn(async move {
                    if let Err(err) = poll_once(&*api, &store).await {
                        log_warn!("poll tick skipped: {err}");
                    }
                });
            }
        }
    }
}

/// Periodic full-state refresh with a start/stop lifecycle.
pub struct Poller {
    api: Arc<dyn MonitorApi>,
    store: MonitorStore,
    every: Duration,
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl Poller {
    pub fn new(api: Arc<dyn MonitorApi>, store: MonitorStore, every: Duration) -> Self {
        Self {
            api,
            store,
            every,
            handle: None,
            cancel_token: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Starts ticking immediately and then every interval. Starting a running
    /// poller does nothing.
    pub fn start(&mut self) {
        if self.is_running() {
            log_debug!("poller already running");
            return;
        }

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(poll_loop(
            Arc::clone(&self.api),
            self.store.clone(),
            self.every,
            cancel_token.clone(),
        ));

        log_info!("poller started (every {:?})", self.every);
        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
    }

    /// Stops the loop and waits for it. No store write from this poller
    /// happens after this returns.
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle.await.context("poll loop task failed to join")
        } else {
            Ok(())
        }
    }

    /// Runs a single tick in the caller's task, outside the schedule.
    pub async fn tick(&self) -> Result<ApplyOutcome, ApiError> {
        poll_once(self.api.as_ref(), &self.store).await
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeApi;
    use crate::models::{RecordingSet, RecordingStatus};
    use crate::sync::store::tests::seeded;

    fn files(names: &[&str]) -> RecordingSet {
        names.iter().copied().collect()
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_on_interval_and_start_is_idempotent() {
        let api = Arc::new(FakeApi::default());
        let store = MonitorStore::new();
        let mut poller = Poller::new(api.clone(), store.clone(), Duration::from_secs(3));

        poller.start();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(api.read_calls(), 1);
        assert!(store.snapshot().await.synced);

        poller.start();
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(api.read_calls(), 2);

        poller.stop().await.unwrap();
        assert!(!poller.is_running());
        tokio::time::sleep(Duration::from_secs(9)).await;
        assert_eq!(api.read_calls(), 2);
    }

    #[tokio::test]
    async fn failed_tick_keeps_prior_snapshot() {
        let api = Arc::new(FakeApi::default());
        let store = seeded(true, &["a.avi"]).await;
        let before = store.snapshot().await;

        api.recordings.push(Ok(files(&["a.avi", "b.avi"])));
        api.history
            .push(Err(ApiError::Transport("connection reset".into())));
        let poller = Poller::new(api.clone(), store.clone(), Duration::from_secs(3));

        assert!(poller.tick().await.is_err());

        let after = store.snapshot().await;
        assert_eq!(after.applied_seq, before.applied_seq);
        assert_eq!(after.recordings, before.recordings);
        assert!(after.is_paused());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_tick_cannot_overwrite_newer_tick() {
        let api = Arc::new(FakeApi::default());
        let store = MonitorStore::new();

        api.status
            .push_delayed(Duration::from_secs(5), Ok(RecordingStatus::paused(true)));
        api.status.push(Ok(RecordingStatus::paused(false)));
        api.recordings.push(Ok(files(&["old.avi"])));
        api.recordings.push(Ok(files(&["new.avi"])));

        let (slow, fast) = tokio::join!(poll_once(&*api, &store), async {
            tokio::time::sleep(Duration::from_millis(1)).await;
            poll_once(&*api, &store).await
        });

        assert_eq!(fast.unwrap(), ApplyOutcome::Applied);
        assert_eq!(slow.unwrap(), ApplyOutcome::Stale);

        let snapshot = store.snapshot().await;
        assert!(!snapshot.is_paused());
        assert_eq!(snapshot.recordings, files(&["new.avi"]));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_discards_in_flight_tick() {
        let api = Arc::new(FakeApi::default());
        let store = MonitorStore::new();
        api.status
            .push_delayed(Duration::from_secs(5), Ok(RecordingStatus::paused(true)));

        let mut poller = Poller::new(api.clone(), store.clone(), Duration::from_secs(3));
        poller.start();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(api.read_calls(), 1);

        poller.stop().await.unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;

        let snapshot = store.snapshot().await;
        assert!(!snapshot.synced);
        assert_eq!(snapshot.applied_seq, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_device_does_not_pile_up_ticks() {
        let api = Arc::new(FakeApi::default());
        let store = MonitorStore::new();
        for _ in 0..20 {
            api.status
                .push_delayed(Duration::from_secs(600), Ok(RecordingStatus::paused(true)));
        }

        let mut poller = Poller::new(api.clone(), store.clone(), Duration::from_secs(3));
        poller.start();
        tokio::time::sleep(Duration::from_secs(30)).await;

        assert_eq!(api.read_calls(), MAX_IN_FLIGHT_TICKS);
        poller.stop().await.unwrap();
        assert!(!store.snapshot().await.synced);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_after_stop_resumes_ticks() {
        let api = Arc::new(FakeApi::default());
        let store = MonitorStore::new();
        let mut poller = Poller::new(api.clone(), store.clone(), Duration::from_secs(3));

        poller.start();
        tokio::time::sleep(Duration::from_millis(10)).await;
        poller.stop().await.unwrap();

        poller.start();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(poller.is_running());
        assert_eq!(api.read_calls(), 2);
        poller.stop().await.unwrap();
    }
}
