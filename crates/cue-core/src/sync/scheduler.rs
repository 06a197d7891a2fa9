//! Auto-sync scheduler.
//!
//! Drives [`SyncEngine::synchronize`] from a repeating timer and from bus
//! events: connectivity restored, app foreground/background, and debounced
//! local edits of the open video. A per-video pending set keeps the scheduler
//! from dispatching the same video twice; it does not replace the engine's own
//! single-flight guard.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::models::{SyncPreferences, VideoId};

use super::engine::SyncEngine;
use super::error::SyncError;
use super::events::SyncEvent;

/// Quiet period after a local edit before the open video is synced
pub const LOCAL_CHANGE_DEBOUNCE: Duration = Duration::from_secs(10);

fn lock_pending(pending: &Mutex<HashSet<VideoId>>) -> MutexGuard<'_, HashSet<VideoId>> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clears a video's pending mark when dropped
struct PendingMark {
    pending: Arc<Mutex<HashSet<VideoId>>>,
    video_id: VideoId,
}

impl Drop for PendingMark {
    fn drop(&mut self) {
        lock_pending(&self.pending).remove(&self.video_id);
    }
}

#[derive(Clone)]
pub struct AutoSyncScheduler {
    engine: SyncEngine,
    pending: Arc<Mutex<HashSet<VideoId>>>,
    current_video: Arc<Mutex<Option<VideoId>>>,
    shutdown: CancellationToken,
}

impl AutoSyncScheduler {
    pub fn new(engine: SyncEngine) -> Self {
        Self {
            engine,
            pending: Arc::default(),
            current_video: Arc::default(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Video whose edits and lifecycle events trigger syncs
    pub fn set_current_video(&self, video_id: Option<VideoId>) {
        *self
            .current_video
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = video_id;
    }

    pub fn current_video(&self) -> Option<VideoId> {
        self.current_video
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_pending(&self, video_id: &VideoId) -> bool {
        lock_pending(&self.pending).contains(video_id)
    }

    /// Spawn the scheduling loop; it runs until [`Self::shutdown`]
    pub fn start(&self) -> JoinHandle<()> {
        let events = self.engine.events().subscribe();
        let preferences = self.engine.subscribe_preferences();
        let scheduler = self.clone();
        tokio::spawn(async move { scheduler.run(events, preferences).await })
    }

    /// Stop the loop; in-flight syncs stop at their next cancellation check
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Queue every known video that is not pending; the queue is synced in order.
    ///
    /// Returns the number of videos queued.
    pub async fn sync_known_videos(&self) -> usize {
        let videos = match self.engine.known_videos().await {
            Ok(videos) => videos,
            Err(error) => {
                tracing::warn!(%error, "Auto-sync could not list known videos");
                return 0;
            }
        };

        let queued: Vec<PendingMark> = videos
            .into_iter()
            .filter_map(|video_id| self.mark_pending(video_id))
            .collect();
        let count = queued.len();
        if count == 0 {
            return 0;
        }

        let scheduler = self.clone();
        tokio::spawn(async move {
            for mark in queued {
                if scheduler.shutdown.is_cancelled() {
                    tracing::debug!("Auto-sync sweep stopped by shutdown");
                    break;
                }
                scheduler.sync_one(&mark.video_id, "timer").await;
            }
        });
        count
    }

    /// Dispatch a sync of the open video; false when there is none or it is pending
    pub fn sync_current_video(&self, trigger: &'static str) -> bool {
        let Some(video_id) = self.current_video() else {
            tracing::debug!(trigger, "Auto-sync trigger ignored: no open video");
            return false;
        };
        let Some(mark) = self.mark_pending(video_id) else {
            return false;
        };

        let scheduler = self.clone();
        tokio::spawn(async move {
            scheduler.sync_one(&mark.video_id, trigger).await;
        });
        true
    }

    fn mark_pending(&self, video_id: VideoId) -> Option<PendingMark> {
        if !lock_pending(&self.pending).insert(video_id.clone()) {
            tracing::debug!(%video_id, "Auto-sync skipped: video already pending");
            return None;
        }
        Some(PendingMark {
            pending: self.pending.clone(),
            video_id,
        })
    }

    async fn sync_one(&self, video_id: &VideoId, trigger: &'static str) {
        let cancel = self.shutdown.child_token();
        tracing::debug!(%video_id, trigger, "Auto-sync dispatched");
        match self.engine.synchronize(video_id, &cancel).await {
            Ok(report) => {
                tracing::debug!(%video_id, trigger, outcome = %report.outcome, "Auto-sync finished");
            }
            Err(SyncError::AlreadyInProgress) => {
                tracing::debug!(%video_id, trigger, "Auto-sync skipped: another sync is running");
            }
            Err(error) => {
                tracing::debug!(%video_id, trigger, kind = error.kind(), "Auto-sync failed");
            }
        }
    }

    async fn run(
        self,
        mut events: broadcast::Receiver<SyncEvent>,
        mut preferences: watch::Receiver<SyncPreferences>,
    ) {
        let mut active = *preferences.borrow_and_update();
        let mut ticker = build_ticker(&active);
        let debounce = tokio::time::sleep(Duration::ZERO);
        tokio::pin!(debounce);
        let mut debounce_armed = false;

        tracing::info!(
            enabled = active.auto_sync_enabled,
            interval_secs = active.interval.as_secs(),
            "Auto-sync scheduler started"
        );

        loop {
            tokio::select! {
                () = self.shutdown.cancelled() => break,
                changed = preferences.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let updated = *preferences.borrow_and_update();
                    if updated.auto_sync_enabled != active.auto_sync_enabled
                        || updated.interval != active.interval
                    {
                        ticker = build_ticker(&updated);
                        if updated.auto_sync_enabled {
                            tracing::info!(interval_secs = updated.interval.as_secs(), "Auto-sync timer restarted");
                        } else {
                            tracing::info!("Auto-sync disabled");
                        }
                    }
                    if !updated.auto_sync_enabled {
                        debounce_armed = false;
                    }
                    active = updated;
                }
                () = next_tick(&mut ticker) => {
                    let queued = self.sync_known_videos().await;
                    tracing::debug!(queued, "Auto-sync tick");
                }
                received = events.recv() => match received {
                    Ok(event) => {
                        if self.handle_event(event, active.auto_sync_enabled).await {
                            debounce.as_mut().reset(Instant::now() + LOCAL_CHANGE_DEBOUNCE);
                            debounce_armed = true;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Auto-sync scheduler lagged behind the event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                () = &mut debounce, if debounce_armed => {
                    debounce_armed = false;
                    self.sync_current_video("local change");
                }
            }
        }

        tracing::info!("Auto-sync scheduler stopped");
    }

    /// React to a bus event; true when the local-change debounce should restart
    async fn handle_event(&self, event: SyncEvent, auto_sync: bool) -> bool {
        match event {
            SyncEvent::LocalDataChanged { video_id } => {
                if let Err(error) = self.engine.mark_local_modification(&video_id).await {
                    tracing::warn!(%video_id, %error, "Failed to record local modification");
                }
                auto_sync && self.current_video().as_ref() == Some(&video_id)
            }
            SyncEvent::NetworkStatusChanged { online } => {
                if online && auto_sync {
                    self.sync_current_video("network restored");
                }
                false
            }
            SyncEvent::AppForeground => {
                if auto_sync {
                    self.sync_current_video("foreground");
                }
                false
            }
            SyncEvent::AppBackground => {
                if auto_sync {
                    self.sync_current_video("background");
                }
                false
            }
            SyncEvent::SyncCompleted { .. } | SyncEvent::SyncFailed { .. } => false,
        }
    }
}

fn build_ticker(preferences: &SyncPreferences) -> Option<Interval> {
    if !preferences.auto_sync_enabled {
        return None;
    }
    let period = preferences.interval;
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    Some(ticker)
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SyncPreferencesUpdate, DEFAULT_SYNC_INTERVAL};
    use crate::services::DatabaseService;
    use crate::sync::events::EventBus;
    use crate::sync::test_support::{sample_timelines, video, FakeGateway};

    struct Harness {
        db: DatabaseService,
        gateway: Arc<FakeGateway>,
        engine: SyncEngine,
        scheduler: AutoSyncScheduler,
    }

    async fn harness() -> Harness {
        let db = DatabaseService::open_in_memory().await.unwrap();
        let gateway = Arc::new(FakeGateway::new());
        let engine = SyncEngine::new(
            gateway.clone(),
            Arc::new(db.clone()),
            Arc::new(db.clone()),
            EventBus::new(),
        )
        .await
        .unwrap();
        let scheduler = AutoSyncScheduler::new(engine.clone());
        Harness {
            db,
            gateway,
            engine,
            scheduler,
        }
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        for _ in 0..200 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not reached");
    }

    #[tokio::test(start_paused = true)]
    async fn timer_syncs_every_known_video() {
        let h = harness().await;
        let home = video("home");
        let away = video("away");
        h.db.save_annotations(&home, &sample_timelines()).await.unwrap();
        h.db.save_annotations(&away, &sample_timelines()).await.unwrap();

        let handle = h.scheduler.start();
        tokio::time::sleep(DEFAULT_SYNC_INTERVAL - Duration::from_secs(1)).await;
        assert_eq!(h.gateway.fetch_count(), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        wait_until(|| h.gateway.uploads().len() == 2).await;
        wait_until(|| !h.scheduler.is_pending(&home) && !h.scheduler.is_pending(&away)).await;

        h.scheduler.shutdown();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn local_changes_are_debounced() {
        let h = harness().await;
        let v = video("open");
        h.db.save_annotations(&v, &sample_timelines()).await.unwrap();
        h.scheduler.set_current_video(Some(v.clone()));
        let _handle = h.scheduler.start();

        for _ in 0..3 {
            h.engine.events().local_data_changed(v.clone());
            tokio::time::sleep(Duration::from_secs(3)).await;
        }
        let metadata = h.engine.sync_metadata(&v).await.unwrap().unwrap();
        assert!(metadata.has_unsynced_local_changes());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(h.gateway.fetch_count(), 0);

        tokio::time::sleep(Duration::from_secs(3)).await;
        wait_until(|| h.gateway.uploads().len() == 1).await;
        wait_until(|| !h.scheduler.is_pending(&v)).await;
        let metadata = h.engine.sync_metadata(&v).await.unwrap().unwrap();
        assert_eq!(metadata.sync_version, 1);
        assert!(!metadata.has_unsynced_local_changes());
    }

    #[tokio::test(start_paused = true)]
    async fn edits_to_other_videos_are_only_recorded() {
        let h = harness().await;
        let open = video("open");
        let other = video("other");
        h.db.save_annotations(&other, &sample_timelines()).await.unwrap();
        h.scheduler.set_current_video(Some(open));
        let _handle = h.scheduler.start();

        h.engine.events().local_data_changed(other.clone());
        tokio::time::sleep(LOCAL_CHANGE_DEBOUNCE * 2).await;

        assert_eq!(h.gateway.fetch_count(), 0);
        assert!(h.engine.sync_metadata(&other).await.unwrap().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn lifecycle_and_network_events_sync_current_video() {
        let h = harness().await;
        let v = video("open");
        h.db.save_annotations(&v, &sample_timelines()).await.unwrap();
        let _handle = h.scheduler.start();

        h.engine.events().publish(SyncEvent::AppForeground);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(h.gateway.fetch_count(), 0);

        h.scheduler.set_current_video(Some(v.clone()));
        h.engine.events().network_status_changed(false);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(h.gateway.fetch_count(), 0);

        h.engine.events().network_status_changed(true);
        wait_until(|| h.gateway.fetch_count() == 1).await;
        wait_until(|| !h.scheduler.is_pending(&v)).await;

        h.engine.events().publish(SyncEvent::AppBackground);
        wait_until(|| h.gateway.fetch_count() == 2).await;
    }

    #[tokio::test(start_paused = true)]
    async fn disabling_auto_sync_stops_the_timer() {
        let h = harness().await;
        let v = video("archive");
        h.db.save_annotations(&v, &sample_timelines()).await.unwrap();
        let _handle = h.scheduler.start();

        h.engine
            .configure_synchronization(SyncPreferencesUpdate {
                auto_sync: Some(false),
                ..SyncPreferencesUpdate::default()
            })
            .await
            .unwrap();
        tokio::time::sleep(DEFAULT_SYNC_INTERVAL * 2).await;
        assert_eq!(h.gateway.fetch_count(), 0);

        h.engine
            .configure_synchronization(SyncPreferencesUpdate {
                auto_sync: Some(true),
                interval: Some(Duration::from_secs(60)),
                ..SyncPreferencesUpdate::default()
            })
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(61)).await;
        wait_until(|| h.gateway.fetch_count() == 1).await;
    }

    #[tokio::test(start_paused = true)]
    async fn pending_video_is_not_dispatched_twice() {
        let h = harness().await;
        let v = video("busy");
        h.db.save_annotations(&v, &sample_timelines()).await.unwrap();
        h.gateway.hold_fetches_for(&v);
        h.scheduler.set_current_video(Some(v.clone()));

        assert!(h.scheduler.sync_current_video("test"));
        h.gateway.fetch_started().await;
        assert!(h.scheduler.is_pending(&v));
        assert!(!h.scheduler.sync_current_video("test"));
        assert_eq!(h.scheduler.sync_known_videos().await, 0);

        h.gateway.release_fetch();
        wait_until(|| !h.scheduler.is_pending(&v)).await;
        assert_eq!(h.gateway.fetch_count(), 1);
        assert_eq!(h.scheduler.sync_known_videos().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_ends_the_loop() {
        let h = harness().await;
        let handle = h.scheduler.start();
        h.scheduler.shutdown();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_a_running_sweep() {
        let h = harness().await;
        let videos = [video("first"), video("second"), video("third")];
        for v in &videos {
            h.db.save_annotations(v, &sample_timelines()).await.unwrap();
            h.gateway.hold_fetches_for(v);
        }

        assert_eq!(h.scheduler.sync_known_videos().await, 3);
        h.gateway.fetch_started().await;
        h.scheduler.shutdown();
        h.gateway.release_fetch();

        wait_until(|| videos.iter().all(|v| !h.scheduler.is_pending(v))).await;
        assert_eq!(h.gateway.fetch_count(), 1);
        let log = h.engine.error_log();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].error, SyncError::Cancelled);
    }
}
