//! Sync engine: reconciles a video's local annotation set with the remote copy.
//!
//! Every operation runs the same pipeline: take the single-flight guard, load
//! local data, fetch remote, decide a direction (upload, apply remote, merge, or
//! hand the conflict back to the caller), then commit sync metadata and publish
//! the outcome. Annotations are not written and sync metadata is not committed
//! before the direction is decided, so a failed fetch or detection leaves both
//! sides as they were. Definitions learned from a fetched remote set are added to the
//! persisted tag library right away, whatever the run's outcome.
//!
//! The remote set of the latest fetch stays cached only while that video has a
//! conflict waiting for [`SyncEngine::resolve_conflict`].

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::{watch, RwLock};
use tokio_util::sync::CancellationToken;

use crate::db::{AnnotationStore, KeyValueStore};
use crate::models::{
    compact_timelines, expand_timelines, ConflictPolicy, ExpandedTimeline, SyncMetadata,
    SyncPreferences, SyncPreferencesUpdate, TagLibrary, Timeline, VideoId,
};
use crate::state::{SyncOperation, SyncPhase, SyncStatus};

use super::conflict::detect_conflicts;
use super::error::{SyncError, SyncResult};
use super::events::{EventBus, SyncEvent};
use super::gateway::RemoteGateway;
use super::merge::merge_timelines;
use super::metadata::SyncMetadataStore;
use super::preferences::PreferencesStore;

/// Key-value entry holding the serialized [`TagLibrary`]
pub const TAG_LIBRARY_KEY: &str = "tagLibrary";

/// How far the single-flight guard reaches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlightScope {
    /// One operation at a time across every video
    #[default]
    Global,
    /// One operation at a time per video
    PerVideo,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EngineOptions {
    pub flight_scope: FlightScope,
    /// Used instead of the persisted conflict policy
    pub conflict_policy: Option<ConflictPolicy>,
}

/// Direction a successful operation took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Local annotations were uploaded unchanged
    PushedLocal,
    /// Remote annotations replaced the local set
    AppliedRemote,
    /// The merged set was stored locally and uploaded
    Merged,
}

impl SyncOutcome {
    pub const fn pushed(self) -> bool {
        matches!(self, Self::PushedLocal | Self::Merged)
    }
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PushedLocal => "uploaded local annotations",
            Self::AppliedRemote => "applied remote annotations",
            Self::Merged => "merged local and remote annotations",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    pub video_id: VideoId,
    pub operation: SyncOperation,
    pub outcome: SyncOutcome,
    /// Metadata as committed by the operation
    pub metadata: SyncMetadata,
}

/// Entry of the append-only error log
#[derive(Debug, Clone, PartialEq)]
pub struct SyncErrorRecord {
    pub video_id: VideoId,
    pub operation: SyncOperation,
    pub error: SyncError,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Clone, Copy)]
enum Request {
    Synchronize,
    ForceUpload,
    ForceDownload,
    Resolve(ConflictPolicy),
}

impl Request {
    const fn operation(self) -> SyncOperation {
        match self {
            Self::Synchronize => SyncOperation::Synchronize,
            Self::ForceUpload => SyncOperation::ForceUpload,
            Self::ForceDownload => SyncOperation::ForceDownload,
            Self::Resolve(_) => SyncOperation::ResolveConflict,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum FlightKey {
    Global,
    Video(VideoId),
}

#[derive(Default)]
struct EngineState {
    in_flight: HashSet<FlightKey>,
    /// Remote set from the most recent fetch, kept for flagged conflicts
    remote_snapshots: HashMap<VideoId, Vec<Timeline>>,
    /// Videos whose conflict awaits `resolve_conflict`
    conflicts: HashSet<VideoId>,
    error_log: Vec<SyncErrorRecord>,
}

fn lock(state: &Mutex<EngineState>) -> MutexGuard<'_, EngineState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Releases the single-flight slot when the operation returns or is dropped
struct FlightGuard {
    state: Arc<Mutex<EngineState>>,
    key: FlightKey,
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        lock(&self.state).in_flight.remove(&self.key);
    }
}

/// Orchestrates synchronization for every video.
///
/// Cheap to clone; clones share state, the single-flight guard, and channels.
#[derive(Clone)]
pub struct SyncEngine {
    gateway: Arc<dyn RemoteGateway>,
    annotations: Arc<dyn AnnotationStore>,
    settings: Arc<dyn KeyValueStore>,
    metadata: SyncMetadataStore,
    preferences_store: PreferencesStore,
    library: Arc<RwLock<TagLibrary>>,
    state: Arc<Mutex<EngineState>>,
    status: Arc<watch::Sender<SyncStatus>>,
    preferences: Arc<watch::Sender<SyncPreferences>>,
    events: EventBus,
    options: EngineOptions,
}

impl SyncEngine {
    pub async fn new(
        gateway: Arc<dyn RemoteGateway>,
        annotations: Arc<dyn AnnotationStore>,
        settings: Arc<dyn KeyValueStore>,
        events: EventBus,
    ) -> crate::Result<Self> {
        Self::with_options(gateway, annotations, settings, events, EngineOptions::default()).await
    }

    /// Build an engine, loading persisted preferences and the tag library
    pub async fn with_options(
        gateway: Arc<dyn RemoteGateway>,
        annotations: Arc<dyn AnnotationStore>,
        settings: Arc<dyn KeyValueStore>,
        events: EventBus,
        options: EngineOptions,
    ) -> crate::Result<Self> {
        let preferences_store = PreferencesStore::new(settings.clone());
        let preferences = preferences_store.load().await?;
        let library = load_tag_library(settings.as_ref()).await?;

        tracing::debug!(
            auto_sync = preferences.auto_sync_enabled,
            interval_secs = preferences.interval.as_secs(),
            policy = %preferences.conflict_policy,
            flight_scope = ?options.flight_scope,
            "Sync engine ready"
        );

        Ok(Self {
            gateway,
            annotations,
            metadata: SyncMetadataStore::new(settings.clone()),
            settings,
            preferences_store,
            library: Arc::new(RwLock::new(library)),
            state: Arc::new(Mutex::new(EngineState::default())),
            status: Arc::new(watch::channel(SyncStatus::default()).0),
            preferences: Arc::new(watch::channel(preferences).0),
            events,
            options,
        })
    }

    /// Reconcile local and remote annotations for the video
    pub async fn synchronize(
        &self,
        video_id: &VideoId,
        cancel: &CancellationToken,
    ) -> SyncResult<SyncReport> {
        self.execute(video_id, Request::Synchronize, cancel).await
    }

    /// Upload local annotations without looking for conflicts
    pub async fn force_upload_local_changes(
        &self,
        video_id: &VideoId,
        cancel: &CancellationToken,
    ) -> SyncResult<SyncReport> {
        self.execute(video_id, Request::ForceUpload, cancel).await
    }

    /// Replace local annotations with the remote set without looking for conflicts
    pub async fn force_download_remote_changes(
        &self,
        video_id: &VideoId,
        cancel: &CancellationToken,
    ) -> SyncResult<SyncReport> {
        self.execute(video_id, Request::ForceDownload, cancel).await
    }

    /// Settle a flagged conflict against the cached remote snapshot
    pub async fn resolve_conflict(
        &self,
        video_id: &VideoId,
        policy: ConflictPolicy,
        cancel: &CancellationToken,
    ) -> SyncResult<SyncReport> {
        self.execute(video_id, Request::Resolve(policy), cancel).await
    }

    /// Update and persist preferences; the scheduler follows the change
    pub async fn configure_synchronization(
        &self,
        update: SyncPreferencesUpdate,
    ) -> crate::Result<SyncPreferences> {
        let preferences = update.apply_to(self.preferences());
        self.preferences_store.save(&preferences).await?;
        self.preferences.send_replace(preferences);
        tracing::info!(
            auto_sync = preferences.auto_sync_enabled,
            interval_secs = preferences.interval.as_secs(),
            retry_count = preferences.retry_count,
            policy = %preferences.conflict_policy,
            "Synchronization configured"
        );
        Ok(preferences)
    }

    /// Record that the video's local annotations changed now
    pub async fn mark_local_modification(&self, video_id: &VideoId) -> crate::Result<SyncMetadata> {
        let metadata = self
            .metadata
            .record_local_modification(video_id, Utc::now())
            .await?;
        tracing::debug!(%video_id, "Local modification recorded");
        Ok(metadata)
    }

    pub async fn sync_metadata(&self, video_id: &VideoId) -> crate::Result<Option<SyncMetadata>> {
        self.metadata.load(video_id).await
    }

    /// Videos with a local annotation set
    pub async fn known_videos(&self) -> crate::Result<Vec<VideoId>> {
        self.annotations.video_ids().await
    }

    pub fn preferences(&self) -> SyncPreferences {
        *self.preferences.borrow()
    }

    pub fn subscribe_preferences(&self) -> watch::Receiver<SyncPreferences> {
        self.preferences.subscribe()
    }

    pub fn status(&self) -> SyncStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub const fn flight_scope(&self) -> FlightScope {
        self.options.flight_scope
    }

    pub fn is_conflict_flagged(&self, video_id: &VideoId) -> bool {
        lock(&self.state).conflicts.contains(video_id)
    }

    pub fn error_log(&self) -> Vec<SyncErrorRecord> {
        lock(&self.state).error_log.clone()
    }

    pub fn clear_error_log(&self) {
        lock(&self.state).error_log.clear();
    }

    pub async fn tag_library(&self) -> TagLibrary {
        self.library.read().await.clone()
    }

    #[cfg(test)]
    fn has_remote_snapshot(&self, video_id: &VideoId) -> bool {
        lock(&self.state).remote_snapshots.contains_key(video_id)
    }

    async fn execute(
        &self,
        video_id: &VideoId,
        request: Request,
        cancel: &CancellationToken,
    ) -> SyncResult<SyncReport> {
        let operation = request.operation();
        let Some(_guard) = self.try_acquire(video_id) else {
            tracing::debug!(%video_id, %operation, "Sync already in progress");
            return Err(SyncError::AlreadyInProgress);
        };

        tracing::info!(%video_id, %operation, "Sync operation started");
        self.begin(video_id);

        let result = match request {
            Request::Synchronize => self.run_synchronize(video_id, cancel).await,
            Request::ForceUpload => self.run_force_upload(video_id, cancel).await,
            Request::ForceDownload => self.run_force_download(video_id, cancel).await,
            Request::Resolve(policy) => self.run_resolve(video_id, policy, cancel).await,
        };

        match result {
            Ok((outcome, metadata)) => {
                let report = SyncReport {
                    video_id: video_id.clone(),
                    operation,
                    outcome,
                    metadata,
                };
                self.complete(&report);
                Ok(report)
            }
            Err(error) => {
                self.fail(video_id, operation, &error);
                Err(error)
            }
        }
    }

    async fn run_synchronize(
        &self,
        video_id: &VideoId,
        cancel: &CancellationToken,
    ) -> SyncResult<(SyncOutcome, SyncMetadata)> {
        let local = self.load_local(video_id).await?;
        let metadata = self.metadata.load_or_create(video_id).await?;
        let remote = self.fetch_remote(video_id, cancel).await?;

        if remote.is_empty() {
            tracing::info!(%video_id, "Remote is empty; uploading local annotations");
            return self.push(video_id, &local, cancel).await;
        }

        self.set_progress(0.5, "Comparing local and remote annotations");
        if !detect_conflicts(&local, &remote) {
            return if metadata.has_unsynced_local_changes() {
                tracing::info!(%video_id, "No conflict; local changes are newer, uploading");
                self.push(video_id, &local, cancel).await
            } else {
                tracing::info!(%video_id, "No conflict; applying remote annotations");
                self.apply_remote(video_id, &remote, cancel).await
            };
        }

        let policy = self
            .options
            .conflict_policy
            .unwrap_or(self.preferences().conflict_policy);
        tracing::info!(%video_id, %policy, "Conflict detected");
        self.resolve_with(video_id, policy, local, remote, cancel)
            .await
    }

    async fn run_force_upload(
        &self,
        video_id: &VideoId,
        cancel: &CancellationToken,
    ) -> SyncResult<(SyncOutcome, SyncMetadata)> {
        let local = self.load_local(video_id).await?;
        self.push(video_id, &local, cancel).await
    }

    async fn run_force_download(
        &self,
        video_id: &VideoId,
        cancel: &CancellationToken,
    ) -> SyncResult<(SyncOutcome, SyncMetadata)> {
        let remote = self.fetch_remote(video_id, cancel).await?;
        self.apply_remote(video_id, &remote, cancel).await
    }

    async fn run_resolve(
        &self,
        video_id: &VideoId,
        policy: ConflictPolicy,
        cancel: &CancellationToken,
    ) -> SyncResult<(SyncOutcome, SyncMetadata)> {
        let remote = {
            let state = lock(&self.state);
            if !state.conflicts.contains(video_id) {
                return Err(SyncError::InvalidData(format!(
                    "no conflict is flagged for video {video_id}"
                )));
            }
            state.remote_snapshots.get(video_id).cloned()
        }
        .ok_or_else(|| {
            SyncError::InvalidData(format!("no cached remote snapshot for video {video_id}"))
        })?;

        let local = self.load_local(video_id).await?;
        tracing::info!(%video_id, %policy, "Resolving conflict");
        self.resolve_with(video_id, policy, local, remote, cancel)
            .await
    }

    async fn resolve_with(
        &self,
        video_id: &VideoId,
        policy: ConflictPolicy,
        local: Vec<Timeline>,
        remote: Vec<Timeline>,
        cancel: &CancellationToken,
    ) -> SyncResult<(SyncOutcome, SyncMetadata)> {
        match policy {
            ConflictPolicy::UseLocal => self.push(video_id, &local, cancel).await,
            ConflictPolicy::UseRemote => self.apply_remote(video_id, &remote, cancel).await,
            ConflictPolicy::Merge => {
                let merged = merge_timelines(&local, &remote);
                ensure_active(cancel)?;
                self.set_progress(0.6, "Saving merged annotations");
                self.annotations.save_annotations(video_id, &merged).await?;
                self.upload(video_id, &merged).await?;
                let metadata = self.commit(video_id, true).await?;
                Ok((SyncOutcome::Merged, metadata))
            }
            ConflictPolicy::AskUser => {
                lock(&self.state).conflicts.insert(video_id.clone());
                self.status.send_modify(|status| status.conflict_detected = true);
                Err(SyncError::MergeConflict { local, remote })
            }
        }
    }

    async fn push(
        &self,
        video_id: &VideoId,
        local: &[Timeline],
        cancel: &CancellationToken,
    ) -> SyncResult<(SyncOutcome, SyncMetadata)> {
        ensure_active(cancel)?;
        self.upload(video_id, local).await?;
        let metadata = self.commit(video_id, true).await?;
        Ok((SyncOutcome::PushedLocal, metadata))
    }

    async fn apply_remote(
        &self,
        video_id: &VideoId,
        remote: &[Timeline],
        cancel: &CancellationToken,
    ) -> SyncResult<(SyncOutcome, SyncMetadata)> {
        ensure_active(cancel)?;
        self.set_progress(0.7, "Applying remote annotations");
        self.annotations.save_annotations(video_id, remote).await?;
        let metadata = self.commit(video_id, false).await?;
        Ok((SyncOutcome::AppliedRemote, metadata))
    }

    async fn load_local(&self, video_id: &VideoId) -> SyncResult<Vec<Timeline>> {
        self.set_progress(0.1, "Loading local annotations");
        self.annotations
            .load_annotations(video_id)
            .await?
            .ok_or(SyncError::NoLocalData)
    }

    async fn fetch_remote(
        &self,
        video_id: &VideoId,
        cancel: &CancellationToken,
    ) -> SyncResult<Vec<Timeline>> {
        ensure_active(cancel)?;
        self.set_progress(0.25, "Fetching remote annotations");
        let limit = self.preferences().timeout;
        let fetched = tokio::time::timeout(limit, self.gateway.fetch(video_id))
            .await
            .map_err(|_| SyncError::timed_out("fetch", limit))?
            .map_err(SyncError::from_fetch)?;
        ensure_active(cancel)?;

        self.learn_definitions(&fetched).await?;
        let remote = compact_timelines(&fetched);
        lock(&self.state)
            .remote_snapshots
            .insert(video_id.clone(), remote.clone());
        tracing::debug!(%video_id, timelines = remote.len(), "Fetched remote annotations");
        Ok(remote)
    }

    async fn upload(&self, video_id: &VideoId, timelines: &[Timeline]) -> SyncResult<()> {
        self.set_progress(0.75, "Uploading annotations");
        let expanded = {
            let library = self.library.read().await;
            expand_timelines(timelines, &library)
        };
        let limit = self.preferences().timeout;
        tokio::time::timeout(limit, self.gateway.upload(video_id, &expanded))
            .await
            .map_err(|_| SyncError::timed_out("upload", limit))?
            .map_err(SyncError::from_upload)?;
        tracing::debug!(%video_id, timelines = expanded.len(), "Uploaded annotations");
        Ok(())
    }

    async fn commit(&self, video_id: &VideoId, pushed: bool) -> SyncResult<SyncMetadata> {
        self.set_progress(0.9, "Saving sync metadata");
        Ok(self
            .metadata
            .record_sync(video_id, Utc::now(), pushed)
            .await?)
    }

    /// Keep definitions seen in remote data so later uploads expand them fully
    async fn learn_definitions(&self, fetched: &[ExpandedTimeline]) -> SyncResult<()> {
        let serialized = {
            let mut library = self.library.write().await;
            let learned = library.absorb(fetched);
            if learned == 0 {
                return Ok(());
            }
            tracing::debug!(learned, "Learned definitions from remote annotations");
            serde_json::to_string(&*library).map_err(crate::Error::from)?
        };
        self.settings
            .set_value(TAG_LIBRARY_KEY, &serialized)
            .await?;
        Ok(())
    }

    fn try_acquire(&self, video_id: &VideoId) -> Option<FlightGuard> {
        let key = match self.options.flight_scope {
            FlightScope::Global => FlightKey::Global,
            FlightScope::PerVideo => FlightKey::Video(video_id.clone()),
        };
        if !lock(&self.state).in_flight.insert(key.clone()) {
            return None;
        }
        Some(FlightGuard {
            state: self.state.clone(),
            key,
        })
    }

    fn begin(&self, video_id: &VideoId) {
        self.status.send_modify(|status| {
            status.phase = SyncPhase::Syncing;
            status.progress = 0.0;
            status.message = "Starting synchronization".to_string();
            status.video_id = Some(video_id.clone());
        });
    }

    fn set_progress(&self, progress: f64, message: &str) {
        self.status.send_modify(|status| {
            status.progress = progress;
            status.message = message.to_string();
        });
    }

    fn complete(&self, report: &SyncReport) {
        let conflict_detected = {
            let mut state = lock(&self.state);
            state.conflicts.remove(&report.video_id);
            state.remote_snapshots.remove(&report.video_id);
            !state.conflicts.is_empty()
        };
        self.status.send_modify(|status| {
            status.phase = SyncPhase::Completed;
            status.progress = 1.0;
            status.message = report.outcome.to_string();
            status.conflict_detected = conflict_detected;
            status.last_sync = Some(report.metadata.last_sync_timestamp);
        });
        tracing::info!(
            video_id = %report.video_id,
            operation = %report.operation,
            outcome = %report.outcome,
            sync_version = report.metadata.sync_version,
            "Sync operation completed"
        );
        self.events.publish(SyncEvent::SyncCompleted {
            video_id: report.video_id.clone(),
            outcome: report.outcome,
        });
    }

    fn fail(&self, video_id: &VideoId, operation: SyncOperation, error: &SyncError) {
        let conflict_detected = {
            let mut state = lock(&self.state);
            state.error_log.push(SyncErrorRecord {
                video_id: video_id.clone(),
                operation,
                error: error.clone(),
                occurred_at: Utc::now(),
            });
            if !state.conflicts.contains(video_id) {
                state.remote_snapshots.remove(video_id);
            }
            !state.conflicts.is_empty()
        };
        self.status.send_modify(|status| {
            status.phase = SyncPhase::Failed;
            status.message = error.to_string();
            status.conflict_detected = conflict_detected;
        });
        tracing::warn!(%video_id, %operation, kind = error.kind(), %error, "Sync operation failed");
        self.events.publish(SyncEvent::SyncFailed {
            video_id: video_id.clone(),
            error: error.clone(),
        });
    }
}

fn ensure_active(cancel: &CancellationToken) -> SyncResult<()> {
    if cancel.is_cancelled() {
        return Err(SyncError::Cancelled);
    }
    Ok(())
}

async fn load_tag_library(settings: &dyn KeyValueStore) -> crate::Result<TagLibrary> {
    let Some(raw) = settings.get_value(TAG_LIBRARY_KEY).await? else {
        return Ok(TagLibrary::new());
    };
    match serde_json::from_str(&raw) {
        Ok(library) => Ok(library),
        Err(error) => {
            tracing::warn!(%error, "Discarding unreadable tag library");
            Ok(TagLibrary::new())
        }
    }
}
