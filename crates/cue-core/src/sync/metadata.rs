//! Persisted per-video sync metadata

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex as AsyncMutex;

use crate::db::KeyValueStore;
use crate::models::{SyncMetadata, VideoId};
use crate::Result;

const METADATA_KEY_PREFIX: &str = "syncMetadata_";

/// Key a video's metadata record is stored under
#[must_use]
pub fn metadata_key(video_id: &VideoId) -> String {
    format!("{METADATA_KEY_PREFIX}{video_id}")
}

/// JSON records in the key-value store, one per video.
///
/// Updates to one video's record are serialized, so a sync commit and a
/// local modification mark never overwrite each other.
#[derive(Clone)]
pub struct SyncMetadataStore {
    store: Arc<dyn KeyValueStore>,
    locks: Arc<Mutex<HashMap<VideoId, Arc<AsyncMutex<()>>>>>,
}

impl SyncMetadataStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            locks: Arc::default(),
        }
    }

    fn video_lock(&self, video_id: &VideoId) -> Arc<AsyncMutex<()>> {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(video_id.clone())
            .or_default()
            .clone()
    }

    /// Stored record, `None` if the video was never synced.
    ///
    /// An unreadable record is logged and treated as missing.
    pub async fn load(&self, video_id: &VideoId) -> Result<Option<SyncMetadata>> {
        let Some(raw) = self.store.get_value(&metadata_key(video_id)).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(metadata) => Ok(Some(metadata)),
            Err(error) => {
                tracing::warn!(%video_id, %error, "Discarding unreadable sync metadata");
                Ok(None)
            }
        }
    }

    /// Stored record, creating and persisting a fresh one if missing
    pub async fn load_or_create(&self, video_id: &VideoId) -> Result<SyncMetadata> {
        let lock = self.video_lock(video_id);
        let _held = lock.lock().await;
        self.load_or_create_unlocked(video_id).await
    }

    async fn load_or_create_unlocked(&self, video_id: &VideoId) -> Result<SyncMetadata> {
        if let Some(metadata) = self.load(video_id).await? {
            return Ok(metadata);
        }
        let metadata = SyncMetadata::default();
        self.save(video_id, &metadata).await?;
        tracing::debug!(%video_id, "Created sync metadata");
        Ok(metadata)
    }

    async fn save(&self, video_id: &VideoId, metadata: &SyncMetadata) -> Result<()> {
        let raw = serde_json::to_string(metadata)?;
        self.store.set_value(&metadata_key(video_id), &raw).await
    }

    /// Commit a successful sync at `at`
    pub async fn record_sync(
        &self,
        video_id: &VideoId,
        at: DateTime<Utc>,
        pushed: bool,
    ) -> Result<SyncMetadata> {
        let lock = self.video_lock(video_id);
        let _held = lock.lock().await;
        let mut metadata = self.load_or_create_unlocked(video_id).await?;
        metadata.record_sync(at, pushed);
        self.save(video_id, &metadata).await?;
        Ok(metadata)
    }

    pub async fn record_local_modification(
        &self,
        video_id: &VideoId,
        at: DateTime<Utc>,
    ) -> Result<SyncMetadata> {
        let lock = self.video_lock(video_id);
        let _held = lock.lock().await;
        let mut metadata = self.load_or_create_unlocked(video_id).await?;
        metadata.record_local_modification(at);
        self.save(video_id, &metadata).await?;
        Ok(metadata)
    }
}
