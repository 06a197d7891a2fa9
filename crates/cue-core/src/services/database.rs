//! Shared database service wrapper used by the engine and the CLI.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::db::{
    AnnotationStore, Database, KeyValueStore, LibSqlAnnotationRepository,
    LibSqlKeyValueRepository,
};
use crate::models::{Timeline, VideoId};
use crate::Result;

/// Thread-safe service for DB and repository operations.
#[derive(Clone)]
pub struct DatabaseService {
    db: Arc<Mutex<Database>>,
    db_path: Option<PathBuf>,
}

impl DatabaseService {
    /// Open a database service at the given filesystem path.
    pub async fn open_path(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        tracing::debug!("Opening annotation database at {}", db_path.display());
        let db = Database::open(&db_path).await?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: Some(db_path),
        })
    }

    /// Open an in-memory database service (primarily for tests).
    pub async fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory().await?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: None,
        })
    }

    /// Path of the backing file, `None` when in memory.
    pub fn db_path(&self) -> Option<&PathBuf> {
        self.db_path.as_ref()
    }

    /// Load the annotation set for a video.
    pub async fn load_annotations(&self, video_id: &VideoId) -> Result<Option<Vec<Timeline>>> {
        let db = self.db.lock().await;
        let repo = LibSqlAnnotationRepository::new(db.connection());
        repo.load(video_id).await
    }

    /// Replace the annotation set for a video.
    pub async fn save_annotations(&self, video_id: &VideoId, timelines: &[Timeline]) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlAnnotationRepository::new(db.connection());
        repo.save(video_id, timelines).await
    }

    /// List videos with stored annotations.
    pub async fn video_ids(&self) -> Result<Vec<VideoId>> {
        let db = self.db.lock().await;
        let repo = LibSqlAnnotationRepository::new(db.connection());
        repo.video_ids().await
    }

    /// Read a persisted value.
    pub async fn get_value(&self, key: &str) -> Result<Option<String>> {
        let db = self.db.lock().await;
        let repo = LibSqlKeyValueRepository::new(db.connection());
        repo.get(key).await
    }

    /// Write a persisted value.
    pub async fn set_value(&self, key: &str, value: &str) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlKeyValueRepository::new(db.connection());
        repo.set(key, value).await
    }
}

#[async_trait]
impl AnnotationStore for DatabaseService {
    async fn load_annotations(&self, video_id: &VideoId) -> Result<Option<Vec<Timeline>>> {
        Self::load_annotations(self, video_id).await
    }

    async fn save_annotations(&self, video_id: &VideoId, timelines: &[Timeline]) -> Result<()> {
        Self::save_annotations(self, video_id, timelines).await
    }

    async fn video_ids(&self) -> Result<Vec<VideoId>> {
        Self::video_ids(self).await
    }
}

#[async_trait]
impl KeyValueStore for DatabaseService {
    async fn get_value(&self, key: &str) -> Result<Option<String>> {
        Self::get_value(self, key).await
    }

    async fn set_value(&self, key: &str, value: &str) -> Result<()> {
        Self::set_value(self, key, value).await
    }
}
