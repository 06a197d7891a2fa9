//! Storage seams consumed by the sync engine

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Timeline, VideoId};

/// Local annotation sets, keyed by video
#[async_trait]
pub trait AnnotationStore: Send + Sync {
    /// `None` when no annotation set was ever stored for the video
    async fn load_annotations(&self, video_id: &VideoId) -> Result<Option<Vec<Timeline>>>;

    /// Replace the annotation set for the video
    async fn save_annotations(&self, video_id: &VideoId, timelines: &[Timeline]) -> Result<()>;

    /// Every video with a stored annotation set
    async fn video_ids(&self) -> Result<Vec<VideoId>>;
}

/// Persisted string key-value state
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get_value(&self, key: &str) -> Result<Option<String>>;

    async fn set_value(&self, key: &str, value: &str) -> Result<()>;
}
