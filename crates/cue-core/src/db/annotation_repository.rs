//! Local annotation set repository

use crate::error::{Error, Result};
use crate::models::{Timeline, VideoId};
use libsql::{params, Connection};

/// libSQL storage of compact annotation sets, one JSON payload per video
pub struct LibSqlAnnotationRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlAnnotationRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Load the annotation set for a video, if one was ever stored
    pub async fn load(&self, video_id: &VideoId) -> Result<Option<Vec<Timeline>>> {
        let mut rows = self
            .conn
            .query(
                "SELECT payload FROM annotations WHERE video_id = ?",
                [video_id.as_str()],
            )
            .await?;

        let Some(row) = rows.next().await? else {
            return Ok(None);
        };
        let payload: String = row.get(0)?;
        Ok(Some(serde_json::from_str(&payload)?))
    }

    /// Replace the annotation set for a video
    pub async fn save(&self, video_id: &VideoId, timelines: &[Timeline]) -> Result<()> {
        let payload = serde_json::to_string(timelines)?;
        let now = chrono::Utc::now().timestamp_millis();

        self.conn
            .execute(
                "INSERT INTO annotations (video_id, payload, updated_at) VALUES (?, ?, ?)
                 ON CONFLICT(video_id) DO UPDATE SET payload = excluded.payload, updated_at = excluded.updated_at",
                params![video_id.as_str(), payload, now],
            )
            .await?;
        Ok(())
    }

    /// All videos with a stored annotation set, most recently updated first
    pub async fn video_ids(&self) -> Result<Vec<VideoId>> {
        let mut rows = self
            .conn
            .query(
                "SELECT video_id FROM annotations ORDER BY updated_at DESC, video_id ASC",
                (),
            )
            .await?;

        let mut ids = Vec::new();
        while let Some(row) = rows.next().await? {
            let raw: String = row.get(0)?;
            ids.push(
                VideoId::new(raw)
                    .map_err(|_| Error::Database("blank video id in annotations".into()))?,
            );
        }
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::{Stamp, Tag};

    async fn setup() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    fn sample_timelines() -> Vec<Timeline> {
        let tag = Tag::new("Serve", "#ff0000");
        vec![Timeline::new("Player A")
            .with_stamp(Stamp::new(&tag, 1.0, 4.0))
            .with_stamp(Stamp::new(&tag, 10.0, 12.0))]
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_load_missing_returns_none() {
        let db = setup().await;
        let repo = LibSqlAnnotationRepository::new(db.connection());

        let video = VideoId::new("unknown").unwrap();
        assert!(repo.load(&video).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_save_and_load() {
        let db = setup().await;
        let repo = LibSqlAnnotationRepository::new(db.connection());

        let video = VideoId::new("final-set-3").unwrap();
        let timelines = sample_timelines();
        repo.save(&video, &timelines).await.unwrap();

        let loaded = repo.load(&video).await.unwrap().unwrap();
        assert_eq!(loaded, timelines);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_save_replaces_existing_set() {
        let db = setup().await;
        let repo = LibSqlAnnotationRepository::new(db.connection());

        let video = VideoId::new("rally").unwrap();
        repo.save(&video, &sample_timelines()).await.unwrap();
        repo.save(&video, &[]).await.unwrap();

        let loaded = repo.load(&video).await.unwrap().unwrap();
        assert!(loaded.is_empty());
        assert_eq!(repo.video_ids().await.unwrap(), vec![video]);
    }
}
