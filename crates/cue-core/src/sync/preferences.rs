//! Persistence of synchronization preferences

use std::sync::Arc;
use std::time::Duration;

use crate::db::KeyValueStore;
use crate::models::{ConflictPolicy, SyncPreferences};
use crate::Result;

pub const AUTO_SYNC_ENABLED_KEY: &str = "autoSyncEnabled";
pub const SYNC_INTERVAL_KEY: &str = "syncInterval";
pub const SYNC_RETRY_COUNT_KEY: &str = "syncRetryCount";
pub const SYNC_TIMEOUT_KEY: &str = "syncTimeout";
pub const CONFLICT_POLICY_KEY: &str = "conflictResolutionPolicy";

/// Scalar preference keys in the key-value store
#[derive(Clone)]
pub struct PreferencesStore {
    store: Arc<dyn KeyValueStore>,
}

impl PreferencesStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Load preferences; missing or invalid values use their defaults
    pub async fn load(&self) -> Result<SyncPreferences> {
        let mut preferences = SyncPreferences::default();

        if let Some(value) = self.store.get_value(AUTO_SYNC_ENABLED_KEY).await? {
            preferences.auto_sync_enabled = !matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "0" | "false" | "no" | "off"
            );
        }

        if let Some(secs) = self.load_u64(SYNC_INTERVAL_KEY).await? {
            preferences.interval = Duration::from_secs(secs);
        }

        if let Some(count) = self.load_u64(SYNC_RETRY_COUNT_KEY).await? {
            preferences.retry_count = u32::try_from(count).unwrap_or(u32::MAX);
        }

        if let Some(secs) = self.load_u64(SYNC_TIMEOUT_KEY).await? {
            preferences.timeout = Duration::from_secs(secs);
        }

        if let Some(value) = self.store.get_value(CONFLICT_POLICY_KEY).await? {
            match value.parse::<ConflictPolicy>() {
                Ok(policy) => preferences.conflict_policy = policy,
                Err(error) => tracing::warn!(%error, "Ignoring persisted conflict policy"),
            }
        }

        Ok(preferences.normalized())
    }

    pub async fn save(&self, preferences: &SyncPreferences) -> Result<()> {
        self.store
            .set_value(
                AUTO_SYNC_ENABLED_KEY,
                if preferences.auto_sync_enabled {
                    "true"
                } else {
                    "false"
                },
            )
            .await?;
        self.store
            .set_value(
                SYNC_INTERVAL_KEY,
                &preferences.interval.as_secs().to_string(),
            )
            .await?;
        self.store
            .set_value(SYNC_RETRY_COUNT_KEY, &preferences.retry_count.to_string())
            .await?;
        self.store
            .set_value(SYNC_TIMEOUT_KEY, &preferences.timeout.as_secs().to_string())
            .await?;
        self.store
            .set_value(CONFLICT_POLICY_KEY, preferences.conflict_policy.as_str())
            .await?;
        Ok(())
    }

    async fn load_u64(&self, key: &str) -> Result<Option<u64>> {
        let Some(value) = self.store.get_value(key).await? else {
            return Ok(None);
        };
        match value.trim().parse() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(_) => {
                tracing::warn!(key, %value, "Ignoring non-numeric preference");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DEFAULT_SYNC_INTERVAL;
    use crate::services::DatabaseService;

    async fn setup() -> (DatabaseService, PreferencesStore) {
        let db = DatabaseService::open_in_memory().await.unwrap();
        let store = PreferencesStore::new(Arc::new(db.clone()));
        (db, store)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_load_defaults() {
        let (_db, store) = setup().await;
        assert_eq!(store.load().await.unwrap(), SyncPreferences::default());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_save_and_load() {
        let (_db, store) = setup().await;
        let preferences = SyncPreferences {
            auto_sync_enabled: false,
            interval: Duration::from_secs(90),
            retry_count: 5,
            timeout: Duration::from_secs(10),
            conflict_policy: ConflictPolicy::AskUser,
        };

        store.save(&preferences).await.unwrap();
        assert_eq!(store.load().await.unwrap(), preferences);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_zero_and_invalid_values_fall_back() {
        let (db, store) = setup().await;
        db.set_value(SYNC_INTERVAL_KEY, "0").await.unwrap();
        db.set_value(SYNC_RETRY_COUNT_KEY, "many").await.unwrap();
        db.set_value(CONFLICT_POLICY_KEY, "coinFlip").await.unwrap();

        let preferences = store.load().await.unwrap();
        assert_eq!(preferences.interval, DEFAULT_SYNC_INTERVAL);
        assert_eq!(preferences.retry_count, 3);
        assert_eq!(preferences.conflict_policy, ConflictPolicy::UseLocal);
    }
}
