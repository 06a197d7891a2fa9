//! Per-video sync bookkeeping

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted per video under `syncMetadata_<videoId>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncMetadata {
    /// Last successful sync of any direction
    pub last_sync_timestamp: DateTime<Utc>,
    /// Last time local annotations were edited
    pub last_local_modification: DateTime<Utc>,
    /// Incremented on every successful local-to-remote push
    pub sync_version: u64,
}

impl Default for SyncMetadata {
    fn default() -> Self {
        Self {
            last_sync_timestamp: DateTime::<Utc>::UNIX_EPOCH,
            last_local_modification: DateTime::<Utc>::UNIX_EPOCH,
            sync_version: 0,
        }
    }
}

impl SyncMetadata {
    /// Local edits happened after the last sync
    #[must_use]
    pub fn has_unsynced_local_changes(&self) -> bool {
        self.last_local_modification > self.last_sync_timestamp
    }

    /// Record a successful sync; `pushed` bumps the version
    pub fn record_sync(&mut self, at: DateTime<Utc>, pushed: bool) {
        self.last_sync_timestamp = at;
        if pushed {
            self.sync_version = self.sync_version.saturating_add(1);
        }
    }

    pub fn record_local_modification(&mut self, at: DateTime<Utc>) {
        self.last_local_modification = at;
    }
}
