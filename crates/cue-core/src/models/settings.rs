//! Synchronization preferences

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::Error;

/// Auto-sync interval used when none (or zero) is configured
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(5 * 60);
/// Retry count used when none (or zero) is configured
pub const DEFAULT_RETRY_COUNT: u32 = 3;
/// Gateway call timeout used when none (or zero) is configured
pub const DEFAULT_SYNC_TIMEOUT: Duration = Duration::from_secs(30);

/// How a detected conflict is reconciled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ConflictPolicy {
    /// Local wins, overwriting remote
    #[default]
    UseLocal,
    /// Remote wins, overwriting local
    UseRemote,
    /// Field-level merge, applied locally and pushed
    Merge,
    /// Defer to an explicit resolve call
    AskUser,
}

impl ConflictPolicy {
    pub const ALL: [Self; 4] = [Self::UseLocal, Self::UseRemote, Self::Merge, Self::AskUser];

    /// Persisted name of the policy
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UseLocal => "useLocal",
            Self::UseRemote => "useRemote",
            Self::Merge => "merge",
            Self::AskUser => "askUser",
        }
    }
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConflictPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|policy| policy.as_str() == s.trim())
            .ok_or_else(|| Error::InvalidInput(format!("unknown conflict policy '{s}'")))
    }
}

/// Process-wide synchronization preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncPreferences {
    /// Whether the periodic and event-driven auto-sync runs
    pub auto_sync_enabled: bool,
    /// Period of the auto-sync timer
    pub interval: Duration,
    /// Persisted for clients; no retry loop consults it
    pub retry_count: u32,
    /// Upper bound for a single gateway call
    pub timeout: Duration,
    pub conflict_policy: ConflictPolicy,
}

impl Default for SyncPreferences {
    fn default() -> Self {
        Self {
            auto_sync_enabled: true,
            interval: DEFAULT_SYNC_INTERVAL,
            retry_count: DEFAULT_RETRY_COUNT,
            timeout: DEFAULT_SYNC_TIMEOUT,
            conflict_policy: ConflictPolicy::UseLocal,
        }
    }
}

impl SyncPreferences {
    /// Reinterpret zero values as their defaults
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if self.interval.is_zero() {
            self.interval = DEFAULT_SYNC_INTERVAL;
        }
        if self.retry_count == 0 {
            self.retry_count = DEFAULT_RETRY_COUNT;
        }
        if self.timeout.is_zero() {
            self.timeout = DEFAULT_SYNC_TIMEOUT;
        }
        self
    }
}

/// Partial update applied by `configure_synchronization`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncPreferencesUpdate {
    pub auto_sync: Option<bool>,
    pub interval: Option<Duration>,
    pub conflict_policy: Option<ConflictPolicy>,
    pub retry_count: Option<u32>,
}

impl SyncPreferencesUpdate {
    /// Overlay the provided fields onto `preferences`
    #[must_use]
    pub fn apply_to(self, preferences: SyncPreferences) -> SyncPreferences {
        SyncPreferences {
            auto_sync_enabled: self.auto_sync.unwrap_or(preferences.auto_sync_enabled),
            interval: self.interval.unwrap_or(preferences.interval),
            retry_count: self.retry_count.unwrap_or(preferences.retry_count),
            timeout: preferences.timeout,
            conflict_policy: self.conflict_policy.unwrap_or(preferences.conflict_policy),
        }
        .normalized()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.auto_sync.is_none()
            && self.interval.is_none()
            && self.conflict_policy.is_none()
            && self.retry_count.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preferences_default() {
        let preferences = SyncPreferences::default();
        assert!(preferences.auto_sync_enabled);
        assert_eq!(preferences.interval, Duration::from_secs(300));
        assert_eq!(preferences.retry_count, 3);
        assert_eq!(preferences.conflict_policy, ConflictPolicy::UseLocal);
    }

    #[test]
    fn test_zero_values_fall_back_to_defaults() {
        let preferences = SyncPreferences {
            interval: Duration::ZERO,
            retry_count: 0,
            timeout: Duration::ZERO,
            ..SyncPreferences::default()
        }
        .normalized();
        assert_eq!(preferences.interval, DEFAULT_SYNC_INTERVAL);
        assert_eq!(preferences.retry_count, DEFAULT_RETRY_COUNT);
        assert_eq!(preferences.timeout, DEFAULT_SYNC_TIMEOUT);
    }

    #[test]
    fn test_policy_names_round_trip() {
        for policy in ConflictPolicy::ALL {
            assert_eq!(policy.as_str().parse::<ConflictPolicy>().unwrap(), policy);
            assert_eq!(
                serde_json::to_string(&policy).unwrap(),
                format!("\"{}\"", policy.as_str())
            );
        }
        assert!("lastWriterWins".parse::<ConflictPolicy>().is_err());
    }

    #[test]
    fn test_update_overlays_only_given_fields() {
        let update = SyncPreferencesUpdate {
            conflict_policy: Some(ConflictPolicy::Merge),
            interval: Some(Duration::ZERO),
            ..SyncPreferencesUpdate::default()
        };
        let preferences = update.apply_to(SyncPreferences::default());
        assert_eq!(preferences.conflict_policy, ConflictPolicy::Merge);
        assert_eq!(preferences.interval, DEFAULT_SYNC_INTERVAL);
        assert!(preferences.auto_sync_enabled);
        assert!(SyncPreferencesUpdate::default().is_empty());
    }
}
