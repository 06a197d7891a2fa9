//! Observable sync state.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::models::VideoId;

/// Lifecycle of a single engine invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SyncPhase {
    #[default]
    Idle,
    Syncing,
    Completed,
    Failed,
}

/// Engine operations that take the single-flight guard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SyncOperation {
    Synchronize,
    ForceUpload,
    ForceDownload,
    ResolveConflict,
}

impl SyncOperation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Synchronize => "synchronize",
            Self::ForceUpload => "force_upload",
            Self::ForceDownload => "force_download",
            Self::ResolveConflict => "resolve_conflict",
        }
    }
}

impl fmt::Display for SyncOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot published to status observers.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct SyncStatus {
    pub phase: SyncPhase,
    /// 0.0 to 1.0 while syncing
    pub progress: f64,
    /// Human-readable description of the current step
    pub message: String,
    /// Video of the current or most recent operation
    pub video_id: Option<VideoId>,
    /// A conflict awaits `resolve_conflict`
    pub conflict_detected: bool,
    /// Completion time of the most recent successful operation
    pub last_sync: Option<DateTime<Utc>>,
}

impl SyncStatus {
    pub const fn is_syncing(&self) -> bool {
        matches!(self.phase, SyncPhase::Syncing)
    }
}
