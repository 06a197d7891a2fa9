use std::io;

use cue_core::sync::SyncError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] cue_core::Error),
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("No local annotations for video {0}")]
    NoLocalData(String),
    #[error("Failed to read {path}: {message}")]
    ImportFailed { path: String, message: String },
    #[error("Scheduler task failed: {0}")]
    Scheduler(String),
}
