//! Sync error taxonomy

use std::time::Duration;

use thiserror::Error;

use crate::models::Timeline;

/// Result type alias for sync operations
pub type SyncResult<T> = std::result::Result<T, SyncError>;

/// Failures reported by the remote gateway
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("network error: {0}")]
    Network(String),
    #[error("could not decode response: {0}")]
    Decoding(String),
    #[error("server error {code}: {message}")]
    Server { code: u16, message: String },
    #[error("unauthorized")]
    Unauthorized,
    #[error("{0}")]
    Other(String),
}

/// Failures of a synchronize, force, or resolve call
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SyncError {
    #[error("a synchronization is already in progress")]
    AlreadyInProgress,
    #[error("no local annotations for this video")]
    NoLocalData,
    #[error("network error: {0}")]
    Network(String),
    #[error("could not decode remote annotations: {0}")]
    Decoding(String),
    #[error("server error {code}: {message}")]
    Server { code: u16, message: String },
    #[error("not authorized to access remote annotations")]
    Unauthorized,
    #[error("invalid sync state: {0}")]
    InvalidData(String),
    #[error("upload failed: {0}")]
    UploadFailed(String),
    #[error("local and remote annotations conflict")]
    MergeConflict {
        local: Vec<Timeline>,
        remote: Vec<Timeline>,
    },
    #[error("local storage error: {0}")]
    Storage(String),
    #[error("synchronization cancelled")]
    Cancelled,
}

impl SyncError {
    /// Map a failed fetch
    #[must_use]
    pub fn from_fetch(error: GatewayError) -> Self {
        match error {
            GatewayError::Network(cause) | GatewayError::Other(cause) => Self::Network(cause),
            GatewayError::Decoding(cause) => Self::Decoding(cause),
            GatewayError::Server { code, message } => Self::Server { code, message },
            GatewayError::Unauthorized => Self::Unauthorized,
        }
    }

    /// Map a failed upload; kinds without a specific counterpart become `UploadFailed`
    #[must_use]
    pub fn from_upload(error: GatewayError) -> Self {
        match error {
            GatewayError::Network(cause) => Self::Network(cause),
            GatewayError::Server { code, message } => Self::Server { code, message },
            GatewayError::Unauthorized => Self::Unauthorized,
            GatewayError::Decoding(cause) | GatewayError::Other(cause) => Self::UploadFailed(cause),
        }
    }

    pub(crate) fn timed_out(operation: &str, after: Duration) -> Self {
        Self::Network(format!("{operation} timed out after {}s", after.as_secs()))
    }

    /// Short machine-friendly name of the error kind
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::AlreadyInProgress => "already_in_progress",
            Self::NoLocalData => "no_local_data",
            Self::Network(_) => "network",
            Self::Decoding(_) => "decoding",
            Self::Server { .. } => "server",
            Self::Unauthorized => "unauthorized",
            Self::InvalidData(_) => "invalid_data",
            Self::UploadFailed(_) => "upload_failed",
            Self::MergeConflict { .. } => "merge_conflict",
            Self::Storage(_) => "storage",
            Self::Cancelled => "cancelled",
        }
    }
}

impl From<crate::Error> for SyncError {
    fn from(error: crate::Error) -> Self {
        Self::Storage(error.to_string())
    }
}
