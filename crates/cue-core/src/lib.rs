//! cue-core - Core library for Cue
//!
//! Annotation models, local libSQL storage, and the engine that keeps a
//! video's annotations in sync with the remote service.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod state;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use models::{Timeline, VideoId};
pub use state::{SyncOperation, SyncPhase, SyncStatus};
