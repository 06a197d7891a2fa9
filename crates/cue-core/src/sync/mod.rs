//! Synchronization of local annotation sets with the remote service.

mod conflict;
mod engine;
mod error;
mod events;
mod gateway;
mod merge;
mod metadata;
mod preferences;
mod scheduler;
#[cfg(test)]
pub(crate) mod test_support;

pub use conflict::detect_conflicts;
pub use engine::{
    EngineOptions, FlightScope, SyncEngine, SyncErrorRecord, SyncOutcome, SyncReport,
    TAG_LIBRARY_KEY,
};
pub use error::{GatewayError, SyncError, SyncResult};
pub use events::{EventBus, SyncEvent};
pub use gateway::{HttpRemoteGateway, RemoteGateway};
pub use merge::merge_timelines;
pub use metadata::{metadata_key, SyncMetadataStore};
pub use preferences::{
    PreferencesStore, AUTO_SYNC_ENABLED_KEY, CONFLICT_POLICY_KEY, SYNC_INTERVAL_KEY,
    SYNC_RETRY_COUNT_KEY, SYNC_TIMEOUT_KEY,
};
pub use scheduler::{AutoSyncScheduler, LOCAL_CHANGE_DEBOUNCE};
