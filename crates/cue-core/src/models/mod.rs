//! Data models for Cue

mod definitions;
mod expanded;
mod ids;
mod library;
mod settings;
mod sync_metadata;
mod timeline;

pub use definitions::{Label, Tag, TimeEvent, DEFAULT_TAG_DURATION};
pub use expanded::{compact_timelines, expand_timelines, ExpandedStamp, ExpandedTimeline};
pub use ids::{LabelId, StampId, TagId, TimeEventId, TimelineId, VideoId};
pub use library::TagLibrary;
pub use settings::{
    ConflictPolicy, SyncPreferences, SyncPreferencesUpdate, DEFAULT_RETRY_COUNT,
    DEFAULT_SYNC_INTERVAL, DEFAULT_SYNC_TIMEOUT,
};
pub use sync_metadata::SyncMetadata;
pub use timeline::{index_timelines, stamp_count, FieldPosition, Stamp, Timeline};
