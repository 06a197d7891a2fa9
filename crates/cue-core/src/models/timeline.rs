//! Timeline and stamp models

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use super::definitions::{Label, Tag, TimeEvent};
use super::ids::{LabelId, StampId, TagId, TimeEventId, TimelineId};

/// Normalized position on the field map (0.0-1.0 on both axes)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldPosition {
    pub x: f64,
    pub y: f64,
}

impl FieldPosition {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A single annotated interval on a timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stamp {
    /// Unique identifier
    pub id: StampId,
    /// Tag this stamp was created from
    pub tag_id: TagId,
    /// Start time in seconds from the beginning of the video
    pub start: f64,
    /// End time in seconds; not validated against `start`
    pub end: f64,
    /// Attached labels
    #[serde(default)]
    pub labels: BTreeSet<LabelId>,
    /// Attached time events
    #[serde(default)]
    pub time_events: BTreeSet<TimeEventId>,
    /// Optional position on the field map
    #[serde(default)]
    pub position: Option<FieldPosition>,
    /// Tag color captured when the stamp was created
    pub color: String,
    /// Tag name captured when the stamp was created
    pub name: String,
}

impl Stamp {
    /// Create a stamp for `tag`, snapshotting its color and name
    #[must_use]
    pub fn new(tag: &Tag, start: f64, end: f64) -> Self {
        Self {
            id: StampId::new(),
            tag_id: tag.id,
            start,
            end,
            labels: BTreeSet::new(),
            time_events: BTreeSet::new(),
            position: None,
            color: tag.color.clone(),
            name: tag.name.clone(),
        }
    }

    /// Attach a label
    #[must_use]
    pub fn with_label(mut self, label: &Label) -> Self {
        self.labels.insert(label.id);
        self
    }

    /// Attach a time event
    #[must_use]
    pub fn with_time_event(mut self, event: &TimeEvent) -> Self {
        self.time_events.insert(event.id);
        self
    }

    /// Place the stamp on the field map
    #[must_use]
    pub const fn with_position(mut self, position: FieldPosition) -> Self {
        self.position = Some(position);
        self
    }

    /// Length of the interval in seconds (may be zero or negative)
    #[must_use]
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    #[must_use]
    pub const fn has_position(&self) -> bool {
        self.position.is_some()
    }
}

/// A named collection of stamps belonging to one video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    /// Unique identifier
    pub id: TimelineId,
    /// Display name
    pub name: String,
    /// Stamps in display order
    #[serde(default)]
    pub stamps: Vec<Stamp>,
}

impl Timeline {
    /// Create an empty timeline
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: TimelineId::new(),
            name: name.into(),
            stamps: Vec::new(),
        }
    }

    /// Builder-style stamp insertion
    #[must_use]
    pub fn with_stamp(mut self, stamp: Stamp) -> Self {
        self.stamps.push(stamp);
        self
    }

    /// Look up a stamp by id
    #[must_use]
    pub fn stamp(&self, id: &StampId) -> Option<&Stamp> {
        self.stamps.iter().find(|stamp| stamp.id == *id)
    }

    /// Index stamps by id
    #[must_use]
    pub fn stamp_index(&self) -> HashMap<StampId, &Stamp> {
        self.stamps.iter().map(|stamp| (stamp.id, stamp)).collect()
    }
}

/// Index timelines by id
#[must_use]
pub fn index_timelines(timelines: &[Timeline]) -> HashMap<TimelineId, &Timeline> {
    timelines
        .iter()
        .map(|timeline| (timeline.id, timeline))
        .collect()
}

/// Total number of stamps across timelines
#[must_use]
pub fn stamp_count(timelines: &[Timeline]) -> usize {
    timelines.iter().map(|timeline| timeline.stamps.len()).sum()
}
