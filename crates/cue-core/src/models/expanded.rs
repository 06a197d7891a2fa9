//! Transport form of timelines.
//!
//! Expanded stamps carry fully resolved tag, label, and time event records so
//! the remote side never has to resolve ids on its own.

use serde::{Deserialize, Serialize};

use super::definitions::{Label, Tag, TimeEvent};
use super::ids::{StampId, TimelineId};
use super::library::TagLibrary;
use super::timeline::{FieldPosition, Stamp, Timeline};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpandedStamp {
    pub id: StampId,
    pub tag: Tag,
    pub start: f64,
    pub end: f64,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub time_events: Vec<TimeEvent>,
    #[serde(default)]
    pub position: Option<FieldPosition>,
    pub color: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpandedTimeline {
    pub id: TimelineId,
    pub name: String,
    #[serde(default)]
    pub stamps: Vec<ExpandedStamp>,
}

impl ExpandedStamp {
    /// Resolve a compact stamp through `library`
    #[must_use]
    pub fn from_compact(stamp: &Stamp, library: &TagLibrary) -> Self {
        let tag = library
            .tag(&stamp.tag_id)
            .cloned()
            .unwrap_or_else(|| Tag::placeholder(stamp.tag_id, &stamp.name, &stamp.color));
        let labels = stamp
            .labels
            .iter()
            .map(|id| {
                library
                    .label(id)
                    .cloned()
                    .unwrap_or_else(|| Label::placeholder(*id))
            })
            .collect();
        let time_events = stamp
            .time_events
            .iter()
            .map(|id| {
                library
                    .time_event(id)
                    .cloned()
                    .unwrap_or_else(|| TimeEvent::placeholder(*id))
            })
            .collect();

        Self {
            id: stamp.id,
            tag,
            start: stamp.start,
            end: stamp.end,
            labels,
            time_events,
            position: stamp.position,
            color: stamp.color.clone(),
            name: stamp.name.clone(),
        }
    }

    /// Drop the resolved records, keeping only their ids
    #[must_use]
    pub fn to_compact(&self) -> Stamp {
        Stamp {
            id: self.id,
            tag_id: self.tag.id,
            start: self.start,
            end: self.end,
            labels: self.labels.iter().map(|label| label.id).collect(),
            time_events: self.time_events.iter().map(|event| event.id).collect(),
            position: self.position,
            color: self.color.clone(),
            name: self.name.clone(),
        }
    }
}

impl ExpandedTimeline {
    #[must_use]
    pub fn from_compact(timeline: &Timeline, library: &TagLibrary) -> Self {
        Self {
            id: timeline.id,
            name: timeline.name.clone(),
            stamps: timeline
                .stamps
                .iter()
                .map(|stamp| ExpandedStamp::from_compact(stamp, library))
                .collect(),
        }
    }

    #[must_use]
    pub fn to_compact(&self) -> Timeline {
        Timeline {
            id: self.id,
            name: self.name.clone(),
            stamps: self.stamps.iter().map(ExpandedStamp::to_compact).collect(),
        }
    }
}

/// Expand a whole annotation set for upload
#[must_use]
pub fn expand_timelines(timelines: &[Timeline], library: &TagLibrary) -> Vec<ExpandedTimeline> {
    timelines
        .iter()
        .map(|timeline| ExpandedTimeline::from_compact(timeline, library))
        .collect()
}

/// Compact a fetched annotation set for local use
#[must_use]
pub fn compact_timelines(timelines: &[ExpandedTimeline]) -> Vec<Timeline> {
    timelines.iter().map(ExpandedTimeline::to_compact).collect()
}
