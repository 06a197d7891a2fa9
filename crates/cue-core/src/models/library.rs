//! Registry of tag, label, and time event definitions

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::definitions::{Label, Tag, TimeEvent};
use super::expanded::ExpandedTimeline;
use super::ids::{LabelId, TagId, TimeEventId};

/// Definitions referenced by compact stamps.
///
/// Expansion resolves ids through the library; ids it does not know still
/// expand, to placeholder records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagLibrary {
    #[serde(default)]
    tags: HashMap<TagId, Tag>,
    #[serde(default)]
    labels: HashMap<LabelId, Label>,
    #[serde(default)]
    time_events: HashMap<TimeEventId, TimeEvent>,
}

impl TagLibrary {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a tag definition
    pub fn insert_tag(&mut self, tag: Tag) {
        self.tags.insert(tag.id, tag);
    }

    /// Insert or replace a label definition
    pub fn insert_label(&mut self, label: Label) {
        self.labels.insert(label.id, label);
    }

    /// Insert or replace a time event definition
    pub fn insert_time_event(&mut self, event: TimeEvent) {
        self.time_events.insert(event.id, event);
    }

    #[must_use]
    pub fn tag(&self, id: &TagId) -> Option<&Tag> {
        self.tags.get(id)
    }

    #[must_use]
    pub fn label(&self, id: &LabelId) -> Option<&Label> {
        self.labels.get(id)
    }

    #[must_use]
    pub fn time_event(&self, id: &TimeEventId) -> Option<&TimeEvent> {
        self.time_events.get(id)
    }

    /// Tags sorted by group, then name
    #[must_use]
    pub fn tags(&self) -> Vec<&Tag> {
        let mut tags: Vec<&Tag> = self.tags.values().collect();
        tags.sort_by(|a, b| a.group.cmp(&b.group).then_with(|| a.name.cmp(&b.name)));
        tags
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.labels.is_empty() && self.time_events.is_empty()
    }

    /// Learn definitions carried by fetched timelines.
    ///
    /// Known definitions are kept as-is; placeholder records (blank names) are
    /// never learned. Returns the number of new definitions.
    pub fn absorb(&mut self, timelines: &[ExpandedTimeline]) -> usize {
        let mut learned = 0;
        for stamp in timelines.iter().flat_map(|timeline| &timeline.stamps) {
            if !stamp.tag.name.is_empty() && !self.tags.contains_key(&stamp.tag.id) {
                self.tags.insert(stamp.tag.id, stamp.tag.clone());
                learned += 1;
            }
            for label in &stamp.labels {
                if !label.name.is_empty() && !self.labels.contains_key(&label.id) {
                    self.labels.insert(label.id, label.clone());
                    learned += 1;
                }
            }
            for event in &stamp.time_events {
                if !event.name.is_empty() && !self.time_events.contains_key(&event.id) {
                    self.time_events.insert(event.id, event.clone());
                    learned += 1;
                }
            }
        }
        learned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::expanded::expand_timelines;
    use crate::models::{Stamp, Timeline};

    #[test]
    fn test_tags_sorted_by_group_then_name() {
        let mut library = TagLibrary::new();
        library.insert_tag(Tag::new("Shot", "#f00").in_group("Offense"));
        library.insert_tag(Tag::new("Block", "#0f0").in_group("Defense"));
        library.insert_tag(Tag::new("Assist", "#00f").in_group("Offense"));

        let names: Vec<&str> = library.tags().iter().map(|tag| tag.name.as_str()).collect();
        assert_eq!(names, vec!["Block", "Assist", "Shot"]);
    }

    #[test]
    fn test_absorb_learns_only_new_definitions() {
        let tag = Tag::new("Turnover", "#123456");
        let label = Label::new("Forced");
        let event = TimeEvent::new("Whistle");

        let mut source = TagLibrary::new();
        source.insert_tag(tag.clone());
        source.insert_label(label.clone());
        source.insert_time_event(event.clone());

        let timeline = Timeline::new("Half 1").with_stamp(
            Stamp::new(&tag, 3.0, 7.0)
                .with_label(&label)
                .with_time_event(&event),
        );
        let expanded = expand_timelines(&[timeline], &source);

        let mut target = TagLibrary::new();
        assert_eq!(target.absorb(&expanded), 3);
        assert_eq!(target.absorb(&expanded), 0);
        assert_eq!(target.label(&label.id), Some(&label));
    }

    #[test]
    fn test_absorb_skips_placeholders() {
        let tag = Tag::new("Foul", "#abcdef");
        let label = Label::new("Yellow");
        let timeline =
            Timeline::new("Half 2").with_stamp(Stamp::new(&tag, 1.0, 2.0).with_label(&label));

        // Nothing registered: label expands to a placeholder with a blank name
        let expanded = expand_timelines(&[timeline], &TagLibrary::new());

        let mut target = TagLibrary::new();
        assert_eq!(target.absorb(&expanded), 1);
        assert!(target.tag(&tag.id).is_some());
        assert!(target.label(&label.id).is_none());
    }
}
