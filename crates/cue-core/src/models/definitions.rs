//! Tag, label, and time event definitions

use serde::{Deserialize, Serialize};

use super::ids::{LabelId, TagId, TimeEventId};

/// Default stamp length for new tags, in seconds
pub const DEFAULT_TAG_DURATION: f64 = 5.0;

/// A reusable annotation type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub color: String,
    /// Name of the tag group this tag belongs to
    #[serde(default)]
    pub group: Option<String>,
    /// Length of stamps created from this tag, in seconds
    #[serde(default = "default_duration")]
    pub default_duration: f64,
}

const fn default_duration() -> f64 {
    DEFAULT_TAG_DURATION
}

impl Tag {
    #[must_use]
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: TagId::new(),
            name: name.into(),
            description: String::new(),
            color: color.into(),
            group: None,
            default_duration: DEFAULT_TAG_DURATION,
        }
    }

    #[must_use]
    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Stand-in record for a tag id the library does not know.
    ///
    /// Carries the name/color snapshot from the stamp so expansion never loses it.
    #[must_use]
    pub fn placeholder(id: TagId, name: &str, color: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            description: String::new(),
            color: color.to_string(),
            group: None,
            default_duration: DEFAULT_TAG_DURATION,
        }
    }
}

/// A sub-classifier attachable to a stamp
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: LabelId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub group: Option<String>,
}

impl Label {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: LabelId::new(),
            name: name.into(),
            description: String::new(),
            color: String::new(),
            group: None,
        }
    }

    #[must_use]
    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    #[must_use]
    pub const fn placeholder(id: LabelId) -> Self {
        Self {
            id,
            name: String::new(),
            description: String::new(),
            color: String::new(),
            group: None,
        }
    }
}

/// A marker for a notable moment, attachable to a stamp
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeEvent {
    pub id: TimeEventId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub group: Option<String>,
}

impl TimeEvent {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: TimeEventId::new(),
            name: name.into(),
            description: String::new(),
            color: String::new(),
            group: None,
        }
    }

    #[must_use]
    pub const fn placeholder(id: TimeEventId) -> Self {
        Self {
            id,
            name: String::new(),
            description: String::new(),
            color: String::new(),
            group: None,
        }
    }
}
