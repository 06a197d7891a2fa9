//! Identifier types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::Error;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new unique ID using UUID v7
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Wrap an existing UUID
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Get the string representation of this ID
            #[must_use]
            pub fn as_str(&self) -> String {
                self.0.to_string()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

uuid_id!(
    /// Stable identity of a timeline
    TimelineId
);
uuid_id!(
    /// Stable identity of a stamp on a timeline
    StampId
);
uuid_id!(
    /// Identity of a tag definition
    TagId
);
uuid_id!(
    /// Identity of a label definition
    LabelId
);
uuid_id!(
    /// Identity of a time event definition
    TimeEventId
);

/// Identifier of the video an annotation set belongs to.
///
/// Video ids come from the host application and are opaque strings; the only
/// requirement is that they are non-blank.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    /// Create a video id, trimming surrounding whitespace
    pub fn new(value: impl Into<String>) -> crate::Result<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidInput("video id cannot be empty".into()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Borrow the raw id
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for VideoId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stamp_id_unique() {
        assert_ne!(StampId::new(), StampId::new());
    }

    #[test]
    fn test_tag_id_parse() {
        let id = TagId::new();
        let parsed: TagId = id.as_str().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_video_id_trims_and_rejects_blank() {
        let id: VideoId = "  match-2024-05  ".parse().unwrap();
        assert_eq!(id.as_str(), "match-2024-05");
        assert!(VideoId::new("   ").is_err());
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let id = VideoId::new("clip").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"clip\"");

        let label = LabelId::new();
        assert_eq!(
            serde_json::to_string(&label).unwrap(),
            format!("\"{label}\"")
        );
    }
}
