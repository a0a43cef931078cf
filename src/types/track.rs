use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::clip::TimeRange;
use crate::types::coerce;

/// An item on a sibling track (graphic, logo, lower third, title, narration,
/// still).
///
/// Only the time fields are interpreted here. Everything else the property
/// editors store is kept in `extra` and written back untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackItem {
    #[serde(default, deserialize_with = "coerce::id_string")]
    pub id: String,
    #[serde(default, deserialize_with = "coerce::seconds")]
    pub start_seconds: f64,
    #[serde(default, deserialize_with = "coerce::seconds")]
    pub end_seconds: f64,
    /// Clip a still was captured from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_clip_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TrackItem {
    pub fn new(id: impl Into<String>, start_seconds: f64, end_seconds: f64) -> Self {
        Self {
            id: id.into(),
            start_seconds,
            end_seconds,
            source_clip_id: None,
            extra: Map::new(),
        }
    }
}

impl TimeRange for TrackItem {
    fn start_seconds(&self) -> f64 {
        self.start_seconds
    }
    fn end_seconds(&self) -> f64 {
        self.end_seconds
    }
    fn set_range(&mut self, start_seconds: f64, end_seconds: f64) {
        self.start_seconds = start_seconds;
        self.end_seconds = end_seconds;
    }
}

/// A picture-in-picture video placed over the main clips.
///
/// Shaped like a clip: its length comes from the source window and a missing
/// start means "after the previous overlay", so there is no end field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoOverlay {
    #[serde(default, deserialize_with = "coerce::id_string")]
    pub id: String,
    #[serde(default, deserialize_with = "coerce::id_number")]
    pub upload_id: u64,
    #[serde(
        default,
        deserialize_with = "coerce::optional_seconds",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_seconds: Option<f64>,
    #[serde(default, deserialize_with = "coerce::seconds")]
    pub source_start_seconds: f64,
    #[serde(default, deserialize_with = "coerce::seconds")]
    pub source_end_seconds: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioSegment {
    #[serde(default, deserialize_with = "coerce::id_string")]
    pub id: String,
    #[serde(default, deserialize_with = "coerce::id_number")]
    pub upload_id: u64,
    #[serde(default, deserialize_with = "coerce::id_number")]
    pub audio_config_id: u64,
    #[serde(default, deserialize_with = "coerce::seconds")]
    pub start_seconds: f64,
    #[serde(default, deserialize_with = "coerce::seconds")]
    pub end_seconds: f64,
    #[serde(default, deserialize_with = "coerce::seconds")]
    pub source_start_seconds: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TimeRange for AudioSegment {
    fn start_seconds(&self) -> f64 {
        self.start_seconds
    }
    fn end_seconds(&self) -> f64 {
        self.end_seconds
    }
    fn set_range(&mut self, start_seconds: f64, end_seconds: f64) {
        self.start_seconds = start_seconds;
        self.end_seconds = end_seconds;
    }
}

/// The once-singular background audio track, superseded by `AudioSegment`s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyAudioTrack {
    #[serde(default, deserialize_with = "coerce::id_number")]
    pub upload_id: u64,
    #[serde(default, deserialize_with = "coerce::id_number")]
    pub audio_config_id: u64,
    #[serde(default, deserialize_with = "coerce::seconds")]
    pub start_seconds: f64,
    #[serde(default, deserialize_with = "coerce::seconds")]
    pub end_seconds: f64,
}

impl TimeRange for LegacyAudioTrack {
    fn start_seconds(&self) -> f64 {
        self.start_seconds
    }
    fn end_seconds(&self) -> f64 {
        self.end_seconds
    }
    fn set_range(&mut self, start_seconds: f64, end_seconds: f64) {
        self.start_seconds = start_seconds;
        self.end_seconds = end_seconds;
    }
}
