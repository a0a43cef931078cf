use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ops::time_math::{clamp, compute_clip_starts, locate, round1, total_duration, Located};
use crate::types::clip::Clip;
use crate::types::coerce;
use crate::types::track::{AudioSegment, LegacyAudioTrack, TrackItem, VideoOverlay};

/// Schema tag of a persisted timeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimelineVersion {
    #[default]
    #[serde(rename = "create_video_v1")]
    CreateVideoV1,
}

impl TimelineVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimelineVersion::CreateVideoV1 => "create_video_v1",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "create_video_v1" => Some(TimelineVersion::CreateVideoV1),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    #[serde(default)]
    pub version: TimelineVersion,
    #[serde(default)]
    pub playhead_seconds: f64,
    #[serde(default)]
    pub clips: Vec<Clip>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub graphics: Vec<TrackItem>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub logos: Vec<TrackItem>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lower_thirds: Vec<TrackItem>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub screen_titles: Vec<TrackItem>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub narration: Vec<TrackItem>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stills: Vec<TrackItem>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub video_overlays: Vec<VideoOverlay>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub audio_segments: Vec<AudioSegment>,
    /// Marker instants on the ruler.
    #[serde(
        default,
        deserialize_with = "coerce::seconds_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub guidelines: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_track: Option<LegacyAudioTrack>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clips(clips: Vec<Clip>) -> Self {
        Self {
            clips,
            ..Self::default()
        }
    }

    pub fn clip_starts(&self) -> Vec<f64> {
        compute_clip_starts(&self.clips)
    }

    pub fn total_duration(&self) -> f64 {
        total_duration(&self.clips)
    }

    /// The playhead rounded and clamped into `[0, total]`.
    pub fn clamped_playhead(&self) -> f64 {
        clamp(round1(self.playhead_seconds), 0.0, self.total_duration())
    }

    pub fn locate_playhead(&self) -> Option<Located> {
        locate(self.clamped_playhead(), &self.clips)
    }

    pub fn clip_index(&self, clip_id: &str) -> Option<usize> {
        self.clips.iter().position(|c| c.id == clip_id)
    }

    pub fn clip(&self, clip_id: &str) -> Option<&Clip> {
        self.clips.iter().find(|c| c.id == clip_id)
    }

    /// Re-clamps the playhead after the clip list changed length.
    pub fn clamp_playhead(&mut self) {
        self.playhead_seconds = self.clamped_playhead();
    }
}
