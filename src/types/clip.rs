use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

fn is_zero(value: &f64) -> bool {
    *value == 0.0
}

/// One trimmed reference to a source media asset placed in playback order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clip {
    pub id: String,
    pub upload_id: u64,
    pub source_start_seconds: f64,
    pub source_end_seconds: f64,
    /// Explicit timeline position. Normally absent so the position is derived
    /// from the clips before it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_seconds: Option<f64>,
    /// Deprecated leading padding, zero once migrated.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub freeze_start_seconds: f64,
    /// Deprecated trailing padding, zero once migrated.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub freeze_end_seconds: f64,
    /// Per-clip settings such as `audioEnabled` and `boostDb`, written back
    /// untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Clip {
    pub fn new(id: impl Into<String>, upload_id: u64, source_start: f64, source_end: f64) -> Self {
        Self {
            id: id.into(),
            upload_id,
            source_start_seconds: source_start,
            source_end_seconds: source_end,
            start_seconds: None,
            freeze_start_seconds: 0.0,
            freeze_end_seconds: 0.0,
            extra: Map::new(),
        }
    }

    pub fn with_start(mut self, start_seconds: f64) -> Self {
        self.start_seconds = Some(start_seconds);
        self
    }

    /// Length of the trimmed source window, ignoring any legacy padding.
    pub fn source_len(&self) -> f64 {
        (self.source_end_seconds - self.source_start_seconds).max(0.0)
    }

    pub fn has_freeze_padding(&self) -> bool {
        self.freeze_start_seconds.max(0.0) + self.freeze_end_seconds.max(0.0) > 1e-6
    }
}

/// Anything that occupies a `[start, end)` range of timeline time.
///
/// Sibling tracks share the clip time mapping, so migrations remap them
/// through this trait without knowing their other fields.
pub trait TimeRange {
    fn start_seconds(&self) -> f64;
    fn end_seconds(&self) -> f64;
    fn set_range(&mut self, start_seconds: f64, end_seconds: f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_serializes_camel_case_without_legacy_fields() {
        let clip = Clip::new("c1", 7, 0.0, 10.0);
        let json = serde_json::to_value(&clip).unwrap();
        assert_eq!(json["uploadId"], 7);
        assert_eq!(json["sourceEndSeconds"], 10.0);
        assert!(json.get("startSeconds").is_none());
        assert!(json.get("freezeStartSeconds").is_none());
    }

    #[test]
    fn test_clip_reads_legacy_freeze_fields() {
        let clip: Clip = serde_json::from_str(
            r#"{"id":"c1","uploadId":3,"sourceStartSeconds":0,"sourceEndSeconds":8,"freezeEndSeconds":2}"#,
        )
        .unwrap();
        assert_eq!(clip.freeze_end_seconds, 2.0);
        assert_eq!(clip.freeze_start_seconds, 0.0);
        assert!(clip.has_freeze_padding());
        assert_eq!(clip.source_len(), 8.0);
    }

    #[test]
    fn test_clip_keeps_audio_settings_through_round_trip() {
        let raw = r#"{"id":"a","uploadId":1,"sourceStartSeconds":0,"sourceEndSeconds":5,"audioEnabled":false,"boostDb":6}"#;
        let clip: Clip = serde_json::from_str(raw).unwrap();
        assert_eq!(clip.extra["audioEnabled"], false);
        let back = serde_json::to_value(&clip).unwrap();
        assert_eq!(back["audioEnabled"], false);
        assert_eq!(back["boostDb"], 6);
        assert_eq!(back["uploadId"], 1);
        assert!(back.get("extra").is_none());
    }
}
