use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{EngineError, Result};
use crate::ops::time_math::round1;
use crate::types::clip::Clip;
use crate::types::timeline::{Timeline, TimelineVersion};

/// A persisted project as returned by the project store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub id: u64,
    #[serde(default)]
    pub status: String,
    pub timeline: Timeline,
}

impl ProjectRecord {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            status: "active".to_string(),
            timeline: Timeline::new(),
        }
    }

    /// Hydrates a project from loosely-typed JSON.
    ///
    /// A missing id or a non-object timeline is fatal. A malformed `clips`
    /// field degrades to an empty list and the playhead to a rounded
    /// non-negative number.
    pub fn from_json(value: &Value) -> Result<Self> {
        let id = value
            .get("id")
            .and_then(Value::as_f64)
            .filter(|id| id.is_finite() && *id > 0.0 && id.fract() == 0.0)
            .ok_or(EngineError::InvalidProjectId)? as u64;
        let status = value.get("status").and_then(Value::as_str).unwrap_or_default().to_string();
        let raw = value
            .get("timeline")
            .and_then(Value::as_object)
            .ok_or(EngineError::InvalidTimeline)?;

        if let Some(version) = raw.get("version").and_then(Value::as_str) {
            if TimelineVersion::parse(version).is_none() {
                return Err(EngineError::UnsupportedVersion(version.to_string()));
            }
        }

        let mut fields = raw.clone();
        let clips = match fields.remove("clips") {
            Some(Value::Array(items)) => parse_clips(items),
            Some(other) => {
                log::warn!("project {id}: clips field is {other}, using an empty list");
                Vec::new()
            }
            None => Vec::new(),
        };
        let playhead = fields
            .remove("playheadSeconds")
            .and_then(|v| v.as_f64())
            .filter(|p| p.is_finite())
            .map(|p| round1(p).max(0.0))
            .unwrap_or(0.0);
        fields.insert("version".to_string(), Value::from(TimelineVersion::CreateVideoV1.as_str()));

        let mut timeline: Timeline = serde_json::from_value(Value::Object(fields))?;
        timeline.clips = clips;
        timeline.playhead_seconds = playhead;
        Ok(Self { id, status, timeline })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut json = String::new();
        file.read_to_string(&mut json)?;
        let value: Value = serde_json::from_str(&json)?;
        Self::from_json(&value)
    }
}

/// Keeps every entry that parses as a clip and drops the rest.
fn parse_clips(items: Vec<Value>) -> Vec<Clip> {
    let total = items.len();
    let clips: Vec<Clip> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect();
    if clips.len() != total {
        log::warn!("dropped {} malformed clip(s)", total - clips.len());
    }
    clips
}
