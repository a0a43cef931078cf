use uuid::Uuid;

use crate::error::{EngineError, Result};
use crate::ops::time_math::{TIME_EPSILON, clamp, clip_duration, round1};
use crate::types::asset::AssetCandidate;
use crate::types::clip::Clip;
use crate::types::timeline::Timeline;

/// Least source material a split may leave on either side of the cut.
pub const MIN_SPLIT_SECONDS: f64 = 0.2;

/// Result of an accepted edit: the new timeline and the selection that goes
/// with it. Declined edits return `None` instead.
#[derive(Debug, Clone, PartialEq)]
pub struct Edit {
    pub timeline: Timeline,
    pub selected_clip_id: Option<String>,
}

/// Builds a full-length clip for a picker candidate.
pub fn new_clip_from_asset(asset: &AssetCandidate) -> Result<Clip> {
    let duration = asset.duration_seconds.filter(|d| d.is_finite() && *d > 0.0).ok_or_else(|| {
        EngineError::InvalidArgument(format!("asset {} is missing duration metadata", asset.id))
    })?;
    let id = format!("clip_{}", Uuid::new_v4().simple());
    Ok(Clip::new(id, asset.id, 0.0, round1(duration)))
}

/// Inserts `clip` next to the clip under the playhead without splitting it.
///
/// A playhead within [`TIME_EPSILON`] of that clip's start inserts before it,
/// anywhere else inserts after it. Past the last clip the new one is appended.
pub fn insert_clip_at_playhead(timeline: &Timeline, clip: Clip) -> Edit {
    let mut next = timeline.clone();
    let selected = Some(clip.id.clone());
    if next.clips.is_empty() {
        next.clips.push(clip);
        next.playhead_seconds = 0.0;
        return Edit {
            timeline: next,
            selected_clip_id: selected,
        };
    }

    let index = match timeline.locate_playhead() {
        Some(located) if located.within <= TIME_EPSILON => located.clip_index,
        Some(located) => located.clip_index + 1,
        None => timeline.clips.len(),
    };
    log::debug!("inserting clip {} at index {}", clip.id, index);
    next.clips.insert(index, clip);
    next.clamp_playhead();
    Edit {
        timeline: next,
        selected_clip_id: selected,
    }
}

/// Cuts a clip `within` seconds into its source window, returning the two
/// halves. Returns None if either side would be shorter than `min_len`.
pub fn cut_clip_at(clip: &Clip, within: f64, min_len: f64) -> Option<(Clip, Clip)> {
    let cut = round1(clip.source_start_seconds + within);
    if cut - clip.source_start_seconds < min_len - 1e-6 || clip.source_end_seconds - cut < min_len - 1e-6 {
        return None;
    }

    let mut left = clip.clone();
    left.id = format!("{}_a", clip.id);
    left.source_end_seconds = cut;
    left.freeze_end_seconds = 0.0;

    let mut right = clip.clone();
    right.id = format!("{}_b", clip.id);
    right.source_start_seconds = cut;
    right.freeze_start_seconds = 0.0;
    if let Some(start) = clip.start_seconds {
        right.start_seconds = Some(round1(start + clip_duration(&left)));
    }

    Some((left, right))
}

pub fn split_clip_at_playhead(timeline: &Timeline, selected_clip_id: Option<&str>) -> Option<Edit> {
    split_clip_at_playhead_with(timeline, selected_clip_id, MIN_SPLIT_SECONDS)
}

/// Splits the selected clip at the playhead. The selection must be the clip
/// the playhead is over; the right-hand piece becomes the new selection.
pub fn split_clip_at_playhead_with(
    timeline: &Timeline,
    selected_clip_id: Option<&str>,
    min_len: f64,
) -> Option<Edit> {
    let selected = selected_clip_id?;
    let located = timeline.locate_playhead()?;
    let clip = &timeline.clips[located.clip_index];
    if clip.id != selected {
        return None;
    }
    let (left, right) = cut_clip_at(clip, located.within, min_len)?;

    let clip_start = timeline.clip_starts()[located.clip_index];
    let split_at = round1(clip_start + clip_duration(&left));
    let right_id = right.id.clone();

    let mut next = timeline.clone();
    for still in next.stills.iter_mut() {
        if still.source_clip_id.as_deref() != Some(clip.id.as_str()) {
            continue;
        }
        let owner = if round1(still.start_seconds) < split_at - 1e-6 { &left.id } else { &right.id };
        still.source_clip_id = Some(owner.clone());
    }
    next.clips.splice(located.clip_index..=located.clip_index, [left, right]);
    log::debug!("split clip {} at {}", clip.id, split_at);

    Some(Edit {
        timeline: next,
        selected_clip_id: Some(right_id),
    })
}

/// Removes the selected clip, or the one under the playhead when nothing is
/// selected. The selection moves to the clip that took its place, else the
/// one before it.
pub fn delete_clip(timeline: &Timeline, selected_clip_id: Option<&str>) -> Option<Edit> {
    let index = match selected_clip_id {
        Some(id) => timeline.clip_index(id)?,
        None => timeline.locate_playhead()?.clip_index,
    };

    let mut next = timeline.clone();
    let removed = next.clips.remove(index);
    next.clamp_playhead();
    let selected = next
        .clips
        .get(index)
        .or_else(|| index.checked_sub(1).and_then(|i| next.clips.get(i)))
        .map(|c| c.id.clone());
    log::debug!("deleted clip {}", removed.id);

    Some(Edit {
        timeline: next,
        selected_clip_id: selected,
    })
}

/// Sets a clip's source window. `max_source_seconds` is the asset's real
/// duration when known; the end is clamped to it.
pub fn set_clip_trim(
    timeline: &Timeline,
    clip_id: &str,
    source_start: f64,
    source_end: f64,
    max_source_seconds: Option<f64>,
) -> Option<Edit> {
    let index = timeline.clip_index(clip_id)?;
    let start = round1(source_start).max(0.0);
    let mut end = round1(source_end).max(0.0);
    if let Some(max) = max_source_seconds.filter(|m| m.is_finite() && *m > 0.0) {
        end = clamp(end, 0.0, round1(max));
    }
    if !(end > start) {
        return None;
    }

    let clip = &timeline.clips[index];
    if clip.source_start_seconds == start && clip.source_end_seconds == end {
        return None;
    }
    let mut next = timeline.clone();
    next.clips[index].source_start_seconds = start;
    next.clips[index].source_end_seconds = end;
    next.clamp_playhead();
    Some(Edit {
        timeline: next,
        selected_clip_id: Some(clip_id.to_string()),
    })
}
