//! One-shot upgrades applied to saved timelines before editing begins.
//!
//! Each transform reports whether it changed anything so the caller only
//! persists when it has to. Running a transform on its own output is a no-op.

use crate::ops::time_math::{compute_clip_starts, round1};
use crate::types::clip::TimeRange;
use crate::types::timeline::Timeline;
use crate::types::track::AudioSegment;

pub const LEGACY_AUDIO_SEGMENT_ID: &str = "audio_track_legacy";

#[derive(Debug, Clone, PartialEq)]
pub struct Migrated {
    pub timeline: Timeline,
    pub changed: bool,
}

impl Migrated {
    fn unchanged(timeline: Timeline) -> Self {
        Self {
            timeline,
            changed: false,
        }
    }
}

/// Cumulative padding removed at or before a legacy timestamp.
struct PaddingMap {
    /// `(legacy end of padding, total removed up to and including it)`,
    /// ascending by time.
    cumulative: Vec<(f64, f64)>,
}

impl PaddingMap {
    fn from_timeline(timeline: &Timeline) -> Option<Self> {
        let starts = compute_clip_starts(&timeline.clips);
        let mut events: Vec<(f64, f64)> = timeline
            .clips
            .iter()
            .zip(&starts)
            .filter_map(|(clip, derived_start)| {
                let delta = round1(finite_or_zero(clip.freeze_start_seconds).max(0.0)
                    + finite_or_zero(clip.freeze_end_seconds).max(0.0));
                if delta <= 1e-6 {
                    return None;
                }
                let start = match clip.start_seconds {
                    Some(s) if s.is_finite() => round1(s.max(0.0)),
                    _ => *derived_start,
                };
                let legacy_end = round1(start + round1(clip.source_len()) + delta);
                Some((legacy_end, delta))
            })
            .collect();
        if events.is_empty() {
            return None;
        }

        events.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
        let mut sum = 0.0;
        let cumulative = events
            .into_iter()
            .map(|(at, delta)| {
                sum = round1(sum + delta);
                (at, sum)
            })
            .collect();
        Some(Self { cumulative })
    }

    fn shift_at(&self, t: f64) -> f64 {
        self.cumulative
            .iter()
            .take_while(|(at, _)| t + 1e-6 >= *at)
            .last()
            .map_or(0.0, |(_, sum)| *sum)
    }

    fn map_time(&self, t: f64) -> f64 {
        if !t.is_finite() {
            return t;
        }
        let t = round1(t.max(0.0));
        round1((t - self.shift_at(t)).max(0.0))
    }

    fn map_range<T: TimeRange>(&self, item: &mut T) {
        let start = self.map_time(item.start_seconds());
        // An item starting inside removed padding may map past its own end.
        let end = self.map_time(item.end_seconds()).max(start);
        item.set_range(start, end);
    }

    fn map_track<T: TimeRange>(&self, items: &mut [T]) {
        for item in items {
            self.map_range(item);
        }
    }
}

fn finite_or_zero(n: f64) -> f64 {
    if n.is_finite() { n } else { 0.0 }
}

/// Removes per-clip freeze padding and pulls every later timestamp earlier by
/// the padding that ended at or before it.
///
/// Compaction preserves order: removing padding only moves later events
/// earlier. Clips come out with explicit starts and zeroed freeze fields.
pub fn migrate_legacy_clip_freeze(timeline: Timeline) -> Migrated {
    let Some(padding) = PaddingMap::from_timeline(&timeline) else {
        return Migrated::unchanged(timeline);
    };

    let starts = compute_clip_starts(&timeline.clips);
    let mut next = timeline;
    next.playhead_seconds = padding.map_time(next.playhead_seconds);
    for (clip, derived_start) in next.clips.iter_mut().zip(starts) {
        let legacy_start = match clip.start_seconds {
            Some(s) if s.is_finite() => s,
            _ => derived_start,
        };
        clip.start_seconds = Some(padding.map_time(legacy_start));
        clip.freeze_start_seconds = 0.0;
        clip.freeze_end_seconds = 0.0;
    }
    padding.map_track(&mut next.graphics);
    padding.map_track(&mut next.logos);
    padding.map_track(&mut next.lower_thirds);
    padding.map_track(&mut next.screen_titles);
    padding.map_track(&mut next.narration);
    padding.map_track(&mut next.stills);
    for overlay in next.video_overlays.iter_mut() {
        overlay.start_seconds = overlay.start_seconds.map(|s| padding.map_time(s));
    }
    padding.map_track(&mut next.audio_segments);
    for guideline in next.guidelines.iter_mut() {
        *guideline = padding.map_time(*guideline);
    }
    if let Some(track) = next.audio_track.as_mut() {
        padding.map_range(track);
    }

    log::info!("compacted freeze padding on {} clip(s)", padding.cumulative.len());
    Migrated {
        timeline: next,
        changed: true,
    }
}

fn normalize_seconds(n: f64) -> f64 {
    round1(finite_or_zero(n).max(0.0))
}

/// Converts the singular legacy audio track into a one-element segment list
/// when no segments exist yet, and normalizes existing segments.
pub fn migrate_legacy_audio_track(timeline: Timeline) -> Migrated {
    if timeline.audio_segments.is_empty() && timeline.audio_track.is_none() {
        return Migrated::unchanged(timeline);
    }

    let mut next = timeline;
    let mut changed = false;
    let legacy = next.audio_track.take();
    if legacy.is_some() {
        changed = true;
    }
    if next.audio_segments.is_empty() {
        if let Some(track) = legacy {
            next.audio_segments.push(AudioSegment {
                id: LEGACY_AUDIO_SEGMENT_ID.to_string(),
                upload_id: track.upload_id,
                audio_config_id: track.audio_config_id,
                start_seconds: normalize_seconds(track.start_seconds),
                end_seconds: normalize_seconds(track.end_seconds),
                source_start_seconds: 0.0,
                extra: Default::default(),
            });
        }
    }

    for (i, segment) in next.audio_segments.iter_mut().enumerate() {
        if segment.id.is_empty() {
            segment.id = format!("aud_legacy_{}", i + 1);
            changed = true;
        }
        for value in [
            &mut segment.start_seconds,
            &mut segment.end_seconds,
            &mut segment.source_start_seconds,
        ] {
            let normalized = normalize_seconds(*value);
            if normalized != *value {
                *value = normalized;
                changed = true;
            }
        }
    }

    Migrated {
        timeline: next,
        changed,
    }
}

/// Runs every migration in order.
pub fn migrate_timeline(timeline: Timeline) -> Migrated {
    let freeze = migrate_legacy_clip_freeze(timeline);
    let audio = migrate_legacy_audio_track(freeze.timeline);
    let changed = freeze.changed || audio.changed;
    if changed {
        log::info!("timeline migrated to current schema");
    }
    Migrated {
        timeline: audio.timeline,
        changed,
    }
}
