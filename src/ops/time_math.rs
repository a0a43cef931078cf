//! Clip durations, cumulative starts and time lookup.
//!
//! Every value leaving this module is rounded to one decimal. That is the
//! engine's time resolution; callers compare with [`TIME_EPSILON`].

use crate::types::clip::Clip;

/// Tolerance used by every time comparison outside this module.
pub const TIME_EPSILON: f64 = 0.05;

pub fn clamp(n: f64, min: f64, max: f64) -> f64 {
    n.max(min).min(max.max(min))
}

pub fn round1(n: f64) -> f64 {
    (n * 10.0).round() / 10.0
}

/// Timeline length of a clip, including legacy freeze padding.
pub fn clip_duration(clip: &Clip) -> f64 {
    round1(clip.source_len() + clip.freeze_start_seconds.max(0.0) + clip.freeze_end_seconds.max(0.0))
}

/// Timeline start of each clip.
///
/// An explicit non-negative `start_seconds` wins over the running cursor. The
/// cursor never moves backwards, so out-of-order overrides cannot make later
/// derived starts decrease.
pub fn compute_clip_starts(clips: &[Clip]) -> Vec<f64> {
    let mut starts = Vec::with_capacity(clips.len());
    let mut cursor = 0.0_f64;
    for clip in clips {
        let start = match clip.start_seconds {
            Some(s) if s.is_finite() && s >= 0.0 => round1(s),
            _ => round1(cursor),
        };
        starts.push(start);
        cursor = cursor.max(round1(start + clip_duration(clip)));
    }
    starts
}

pub fn total_duration(clips: &[Clip]) -> f64 {
    round1(clips.iter().map(clip_duration).sum())
}

/// Latest end of any clip interval. Differs from [`total_duration`] only when
/// explicit starts leave gaps or overlaps.
pub fn timeline_end_seconds(clips: &[Clip], starts: &[f64]) -> f64 {
    let end = clips
        .iter()
        .zip(starts)
        .map(|(clip, start)| start + clip_duration(clip))
        .fold(0.0_f64, f64::max);
    round1(end)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Located {
    pub clip_index: usize,
    /// Offset from the clip's timeline start, equal to the offset into its
    /// source window.
    pub within: f64,
}

/// Finds the clip whose `[start, start + duration)` contains `t`.
///
/// The exact end of the last clip is not matched; callers treat it as past
/// the end or clamp slightly before it.
pub fn locate(t: f64, clips: &[Clip]) -> Option<Located> {
    if !t.is_finite() || t < 0.0 {
        return None;
    }
    let starts = compute_clip_starts(clips);
    clips
        .iter()
        .zip(&starts)
        .position(|(clip, &start)| t >= start && t < round1(start + clip_duration(clip)))
        .map(|clip_index| Located {
            clip_index,
            within: round1(t - starts[clip_index]),
        })
}

/// Sorted, de-duplicated start and end instants of all clips.
pub fn clip_boundaries(clips: &[Clip]) -> Vec<f64> {
    let starts = compute_clip_starts(clips);
    let mut out: Vec<f64> = Vec::with_capacity(clips.len() * 2);
    for (clip, start) in clips.iter().zip(&starts) {
        out.push(*start);
        out.push(round1(start + clip_duration(clip)));
    }
    out.sort_by(f64::total_cmp);
    out.dedup_by(|a, b| (*a - *b).abs() < TIME_EPSILON);
    out
}
