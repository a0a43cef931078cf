use thiserror::Error;

use crate::config::EngineConfig;
use crate::ops::time_math::{TIME_EPSILON, Located, clamp, clip_duration, compute_clip_starts, locate, round1};
use crate::types::asset::{AssetResolver, CachedResolver};
use crate::types::timeline::Timeline;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MediaError {
    #[error("Playback was rejected: {0}")]
    PlayRejected(String),
    #[error("Seek failed: {0}")]
    Seek(String),
}

/// How the frame fills the preview box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FitMode {
    #[default]
    Contain,
    Cover,
}

impl FitMode {
    /// Portrait sources fill the box, everything else is letterboxed.
    pub fn for_dimensions(width: u32, height: u32) -> Self {
        if height > width { FitMode::Cover } else { FitMode::Contain }
    }
}

/// The single playback element shared by the whole timeline.
///
/// Methods mirror what a host video element offers. Loading a source is
/// asynchronous: the host calls [`PlaybackSync::on_loaded_metadata`] when it
/// is ready, and [`PlaybackSync::on_play`] / [`PlaybackSync::on_pause`] when
/// its own play state changes.
pub trait MediaElement {
    fn set_source(&mut self, source_url: &str, poster_url: &str);
    fn clear_source(&mut self);
    fn current_time(&self) -> f64;
    fn set_current_time(&mut self, seconds: f64) -> Result<(), MediaError>;
    fn play(&mut self) -> Result<(), MediaError>;
    fn pause(&mut self);
    fn is_paused(&self) -> bool;
    fn is_muted(&self) -> bool;
    fn set_muted(&mut self, muted: bool);
    fn set_volume(&mut self, volume: f64);
    /// Native frame size once metadata is known.
    fn intrinsic_size(&self) -> Option<(u32, u32)>;
    fn set_fit_mode(&mut self, mode: FitMode);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlaybackPhase {
    #[default]
    Idle,
    Loading,
    Ready,
    Playing,
}

/// A seek waiting for the new source to load. Holds timeline time, not a
/// clip, so it survives edits made while loading.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingSeek {
    timeline_seconds: f64,
    auto_play: bool,
}

/// What a native time update changed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimeUpdate {
    /// Playhead to write back with the video as origin.
    pub playhead: Option<f64>,
    /// Clip playback moved on to.
    pub advanced_to: Option<usize>,
    /// Playback stopped at the end of the last clip.
    pub paused: bool,
}

/// Resolves `t` like [`locate`], except an instant past every clip (the exact
/// end included) maps to the final instant of the last clip starting before it.
fn locate_for_seek(t: f64, timeline: &Timeline) -> Option<Located> {
    if let Some(located) = locate(t, &timeline.clips) {
        return Some(located);
    }
    let starts = compute_clip_starts(&timeline.clips);
    let clip_index = starts.iter().rposition(|s| *s <= t)?;
    Some(Located {
        clip_index,
        within: clip_duration(&timeline.clips[clip_index]),
    })
}

/// Drives the playback element from the timeline and the other way round.
pub struct PlaybackSync<M: MediaElement> {
    element: M,
    resolver: CachedResolver,
    phase: PlaybackPhase,
    active_upload_id: Option<u64>,
    active_clip_index: usize,
    pending: Option<PendingSeek>,
    /// A muted play was issued only to decode a first frame.
    priming: bool,
    muted_before_priming: bool,
    fit_mode: FitMode,
    advance_threshold: f64,
    write_threshold: f64,
}

impl<M: MediaElement> PlaybackSync<M> {
    pub fn new(element: M, resolver: CachedResolver, config: &EngineConfig) -> Self {
        Self {
            element,
            resolver,
            phase: PlaybackPhase::Idle,
            active_upload_id: None,
            active_clip_index: 0,
            pending: None,
            priming: false,
            muted_before_priming: false,
            fit_mode: FitMode::default(),
            advance_threshold: config.advance_threshold_seconds,
            write_threshold: config.playhead_write_threshold_seconds,
        }
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    pub fn is_playing(&self) -> bool {
        self.phase == PlaybackPhase::Playing
    }

    pub fn active_clip_index(&self) -> usize {
        self.active_clip_index
    }

    pub fn active_upload_id(&self) -> Option<u64> {
        self.active_upload_id
    }

    pub fn fit_mode(&self) -> FitMode {
        self.fit_mode
    }

    pub fn element(&self) -> &M {
        &self.element
    }

    pub fn element_mut(&mut self) -> &mut M {
        &mut self.element
    }

    /// Points the element at timeline time `t`, swapping the source when the
    /// owning clip comes from another asset.
    pub fn seek(&mut self, timeline: &Timeline, t: f64, auto_play: bool) {
        if timeline.clips.is_empty() {
            return;
        }
        let t = clamp(round1(t), 0.0, timeline.total_duration());
        let Some(located) = locate_for_seek(t, timeline) else {
            return;
        };
        self.active_clip_index = located.clip_index;
        let clip = &timeline.clips[located.clip_index];
        if clip.upload_id == 0 {
            log::warn!("clip {} has no upload, not seeking", clip.id);
            return;
        }
        let source_seconds = (clip.source_start_seconds + located.within).max(0.0);

        if self.active_upload_id == Some(clip.upload_id) {
            if self.phase == PlaybackPhase::Loading {
                self.pending = Some(PendingSeek {
                    timeline_seconds: t,
                    auto_play,
                });
                return;
            }
            self.set_native_time(source_seconds);
            if auto_play {
                self.start_playing();
            }
            return;
        }

        let asset = match self.resolver.resolve(clip.upload_id) {
            Ok(asset) => asset,
            Err(err) => {
                log::warn!("cannot resolve upload {}: {err}", clip.upload_id);
                return;
            }
        };
        log::debug!("loading upload {} for clip {}", clip.upload_id, clip.id);
        self.priming = false;
        self.element.set_source(&asset.source_url, &asset.poster_url);
        self.active_upload_id = Some(clip.upload_id);
        self.phase = PlaybackPhase::Loading;
        self.pending = Some(PendingSeek {
            timeline_seconds: t,
            auto_play,
        });
    }

    /// The new source is ready: pick a fit mode and land the pending seek.
    pub fn on_loaded_metadata(&mut self, timeline: &Timeline) {
        if let Some((width, height)) = self.element.intrinsic_size() {
            self.fit_mode = FitMode::for_dimensions(width, height);
            self.element.set_fit_mode(self.fit_mode);
        }
        if self.phase == PlaybackPhase::Loading {
            self.phase = PlaybackPhase::Ready;
        }
        let Some(pending) = self.pending.take() else {
            return;
        };

        let t = clamp(pending.timeline_seconds, 0.0, timeline.total_duration());
        let Some(located) = locate_for_seek(t, timeline) else {
            return;
        };
        let clip = &timeline.clips[located.clip_index];
        if self.active_upload_id != Some(clip.upload_id) {
            // The clip list changed while loading; the loaded asset no longer
            // owns this instant.
            log::debug!("upload changed while loading, re-seeking to {t}");
            self.seek(timeline, t, pending.auto_play);
            return;
        }

        self.active_clip_index = located.clip_index;
        self.set_native_time((clip.source_start_seconds + located.within).max(0.0));
        if pending.auto_play {
            self.start_playing();
        } else {
            self.prime_first_frame();
        }
    }

    pub fn on_play(&mut self) {
        if self.priming {
            self.priming = false;
            self.element.pause();
            self.element.set_muted(self.muted_before_priming);
            return;
        }
        // A play event from the previous source can land after a seek
        // started loading another one.
        if self.phase != PlaybackPhase::Loading {
            self.phase = PlaybackPhase::Playing;
        }
    }

    pub fn on_pause(&mut self) {
        if self.phase == PlaybackPhase::Playing {
            self.phase = PlaybackPhase::Ready;
        }
    }

    pub fn toggle_play(&mut self, timeline: &Timeline) {
        if timeline.clips.is_empty() {
            return;
        }
        if self.is_playing() {
            self.pause();
            return;
        }
        self.priming = false;
        self.element.set_muted(false);
        self.element.set_volume(1.0);
        self.seek(timeline, timeline.playhead_seconds, true);
    }

    pub fn pause(&mut self) {
        self.priming = false;
        self.element.pause();
        if self.phase == PlaybackPhase::Playing {
            self.phase = PlaybackPhase::Ready;
        }
    }

    /// Follows the element's clock while playing. Crossing the end of a clip
    /// moves playback to the next one; the last clip pauses.
    pub fn on_time_update(&mut self, timeline: &Timeline) -> TimeUpdate {
        let mut update = TimeUpdate::default();
        if !self.is_playing() || timeline.clips.is_empty() {
            return update;
        }
        let last = timeline.clips.len() - 1;
        let index = self.active_clip_index.min(last);
        let starts = compute_clip_starts(&timeline.clips);
        let clip = &timeline.clips[index];

        let within_now = (self.element.current_time() - clip.source_start_seconds).max(0.0);
        let next = clamp(round1(starts[index] + within_now), 0.0, timeline.total_duration());
        if (next - timeline.playhead_seconds).abs() >= self.write_threshold {
            update.playhead = Some(next);
        }

        let clip_len = clip.source_len();
        if index < last && within_now >= clip_len - self.advance_threshold {
            let next_start = starts[index + 1];
            log::debug!("advancing playback to clip {}", timeline.clips[index + 1].id);
            self.active_clip_index = index + 1;
            update.playhead = Some(next_start);
            update.advanced_to = Some(index + 1);
            self.seek(timeline, next_start, true);
        } else if index == last && within_now >= clip_len - TIME_EPSILON {
            self.pause();
            update.paused = true;
        }
        update
    }

    /// Back to idle with no source, for a new project or an empty timeline.
    pub fn reset(&mut self) {
        self.element.pause();
        self.element.clear_source();
        self.phase = PlaybackPhase::Idle;
        self.active_upload_id = None;
        self.active_clip_index = 0;
        self.pending = None;
        self.priming = false;
    }

    fn set_native_time(&mut self, seconds: f64) {
        if let Err(err) = self.element.set_current_time(seconds) {
            log::debug!("setting native time failed: {err}");
        }
    }

    fn start_playing(&mut self) {
        match self.element.play() {
            Ok(()) => self.phase = PlaybackPhase::Playing,
            Err(err) => log::debug!("play failed: {err}"),
        }
    }

    /// Some hosts show nothing until a frame is decoded, so play muted and
    /// pause again from [`Self::on_play`].
    fn prime_first_frame(&mut self) {
        self.muted_before_priming = self.element.is_muted();
        self.element.set_muted(true);
        match self.element.play() {
            Ok(()) => self.priming = true,
            Err(err) => {
                log::debug!("priming failed: {err}");
                self.element.set_muted(self.muted_before_priming);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::asset::ProxyUrlResolver;
    use crate::types::clip::Clip;

    /// Records what the engine asks of the element.
    #[derive(Debug, Default)]
    struct FakeElement {
        source: Option<String>,
        loads: usize,
        time: f64,
        paused: bool,
        muted: bool,
        volume: f64,
        size: Option<(u32, u32)>,
        fit: Option<FitMode>,
        plays: usize,
        reject_play: bool,
    }

    impl FakeElement {
        fn new() -> Self {
            Self {
                paused: true,
                ..Self::default()
            }
        }
    }

    impl MediaElement for FakeElement {
        fn set_source(&mut self, source_url: &str, _poster_url: &str) {
            self.source = Some(source_url.to_string());
            self.loads += 1;
            self.paused = true;
        }
        fn clear_source(&mut self) {
            self.source = None;
        }
        fn current_time(&self) -> f64 {
            self.time
        }
        fn set_current_time(&mut self, seconds: f64) -> Result<(), MediaError> {
            self.time = seconds;
            Ok(())
        }
        fn play(&mut self) -> Result<(), MediaError> {
            if self.reject_play {
                return Err(MediaError::PlayRejected("autoplay blocked".to_string()));
            }
            self.plays += 1;
            self.paused = false;
            Ok(())
        }
        fn pause(&mut self) {
            self.paused = true;
        }
        fn is_paused(&self) -> bool {
            self.paused
        }
        fn is_muted(&self) -> bool {
            self.muted
        }
        fn set_muted(&mut self, muted: bool) {
            self.muted = muted;
        }
        fn set_volume(&mut self, volume: f64) {
            self.volume = volume;
        }
        fn intrinsic_size(&self) -> Option<(u32, u32)> {
            self.size
        }
        fn set_fit_mode(&mut self, mode: FitMode) {
            self.fit = Some(mode);
        }
    }

    fn sync() -> PlaybackSync<FakeElement> {
        let config = EngineConfig::default();
        let resolver = CachedResolver::new(Box::new(ProxyUrlResolver::new("/api/uploads")), 8);
        PlaybackSync::new(FakeElement::new(), resolver, &config)
    }

    fn two_assets() -> Timeline {
        Timeline::with_clips(vec![Clip::new("A", 1, 0.0, 5.0), Clip::new("B", 2, 5.0, 9.0)])
    }

    #[test]
    fn test_fit_mode_from_aspect() {
        assert_eq!(FitMode::for_dimensions(1080, 1920), FitMode::Cover);
        assert_eq!(FitMode::for_dimensions(1920, 1080), FitMode::Contain);
        assert_eq!(FitMode::for_dimensions(720, 720), FitMode::Contain);
    }

    #[test]
    fn test_seek_into_new_asset_loads_then_primes() {
        let mut playback = sync();
        let timeline = two_assets();
        playback.seek(&timeline, 6.0, false);
        assert_eq!(playback.phase(), PlaybackPhase::Loading);
        assert_eq!(playback.active_upload_id(), Some(2));
        assert_eq!(playback.element().source.as_deref(), Some("/api/uploads/2/edit-proxy#t=0.1"));

        playback.element_mut().size = Some((1080, 1920));
        playback.on_loaded_metadata(&timeline);
        assert_eq!(playback.phase(), PlaybackPhase::Ready);
        assert_eq!(playback.fit_mode(), FitMode::Cover);
        assert_eq!(playback.element().time, 6.0);
        assert!(playback.element().muted);

        playback.on_play();
        assert!(playback.element().paused);
        assert!(!playback.element().muted);
        assert_eq!(playback.phase(), PlaybackPhase::Ready);
    }

    #[test]
    fn test_late_play_event_does_not_end_loading() {
        let mut playback = sync();
        let timeline = two_assets();
        playback.seek(&timeline, 1.0, true);
        playback.on_loaded_metadata(&timeline);
        assert_eq!(playback.phase(), PlaybackPhase::Playing);

        playback.seek(&timeline, 6.0, true);
        assert_eq!(playback.phase(), PlaybackPhase::Loading);
        playback.on_play();
        assert_eq!(playback.phase(), PlaybackPhase::Loading);

        playback.on_loaded_metadata(&timeline);
        assert_eq!(playback.phase(), PlaybackPhase::Playing);
        assert_eq!(playback.active_upload_id(), Some(2));
    }

    #[test]
    fn test_seek_within_loaded_asset_sets_time_only() {
        let mut playback = sync();
        let timeline = two_assets();
        playback.seek(&timeline, 1.0, false);
        playback.on_loaded_metadata(&timeline);
        playback.on_play();
        playback.seek(&timeline, 3.0, false);
        assert_eq!(playback.element().loads, 1);
        assert_eq!(playback.element().time, 3.0);
    }

    #[test]
    fn test_seek_at_end_maps_to_last_instant() {
        let mut playback = sync();
        let timeline = two_assets();
        playback.seek(&timeline, 9.0, false);
        playback.on_loaded_metadata(&timeline);
        assert_eq!(playback.active_clip_index(), 1);
        assert_eq!(playback.element().time, 9.0);
    }

    #[test]
    fn test_pending_seek_relocates_after_edit() {
        let mut playback = sync();
        let timeline = two_assets();
        playback.seek(&timeline, 6.0, false);
        // Clip A is stretched while upload 2 loads; 6.0 now belongs to upload 1.
        let mut edited = timeline.clone();
        edited.clips[0].source_end_seconds = 8.0;
        playback.on_loaded_metadata(&edited);
        assert_eq!(playback.phase(), PlaybackPhase::Loading);
        assert_eq!(playback.active_upload_id(), Some(1));
        assert_eq!(playback.element().loads, 2);
    }

    #[test]
    fn test_toggle_play_unmutes_and_plays() {
        let mut playback = sync();
        let mut timeline = two_assets();
        timeline.playhead_seconds = 2.0;
        playback.seek(&timeline, 2.0, false);
        playback.on_loaded_metadata(&timeline);
        playback.on_play();

        playback.toggle_play(&timeline);
        assert!(playback.is_playing());
        assert!(!playback.element().muted);
        assert_eq!(playback.element().volume, 1.0);
        playback.toggle_play(&timeline);
        assert_eq!(playback.phase(), PlaybackPhase::Ready);
        assert!(playback.element().paused);
    }

    #[test]
    fn test_rejected_play_stays_ready() {
        let mut playback = sync();
        let timeline = two_assets();
        playback.seek(&timeline, 0.0, false);
        playback.on_loaded_metadata(&timeline);
        playback.on_play();
        playback.element_mut().reject_play = true;
        playback.toggle_play(&timeline);
        assert_eq!(playback.phase(), PlaybackPhase::Ready);
    }

    #[test]
    fn test_time_update_writes_and_advances() {
        let mut playback = sync();
        let mut timeline = two_assets();
        playback.toggle_play(&timeline);
        playback.on_loaded_metadata(&timeline);
        assert!(playback.is_playing());

        playback.element_mut().time = 0.04;
        assert_eq!(playback.on_time_update(&timeline), TimeUpdate::default());

        playback.element_mut().time = 2.0;
        let update = playback.on_time_update(&timeline);
        assert_eq!(update.playhead, Some(2.0));
        timeline.playhead_seconds = 2.0;

        playback.element_mut().time = 4.9;
        let update = playback.on_time_update(&timeline);
        assert_eq!(update.advanced_to, Some(1));
        assert_eq!(update.playhead, Some(5.0));
        assert_eq!(playback.active_clip_index(), 1);
        assert_eq!(playback.phase(), PlaybackPhase::Loading);
    }

    #[test]
    fn test_last_clip_pauses_at_end() {
        let mut playback = sync();
        let mut timeline = two_assets();
        timeline.playhead_seconds = 5.0;
        playback.seek(&timeline, 5.0, true);
        playback.on_loaded_metadata(&timeline);
        playback.element_mut().time = 8.97;
        let update = playback.on_time_update(&timeline);
        assert!(update.paused);
        assert!(!playback.is_playing());
    }

    #[test]
    fn test_reset_clears_asset() {
        let mut playback = sync();
        let timeline = two_assets();
        playback.seek(&timeline, 0.0, false);
        playback.reset();
        assert_eq!(playback.phase(), PlaybackPhase::Idle);
        assert_eq!(playback.active_upload_id(), None);
        assert!(playback.element().source.is_none());
        playback.on_loaded_metadata(&timeline);
        assert_eq!(playback.element().time, 0.0);
    }
}
