use std::collections::HashMap;
use std::time::Instant;

use crate::config::EngineConfig;
use crate::editor::autosave::{AutosaveGate, ProjectSink};
use crate::editor::drag::{DragController, DragSession, TrimEdge};
use crate::editor::history::{Snapshot, UndoHistory};
use crate::editor::nudge::{NudgeDirection, NudgeRepeater};
use crate::editor::store::{ChangeKind, ListenerId, StoreEvent, TimelineStore};
use crate::error::Result;
use crate::ops::clip_ops::{self, Edit};
use crate::ops::migrations::migrate_timeline;
use crate::ops::time_math::{TIME_EPSILON, clamp, clip_boundaries, clip_duration, locate, round1};
use crate::sync::echo::{EchoGuard, Origin};
use crate::sync::playback::{MediaElement, PlaybackSync, TimeUpdate};
use crate::sync::ruler::RulerSync;
use crate::types::asset::{AssetCandidate, AssetMetadata, AssetResolver, CachedResolver, ProxyUrlResolver};
use crate::types::clip::Clip;
use crate::types::project::ProjectRecord;
use crate::types::timeline::Timeline;

/// One open project and every piece of runtime state that edits it.
///
/// The project timeline is persistent; playback, ruler, drag and history
/// state exist only for this session. All edits go through here so each one
/// is checkpointed, reconciled across the views and scheduled for autosave.
pub struct Editor<M: MediaElement> {
    config: EngineConfig,
    project_id: u64,
    status: String,
    store: TimelineStore,
    history: UndoHistory,
    playback: PlaybackSync<M>,
    ruler: RulerSync,
    echo: EchoGuard,
    drag: DragController,
    nudge: NudgeRepeater,
    autosave: AutosaveGate,
    asset_names: HashMap<u64, String>,
    asset_durations: HashMap<u64, f64>,
}

impl<M: MediaElement> Editor<M> {
    pub fn new(element: M, resolver: Box<dyn AssetResolver>, config: EngineConfig) -> Self {
        let resolver = CachedResolver::new(resolver, config.asset_cache_capacity);
        Self {
            project_id: 0,
            status: String::new(),
            store: TimelineStore::new(Timeline::new()),
            history: UndoHistory::new(config.undo_limit),
            playback: PlaybackSync::new(element, resolver, &config),
            ruler: RulerSync::new(&config),
            echo: EchoGuard::new(),
            drag: DragController::new(config.split_min_seconds),
            nudge: NudgeRepeater::new(&config),
            autosave: AutosaveGate::new(config.autosave_debounce()),
            asset_names: HashMap::new(),
            asset_durations: HashMap::new(),
            config,
        }
    }

    /// Uses the edit-proxy URL scheme under `config.proxy_base_url`.
    pub fn with_proxy_resolver(element: M, config: EngineConfig) -> Self {
        let resolver = ProxyUrlResolver::new(config.proxy_base_url.clone());
        Self::new(element, Box::new(resolver), config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn project_id(&self) -> u64 {
        self.project_id
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn timeline(&self) -> &Timeline {
        self.store.timeline()
    }

    pub fn selected_clip_id(&self) -> Option<&str> {
        self.store.selected_clip_id()
    }

    pub fn playback(&self) -> &PlaybackSync<M> {
        &self.playback
    }

    pub fn playback_mut(&mut self) -> &mut PlaybackSync<M> {
        &mut self.playback
    }

    pub fn ruler(&self) -> &RulerSync {
        &self.ruler
    }

    pub fn drag_session(&self) -> Option<&DragSession> {
        self.drag.session()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn undo_depth(&self) -> usize {
        self.history.len()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&StoreEvent<'_>) + 'static) -> ListenerId {
        self.store.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.store.unsubscribe(id)
    }

    /// Opens `record`, upgrading its timeline first. Returns whether the
    /// timeline was migrated; a migrated timeline is queued for autosave.
    pub fn load_project(&mut self, record: ProjectRecord, now: Instant) -> bool {
        let original = record.timeline;
        let migrated = migrate_timeline(original.clone());
        log::info!("opened project {} with {} clip(s)", record.id, migrated.timeline.clips.len());

        self.project_id = record.id;
        self.status = record.status;
        self.drag.cancel();
        self.nudge.release();
        self.history.clear();
        self.echo.clear();
        self.playback.reset();
        self.ruler.reset();

        let mut timeline = migrated.timeline;
        timeline.clamp_playhead();
        self.autosave.rebaseline(&original);
        self.store.replace(ChangeKind::Load, timeline, None);
        if migrated.changed {
            self.autosave.note_change(now);
        }

        let playhead = self.timeline().playhead_seconds;
        self.echo.record(playhead, Origin::History);
        self.reconcile();
        migrated.changed
    }

    /// Replaces the open project with an empty one.
    pub fn reset_project(&mut self, project_id: u64, now: Instant) {
        self.load_project(ProjectRecord::new(project_id), now);
    }

    pub fn select_clip(&mut self, clip_id: Option<&str>) {
        let clip_id = clip_id.filter(|id| self.timeline().clip_index(id).is_some());
        self.store.select(clip_id.map(str::to_string));
    }

    /// Selects the clip under a click on the ruler.
    pub fn select_at(&mut self, click_x: f64) {
        let t = self.ruler.time_at(click_x, self.timeline().total_duration());
        let clip_id = locate(t, &self.timeline().clips)
            .map(|located| self.timeline().clips[located.clip_index].id.clone());
        if clip_id.is_some() {
            self.store.select(clip_id);
        }
    }

    pub fn insert_clip(&mut self, clip: Clip, now: Instant) {
        let edit = clip_ops::insert_clip_at_playhead(self.timeline(), clip);
        self.checkpoint();
        self.apply_edit(edit, now);
    }

    /// Adds a full-length clip for a picker candidate at the playhead.
    pub fn insert_asset(&mut self, asset: &AssetCandidate, now: Instant) -> Result<()> {
        let clip = clip_ops::new_clip_from_asset(asset)?;
        self.asset_names.entry(asset.id).or_insert_with(|| asset.name.clone());
        if let Some(duration) = asset.duration_seconds.filter(|d| d.is_finite() && *d > 0.0) {
            self.asset_durations.insert(asset.id, duration);
        }
        self.insert_clip(clip, now);
        Ok(())
    }

    pub fn split_at_playhead(&mut self, now: Instant) -> bool {
        let edit = clip_ops::split_clip_at_playhead_with(
            self.timeline(),
            self.selected_clip_id(),
            self.config.split_min_seconds,
        );
        self.commit(edit, now)
    }

    pub fn delete_selected(&mut self, now: Instant) -> bool {
        let edit = clip_ops::delete_clip(self.timeline(), self.selected_clip_id());
        self.commit(edit, now)
    }

    /// Sets a clip's source window, clamped to the asset's known length.
    pub fn set_clip_trim(&mut self, clip_id: &str, source_start: f64, source_end: f64, now: Instant) -> bool {
        let max_source = self.max_source_for(clip_id);
        let edit = clip_ops::set_clip_trim(self.timeline(), clip_id, source_start, source_end, max_source);
        self.commit(edit, now)
    }

    /// Restores the latest snapshot. The restore is queued for autosave and
    /// only saved if it differs from what was last persisted.
    pub fn undo(&mut self, now: Instant) -> bool {
        let Some(snapshot) = self.history.undo() else {
            return false;
        };
        self.drag.cancel();
        self.ruler.unlock();
        log::debug!("undo, {} snapshot(s) left", self.history.len());
        self.autosave.note_change(now);
        self.store.replace(ChangeKind::Restore, snapshot.timeline, snapshot.selected_clip_id);
        self.after_replace();
        true
    }

    /// Moves the playhead on behalf of `origin` and brings the other views
    /// along. Returns whether the playhead moved.
    pub fn write_playhead(&mut self, t: f64, origin: Origin, now: Instant) -> bool {
        let t = clamp(round1(t), 0.0, self.timeline().total_duration());
        if !self.store.mutate(ChangeKind::Playhead, |timeline| timeline.playhead_seconds = t) {
            return false;
        }
        self.echo.record(t, origin);
        self.autosave.note_change(now);
        self.reconcile();
        true
    }

    pub fn seek(&mut self, t: f64, now: Instant) -> bool {
        self.write_playhead(t, Origin::User, now)
    }

    pub fn nudge(&mut self, delta: f64, now: Instant) -> bool {
        let t = self.timeline().playhead_seconds + delta;
        self.write_playhead(t, Origin::User, now)
    }

    pub fn nudge_press(&mut self, direction: NudgeDirection, now: Instant) -> bool {
        let delta = self.nudge.press(direction, now);
        self.nudge(delta, now)
    }

    /// Fires held nudges that came due.
    pub fn nudge_tick(&mut self, now: Instant) -> bool {
        match self.nudge.tick(now) {
            Some(delta) => self.nudge(delta, now),
            None => false,
        }
    }

    /// Pointer-up or pointer-leave on a nudge button.
    pub fn nudge_release(&mut self) {
        self.nudge.release();
    }

    pub fn jump_to_previous_boundary(&mut self, now: Instant) -> bool {
        let playhead = self.timeline().playhead_seconds;
        let target = clip_boundaries(&self.timeline().clips)
            .into_iter()
            .rev()
            .find(|b| *b < playhead - TIME_EPSILON);
        target.is_some_and(|t| self.write_playhead(t, Origin::User, now))
    }

    pub fn jump_to_next_boundary(&mut self, now: Instant) -> bool {
        let playhead = self.timeline().playhead_seconds;
        let target = clip_boundaries(&self.timeline().clips)
            .into_iter()
            .find(|b| *b > playhead + TIME_EPSILON);
        target.is_some_and(|t| self.write_playhead(t, Origin::User, now))
    }

    pub fn toggle_play(&mut self) {
        self.playback.toggle_play(self.store.timeline());
    }

    pub fn on_loaded_metadata(&mut self) {
        self.playback.on_loaded_metadata(self.store.timeline());
    }

    pub fn on_play(&mut self) {
        self.playback.on_play();
    }

    pub fn on_pause(&mut self) {
        self.playback.on_pause();
    }

    pub fn on_time_update(&mut self, now: Instant) -> TimeUpdate {
        let update = self.playback.on_time_update(self.store.timeline());
        if let Some(playhead) = update.playhead {
            self.write_playhead(playhead, Origin::Video, now);
        }
        update
    }

    pub fn set_viewport_width(&mut self, width: f64) {
        self.ruler.set_viewport_width(width);
    }

    pub fn on_ruler_scroll(&mut self, scroll_left: f64, now: Instant) -> bool {
        let timeline = self.store.timeline();
        let scrubbed = self
            .ruler
            .on_scroll(scroll_left, timeline.playhead_seconds, timeline.total_duration());
        scrubbed.is_some_and(|t| self.write_playhead(t, Origin::Ruler, now))
    }

    pub fn on_animation_frame(&mut self) {
        self.ruler.on_animation_frame();
    }

    /// Pointer-down on a clip edge. Checkpoints the timeline and takes over
    /// the ruler for the gesture.
    pub fn begin_trim(&mut self, pointer_id: i64, clip_id: &str, edge: TrimEdge, x: f64) -> bool {
        if self.drag.is_active() {
            return false;
        }
        let Some(clip) = self.timeline().clip(clip_id).cloned() else {
            return false;
        };
        let max_source = self.max_source_for(clip_id);
        if !self.drag.begin(pointer_id, &clip, edge, x, max_source) {
            return false;
        }
        if self.playback.is_playing() {
            self.playback.pause();
        }
        self.checkpoint();
        self.ruler.lock();
        self.store.select(Some(clip.id));
        true
    }

    /// Pointer-move during a trim. Shows the frame at the moving edge and
    /// returns the session for the preview.
    pub fn trim_move(&mut self, pointer_id: i64, x: f64) -> Option<DragSession> {
        let session = self.drag.update(pointer_id, x, self.ruler.px_per_second())?.clone();
        let mut draft = self.timeline().clone();
        let index = draft.clip_index(&session.clip_id)?;
        draft.clips[index].source_start_seconds = session.source_start;
        draft.clips[index].source_end_seconds = session.source_end;
        let start = draft.clip_starts()[index];
        let t = match session.edge {
            TrimEdge::Start => start,
            TrimEdge::End => round1(start + (clip_duration(&draft.clips[index]) - 0.1).max(0.0)),
        };
        self.playback.seek(&draft, t, false);
        Some(session)
    }

    /// Pointer-up. Commits the dragged window. Returns whether the timeline
    /// changed; an unmoved drag leaves no undo entry behind.
    pub fn finish_trim(&mut self, pointer_id: i64, now: Instant) -> bool {
        let Some(session) = self.drag.finish(pointer_id) else {
            return false;
        };
        self.ruler.unlock();
        let edit = clip_ops::set_clip_trim(
            self.timeline(),
            &session.clip_id,
            session.source_start,
            session.source_end,
            session.max_source_seconds,
        );
        match edit {
            Some(edit) => {
                self.apply_edit(edit, now);
                true
            }
            None => {
                self.history.undo();
                self.resync_playback();
                false
            }
        }
    }

    /// Pointer-cancel or lost capture. The draft is dropped.
    pub fn cancel_trim(&mut self) {
        if self.drag.cancel().is_none() {
            return;
        }
        self.history.undo();
        self.ruler.unlock();
        self.resync_playback();
    }

    /// Window blur ends every gesture.
    pub fn blur(&mut self) {
        self.cancel_trim();
        self.nudge.release();
    }

    /// Records display names and real lengths from a metadata lookup.
    pub fn apply_asset_metadata(&mut self, items: &[AssetMetadata]) -> usize {
        let mut updated = 0;
        for item in items.iter().filter(|item| item.id > 0) {
            let name = if item.name.trim().is_empty() {
                format!("Video {}", item.id)
            } else {
                item.name.clone()
            };
            self.asset_names.insert(item.id, name);
            if let Some(duration) = item.duration_seconds.filter(|d| d.is_finite() && *d > 0.0) {
                self.asset_durations.insert(item.id, duration);
            }
            updated += 1;
        }
        updated
    }

    /// Upload ids on the timeline with no known display name yet.
    pub fn missing_asset_names(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self
            .timeline()
            .clips
            .iter()
            .map(|clip| clip.upload_id)
            .filter(|id| *id > 0 && !self.asset_names.contains_key(id))
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    pub fn clip_display_name(&self, clip_id: &str) -> Option<String> {
        let clip = self.timeline().clip(clip_id)?;
        Some(
            self.asset_names
                .get(&clip.upload_id)
                .cloned()
                .unwrap_or_else(|| format!("Video {}", clip.upload_id)),
        )
    }

    pub fn poll_autosave(&mut self, now: Instant, sink: &mut dyn ProjectSink) -> bool {
        self.autosave.poll(now, self.project_id, self.store.timeline(), sink)
    }

    pub fn autosave_pending(&self) -> bool {
        self.autosave.is_pending()
    }

    fn max_source_for(&self, clip_id: &str) -> Option<f64> {
        let clip = self.timeline().clip(clip_id)?;
        self.asset_durations.get(&clip.upload_id).copied()
    }

    fn checkpoint(&mut self) {
        self.history.push(Snapshot {
            timeline: self.store.timeline().clone(),
            selected_clip_id: self.store.selected_clip_id().map(str::to_string),
        });
    }

    /// Checkpoints and applies an accepted edit. A declined edit is a no-op.
    fn commit(&mut self, edit: Option<Edit>, now: Instant) -> bool {
        let Some(edit) = edit else {
            return false;
        };
        self.checkpoint();
        self.apply_edit(edit, now);
        true
    }

    fn apply_edit(&mut self, edit: Edit, now: Instant) {
        self.store.replace(ChangeKind::Edit, edit.timeline, edit.selected_clip_id);
        self.autosave.note_change(now);
        self.after_replace();
    }

    fn after_replace(&mut self) {
        if self.timeline().clips.is_empty() {
            self.playback.reset();
            self.echo.clear();
            self.ruler.recenter(0.0, 0.0);
            return;
        }
        let playhead = self.timeline().playhead_seconds;
        self.echo.record(playhead, Origin::History);
        self.reconcile();
    }

    /// Puts the element back on the playhead after a drag preview moved it.
    fn resync_playback(&mut self) {
        let timeline = self.store.timeline();
        self.playback.seek(timeline, timeline.playhead_seconds, false);
    }

    /// Pushes the latest playhead change to every view except the one that
    /// made it.
    fn reconcile(&mut self) {
        let Some(change) = self.echo.settle() else {
            return;
        };
        let timeline = self.store.timeline();
        if change.origin.feeds_playback() {
            let keep_playing = self.playback.is_playing() && !change.origin.pauses_playback();
            if self.playback.is_playing() && change.origin.pauses_playback() {
                self.playback.pause();
            }
            self.playback.seek(timeline, change.seconds, keep_playing);
        }
        if change.origin.feeds_ruler() {
            self.ruler.recenter(change.seconds, timeline.total_duration());
        }
    }
}
