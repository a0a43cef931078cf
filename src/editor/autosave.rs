use std::time::{Duration, Instant};

use crate::error::Result;
use crate::types::timeline::Timeline;

/// Where settled timelines are persisted.
pub trait ProjectSink {
    fn save(&mut self, project_id: u64, timeline: &Timeline) -> Result<()>;
}

/// Decides when a timeline is worth saving: once changes have been quiet for
/// the debounce window, and only if the serialized timeline differs from the
/// last one saved.
#[derive(Debug)]
pub struct AutosaveGate {
    debounce: Duration,
    last_saved: Option<String>,
    dirty_since: Option<Instant>,
}

impl AutosaveGate {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            last_saved: None,
            dirty_since: None,
        }
    }

    /// Treats `timeline` as already saved. Used after a load so opening a
    /// project does not trigger a save by itself.
    pub fn rebaseline(&mut self, timeline: &Timeline) {
        match serde_json::to_string(timeline) {
            Ok(json) => self.last_saved = Some(json),
            Err(err) => log::warn!("cannot serialize timeline for autosave: {err}"),
        }
        self.dirty_since = None;
    }

    /// Restarts the debounce window.
    pub fn note_change(&mut self, now: Instant) {
        self.dirty_since = Some(now);
    }

    pub fn is_pending(&self) -> bool {
        self.dirty_since.is_some()
    }

    /// Saves through `sink` once the debounce has elapsed. Returns whether a
    /// save went out. A failed save is logged and retried on the next change.
    pub fn poll(&mut self, now: Instant, project_id: u64, timeline: &Timeline, sink: &mut dyn ProjectSink) -> bool {
        let Some(since) = self.dirty_since else {
            return false;
        };
        if now.saturating_duration_since(since) < self.debounce {
            return false;
        }
        self.dirty_since = None;

        let json = match serde_json::to_string(timeline) {
            Ok(json) => json,
            Err(err) => {
                log::warn!("cannot serialize timeline for autosave: {err}");
                return false;
            }
        };
        if self.last_saved.as_deref() == Some(json.as_str()) {
            return false;
        }
        match sink.save(project_id, timeline) {
            Ok(()) => {
                log::debug!("autosaved project {project_id}");
                self.last_saved = Some(json);
                true
            }
            Err(err) => {
                log::warn!("autosave of project {project_id} failed: {err}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::types::clip::Clip;

    #[derive(Default)]
    struct RecordingSink {
        saved: Vec<(u64, Timeline)>,
        fail: bool,
    }

    impl ProjectSink for RecordingSink {
        fn save(&mut self, project_id: u64, timeline: &Timeline) -> Result<()> {
            if self.fail {
                return Err(EngineError::InvalidArgument("offline".to_string()));
            }
            self.saved.push((project_id, timeline.clone()));
            Ok(())
        }
    }

    fn gate() -> AutosaveGate {
        AutosaveGate::new(Duration::from_millis(400))
    }

    #[test]
    fn test_saves_after_quiet_period() {
        let mut gate = gate();
        let mut sink = RecordingSink::default();
        let timeline = Timeline::with_clips(vec![Clip::new("a", 1, 0.0, 3.0)]);
        let t0 = Instant::now();
        gate.rebaseline(&Timeline::new());
        gate.note_change(t0);
        assert!(!gate.poll(t0 + Duration::from_millis(399), 1, &timeline, &mut sink));
        gate.note_change(t0 + Duration::from_millis(300));
        assert!(!gate.poll(t0 + Duration::from_millis(500), 1, &timeline, &mut sink));
        assert!(gate.poll(t0 + Duration::from_millis(700), 1, &timeline, &mut sink));
        assert_eq!(sink.saved.len(), 1);
        assert!(!gate.is_pending());
    }

    #[test]
    fn test_unchanged_timeline_is_not_resaved() {
        let mut gate = gate();
        let mut sink = RecordingSink::default();
        let timeline = Timeline::with_clips(vec![Clip::new("a", 1, 0.0, 3.0)]);
        let t0 = Instant::now();
        gate.rebaseline(&timeline);
        gate.note_change(t0);
        assert!(!gate.poll(t0 + Duration::from_secs(1), 1, &timeline, &mut sink));
        assert!(sink.saved.is_empty());
    }

    #[test]
    fn test_failed_save_keeps_old_baseline() {
        let mut gate = gate();
        let mut sink = RecordingSink {
            fail: true,
            ..RecordingSink::default()
        };
        let timeline = Timeline::with_clips(vec![Clip::new("a", 1, 0.0, 3.0)]);
        let t0 = Instant::now();
        gate.note_change(t0);
        assert!(!gate.poll(t0 + Duration::from_secs(1), 1, &timeline, &mut sink));
        sink.fail = false;
        gate.note_change(t0 + Duration::from_secs(1));
        assert!(gate.poll(t0 + Duration::from_secs(2), 1, &timeline, &mut sink));
    }
}
