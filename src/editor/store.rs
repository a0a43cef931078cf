use crate::types::timeline::Timeline;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Clip list or trim edit.
    Edit,
    /// Only the playhead moved.
    Playhead,
    /// Undo brought back an earlier state.
    Restore,
    /// A project was loaded or reset.
    Load,
    /// Only the selected clip changed.
    Selection,
}

pub struct StoreEvent<'a> {
    pub kind: ChangeKind,
    pub timeline: &'a Timeline,
    pub selected_clip_id: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(usize);

type Listener = Box<dyn FnMut(&StoreEvent<'_>)>;

/// Single owner of the working timeline and the clip selection.
///
/// Every write goes through [`TimelineStore::mutate`] or one of the
/// replacing setters, and subscribers hear about each change that actually
/// altered something.
pub struct TimelineStore {
    timeline: Timeline,
    selected_clip_id: Option<String>,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: usize,
}

impl TimelineStore {
    pub fn new(timeline: Timeline) -> Self {
        Self {
            timeline,
            selected_clip_id: None,
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn selected_clip_id(&self) -> Option<&str> {
        self.selected_clip_id.as_deref()
    }

    /// Applies `f` to the timeline. Returns whether the timeline changed;
    /// listeners are only told when it did.
    pub fn mutate(&mut self, kind: ChangeKind, f: impl FnOnce(&mut Timeline)) -> bool {
        let mut next = self.timeline.clone();
        f(&mut next);
        if next == self.timeline {
            return false;
        }
        self.timeline = next;
        self.notify(kind);
        true
    }

    /// Swaps in a whole new state, as produced by an edit or a restore.
    pub fn replace(&mut self, kind: ChangeKind, timeline: Timeline, selected_clip_id: Option<String>) {
        self.timeline = timeline;
        self.selected_clip_id = selected_clip_id;
        self.notify(kind);
    }

    /// Changes the selected clip. Returns whether it changed; listeners are
    /// only told when it did.
    pub fn select(&mut self, clip_id: Option<String>) -> bool {
        if self.selected_clip_id == clip_id {
            return false;
        }
        self.selected_clip_id = clip_id;
        self.notify(ChangeKind::Selection);
        true
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&StoreEvent<'_>) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    fn notify(&mut self, kind: ChangeKind) {
        let event = StoreEvent {
            kind,
            timeline: &self.timeline,
            selected_clip_id: self.selected_clip_id.as_deref(),
        };
        for (_, listener) in self.listeners.iter_mut() {
            listener(&event);
        }
    }
}
