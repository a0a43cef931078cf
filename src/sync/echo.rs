/// Which view last wrote the playhead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Buttons, keyboard, clicks and nudges.
    User,
    /// The playback element's native time.
    Video,
    /// Scrolling the time ruler.
    Ruler,
    /// Whole-state replacement such as an edit or an undo restore.
    History,
}

impl Origin {
    /// Whether the playback element should follow a change from this origin.
    pub fn feeds_playback(self) -> bool {
        self != Origin::Video
    }

    /// Whether the ruler should re-center after a change from this origin.
    pub fn feeds_ruler(self) -> bool {
        self != Origin::Ruler
    }

    /// Changes the user makes while playing pause playback first.
    pub fn pauses_playback(self) -> bool {
        matches!(self, Origin::User | Origin::Ruler)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayheadChange {
    pub seconds: f64,
    pub origin: Origin,
}

/// Remembers the writer of the latest playhead change so the views can be
/// reconciled without re-broadcasting a change back to where it came from.
#[derive(Debug, Default)]
pub struct EchoGuard {
    pending: Option<PlayheadChange>,
    last_writer: Option<Origin>,
}

impl EchoGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, seconds: f64, origin: Origin) {
        self.pending = Some(PlayheadChange { seconds, origin });
        self.last_writer = Some(origin);
    }

    /// Takes the change waiting to be reconciled. Each change settles once.
    pub fn settle(&mut self) -> Option<PlayheadChange> {
        self.pending.take()
    }

    pub fn last_writer(&self) -> Option<Origin> {
        self.last_writer
    }

    pub fn clear(&mut self) {
        self.pending = None;
        self.last_writer = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_views_skip_their_own_writes() {
        assert!(!Origin::Video.feeds_playback());
        assert!(Origin::Video.feeds_ruler());
        assert!(Origin::Ruler.feeds_playback());
        assert!(!Origin::Ruler.feeds_ruler());
        assert!(Origin::History.feeds_playback() && Origin::History.feeds_ruler());
        assert!(!Origin::Video.pauses_playback());
        assert!(Origin::Ruler.pauses_playback());
    }

    #[test]
    fn test_change_settles_once() {
        let mut guard = EchoGuard::new();
        guard.record(2.5, Origin::Ruler);
        assert_eq!(guard.last_writer(), Some(Origin::Ruler));
        assert_eq!(guard.settle(), Some(PlayheadChange { seconds: 2.5, origin: Origin::Ruler }));
        assert_eq!(guard.settle(), None);
        assert_eq!(guard.last_writer(), Some(Origin::Ruler));
        guard.clear();
        assert_eq!(guard.last_writer(), None);
    }
}
