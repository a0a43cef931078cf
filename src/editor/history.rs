use std::collections::VecDeque;

use crate::types::timeline::Timeline;

/// Editor state captured before a mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub timeline: Timeline,
    pub selected_clip_id: Option<String>,
}

/// Bounded undo stack. The oldest snapshot is evicted once the limit is
/// reached. There is no redo.
#[derive(Debug)]
pub struct UndoHistory {
    snapshots: VecDeque<Snapshot>,
    limit: usize,
}

impl UndoHistory {
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            snapshots: VecDeque::with_capacity(limit),
            limit,
        }
    }

    /// Pushes a snapshot of the state about to be changed.
    pub fn push(&mut self, snapshot: Snapshot) {
        if self.snapshots.len() == self.limit {
            self.snapshots.pop_front();
        }
        self.snapshots.push_back(snapshot);
    }

    /// Pops the most recent snapshot.
    pub fn undo(&mut self) -> Option<Snapshot> {
        self.snapshots.pop_back()
    }

    pub fn can_undo(&self) -> bool {
        !self.snapshots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::clip::Clip;

    fn snapshot(n: usize) -> Snapshot {
        let clips = (0..n).map(|i| Clip::new(format!("c{i}"), 1, 0.0, 1.0)).collect();
        Snapshot {
            timeline: Timeline::with_clips(clips),
            selected_clip_id: None,
        }
    }

    #[test]
    fn test_undo_pops_most_recent() {
        let mut history = UndoHistory::new(50);
        assert!(!history.can_undo());
        history.push(snapshot(1));
        history.push(snapshot(2));
        assert_eq!(history.undo().map(|s| s.timeline.clips.len()), Some(2));
        assert_eq!(history.undo().map(|s| s.timeline.clips.len()), Some(1));
        assert!(history.undo().is_none());
    }

    #[test]
    fn test_limit_evicts_oldest() {
        let mut history = UndoHistory::new(3);
        for n in 0..5 {
            history.push(snapshot(n));
        }
        assert_eq!(history.len(), 3);
        let remaining: Vec<_> = std::iter::from_fn(|| history.undo()).map(|s| s.timeline.clips.len()).collect();
        assert_eq!(remaining, vec![4, 3, 2]);
        assert!(history.is_empty());
    }
}
