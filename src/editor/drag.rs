use crate::ops::time_math::{clamp, round1};
use crate::types::clip::Clip;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimEdge {
    Start,
    End,
}

/// One trim gesture, alive from pointer-down until the pointer is released,
/// cancelled or loses capture.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub pointer_id: i64,
    pub clip_id: String,
    pub edge: TrimEdge,
    pub origin_x: f64,
    pub origin_source_start: f64,
    pub origin_source_end: f64,
    /// Real length of the asset, when known.
    pub max_source_seconds: Option<f64>,
    /// Source window under the pointer right now.
    pub source_start: f64,
    pub source_end: f64,
}

impl DragSession {
    pub fn moved(&self) -> bool {
        self.source_start != self.origin_source_start || self.source_end != self.origin_source_end
    }

    /// Preview shift for the clips after the dragged one.
    ///
    /// Trimming the start edge shortens the clip from the left. Without
    /// compensation every later clip would slide under the pointer while
    /// dragging, so the preview pushes them back by the amount trimmed.
    /// End-edge drags ripple normally.
    pub fn ripple_offset(&self) -> f64 {
        match self.edge {
            TrimEdge::Start => round1(self.source_start - self.origin_source_start),
            TrimEdge::End => 0.0,
        }
    }
}

/// Owns at most one [`DragSession`]. Events from other pointers are ignored
/// until it ends.
#[derive(Debug)]
pub struct DragController {
    session: Option<DragSession>,
    min_len: f64,
}

impl DragController {
    pub fn new(min_len: f64) -> Self {
        Self {
            session: None,
            min_len,
        }
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Starts a gesture on `clip`. Refused while another gesture is active.
    pub fn begin(&mut self, pointer_id: i64, clip: &Clip, edge: TrimEdge, x: f64, max_source_seconds: Option<f64>) -> bool {
        if self.session.is_some() {
            return false;
        }
        log::debug!("trim drag on clip {} ({edge:?}) by pointer {pointer_id}", clip.id);
        self.session = Some(DragSession {
            pointer_id,
            clip_id: clip.id.clone(),
            edge,
            origin_x: x,
            origin_source_start: clip.source_start_seconds,
            origin_source_end: clip.source_end_seconds,
            max_source_seconds: max_source_seconds.filter(|m| m.is_finite() && *m > 0.0),
            source_start: clip.source_start_seconds,
            source_end: clip.source_end_seconds,
        });
        true
    }

    /// Follows the pointer. Returns the updated session, or None for a
    /// foreign pointer or when no gesture is active.
    pub fn update(&mut self, pointer_id: i64, x: f64, px_per_second: f64) -> Option<&DragSession> {
        let min_len = self.min_len;
        let session = self.session.as_mut().filter(|s| s.pointer_id == pointer_id)?;
        let dt = (x - session.origin_x) / px_per_second.max(1.0);
        match session.edge {
            TrimEdge::Start => {
                let latest = round1((session.origin_source_end - min_len).max(0.0));
                session.source_start = clamp(round1(session.origin_source_start + dt), 0.0, latest);
            }
            TrimEdge::End => {
                let earliest = session.origin_source_start + min_len;
                let latest = session.max_source_seconds.map_or(f64::INFINITY, round1);
                session.source_end = round1(clamp(session.origin_source_end + dt, earliest, latest.max(earliest)));
            }
        }
        Some(&*session)
    }

    /// Pointer released. Hands back the finished session if it belongs to
    /// `pointer_id`.
    pub fn finish(&mut self, pointer_id: i64) -> Option<DragSession> {
        if self.session.as_ref()?.pointer_id != pointer_id {
            return None;
        }
        self.session.take()
    }

    /// Cancel, lost capture or window blur. Ends whatever is active.
    pub fn cancel(&mut self) -> Option<DragSession> {
        let session = self.session.take();
        if let Some(session) = &session {
            log::debug!("trim drag on clip {} cancelled", session.clip_id);
        }
        session
    }
}
