use crate::config::EngineConfig;
use crate::ops::time_math::{clamp, round1};

/// Scroll state of the time ruler.
///
/// The strip is padded by half the viewport on both sides so that `t = 0`
/// and the end can both sit under the fixed center marker. With that pad a
/// scroll offset maps straight to the centered time.
#[derive(Debug, Clone)]
pub struct RulerSync {
    px_per_second: f64,
    viewport_width: f64,
    scroll_left: f64,
    scrub_threshold: f64,
    /// Set by our own scroll writes and cleared on the next animation frame.
    ignore_next_scroll: bool,
    /// Held by a trim drag.
    locked: bool,
}

impl RulerSync {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            px_per_second: config.px_per_second.max(1.0),
            viewport_width: 0.0,
            scroll_left: 0.0,
            scrub_threshold: config.scrub_threshold_seconds,
            ignore_next_scroll: false,
            locked: false,
        }
    }

    pub fn px_per_second(&self) -> f64 {
        self.px_per_second
    }

    pub fn scroll_left(&self) -> f64 {
        self.scroll_left
    }

    pub fn set_viewport_width(&mut self, width: f64) {
        self.viewport_width = width.max(0.0);
    }

    pub fn pad_px(&self) -> f64 {
        (self.viewport_width / 2.0).floor()
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn unlock(&mut self) {
        self.locked = false;
    }

    /// Native scroll event. Returns the scrubbed time when it moved the
    /// playhead by at least the scrub threshold.
    pub fn on_scroll(&mut self, scroll_left: f64, playhead: f64, total: f64) -> Option<f64> {
        if self.locked || self.ignore_next_scroll {
            return None;
        }
        self.scroll_left = scroll_left.max(0.0);
        let t = clamp(round1(self.scroll_left / self.px_per_second), 0.0, total.max(0.0));
        if (t - playhead).abs() < self.scrub_threshold {
            return None;
        }
        Some(t)
    }

    /// Scroll offset that centers `playhead`. The host applies it; the scroll
    /// event it triggers is ignored until the next animation frame.
    pub fn recenter(&mut self, playhead: f64, total: f64) -> f64 {
        let content_width = total.max(0.0) * self.px_per_second;
        let target = clamp((playhead * self.px_per_second).round(), 0.0, content_width);
        self.scroll_left = target;
        self.ignore_next_scroll = true;
        target
    }

    pub fn on_animation_frame(&mut self) {
        self.ignore_next_scroll = false;
    }

    /// Timeline time under a click `click_x` pixels from the ruler's left edge.
    pub fn time_at(&self, click_x: f64, total: f64) -> f64 {
        let x = click_x + self.scroll_left - self.pad_px();
        clamp(round1(x / self.px_per_second), 0.0, total.max(0.0))
    }

    /// Converts a horizontal pointer travel into seconds.
    pub fn seconds_for_px(&self, dx: f64) -> f64 {
        dx / self.px_per_second
    }

    pub fn reset(&mut self) {
        self.scroll_left = 0.0;
        self.ignore_next_scroll = false;
        self.locked = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ruler() -> RulerSync {
        let mut ruler = RulerSync::new(&EngineConfig::default());
        ruler.set_viewport_width(401.0);
        ruler
    }

    #[test]
    fn test_scroll_maps_to_time_with_threshold() {
        let mut ruler = ruler();
        assert_eq!(ruler.pad_px(), 200.0);
        assert_eq!(ruler.on_scroll(96.0, 0.0, 10.0), Some(2.0));
        // 2.0 -> 2.0 moves nothing.
        assert_eq!(ruler.on_scroll(97.0, 2.0, 10.0), None);
        assert_eq!(ruler.on_scroll(10_000.0, 2.0, 10.0), Some(10.0));
        assert_eq!(ruler.on_scroll(-30.0, 2.0, 10.0), Some(0.0));
    }

    #[test]
    fn test_recenter_ignores_its_own_scroll_until_next_frame() {
        let mut ruler = ruler();
        assert_eq!(ruler.recenter(3.0, 10.0), 144.0);
        assert_eq!(ruler.on_scroll(144.0, 0.0, 10.0), None);
        ruler.on_animation_frame();
        assert_eq!(ruler.on_scroll(144.0, 0.0, 10.0), Some(3.0));
        assert_eq!(ruler.recenter(50.0, 10.0), 480.0);
    }

    #[test]
    fn test_locked_ruler_ignores_scroll() {
        let mut ruler = ruler();
        ruler.lock();
        assert_eq!(ruler.on_scroll(96.0, 0.0, 10.0), None);
        ruler.unlock();
        assert_eq!(ruler.on_scroll(96.0, 0.0, 10.0), Some(2.0));
    }

    #[test]
    fn test_click_accounts_for_pad() {
        let mut ruler = ruler();
        ruler.on_scroll(48.0, 0.0, 10.0);
        // Center of the viewport is the scrolled-to time.
        assert_eq!(ruler.time_at(200.0, 10.0), 1.0);
        assert_eq!(ruler.time_at(296.0, 10.0), 3.0);
        assert_eq!(ruler.time_at(0.0, 10.0), 0.0);
    }
}
